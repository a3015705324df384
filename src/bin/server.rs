//! Server binary: reads a configuration JSON file, creates the application,
//! and serves the generated endpoints.

use restforge::{AppConfig, Application};
use tower_http::limit::RequestBodyLimitLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config_path =
        std::env::var("RESTFORGE_CONFIG").unwrap_or_else(|_| "restforge.json".into());
    let raw = tokio::fs::read_to_string(&config_path).await?;
    let config: AppConfig = serde_json::from_str(&raw)?;

    let application = Application::create(config).await?;
    application.run()?;

    let router = application
        .router()
        .layer(RequestBodyLimitLayer::new(1024 * 1024));

    let port = std::env::var("RESTFORGE_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "3000".into());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}
