//! Process-wide named configuration store with a "current" pointer.
//!
//! Multiple applications may share configuration data; registering a
//! configuration also makes it the current one.

use crate::config::AppConfig;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

static CONFIGS: Lazy<RwLock<HashMap<String, AppConfig>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));
static CURRENT: Lazy<RwLock<Option<String>>> = Lazy::new(|| RwLock::new(None));

const DEFAULT_NAME: &str = "default";

/// Merge defaults into `config`, store it by name, and set it as current.
/// Returns the stored configuration.
pub fn register(mut config: AppConfig) -> AppConfig {
    if config.name.is_empty() {
        config.name = DEFAULT_NAME.to_string();
    }
    let name = config.name.clone();
    CONFIGS
        .write()
        .expect("configuration registry poisoned")
        .insert(name.clone(), config.clone());
    *CURRENT.write().expect("configuration registry poisoned") = Some(name);
    config
}

/// Look up a configuration by name.
pub fn get(name: &str) -> Option<AppConfig> {
    CONFIGS
        .read()
        .expect("configuration registry poisoned")
        .get(name)
        .cloned()
}

/// The most recently registered configuration, if any.
pub fn current() -> Option<AppConfig> {
    let current = CURRENT.read().expect("configuration registry poisoned");
    current.as_deref().and_then(get)
}
