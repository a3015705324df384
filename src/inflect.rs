//! Resource-name inflection for generated routes.

/// Pluralize an English noun well enough for resource paths.
/// e.g. "event" -> "events", "entry" -> "entries", "address" -> "addresses"
pub fn pluralize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let lower = s.to_lowercase();
    if lower.ends_with('y')
        && !lower.ends_with("ay")
        && !lower.ends_with("ey")
        && !lower.ends_with("oy")
        && !lower.ends_with("uy")
    {
        format!("{}ies", &s[..s.len() - 1])
    } else if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        format!("{}es", s)
    } else {
        format!("{}s", s)
    }
}

/// The path segment for a model: lowercased plural of its name.
/// e.g. "Event" -> "events"
pub fn resource_name(model_name: &str) -> String {
    pluralize(&model_name.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralizes_common_shapes() {
        assert_eq!(pluralize("event"), "events");
        assert_eq!(pluralize("entry"), "entries");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("day"), "days");
    }

    #[test]
    fn resource_names_are_lowercase() {
        assert_eq!(resource_name("Event"), "events");
        assert_eq!(resource_name("Category"), "categories");
    }
}
