use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Library root is set (enforced by serde) and non-empty
/// - Queue has at least one slot
/// - Fallback timeouts are non-zero
/// - History retention bounds are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.library.root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.root cannot be empty".to_string(),
        ));
    }

    if config.queue.slots == 0 {
        return Err(ConfigError::ValidationError(
            "queue.slots cannot be 0".to_string(),
        ));
    }

    if config.fallback.search_timeout_secs == 0 || config.fallback.no_data_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fallback timeouts cannot be 0".to_string(),
        ));
    }

    if config.history.max_entries_per_release == 0 || config.history.max_releases == 0 {
        return Err(ConfigError::ValidationError(
            "history retention bounds cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid() -> Config {
        load_config_from_str("[library]\nroot = \"/music\"\n").unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_validate_zero_slots_fails() {
        let mut config = valid();
        config.queue.slots = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_zero_timeout_fails() {
        let mut config = valid();
        config.fallback.no_data_timeout_secs = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_empty_root_fails() {
        let mut config = valid();
        config.library.root = std::path::PathBuf::new();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
