//! Queue configuration.

use serde::{Deserialize, Serialize};

/// Worker pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Concurrent download slots.
    #[serde(default = "default_slots")]
    pub slots: usize,
}

fn default_slots() -> usize {
    2
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            slots: default_slots(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert_eq!(QueueConfig::default().slots, 2);
    }

    #[test]
    fn test_deserialize_empty() {
        let config: QueueConfig = toml::from_str("").unwrap();
        assert_eq!(config.slots, 2);
    }
}
