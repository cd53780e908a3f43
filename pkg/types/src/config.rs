use serde::{Deserialize, Serialize};

/// Dev simulator configuration file (YAML).
///
/// Example `config.yaml`:
/// ```yaml
/// data-dir: /tmp/softlock-data
/// prompt-minutes: 1
/// heartbeat-period-ms: 10000
/// tick-ms: 1000
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevConfigFile {
    /// Directory for SlateDB state storage; in-memory when unset.
    #[serde(default, alias = "data-dir")]
    pub data_dir: Option<String>,
    #[serde(default, alias = "prompt-minutes")]
    pub prompt_minutes: Option<f64>,
    #[serde(default, alias = "heartbeat-period-ms")]
    pub heartbeat_period_ms: Option<i64>,
    /// Wall-clock interval between simulated ticks.
    #[serde(default, alias = "tick-ms")]
    pub tick_ms: Option<u64>,
    /// How many times the simulated user renews before releasing.
    #[serde(default)]
    pub renewals: Option<u32>,
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> anyhow::Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: T = serde_yaml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg: DevConfigFile = load_config_file("/nonexistent/softlock.yaml").unwrap();
        assert!(cfg.data_dir.is_none());
        assert!(cfg.tick_ms.is_none());
    }

    #[test]
    fn kebab_case_aliases_parse() {
        let cfg: DevConfigFile =
            serde_yaml::from_str("prompt-minutes: 2\nheartbeat-period-ms: 5000\n").unwrap();
        assert_eq!(cfg.prompt_minutes, Some(2.0));
        assert_eq!(cfg.heartbeat_period_ms, Some(5000));
    }
}
