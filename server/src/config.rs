use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// How often the registry is checked against the live connection set.
    pub sweep_interval: Duration,
    /// How often each connection is sent a `pingCheck`.
    pub heartbeat_interval: Duration,
    /// Silence after which a connection is dropped.
    pub client_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
}

impl std::default::Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            sweep_interval: Duration::from_secs(10),
            heartbeat_interval: Duration::from_secs(10),
            client_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    /// Reads `HOST`, `PORT`, `SWEEP_INTERVAL_SECS`, `HEARTBEAT_INTERVAL_SECS` and
    /// `CLIENT_TIMEOUT_SECS`. A bad value keeps the default for that key and is reported.
    pub fn from_env() -> (Self, Vec<ConfigError>) {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> (Self, Vec<ConfigError>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            config.host = host.trim().to_owned();
        }
        if let Some(port) = parse(&lookup, "PORT", &mut errors) {
            config.port = port;
        }
        if let Some(secs) = parse_secs(&lookup, "SWEEP_INTERVAL_SECS", &mut errors) {
            config.sweep_interval = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "HEARTBEAT_INTERVAL_SECS", &mut errors) {
            config.heartbeat_interval = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "CLIENT_TIMEOUT_SECS", &mut errors) {
            config.client_timeout = secs;
        }

        (config, errors)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, errors: &mut Vec<ConfigError>) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let value = lookup(key)?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.push(ConfigError::Invalid { key, value });
            None
        }
    }
}

// Timers cannot run on a zero period.
fn parse_secs<F>(lookup: &F, key: &'static str, errors: &mut Vec<ConfigError>) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match parse::<F, u64>(lookup, key, errors)? {
        0 => {
            errors.push(ConfigError::Invalid {
                key,
                value: "0".into(),
            });
            None
        }
        secs => Some(Duration::from_secs(secs)),
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => {
                write!(f, "invalid value {:?} for {}", value, key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn it_uses_defaults_without_env() {
        let (config, errors) = ServerConfig::from_lookup(|_| None);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert!(errors.is_empty());
    }

    #[test]
    fn it_reads_overrides() {
        let (config, errors) = ServerConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("SWEEP_INTERVAL_SECS", "3"),
        ]));
        assert!(errors.is_empty());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.sweep_interval, Duration::from_secs(3));
        assert_eq!(config.client_timeout, Duration::from_secs(30));
    }

    #[test]
    fn it_reports_bad_values_and_keeps_defaults() {
        let (config, errors) = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "eighty"),
            ("SWEEP_INTERVAL_SECS", "0"),
        ]));
        assert_eq!(config.port, 5000);
        assert_eq!(config.sweep_interval, Duration::from_secs(10));
        assert_eq!(
            errors,
            vec![
                ConfigError::Invalid {
                    key: "PORT",
                    value: "eighty".into()
                },
                ConfigError::Invalid {
                    key: "SWEEP_INTERVAL_SECS",
                    value: "0".into()
                },
            ]
        );
    }
}
