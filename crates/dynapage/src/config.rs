use std::{env, str::FromStr, time::Duration};

use dynapage_core::BackoffConfig;

/// Configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// AWS region (default: "us-east-1")
    pub region: String,
    /// Custom endpoint URL, for local DynamoDB
    pub endpoint_url: Option<String>,
    /// Backoff schedule applied to every store call
    pub backoff: BackoffConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `AWS_ENDPOINT_URL` - Custom endpoint URL (default: none)
    /// - `DYNAPAGE_BACKOFF_INITIAL_MS` - First retry delay (default: 500)
    /// - `DYNAPAGE_BACKOFF_MULTIPLIER` - Delay growth factor (default: 1.5)
    /// - `DYNAPAGE_BACKOFF_MAX_INTERVAL_MS` - Delay cap (default: 60,000)
    /// - `DYNAPAGE_BACKOFF_MAX_ELAPSED_MS` - Give-up deadline (default: 900,000)
    /// - `DYNAPAGE_BACKOFF_MAX_ATTEMPTS` - Give-up attempt count (default: unlimited)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = BackoffConfig::default();

        Self {
            region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|url| !url.is_empty()),
            backoff: BackoffConfig {
                initial_interval: parse_var(&lookup, "DYNAPAGE_BACKOFF_INITIAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.initial_interval),
                multiplier: parse_var(&lookup, "DYNAPAGE_BACKOFF_MULTIPLIER")
                    .filter(|multiplier: &f64| multiplier.is_finite() && *multiplier >= 1.0)
                    .unwrap_or(defaults.multiplier),
                max_interval: parse_var(&lookup, "DYNAPAGE_BACKOFF_MAX_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.max_interval),
                max_elapsed_time: parse_var(&lookup, "DYNAPAGE_BACKOFF_MAX_ELAPSED_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.max_elapsed_time),
                max_attempts: parse_var(&lookup, "DYNAPAGE_BACKOFF_MAX_ATTEMPTS")
                    .filter(|attempts: &u32| *attempts > 0)
                    .or(defaults.max_attempts),
                ..defaults
            },
        }
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    lookup(name).and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = config(&[]);

        assert_eq!(config.region, "us-east-1");
        assert!(config.endpoint_url.is_none());
        assert_eq!(config.backoff, BackoffConfig::default());
    }

    #[test]
    fn test_backoff_overrides() {
        let config = config(&[
            ("DYNAPAGE_BACKOFF_INITIAL_MS", "10"),
            ("DYNAPAGE_BACKOFF_MULTIPLIER", "2"),
            ("DYNAPAGE_BACKOFF_MAX_INTERVAL_MS", "100"),
            ("DYNAPAGE_BACKOFF_MAX_ELAPSED_MS", "1000"),
            ("DYNAPAGE_BACKOFF_MAX_ATTEMPTS", "5"),
        ]);

        assert_eq!(config.backoff.initial_interval, Duration::from_millis(10));
        assert_eq!(config.backoff.multiplier, 2.0);
        assert_eq!(config.backoff.max_interval, Duration::from_millis(100));
        assert_eq!(config.backoff.max_elapsed_time, Duration::from_secs(1));
        assert_eq!(config.backoff.max_attempts, Some(5));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = config(&[
            ("DYNAPAGE_BACKOFF_INITIAL_MS", "soon"),
            ("DYNAPAGE_BACKOFF_MULTIPLIER", "0.5"),
            ("AWS_ENDPOINT_URL", ""),
        ]);

        assert_eq!(config.backoff.initial_interval, Duration::from_millis(500));
        assert_eq!(config.backoff.multiplier, 1.5);
        assert!(config.endpoint_url.is_none());
    }

    #[test]
    fn test_unbounded_multiplier_falls_back_to_default() {
        for value in ["inf", "NaN", "1e400"] {
            let config = config(&[("DYNAPAGE_BACKOFF_MULTIPLIER", value)]);
            assert_eq!(config.backoff.multiplier, 1.5, "{value}");
        }
    }

    #[test]
    fn test_zero_max_attempts_means_unlimited() {
        let config = config(&[("DYNAPAGE_BACKOFF_MAX_ATTEMPTS", "0")]);

        assert_eq!(config.backoff.max_attempts, None);
    }

    #[test]
    fn test_target_display() {
        let local = config(&[("AWS_ENDPOINT_URL", "http://localhost:8000")]);
        assert_eq!(
            local.target_display(),
            "Local DynamoDB (http://localhost:8000)"
        );

        let remote = config(&[("AWS_REGION", "eu-west-1")]);
        assert_eq!(remote.target_display(), "AWS DynamoDB (region: eu-west-1)");
    }
}
