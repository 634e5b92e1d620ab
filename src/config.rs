//! # Global runtime configuration.
//!
//! [`Config`] centralizes the settings passed explicitly into the supervisor and every
//! worker at construction time; nothing reads ambient global state.
//!
//! Config is used in two ways:
//! 1. **Supervisor creation**: `WorkerSupervisor::builder(config)`
//! 2. **Worker creation**: `Worker::new(collaborator, mediator, &config)`
//!
//! ## File format
//! ```toml
//! grace_ms = 5000
//! poll_interval_ms = 20
//! tap_capacity = 256
//!
//! [workers.mask_preview]
//! discipline = "latest-only"
//! ```
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use workbus::{Config, QueueDiscipline};
//!
//! let mut cfg = Config::default();
//! cfg.grace = Duration::from_secs(10);
//! cfg.disciplines.insert("image".into(), QueueDiscipline::LatestOnly);
//!
//! assert_eq!(cfg.discipline_for("image", QueueDiscipline::Fifo), QueueDiscipline::LatestOnly);
//! assert_eq!(cfg.discipline_for("speech", QueueDiscipline::Fifo), QueueDiscipline::Fifo);
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::worker::QueueDiscipline;
use crate::workers::NAMES;

pub(crate) const DEFAULT_TAP_CAPACITY: usize = 1024;
pub(crate) const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Global configuration for the supervisor and its workers.
///
/// ## Field semantics
/// - `grace`: Total time `shutdown()` waits for all workers (`0s` = don't wait)
/// - `poll_interval`: Upper bound on an idle worker's wait before re-checking its queue (min 1ms)
/// - `tap_capacity`: Mediator tap ring buffer size (min 1)
/// - `disciplines`: Per-worker overrides of the default queue discipline
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum time to wait for workers to stop during shutdown.
    ///
    /// The budget is shared: each worker gets whatever is left after the previous ones.
    pub grace: Duration,

    /// Idle poll interval of worker loops.
    ///
    /// Loops are also woken by enqueue and stop; the interval only bounds how
    /// long a missed wake-up can go unnoticed.
    pub poll_interval: Duration,

    /// Capacity of the mediator's broadcast tap.
    pub tap_capacity: usize,

    /// Queue discipline overrides keyed by worker name.
    pub disciplines: HashMap<String, QueueDiscipline>,
}

impl Config {
    /// Returns the discipline for `worker`, or `default` if not overridden.
    #[inline]
    pub fn discipline_for(&self, worker: &str, default: QueueDiscipline) -> QueueDiscipline {
        self.disciplines.get(worker).copied().unwrap_or(default)
    }

    /// Returns the poll interval clamped to a minimum of 1ms.
    #[inline]
    pub fn poll_interval_clamped(&self) -> Duration {
        self.poll_interval.max(MIN_POLL_INTERVAL)
    }

    /// Returns a tap capacity clamped to a minimum of 1.
    #[inline]
    pub fn tap_capacity_clamped(&self) -> usize {
        self.tap_capacity.max(1)
    }

    /// Parses a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        raw.into_config()
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `grace = 30s`
    /// - `poll_interval = 50ms`
    /// - `tap_capacity = 1024`
    /// - no discipline overrides
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            poll_interval: Duration::from_millis(50),
            tap_capacity: DEFAULT_TAP_CAPACITY,
            disciplines: HashMap::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    grace_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
    tap_capacity: Option<usize>,
    #[serde(default)]
    workers: HashMap<String, RawWorker>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWorker {
    discipline: Option<QueueDiscipline>,
}

impl RawConfig {
    fn into_config(self) -> Result<Config, ConfigError> {
        let mut cfg = Config::default();
        if let Some(ms) = self.grace_ms {
            cfg.grace = Duration::from_millis(ms);
        }
        if let Some(ms) = self.poll_interval_ms {
            if ms == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "poll_interval_ms".into(),
                    message: "must be greater than zero".into(),
                });
            }
            cfg.poll_interval = Duration::from_millis(ms);
        }
        if let Some(cap) = self.tap_capacity {
            cfg.tap_capacity = cap;
        }
        for (name, worker) in self.workers {
            if !NAMES.contains(&name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key: format!("workers.{name}"),
                    message: format!("unknown worker; expected one of {NAMES:?}"),
                });
            }
            if let Some(discipline) = worker.discipline {
                cfg.disciplines.insert(name, discipline);
            }
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_keeps_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.grace, Duration::from_secs(30));
        assert_eq!(cfg.poll_interval, Duration::from_millis(50));
        assert!(cfg.disciplines.is_empty());
    }

    #[test]
    fn test_full_document() {
        let cfg = Config::from_toml_str(
            r#"
            grace_ms = 1500
            poll_interval_ms = 5
            tap_capacity = 0

            [workers.generation]
            discipline = "latest-only"

            [workers.token_count]
            discipline = "fifo"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.grace, Duration::from_millis(1500));
        assert_eq!(cfg.poll_interval, Duration::from_millis(5));
        assert_eq!(cfg.tap_capacity_clamped(), 1);
        assert_eq!(
            cfg.discipline_for("generation", QueueDiscipline::Fifo),
            QueueDiscipline::LatestOnly
        );
        assert_eq!(
            cfg.discipline_for("token_count", QueueDiscipline::Direct),
            QueueDiscipline::Fifo
        );
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = Config::from_toml_str("poll_interval_ms = 0").unwrap_err();
        assert_eq!(err.as_label(), "config_invalid_value");
    }

    #[test]
    fn test_programmatic_zero_poll_interval_is_clamped() {
        let mut cfg = Config::default();
        cfg.poll_interval = Duration::ZERO;
        assert_eq!(cfg.poll_interval_clamped(), MIN_POLL_INTERVAL);

        cfg.poll_interval = Duration::from_millis(20);
        assert_eq!(cfg.poll_interval_clamped(), Duration::from_millis(20));
    }

    #[test]
    fn test_unknown_worker_rejected() {
        let err = Config::from_toml_str("[workers.painter]\ndiscipline = \"fifo\"").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "workers.painter"));
    }

    #[test]
    fn test_bad_discipline_is_parse_error() {
        let err = Config::from_toml_str("[workers.image]\ndiscipline = \"lifo\"").unwrap_err();
        assert_eq!(err.as_label(), "config_parse");
    }
}
