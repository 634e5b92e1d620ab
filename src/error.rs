//! Error types used by the workbus runtime, workers and collaborators.
//!
//! This module defines four enums:
//!
//! - [`RuntimeError`] — construction and lifecycle failures returned synchronously
//!   (thread spawn, stop timeout, shutdown grace).
//! - [`WorkError`] — failures of a single unit of work; reported as `*Failed` /
//!   `*Cancelled` events, never returned to the emitter.
//! - [`LoadError`] — failures to acquire a collaborator's model; reported as `*LoadFailed`.
//! - [`ConfigError`] — configuration parsing and validation.
//!
//! Each type provides `as_label` (stable snake_case for logs/metrics) and `as_message`.
//! There is no registration error: duplicate or missing registrations
//! are no-ops in the [`Mediator`](crate::Mediator).

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the workbus runtime.
///
/// These surface directly to the caller of `start()`, `stop()`,
/// `initialize()` or `shutdown()`, since there is no event channel
/// that makes sense for them.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The worker thread (or its runtime) could not be created.
    #[error("failed to spawn worker '{worker}': {source}")]
    Spawn {
        /// Worker name.
        worker: &'static str,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// `start()` was called on a worker that has already been stopped.
    #[error("worker '{worker}' is stopped and cannot be restarted")]
    WorkerStopped {
        /// Worker name.
        worker: &'static str,
    },

    /// `initialize()` was called after `shutdown()`.
    #[error("supervisor is shut down and cannot be initialized")]
    SupervisorStopped,

    /// The worker thread did not exit within the requested timeout.
    #[error("worker '{worker}' did not stop within {timeout:?}")]
    StopTimeout {
        /// Worker name.
        worker: &'static str,
        /// The timeout passed to `stop`.
        timeout: Duration,
    },

    /// Shutdown grace period was exceeded; some workers are still busy.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the workers that did not stop in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workbus::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Spawn { .. } => "runtime_spawn_failed",
            RuntimeError::WorkerStopped { .. } => "runtime_worker_stopped",
            RuntimeError::SupervisorStopped => "runtime_supervisor_stopped",
            RuntimeError::StopTimeout { .. } => "runtime_stop_timeout",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::Spawn { worker, source } => format!("spawn {worker}: {source}"),
            RuntimeError::WorkerStopped { worker } => format!("{worker} already stopped"),
            RuntimeError::SupervisorStopped => "supervisor already shut down".to_string(),
            RuntimeError::StopTimeout { worker, timeout } => {
                format!("{worker} still running after {timeout:?}")
            }
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck workers={stuck:?}")
            }
        }
    }
}

/// # Errors produced by a single unit of work.
///
/// Returned by [`Collaborator::run`](crate::Collaborator::run) and converted by the
/// worker loop into a result event:
/// - `Canceled` → `*Cancelled`
/// - everything else → `*Failed` carrying the request's correlation id
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkError {
    /// The unit observed its cancellation token and returned early.
    #[error("cancelled")]
    Canceled,

    /// A work request arrived while no model was loaded.
    #[error("no model loaded")]
    NotLoaded,

    /// The request failed validation before reaching the collaborator.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong with the request.
        reason: String,
    },

    /// The collaborator failed while running the request.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The collaborator panicked; the panic was caught at the worker boundary.
    #[error("collaborator panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl WorkError {
    /// Shorthand for [`WorkError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        WorkError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`WorkError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        WorkError::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use workbus::WorkError;
    ///
    /// assert_eq!(WorkError::Canceled.as_label(), "work_canceled");
    /// assert_eq!(WorkError::fail("oom").as_label(), "work_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WorkError::Canceled => "work_canceled",
            WorkError::NotLoaded => "work_not_loaded",
            WorkError::InvalidRequest { .. } => "work_invalid_request",
            WorkError::Fail { .. } => "work_failed",
            WorkError::Panicked { .. } => "work_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            WorkError::Canceled => "cancelled".to_string(),
            WorkError::NotLoaded => "no model loaded".to_string(),
            WorkError::InvalidRequest { reason } => format!("invalid: {reason}"),
            WorkError::Fail { error } => format!("error: {error}"),
            WorkError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// True if the error represents cooperative cancellation.
    pub fn is_canceled(&self) -> bool {
        matches!(self, WorkError::Canceled)
    }
}

/// # Errors produced while loading a collaborator's model.
///
/// A load failure never terminates the worker; the worker stays idle with
/// no model loaded and accepts further load requests.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The model path does not exist.
    #[error("model not found: {path}")]
    NotFound {
        /// Path that was looked up.
        path: String,
    },

    /// The collaborator could not initialise the model.
    #[error("load failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The collaborator panicked while loading.
    #[error("load panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl LoadError {
    /// Shorthand for [`LoadError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        LoadError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoadError::NotFound { .. } => "load_not_found",
            LoadError::Fail { .. } => "load_failed",
            LoadError::Panicked { .. } => "load_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            LoadError::NotFound { path } => format!("not found: {path}"),
            LoadError::Fail { error } => format!("error: {error}"),
            LoadError::Panicked { info } => format!("panic: {info}"),
        }
    }
}

/// # Configuration errors.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration text is not valid TOML for [`Config`](crate::Config).
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is not acceptable.
    #[error("invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Why it was rejected.
        message: String,
    },
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io(_) => "config_io",
            ConfigError::Parse(_) => "config_parse",
            ConfigError::InvalidValue { .. } => "config_invalid_value",
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_error_labels_are_stable() {
        assert_eq!(WorkError::NotLoaded.as_label(), "work_not_loaded");
        assert_eq!(WorkError::invalid("x").as_label(), "work_invalid_request");
        assert_eq!(
            WorkError::Panicked { info: "x".into() }.as_label(),
            "work_panicked"
        );
        assert!(WorkError::Canceled.is_canceled());
        assert!(!WorkError::fail("x").is_canceled());
    }

    #[test]
    fn test_runtime_error_display() {
        let err = RuntimeError::StopTimeout {
            worker: "generation",
            timeout: Duration::from_millis(10),
        };
        assert_eq!(err.to_string(), "worker 'generation' did not stop within 10ms");
        assert_eq!(err.as_label(), "runtime_stop_timeout");
    }

    #[test]
    fn test_panic_message_downcasts() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
        let s: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(s.as_ref()), "unknown panic");
    }
}
