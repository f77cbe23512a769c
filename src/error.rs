//! # Error types used by the flexpool runtime and tasks.
//!
//! This module defines three error enums:
//!
//! - [`TaskError`] errors produced by individual task executions.
//! - [`RuntimeError`] lifecycle misuse of the pool or the autoscaler.
//! - [`ConfigError`] rejected autoscaler configuration.
//!
//! All types provide `as_label` helper methods for metrics.
//! Per-task errors are carried on the result stream; they never stop a
//! worker or the pool.

use thiserror::Error;

/// # Errors produced by task execution.
///
/// Every value on the pool's result stream is either a task output or one of
/// these. A caught panic surfaces as [`TaskError::Panicked`]; the worker that
/// caught it keeps accepting inputs.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Task execution failed with a user-reported reason.
    #[error("execution failed: {reason}")]
    Fail { reason: String },

    /// Task panicked; the fault barrier captured the payload.
    #[error("panic: {message}")]
    Panicked { message: String },

    /// Task observed cancellation and stopped early.
    ///
    /// This is **not an error** in the traditional sense, but signals
    /// intentional termination.
    #[error("context canceled")]
    Canceled,
}

impl TaskError {
    /// Creates a [`TaskError::Fail`] from any printable reason.
    pub fn fail(reason: impl Into<String>) -> Self {
        TaskError::Fail {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Indicates whether the error is a captured panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, TaskError::Panicked { .. })
    }
}

/// # Errors produced by pool and scaler lifecycle misuse.
///
/// These represent calls that arrive in the wrong state, not failures of
/// running work.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `Pool::run` was called a second time.
    #[error("pool is already running")]
    AlreadyRunning,

    /// `AutoScaler::start` was called while the evaluation loop is running.
    #[error("autoscaler already started")]
    AlreadyStarted,

    /// `AutoScaler::start` was called after `stop`; stopped is terminal.
    #[error("autoscaler is stopped")]
    ScalerStopped,
}

impl RuntimeError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyRunning => "pool_already_running",
            RuntimeError::AlreadyStarted => "scaler_already_started",
            RuntimeError::ScalerStopped => "scaler_stopped",
        }
    }
}

/// # Errors produced by autoscaler configuration validation.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The sampling interval must be greater than zero.
    #[error("scaler interval must be greater than zero")]
    ZeroInterval,

    /// Worker bounds are inverted.
    #[error("scaler bounds inverted: min {min} > max {max}")]
    BoundsInverted { min: usize, max: usize },

    /// A threshold policy step of zero would never change the pool size.
    #[error("scale step must be greater than zero")]
    ZeroStep,
}

impl ConfigError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::ZeroInterval => "config_zero_interval",
            ConfigError::BoundsInverted { .. } => "config_bounds_inverted",
            ConfigError::ZeroStep => "config_zero_step",
        }
    }
}
