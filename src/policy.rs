//! # Scaling policies for the autoscaler.
//!
//! [`ScalePolicy`] maps `(current worker count, metric value)` to a desired
//! worker count. Policies are pure decision functions: sampling happens in
//! the scaler, and the result is clamped to the scaler's bounds afterwards.
//!
//! - [`ScalePolicy::Identity`] keeps the current count (default).
//! - [`ScalePolicy::Threshold`] adds workers on a high metric, for signals
//!   where higher means more work is waiting (queue depth, CPU).
//! - [`ScalePolicy::InverseThreshold`] sheds workers on a high metric, for
//!   signals where higher means less headroom (memory pressure).
//! - [`ScalePolicy::Custom`] wraps any pure function.
//!
//! Metric values exactly at `low` or `high` fall in the Goldilocks zone and
//! leave the count unchanged.

use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;

/// Decision function type for [`ScalePolicy::Custom`].
pub type ScaleFn = Arc<dyn Fn(usize, f64) -> usize + Send + Sync>;

/// Policy mapping the sampled metric to a desired worker count.
#[derive(Clone, Default)]
pub enum ScalePolicy {
    /// Keep the current count.
    #[default]
    Identity,

    /// Scale up when the metric runs above `high`, down below `low`.
    Threshold { low: f64, high: f64, step: usize },

    /// Scale down when the metric runs above `high`, up below `low`.
    InverseThreshold { low: f64, high: f64, step: usize },

    /// Any pure decision function `(current, metric) -> desired`.
    ///
    /// Purity is a convention, not enforced; a function that blocks or
    /// mutates external state degrades the scaler's tick cadence.
    Custom(ScaleFn),
}

impl ScalePolicy {
    /// Creates a threshold policy targeting the metric range `[low, high]`.
    ///
    /// Example: keep queue depth between 40 (low) and 80 (high), adding or
    /// removing `step` workers per tick outside that range.
    pub fn threshold(low: f64, high: f64, step: usize) -> Result<Self, ConfigError> {
        if step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        Ok(ScalePolicy::Threshold { low, high, step })
    }

    /// Creates an inverse threshold policy for headroom-style signals.
    ///
    /// High metric (e.g. memory pressure) removes workers; low metric adds
    /// them.
    pub fn inverse_threshold(low: f64, high: f64, step: usize) -> Result<Self, ConfigError> {
        if step == 0 {
            return Err(ConfigError::ZeroStep);
        }
        Ok(ScalePolicy::InverseThreshold { low, high, step })
    }

    /// Wraps a custom decision function.
    pub fn custom<F>(func: F) -> Self
    where
        F: Fn(usize, f64) -> usize + Send + Sync + 'static,
    {
        ScalePolicy::Custom(Arc::new(func))
    }

    /// Computes the desired worker count for the given state.
    ///
    /// Built-in policies saturate at zero; the min/max clamp is applied by
    /// the scaler, not here.
    pub fn desired(&self, current: usize, metric: f64) -> usize {
        match self {
            ScalePolicy::Identity => current,
            ScalePolicy::Threshold { low, high, step } => {
                if metric > *high {
                    current.saturating_add(*step)
                } else if metric < *low {
                    current.saturating_sub(*step)
                } else {
                    current
                }
            }
            ScalePolicy::InverseThreshold { low, high, step } => {
                if metric > *high {
                    current.saturating_sub(*step)
                } else if metric < *low {
                    current.saturating_add(*step)
                } else {
                    current
                }
            }
            ScalePolicy::Custom(func) => func(current, metric),
        }
    }
}

impl fmt::Debug for ScalePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalePolicy::Identity => f.write_str("Identity"),
            ScalePolicy::Threshold { low, high, step } => f
                .debug_struct("Threshold")
                .field("low", low)
                .field("high", high)
                .field("step", step)
                .finish(),
            ScalePolicy::InverseThreshold { low, high, step } => f
                .debug_struct("InverseThreshold")
                .field("low", low)
                .field("high", high)
                .field("step", step)
                .finish(),
            ScalePolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_scales_with_the_metric() {
        let policy = ScalePolicy::threshold(20.0, 80.0, 2).unwrap();
        assert_eq!(policy.desired(5, 90.0), 7);
        assert_eq!(policy.desired(5, 10.0), 3);
        assert_eq!(policy.desired(5, 50.0), 5);
    }

    #[test]
    fn inverse_threshold_scales_against_the_metric() {
        let policy = ScalePolicy::inverse_threshold(20.0, 80.0, 2).unwrap();
        assert_eq!(policy.desired(5, 95.0), 3);
        assert_eq!(policy.desired(5, 5.0), 7);
        assert_eq!(policy.desired(5, 50.0), 5);
    }

    #[test]
    fn boundary_metrics_are_goldilocks() {
        let policy = ScalePolicy::threshold(20.0, 80.0, 2).unwrap();
        assert_eq!(policy.desired(5, 20.0), 5);
        assert_eq!(policy.desired(5, 80.0), 5);

        let inverse = ScalePolicy::inverse_threshold(20.0, 80.0, 2).unwrap();
        assert_eq!(inverse.desired(5, 20.0), 5);
        assert_eq!(inverse.desired(5, 80.0), 5);
    }

    #[test]
    fn shrinking_saturates_at_zero() {
        let policy = ScalePolicy::threshold(20.0, 80.0, 10).unwrap();
        assert_eq!(policy.desired(3, 0.0), 0);

        let inverse = ScalePolicy::inverse_threshold(20.0, 80.0, 10).unwrap();
        assert_eq!(inverse.desired(3, 100.0), 0);
    }

    #[test]
    fn identity_is_the_default() {
        assert_eq!(ScalePolicy::default().desired(7, 1000.0), 7);
    }

    #[test]
    fn custom_decides_freely() {
        let policy = ScalePolicy::custom(|current, metric| current + metric as usize);
        assert_eq!(policy.desired(2, 3.9), 5);
    }

    #[test]
    fn zero_step_is_rejected() {
        assert!(ScalePolicy::threshold(1.0, 2.0, 0).is_err());
        assert!(ScalePolicy::inverse_threshold(1.0, 2.0, 0).is_err());
    }
}
