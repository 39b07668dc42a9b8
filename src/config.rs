//! Evaluator-level configuration.
//!
//! Preset constructors plus a `with_*` builder chain and a `Default` impl.
//! Nothing here changes the single-pass, no-retry evaluation contract:
//! `EngineConfig` only tunes diagnostics and an optional sanity guard on
//! graph size.

/// Tunables for [`crate::evaluator::evaluate`]. Construction and
/// registration (`Project`/`Scope`/`Calc`/`Verif`) are unaffected by this:
/// it governs only the evaluation pass itself.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// When `true` (the default), a calc/verif failure is logged at
    /// `tracing::error!` before propagating as [`crate::error::VeriqError::UserFn`].
    /// When `false`, the same abort still happens (no retries, no partial
    /// success) but is logged at `tracing::warn!` instead. This knob affects
    /// log severity only, never control flow.
    pub fail_fast: bool,

    /// An optional soft cap on the number of nodes the dependency graph may
    /// contain. When set and exceeded, [`crate::evaluator::evaluate`] emits
    /// a `tracing::warn!` naming the overage before proceeding; it is a
    /// sanity guard for catching runaway schemas early in development, not
    /// a hard abort (the closed error set has no variant for it).
    pub max_nodes: Option<usize>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tuned for development: verbose failure logging, a generous node cap
    /// to catch runaway schema expansion early.
    pub fn development() -> Self {
        Self {
            fail_fast: true,
            max_nodes: Some(100_000),
        }
    }

    /// Tuned for production evaluation: quieter failure logging, no node
    /// cap.
    pub fn production() -> Self {
        Self {
            fail_fast: false,
            max_nodes: None,
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fail_fast: true,
            max_nodes: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_fails_fast_with_no_cap() {
        let config = EngineConfig::default();
        assert!(config.fail_fast);
        assert_eq!(config.max_nodes, None);
    }

    #[test]
    fn development_preset_caps_nodes() {
        let config = EngineConfig::development();
        assert!(config.fail_fast);
        assert_eq!(config.max_nodes, Some(100_000));
    }

    #[test]
    fn production_preset_is_quiet_and_uncapped() {
        let config = EngineConfig::production();
        assert!(!config.fail_fast);
        assert_eq!(config.max_nodes, None);
    }

    #[test]
    fn builder_chain_overrides_fields() {
        let config = EngineConfig::new().with_fail_fast(false).with_max_nodes(10);
        assert!(!config.fail_fast);
        assert_eq!(config.max_nodes, Some(10));
    }
}
