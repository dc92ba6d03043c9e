//! Cache configuration.
//!
//! Defaults match the shipped behavior: eager matching at insertion, lenient
//! validation, parallel batch cancellation, match log off.

/// Tunables for [`crate::OrderCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Run the matcher inside `add_order` and serve matching-size queries
    /// from the cache in O(1). When false, matching is deferred to the query.
    pub eager_match: bool,
    /// Surface duplicate ids and unknown keys as [`crate::CacheError`]
    /// instead of silent no-ops.
    pub strict_validation: bool,
    /// Fan the eligibility phase of large batch cancellations out over
    /// worker threads. Observable semantics are identical either way.
    pub parallel_cancellation: bool,
    /// Record every pairing as a [`crate::MatchFill`].
    pub enable_match_log: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            eager_match: true,
            strict_validation: false,
            parallel_cancellation: true,
            enable_match_log: false,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eager_match(mut self, value: bool) -> Self {
        self.eager_match = value;
        self
    }

    pub fn with_strict_validation(mut self, value: bool) -> Self {
        self.strict_validation = value;
        self
    }

    pub fn with_parallel_cancellation(mut self, value: bool) -> Self {
        self.parallel_cancellation = value;
        self
    }

    pub fn with_match_log(mut self, value: bool) -> Self {
        self.enable_match_log = value;
        self
    }

    /// Load from env: `EAGER_MATCH`, `STRICT_VALIDATION`,
    /// `PARALLEL_CANCELLATION`, `ENABLE_MATCH_LOG`. Accepted true values are
    /// `1` and `true` (any case); unset keeps the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            eager_match: env_flag("EAGER_MATCH", defaults.eager_match),
            strict_validation: env_flag("STRICT_VALIDATION", defaults.strict_validation),
            parallel_cancellation: env_flag("PARALLEL_CANCELLATION", defaults.parallel_cancellation),
            enable_match_log: env_flag("ENABLE_MATCH_LOG", defaults.enable_match_log),
        }
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}
