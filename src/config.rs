//! Configuration for the proximity cache
//!
//! Serializable settings that can be loaded from JSON (or TOML with the
//! `toml` feature) and validated before use.
use crate::quadtree::{DEFAULT_DEPTH_BUDGET, MAX_DEPTH_BUDGET, QuadTree};
use serde::de::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use crate::quadtree::{BudgetPolicy, PruneStrategy};

/// Cache configuration
///
/// # Example
///
/// ```rust
/// use geocache::Config;
///
/// let config = Config::default();
/// assert_eq!(config.lifetime_minutes, 60);
///
/// let json = r#"{
///     "default_provider": "openweathermap",
///     "radius_km": 2.5,
///     "prune_strategy": "raw_delta"
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.radius_km, 2.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Provider used when callers do not name one
    #[serde(default = "Config::default_provider")]
    pub default_provider: String,

    /// Lifetime of a cache entry, anchored at its first write
    #[serde(default = "Config::default_lifetime_minutes")]
    pub lifetime_minutes: u64,

    /// Radius within which a cached payload answers a nearby query
    #[serde(default = "Config::default_radius_km")]
    pub radius_km: f64,

    /// Nodes an insertion may visit before it is dropped
    #[serde(default = "Config::default_depth_budget")]
    pub depth_budget: usize,

    #[serde(default)]
    pub budget_policy: BudgetPolicy,

    #[serde(default)]
    pub prune_strategy: PruneStrategy,
}

impl Config {
    fn default_provider() -> String {
        "weather_api".to_string()
    }

    const fn default_lifetime_minutes() -> u64 {
        60
    }

    const fn default_radius_km() -> f64 {
        5.0
    }

    const fn default_depth_budget() -> usize {
        DEFAULT_DEPTH_BUDGET
    }

    pub fn with_default_provider(mut self, provider: impl Into<String>) -> Self {
        self.default_provider = provider.into();
        self
    }

    pub fn with_lifetime_minutes(mut self, minutes: u64) -> Self {
        assert!(minutes > 0, "Lifetime must be greater than zero");
        self.lifetime_minutes = minutes;
        self
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        assert!(
            radius_km.is_finite() && radius_km > 0.0,
            "Radius must be positive and finite"
        );
        self.radius_km = radius_km;
        self
    }

    pub fn with_depth_budget(mut self, budget: usize, policy: BudgetPolicy) -> Self {
        assert!(
            (1..=MAX_DEPTH_BUDGET).contains(&budget),
            "Depth budget must be between 1 and {}",
            MAX_DEPTH_BUDGET
        );
        self.depth_budget = budget;
        self.budget_policy = policy;
        self
    }

    pub fn with_prune_strategy(mut self, strategy: PruneStrategy) -> Self {
        self.prune_strategy = strategy;
        self
    }

    /// Entry lifetime as a Duration
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_minutes.saturating_mul(60))
    }

    /// Apply the tree settings to a (usually freshly decoded) tree.
    pub fn tune_tree(&self, tree: QuadTree) -> QuadTree {
        tree.with_depth_budget(self.depth_budget, self.budget_policy)
            .with_prune_strategy(self.prune_strategy)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.default_provider.trim().is_empty() {
            return Err("Default provider cannot be empty".to_string());
        }

        if self.lifetime_minutes == 0 {
            return Err("Lifetime must be greater than zero".to_string());
        }

        if !self.radius_km.is_finite() {
            return Err("Radius must be finite (not NaN or infinity)".to_string());
        }
        if self.radius_km <= 0.0 {
            return Err("Radius must be positive".to_string());
        }

        if self.depth_budget == 0 {
            return Err("Depth budget must be greater than zero".to_string());
        }
        if self.depth_budget > MAX_DEPTH_BUDGET {
            return Err(format!(
                "Depth budget must not exceed {}",
                MAX_DEPTH_BUDGET
            ));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_provider: Self::default_provider(),
            lifetime_minutes: Self::default_lifetime_minutes(),
            radius_km: Self::default_radius_km(),
            depth_budget: Self::default_depth_budget(),
            budget_policy: BudgetPolicy::default(),
            prune_strategy: PruneStrategy::default(),
        }
    }
}
