//! Generator configuration.
//!
//! The configuration is a TOML document. Every section and key is optional;
//! a missing key takes its default, which for optional features means the
//! feature is off. Unknown keys are ignored.
//!
//! ```toml
//! seed = 42
//!
//! [task]
//! connector = "datagen"
//! task = "0"
//!
//! [cadences]
//! orders = 5000
//! transactions = 2000
//!
//! [history]
//! enabled = true
//! window = "7d"
//! ```

pub mod duration;

use checkpoint::TaskIdentity;
use datagen_generator::{
    OnlineOrderSettings, OrderPatternSettings, OrderSettings, ReviewSettings, TransactionSettings,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Longest accepted history window, about ten years.
pub const MAX_HISTORY_WINDOW_SECS: i64 = 3_650 * 86_400;

/// Longest accepted live cadence, one week.
pub const MAX_CADENCE_MILLIS: u64 = 7 * 86_400 * 1_000;

/// Largest product catalog generated at start.
pub const MAX_CATALOG_SIZE: usize = 10_000;

/// Errors detected while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for '{key}': {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level generator configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatagenConfig {
    /// Base seed for all producers; unset means a fresh random stream
    pub seed: Option<u64>,
    pub task: TaskConfig,
    pub cadences: CadenceConfig,
    pub history: HistoryConfig,
    pub orders: OrdersConfig,
    pub order_patterns: OrderPatternsConfig,
    pub online_orders: OnlineOrdersConfig,
    pub reviews: ReviewsConfig,
    pub transactions: TransactionsConfig,
}

/// Identity of this generator task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub connector: String,
    pub task: String,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            connector: "datagen".to_string(),
            task: "0".to_string(),
        }
    }
}

impl TaskConfig {
    pub fn identity(&self) -> TaskIdentity {
        TaskIdentity::new(&self.connector, &self.task)
    }
}

/// Milliseconds between firings, per event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub new_customers: u64,
    pub orders: u64,
    pub cancellations: u64,
    pub false_positive_orders: u64,
    pub suspicious_orders: u64,
    pub stock_movements: u64,
    pub badge_ins: u64,
    pub sensor_readings: u64,
    pub high_sensor_readings: u64,
    pub online_orders: u64,
    pub return_requests: u64,
    pub product_reviews: u64,
    pub transactions: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            new_customers: 60_000,
            orders: 5_000,
            cancellations: 15_000,
            false_positive_orders: 600_000,
            suspicious_orders: 300_000,
            stock_movements: 20_000,
            badge_ins: 10_000,
            sensor_readings: 1_000,
            high_sensor_readings: 300_000,
            online_orders: 30_000,
            return_requests: 90_000,
            product_reviews: 30_000,
            transactions: 2_000,
        }
    }
}

impl CadenceConfig {
    /// All cadences with their config keys.
    pub fn entries(&self) -> [(&'static str, u64); 13] {
        [
            ("cadences.new_customers", self.new_customers),
            ("cadences.orders", self.orders),
            ("cadences.cancellations", self.cancellations),
            ("cadences.false_positive_orders", self.false_positive_orders),
            ("cadences.suspicious_orders", self.suspicious_orders),
            ("cadences.stock_movements", self.stock_movements),
            ("cadences.badge_ins", self.badge_ins),
            ("cadences.sensor_readings", self.sensor_readings),
            ("cadences.high_sensor_readings", self.high_sensor_readings),
            ("cadences.online_orders", self.online_orders),
            ("cadences.return_requests", self.return_requests),
            ("cadences.product_reviews", self.product_reviews),
            ("cadences.transactions", self.transactions),
        ]
    }
}

/// Startup history generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Generate a backlog of historical events on the first start of a task
    pub enabled: bool,
    /// Look-back window, e.g. "7d" or "1h"
    pub window: String,
    /// Historical firings are this many times further apart than live ones
    pub cadence_factor: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            window: "7d".to_string(),
            cadence_factor: 60,
        }
    }
}

impl HistoryConfig {
    /// The look-back window as a duration.
    pub fn window_duration(&self) -> Result<chrono::Duration, ConfigError> {
        let secs = duration::parse_duration_to_secs(&self.window)
            .map_err(|e| ConfigError::invalid("history.window", format!("{e:#}")))?;
        if secs <= 0 {
            return Err(ConfigError::invalid(
                "history.window",
                "must be a positive duration",
            ));
        }
        if secs > MAX_HISTORY_WINDOW_SECS {
            return Err(ConfigError::invalid(
                "history.window",
                format!("must be at most {MAX_HISTORY_WINDOW_SECS}s, got {secs}s"),
            ));
        }
        chrono::TimeDelta::try_seconds(secs)
            .ok_or_else(|| ConfigError::invalid("history.window", "duration out of range"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersConfig {
    /// How many recent orders are remembered as cancellation candidates
    pub recent_capacity: usize,
    pub min_quantity: i64,
    pub max_quantity: i64,
    pub min_price: f64,
    pub max_price: f64,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        let defaults = OrderSettings::default();
        Self {
            recent_capacity: 100,
            min_quantity: defaults.min_quantity,
            max_quantity: defaults.max_quantity,
            min_price: defaults.min_price,
            max_price: defaults.max_price,
        }
    }
}

/// Large orders that are cancelled soon after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderPatternsConfig {
    pub large_quantity_min: i64,
    pub large_quantity_max: i64,
    pub min_cancel_delay_secs: i64,
    pub max_cancel_delay_secs: i64,
    pub max_reorder_delay_secs: i64,
}

impl Default for OrderPatternsConfig {
    fn default() -> Self {
        let defaults = OrderPatternSettings::default();
        Self {
            large_quantity_min: defaults.large_quantity_min,
            large_quantity_max: defaults.large_quantity_max,
            min_cancel_delay_secs: defaults.min_cancel_delay_secs,
            max_cancel_delay_secs: defaults.max_cancel_delay_secs,
            max_reorder_delay_secs: defaults.max_reorder_delay_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnlineOrdersConfig {
    pub max_products: usize,
    pub out_of_stock_probability: f64,
}

impl Default for OnlineOrdersConfig {
    fn default() -> Self {
        let defaults = OnlineOrderSettings::default();
        Self {
            max_products: defaults.max_products,
            out_of_stock_probability: defaults.out_of_stock_probability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewsConfig {
    pub catalog_size: usize,
    pub products_with_size_issue_count: usize,
    pub size_issue_probability: f64,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        let defaults = ReviewSettings::default();
        Self {
            catalog_size: defaults.catalog_size,
            products_with_size_issue_count: defaults.products_with_size_issue,
            size_issue_probability: defaults.size_issue_probability,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionsConfig {
    pub abandon_probability: f64,
    pub new_transaction_probability: f64,
    pub max_in_flight: usize,
    pub min_amount: f64,
    pub max_amount: f64,
}

impl Default for TransactionsConfig {
    fn default() -> Self {
        let defaults = TransactionSettings::default();
        Self {
            abandon_probability: defaults.abandon_probability,
            new_transaction_probability: defaults.new_transaction_probability,
            max_in_flight: defaults.max_in_flight,
            min_amount: defaults.min_amount,
            max_amount: defaults.max_amount,
        }
    }
}

impl DatagenConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Check every option, naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, millis) in self.cadences.entries() {
            if millis == 0 || millis > MAX_CADENCE_MILLIS {
                return Err(ConfigError::invalid(
                    key,
                    format!("cadence must be between 1 and {MAX_CADENCE_MILLIS} milliseconds"),
                ));
            }
        }

        if self.task.connector.trim().is_empty() {
            return Err(ConfigError::invalid("task.connector", "must not be empty"));
        }

        if self.history.enabled {
            self.history.window_duration()?;
            if self.history.cadence_factor == 0 {
                return Err(ConfigError::invalid(
                    "history.cadence_factor",
                    "must be at least 1",
                ));
            }
        }

        if self.orders.recent_capacity == 0 {
            return Err(ConfigError::invalid(
                "orders.recent_capacity",
                "must be at least 1",
            ));
        }
        check_int_range(
            ("orders.min_quantity", self.orders.min_quantity),
            ("orders.max_quantity", self.orders.max_quantity),
            1,
        )?;
        check_amount_range(
            ("orders.min_price", self.orders.min_price),
            ("orders.max_price", self.orders.max_price),
        )?;

        check_int_range(
            (
                "order_patterns.large_quantity_min",
                self.order_patterns.large_quantity_min,
            ),
            (
                "order_patterns.large_quantity_max",
                self.order_patterns.large_quantity_max,
            ),
            1,
        )?;
        check_int_range(
            (
                "order_patterns.min_cancel_delay_secs",
                self.order_patterns.min_cancel_delay_secs,
            ),
            (
                "order_patterns.max_cancel_delay_secs",
                self.order_patterns.max_cancel_delay_secs,
            ),
            0,
        )?;
        if self.order_patterns.max_reorder_delay_secs < 1 {
            return Err(ConfigError::invalid(
                "order_patterns.max_reorder_delay_secs",
                "must be at least 1",
            ));
        }
        // Delays are added to event times, keep them within the history bound
        for (key, secs) in [
            (
                "order_patterns.max_cancel_delay_secs",
                self.order_patterns.max_cancel_delay_secs,
            ),
            (
                "order_patterns.max_reorder_delay_secs",
                self.order_patterns.max_reorder_delay_secs,
            ),
        ] {
            if secs > MAX_HISTORY_WINDOW_SECS {
                return Err(ConfigError::invalid(
                    key,
                    format!("must be at most {MAX_HISTORY_WINDOW_SECS}"),
                ));
            }
        }

        if self.online_orders.max_products == 0 {
            return Err(ConfigError::invalid(
                "online_orders.max_products",
                "must be at least 1",
            ));
        }

        if self.reviews.catalog_size == 0 || self.reviews.catalog_size > MAX_CATALOG_SIZE {
            return Err(ConfigError::invalid(
                "reviews.catalog_size",
                format!("must be between 1 and {MAX_CATALOG_SIZE}"),
            ));
        }
        if self.reviews.products_with_size_issue_count > MAX_CATALOG_SIZE {
            return Err(ConfigError::invalid(
                "reviews.products_with_size_issue_count",
                format!("must be at most {MAX_CATALOG_SIZE}"),
            ));
        }

        for (key, p) in [
            ("reviews.size_issue_probability", self.reviews.size_issue_probability),
            (
                "online_orders.out_of_stock_probability",
                self.online_orders.out_of_stock_probability,
            ),
            (
                "transactions.abandon_probability",
                self.transactions.abandon_probability,
            ),
            (
                "transactions.new_transaction_probability",
                self.transactions.new_transaction_probability,
            ),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::invalid(
                    key,
                    format!("probability must be between 0 and 1, got {p}"),
                ));
            }
        }

        if self.transactions.max_in_flight == 0 {
            return Err(ConfigError::invalid(
                "transactions.max_in_flight",
                "must be at least 1",
            ));
        }
        check_amount_range(
            ("transactions.min_amount", self.transactions.min_amount),
            ("transactions.max_amount", self.transactions.max_amount),
        )?;

        Ok(())
    }

    pub fn order_settings(&self) -> OrderSettings {
        OrderSettings {
            min_quantity: self.orders.min_quantity,
            max_quantity: self.orders.max_quantity,
            min_price: self.orders.min_price,
            max_price: self.orders.max_price,
        }
    }

    pub fn order_pattern_settings(&self) -> OrderPatternSettings {
        OrderPatternSettings {
            large_quantity_min: self.order_patterns.large_quantity_min,
            large_quantity_max: self.order_patterns.large_quantity_max,
            min_cancel_delay_secs: self.order_patterns.min_cancel_delay_secs,
            max_cancel_delay_secs: self.order_patterns.max_cancel_delay_secs,
            max_reorder_delay_secs: self.order_patterns.max_reorder_delay_secs,
        }
    }

    pub fn online_order_settings(&self) -> OnlineOrderSettings {
        OnlineOrderSettings {
            max_products: self.online_orders.max_products,
            out_of_stock_probability: self.online_orders.out_of_stock_probability,
        }
    }

    pub fn review_settings(&self) -> ReviewSettings {
        ReviewSettings {
            catalog_size: self.reviews.catalog_size,
            products_with_size_issue: self.reviews.products_with_size_issue_count,
            size_issue_probability: self.reviews.size_issue_probability,
        }
    }

    pub fn transaction_settings(&self) -> TransactionSettings {
        TransactionSettings {
            abandon_probability: self.transactions.abandon_probability,
            new_transaction_probability: self.transactions.new_transaction_probability,
            max_in_flight: self.transactions.max_in_flight,
            min_amount: self.transactions.min_amount,
            max_amount: self.transactions.max_amount,
        }
    }
}

/// `min..=max` with `min >= floor`.
fn check_int_range(min: (&str, i64), max: (&str, i64), floor: i64) -> Result<(), ConfigError> {
    if min.1 < floor {
        return Err(ConfigError::invalid(min.0, format!("must be at least {floor}")));
    }
    if min.1 > max.1 {
        return Err(ConfigError::invalid(
            max.0,
            format!("must not be less than {} ({})", min.0, min.1),
        ));
    }
    Ok(())
}

/// A finite, non-negative `min..=max` money range.
fn check_amount_range(min: (&str, f64), max: (&str, f64)) -> Result<(), ConfigError> {
    if !(min.1.is_finite() && min.1 >= 0.0) {
        return Err(ConfigError::invalid(
            min.0,
            format!("must be a non-negative amount, got {}", min.1),
        ));
    }
    if !max.1.is_finite() || max.1 < min.1 {
        return Err(ConfigError::invalid(
            max.0,
            format!("must be a finite amount not less than {} ({})", min.0, min.1),
        ));
    }
    Ok(())
}
