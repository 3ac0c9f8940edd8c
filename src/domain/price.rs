//! Per-asset price tracking and percentage-move detection.
//!
//! The tracker keeps the last observed price for every asset and reports
//! a `PriceMove` whenever a new observation differs from the previous one
//! by at least the configured percentage. It has no I/O and no clock of
//! its own; callers pass timestamps in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Push-feed asset identifier (e.g. "bitcoin").
pub type AssetId = String;

/// Latest-price publication for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Asset identifier.
    pub asset: AssetId,
    /// Observed price in USD.
    pub price: f64,
    /// Observation time (Unix ms).
    pub timestamp_ms: u64,
}

/// Stored state for one asset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedPrice {
    /// Most recent price.
    pub current: f64,
    /// Price before the most recent one, if any.
    pub previous: Option<f64>,
    /// Time of the most recent observation (Unix ms).
    pub updated_ms: u64,
}

/// Direction of a price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increased,
    Decreased,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Increased => write!(f, "increased"),
            Self::Decreased => write!(f, "decreased"),
        }
    }
}

/// A move at or beyond the alert threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMove {
    pub asset: AssetId,
    /// Signed percentage change relative to the previous price.
    pub percent_change: f64,
}

impl PriceMove {
    pub fn direction(&self) -> Direction {
        if self.percent_change > 0.0 {
            Direction::Increased
        } else {
            Direction::Decreased
        }
    }

    /// Human-readable alert text, e.g. "BITCOIN price has increased by 1.00%".
    pub fn message(&self) -> String {
        format!(
            "{} price has {} by {:.2}%",
            self.asset.to_uppercase(),
            self.direction(),
            self.percent_change.abs()
        )
    }
}

/// Signed percentage change from `previous` to `current`.
///
/// Returns `None` when `previous` is not a usable base (zero, negative
/// or non-finite).
pub fn percent_change(previous: f64, current: f64) -> Option<f64> {
    if !previous.is_finite() || previous <= 0.0 {
        return None;
    }
    Some((current - previous) * 100.0 / previous)
}

/// Last-price memory for a set of assets.
#[derive(Debug, Clone)]
pub struct PriceTracker {
    threshold_pct: f64,
    prices: HashMap<AssetId, TrackedPrice>,
}

impl PriceTracker {
    /// Create a tracker that reports moves of at least `threshold_pct` percent.
    pub fn new(threshold_pct: f64) -> Self {
        Self {
            threshold_pct,
            prices: HashMap::new(),
        }
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    /// Record an observation and report a threshold move, if any.
    ///
    /// The first observation of an asset is only recorded. The new price
    /// always replaces the stored one, whether or not a move is reported.
    pub fn observe(&mut self, asset: &str, price: f64, timestamp_ms: u64) -> Option<PriceMove> {
        let previous = self.prices.get(asset).map(|p| p.current);

        self.prices.insert(
            asset.to_string(),
            TrackedPrice {
                current: price,
                previous,
                updated_ms: timestamp_ms,
            },
        );

        let change = percent_change(previous?, price)?;
        (change.abs() >= self.threshold_pct).then(|| PriceMove {
            asset: asset.to_string(),
            percent_change: change,
        })
    }

    pub fn get(&self, asset: &str) -> Option<&TrackedPrice> {
        self.prices.get(asset)
    }

    /// Current price of every tracked asset.
    pub fn latest(&self) -> HashMap<AssetId, f64> {
        self.prices
            .iter()
            .map(|(asset, p)| (asset.clone(), p.current))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}
