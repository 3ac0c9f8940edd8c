//! Alerts raised by the price monitor and the weather threshold check.
//!
//! An `Alert` is immutable once created: its fields are private and only
//! exposed through accessors. Collections of alerts only grow by push and
//! shrink by removal of a whole alert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    /// Price movement or price-feed transport problem.
    Price,
    /// Weather condition crossed a configured threshold.
    Weather,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Price => write!(f, "price"),
            Self::Weather => write!(f, "weather"),
        }
    }
}

/// A single notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    id: Uuid,
    kind: AlertKind,
    message: String,
    created_at: DateTime<Utc>,
}

impl Alert {
    /// Create a new alert stamped with the current time.
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    /// Shorthand for a price alert.
    pub fn price(message: impl Into<String>) -> Self {
        Self::new(AlertKind::Price, message)
    }

    /// Shorthand for a weather alert.
    pub fn weather(message: impl Into<String>) -> Self {
        Self::new(AlertKind::Weather, message)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> AlertKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append-only list of alerts with removal by id.
#[derive(Debug, Default, Clone, Serialize)]
pub struct AlertBook {
    alerts: Vec<Alert>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an alert at the end.
    pub fn push(&mut self, alert: Alert) {
        self.alerts.push(alert);
    }

    /// Remove the alert with the given id. Returns whether one was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.alerts.len();
        self.alerts.retain(|a| a.id != id);
        self.alerts.len() != before
    }

    /// Drop every alert.
    pub fn clear(&mut self) {
        self.alerts.clear();
    }

    /// Most recently appended alert.
    pub fn latest(&self) -> Option<&Alert> {
        self.alerts.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Owned copy of all alerts in insertion order.
    pub fn to_vec(&self) -> Vec<Alert> {
        self.alerts.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_ids_are_unique() {
        let a = Alert::price("one");
        let b = Alert::price("one");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.kind(), AlertKind::Price);
    }

    #[test]
    fn test_book_remove_by_id() {
        let mut book = AlertBook::new();
        let first = Alert::price("BTC up");
        let second = Alert::weather("Tokyo hot");
        let first_id = first.id();
        book.push(first);
        book.push(second.clone());

        assert!(book.remove(first_id));
        assert!(!book.remove(first_id));
        assert_eq!(book.len(), 1);
        assert_eq!(book.latest(), Some(&second));
    }

    #[test]
    fn test_book_clear() {
        let mut book = AlertBook::new();
        book.push(Alert::price("x"));
        book.clear();
        assert!(book.is_empty());
        assert!(book.latest().is_none());
    }

    #[test]
    fn test_kind_serializes_lowercase() {
        let json = serde_json::to_string(&AlertKind::Weather).unwrap();
        assert_eq!(json, "\"weather\"");
    }
}
