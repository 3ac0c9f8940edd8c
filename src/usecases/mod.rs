//! Use Cases Layer - Application Logic
//!
//! Orchestrates domain logic with port interfaces. Each use case is a
//! long-lived service held in the application context.
//!
//! Use cases:
//! - `PriceMonitor`: Live price subscription, reconnects, move alerts
//! - `DashboardService`: Feed polling, manual refresh, favorites
//! - `AlertCenter`: Collects alerts from the alert channel

pub mod alert_center;
pub mod dashboard;
pub mod price_monitor;
