//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (REST clients, WebSockets, HTTP servers).
//! Each sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `feeds`: Live push-price transport (CoinCap WebSocket)
//! - `http`: Dashboard JSON API
//! - `metrics`: Prometheus metrics export and health checks
//! - `sources`: WeatherAPI, CoinGecko and NewsData REST clients

pub mod feeds;
pub mod http;
pub mod metrics;
pub mod sources;
