//! Real-Time Price Feeds
//!
//! WebSocket transports implementing `PriceTransport`.

pub mod coincap;

pub use coincap::CoinCapTransport;
