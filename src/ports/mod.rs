//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use-case layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `PriceTransport`: Push-price subscription for the live monitor
//! - `WeatherSource` / `CryptoSource` / `NewsSource`: REST data feeds

pub mod price_feed;
pub mod sources;
