//! Catalog domain: price and availability resolution

pub mod resolver;

pub use resolver::{PriceResolver, Resolution, resolve_items};
