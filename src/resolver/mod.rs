//! C5 Conflict Resolver.

pub mod conflict;

pub use conflict::{resolve_flights, resolve_weather, ResolverConfig};
