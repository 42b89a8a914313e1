//! C2 TTL Cache.

pub mod ttl_cache;

pub use ttl_cache::{generate_key, Clock, FixedClock, SystemClock, TtlCache};
