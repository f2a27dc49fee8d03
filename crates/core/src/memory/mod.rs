pub mod bounded;
pub mod stats;
pub mod store;

pub use bounded::BoundedMap;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::MessageStore;
