pub mod observability;
pub mod persistence;

pub use observability::Metrics;
pub use persistence::Database;
