pub mod database;
pub(crate) mod repositories;

pub use database::Database;
