// Row-level access policy
pub mod access;

// Domain-specific error types
pub mod errors;

// Funnel records and reference data
pub mod funnel;

// Caller identity
pub mod identity;

// Derived funnel metrics
pub mod metrics;

// Repository traits
pub mod repositories;
