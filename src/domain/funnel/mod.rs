// Captures and their lifecycle
pub mod capture;

// Listing filters
pub mod filter;

// Monthly revenue targets
pub mod goal;

// Admin notes for advisors
pub mod observation;

// Product reference data
pub mod product;

// Status, category, probability and month helpers
pub mod types;

pub use capture::{CaptureRecord, CaptureUpdate, NewCapture};
pub use filter::{CaptureFilter, DEFAULT_CAPTURE_LIMIT};
pub use goal::MonthlyGoal;
pub use observation::{Observation, ObservationFilter};
pub use product::ProductConfig;
pub use types::{ClientCategory, DateWindow, FunnelStatus, Probability};
