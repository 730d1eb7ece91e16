pub mod dashboard;
pub mod funnel_service;

pub use dashboard::{Dashboard, DashboardOptions};
pub use funnel_service::{FunnelResult, FunnelService};
