//! Funnel metrics
//!
//! Pure aggregations over captures the requester is already allowed to see.
//! Nothing here fetches data or fails: empty inputs produce zero values.

pub mod conversion;
pub mod forecast;
pub mod semaphore;
pub mod series;
pub mod summary;

pub use conversion::{FunnelTotals, StatusBreakdown, conversion_rate};
pub use forecast::{
    GoalProgress, ProductCatalogue, RecognitionBucket, recognition_schedule, weighted_pipeline,
};
pub use semaphore::{SemaphoreLight, SemaphoreThresholds};
pub use series::{SeriesPoint, daily_series, monthly_series};
pub use summary::{AdvisorSummary, advisor_summaries, prospect_only_clients};
