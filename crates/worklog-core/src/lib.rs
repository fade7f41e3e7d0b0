pub mod aggregator;
pub mod clock;
pub mod config;
pub mod monitor;
pub mod pipeline;
pub mod scheduler;
pub mod service;
pub mod tracker;

pub use aggregator::daily_stats;
pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, Settings};
pub use monitor::{create_probe, ForegroundProbe, ForegroundWindow};
pub use pipeline::{PipelineOutcome, ReportPipeline};
pub use scheduler::{DailyTrigger, ReportScheduler, SchedulerHandle, TriggerParseError};
pub use service::WorklogService;
pub use tracker::{SessionTracker, TrackerState};
