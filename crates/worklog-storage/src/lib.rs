pub mod day;
pub mod db;
pub mod migrations;
pub mod models;
pub mod store;

pub use day::{local_day_bounds, today_in};
pub use db::Database;
pub use models::{
    duration_seconds_between, AppSetting, DailyReport, ProcessSeconds, ProcessUsage, WindowSession,
};
pub use store::ActivityStore;
