pub mod activity;
pub mod config;
pub mod context;
pub mod helpers;
pub mod init;
pub mod report;
pub mod run;
