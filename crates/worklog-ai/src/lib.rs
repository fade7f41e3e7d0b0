pub mod ai_provider;
pub mod providers;
pub mod report_composer;

pub use ai_provider::{create_provider, AiProvider, CompletionRequest, ProviderConfig, ProviderKind};
pub use report_composer::{ReportComposer, MAX_TABLE_ROWS};
