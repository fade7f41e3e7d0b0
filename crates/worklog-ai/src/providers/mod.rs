pub mod ollama;
pub mod openai;

use std::time::Duration;

/// Upper bound for one summarization round trip
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(60);
