pub mod http;
pub mod slack;
pub mod traits;

pub use http::{build_client, ResponseExt};
pub use slack::{SlackMessage, SlackWebhook, DEFAULT_DELIVERY_TIMEOUT};
pub use traits::DeliverySink;
