use super::*;
use async_trait::async_trait;
use std::sync::Mutex;

/// Provider double that records requests and replays a canned answer
struct ScriptedProvider {
    answer: Result<String, String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(error: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(error.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiProvider for ScriptedProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.answer.clone().map_err(anyhow::Error::msg)
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn usage(name: &str, minutes: f64) -> ProcessUsage {
    ProcessUsage {
        process_name: name.to_string(),
        total_minutes: minutes,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

#[tokio::test]
async fn test_empty_stats_skip_provider() {
    let provider = ScriptedProvider::answering("unused");
    let composer = ReportComposer::new(provider.clone());

    let text = composer.compose(date(), &[]).await.unwrap();

    assert_eq!(
        text,
        "Daily work report for 2024-06-03: No window activity was recorded for this day."
    );
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn test_two_row_table_in_request() {
    let provider = ScriptedProvider::answering("  Mostly coding.\n");
    let composer = ReportComposer::new(provider.clone());

    let text = composer
        .compose(date(), &[usage("A", 120.0), usage("B", 30.0)])
        .await
        .unwrap();

    assert_eq!(text, "Mostly coding.");
    let requests = provider.requests();
    assert_eq!(requests.len(), 1);

    let request = &requests[0];
    assert_eq!(request.system, SYSTEM_INSTRUCTION);
    assert_eq!(request.max_tokens, MAX_REPORT_TOKENS);
    assert!(request.user.starts_with("Date: 2024-06-03\n"));
    assert!(request
        .user
        .contains("Application | Total minutes\n---|---\nA | 120.0\nB | 30.0\n"));
    assert!(request.user.ends_with("Write the daily work report:"));
}

#[tokio::test]
async fn test_table_capped_at_thirty_rows() {
    let provider = ScriptedProvider::answering("ok");
    let composer = ReportComposer::new(provider.clone());

    // Already ordered by time, largest first
    let stats: Vec<ProcessUsage> = (0..40)
        .map(|i| usage(&format!("proc{i:02}"), f64::from(400 - i)))
        .collect();

    composer.compose(date(), &stats).await.unwrap();

    let user = &provider.requests()[0].user;
    let rows = user.lines().filter(|line| line.starts_with("proc")).count();
    assert_eq!(rows, MAX_TABLE_ROWS);
    assert!(user.contains("proc29 | 371.0"));
    assert!(!user.contains("proc30"));
}

#[tokio::test]
async fn test_blank_response_uses_fallback() {
    let provider = ScriptedProvider::answering("   \n ");
    let composer = ReportComposer::new(provider);

    let text = composer.compose(date(), &[usage("A", 1.0)]).await.unwrap();
    assert_eq!(text, EMPTY_RESPONSE_FALLBACK);
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let provider = ScriptedProvider::failing("quota exceeded");
    let composer = ReportComposer::new(provider);

    let err = composer.compose(date(), &[usage("A", 1.0)]).await.unwrap_err();
    assert!(err.to_string().contains("quota exceeded"));
}

#[test]
fn test_usage_table_formats_one_decimal() {
    let table = ReportComposer::build_usage_table(&[usage("code.exe", 12.34)]);
    assert_eq!(table, "Application | Total minutes\n---|---\ncode.exe | 12.3");
}
