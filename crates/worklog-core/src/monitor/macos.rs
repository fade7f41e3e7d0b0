use async_trait::async_trait;
use tokio::process::Command;

use super::{ForegroundProbe, ForegroundWindow};

const FRONTMOST_SCRIPT: &str = r#"
tell application "System Events"
    set frontApp to first application process whose frontmost is true
    set appName to name of frontApp
    set winTitle to ""
    try
        set winTitle to name of front window of frontApp
    end try
end tell
return appName & "|" & winTitle
"#;

/// Frontmost application via `osascript`
pub struct MacOsProbe;

/// `appName|winTitle`; titles may themselves contain `|`
fn parse_frontmost(stdout: &str) -> Option<ForegroundWindow> {
    let line = stdout.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return None;
    }
    let (app, title) = line.split_once('|').unwrap_or((line, ""));
    Some(ForegroundWindow::new(app.trim(), title))
}

#[async_trait]
impl ForegroundProbe for MacOsProbe {
    async fn sample(&self) -> Option<ForegroundWindow> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(FRONTMOST_SCRIPT)
            .output()
            .await
            .map_err(|e| log::debug!("osascript failed: {e}"))
            .ok()?;

        if !output.status.success() {
            return None;
        }
        parse_frontmost(&String::from_utf8_lossy(&output.stdout))
    }

    fn name(&self) -> &'static str {
        "osascript"
    }
}
