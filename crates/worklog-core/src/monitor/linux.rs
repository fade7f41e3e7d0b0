use async_trait::async_trait;
use tokio::process::Command;

use super::{process_name_for_pid, window_for_pid, ForegroundProbe, ForegroundWindow};

/// X11 foreground window via `xdotool`
pub struct XdotoolProbe;

impl XdotoolProbe {
    async fn query() -> Option<ForegroundWindow> {
        let output = Command::new("xdotool")
            .args(["getactivewindow", "getwindowpid", "getwindowname"])
            .output()
            .await
            .map_err(|e| log::debug!("xdotool unavailable: {e}"))
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let (pid, title) = parse_xdotool_output(&stdout)?;
        window_for_pid(pid, title, process_name_for_pid)
    }
}

/// First line is the window pid, second the title (possibly empty)
fn parse_xdotool_output(stdout: &str) -> Option<(u32, String)> {
    let mut lines = stdout.lines();
    let pid = lines.next()?.trim().parse().ok()?;
    let title = lines.next().unwrap_or_default().to_string();
    Some((pid, title))
}

#[async_trait]
impl ForegroundProbe for XdotoolProbe {
    async fn sample(&self) -> Option<ForegroundWindow> {
        Self::query().await
    }

    fn name(&self) -> &'static str {
        "xdotool"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xdotool_output() {
        assert_eq!(
            parse_xdotool_output("4242\nmain.rs - Visual Studio Code\n"),
            Some((4242, "main.rs - Visual Studio Code".to_string()))
        );
        assert_eq!(parse_xdotool_output("17\n"), Some((17, String::new())));
        assert_eq!(parse_xdotool_output(""), None);
        assert_eq!(parse_xdotool_output("not-a-pid\ntitle"), None);
    }
}
