use async_trait::async_trait;
use std::sync::Arc;

#[cfg(target_os = "macos")]
pub mod macos;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

/// Name used when the OS reports a window but no owning process name
pub const UNKNOWN_PROCESS: &str = "Unknown";

/// What the user is looking at right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForegroundWindow {
    pub process_name: String,
    pub window_title: String,
}

impl ForegroundWindow {
    #[must_use]
    pub fn new(process_name: impl Into<String>, window_title: impl Into<String>) -> Self {
        let process_name = process_name.into();
        let process_name = if process_name.trim().is_empty() {
            UNKNOWN_PROCESS.to_string()
        } else {
            process_name
        };
        Self {
            process_name,
            window_title: window_title.into(),
        }
    }
}

/// Platform-specific foreground window sampler
#[async_trait]
pub trait ForegroundProbe: Send + Sync {
    /// Sample the current foreground window.
    ///
    /// `None` means "no signal": no foreground window, a transient OS error,
    /// or an unsupported platform. Implementations never fail.
    async fn sample(&self) -> Option<ForegroundWindow>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

/// Probe for platforms without a foreground window API
pub struct NoSignalProbe;

#[async_trait]
impl ForegroundProbe for NoSignalProbe {
    async fn sample(&self) -> Option<ForegroundWindow> {
        None
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Create the probe for the current platform
#[must_use]
pub fn create_probe() -> Arc<dyn ForegroundProbe> {
    #[cfg(target_os = "macos")]
    {
        Arc::new(macos::MacOsProbe)
    }

    #[cfg(target_os = "linux")]
    {
        Arc::new(linux::XdotoolProbe)
    }

    #[cfg(target_os = "windows")]
    {
        Arc::new(windows::Win32Probe)
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        log::warn!("Foreground window sampling is not supported on this platform");
        Arc::new(NoSignalProbe)
    }
}

/// Window owned by `pid`, or no signal when the owning process can't be read
#[cfg(any(target_os = "linux", target_os = "windows"))]
pub(crate) fn window_for_pid(
    pid: u32,
    title: String,
    lookup: impl Fn(u32) -> Option<String>,
) -> Option<ForegroundWindow> {
    let process_name = lookup(pid)?;
    Some(ForegroundWindow::new(process_name, title))
}

/// Executable name of a running process
#[cfg(any(target_os = "linux", target_os = "windows"))]
pub(crate) fn process_name_for_pid(pid: u32) -> Option<String> {
    use sysinfo::{Pid, System};

    let pid = Pid::from(usize::try_from(pid).ok()?);
    let mut system = System::new();
    if !system.refresh_process(pid) {
        return None;
    }
    system.process(pid).map(|process| process.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_process_name_becomes_unknown() {
        let window = ForegroundWindow::new("  ", "Untitled");
        assert_eq!(window.process_name, UNKNOWN_PROCESS);
        assert_eq!(window.window_title, "Untitled");
    }

    #[tokio::test]
    async fn test_no_signal_probe() {
        let probe = NoSignalProbe;
        assert_eq!(probe.sample().await, None);
        assert_eq!(probe.name(), "none");
    }

    #[cfg(any(target_os = "linux", target_os = "windows"))]
    #[test]
    fn test_process_name_for_own_pid() {
        let name = process_name_for_pid(std::process::id());
        assert!(name.is_some_and(|name| !name.is_empty()));
    }

    #[cfg(any(target_os = "linux", target_os = "windows"))]
    #[test]
    fn test_failed_process_lookup_is_no_signal() {
        assert_eq!(window_for_pid(4242, "Docs".to_string(), |_| None), None);

        let window = window_for_pid(4242, "Docs".to_string(), |_| Some(String::new()));
        assert_eq!(window, Some(ForegroundWindow::new(UNKNOWN_PROCESS, "Docs")));

        let window = window_for_pid(4242, "Docs".to_string(), |pid| {
            assert_eq!(pid, 4242);
            Some("firefox".to_string())
        });
        assert_eq!(window, Some(ForegroundWindow::new("firefox", "Docs")));
    }

    #[cfg(any(target_os = "linux", target_os = "windows"))]
    #[test]
    fn test_exited_process_is_no_signal() {
        let mut child = std::process::Command::new(std::env::current_exe().unwrap())
            .arg("--help")
            .stdout(std::process::Stdio::null())
            .spawn()
            .unwrap();
        let pid = child.id();
        child.wait().unwrap();

        assert_eq!(process_name_for_pid(pid), None);
        assert_eq!(window_for_pid(pid, "Docs".to_string(), process_name_for_pid), None);
    }
}
