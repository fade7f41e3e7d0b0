use async_trait::async_trait;
use windows::Win32::UI::WindowsAndMessaging::{
    GetForegroundWindow, GetWindowTextW, GetWindowThreadProcessId,
};

use super::{process_name_for_pid, window_for_pid, ForegroundProbe, ForegroundWindow};

const TITLE_CAPACITY: usize = 512;

/// Foreground window via Win32
pub struct Win32Probe;

impl Win32Probe {
    fn foreground() -> Option<ForegroundWindow> {
        // SAFETY: read-only queries on the foreground window handle; the
        // title buffer outlives the call and its length is passed along.
        let (pid, title) = unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0 == 0 {
                return None;
            }

            let mut pid = 0u32;
            GetWindowThreadProcessId(hwnd, Some(&mut pid));

            let mut buffer = [0u16; TITLE_CAPACITY];
            let len = GetWindowTextW(hwnd, &mut buffer);
            let len = usize::try_from(len).unwrap_or(0).min(TITLE_CAPACITY);
            (pid, String::from_utf16_lossy(&buffer[..len]))
        };

        if pid == 0 {
            return None;
        }
        window_for_pid(pid, title, process_name_for_pid)
    }
}

#[async_trait]
impl ForegroundProbe for Win32Probe {
    async fn sample(&self) -> Option<ForegroundWindow> {
        Self::foreground()
    }

    fn name(&self) -> &'static str {
        "win32"
    }
}
