use std::{path::PathBuf, time::Duration};

/// Every tunable of the render engine in one place. `Default` mirrors the
/// production values; `from_env` applies environment overrides.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Where finished captures land. Overridable via `STORAGE_FOLDER`.
    pub storage_dir: PathBuf,
    pub site_url: String,
    pub api_base: String,
    pub patchnotes_url: String,
    pub user_agent: String,

    /// CSS viewport of the capture page.
    pub viewport: (u32, u32),
    /// Outer window size; taller than the viewport to keep browser chrome
    /// out of the rendered surface.
    pub window: (u32, u32),

    /// Deadline for DOM readiness gates (menus visible, playback enabled,
    /// notifications collapsed).
    pub ready_timeout: Duration,
    /// Deadline for the remote UI to acknowledge the dropped replay.
    pub upload_timeout: Duration,
    /// Deadline for the frame counter to reach a target's end frame.
    pub frame_deadline: Duration,
    /// One frame at typical refresh rate.
    pub frame_poll_interval: Duration,
    pub dom_poll_interval: Duration,

    /// Settle between seeking and starting the capture stream.
    pub capture_settle: Duration,
    /// Settle between the end condition and stopping the stream.
    pub stop_settle: Duration,
    /// How long to wait for the recorder to flush its final chunk.
    pub flush_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("/tmp/replaycast"),
            site_url: "https://tetr.io/".to_string(),
            api_base: "https://tetr.io/api".to_string(),
            patchnotes_url: "https://tetr.io/about/patchnotes/notes.json".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/90.0.4430.212 Safari/537.36"
                .to_string(),
            viewport: (1920, 1080),
            window: (1920, 1150),
            ready_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(60),
            frame_deadline: Duration::from_secs(600),
            frame_poll_interval: Duration::from_millis(16),
            dom_poll_interval: Duration::from_millis(50),
            capture_settle: Duration::from_millis(100),
            stop_settle: Duration::from_millis(150),
            flush_timeout: Duration::from_secs(10),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(dir) = std::env::var("STORAGE_FOLDER") {
            if !dir.is_empty() {
                settings.storage_dir = PathBuf::from(dir);
            }
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.viewport, (1920, 1080));
        assert!(s.window.1 > s.viewport.1);
        assert!(s.frame_poll_interval < s.dom_poll_interval);
        assert!(s.frame_deadline > s.ready_timeout);
    }
}
