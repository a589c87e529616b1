use chromiumoxide::{
    Page,
    browser::{Browser, BrowserConfig, HeadlessMode},
};
use futures::StreamExt;
use tracing::{debug, info};

use crate::{
    error::{RenderError, RenderResult},
    settings::Settings,
};

/// Owns the one browser process shared by every render call. Launch happens
/// once at process start; a launch failure is fatal and surfaced, never
/// retried. Each render call opens its own page.
pub struct BrowserHost {
    browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserHost {
    pub async fn launch(settings: &Settings) -> RenderResult<Self> {
        let (width, height) = settings.window;
        let config = BrowserConfig::builder()
            .headless_mode(HeadlessMode::New)
            .window_size(width, height)
            .arg(format!("--window-size={width},{height}"))
            // Promptless current-tab capture with audio.
            .arg("--auto-accept-this-tab-capture")
            .arg("--use-fake-ui-for-media-stream")
            .arg("--autoplay-policy=no-user-gesture-required")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--hide-scrollbars")
            .build()
            .map_err(RenderError::browser)?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            RenderError::browser(format!(
                "failed to launch browser (is Chromium installed?): {e}"
            ))
        })?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(%err, "browser handler event error");
                }
            }
        });

        info!("browser launched");
        Ok(Self {
            browser,
            handler_task,
        })
    }

    pub async fn new_page(&self) -> RenderResult<Page> {
        Ok(self.browser.new_page("about:blank").await?)
    }

    /// Closes the browser and its control channel. Safe only once no renders
    /// are in flight.
    pub async fn terminate(mut self) -> RenderResult<()> {
        self.browser.close().await?;
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        info!("browser terminated");
        Ok(())
    }
}
