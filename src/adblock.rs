use std::sync::{Arc, Mutex};

use chromiumoxide::{
    Page,
    cdp::browser_protocol::{
        fetch::{ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams},
        network::ErrorReason,
    },
};
use futures::StreamExt;
use tracing::{debug, warn};

use crate::error::{RenderError, RenderResult};

/// Hosts and paths whose requests never reach the network. A missed block is
/// a minor telemetry leak, not a failure.
const BLOCKLIST: &[&str] = &[
    "googlesyndication.com",
    ".doubleclick.net",
    ".amazon-adsystem.com",
    ".adnxs.com",
    "matomo.js",
    "sentry-cdn.com",
    "cdn.intergient.com",
    "googletagmanager.com",
];

pub fn is_blocked(url: &str) -> bool {
    BLOCKLIST.iter().any(|pattern| url.contains(pattern))
}

/// Per-page request interception. Dropping the filter stops the interception
/// task; the paused-request stream itself ends when the page closes.
pub struct AdFilter {
    blocked: Arc<Mutex<Vec<String>>>,
    task: tokio::task::JoinHandle<()>,
}

impl AdFilter {
    /// Enables interception and installs the per-request handler. Must run
    /// before navigation; only requests issued afterwards are intercepted.
    pub async fn install(page: &Page) -> RenderResult<Self> {
        page.execute(EnableParams::default()).await?;
        let mut paused = page.event_listener::<EventRequestPaused>().await?;

        let blocked = Arc::new(Mutex::new(Vec::new()));
        let blocked_log = Arc::clone(&blocked);
        let page = page.clone();

        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let url = event.request.url.clone();
                if is_blocked(&url) {
                    debug!(url, "aborting blocklisted request");
                    if let Ok(mut log) = blocked_log.lock() {
                        log.push(url);
                    }
                    let fail = FailRequestParams::builder()
                        .request_id(event.request_id.clone())
                        .error_reason(ErrorReason::Aborted)
                        .build();
                    match fail {
                        Ok(params) => {
                            if let Err(err) = page.execute(params).await {
                                warn!(%err, "failed to abort blocklisted request");
                            }
                        }
                        Err(err) => warn!(%err, "failed to build abort command"),
                    }
                } else {
                    let cont = ContinueRequestParams::builder()
                        .request_id(event.request_id.clone())
                        .build();
                    match cont {
                        Ok(params) => {
                            if let Err(err) = page.execute(params).await {
                                warn!(%err, "failed to continue request");
                            }
                        }
                        Err(err) => warn!(%err, "failed to build continue command"),
                    }
                }
            }
        });

        Ok(Self { blocked, task })
    }

    /// URLs aborted so far.
    pub fn blocked_urls(&self) -> Vec<String> {
        self.blocked.lock().map(|b| b.clone()).unwrap_or_default()
    }
}

impl Drop for AdFilter {
    fn drop(&mut self) {
        self.task.abort();
    }
}
