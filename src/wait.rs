use std::time::Duration;

use chromiumoxide::Page;
use tokio::time::Instant;

use crate::error::{RenderError, RenderResult};

/// Polls a page-evaluated boolean expression until it holds, at a bounded
/// interval under a deadline. Replaces the unbounded DOM polls a stalled
/// remote UI would otherwise turn into a permanent hang.
pub async fn wait_for_js(
    page: &Page,
    expr: &str,
    what: &str,
    timeout: Duration,
    interval: Duration,
) -> RenderResult<()> {
    let deadline = Instant::now() + timeout;
    loop {
        let holds = page
            .evaluate(expr)
            .await?
            .into_value::<bool>()
            .unwrap_or(false);
        if holds {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(RenderError::timeout(what, timeout));
        }
        tokio::time::sleep(interval).await;
    }
}

/// Polls a page-evaluated integer expression until `pred` holds on its value.
/// Used for the frame counter, where the UI-reported frame number is the only
/// authoritative timing signal.
pub async fn wait_for_js_u64(
    page: &Page,
    expr: &str,
    what: &str,
    timeout: Duration,
    interval: Duration,
    mut pred: impl FnMut(u64) -> bool,
) -> RenderResult<u64> {
    let deadline = Instant::now() + timeout;
    loop {
        let value = page
            .evaluate(expr)
            .await?
            .into_value::<u64>()
            .unwrap_or(0);
        if pred(value) {
            return Ok(value);
        }
        if Instant::now() >= deadline {
            return Err(RenderError::timeout(what, timeout));
        }
        tokio::time::sleep(interval).await;
    }
}
