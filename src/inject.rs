use base64::Engine as _;
use chromiumoxide::{Page, cdp::browser_protocol::page::ReloadParams};
use tracing::debug;

use crate::{
    error::{RenderError, RenderResult},
    model::{RenderSession, UserIdentity},
    settings::Settings,
    wait,
};

/// Large enough to clear the remote UI's score-gated heuristics.
const SCORE_SENTINEL: &str = "100000000";

/// Writes session state into the page's persisted storage and reloads so it
/// takes effect, then waits for the menus container to come out of hiding —
/// the DOM-observed ready signal that replaces a fixed delay.
pub async fn inject_session(
    page: &Page,
    session: &RenderSession,
    identity: &UserIdentity,
    last_patch: &str,
    settings: &Settings,
) -> RenderResult<()> {
    let token = serde_json::to_string(&session.token).map_err(anyhow::Error::from)?;
    let username = serde_json::to_string(&identity.username).map_err(anyhow::Error::from)?;
    let user_id = serde_json::to_string(&identity.id).map_err(anyhow::Error::from)?;
    let patch = serde_json::to_string(last_patch).map_err(anyhow::Error::from)?;
    // Double-encoded: the page stores the config as a JSON string.
    let config =
        serde_json::to_string(&serde_json::to_string(&session.config).map_err(anyhow::Error::from)?)
            .map_err(anyhow::Error::from)?;

    let script = format!(
        r#"(() => {{
            localStorage.setItem("tetrio_userToken", {token});
            localStorage.setItem("feecofScore", "{SCORE_SENTINEL}");
            // block the version popup
            localStorage.setItem("lastPatch", {patch});
            localStorage.setItem("moonKagariUsername", {username});
            localStorage.setItem("tetrio_lastUsername", {username});
            localStorage.setItem("tetrio_username", {username});
            localStorage.setItem("tetrio_userID", {user_id});
            localStorage.setItem("userConfig", {config});
            return true;
        }})()"#
    );
    page.evaluate(script).await?;

    debug!("session state written, reloading");
    page.execute(ReloadParams::default()).await?;
    page.wait_for_navigation().await?;

    wait::wait_for_js(
        page,
        "!!document.querySelector('#return_button')",
        "return prompt",
        settings.ready_timeout,
        settings.dom_poll_interval,
    )
    .await?;
    page.evaluate("document.querySelector('#return_button').click(); true")
        .await?;

    wait::wait_for_js(
        page,
        "(() => { const el = document.getElementById('menus'); return !!el && !el.classList.contains('hidden'); })()",
        "menus visible",
        settings.ready_timeout,
        settings.dom_poll_interval,
    )
    .await
}

/// Simulates a native drag-and-drop of in-memory bytes onto `selector`,
/// carried as a `File` in the data-transfer payload of a
/// dragenter/dragover/drop sequence. The remote UI treats the payload as an
/// uploaded replay file.
pub async fn drop_payload(
    page: &Page,
    selector: &str,
    bytes: &[u8],
    filename: &str,
    mime_type: &str,
) -> RenderResult<()> {
    let exists = page
        .evaluate(format!(
            "!!document.querySelector({})",
            serde_json::to_string(selector).map_err(anyhow::Error::from)?
        ))
        .await?
        .into_value::<bool>()
        .unwrap_or(false);
    if !exists {
        return Err(RenderError::validation(format!(
            "drop target not found: {selector}"
        )));
    }

    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    let selector_js = serde_json::to_string(selector).map_err(anyhow::Error::from)?;
    let filename_js = serde_json::to_string(filename).map_err(anyhow::Error::from)?;
    let mime_js = serde_json::to_string(mime_type).map_err(anyhow::Error::from)?;

    let script = format!(
        r#"() => {{
            const dropTarget = document.querySelector({selector_js});
            const binary = atob("{payload}");
            const bytes = new Uint8Array(binary.length);
            for (let i = 0; i < binary.length; i++) {{
                bytes[i] = binary.charCodeAt(i);
            }}

            const file = new File([bytes], {filename_js}, {{ type: {mime_js} }});
            const dataTransfer = new DataTransfer();
            dataTransfer.items.add(file);

            for (const type of ["dragenter", "dragover", "drop"]) {{
                dropTarget.dispatchEvent(new DragEvent(type, {{
                    bubbles: true,
                    cancelable: true,
                    dataTransfer,
                }}));
            }}
            return true;
        }}"#
    );

    debug!(selector, filename, len = bytes.len(), "dropping payload");
    page.evaluate_function(script).await?;
    Ok(())
}
