use chromiumoxide::{Page, cdp::browser_protocol::emulation::SetUserAgentOverrideParams};
use tracing::{info, warn};

use crate::{
    adblock::AdFilter,
    browser::BrowserHost,
    capture, encode, inject,
    error::{RenderError, RenderResult},
    model::{Replay, RenderSession, Target, TargetOutcome, UserIdentity},
    segment::SegmentRecorder,
    session::ApiClient,
    settings::Settings,
    storage::OutputStore,
    wait,
};

/// Composes the full render sequence: one shared browser, one page per call,
/// one capture + finalize pass per target.
pub struct Renderer {
    host: BrowserHost,
    api: ApiClient,
    store: OutputStore,
    settings: Settings,
}

impl Renderer {
    /// Probes for the external encoder and launches the browser. Both are
    /// fatal at startup when missing; neither is retried.
    pub async fn new(settings: Settings) -> RenderResult<Self> {
        encode::ensure_ffmpeg()?;
        let api = ApiClient::new(&settings)?;
        let host = BrowserHost::launch(&settings).await?;
        let store = OutputStore::new(settings.storage_dir.clone());
        Ok(Self {
            host,
            api,
            store,
            settings,
        })
    }

    /// Plays back `replay` and captures each target as one webm under the
    /// storage directory. Target-scoped failures are recorded per outcome
    /// and later targets still run; page-scoped failures fail the call.
    pub async fn render(
        &self,
        session: &RenderSession,
        replay: &Replay,
        targets: &[Target],
    ) -> RenderResult<Vec<TargetOutcome>> {
        // Fresh per call: tokens and patches change between calls.
        let identity = self.api.fetch_identity(&session.token).await?;
        let last_patch = self.api.fetch_last_patch().await?;
        self.store.ensure_dir()?;

        let page = self.host.new_page().await?;
        let result = self
            .render_on_page(&page, session, &identity, &last_patch, replay, targets)
            .await;
        // The page is released on every exit path, not only the happy one.
        if let Err(err) = page.close().await {
            warn!(%err, "failed to close render page");
        }
        result
    }

    async fn render_on_page(
        &self,
        page: &Page,
        session: &RenderSession,
        identity: &UserIdentity,
        last_patch: &str,
        replay: &Replay,
        targets: &[Target],
    ) -> RenderResult<Vec<TargetOutcome>> {
        // Interception only affects requests issued after activation, so the
        // filter goes in before navigation.
        let _ad_filter = AdFilter::install(page).await?;

        let ua = SetUserAgentOverrideParams::builder()
            .user_agent(self.settings.user_agent.clone())
            .build()
            .map_err(RenderError::browser)?;
        page.execute(ua).await?;

        page.goto(self.settings.site_url.clone()).await?;
        inject::inject_session(page, session, identity, last_patch, &self.settings).await?;

        inject::drop_payload(
            page,
            "#menus",
            &replay.to_bytes()?,
            "replay.ttrm",
            "application/json",
        )
        .await?;
        wait::wait_for_js(
            page,
            "(() => { const el = document.querySelector('.noreplay'); \
              return !!el && !el.classList.contains('hidden'); })()",
            "replay loaded",
            self.settings.upload_timeout,
            self.settings.dom_poll_interval,
        )
        .await?;

        let previous_status = self.read_presence_status(page).await;
        self.set_presence_status(page, "busy").await?;

        wait::wait_for_js(
            page,
            "(() => { const el = document.getElementById('notifications'); \
              return !!el && el.offsetHeight === 0; })()",
            "notifications collapsed",
            self.settings.ready_timeout,
            self.settings.dom_poll_interval,
        )
        .await?;

        // The tool overlay would otherwise show up in every captured frame.
        page.evaluate(
            r#"(() => {
                const replaytools = document.getElementById("replaytools");
                if (replaytools) replaytools.style.opacity = "0";
                return true;
            })()"#,
        )
        .await?;

        capture::install_binding(page).await?;

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in targets {
            let out_path = self.store.next_path();
            let result = async {
                SegmentRecorder::new(page, &self.settings)
                    .capture(replay, target, &out_path)
                    .await?;
                encode::finalize(&out_path).await?;
                Ok(out_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| out_path.display().to_string()))
            }
            .await;

            match &result {
                Ok(name) => info!(round = target.round, file = %name, "target captured"),
                Err(err) => warn!(round = target.round, %err, "target failed"),
            }
            outcomes.push(TargetOutcome {
                target: *target,
                result,
            });
        }

        if let Some(status) = previous_status {
            if let Err(err) = self.set_presence_status(page, &status).await {
                warn!(%err, "failed to restore presence status");
            }
        }

        Ok(outcomes)
    }

    /// Current presence status id, recovered from the status icon so it can
    /// be restored after the capture run.
    async fn read_presence_status(&self, page: &Page) -> Option<String> {
        page.evaluate(
            r##"(() => {
                const img = document.querySelector("#social_status img");
                if (!img) return null;
                return img.src
                    .replaceAll("https://tetr.io/res/status/", "")
                    .replaceAll(".png", "");
            })()"##,
        )
        .await
        .ok()?
        .into_value::<String>()
        .ok()
    }

    async fn set_presence_status(&self, page: &Page, status: &str) -> RenderResult<()> {
        let status_js = serde_json::to_string(status).map_err(anyhow::Error::from)?;
        page.evaluate(format!(
            r##"(() => {{
                const menu = document.querySelector("#social_status");
                if (!menu) return false;
                menu.click();
                const entry = document.querySelector('[data-id="' + {status_js} + '"]');
                if (entry) entry.click();
                return true;
            }})()"##
        ))
        .await?;
        Ok(())
    }

    /// Tears down the shared browser. Call only once no renders are in
    /// flight.
    pub async fn terminate(self) -> RenderResult<()> {
        self.host.terminate().await
    }
}
