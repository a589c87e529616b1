//! The per-target capture state machine.
//!
//! `Idle → RoundSelected → Seeking → Capturing → EndConditionMet → Stopped`,
//! run once per target. Frame numbers reported by the remote UI are the only
//! timing currency; wall clock never decides the stop condition.

use std::path::Path;

use chromiumoxide::Page;
use tracing::debug;

use crate::{
    capture::CaptureStream,
    error::{RenderError, RenderResult},
    model::{Replay, Target},
    seek,
    settings::Settings,
    wait,
};

const ROUND_RESULT_SELECTOR: &str = ".multilog_result_self";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    RoundSelected,
    Seeking,
    Capturing,
    EndConditionMet,
    Stopped,
}

pub struct SegmentRecorder<'a> {
    page: &'a Page,
    settings: &'a Settings,
    phase: Phase,
}

impl<'a> SegmentRecorder<'a> {
    pub fn new(page: &'a Page, settings: &'a Settings) -> Self {
        Self {
            page,
            settings,
            phase: Phase::Idle,
        }
    }

    fn advance(&mut self, phase: Phase) {
        debug!(from = ?self.phase, to = ?phase, "segment phase");
        self.phase = phase;
    }

    /// Captures frames `[start, end]` of one round into `out_path`.
    pub async fn capture(
        &mut self,
        replay: &Replay,
        target: &Target,
        out_path: &Path,
    ) -> RenderResult<()> {
        self.select_round(target).await?;
        self.seek_to_start(replay, target).await?;

        tokio::time::sleep(self.settings.capture_settle).await;
        let stream = CaptureStream::start(self.page, out_path).await?;
        self.advance(Phase::Capturing);

        match self.play_until_end_frame(target).await {
            Ok(()) => {
                self.advance(Phase::EndConditionMet);
                tokio::time::sleep(self.settings.stop_settle).await;
                stream.stop(self.page, self.settings).await?;
            }
            Err(err) => {
                // Halt the recorder so the next target starts clean; the
                // partial raw file is orphaned, not returned.
                let _ = stream.stop(self.page, self.settings).await;
                let _ = self.exit_replay().await;
                return Err(err);
            }
        }

        self.exit_replay().await?;
        self.advance(Phase::Stopped);
        Ok(())
    }

    /// Clicks the requested round's result entry and waits until the
    /// playback controls come out of their disabled state.
    async fn select_round(&mut self, target: &Target) -> RenderResult<()> {
        let rounds = self.page.find_elements(ROUND_RESULT_SELECTOR).await?;
        let Some(round) = rounds.get(target.round) else {
            return Err(RenderError::validation(format!(
                "round {} not found in the replay",
                target.round
            )));
        };
        round.click().await?;

        wait::wait_for_js(
            self.page,
            "(() => { const el = document.getElementById('replaytools'); \
              return !!el && !el.classList.contains('disabled'); })()",
            "playback controls enabled",
            self.settings.ready_timeout,
            self.settings.dom_poll_interval,
        )
        .await?;
        self.advance(Phase::RoundSelected);
        Ok(())
    }

    /// Pauses the autoplaying round, then jumps the seek bar to the start
    /// frame via a synthetic mouse-down/mouse-up at the computed coordinate.
    async fn seek_to_start(&mut self, replay: &Replay, target: &Target) -> RenderResult<()> {
        self.advance(Phase::Seeking);

        // The UI autoplays on selection; stop it before seeking.
        self.page
            .evaluate(
                r##"(() => {
                    const pause = document.querySelector("#replaytools_button_playpause");
                    if (pause) pause.click();
                    const stop = document.querySelector("#replaytools_button_stop");
                    if (stop) stop.click();
                    return true;
                })()"##,
            )
            .await?;

        let total_frames = replay.end_frame(target.round)?;
        let fraction = seek::seek_fraction(target.start, total_frames)?;
        let viewport_width = self
            .page
            .evaluate("window.innerWidth")
            .await?
            .into_value::<f64>()
            .unwrap_or(self.settings.viewport.0 as f64);
        let start_x = seek::seek_x(fraction, viewport_width);

        debug!(
            round = target.round,
            start = target.start,
            total_frames,
            start_x,
            "seeking"
        );

        self.page
            .evaluate(format!(
                r##"(() => {{
                    const bar = document.querySelector("#replaytools_seekbar");
                    if (!bar) return false;
                    for (const type of ["mousedown", "mouseup"]) {{
                        bar.dispatchEvent(new MouseEvent(type, {{ clientX: {start_x}, clientY: 0 }}));
                    }}
                    return true;
                }})()"##
            ))
            .await?;
        Ok(())
    }

    /// Resumes playback and polls the UI frame counter until it reaches the
    /// target's end frame.
    async fn play_until_end_frame(&mut self, target: &Target) -> RenderResult<()> {
        self.page
            .evaluate(
                r##"(() => {
                    const pause = document.querySelector("#replaytools_button_playpause");
                    if (pause) pause.click();
                    return true;
                })()"##,
            )
            .await?;

        let end = target.end;
        wait::wait_for_js_u64(
            self.page,
            r##"(() => {
                const el = document.querySelector("#replaytools_timestamp span");
                const n = parseInt(((el && el.textContent) || "0").replaceAll("frame", "").trim(), 10);
                return Number.isFinite(n) ? n : 0;
            })()"##,
            "end frame reached",
            self.settings.frame_deadline,
            self.settings.frame_poll_interval,
            move |frame| frame >= end,
        )
        .await?;
        Ok(())
    }

    async fn exit_replay(&mut self) -> RenderResult<()> {
        self.page
            .evaluate(
                r##"(() => {
                    const exit = document.querySelector("#exit_replay");
                    if (exit) exit.click();
                    return true;
                })()"##,
            )
            .await?;
        Ok(())
    }
}
