//! Live audio+video capture of the page surface.
//!
//! An in-page `MediaRecorder` records a promptless current-tab stream and
//! pushes webm chunks through a CDP binding; a background task appends them
//! to the output file from the first chunk on. The raw file's duration
//! metadata is left broken by the mid-stream closure and is fixed up later
//! by the encode finalizer.

use std::path::{Path, PathBuf};

use base64::Engine as _;
use chromiumoxide::{
    Page,
    cdp::js_protocol::runtime::{AddBindingParams, EventBindingCalled},
};
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::{
    error::{RenderError, RenderResult},
    settings::Settings,
};

const BINDING: &str = "__replaycastSink";
const CHUNK_INTERVAL_MS: u32 = 250;

#[derive(Debug, serde::Deserialize)]
struct ChunkMsg {
    kind: String,
    #[serde(default)]
    data: Option<String>,
}

/// Registers the chunk binding on a page. Once per page, before the first
/// capture; the binding survives across captures on the same page.
pub async fn install_binding(page: &Page) -> RenderResult<()> {
    let params = AddBindingParams::builder()
        .name(BINDING)
        .build()
        .map_err(RenderError::capture)?;
    page.execute(params).await?;
    Ok(())
}

/// One in-flight capture. `stop` halts the recorder and waits for the final
/// chunk; dropping without `stop` aborts the drain task so an error path
/// never leaks the stream or its file handle.
pub struct CaptureStream {
    out_path: PathBuf,
    drain: Option<tokio::task::JoinHandle<RenderResult<u64>>>,
}

impl CaptureStream {
    /// Starts recording and begins writing to `out_path` immediately.
    /// Returns once the recorder is live in the page.
    pub async fn start(page: &Page, out_path: &Path) -> RenderResult<Self> {
        let file = tokio::fs::File::create(out_path).await.map_err(|e| {
            RenderError::capture(format!(
                "failed to create capture file '{}': {e}",
                out_path.display()
            ))
        })?;

        // Listen before the recorder starts so no chunk is missed.
        let mut chunks = page.event_listener::<EventBindingCalled>().await?;

        let drain = tokio::spawn(async move {
            let mut file = tokio::io::BufWriter::new(file);
            let mut written = 0u64;
            while let Some(event) = chunks.next().await {
                if event.name != BINDING {
                    continue;
                }
                let msg: ChunkMsg = match serde_json::from_str(&event.payload) {
                    Ok(msg) => msg,
                    Err(err) => {
                        warn!(%err, "discarding malformed capture chunk");
                        continue;
                    }
                };
                match msg.kind.as_str() {
                    "chunk" => {
                        let data = msg.data.unwrap_or_default();
                        let bytes = base64::engine::general_purpose::STANDARD
                            .decode(data.as_bytes())
                            .map_err(|e| {
                                RenderError::capture(format!("capture chunk decode failed: {e}"))
                            })?;
                        file.write_all(&bytes).await.map_err(|e| {
                            RenderError::capture(format!("capture file write failed: {e}"))
                        })?;
                        written += bytes.len() as u64;
                    }
                    "eos" => {
                        file.flush().await.map_err(|e| {
                            RenderError::capture(format!("capture file flush failed: {e}"))
                        })?;
                        debug!(written, "capture stream closed");
                        return Ok(written);
                    }
                    other => warn!(kind = other, "unknown capture message"),
                }
            }
            Err(RenderError::capture(
                "capture channel closed before end of stream",
            ))
        });

        let script = format!(
            r#"async () => {{
                const stream = await navigator.mediaDevices.getDisplayMedia({{
                    video: {{ frameRate: 60 }},
                    audio: true,
                    preferCurrentTab: true,
                }});
                const recorder = new MediaRecorder(stream, {{ mimeType: "video/webm" }});
                recorder.ondataavailable = async (e) => {{
                    if (!e.data || e.data.size === 0) return;
                    const buf = new Uint8Array(await e.data.arrayBuffer());
                    let bin = "";
                    for (let i = 0; i < buf.length; i += 0x8000) {{
                        bin += String.fromCharCode.apply(null, buf.subarray(i, i + 0x8000));
                    }}
                    {BINDING}(JSON.stringify({{ kind: "chunk", data: btoa(bin) }}));
                }};
                recorder.onstop = () => {{
                    stream.getTracks().forEach((t) => t.stop());
                    {BINDING}(JSON.stringify({{ kind: "eos" }}));
                }};
                window.__replaycastRecorder = recorder;
                recorder.start({CHUNK_INTERVAL_MS});
                return true;
            }}"#
        );

        if let Err(err) = page.evaluate_function(script).await {
            // The drain task would otherwise wait forever on a recorder
            // that never started.
            drain.abort();
            return Err(RenderError::capture(format!(
                "failed to start page recorder: {err}"
            )));
        }

        debug!(out = %out_path.display(), "capture started");
        Ok(Self {
            out_path: out_path.to_path_buf(),
            drain: Some(drain),
        })
    }

    /// Stops the recorder, waits for the final chunk under the flush
    /// timeout, and closes the output file. Returns the bytes written.
    pub async fn stop(mut self, page: &Page, settings: &Settings) -> RenderResult<u64> {
        page.evaluate(
            r#"(() => {
                const r = window.__replaycastRecorder;
                if (r && r.state !== "inactive") { r.stop(); }
                return true;
            })()"#,
        )
        .await?;

        let mut drain = self
            .drain
            .take()
            .ok_or_else(|| RenderError::capture("capture stream already stopped"))?;

        match tokio::time::timeout(settings.flush_timeout, &mut drain).await {
            Ok(Ok(result)) => {
                let written = result?;
                if written == 0 {
                    return Err(RenderError::capture(format!(
                        "capture produced no data in '{}'",
                        self.out_path.display()
                    )));
                }
                Ok(written)
            }
            Ok(Err(join_err)) => Err(RenderError::capture(format!(
                "capture drain task failed: {join_err}"
            ))),
            Err(_) => {
                drain.abort();
                Err(RenderError::timeout(
                    "capture stream flush",
                    settings.flush_timeout,
                ))
            }
        }
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        if let Some(drain) = self.drain.take() {
            drain.abort();
        }
    }
}
