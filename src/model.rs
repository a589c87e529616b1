use std::str::FromStr;

use serde_json::Value;

use crate::error::{RenderError, RenderResult};

/// A full game session as supplied by the caller. The document stays opaque
/// so the uploaded payload is byte-for-byte what the caller sent; only the
/// per-round terminal frame count is ever read out of it.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Replay {
    value: Value,
}

impl Replay {
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    pub fn from_slice(bytes: &[u8]) -> RenderResult<Self> {
        let value = serde_json::from_slice(bytes)
            .map_err(|e| RenderError::validation(format!("replay is not valid JSON: {e}")))?;
        Ok(Self { value })
    }

    pub fn to_bytes(&self) -> RenderResult<Vec<u8>> {
        serde_json::to_vec(&self.value)
            .map_err(|e| RenderError::validation(format!("replay failed to serialize: {e}")))
    }

    fn rounds(&self) -> Option<&Vec<Value>> {
        self.value.get("replay")?.get("rounds")?.as_array()
    }

    pub fn round_count(&self) -> usize {
        self.rounds().map(|r| r.len()).unwrap_or(0)
    }

    /// Total frame length of a round, taken from the `frame` field of its
    /// terminal `"end"` event.
    pub fn end_frame(&self, round: usize) -> RenderResult<u64> {
        let rounds = self
            .rounds()
            .ok_or_else(|| RenderError::validation("replay has no rounds list"))?;
        let entry = rounds
            .get(round)
            .ok_or_else(|| RenderError::validation(format!("round {round} not found in the replay")))?;

        let events = entry
            .get(0)
            .and_then(|player| player.get("replay"))
            .and_then(|r| r.get("events"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                RenderError::validation(format!(
                    "invalid replay data: round {round} has no event log"
                ))
            })?;

        events
            .iter()
            .find(|e| e.get("type").and_then(Value::as_str) == Some("end"))
            .and_then(|e| e.get("frame"))
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                RenderError::validation(format!(
                    "invalid replay data: no end frame found for round {round}"
                ))
            })
    }
}

/// One sub-segment of one round to capture. `start` only seeds the seek
/// offset; `end` is the authoritative stop condition, read back from the
/// live UI's frame counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Target {
    pub round: usize,
    pub start: u64,
    pub end: u64,
}

impl FromStr for Target {
    type Err = RenderError;

    /// Parses the CLI form `round:start:end`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let [round, start, end] = parts.as_slice() else {
            return Err(RenderError::validation(format!(
                "target '{s}' is not of the form round:start:end"
            )));
        };
        let parse = |name: &str, v: &str| {
            v.parse::<u64>()
                .map_err(|_| RenderError::validation(format!("target {name} '{v}' is not a number")))
        };
        Ok(Target {
            round: parse("round", round)? as usize,
            start: parse("start", start)?,
            end: parse("end", end)?,
        })
    }
}

/// Credentials and preference payload injected into the page before a render.
/// Passed explicitly per call; there is no process-wide session record.
#[derive(Clone, Debug)]
pub struct RenderSession {
    pub token: String,
    pub config: Value,
}

impl RenderSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            config: Value::Object(Default::default()),
        }
    }
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct UserIdentity {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
}

/// Per-target result of a render call. Targets after a failed one are still
/// attempted; the batch never throws away independent work.
#[derive(Debug)]
pub struct TargetOutcome {
    pub target: Target,
    pub result: RenderResult<String>,
}

impl TargetOutcome {
    pub fn filename(&self) -> Option<&str> {
        self.result.as_deref().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn replay_with_end_frame(frame: Option<u64>) -> Replay {
        let mut end = json!({ "type": "end" });
        if let Some(f) = frame {
            end["frame"] = json!(f);
        }
        Replay::from_value(json!({
            "replay": {
                "rounds": [
                    [ { "replay": { "events": [ { "type": "start", "frame": 0 }, end ] } } ]
                ]
            }
        }))
    }

    #[test]
    fn end_frame_reads_terminal_event() {
        let replay = replay_with_end_frame(Some(1000));
        assert_eq!(replay.end_frame(0).unwrap(), 1000);
    }

    #[test]
    fn end_frame_rejects_missing_round() {
        let replay = replay_with_end_frame(Some(1000));
        let err = replay.end_frame(3).unwrap_err();
        assert!(err.to_string().contains("round 3 not found"));
    }

    #[test]
    fn end_frame_rejects_missing_terminal_event() {
        let replay = replay_with_end_frame(None);
        let err = replay.end_frame(0).unwrap_err();
        assert!(err.to_string().contains("no end frame"));
    }

    #[test]
    fn replay_round_trips_unmodified() {
        let doc = json!({ "replay": { "rounds": [] }, "extra": { "kept": true } });
        let replay = Replay::from_slice(&serde_json::to_vec(&doc).unwrap()).unwrap();
        let back: Value = serde_json::from_slice(&replay.to_bytes().unwrap()).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn target_parses_cli_form() {
        let t: Target = "2:100:1000".parse().unwrap();
        assert_eq!(
            t,
            Target {
                round: 2,
                start: 100,
                end: 1000
            }
        );
        assert!("2:100".parse::<Target>().is_err());
        assert!("a:b:c".parse::<Target>().is_err());
    }
}
