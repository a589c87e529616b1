use replaycast::{Replay, Target};
use serde_json::json;

/// A minimal two-round document in the shape uploaded replays arrive in.
fn fixture() -> Replay {
    Replay::from_value(json!({
        "id": "65f0",
        "replay": {
            "rounds": [
                [
                    {
                        "username": "player_one",
                        "replay": {
                            "events": [
                                { "type": "start", "frame": 0 },
                                { "type": "keydown", "frame": 12, "data": { "key": "hardDrop" } },
                                { "type": "end", "frame": 1000 }
                            ]
                        }
                    },
                    {
                        "username": "player_two",
                        "replay": { "events": [ { "type": "end", "frame": 998 } ] }
                    }
                ],
                [
                    {
                        "username": "player_one",
                        "replay": {
                            "events": [
                                { "type": "start", "frame": 0 },
                                { "type": "ige", "frame": 310 }
                            ]
                        }
                    }
                ]
            ]
        }
    }))
}

#[test]
fn terminal_frame_comes_from_the_first_player_log() {
    let replay = fixture();
    assert_eq!(replay.round_count(), 2);
    assert_eq!(replay.end_frame(0).unwrap(), 1000);
}

#[test]
fn out_of_range_round_is_a_validation_error() {
    let err = fixture().end_frame(5).unwrap_err();
    assert!(err.to_string().contains("round 5 not found"));
}

#[test]
fn round_without_terminal_event_is_invalid_replay_data() {
    let err = fixture().end_frame(1).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("no end frame"), "got: {msg}");
    assert!(msg.contains("round 1"), "got: {msg}");
}

#[test]
fn upload_bytes_match_the_source_document() {
    let replay = fixture();
    let uploaded: serde_json::Value =
        serde_json::from_slice(&replay.to_bytes().unwrap()).unwrap();
    // Fields the engine never reads must survive untouched.
    assert_eq!(uploaded["id"], "65f0");
    assert_eq!(
        uploaded["replay"]["rounds"][0][1]["username"],
        "player_two"
    );
}

#[test]
fn cli_targets_parse_and_reject() {
    let t: Target = "0:100:1000".parse().unwrap();
    assert_eq!((t.round, t.start, t.end), (0, 100, 1000));
    assert!("0:100:1000:9".parse::<Target>().is_err());
    assert!("".parse::<Target>().is_err());
}
