use serde::Serialize;

use crate::clock::Millis;
use crate::event::Record;
use crate::session::{Session, Snapshot};

#[derive(Clone, Debug, Serialize)]
pub struct FrameGridMeta {
    pub rows: usize,
    pub cols: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct Frame {
    pub t: Millis,
    pub grid: FrameGridMeta,
    pub state: Snapshot,
    pub tiles: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ready: Vec<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<Record>,
    pub paused: bool,
    pub game_over: bool,
}

/// Capture the session as it stands, with the events recorded since the
/// previous frame.
pub fn make_frame(session: &Session, events: Vec<Record>) -> Frame {
    let shape = session.grid().shape();
    Frame {
        t: session.now(),
        grid: FrameGridMeta {
            rows: shape.rows,
            cols: shape.cols,
        },
        state: session.snapshot(),
        tiles: session.grid().symbols(),
        ready: session.ready_tiles().to_vec(),
        events,
        paused: session.is_paused(),
        game_over: session.is_over(),
    }
}

impl Frame {
    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn fresh_session_frame() {
        let session = Session::new(GameConfig::default()).expect("session builds");
        let frame = make_frame(&session, Vec::new());
        let line = frame.to_ndjson().expect("frame serializes");
        assert!(line.ends_with('\n'));
        let value: serde_json::Value =
            serde_json::from_str(line.trim_end()).expect("valid json");

        assert_eq!(value.get("t").and_then(|v| v.as_u64()), Some(0));
        assert_eq!(value.get("paused").and_then(|v| v.as_bool()), Some(true));
        assert!(value.get("events").is_none());
        assert!(value.get("ready").is_none());
        let tiles = value.get("tiles").and_then(|v| v.as_str()).expect("tiles");
        assert_eq!(tiles.len(), 56);
        assert_eq!(&tiles[19..20], "T");

        let grid = value.get("grid").and_then(|v| v.as_object()).expect("grid");
        assert_eq!(grid.get("rows").and_then(|v| v.as_u64()), Some(4));
        assert_eq!(grid.get("cols").and_then(|v| v.as_u64()), Some(14));

        let state = value.get("state").expect("state");
        assert_eq!(state.get("tree_price").and_then(|v| v.as_u64()), Some(3));
        assert_eq!(state.get("days").and_then(|v| v.as_u64()), Some(1));
    }

    #[test]
    fn frame_carries_events() {
        let mut session = Session::new(GameConfig::default()).expect("session builds");
        session.resume();
        let events = session.drain_events();
        let frame = make_frame(&session, events);
        let value = serde_json::to_value(&frame).expect("frame serializes");
        let events = value
            .get("events")
            .and_then(|v| v.as_array())
            .expect("events present");
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].get("kind").and_then(|v| v.as_str()),
            Some("resumed")
        );
    }
}
