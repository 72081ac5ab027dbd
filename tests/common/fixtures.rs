use serde_json::{json, Value};

use eye_gesture_core::{LEFT_EYE, RIGHT_EYE};

pub const OPEN: f64 = 0.3;
pub const SHUT: f64 = 0.02;

/// 478 点的平面人脸，两眼 EAR 约等于 `gap`
pub fn face_rows(gap: f64) -> Vec<Vec<f64>> {
    let mut rows = vec![vec![0.5, 0.5]; 478];
    for (eye, cx) in [(LEFT_EYE, 0.65), (RIGHT_EYE, 0.35)] {
        let w = 0.1;
        let half = gap * w / 2.0;
        let layout = [
            (cx - w / 2.0, 0.4),
            (cx - w / 6.0, 0.4 - half),
            (cx + w / 6.0, 0.4 - half),
            (cx + w / 2.0, 0.4),
            (cx + w / 6.0, 0.4 + half),
            (cx - w / 6.0, 0.4 + half),
        ];
        for (slot, (x, y)) in layout.into_iter().enumerate() {
            rows[eye.get(slot)] = vec![x, y];
        }
    }
    rows
}

pub fn frame(gap: f64) -> Value {
    json!({ "landmarks": face_rows(gap) })
}

pub fn no_face() -> Value {
    json!({ "landmarks": null })
}

pub fn event_types(body: &Value) -> Vec<String> {
    body["data"]["events"]
        .as_array()
        .map(|events| {
            events
                .iter()
                .filter_map(|e| e["type"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
