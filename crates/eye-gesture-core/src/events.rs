//! 检测事件与时间戳

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// 单调时钟读数：相对会话起点的偏移量。
///
/// 只用于时长计算，不随系统时间调整而跳变。序列化为毫秒浮点数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(into = "f64", from = "f64")]
pub struct Timestamp(Duration);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(Duration::ZERO);

    pub fn from_duration(offset: Duration) -> Self {
        Self(offset)
    }

    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    /// 负值与非有限值按 0 处理，超出 `Duration` 表示范围的值饱和到 `Duration::MAX`
    pub fn from_millis_f64(ms: f64) -> Self {
        if ms.is_finite() && ms > 0.0 {
            Self(Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::MAX))
        } else {
            Self::ZERO
        }
    }

    pub fn as_millis_f64(&self) -> f64 {
        self.0.as_secs_f64() * 1000.0
    }

    pub fn saturating_since(&self, earlier: Timestamp) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<Timestamp> for f64 {
    fn from(ts: Timestamp) -> Self {
        ts.as_millis_f64()
    }
}

impl From<f64> for Timestamp {
    fn from(ms: f64) -> Self {
        Timestamp::from_millis_f64(ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeState {
    #[default]
    Open,
    Closed,
}

/// 检测器输出事件，按 `step` 产生的顺序投递
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Event {
    CalibrationProgress {
        progress: f64,
    },
    CalibrationComplete {
        threshold: f64,
        min_ear: f64,
        max_ear: f64,
    },
    EyesClosed {
        timestamp: Timestamp,
    },
    MoveStart {
        timestamp: Timestamp,
    },
    MoveEnd {
        timestamp: Timestamp,
    },
    BlinkDetected {
        count: u64,
        duration_frames: u32,
        timestamp: Timestamp,
    },
    FaceLost {
        timestamp: Timestamp,
    },
}

impl Event {
    /// snake_case 事件名，与序列化后的 `type` 字段一致
    pub fn name(&self) -> &'static str {
        match self {
            Self::CalibrationProgress { .. } => "calibration_progress",
            Self::CalibrationComplete { .. } => "calibration_complete",
            Self::EyesClosed { .. } => "eyes_closed",
            Self::MoveStart { .. } => "move_start",
            Self::MoveEnd { .. } => "move_end",
            Self::BlinkDetected { .. } => "blink_detected",
            Self::FaceLost { .. } => "face_lost",
        }
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::CalibrationProgress { .. } | Self::CalibrationComplete { .. } => None,
            Self::EyesClosed { timestamp }
            | Self::MoveStart { timestamp }
            | Self::MoveEnd { timestamp }
            | Self::BlinkDetected { timestamp, .. }
            | Self::FaceLost { timestamp } => Some(*timestamp),
        }
    }
}

/// 事件接收方，每个事件调用一次
pub trait EventSink {
    fn emit(&mut self, event: Event);
}

impl EventSink for Vec<Event> {
    fn emit(&mut self, event: Event) {
        self.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_tagged_camel_case() {
        let event = Event::BlinkDetected {
            count: 3,
            duration_frames: 5,
            timestamp: Timestamp::from_millis(1500),
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["type"], "blink_detected");
        assert_eq!(json["durationFrames"], 5);
        assert_eq!(json["timestamp"], 1500.0);
        assert_eq!(json["type"], event.name());
    }

    #[test]
    fn calibration_complete_field_names() {
        let json = serde_json::to_value(Event::CalibrationComplete {
            threshold: 0.2,
            min_ear: 0.1,
            max_ear: 0.3,
        })
        .unwrap();
        assert_eq!(json["type"], "calibration_complete");
        assert!(json.get("minEar").is_some());
        assert!(json.get("maxEar").is_some());
    }

    #[test]
    fn timestamp_clamps_invalid_millis() {
        assert_eq!(Timestamp::from_millis_f64(-5.0), Timestamp::ZERO);
        assert_eq!(Timestamp::from_millis_f64(f64::NAN), Timestamp::ZERO);
        let later = Timestamp::from_millis(250);
        assert_eq!(later.saturating_since(Timestamp::from_millis(100)).as_millis(), 150);
        assert_eq!(Timestamp::ZERO.saturating_since(later), Duration::ZERO);
    }

    #[test]
    fn timestamp_saturates_huge_millis() {
        assert_eq!(Timestamp::from_millis_f64(1e30), Timestamp::from_duration(Duration::MAX));
        assert_eq!(Timestamp::from_millis_f64(f64::MAX), Timestamp::from_duration(Duration::MAX));

        let parsed: Timestamp = serde_json::from_str("1e300").unwrap();
        assert_eq!(parsed, Timestamp::from_duration(Duration::MAX));
    }
}
