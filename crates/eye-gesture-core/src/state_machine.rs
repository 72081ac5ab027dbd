//! 眨眼 / 长闭眼手势状态机
//!
//! 两个状态 Open / Closed，Closed 下带一个 `moving` 子标志：
//! Open → Closed（双眼同时低于阈值）→ Open（任一眼恢复）。
//!
//! 一次闭眼最多产生一个 `EyesClosed`、一个 `MoveStart`，
//! 以及一个结束事件（`MoveEnd` 或 `BlinkDetected`，或者什么都没有）。
//! 所有事件都是边沿触发，条件持续期间不会重复。

use crate::events::{Event, EyeState, Timestamp};

#[derive(Debug, Clone)]
pub struct StateMachine {
    /// 校准完成前为 None，此时 `step` 不产生任何事件
    threshold: Option<f64>,
    blink_debounce_frames: u32,
    move_trigger_frames: u32,
    eye_state: EyeState,
    moving: bool,
    closed_frames: u32,
    closed_since: Option<Timestamp>,
    blink_count: u64,
}

impl StateMachine {
    pub fn new(blink_debounce_frames: u32, move_trigger_frames: u32) -> Self {
        Self {
            threshold: None,
            blink_debounce_frames,
            move_trigger_frames,
            eye_state: EyeState::Open,
            moving: false,
            closed_frames: 0,
            closed_since: None,
            blink_count: 0,
        }
    }

    /// 设置校准阈值。已设置时忽略，阈值在两次 reset 之间只读。
    pub fn arm(&mut self, threshold: f64) {
        if self.threshold.is_none() {
            self.threshold = Some(threshold);
        }
    }

    pub fn step(
        &mut self,
        face_visible: bool,
        smoothed_ear: Option<f64>,
        left_ear: f64,
        right_ear: f64,
        now: Timestamp,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(threshold) = self.threshold else {
            return events;
        };

        if !face_visible {
            if self.eye_state == EyeState::Closed {
                tracing::debug!(
                    closed_frames = self.closed_frames,
                    moving = self.moving,
                    "face lost during closure, resetting"
                );
                self.reopen();
                events.push(Event::FaceLost { timestamp: now });
            }
            return events;
        }

        // 双眼同时低于阈值才算闭眼，单眼（眨单眼/噪声）不计
        let closed = left_ear < threshold && right_ear < threshold;

        if closed {
            match self.eye_state {
                EyeState::Open => {
                    self.eye_state = EyeState::Closed;
                    self.closed_since = Some(now);
                    self.closed_frames = 1;
                    events.push(Event::EyesClosed { timestamp: now });
                }
                EyeState::Closed => {
                    self.closed_frames = self.closed_frames.saturating_add(1);
                }
            }

            if self.closed_frames == self.move_trigger_frames {
                self.moving = true;
                tracing::debug!(smoothed_ear, "sustained closure, move start");
                events.push(Event::MoveStart { timestamp: now });
            }
            return events;
        }

        if self.eye_state == EyeState::Closed {
            if self.moving {
                // 长闭眼只当作移动手势，不再计为眨眼
                events.push(Event::MoveEnd { timestamp: now });
            } else if self.blink_debounce_frames < self.closed_frames
                && self.closed_frames < self.move_trigger_frames
            {
                self.blink_count += 1;
                events.push(Event::BlinkDetected {
                    count: self.blink_count,
                    duration_frames: self.closed_frames,
                    timestamp: now,
                });
            }
            self.reopen();
        }

        events
    }

    fn reopen(&mut self) {
        self.eye_state = EyeState::Open;
        self.moving = false;
        self.closed_frames = 0;
        self.closed_since = None;
    }

    /// 回到构造时状态，阈值清空等待重新校准
    pub fn reset(&mut self) {
        *self = Self::new(self.blink_debounce_frames, self.move_trigger_frames);
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn eye_state(&self) -> EyeState {
        self.eye_state
    }

    pub fn is_moving(&self) -> bool {
        self.moving
    }

    pub fn closed_frames(&self) -> u32 {
        self.closed_frames
    }

    pub fn closed_since(&self) -> Option<Timestamp> {
        self.closed_since
    }

    pub fn blink_count(&self) -> u64 {
        self.blink_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPEN: f64 = 0.30;
    const SHUT: f64 = 0.05;

    fn armed() -> StateMachine {
        let mut m = StateMachine::new(2, 15);
        m.arm(0.2);
        m
    }

    fn ts(frame: u64) -> Timestamp {
        Timestamp::from_millis(frame * 33)
    }

    /// 闭眼 `len` 帧后睁眼，返回全部事件
    fn closure(m: &mut StateMachine, len: u64) -> Vec<Event> {
        let mut events = Vec::new();
        for frame in 0..len {
            events.extend(m.step(true, Some(SHUT), SHUT, SHUT, ts(frame)));
        }
        events.extend(m.step(true, Some(OPEN), OPEN, OPEN, ts(len)));
        events
    }

    fn assert_invariants(m: &StateMachine) {
        if m.eye_state() == EyeState::Open {
            assert_eq!(m.closed_frames(), 0);
            assert!(m.closed_since().is_none());
        }
        if m.is_moving() {
            assert_eq!(m.eye_state(), EyeState::Closed);
        }
    }

    #[test]
    fn unarmed_machine_is_silent() {
        let mut m = StateMachine::new(2, 15);
        assert!(m.step(true, None, SHUT, SHUT, ts(0)).is_empty());
        assert!(m.step(false, None, 0.0, 0.0, ts(1)).is_empty());
        assert_eq!(m.eye_state(), EyeState::Open);
    }

    #[test]
    fn single_frame_closure_is_noise() {
        let mut m = armed();
        let events = closure(&mut m, 1);
        assert_eq!(events, vec![Event::EyesClosed { timestamp: ts(0) }]);
        assert_eq!(m.blink_count(), 0);
        assert_invariants(&m);
    }

    #[test]
    fn closure_at_debounce_limit_is_noise() {
        let mut m = armed();
        let events = closure(&mut m, 2);
        assert_eq!(events.len(), 1);
        assert_eq!(m.blink_count(), 0);
    }

    #[test]
    fn five_frame_closure_is_one_blink() {
        let mut m = armed();
        let events = closure(&mut m, 5);
        assert_eq!(
            events,
            vec![
                Event::EyesClosed { timestamp: ts(0) },
                Event::BlinkDetected {
                    count: 1,
                    duration_frames: 5,
                    timestamp: ts(5)
                },
            ]
        );
        assert_invariants(&m);
    }

    #[test]
    fn sustained_closure_is_move_gesture() {
        let mut m = armed();
        let mut start_frame = None;
        for frame in 0..20 {
            let events = m.step(true, Some(SHUT), SHUT, SHUT, ts(frame));
            if events.contains(&Event::MoveStart { timestamp: ts(frame) }) {
                assert!(start_frame.is_none(), "MoveStart fired twice");
                start_frame = Some(frame);
            }
            assert_invariants(&m);
        }
        // 第 15 个闭眼帧（下标 14）
        assert_eq!(start_frame, Some(14));
        assert!(m.is_moving());

        let events = m.step(true, Some(OPEN), OPEN, OPEN, ts(20));
        assert_eq!(events, vec![Event::MoveEnd { timestamp: ts(20) }]);
        assert_eq!(m.blink_count(), 0);
        assert_invariants(&m);
    }

    #[test]
    fn closure_one_short_of_trigger_is_blink() {
        let mut m = armed();
        let events = closure(&mut m, 14);
        assert!(matches!(
            events.last(),
            Some(Event::BlinkDetected {
                duration_frames: 14,
                ..
            })
        ));
    }

    #[test]
    fn single_eye_dip_never_closes() {
        let mut m = armed();
        for frame in 0..10 {
            assert!(m.step(true, Some(0.17), SHUT, OPEN, ts(frame)).is_empty());
            assert!(m.step(true, Some(0.17), OPEN, SHUT, ts(frame)).is_empty());
        }
        assert_eq!(m.eye_state(), EyeState::Open);
    }

    #[test]
    fn equal_to_threshold_counts_as_open() {
        let mut m = armed();
        assert!(m.step(true, Some(0.2), 0.2, 0.2, ts(0)).is_empty());
    }

    #[test]
    fn face_loss_mid_closure_credits_nothing() {
        let mut m = armed();
        for frame in 0..8 {
            m.step(true, Some(SHUT), SHUT, SHUT, ts(frame));
        }
        assert_eq!(m.closed_frames(), 8);

        let events = m.step(false, None, 0.0, 0.0, ts(8));
        assert_eq!(events, vec![Event::FaceLost { timestamp: ts(8) }]);
        assert_invariants(&m);

        // 重新出现并睁眼：不补记眨眼
        assert!(m.step(true, Some(OPEN), OPEN, OPEN, ts(9)).is_empty());
        assert_eq!(m.blink_count(), 0);
    }

    #[test]
    fn face_loss_while_moving_clears_moving_without_move_end() {
        let mut m = armed();
        for frame in 0..16 {
            m.step(true, Some(SHUT), SHUT, SHUT, ts(frame));
        }
        let events = m.step(false, None, 0.0, 0.0, ts(16));
        assert_eq!(events, vec![Event::FaceLost { timestamp: ts(16) }]);
        assert!(!m.is_moving());
    }

    #[test]
    fn face_loss_while_open_is_silent() {
        let mut m = armed();
        assert!(m.step(false, None, 0.0, 0.0, ts(0)).is_empty());
    }

    #[test]
    fn blink_count_accumulates() {
        let mut m = armed();
        closure(&mut m, 4);
        closure(&mut m, 20);
        let events = closure(&mut m, 3);
        assert!(matches!(
            events.last(),
            Some(Event::BlinkDetected { count: 2, .. })
        ));
    }

    #[test]
    fn reset_disarms_and_zeroes() {
        let mut m = armed();
        closure(&mut m, 5);
        m.step(true, Some(SHUT), SHUT, SHUT, ts(10));
        m.reset();
        assert_eq!(m.threshold(), None);
        assert_eq!(m.blink_count(), 0);
        assert_eq!(m.eye_state(), EyeState::Open);
        assert_invariants(&m);
    }

    #[test]
    fn threshold_is_read_only_once_armed() {
        let mut m = armed();
        m.arm(0.9);
        assert_eq!(m.threshold(), Some(0.2));
    }
}
