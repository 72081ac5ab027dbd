//! 单个检测会话：特征提取 → 平滑 → 校准 / 分类
//!
//! 每个会话独立构造，互不共享状态。调用方需保证同一会话的帧串行送入。

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationStatus, Calibrator};
use crate::config::{ConfigError, DetectorConfig};
use crate::ear::{EarSample, FeatureExtractor};
use crate::events::{Event, EventSink, EyeState, Timestamp};
use crate::landmarks::{LandmarkError, LandmarkSet};
use crate::smoothing::Smoother;
use crate::state_machine::StateMachine;

/// 只读状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub calibrating: bool,
    pub eye_state: EyeState,
    pub moving_mode: bool,
    pub blink_count: u64,
    pub threshold: Option<f64>,
    pub calibration_progress: f64,
    pub collected_samples: u32,
    pub closed_frame_count: u32,
    /// 当前闭合已持续的毫秒数（截至最近一帧），睁眼时为 None
    pub closed_duration_ms: Option<f64>,
    pub frames_processed: u64,
    /// 最近一帧平滑后的双眼 EAR
    pub ear: Option<f64>,
    pub left_ear: Option<f64>,
    pub right_ear: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct EyeGestureSession {
    config: DetectorConfig,
    extractor: FeatureExtractor,
    smoother: Smoother,
    calibrator: Calibrator,
    machine: StateMachine,
    frames_processed: u64,
    last_sample: Option<EarSample>,
    last_smoothed: Option<f64>,
    last_timestamp: Timestamp,
}

impl EyeGestureSession {
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            extractor: FeatureExtractor::new(config.distance_mode),
            smoother: Smoother::new(config.smoothing_window),
            calibrator: Calibrator::new(config.calibration_sample_count, config.calibration_alpha),
            machine: StateMachine::new(config.blink_debounce_frames, config.move_trigger_frames),
            frames_processed: 0,
            last_sample: None,
            last_timestamp: Timestamp::ZERO,
            last_smoothed: None,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// 校验关键点集合覆盖双眼编号；通过后 `process_landmarks` 不会 panic
    pub fn check_frame(&self, landmarks: &LandmarkSet) -> Result<(), LandmarkError> {
        landmarks.check_covers(&self.extractor.eyes())
    }

    /// 处理一帧关键点，`None` 表示本帧未检测到人脸
    pub fn process_landmarks(&mut self, landmarks: Option<&LandmarkSet>, now: Timestamp) -> Vec<Event> {
        let mut events = Vec::new();
        self.process_into(landmarks, now, &mut events);
        events
    }

    pub fn process_into<S>(&mut self, landmarks: Option<&LandmarkSet>, now: Timestamp, sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        let sample = landmarks.map(|set| self.extractor.extract(set));
        self.process_sample_into(sample, now, sink);
    }

    /// 直接以 EAR 样本驱动（上游已完成特征提取时使用）
    pub fn process_sample(&mut self, sample: Option<EarSample>, now: Timestamp) -> Vec<Event> {
        let mut events = Vec::new();
        self.process_sample_into(sample, now, &mut events);
        events
    }

    pub fn process_sample_into<S>(&mut self, sample: Option<EarSample>, now: Timestamp, sink: &mut S)
    where
        S: EventSink + ?Sized,
    {
        self.frames_processed += 1;
        self.last_sample = sample;
        self.last_timestamp = now;

        let Some(sample) = sample else {
            self.last_smoothed = None;
            // 校准期间的无脸帧直接丢弃，避免污染 min/max
            if !self.calibrator.is_calibrating() {
                for event in self.machine.step(false, None, 0.0, 0.0, now) {
                    sink.emit(event);
                }
            }
            return;
        };

        let smoothed = self.smoother.update(sample.combined());
        self.last_smoothed = Some(smoothed);

        if self.calibrator.is_calibrating() {
            match self.calibrator.observe(smoothed) {
                CalibrationStatus::InProgress { progress } => {
                    sink.emit(Event::CalibrationProgress { progress });
                }
                CalibrationStatus::Complete {
                    threshold,
                    min_ear,
                    max_ear,
                } => {
                    self.machine.arm(threshold);
                    sink.emit(Event::CalibrationComplete {
                        threshold,
                        min_ear,
                        max_ear,
                    });
                }
                CalibrationStatus::AlreadyCalibrated => {}
            }
            return;
        }

        for event in self
            .machine
            .step(true, Some(smoothed), sample.left, sample.right, now)
        {
            sink.emit(event);
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            calibrating: self.calibrator.is_calibrating(),
            eye_state: self.machine.eye_state(),
            moving_mode: self.machine.is_moving(),
            blink_count: self.machine.blink_count(),
            threshold: self.machine.threshold(),
            calibration_progress: self.calibrator.progress(),
            collected_samples: self.calibrator.collected(),
            closed_frame_count: self.machine.closed_frames(),
            closed_duration_ms: self.machine.closed_since().map(|since| {
                self.last_timestamp.saturating_since(since).as_secs_f64() * 1000.0
            }),
            frames_processed: self.frames_processed,
            ear: self.last_smoothed,
            left_ear: self.last_sample.map(|s| s.left),
            right_ear: self.last_sample.map(|s| s.right),
        }
    }

    /// 恢复到构造时状态并重新进入校准
    pub fn reset(&mut self) {
        self.smoother.clear();
        self.calibrator.reset();
        self.machine.reset();
        self.frames_processed = 0;
        self.last_sample = None;
        self.last_smoothed = None;
        self.last_timestamp = Timestamp::ZERO;
    }
}
