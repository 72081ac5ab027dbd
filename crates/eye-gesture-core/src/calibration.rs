//! 会话级阈值自校准
//!
//! 会话开始后采集前 N 个有效（有人脸）平滑 EAR 样本，记录最小/最大值，
//! 阈值 = min + (max - min) * alpha。校准只完成一次，直到显式 reset。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CalibrationStatus {
    InProgress {
        progress: f64,
    },
    #[serde(rename_all = "camelCase")]
    Complete {
        threshold: f64,
        min_ear: f64,
        max_ear: f64,
    },
    /// 校准已结束，样本被忽略
    AlreadyCalibrated,
}

#[derive(Debug, Clone)]
pub struct Calibrator {
    sample_count: u32,
    alpha: f64,
    min_ear: f64,
    max_ear: f64,
    collected: u32,
    threshold: Option<f64>,
}

impl Calibrator {
    pub fn new(sample_count: u32, alpha: f64) -> Self {
        Self {
            sample_count: sample_count.max(1),
            alpha,
            min_ear: f64::INFINITY,
            max_ear: f64::NEG_INFINITY,
            collected: 0,
            threshold: None,
        }
    }

    pub fn observe(&mut self, smoothed_ear: f64) -> CalibrationStatus {
        if self.threshold.is_some() {
            return CalibrationStatus::AlreadyCalibrated;
        }

        self.min_ear = self.min_ear.min(smoothed_ear);
        self.max_ear = self.max_ear.max(smoothed_ear);
        self.collected += 1;

        if self.collected < self.sample_count {
            return CalibrationStatus::InProgress {
                progress: self.progress(),
            };
        }

        let threshold = self.min_ear + (self.max_ear - self.min_ear) * self.alpha;
        self.threshold = Some(threshold);
        tracing::debug!(
            threshold,
            min_ear = self.min_ear,
            max_ear = self.max_ear,
            samples = self.collected,
            "calibration complete"
        );

        CalibrationStatus::Complete {
            threshold,
            min_ear: self.min_ear,
            max_ear: self.max_ear,
        }
    }

    pub fn is_calibrating(&self) -> bool {
        self.threshold.is_none()
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn collected(&self) -> u32 {
        self.collected
    }

    pub fn progress(&self) -> f64 {
        (f64::from(self.collected) / f64::from(self.sample_count)).min(1.0)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.sample_count, self.alpha);
    }
}
