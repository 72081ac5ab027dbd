//! 检测器参数
//!
//! 历史上几个版本的检测脚本各自硬编码了不同的常量（校准样本 30/60、
//! alpha 0.4/0.7、2D/3D 距离），这里全部开放为配置，并提供两个预设。

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 眼部距离计算方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceMode {
    /// 关键点带深度时用 3D 距离，否则退化为 2D。
    /// 3D 距离对头部偏转造成的透视变形更稳健。
    #[default]
    Auto,
    /// 始终只用 x/y
    Planar,
}

impl FromStr for DistanceMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "auto" | "3d" | "spatial" => Ok(Self::Auto),
            "planar" | "2d" => Ok(Self::Planar),
            other => Err(ConfigError::UnknownDistanceMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("smoothingWindow must be >= 1")]
    ZeroSmoothingWindow,
    #[error("calibrationSampleCount must be >= 1")]
    ZeroCalibrationSamples,
    #[error("calibrationAlpha must be in [0,1], got {0}")]
    AlphaOutOfRange(f64),
    #[error("moveTriggerFrames ({trigger}) must be greater than blinkDebounceFrames ({debounce})")]
    TriggerNotAboveDebounce { debounce: u32, trigger: u32 },
    #[error("unknown distance mode '{0}', expected auto or planar")]
    UnknownDistanceMode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetectorConfig {
    /// 移动平均窗口（帧）
    pub smoothing_window: usize,
    /// 校准阶段采集的有效样本数
    pub calibration_sample_count: u32,
    /// 阈值在 [min, max] 区间中的位置
    pub calibration_alpha: f64,
    /// 闭眼帧数不超过此值视为噪声
    pub blink_debounce_frames: u32,
    /// 闭眼恰好持续到此帧数时进入移动模式
    pub move_trigger_frames: u32,
    pub distance_mode: DistanceMode,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::responsive()
    }
}

impl DetectorConfig {
    /// 短校准、3D 距离，约 1 秒完成校准（30fps）
    pub fn responsive() -> Self {
        Self {
            smoothing_window: 3,
            calibration_sample_count: 30,
            calibration_alpha: 0.4,
            blink_debounce_frames: 2,
            move_trigger_frames: 15,
            distance_mode: DistanceMode::Auto,
        }
    }

    /// 长校准、阈值偏向睁眼一侧、仅平面距离
    pub fn conservative() -> Self {
        Self {
            smoothing_window: 3,
            calibration_sample_count: 60,
            calibration_alpha: 0.7,
            blink_debounce_frames: 2,
            move_trigger_frames: 15,
            distance_mode: DistanceMode::Planar,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smoothing_window == 0 {
            return Err(ConfigError::ZeroSmoothingWindow);
        }
        if self.calibration_sample_count == 0 {
            return Err(ConfigError::ZeroCalibrationSamples);
        }
        if !(0.0..=1.0).contains(&self.calibration_alpha) {
            return Err(ConfigError::AlphaOutOfRange(self.calibration_alpha));
        }
        if self.move_trigger_frames <= self.blink_debounce_frames {
            return Err(ConfigError::TriggerNotAboveDebounce {
                debounce: self.blink_debounce_frames,
                trigger: self.move_trigger_frames,
            });
        }
        Ok(())
    }
}
