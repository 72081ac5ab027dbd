//! EAR (Eye Aspect Ratio) 计算模块
//!
//! 标准 6 点公式: EAR = (|p1-p5| + |p2-p4|) / (2 * |p0-p3|)
//! - p0, p3: 眼角点（水平方向）
//! - p1, p2: 上眼睑点
//! - p5, p4: 下眼睑点
//!
//! 睁眼时 EAR 约 0.25-0.35，闭眼时趋近 0。

use serde::{Deserialize, Serialize};

use crate::config::DistanceMode;
use crate::landmarks::{Dimensions, EyePointIndices, LandmarkSet, Point, LEFT_EYE, RIGHT_EYE};

/// 单帧双眼 EAR
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarSample {
    pub left: f64,
    pub right: f64,
}

impl EarSample {
    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// 双眼算术平均
    pub fn combined(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// 单眼 EAR。水平距离为 0 时返回 0（退化几何，不视为错误）。
///
/// 编号越界会 panic，调用方应先用 [`LandmarkSet::check_covers`] 校验。
pub fn eye_aspect_ratio(landmarks: &LandmarkSet, eye: &EyePointIndices, mode: DistanceMode) -> f64 {
    let spatial = mode == DistanceMode::Auto && landmarks.dims() == Dimensions::Spatial;
    let dist = |a: usize, b: usize| -> f64 {
        let p: &Point = landmarks.point(eye.get(a));
        let q: &Point = landmarks.point(eye.get(b));
        if spatial {
            p.spatial_distance(q)
        } else {
            p.planar_distance(q)
        }
    };

    let horizontal = dist(0, 3);
    if horizontal == 0.0 {
        return 0.0;
    }
    let vertical1 = dist(1, 5);
    let vertical2 = dist(2, 4);

    (vertical1 + vertical2) / (2.0 * horizontal)
}

/// 从关键点集合提取双眼 EAR
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureExtractor {
    left: EyePointIndices,
    right: EyePointIndices,
    mode: DistanceMode,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DistanceMode::Auto)
    }
}

impl FeatureExtractor {
    pub fn new(mode: DistanceMode) -> Self {
        Self::with_indices(LEFT_EYE, RIGHT_EYE, mode)
    }

    pub fn with_indices(left: EyePointIndices, right: EyePointIndices, mode: DistanceMode) -> Self {
        Self { left, right, mode }
    }

    pub fn eyes(&self) -> [EyePointIndices; 2] {
        [self.left, self.right]
    }

    pub fn extract(&self, landmarks: &LandmarkSet) -> EarSample {
        EarSample {
            left: eye_aspect_ratio(landmarks, &self.left, self.mode),
            right: eye_aspect_ratio(landmarks, &self.right, self.mode),
        }
    }
}
