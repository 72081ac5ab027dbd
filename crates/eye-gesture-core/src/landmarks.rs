//! 面部关键点集合
//!
//! 关键点编号沿用 MediaPipe FaceMesh 的 468/478 点方案。每帧一个
//! [`LandmarkSet`]，构造后不可变。坐标可以是 2D `(x, y)` 或 3D `(x, y, z)`，
//! 同一帧内维度必须一致。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 单个关键点。2D 输入时 `z` 恒为 0。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// 平面欧氏距离，忽略 z
    pub fn planar_distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// 空间欧氏距离
    pub fn spatial_distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }
}

/// 坐标维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimensions {
    Planar,
    Spatial,
}

impl Dimensions {
    fn from_len(len: usize) -> Option<Self> {
        match len {
            2 => Some(Self::Planar),
            3 => Some(Self::Spatial),
            _ => None,
        }
    }

    pub fn width(self) -> usize {
        match self {
            Self::Planar => 2,
            Self::Spatial => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LandmarkError {
    #[error("landmark set is empty")]
    Empty,
    #[error("landmark {index} has {found} coordinates, expected 2 or 3")]
    UnsupportedDimensions { index: usize, found: usize },
    #[error("landmark {index} has {found} coordinates, expected {expected}")]
    MixedDimensions {
        index: usize,
        expected: usize,
        found: usize,
    },
    #[error("landmark {index} contains a non-finite coordinate")]
    NonFinite { index: usize },
    #[error("flat coordinate buffer of length {len} is not a multiple of {width}")]
    RaggedBuffer { len: usize, width: usize },
    #[error("eye landmark index {index} out of range for a set of {len} points")]
    MissingIndex { index: usize, len: usize },
}

/// 单帧面部关键点
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Point>,
    dims: Dimensions,
}

impl LandmarkSet {
    pub fn planar<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        Self {
            points: points.into_iter().map(|(x, y)| Point::new(x, y)).collect(),
            dims: Dimensions::Planar,
        }
    }

    pub fn spatial<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        Self {
            points: points
                .into_iter()
                .map(|(x, y, z)| Point::with_depth(x, y, z))
                .collect(),
            dims: Dimensions::Spatial,
        }
    }

    /// 从 JSON 风格的行数组构造：`[[x, y], ...]` 或 `[[x, y, z], ...]`
    pub fn from_rows<R>(rows: &[R]) -> Result<Self, LandmarkError>
    where
        R: AsRef<[f64]>,
    {
        let first = rows.first().ok_or(LandmarkError::Empty)?.as_ref().len();
        let dims = Dimensions::from_len(first).ok_or(LandmarkError::UnsupportedDimensions {
            index: 0,
            found: first,
        })?;

        let mut points = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != dims.width() {
                return Err(LandmarkError::MixedDimensions {
                    index,
                    expected: dims.width(),
                    found: row.len(),
                });
            }
            if row.iter().any(|c| !c.is_finite()) {
                return Err(LandmarkError::NonFinite { index });
            }
            points.push(match dims {
                Dimensions::Planar => Point::new(row[0], row[1]),
                Dimensions::Spatial => Point::with_depth(row[0], row[1], row[2]),
            });
        }

        Ok(Self { points, dims })
    }

    /// 从扁平坐标数组构造（浏览器端 Float64Array 的布局）
    pub fn from_flat(coords: &[f64], width: usize) -> Result<Self, LandmarkError> {
        if Dimensions::from_len(width).is_none() {
            return Err(LandmarkError::UnsupportedDimensions {
                index: 0,
                found: width,
            });
        }
        if coords.len() % width != 0 {
            return Err(LandmarkError::RaggedBuffer {
                len: coords.len(),
                width,
            });
        }
        let rows: Vec<&[f64]> = coords.chunks_exact(width).collect();
        Self::from_rows(&rows)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dims(&self) -> Dimensions {
        self.dims
    }

    /// 按编号取点。越界属于调用方违约，直接 panic。
    pub fn point(&self, index: usize) -> &Point {
        &self.points[index]
    }

    /// 校验所有眼部编号都落在本集合内
    pub fn check_covers(&self, eyes: &[EyePointIndices]) -> Result<(), LandmarkError> {
        match eyes.iter().map(EyePointIndices::max_index).max() {
            Some(index) if index >= self.points.len() => Err(LandmarkError::MissingIndex {
                index,
                len: self.points.len(),
            }),
            _ => Ok(()),
        }
    }
}

/// 单眼 6 点编号，顺序为 p0..p5：
/// - p0, p3: 内外眼角（水平方向）
/// - p1, p2: 上眼睑
/// - p5, p4: 与 p1, p2 对应的下眼睑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EyePointIndices([usize; 6]);

/// MediaPipe FaceMesh 左眼
pub const LEFT_EYE: EyePointIndices = EyePointIndices::new([362, 385, 387, 263, 373, 380]);

/// MediaPipe FaceMesh 右眼
pub const RIGHT_EYE: EyePointIndices = EyePointIndices::new([33, 160, 158, 133, 153, 144]);

impl EyePointIndices {
    pub const fn new(indices: [usize; 6]) -> Self {
        Self(indices)
    }

    pub fn get(&self, slot: usize) -> usize {
        self.0[slot]
    }

    pub fn max_index(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }
}
