//! 眨眼 / 长闭眼手势检测核心
//!
//! 把逐帧的面部关键点转换为离散交互事件：校准进度、眨眼、
//! 长闭眼“移动”手势的开始与结束、人脸丢失。纯同步计算，不做任何 I/O，
//! 服务端与浏览器端（WASM）共用。
//!
//! ## 模块
//! - `landmarks`: 关键点集合与眼部编号
//! - `ear`: EAR 特征提取
//! - `smoothing`: 移动平均平滑
//! - `calibration`: 会话级阈值自校准
//! - `state_machine`: 眨眼 / 移动手势状态机
//! - `session`: 串联以上组件的会话
//! - `wasm`: 浏览器端绑定

pub mod calibration;
pub mod config;
pub mod ear;
pub mod events;
pub mod landmarks;
pub mod session;
pub mod smoothing;
pub mod state_machine;
pub mod wasm;

pub use calibration::{CalibrationStatus, Calibrator};
pub use config::{ConfigError, DetectorConfig, DistanceMode};
pub use ear::{eye_aspect_ratio, EarSample, FeatureExtractor};
pub use events::{Event, EventSink, EyeState, Timestamp};
pub use landmarks::{EyePointIndices, LandmarkError, LandmarkSet, Point, LEFT_EYE, RIGHT_EYE};
pub use session::{EyeGestureSession, SessionStatus};
pub use smoothing::Smoother;
pub use state_machine::StateMachine;
