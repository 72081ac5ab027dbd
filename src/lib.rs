//! 眼部手势检测 HTTP 服务。
//!
//! 每个会话持有一个 [`eye_gesture_core::EyeGestureSession`]，客户端逐帧提交人脸关键点，
//! 检测事件既同步返回，也通过 SSE 推送给订阅者。

pub mod config;
pub mod constants;
pub mod extractors;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod workers;
