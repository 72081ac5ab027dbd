use axum::Router;
use tokio::sync::broadcast;

use eye_gesture_backend::config::{Config, LimitsConfig, WorkerConfig};
use eye_gesture_backend::routes::build_router;
use eye_gesture_backend::state::AppState;
use eye_gesture_core::DetectorConfig;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub config: Config,
    pub shutdown_tx: broadcast::Sender<()>,
}

/// 小窗口、短校准，让 HTTP 测试用几帧就能走完整流程
pub fn quick_detector() -> DetectorConfig {
    DetectorConfig {
        smoothing_window: 1,
        calibration_sample_count: 3,
        blink_debounce_frames: 2,
        move_trigger_frames: 5,
        ..DetectorConfig::default()
    }
}

pub fn test_config(limits: LimitsConfig) -> Config {
    // 直接构造 Config，避免使用 set_var 造成多线程测试环境变量竞态
    Config {
        host: std::net::IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
        port: 5000,
        log_level: "info".to_string(),
        enable_file_logs: false,
        log_dir: "./logs".to_string(),
        cors_origin: "http://localhost:5173".to_string(),
        detector: quick_detector(),
        limits,
        worker: WorkerConfig {
            enable_session_reaper: false,
            ..WorkerConfig::default()
        },
    }
}

pub fn spawn_with_limits(limits: LimitsConfig) -> TestApp {
    let config = test_config(limits);
    let (shutdown_tx, _) = broadcast::channel::<()>(8);
    let state = AppState::new(&config, shutdown_tx.clone());
    let app = build_router(state.clone());

    TestApp {
        app,
        state,
        config,
        shutdown_tx,
    }
}

pub fn spawn_test_app() -> TestApp {
    spawn_with_limits(LimitsConfig::default())
}
