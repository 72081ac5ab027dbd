use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use eye_gesture_core::{DetectorConfig, DistanceMode};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub cors_origin: String,
    pub detector: DetectorConfig,
    pub limits: LimitsConfig,
    pub worker: WorkerConfig,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub max_sessions: usize,
    pub max_sse_connections: usize,
    /// 每个会话广播通道容量，慢订阅者超出后丢弃最旧事件
    pub event_channel_capacity: usize,
    pub session_idle_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_sessions: 256,
            max_sse_connections: 512,
            event_channel_capacity: 256,
            session_idle_timeout_secs: 600,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub enable_session_reaper: bool,
    pub session_reaper_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enable_session_reaper: true,
            session_reaper_cron: "0 * * * * *".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let limits_default = LimitsConfig::default();
        let worker_default = WorkerConfig::default();

        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 5000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            detector: detector_from_env(),
            limits: LimitsConfig {
                max_sessions: env_or_parse("MAX_SESSIONS", limits_default.max_sessions),
                max_sse_connections: env_or_parse(
                    "MAX_SSE_CONNECTIONS",
                    limits_default.max_sse_connections,
                ),
                event_channel_capacity: env_or_parse(
                    "EVENT_CHANNEL_CAPACITY",
                    limits_default.event_channel_capacity,
                )
                .max(1),
                session_idle_timeout_secs: env_or_parse(
                    "SESSION_IDLE_TIMEOUT_SECS",
                    limits_default.session_idle_timeout_secs,
                ),
            },
            worker: WorkerConfig {
                enable_session_reaper: env_or_bool(
                    "SESSION_REAPER_ENABLED",
                    worker_default.enable_session_reaper,
                ),
                session_reaper_cron: env_or(
                    "SESSION_REAPER_CRON",
                    &worker_default.session_reaper_cron,
                ),
            },
        }
    }
}

/// 检测参数默认值；组合无效时整体回退到内置默认
fn detector_from_env() -> DetectorConfig {
    let base = DetectorConfig::default();
    let detector = DetectorConfig {
        smoothing_window: env_or_parse("EAR_SMOOTHING_WINDOW", base.smoothing_window),
        calibration_sample_count: env_or_parse(
            "EAR_CALIBRATION_SAMPLES",
            base.calibration_sample_count,
        ),
        calibration_alpha: env_or_parse("EAR_CALIBRATION_ALPHA", base.calibration_alpha),
        blink_debounce_frames: env_or_parse(
            "EAR_BLINK_DEBOUNCE_FRAMES",
            base.blink_debounce_frames,
        ),
        move_trigger_frames: env_or_parse("EAR_MOVE_TRIGGER_FRAMES", base.move_trigger_frames),
        distance_mode: env_or_parse::<DistanceMode>("EAR_DISTANCE_MODE", base.distance_mode),
    };

    match detector.validate() {
        Ok(()) => detector,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid detector env config, using defaults");
            base
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}
