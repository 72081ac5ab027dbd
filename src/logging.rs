use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

/// Installs the global subscriber: env-filtered stdout, plus daily-rotated JSON
/// files when `enable_file_logs` is set. An unusable log directory degrades to
/// stdout only.
pub fn init_tracing(config: &LogConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let registry = Registry::default().with(env_filter).with(stdout_layer);

    let file_appender = if config.enable_file_logs {
        match RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("eye-gesture-backend")
            .filename_suffix("log")
            .max_log_files(14)
            .build(&config.log_dir)
        {
            Ok(appender) => Some(appender),
            Err(e) => {
                // subscriber 尚未安装，只能直接写 stderr
                eprintln!("file logging disabled, cannot open {}: {e}", config.log_dir);
                None
            }
        }
    } else {
        None
    };

    // 全局 subscriber 已存在（测试中多次初始化）时 try_init 失败，忽略即可
    let result = match file_appender {
        Some(appender) => registry
            .with(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .json(),
            )
            .try_init(),
        None => registry.try_init(),
    };
    if let Err(e) = result {
        if !e.to_string().contains("already been set") {
            eprintln!("failed to install tracing subscriber: {e}");
        }
    }
}
