use std::time::Duration;

/// 请求体上限：478 个三维关键点的 JSON 远小于此值
pub const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// SSE 保活注释间隔
pub const SSE_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub const SSE_KEEPALIVE_TEXT: &str = "keepalive";

/// 单次 worker 执行超时
pub const WORKER_TIMEOUT: Duration = Duration::from_secs(60);
