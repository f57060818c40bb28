//! 日志初始化
//!
//! 基于 `tracing-subscriber`，通过 `RUST_LOG` 控制过滤级别，默认 `warn`；
//! 输出走测试捕获（`with_test_writer`），多次调用无副作用。

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(false)
        .try_init();
}
