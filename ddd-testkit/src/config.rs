//! 测试工具配置
//!
//! 子进程与测试进程需要看到同一份白名单，因此缓存目录可以通过环境变量传递。
//!
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 未在映射中配置 `queueName` 时使用的队列
pub const DEFAULT_QUEUE_NAME: &str = "neos-eventsourcing";
/// 白名单在缓存中的键
pub const ALLOW_LIST_CACHE_KEY: &str = "allowed-listeners";

pub const ENV_CACHE_DIR: &str = "DDD_TESTKIT_CACHE_DIR";
pub const ENV_DEFAULT_QUEUE: &str = "DDD_TESTKIT_DEFAULT_QUEUE";

#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestkitConfig {
    #[builder(into, default = DEFAULT_QUEUE_NAME.to_string())]
    pub default_queue_name: String,
    #[builder(into, default = ALLOW_LIST_CACHE_KEY.to_string())]
    pub allow_list_cache_key: String,
    /// 设置后使用文件缓存（可跨进程共享），否则使用内存缓存
    pub cache_dir: Option<PathBuf>,
    /// 映射指向未注册的队列时，是否自动创建同进程队列
    #[builder(default = true)]
    pub create_missing_queues: bool,
}

impl Default for TestkitConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl TestkitConfig {
    /// 从环境变量读取，未设置的项使用默认值
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self::builder()
            .maybe_default_queue_name(non_empty(ENV_DEFAULT_QUEUE))
            .maybe_cache_dir(non_empty(ENV_CACHE_DIR).map(PathBuf::from))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = TestkitConfig::default();
        assert_eq!(config.default_queue_name, "neos-eventsourcing");
        assert_eq!(config.allow_list_cache_key, "allowed-listeners");
        assert_eq!(config.cache_dir, None);
        assert!(config.create_missing_queues);
    }

    #[test]
    fn lookup_overrides_and_ignores_blank_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_CACHE_DIR, "/tmp/testkit-cache"),
            (ENV_DEFAULT_QUEUE, "  "),
        ]
        .into_iter()
        .collect();
        let config = TestkitConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/testkit-cache")));
        assert_eq!(config.default_queue_name, DEFAULT_QUEUE_NAME);
    }
}
