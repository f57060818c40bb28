//! 缓存（Cache）协议
//!
//! 简单的键值缓存，值为 JSON。白名单通过它在测试进程与其派生的子进程之间共享，
//! 因此除内存实现外还提供按目录存放的文件实现。
//!
mod file;
mod in_memory;

pub use file::FileCache;
pub use in_memory::InMemoryCache;

use crate::error::TestkitResult as Result;
use serde_json::Value;
use std::sync::Arc;

/// 键值缓存
pub trait Cache: Send + Sync {
    /// 缓存名称（用于日志）
    fn name(&self) -> &str;

    /// 准备后端（创建目录等），默认无需准备
    fn setup(&self) -> Result<()> {
        Ok(())
    }

    /// 读取；未命中返回 `None`
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// 清空全部条目
    fn flush(&self) -> Result<()>;
}

/// 依次准备所有缓存后端，遇到错误即返回
pub fn setup_caches(caches: &[Arc<dyn Cache>]) -> Result<()> {
    for cache in caches {
        cache.setup()?;
        tracing::debug!(cache = cache.name(), "cache set up");
    }
    Ok(())
}
