use std::sync::Arc;

use rand::Rng;
use tracing::error;

use crate::model::{ParsedProxy, ProxyDescriptor};

/// 给定候选数量 `len`（必定大于 0），返回 `0..len` 内的下标
pub type PickFn = dyn Fn(usize) -> usize + Send + Sync;

/// 每次请求尝试前调用，随机挑选一个代理。
///
/// 未启用或代理列表为空时返回 `None`，即直连。
/// 代理列表只读，克隆后在所有 worker 之间共享。
#[derive(Clone)]
pub struct ProxySelector {
    proxies: Arc<[ProxyDescriptor]>,
    enabled: bool,
    pick: Arc<PickFn>,
}

impl ProxySelector {
    pub fn new(proxies: Vec<ProxyDescriptor>, enabled: bool) -> Self {
        Self::with_picker(proxies, enabled, |len| rand::rng().random_range(0..len))
    }

    /// 使用自定义的选取函数，便于测试时得到确定结果
    pub fn with_picker(
        proxies: Vec<ProxyDescriptor>,
        enabled: bool,
        pick: impl Fn(usize) -> usize + Send + Sync + 'static,
    ) -> Self {
        Self {
            proxies: proxies.into(),
            enabled,
            pick: Arc::new(pick),
        }
    }

    pub fn direct() -> Self {
        Self::new(Vec::new(), false)
    }

    pub fn is_active(&self) -> bool {
        self.enabled && !self.proxies.is_empty()
    }

    pub fn select(&self) -> Option<ParsedProxy> {
        if !self.is_active() {
            return None;
        }
        let idx = (self.pick)(self.proxies.len()) % self.proxies.len();
        match self.proxies[idx].parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }
}
