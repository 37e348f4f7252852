//! # harvester 模块
//!
//! 批量抓取的并发调度。
//!
//! - 从凭证流中逐个读取，流可以按需从文件增量产生；
//! - 先获取信号量许可再读取下一个凭证，因此同一时刻最多 `max_workers` 个抓取在执行；
//! - 按完成顺序（而非提交顺序）收集结果，最后统一合并去重；
//! - 所有 worker 共享同一个 [`GuildApi`] 实例及其连接池。
//!
//! 没有整体超时或取消，所有任务结束后运行才结束。

use std::sync::Arc;
use std::time::Instant;

use futures::{Stream, StreamExt};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info};

use crate::common::console::StatusSink;
use crate::model::{Credential, FetchResult};
use crate::service::aggregator::{aggregate, AggregateReport};
use crate::service::api::GuildApi;
use crate::service::fetcher::{fetch_guild_ids, FetchPolicy};
use crate::service::proxy_selector::ProxySelector;

/// 所有 worker 共享的只读上下文
#[derive(Clone)]
pub struct Harvester {
    api: Arc<dyn GuildApi>,
    status: Arc<dyn StatusSink>,
    selector: ProxySelector,
    policy: FetchPolicy,
}

impl Harvester {
    pub fn new(
        api: Arc<dyn GuildApi>,
        status: Arc<dyn StatusSink>,
        selector: ProxySelector,
        policy: FetchPolicy,
    ) -> Self {
        Self { api, status, selector, policy }
    }

    /// 并发抓取凭证流中的所有凭证，按完成顺序依次回调 `on_result`。
    ///
    /// `max_workers` 为 0 时按 1 处理。返回处理的凭证数量。
    pub async fn run<S, F>(&self, credentials: S, max_workers: usize, mut on_result: F) -> usize
    where
        S: Stream<Item = Credential>,
        F: FnMut(FetchResult),
    {
        let max_workers = max_workers.max(1);
        let semaphore = Arc::new(Semaphore::new(max_workers));
        let mut tasks = JoinSet::new();
        let mut submitted = 0;
        let start = Instant::now();

        info!("🚀 开始批量抓取，并发数 {}", max_workers);
        let mut credentials = std::pin::pin!(credentials);

        loop {
            // 先拿到空闲槽位再读取下一个凭证，凭证流不会被提前读完
            let permit = tokio::select! {
                permit = Arc::clone(&semaphore).acquire_owned() => permit,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    collect(joined, &mut on_result);
                    continue;
                }
            };
            let Ok(permit) = permit else { break };

            let Some(credential) = credentials.next().await else { break };
            submitted += 1;

            let harvester = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                fetch_guild_ids(
                    &credential,
                    &harvester.selector,
                    &*harvester.api,
                    &*harvester.status,
                    &harvester.policy,
                )
                .await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            collect(joined, &mut on_result);
        }

        info!("✅ 抓取完成：共 {} 个凭证，耗时 {}ms", submitted, start.elapsed().as_millis());
        submitted
    }

    /// 抓取全部凭证并直接返回汇总报告
    pub async fn harvest<S>(&self, credentials: S, max_workers: usize) -> AggregateReport
    where
        S: Stream<Item = Credential>,
    {
        let mut results = Vec::new();
        self.run(credentials, max_workers, |result| results.push(result.guild_ids))
            .await;
        aggregate(results)
    }
}

fn collect<F: FnMut(FetchResult)>(joined: Result<FetchResult, JoinError>, on_result: &mut F) {
    match joined {
        Ok(result) => {
            debug!("凭证处理结束：{:?}，共请求 {} 次", result.outcome, result.attempts);
            on_result(result)
        }
        // fetch_guild_ids 本身不返回错误，只有 panic 会走到这里
        Err(e) => error!("❌ 抓取任务异常退出：{}", e),
    }
}
