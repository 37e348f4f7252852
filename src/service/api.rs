//! # api 模块
//!
//! 远端 guild 列表接口的访问边界。
//!
//! [`GuildApi`] 把一次已认证的 GET 抽象为 "状态码 + Retry-After + 响应体"，
//! 抓取状态机只依赖该 trait，测试时可替换为脚本化实现。
//!
//! [`HttpGuildApi`] 是基于 reqwest 的实现：直连使用一个共享 `Client`，
//! 每个不同的代理配置各自缓存一个 `Client`。`reqwest::Client` 内部自带连接池，
//! 可被所有 worker 同时使用。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, RETRY_AFTER};
use reqwest::Client;
use tracing::debug;

use crate::common::cache::SharedCache;
use crate::common::error::FetchError;
use crate::model::{Credential, ParsedProxy};

/// 一次请求的原始响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub retry_after: Option<String>,
    pub body: String,
}

#[async_trait]
pub trait GuildApi: Send + Sync {
    /// 以凭证认证请求 guild 列表；`proxy` 为 `None` 时直连。
    ///
    /// 连接失败、代理失败、超时等网络层故障返回 `Err`，
    /// 任何 HTTP 状态码都以 `Ok` 返回。
    async fn list_guilds(
        &self,
        credential: &Credential,
        proxy: Option<&ParsedProxy>,
    ) -> Result<ApiResponse, FetchError>;
}

pub struct HttpGuildApi {
    endpoint: String,
    timeout: Duration,
    pool_size: usize,
    direct: Client,
    proxied: SharedCache<ParsedProxy, Client>,
}

impl HttpGuildApi {
    /// `pool_size` 为每个主机保留的空闲连接数，应不小于 worker 数
    pub fn new(endpoint: impl Into<String>, timeout: Duration, pool_size: usize) -> Result<Self, FetchError> {
        let direct = build_client(None, timeout, pool_size)?;
        Ok(Self {
            endpoint: endpoint.into(),
            timeout,
            pool_size,
            direct,
            proxied: SharedCache::new(),
        })
    }

    fn client_for(&self, proxy: Option<&ParsedProxy>) -> Result<Client, FetchError> {
        match proxy {
            None => Ok(self.direct.clone()),
            Some(p) => self.proxied.get_or_try_insert(p, || {
                debug!("为代理 {} 创建客户端，当前缓存 {} 个", p.http, self.proxied.len());
                build_client(Some(p), self.timeout, self.pool_size)
            }),
        }
    }
}

fn build_client(proxy: Option<&ParsedProxy>, timeout: Duration, pool_size: usize) -> Result<Client, FetchError> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(pool_size.max(1));
    if let Some(p) = proxy {
        for rule in p.to_reqwest()? {
            builder = builder.proxy(rule);
        }
    }
    Ok(builder.build()?)
}

#[async_trait]
impl GuildApi for HttpGuildApi {
    async fn list_guilds(
        &self,
        credential: &Credential,
        proxy: Option<&ParsedProxy>,
    ) -> Result<ApiResponse, FetchError> {
        let client = self.client_for(proxy)?;
        let response = client
            .get(&self.endpoint)
            .header(AUTHORIZATION, credential.as_str())
            .send()
            .await?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;

        Ok(ApiResponse { status, retry_after, body })
    }
}
