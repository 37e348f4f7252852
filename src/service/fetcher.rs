//! # fetcher 模块
//!
//! 单个凭证的抓取重试状态机。
//!
//! 每次尝试前重新选择代理，然后根据响应决定下一步：
//!
//! - `200`：解析 guild 列表，成功返回；
//! - `429`：按 `Retry-After`（缺省为 `rate_limit_delay`）等待后重试；
//! - 其他状态码：等待 `rate_limit_delay` 后重试；
//! - 网络层故障：立即终止该凭证，输出失败记录。
//!
//! 尝试次数用尽时静默返回。任何失败都不会越过本函数边界，
//! 最坏情况下返回空结果。等待期间 worker 一直被占用。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error};

use crate::common::console::{StatusEvent, StatusSink};
use crate::common::error::FetchError;
use crate::common::utils::parse_retry_after;
use crate::model::{Credential, FetchConfig, FetchOutcome, FetchResult, GuildSummary};
use crate::service::api::{ApiResponse, GuildApi};
use crate::service::proxy_selector::ProxySelector;

/// 网络故障时展示给操作者的原因
pub const NETWORK_FAILURE_REASON: &str = "Invalid Proxy / Network Issue";

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub max_attempts: u32,
    pub rate_limit_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_delay: Duration::from_secs(1),
        }
    }
}

impl From<&FetchConfig> for FetchPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            rate_limit_delay: config.rate_limit_delay(),
        }
    }
}

/// 单次响应的判定结果
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Success(Vec<String>),
    RateLimited(Duration),
    Retry,
}

fn classify(response: ApiResponse, policy: &FetchPolicy) -> Result<Verdict, FetchError> {
    match response.status {
        200 => {
            let guilds: Vec<GuildSummary> = serde_json::from_str(&response.body)?;
            Ok(Verdict::Success(guilds.iter().map(GuildSummary::id).collect()))
        }
        429 => {
            let wait = parse_retry_after(response.retry_after.as_deref()).unwrap_or(policy.rate_limit_delay);
            Ok(Verdict::RateLimited(wait))
        }
        _ => Ok(Verdict::Retry),
    }
}

pub async fn fetch_guild_ids(
    credential: &Credential,
    selector: &ProxySelector,
    api: &dyn GuildApi,
    status: &dyn StatusSink,
    policy: &FetchPolicy,
) -> FetchResult {
    let mut guild_ids = Vec::new();

    for attempt in 1..=policy.max_attempts {
        let proxy = selector.select();
        let verdict = match api.list_guilds(credential, proxy.as_ref()).await {
            Ok(response) => classify(response, policy),
            Err(e) => Err(e),
        };

        let wait = match verdict {
            Ok(Verdict::Success(ids)) => {
                let count = ids.len();
                guild_ids.extend(ids);
                status.report(StatusEvent::Success {
                    credential: credential.masked(),
                    guilds: count,
                });
                return FetchResult {
                    guild_ids,
                    outcome: FetchOutcome::Success,
                    attempts: attempt,
                };
            }
            Ok(Verdict::RateLimited(wait)) => {
                debug!("{} 第 {} 次请求被限流，等待 {:?}", credential.masked(), attempt, wait);
                wait
            }
            Ok(Verdict::Retry) => {
                debug!("{} 第 {} 次请求失败，等待 {:?}", credential.masked(), attempt, policy.rate_limit_delay);
                policy.rate_limit_delay
            }
            Err(e) => {
                status.report(StatusEvent::Failure {
                    credential: credential.masked(),
                    reason: NETWORK_FAILURE_REASON.to_string(),
                });
                error!("Error fetching guild IDs for token {}: {}", credential.masked(), e);
                return FetchResult {
                    guild_ids,
                    outcome: FetchOutcome::FatalError,
                    attempts: attempt,
                };
            }
        };

        // 最后一次尝试之后不再等待
        if attempt < policy.max_attempts {
            sleep(wait).await;
        }
    }

    debug!("{} 重试 {} 次后放弃", credential.masked(), policy.max_attempts);
    FetchResult {
        guild_ids,
        outcome: FetchOutcome::ExhaustedRetries,
        attempts: policy.max_attempts,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::common::console::testing::RecordingStatus;
    use crate::model::ProxyDescriptor;
    use tokio::time::Instant;

    fn credential() -> Credential {
        Credential::extract("mail:pass:ABCDEFGHIJ0123456789WXYZ").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_first_attempt() {
        let api = ScriptedApi::new(vec![ok(r#"[{"id":"1"},{"id":"2"}]"#)]);
        let status = RecordingStatus::default();

        let result = fetch_guild_ids(&credential(), &ProxySelector::direct(), &api, &status, &FetchPolicy::default()).await;

        assert_eq!(result.guild_ids, vec!["1", "2"]);
        assert_eq!(result.outcome, FetchOutcome::Success);
        assert_eq!(result.attempts, 1);
        assert_eq!(
            status.events(),
            vec![StatusEvent::Success { credential: "ABCDEFGHIJ...WXYZ".to_string(), guilds: 2 }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_two_rate_limits() {
        let api = ScriptedApi::new(vec![
            limited(Some("2")),
            limited(Some("2")),
            ok(r#"[{"id":"30"},{"id":"31"},{"id":"32"}]"#),
            ok(r#"[{"id":"never"}]"#),
        ]);
        let status = RecordingStatus::default();
        let start = Instant::now();

        let result = fetch_guild_ids(&credential(), &ProxySelector::direct(), &api, &status, &FetchPolicy::default()).await;

        assert_eq!(result.guild_ids, vec!["30", "31", "32"]);
        assert_eq!(result.attempts, 3);
        assert_eq!(api.calls(), 3);
        assert!(start.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_every_attempt() {
        let steps = (0..5).map(|_| limited(Some("3"))).collect();
        let api = ScriptedApi::new(steps);
        let status = RecordingStatus::default();
        let start = Instant::now();

        let result = fetch_guild_ids(&credential(), &ProxySelector::direct(), &api, &status, &FetchPolicy::default()).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4 * 3));
        assert!(elapsed < Duration::from_secs(5 * 3));
        assert!(result.guild_ids.is_empty());
        assert_eq!(result.outcome, FetchOutcome::ExhaustedRetries);
        assert_eq!(api.calls(), 5);
        assert!(status.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_default_delay() {
        let api = ScriptedApi::new(vec![limited(None), limited(Some("n/a")), ok("[]")]);
        let status = RecordingStatus::default();
        let policy = FetchPolicy { max_attempts: 5, rate_limit_delay: Duration::from_secs(7) };
        let start = Instant::now();

        let result = fetch_guild_ids(&credential(), &ProxySelector::direct(), &api, &status, &policy).await;

        assert_eq!(start.elapsed(), Duration::from_secs(14));
        assert_eq!(result.outcome, FetchOutcome::Success);
        assert!(result.guild_ids.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_retry_after_uses_default_delay() {
        let api = ScriptedApi::new(vec![limited(Some("1e20")), ok(r#"[{"id":"1"}]"#)]);
        let status = RecordingStatus::default();
        let policy = FetchPolicy { max_attempts: 5, rate_limit_delay: Duration::from_secs(2) };
        let start = Instant::now();

        let result = fetch_guild_ids(&credential(), &ProxySelector::direct(), &api, &status, &policy).await;

        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(result.outcome, FetchOutcome::Success);
        assert_eq!(result.guild_ids, vec!["1"]);
        assert_eq!(result.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_status_retries() {
        let api = ScriptedApi::new(vec![status(500), status(401), status(503)]);
        let recorder = RecordingStatus::default();
        let policy = FetchPolicy { max_attempts: 3, rate_limit_delay: Duration::from_secs(1) };
        let start = Instant::now();

        let result = fetch_guild_ids(&credential(), &ProxySelector::direct(), &api, &recorder, &policy).await;

        assert_eq!(start.elapsed(), Duration::from_secs(2));
        assert_eq!(result.outcome, FetchOutcome::ExhaustedRetries);
        assert_eq!(result.attempts, 3);
        assert!(recorder.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_fault_is_fatal() {
        let api = ScriptedApi::new(vec![Step::Fail("proxy refused"), ok(r#"[{"id":"1"}]"#)]);
        let status = RecordingStatus::default();
        let start = Instant::now();

        let result = fetch_guild_ids(&credential(), &ProxySelector::direct(), &api, &status, &FetchPolicy::default()).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(result.guild_ids.is_empty());
        assert_eq!(result.outcome, FetchOutcome::FatalError);
        assert_eq!(api.calls(), 1);
        assert_eq!(
            status.events(),
            vec![StatusEvent::Failure {
                credential: "ABCDEFGHIJ...WXYZ".to_string(),
                reason: NETWORK_FAILURE_REASON.to_string(),
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_undecodable_body_is_fatal() {
        let api = ScriptedApi::new(vec![ok("<html>cloudflare</html>")]);
        let status = RecordingStatus::default();

        let result = fetch_guild_ids(&credential(), &ProxySelector::direct(), &api, &status, &FetchPolicy::default()).await;

        assert_eq!(result.outcome, FetchOutcome::FatalError);
        assert_eq!(status.events().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_proxy_reselected_each_attempt() {
        let api = ScriptedApi::new(vec![status(502), status(502), ok("[]")]);
        let status = RecordingStatus::default();
        let proxies = vec![ProxyDescriptor::new("a:1@h1:1"), ProxyDescriptor::new("broken"), ProxyDescriptor::new("b:2@h2:2")];
        let next = std::sync::atomic::AtomicUsize::new(0);
        let selector = ProxySelector::with_picker(proxies, true, move |len| {
            next.fetch_add(1, std::sync::atomic::Ordering::SeqCst) % len
        });

        fetch_guild_ids(&credential(), &selector, &api, &status, &FetchPolicy::default()).await;

        assert_eq!(
            *api.seen_proxies.lock().unwrap(),
            vec![Some("http://a:1@h1:1".to_string()), None, Some("http://b:2@h2:2".to_string())]
        );
    }
}
