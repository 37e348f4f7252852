mod common;
mod loader;
mod model;
mod service;

use std::sync::Arc;

use tracing::info;

use crate::common::console::{banner, prompt_workers, ConsoleStatus, StatusEvent, StatusSink};
use crate::common::log::init_logging;
use crate::model::app_config::{self, DEFAULT_CONFIG_PATH};
use crate::service::api::HttpGuildApi;
use crate::service::fetcher::FetchPolicy;
use crate::service::harvester::Harvester;
use crate::service::proxy_selector::ProxySelector;
use crate::service::storage::save_guild_ids;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 配置缺失或格式错误时直接返回，进程以非零状态退出
    let config = app_config::init(DEFAULT_CONFIG_PATH)?;
    init_logging(&config.log)?;

    let console = Arc::new(ConsoleStatus);
    println!("{}", banner());
    console.report(StatusEvent::Info("Welcome to GuildHydra\n".to_string()));

    let credentials = loader::read_credentials(&config.paths.tokens).await?;
    let proxies = loader::read_proxies(&config.paths.proxies).await;
    let selector = ProxySelector::new(proxies, config.proxy);
    info!("代理{}", if selector.is_active() { "已启用" } else { "未启用，直连请求" });

    let max_workers = match config.workers {
        Some(n) if n > 0 => n,
        _ => prompt_workers()?,
    };

    let api = HttpGuildApi::new(&config.fetch.endpoint, config.fetch.timeout(), max_workers)?;
    let harvester = Harvester::new(
        Arc::new(api),
        console.clone(),
        selector,
        FetchPolicy::from(&config.fetch),
    );
    let report = harvester.harvest(credentials, max_workers).await;
    println!();

    save_guild_ids(&config.paths.output, &report.unique).await?;

    console.report(StatusEvent::Results {
        total: report.total,
        duplicates: report.duplicates,
    });

    Ok(())
}
