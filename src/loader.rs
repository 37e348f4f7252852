//! 启动阶段读取凭证与代理列表。

use std::path::Path;

use futures::Stream;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

use crate::common::error::ApiError;
use crate::model::{Credential, ProxyDescriptor};

/// 打开凭证文件并返回按行惰性读取的凭证流。
///
/// 文件无法打开时返回 [`ApiError::MissingInput`]，此时尚未开始任何并发任务。
/// 读取过程中的 IO 错误会记录日志并结束流。
pub async fn read_credentials(path: impl AsRef<Path>) -> Result<impl Stream<Item = Credential>, ApiError> {
    let path = path.as_ref();
    let file = File::open(path).await.map_err(|source| {
        error!("Token file {} not found.", path.display());
        ApiError::MissingInput {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let lines = BufReader::new(file).lines();
    Ok(futures::stream::unfold(lines, |mut lines| async move {
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(credential) = Credential::extract(&line) {
                        return Some((credential, lines));
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    error!("读取凭证文件失败：{}", e);
                    return None;
                }
            }
        }
    }))
}

/// 读取代理列表，每个非空行一个描述符。文件不存在时返回空列表。
pub async fn read_proxies(path: impl AsRef<Path>) -> Vec<ProxyDescriptor> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            let proxies: Vec<ProxyDescriptor> = text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(ProxyDescriptor::new)
                .collect();
            info!("读取到 {} 条代理", proxies.len());
            proxies
        }
        Err(e) => {
            error!("Proxy file {} not found: {}", path.display(), e);
            Vec::new()
        }
    }
}
