use std::path::PathBuf;
use thiserror::Error;

/// 启动阶段及应用层错误，任何一个都会终止整个运行。
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),
    #[error("required input file {path} could not be opened: {source}")]
    MissingInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    PromptError(#[from] dialoguer::Error),
}

/// 代理描述符无法拆分为认证段和主机段。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("invalid proxy format: {descriptor}")]
    Malformed { descriptor: String },
}

/// 单次请求在网络边界上的失败，对当前凭证而言是致命的。
#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Transport(String),
    #[error("undecodable guild list: {0}")]
    Body(#[from] serde_json::Error),
}
