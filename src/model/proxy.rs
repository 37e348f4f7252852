use serde::{Deserialize, Serialize};

use crate::common::error::ProxyError;

/// 认证段与主机段之间的分隔符
const AUTH_SEPARATOR: char = '@';

/// 代理列表文件中的一行原始字符串，形如 `user:pass@host:port`。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyDescriptor(String);

impl ProxyDescriptor {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// 拆分为认证段与主机段，恰好两段时成功。
    pub fn parse(&self) -> Result<ParsedProxy, ProxyError> {
        let mut parts = self.0.split(AUTH_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(user_pass), Some(host_port), None) => Ok(ParsedProxy {
                http: format!("http://{}@{}", user_pass, host_port),
                https: format!("https://{}@{}", user_pass, host_port),
            }),
            _ => Err(ProxyError::Malformed {
                descriptor: self.0.clone(),
            }),
        }
    }
}

/// 解析后的代理配置，分别对应明文与加密两种传输方案。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedProxy {
    pub http: String,
    pub https: String,
}

impl ParsedProxy {
    /// 构造对应的 reqwest 代理规则
    pub fn to_reqwest(&self) -> reqwest::Result<[reqwest::Proxy; 2]> {
        Ok([
            reqwest::Proxy::http(&self.http)?,
            reqwest::Proxy::https(&self.https)?,
        ])
    }
}
