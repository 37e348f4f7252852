use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 远端接口返回的单个 guild 对象，只关心 `id` 字段。
#[derive(Debug, Clone, Deserialize)]
pub struct GuildSummary {
    id: Value,
}

impl GuildSummary {
    /// 字符串原样返回，数字等其他 JSON 值按其文本形式返回
    pub fn id(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// 单个凭证处理结束时所处的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchOutcome {
    Success,
    ExhaustedRetries,
    FatalError,
}

/// 单个凭证的抓取结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// 按接口返回顺序排列的 guild id，可能为空
    pub guild_ids: Vec<String>,
    pub outcome: FetchOutcome,
    /// 实际发出的请求次数
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_id_forms() {
        let guilds: Vec<GuildSummary> =
            serde_json::from_str(r#"[{"id":"81384788765712384","name":"a"},{"id":42}]"#).unwrap();
        let ids: Vec<String> = guilds.iter().map(|g| g.id()).collect();
        assert_eq!(ids, vec!["81384788765712384", "42"]);
    }

    #[test]
    fn test_guild_missing_id() {
        let parsed: Result<Vec<GuildSummary>, _> = serde_json::from_str(r#"[{"name":"a"}]"#);
        assert!(parsed.is_err());
    }
}
