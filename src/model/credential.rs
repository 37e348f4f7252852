use std::fmt;
use std::sync::Arc;

use crate::common::utils::mask;

/// 原始行中前缀与凭证之间的分隔符
const PREFIX_DELIMITER: char = ':';

/// 用于请求认证的不透明 bearer 字符串，提取后不可变。
///
/// 内部使用 `Arc<str>`，在多个 worker 之间克隆无需复制字符串。
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(Arc<str>);

impl Credential {
    /// 从一行原始输入中提取凭证：去掉首尾空白后取最后一个 `:` 之后的部分。
    ///
    /// 提取结果为空时返回 `None`。
    pub fn extract(line: &str) -> Option<Self> {
        let line = line.trim();
        let token = match line.rfind(PREFIX_DELIMITER) {
            Some(idx) => &line[idx + PREFIX_DELIMITER.len_utf8()..],
            None => line,
        };
        if token.is_empty() {
            None
        } else {
            Some(Self(Arc::from(token)))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 日志与控制台使用的脱敏形式：前 10 位 + `...` + 后 4 位
    pub fn masked(&self) -> String {
        mask(&self.0, 10, 4)
    }
}

// 避免在 `{:?}` 输出中泄露完整凭证
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}
