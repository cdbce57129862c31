pub mod anthropic;
pub mod canonical;
pub mod codewhisperer;
pub mod openai;

use serde::{Deserialize, Serialize};

/// 外部线上方言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    OpenAi,
    Anthropic,
    CodeWhisperer,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::OpenAi, Dialect::Anthropic, Dialect::CodeWhisperer];

    /// 单个 text 块能否压缩为裸字符串
    ///
    /// CodeWhisperer 的结构化内容始终以列表出现。
    pub fn accepts_bare_string_content(&self) -> bool {
        match self {
            Dialect::OpenAi | Dialect::Anthropic => true,
            Dialect::CodeWhisperer => false,
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::OpenAi => write!(f, "openai"),
            Dialect::Anthropic => write!(f, "anthropic"),
            Dialect::CodeWhisperer => write!(f, "codewhisperer"),
        }
    }
}
