//! 规范模型（Canonical Model）
//!
//! 与具体协议无关的内存表示。所有方言之间的转换都经过这里：
//! 入站请求先解码为规范模型，出站时再编码为目标方言的结构。
//!
//! 多态字段（消息内容、tool_choice、工具结果）在解码边界处一次性
//! 解析为带标签的枚举，之后不再以 `serde_json::Value` 形式流转。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 消息角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条消息
///
/// 纯文本内容在解码时等价于只含一个 `text` 块的序列。
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// 拼接所有 text 块
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// 内容块
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    /// `tool_use_id` 必须引用对话中此前出现过的 `tool_use.id`，
    /// 本层不校验，由上游保证。
    ToolResult {
        tool_use_id: String,
        content: ToolResultContent,
        is_error: bool,
    },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// 线上格式中的 `type` 判别值
    pub fn type_name(&self) -> &'static str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::Image { .. } => "image",
            ContentBlock::ToolUse { .. } => "tool_use",
            ContentBlock::ToolResult { .. } => "tool_result",
        }
    }
}

/// base64 内嵌图片。不支持 URL 引用的图片。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub media_type: ImageMediaType,
    pub data: String,
}

/// 图片媒体类型（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageMediaType {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageMediaType {
    pub fn as_mime(&self) -> &'static str {
        match self {
            ImageMediaType::Jpeg => "image/jpeg",
            ImageMediaType::Png => "image/png",
            ImageMediaType::Gif => "image/gif",
            ImageMediaType::Webp => "image/webp",
        }
    }

    pub fn from_mime(s: &str) -> Option<Self> {
        match s {
            "image/jpeg" => Some(ImageMediaType::Jpeg),
            "image/png" => Some(ImageMediaType::Png),
            "image/gif" => Some(ImageMediaType::Gif),
            "image/webp" => Some(ImageMediaType::Webp),
            _ => None,
        }
    }

    /// CodeWhisperer `images[].format` 使用的短格式
    pub fn format(&self) -> &'static str {
        match self {
            ImageMediaType::Jpeg => "jpeg",
            ImageMediaType::Png => "png",
            ImageMediaType::Gif => "gif",
            ImageMediaType::Webp => "webp",
        }
    }
}

/// 工具结果载荷：字符串、列表或映射
#[derive(Debug, Clone, PartialEq)]
pub enum ToolResultContent {
    Text(String),
    List(Vec<Value>),
    Map(Map<String, Value>),
}

impl ToolResultContent {
    pub fn to_value(&self) -> Value {
        match self {
            ToolResultContent::Text(s) => Value::String(s.clone()),
            ToolResultContent::List(items) => Value::Array(items.clone()),
            ToolResultContent::Map(map) => Value::Object(map.clone()),
        }
    }

    /// 展平为纯文本：列表中的 text 块按行拼接，映射序列化为 JSON
    pub fn to_text(&self) -> String {
        match self {
            ToolResultContent::Text(s) => s.clone(),
            ToolResultContent::List(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(obj) if obj.get("type").and_then(Value::as_str) == Some("text") => {
                        obj.get("text").and_then(Value::as_str).map(str::to_string)
                    }
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
            ToolResultContent::Map(map) => Value::Object(map.clone()).to_string(),
        }
    }
}

/// 工具定义
///
/// 参数 schema 作为不透明载荷传递，不做结构校验。
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 工具选择策略
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolChoice {
    Auto,
    /// OpenAI 中称为 `required`
    Any,
    None,
    Specific(String),
}

impl ToolChoice {
    /// 是否强制调用工具
    pub fn forces_tool_use(&self) -> bool {
        matches!(self, ToolChoice::Any | ToolChoice::Specific(_))
    }
}

/// Token 用量
///
/// 同时容纳两套命名：prompt/completion/total 与 input/output。
/// 每个字段都是可选的，以区分“缺失”和“为零”。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
}

/// 与方言无关的对话请求
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: Option<ToolChoice>,
    pub stream: bool,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            messages: Vec::new(),
            tools: Vec::new(),
            tool_choice: None,
            stream: false,
            max_tokens: None,
            temperature: None,
        }
    }
}
