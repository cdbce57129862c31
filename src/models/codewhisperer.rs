//! CodeWhisperer/Kiro API 数据模型
//!
//! 请求部分支持标准工具和特殊工具类型（如 web_search）。
//! 响应部分是流式 `assistantResponseEvent`，其解码/校验/编码见
//! `translator::kiro::event`。
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeWhispererRequest {
    pub conversation_state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_arn: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub chat_trigger_type: String,
    pub conversation_id: String,
    pub current_message: CurrentMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<HistoryItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentMessage {
    pub user_input_message: UserInputMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInputMessage {
    pub content: String,
    pub model_id: String,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<CWImage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_input_message_context: Option<UserInputMessageContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInputMessageContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<CWToolItem>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_results: Option<Vec<CWToolResult>>,
}

/// CodeWhisperer 工具项
///
/// 支持两种类型：
/// - 标准工具（带 tool_specification）
/// - 联网搜索工具（仅 type 字段）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CWToolItem {
    Standard(CWTool),
    WebSearch(CWWebSearchTool),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CWTool {
    pub tool_specification: ToolSpecification,
}

/// 联网搜索工具，格式：`{"type": "web_search"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CWWebSearchTool {
    #[serde(rename = "type")]
    pub tool_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpecification {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    pub json: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CWToolResult {
    pub content: Vec<CWTextContent>,
    pub status: String,
    pub tool_use_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CWTextContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CWImage {
    pub format: String,
    pub source: CWImageSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CWImageSource {
    pub bytes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryItem {
    User(UserHistoryItem),
    Assistant(AssistantHistoryItem),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserHistoryItem {
    pub user_input_message: UserInputMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantHistoryItem {
    pub assistant_response_message: AssistantResponseMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResponseMessage {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_uses: Option<Vec<CWToolUse>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CWToolUse {
    pub input: serde_json::Value,
    pub name: String,
    pub tool_use_id: String,
}

// ============================================================================
// Response types
// ============================================================================

/// 封闭取值集合的线上枚举
pub trait ClosedSet: Sized + Copy + PartialEq + 'static {
    /// 线上字段名，用于错误信息
    const FIELD: &'static str;
    const VARIANTS: &'static [Self];

    fn as_wire(&self) -> &'static str;

    fn from_wire(s: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| v.as_wire() == s)
    }

    /// 以 `|` 连接的合法取值，用于错误信息
    fn expected() -> String {
        Self::VARIANTS
            .iter()
            .map(|v| v.as_wire())
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// 枚举字段的解码结果
///
/// 解码阶段不拒绝集合外的值，而是原样保留为 `Unrecognized`，
/// 由校验阶段报告。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumValue<T> {
    Known(T),
    Unrecognized(String),
}

impl<T: ClosedSet> EnumValue<T> {
    pub fn parse(s: &str) -> Self {
        match T::from_wire(s) {
            Some(v) => EnumValue::Known(v),
            None => EnumValue::Unrecognized(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EnumValue::Known(v) => v.as_wire(),
            EnumValue::Unrecognized(s) => s,
        }
    }

    pub fn known(&self) -> Option<T> {
        match self {
            EnumValue::Known(v) => Some(*v),
            EnumValue::Unrecognized(_) => None,
        }
    }
}

impl<T: ClosedSet> From<T> for EnumValue<T> {
    fn from(v: T) -> Self {
        EnumValue::Known(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Markdown,
    Plain,
    Json,
}

impl ClosedSet for ContentType {
    const FIELD: &'static str = "contentType";
    const VARIANTS: &'static [Self] = &[ContentType::Markdown, ContentType::Plain, ContentType::Json];

    fn as_wire(&self) -> &'static str {
        match self {
            ContentType::Markdown => "text/markdown",
            ContentType::Plain => "text/plain",
            ContentType::Json => "application/json",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageStatus {
    Completed,
    InProgress,
    Error,
}

impl ClosedSet for MessageStatus {
    const FIELD: &'static str = "messageStatus";
    const VARIANTS: &'static [Self] = &[
        MessageStatus::Completed,
        MessageStatus::InProgress,
        MessageStatus::Error,
    ];

    fn as_wire(&self) -> &'static str {
        match self {
            MessageStatus::Completed => "COMPLETED",
            MessageStatus::InProgress => "IN_PROGRESS",
            MessageStatus::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserIntent {
    ExplainCodeSelection,
    SuggestAlternateImplementation,
    ApplyCommonBestPractices,
    ImproveCode,
    ShowExamples,
    CiteSources,
    ExplainLineByLine,
}

impl ClosedSet for UserIntent {
    const FIELD: &'static str = "userIntent";
    const VARIANTS: &'static [Self] = &[
        UserIntent::ExplainCodeSelection,
        UserIntent::SuggestAlternateImplementation,
        UserIntent::ApplyCommonBestPractices,
        UserIntent::ImproveCode,
        UserIntent::ShowExamples,
        UserIntent::CiteSources,
        UserIntent::ExplainLineByLine,
    ];

    fn as_wire(&self) -> &'static str {
        match self {
            UserIntent::ExplainCodeSelection => "EXPLAIN_CODE_SELECTION",
            UserIntent::SuggestAlternateImplementation => "SUGGEST_ALTERNATE_IMPLEMENTATION",
            UserIntent::ApplyCommonBestPractices => "APPLY_COMMON_BEST_PRACTICES",
            UserIntent::ImproveCode => "IMPROVE_CODE",
            UserIntent::ShowExamples => "SHOW_EXAMPLES",
            UserIntent::CiteSources => "CITE_SOURCES",
            UserIntent::ExplainLineByLine => "EXPLAIN_LINE_BY_LINE",
        }
    }
}

/// 流式响应事件（每个 chunk 一个，chunk 之间无状态）
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantResponseEvent {
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    pub content: String,
    /// 缺失时默认 `text/markdown`
    pub content_type: EnumValue<ContentType>,
    /// 缺失时默认 `COMPLETED`
    pub message_status: EnumValue<MessageStatus>,
    pub supplementary_web_links: Vec<SupplementaryWebLink>,
    pub references: Vec<Reference>,
    pub code_reference: Vec<Reference>,
    pub followup_prompt: Option<FollowupPrompt>,
    pub programming_language: Option<ProgrammingLanguage>,
    pub customizations: Vec<Customization>,
    pub user_intent: Option<EnumValue<UserIntent>>,
    pub code_query: Option<CodeQuery>,
}

impl Default for AssistantResponseEvent {
    fn default() -> Self {
        Self {
            conversation_id: None,
            message_id: None,
            content: String::new(),
            content_type: EnumValue::Known(ContentType::Markdown),
            message_status: EnumValue::Known(MessageStatus::Completed),
            supplementary_web_links: Vec::new(),
            references: Vec::new(),
            code_reference: Vec::new(),
            followup_prompt: None,
            programming_language: None,
            customizations: Vec::new(),
            user_intent: None,
            code_query: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplementaryWebLink {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// 引用/出处。所有字段都可选；全部缺失在结构上合法。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_content_span: Option<ContentSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_relevant_missed_alternative: Option<MostRelevantMissedAlternative>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentSpan {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MostRelevantMissedAlternative {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowupPrompt {
    pub content: String,
    pub user_intent: Option<EnumValue<UserIntent>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgrammingLanguage {
    pub language_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customization {
    pub arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeQuery {
    pub code_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_input_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub programming_language: Option<ProgrammingLanguage>,
}
