//! Anthropic 前端协议
//!
//! 请求经 `ChatRequest` 转换为 CodeWhisperer 请求；响应事件转换为
//! Anthropic Messages API 的 SSE 帧：
//!
//! ```text
//! event: message_start
//! event: content_block_start
//! event: content_block_delta   (每个有内容的事件一帧)
//! event: content_block_stop
//! event: message_delta         (携带 input/output 用量)
//! event: message_stop
//! ```

use crate::config::TranslatorConfig;
use crate::converter::content::json_kind;
use crate::converter::{
    decode_content, to_canonical_tool, to_canonical_tool_choice, to_input_output_dialect,
    to_prompt_completion_dialect,
};
use crate::error::ContentError;
use crate::models::anthropic::AnthropicMessagesRequest;
use crate::models::canonical::{ChatRequest, ContentBlock, Message, Role, Usage};
use crate::models::codewhisperer::{AssistantResponseEvent, CodeWhispererRequest, MessageStatus};
use crate::models::Dialect;
use crate::translator::kiro::request::build_codewhisperer_request;
use crate::translator::traits::{RequestTranslator, ResponseTranslator, TranslateError};
use serde_json::{json, Value};
use uuid::Uuid;

/// Anthropic 到 Kiro 请求转换器
#[derive(Debug, Clone)]
pub struct AnthropicRequestTranslator {
    config: TranslatorConfig,
    pub profile_arn: Option<String>,
}

impl AnthropicRequestTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self {
            config,
            profile_arn: None,
        }
    }

    pub fn with_profile_arn(mut self, profile_arn: impl Into<String>) -> Self {
        self.profile_arn = Some(profile_arn.into());
        self
    }

    pub fn translate_with_id(
        &self,
        request: &AnthropicMessagesRequest,
        request_id: &str,
    ) -> Result<CodeWhispererRequest, TranslateError> {
        let chat = decode_anthropic_request(request)?;
        build_codewhisperer_request(&chat, &self.config, self.profile_arn.clone(), request_id)
    }
}

impl RequestTranslator for AnthropicRequestTranslator {
    type Input = AnthropicMessagesRequest;
    type Output = CodeWhispererRequest;
    type Error = TranslateError;

    fn translate_request(&self, request: Self::Input) -> Result<Self::Output, Self::Error> {
        self.translate_with_id(&request, &Uuid::new_v4().to_string())
    }
}

/// 将 Anthropic 请求解码为规范请求
pub fn decode_anthropic_request(
    request: &AnthropicMessagesRequest,
) -> Result<ChatRequest, TranslateError> {
    let mut chat = ChatRequest::new(request.model.clone());
    chat.stream = request.stream;
    chat.max_tokens = request.max_tokens;
    chat.temperature = request.temperature;
    chat.system = request.system.as_ref().map(decode_system).transpose()?;

    for msg in &request.messages {
        let role = match Role::parse(&msg.role) {
            Some(role @ (Role::User | Role::Assistant)) => role,
            _ => return Err(ContentError::UnknownRole(msg.role.clone()).into()),
        };
        chat.messages.push(Message::new(role, decode_content(&msg.content)?));
    }

    chat.tools = request
        .tools
        .iter()
        .flatten()
        .map(|raw| to_canonical_tool(raw, Dialect::Anthropic))
        .collect::<Result<Vec<_>, _>>()?;
    chat.tool_choice = request
        .tool_choice
        .as_ref()
        .map(to_canonical_tool_choice)
        .transpose()?;

    Ok(chat)
}

/// system 为字符串或 text 块列表（按 `\n` 拼接）
fn decode_system(raw: &Value) -> Result<String, ContentError> {
    match raw {
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) => Ok(decode_content(raw)?
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")),
        other => Err(ContentError::InvalidShape(json_kind(other))),
    }
}

// ============================================================================
// 响应转换
// ============================================================================

fn sse_frame(event_type: &str, data: &Value) -> String {
    format!("event: {event_type}\ndata: {data}\n\n")
}

/// Kiro 事件到 Anthropic SSE 的转换器
#[derive(Debug, Clone)]
pub struct AnthropicResponseTranslator {
    message_id: String,
    model: String,
    started: bool,
    usage: Usage,
    errored: bool,
}

impl AnthropicResponseTranslator {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_id(format!("msg_{}", Uuid::new_v4().simple()), model)
    }

    pub fn with_id(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            message_id: id.into(),
            model: model.into(),
            started: false,
            usage: Usage::default(),
            errored: false,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// 记录上游报告的用量（任一命名方式）
    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    fn create_message_start(&self) -> String {
        sse_frame(
            "message_start",
            &json!({
                "type": "message_start",
                "message": {
                    "id": self.message_id,
                    "type": "message",
                    "role": "assistant",
                    "model": self.model,
                    "content": [],
                    "stop_reason": Value::Null,
                    "stop_sequence": Value::Null,
                    "usage": {"input_tokens": 0, "output_tokens": 0}
                }
            }),
        )
    }

    fn create_content_block_start(&self) -> String {
        sse_frame(
            "content_block_start",
            &json!({
                "type": "content_block_start",
                "index": 0,
                "content_block": {"type": "text", "text": ""}
            }),
        )
    }

    /// 事件内容对应的 `content_block_delta` 帧
    pub fn create_text_delta(&self, text: &str) -> String {
        sse_frame(
            "content_block_delta",
            &json!({
                "type": "content_block_delta",
                "index": 0,
                "delta": {"type": "text_delta", "text": text}
            }),
        )
    }

    /// 最终的 `message_delta` 帧，usage 使用 input/output 命名
    pub fn create_message_delta(&self) -> String {
        let usage = to_input_output_dialect(&to_prompt_completion_dialect(&self.usage));
        sse_frame(
            "message_delta",
            &json!({
                "type": "message_delta",
                "delta": {"stop_reason": "end_turn", "stop_sequence": Value::Null},
                "usage": usage
            }),
        )
    }

    /// 上游报告 `messageStatus = ERROR` 时的 `error` 帧
    pub fn create_error(&self) -> String {
        sse_frame(
            "error",
            &json!({
                "type": "error",
                "error": {
                    "type": "api_error",
                    "message": "upstream reported messageStatus=ERROR"
                }
            }),
        )
    }

    fn start_frames(&mut self) -> Vec<String> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        vec![self.create_message_start(), self.create_content_block_start()]
    }
}

impl ResponseTranslator for AnthropicResponseTranslator {
    type Output = Vec<String>;

    fn translate_event(&mut self, event: &AssistantResponseEvent) -> Option<Self::Output> {
        if event.message_status.known() == Some(MessageStatus::Error) {
            tracing::warn!("[ANTHROPIC] upstream reported messageStatus=ERROR");
            self.errored = true;
        }

        if event.content.is_empty() {
            return None;
        }

        let mut frames = self.start_frames();
        frames.push(self.create_text_delta(&event.content));
        Some(frames)
    }

    fn finalize(&mut self) -> Vec<Self::Output> {
        let mut frames = self.start_frames();
        frames.push(sse_frame(
            "content_block_stop",
            &json!({"type": "content_block_stop", "index": 0}),
        ));
        if self.errored {
            frames.push(self.create_error());
        }
        frames.push(self.create_message_delta());
        frames.push(sse_frame("message_stop", &json!({"type": "message_stop"})));
        vec![frames]
    }

    fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.model));
    }
}
