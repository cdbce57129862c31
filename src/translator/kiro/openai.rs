//! OpenAI 前端协议
//!
//! - 请求：`ChatCompletionRequest` → `ChatRequest` → `CodeWhispererRequest`
//! - 响应：`AssistantResponseEvent` → `ChatCompletionChunk`，
//!   流结束时输出 `finish_reason` chunk，也可汇总为非流式响应

use crate::config::TranslatorConfig;
use crate::converter::{decode_content, to_canonical_tool, to_canonical_tool_choice, to_prompt_completion_dialect};
use crate::error::ContentError;
use crate::models::canonical::{
    ChatRequest, ContentBlock, Message, Role, ToolResultContent, Usage,
};
use crate::models::codewhisperer::{AssistantResponseEvent, ClosedSet, CodeWhispererRequest, MessageStatus};
use crate::models::openai::*;
use crate::models::Dialect;
use crate::translator::kiro::request::build_codewhisperer_request;
use crate::translator::traits::{RequestTranslator, ResponseTranslator, TranslateError};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// OpenAI 到 Kiro 请求转换器
#[derive(Debug, Clone)]
pub struct OpenAiRequestTranslator {
    config: TranslatorConfig,
    /// 可选的 Profile ARN (AWS CodeWhisperer)
    pub profile_arn: Option<String>,
}

impl OpenAiRequestTranslator {
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

    /// 转换请求，模型查找失败时错误中携带该请求 ID
    pub fn translate_with_id(
        &self,
        request: &ChatCompletionRequest,
        request_id: &str,
    ) -> Result<CodeWhispererRequest, TranslateError> {
        let chat = decode_openai_request(request)?;
        build_codewhisperer_request(&chat, &self.config, self.profile_arn.clone(), request_id)
    }
}

impl RequestTranslator for OpenAiRequestTranslator {
    type Input = ChatCompletionRequest;
    type Output = CodeWhispererRequest;
    type Error = TranslateError;

    fn translate_request(&self, request: Self::Input) -> Result<Self::Output, Self::Error> {
        self.translate_with_id(&request, &Uuid::new_v4().to_string())
    }
}

// ============================================================================
// 请求解码
// ============================================================================

/// 将 OpenAI 请求解码为规范请求
pub fn decode_openai_request(request: &ChatCompletionRequest) -> Result<ChatRequest, TranslateError> {
    let mut chat = ChatRequest::new(request.model.clone());
    chat.stream = request.stream;
    chat.max_tokens = request.max_tokens;
    chat.temperature = request.temperature;

    let mut system_parts: Vec<String> = Vec::new();

    for msg in &request.messages {
        match msg.role.as_str() {
            "system" => {
                let text = msg.get_content_text();
                if !text.is_empty() {
                    system_parts.push(text);
                }
            }
            "user" => {
                let content = match &msg.content {
                    Some(Value::Null) | None => Vec::new(),
                    Some(raw) => decode_openai_content(raw)?,
                };
                chat.messages.push(Message::new(Role::User, content));
            }
            "assistant" => {
                let mut content = match &msg.content {
                    Some(Value::Null) | None => Vec::new(),
                    Some(raw) => decode_openai_content(raw)?,
                };
                for tc in msg.tool_calls.iter().flatten() {
                    content.push(tool_call_to_block(tc));
                }
                chat.messages.push(Message::new(Role::Assistant, content));
            }
            "tool" => {
                let tool_use_id = msg
                    .tool_call_id
                    .clone()
                    .ok_or(ContentError::MissingMessageField("tool_call_id"))?;
                let block = ContentBlock::ToolResult {
                    tool_use_id,
                    content: ToolResultContent::Text(msg.get_content_text()),
                    is_error: false,
                };
                // 连续的 tool 消息归入同一条 user 消息
                match chat.messages.last_mut() {
                    Some(last) if is_tool_result_message(last) => last.content.push(block),
                    _ => chat.messages.push(Message::new(Role::User, vec![block])),
                }
            }
            other => return Err(ContentError::UnknownRole(other.to_string()).into()),
        }
    }

    if !system_parts.is_empty() {
        chat.system = Some(system_parts.join("\n"));
    }

    chat.tools = request
        .tools
        .iter()
        .flatten()
        .map(|raw| to_canonical_tool(raw, Dialect::OpenAi))
        .collect::<Result<Vec<_>, _>>()?;
    chat.tool_choice = request
        .tool_choice
        .as_ref()
        .map(to_canonical_tool_choice)
        .transpose()?;

    Ok(chat)
}

fn is_tool_result_message(msg: &Message) -> bool {
    msg.role == Role::User
        && !msg.content.is_empty()
        && msg
            .content
            .iter()
            .all(|b| matches!(b, ContentBlock::ToolResult { .. }))
}

fn tool_call_to_block(tc: &ToolCall) -> ContentBlock {
    let input = serde_json::from_str::<Value>(&tc.function.arguments)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| {
            tracing::warn!(
                "[OPENAI] tool call {} carries unparsable arguments, using {{}}",
                tc.id
            );
            json!({})
        });
    ContentBlock::ToolUse {
        id: tc.id.clone(),
        name: tc.function.name.clone(),
        input,
    }
}

/// OpenAI 内容部件改写为通用内容块后严格解码
///
/// `image_url` 仅接受 `data:` URL，其余 URL 引用的图片被拒绝。
fn decode_openai_content(raw: &Value) -> Result<Vec<ContentBlock>, ContentError> {
    let Value::Array(parts) = raw else {
        return decode_content(raw);
    };

    let mut blocks = Vec::with_capacity(parts.len());
    for (index, part) in parts.iter().enumerate() {
        if part.get("type").and_then(Value::as_str) != Some("image_url") {
            blocks.push(part.clone());
            continue;
        }

        let url = part
            .get("image_url")
            .and_then(|u| u.get("url").or(Some(u)))
            .and_then(Value::as_str)
            .ok_or(ContentError::MissingField {
                index,
                block_type: "image_url",
                field: "url",
            })?;
        let (media_type, data) = parse_data_url(url).ok_or_else(|| ContentError::UnsupportedImageSource {
            index,
            source_type: "url".to_string(),
        })?;
        blocks.push(json!({
            "type": "image",
            "source": {"type": "base64", "media_type": media_type, "data": data}
        }));
    }

    decode_content(&Value::Array(blocks))
}

/// `data:image/png;base64,XXXX` → (`image/png`, `XXXX`)
fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    url.strip_prefix("data:")?.split_once(";base64,")
}

// ============================================================================
// 响应转换
// ============================================================================

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Kiro 事件到 OpenAI chunk 的转换器
#[derive(Debug, Clone)]
pub struct OpenAiResponseTranslator {
    response_id: String,
    model: String,
    created: u64,
    content: String,
    usage: Usage,
    errored: bool,
}

impl OpenAiResponseTranslator {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            response_id: format!("chatcmpl-{}", Uuid::new_v4()),
            model: model.into(),
            created: unix_now(),
            content: String::new(),
            usage: Usage::default(),
            errored: false,
        }
    }

    pub fn response_id(&self) -> &str {
        &self.response_id
    }

    /// 记录上游报告的用量（任一命名方式）
    pub fn set_usage(&mut self, usage: Usage) {
        self.usage = usage;
    }

    fn finish_reason(&self) -> &'static str {
        if self.errored {
            "error"
        } else {
            "stop"
        }
    }

    fn chunk(&self, delta: StreamDelta, finish_reason: Option<String>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.response_id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![StreamChoice {
                index: 0,
                delta,
                finish_reason,
            }],
        }
    }

    /// 流式结束 chunk
    pub fn end_chunk(&self) -> ChatCompletionChunk {
        self.chunk(
            StreamDelta {
                role: None,
                content: None,
                tool_calls: None,
            },
            Some(self.finish_reason().to_string()),
        )
    }

    /// 汇总为非流式响应，usage 转换为 prompt/completion 命名
    pub fn to_response(&self) -> ChatCompletionResponse {
        let usage = to_prompt_completion_dialect(&self.usage);

        ChatCompletionResponse {
            id: self.response_id.clone(),
            object: "chat.completion".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![Choice {
                index: 0,
                message: ResponseMessage {
                    role: "assistant".to_string(),
                    content: if self.content.is_empty() {
                        None
                    } else {
                        Some(self.content.clone())
                    },
                    tool_calls: None,
                },
                finish_reason: self.finish_reason().to_string(),
            }],
            usage,
        }
    }
}

impl ResponseTranslator for OpenAiResponseTranslator {
    type Output = ChatCompletionChunk;

    fn translate_event(&mut self, event: &AssistantResponseEvent) -> Option<Self::Output> {
        if event.message_status.known() == Some(MessageStatus::Error) {
            tracing::warn!(
                "[OPENAI] upstream reported {}={}",
                MessageStatus::FIELD,
                event.message_status.as_str()
            );
            self.errored = true;
        }

        if event.content.is_empty() {
            return None;
        }

        let role = self.content.is_empty().then(|| "assistant".to_string());
        self.content.push_str(&event.content);
        Some(self.chunk(
            StreamDelta {
                role,
                content: Some(event.content.clone()),
                tool_calls: None,
            },
            None,
        ))
    }

    fn finalize(&mut self) -> Vec<Self::Output> {
        vec![self.end_chunk()]
    }

    fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.model));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::canonical::{ImageMediaType, ToolChoice};
    use crate::models::codewhisperer::EnumValue;
    use crate::translator::TranslateErrorKind;

    fn parse_request(value: Value) -> ChatCompletionRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_decode_system_and_tool_flow() {
        let request = parse_request(json!({
            "model": "claude-sonnet-4-5",
            "messages": [
                {"role": "system", "content": "Rule A"},
                {"role": "system", "content": [{"type": "text", "text": "Rule B"}]},
                {"role": "user", "content": "list files"},
                {"role": "assistant", "content": null, "tool_calls": [
                    {"id": "call_1", "type": "function", "function": {"name": "ls", "arguments": "{\"dir\":\".\"}"}},
                    {"id": "call_2", "type": "function", "function": {"name": "ls", "arguments": "not json"}}
                ]},
                {"role": "tool", "tool_call_id": "call_1", "content": "a.rs"},
                {"role": "tool", "tool_call_id": "call_2", "content": "b.rs"}
            ],
            "tool_choice": "required"
        }));
        let chat = decode_openai_request(&request).unwrap();

        assert_eq!(chat.system.as_deref(), Some("Rule A\nRule B"));
        assert_eq!(chat.messages.len(), 3);
        assert_eq!(chat.tool_choice, Some(ToolChoice::Any));
        match &chat.messages[1].content[..] {
            [ContentBlock::ToolUse { input: first, .. }, ContentBlock::ToolUse { input: second, .. }] => {
                assert_eq!(first, &json!({"dir": "."}));
                assert_eq!(second, &json!({}));
            }
            other => panic!("unexpected blocks {other:?}"),
        }
        assert_eq!(chat.messages[2].role, Role::User);
        assert_eq!(chat.messages[2].content.len(), 2);
    }

    #[test]
    fn test_decode_data_url_image() {
        let request = parse_request(json!({
            "model": "claude-sonnet-4-5",
            "messages": [{"role": "user", "content": [
                {"type": "text", "text": "look"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,iVBOR"}}
            ]}]
        }));
        let chat = decode_openai_request(&request).unwrap();
        match &chat.messages[0].content[1] {
            ContentBlock::Image { source } => {
                assert_eq!(source.media_type, ImageMediaType::Png);
                assert_eq!(source.data, "iVBOR");
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_remote_image_url_rejected() {
        let request = parse_request(json!({
            "model": "claude-sonnet-4-5",
            "messages": [{"role": "user", "content": [
                {"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}}
            ]}]
        }));
        let err = decode_openai_request(&request).unwrap_err();
        assert_eq!(err.kind, TranslateErrorKind::UnsupportedFeature);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let request = parse_request(json!({
            "model": "m",
            "messages": [{"role": "developer", "content": "x"}]
        }));
        assert!(decode_openai_request(&request).is_err());
    }

    #[test]
    fn test_translate_request_end_to_end() {
        let translator = OpenAiRequestTranslator::new(TranslatorConfig::default())
            .with_profile_arn("arn:aws:codewhisperer:us-east-1:1:profile/x");
        let request = parse_request(json!({
            "model": "claude-haiku-4-5",
            "messages": [{"role": "user", "content": "hi"}],
            "tools": [{"type": "function", "function": {"name": "ls", "parameters": {"type": "object"}}}]
        }));
        let cw = translator.translate_request(request).unwrap();
        assert_eq!(
            cw.conversation_state.current_message.user_input_message.model_id,
            "claude-haiku-4.5"
        );
        assert!(cw.profile_arn.is_some());
    }

    #[test]
    fn test_translate_request_unknown_model() {
        let translator = OpenAiRequestTranslator::new(TranslatorConfig::default());
        let request = parse_request(json!({
            "model": "gpt-4o",
            "messages": [{"role": "user", "content": "hi"}]
        }));
        let err = translator.translate_with_id(&request, "req-7").unwrap_err();
        assert_eq!(err.kind, TranslateErrorKind::ModelNotFound);
        assert!(err.message.contains("req-7"));
    }

    fn event(content: &str) -> AssistantResponseEvent {
        AssistantResponseEvent {
            conversation_id: Some("c".to_string()),
            message_id: Some("m".to_string()),
            content: content.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_response_chunks_and_end() {
        let mut translator = OpenAiResponseTranslator::new("claude-sonnet-4-5");

        let first = translator.translate_event(&event("Hel")).unwrap();
        assert_eq!(first.object, "chat.completion.chunk");
        assert_eq!(first.choices[0].delta.role.as_deref(), Some("assistant"));
        let second = translator.translate_event(&event("lo")).unwrap();
        assert!(second.choices[0].delta.role.is_none());
        assert!(translator.translate_event(&event("")).is_none());

        let end = translator.finalize();
        assert_eq!(end.len(), 1);
        assert_eq!(end[0].choices[0].finish_reason.as_deref(), Some("stop"));
        assert_eq!(end[0].id, first.id);
    }

    #[test]
    fn test_response_usage_normalized() {
        let mut translator = OpenAiResponseTranslator::new("claude-sonnet-4-5");
        translator.translate_event(&event("done"));
        translator.set_usage(Usage::input_output(12, 5));

        let response = translator.to_response();
        assert_eq!(response.choices[0].message.content.as_deref(), Some("done"));
        assert_eq!(response.usage.prompt_tokens, Some(12));
        assert_eq!(response.usage.completion_tokens, Some(5));
        assert_eq!(response.usage.total_tokens, Some(17));
    }

    #[test]
    fn test_error_status_sets_finish_reason() {
        let mut translator = OpenAiResponseTranslator::new("m");
        let mut ev = event("");
        ev.message_status = EnumValue::Known(MessageStatus::Error);
        assert!(translator.translate_event(&ev).is_none());
        assert_eq!(
            translator.end_chunk().choices[0].finish_reason.as_deref(),
            Some("error")
        );
    }

    #[test]
    fn test_reset_keeps_model() {
        let mut translator = OpenAiResponseTranslator::new("m");
        let id = translator.response_id().to_string();
        translator.translate_event(&event("x"));
        translator.reset();
        assert_ne!(translator.response_id(), id);
        assert!(translator.to_response().choices[0].message.content.is_none());
        assert_eq!(translator.to_response().model, "m");
    }
}
