//! CodeWhisperer `assistantResponseEvent` 的解码、校验与编码
//!
//! 每个流式 chunk 独立处理，chunk 之间没有状态。
//!
//! # 解码
//!
//! 宽松解析：每个字段单独提取，缺失或类型不对的字段保持默认值，
//! 不会影响其他字段。`contentType` 缺失时为 `text/markdown`，
//! `messageStatus` 缺失时为 `COMPLETED`。列表字段逐个元素解析，
//! 形状不对的元素被丢弃，其余元素保持原顺序。
//!
//! # 校验
//!
//! 分两步，互不影响：
//!
//! 1. 载荷检查：没有有效载荷的事件必须带 `conversationId` 和 `messageId`；
//!    只带内容增量的 chunk 不要求标识符。
//! 2. 枚举检查：所有已填充的枚举字段必须落在各自的取值集合内。
//!
//! # 编码
//!
//! 解码的逆过程。值为空的可选字段直接省略，
//! 但 `conversationId`、`messageId`、`content` 始终输出。

use crate::error::{EventValidationError, ValidationFailure};
use crate::models::codewhisperer::{
    AssistantResponseEvent, ClosedSet, CodeQuery, ContentSpan, ContentType, Customization,
    EnumValue, FollowupPrompt, MessageStatus, MostRelevantMissedAlternative, ProgrammingLanguage,
    Reference, SupplementaryWebLink, UserIntent,
};
use serde::Serialize;
use serde_json::{Map, Value};

// ============================================================================
// 解码
// ============================================================================

fn opt_string(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// 非空字符串才视为已填充
fn opt_non_empty(obj: &Map<String, Value>, key: &str) -> Option<String> {
    opt_string(obj, key).filter(|s| !s.is_empty())
}

fn opt_enum<T: ClosedSet>(obj: &Map<String, Value>, key: &str) -> Option<EnumValue<T>> {
    opt_non_empty(obj, key).map(|s| EnumValue::parse(&s))
}

/// 逐个元素解析列表，丢弃形状不对的元素
fn decode_list<T>(
    obj: &Map<String, Value>,
    key: &str,
    decode: fn(&Map<String, Value>) -> Option<T>,
) -> Vec<T> {
    let items = match obj.get(key) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Vec::new(),
        Some(_) => {
            tracing::debug!("[KIRO_EVENT] `{}` is not a list, ignored", key);
            return Vec::new();
        }
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let decoded = item.as_object().and_then(decode);
            if decoded.is_none() {
                tracing::debug!("[KIRO_EVENT] dropped malformed `{}` element #{}", key, index);
            }
            decoded
        })
        .collect()
}

fn decode_web_link(obj: &Map<String, Value>) -> Option<SupplementaryWebLink> {
    Some(SupplementaryWebLink {
        url: opt_string(obj, "url")?,
        title: opt_string(obj, "title"),
        snippet: opt_string(obj, "snippet"),
        score: obj.get("score").and_then(Value::as_f64),
    })
}

fn decode_span(obj: &Map<String, Value>) -> Option<ContentSpan> {
    Some(ContentSpan {
        start: obj.get("start")?.as_i64()?,
        end: obj.get("end")?.as_i64()?,
    })
}

fn decode_missed_alternative(obj: &Map<String, Value>) -> Option<MostRelevantMissedAlternative> {
    Some(MostRelevantMissedAlternative {
        url: opt_string(obj, "url")?,
        license_name: opt_string(obj, "licenseName"),
        repository: opt_string(obj, "repository"),
    })
}

/// 列表元素以 `url` 作为可识别的必填字段
fn decode_reference(obj: &Map<String, Value>) -> Option<Reference> {
    Some(Reference {
        url: Some(opt_string(obj, "url")?),
        license_name: opt_string(obj, "licenseName"),
        repository: opt_string(obj, "repository"),
        information: opt_string(obj, "information"),
        recommendation_content_span: obj
            .get("recommendationContentSpan")
            .and_then(Value::as_object)
            .and_then(decode_span),
        most_relevant_missed_alternative: obj
            .get("mostRelevantMissedAlternative")
            .and_then(Value::as_object)
            .and_then(decode_missed_alternative),
    })
}

fn decode_customization(obj: &Map<String, Value>) -> Option<Customization> {
    Some(Customization {
        arn: opt_string(obj, "arn")?,
        name: opt_string(obj, "name"),
    })
}

fn decode_programming_language(obj: &Map<String, Value>) -> Option<ProgrammingLanguage> {
    Some(ProgrammingLanguage {
        language_name: opt_string(obj, "languageName")?,
    })
}

fn decode_followup_prompt(obj: &Map<String, Value>) -> FollowupPrompt {
    FollowupPrompt {
        content: opt_string(obj, "content").unwrap_or_default(),
        user_intent: opt_enum(obj, "userIntent"),
    }
}

fn decode_code_query(obj: &Map<String, Value>) -> Option<CodeQuery> {
    Some(CodeQuery {
        code_query_id: opt_string(obj, "codeQueryId")?,
        user_input_message_id: opt_string(obj, "userInputMessageId"),
        programming_language: obj
            .get("programmingLanguage")
            .and_then(Value::as_object)
            .and_then(decode_programming_language),
    })
}

/// 解码单个事件；从不失败
pub fn decode_event(raw: &Value) -> AssistantResponseEvent {
    let obj = match raw.as_object() {
        Some(obj) => obj,
        None => {
            tracing::debug!("[KIRO_EVENT] event payload is not an object, using defaults");
            return AssistantResponseEvent::default();
        }
    };

    AssistantResponseEvent {
        conversation_id: opt_non_empty(obj, "conversationId"),
        message_id: opt_non_empty(obj, "messageId"),
        content: opt_string(obj, "content").unwrap_or_default(),
        content_type: opt_enum(obj, "contentType")
            .unwrap_or(EnumValue::Known(ContentType::Markdown)),
        message_status: opt_enum(obj, "messageStatus")
            .unwrap_or(EnumValue::Known(MessageStatus::Completed)),
        supplementary_web_links: decode_list(obj, "supplementaryWebLinks", decode_web_link),
        references: decode_list(obj, "references", decode_reference),
        code_reference: decode_list(obj, "codeReference", decode_reference),
        followup_prompt: obj
            .get("followupPrompt")
            .and_then(Value::as_object)
            .map(decode_followup_prompt),
        programming_language: obj
            .get("programmingLanguage")
            .and_then(Value::as_object)
            .and_then(decode_programming_language),
        customizations: decode_list(obj, "customizations", decode_customization),
        user_intent: opt_enum(obj, "userIntent"),
        code_query: obj
            .get("codeQuery")
            .and_then(Value::as_object)
            .and_then(decode_code_query),
    }
}

/// 解码流中的一帧：可以是裸事件，也可以包在 `assistantResponseEvent` 中
pub fn decode_stream_event(raw: &Value) -> AssistantResponseEvent {
    match raw.get("assistantResponseEvent") {
        Some(inner @ Value::Object(_)) => decode_event(inner),
        _ => decode_event(raw),
    }
}

/// 从 JSON 文本解码；只有 JSON 本身损坏时才失败
pub fn decode_event_str(json: &str) -> Result<AssistantResponseEvent, serde_json::Error> {
    let raw: Value = serde_json::from_str(json)?;
    Ok(decode_stream_event(&raw))
}

// ============================================================================
// 校验
// ============================================================================

/// 事件是否带有有效载荷
pub fn has_meaningful_payload(event: &AssistantResponseEvent) -> bool {
    !event.content.is_empty()
        || event.code_query.is_some()
        || !event.supplementary_web_links.is_empty()
        || !event.references.is_empty()
        || !event.code_reference.is_empty()
        || event.followup_prompt.is_some()
}

/// 无载荷时检查标识符
pub fn check_identifiers(event: &AssistantResponseEvent) -> Vec<EventValidationError> {
    if has_meaningful_payload(event) {
        return Vec::new();
    }

    let missing = |id: &Option<String>| id.as_deref().map_or(true, str::is_empty);
    let mut errors = Vec::new();
    if missing(&event.conversation_id) {
        errors.push(EventValidationError::MissingIdentifier("conversationId"));
    }
    if missing(&event.message_id) {
        errors.push(EventValidationError::MissingIdentifier("messageId"));
    }
    errors
}

fn check_enum<T: ClosedSet>(
    value: Option<&EnumValue<T>>,
    field: &'static str,
    errors: &mut Vec<EventValidationError>,
) {
    if let Some(EnumValue::Unrecognized(raw)) = value {
        errors.push(EventValidationError::InvalidEnum {
            field,
            value: raw.clone(),
            expected: T::expected(),
        });
    }
}

/// 检查所有已填充的枚举字段
pub fn check_enum_values(event: &AssistantResponseEvent) -> Vec<EventValidationError> {
    let mut errors = Vec::new();
    check_enum(Some(&event.message_status), MessageStatus::FIELD, &mut errors);
    check_enum(Some(&event.content_type), ContentType::FIELD, &mut errors);
    check_enum(event.user_intent.as_ref(), UserIntent::FIELD, &mut errors);
    check_enum(
        event
            .followup_prompt
            .as_ref()
            .and_then(|p| p.user_intent.as_ref()),
        "followupPrompt.userIntent",
        &mut errors,
    );
    errors
}

/// 校验事件，返回发现的全部失败
pub fn validate_event(event: &AssistantResponseEvent) -> Result<(), ValidationFailure> {
    let mut errors = check_identifiers(event);
    errors.extend(check_enum_values(event));

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure { errors })
    }
}

// ============================================================================
// 编码
// ============================================================================

fn insert_serialized<T: Serialize>(obj: &mut Map<String, Value>, key: &str, value: &T) {
    match serde_json::to_value(value) {
        Ok(v) => {
            obj.insert(key.to_string(), v);
        }
        Err(e) => tracing::warn!("[KIRO_EVENT] failed to encode `{}`: {}", key, e),
    }
}

fn encode_followup_prompt(prompt: &FollowupPrompt) -> Value {
    let mut obj = Map::new();
    obj.insert("content".to_string(), Value::String(prompt.content.clone()));
    if let Some(intent) = &prompt.user_intent {
        obj.insert(
            "userIntent".to_string(),
            Value::String(intent.as_str().to_string()),
        );
    }
    Value::Object(obj)
}

/// 编码单个事件
pub fn encode_event(event: &AssistantResponseEvent) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "conversationId".to_string(),
        Value::String(event.conversation_id.clone().unwrap_or_default()),
    );
    obj.insert(
        "messageId".to_string(),
        Value::String(event.message_id.clone().unwrap_or_default()),
    );
    obj.insert("content".to_string(), Value::String(event.content.clone()));
    obj.insert(
        "contentType".to_string(),
        Value::String(event.content_type.as_str().to_string()),
    );
    obj.insert(
        "messageStatus".to_string(),
        Value::String(event.message_status.as_str().to_string()),
    );

    if !event.supplementary_web_links.is_empty() {
        insert_serialized(&mut obj, "supplementaryWebLinks", &event.supplementary_web_links);
    }
    if !event.references.is_empty() {
        insert_serialized(&mut obj, "references", &event.references);
    }
    if !event.code_reference.is_empty() {
        insert_serialized(&mut obj, "codeReference", &event.code_reference);
    }
    if let Some(prompt) = &event.followup_prompt {
        obj.insert("followupPrompt".to_string(), encode_followup_prompt(prompt));
    }
    if let Some(language) = &event.programming_language {
        insert_serialized(&mut obj, "programmingLanguage", language);
    }
    if !event.customizations.is_empty() {
        insert_serialized(&mut obj, "customizations", &event.customizations);
    }
    if let Some(intent) = &event.user_intent {
        obj.insert(
            "userIntent".to_string(),
            Value::String(intent.as_str().to_string()),
        );
    }
    if let Some(query) = &event.code_query {
        insert_serialized(&mut obj, "codeQuery", query);
    }

    Value::Object(obj)
}

impl AssistantResponseEvent {
    pub fn from_value(raw: &Value) -> Self {
        decode_stream_event(raw)
    }

    pub fn validate(&self) -> Result<(), ValidationFailure> {
        validate_event(self)
    }

    pub fn to_value(&self) -> Value {
        encode_event(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_only_chunk_defaults_and_passes() {
        let event = decode_event(&json!({"content": "hi"}));
        assert_eq!(event.content, "hi");
        assert_eq!(event.content_type, EnumValue::Known(ContentType::Markdown));
        assert_eq!(event.message_status, EnumValue::Known(MessageStatus::Completed));
        assert!(event.conversation_id.is_none());
        assert!(validate_event(&event).is_ok());
    }

    #[test]
    fn test_bogus_status_fails_despite_payload() {
        let event = decode_event(&json!({"content": "hi", "messageStatus": "BOGUS"}));
        assert_eq!(
            event.message_status,
            EnumValue::Unrecognized("BOGUS".to_string())
        );
        let failure = validate_event(&event).unwrap_err();
        assert!(failure.has_invalid_enum());
        assert!(!failure.has_missing_identifier());
        assert!(failure.to_string().contains("BOGUS"));
    }

    #[test]
    fn test_empty_event_requires_identifiers() {
        let event = decode_event(&json!({}));
        let failure = validate_event(&event).unwrap_err();
        assert_eq!(
            failure.errors,
            vec![
                EventValidationError::MissingIdentifier("conversationId"),
                EventValidationError::MissingIdentifier("messageId"),
            ]
        );
    }

    #[test]
    fn test_identifiers_satisfy_payloadless_event() {
        let event = decode_event(&json!({"conversationId": "c1", "messageId": "m1"}));
        assert!(validate_event(&event).is_ok());

        let event = decode_event(&json!({"conversationId": "", "messageId": "m1"}));
        assert_eq!(
            check_identifiers(&event),
            vec![EventValidationError::MissingIdentifier("conversationId")]
        );
    }

    #[test]
    fn test_malformed_reference_dropped_in_order() {
        let event = decode_event(&json!({
            "references": [{"url": "a"}, {"licenseName": "MIT"}, "junk", {"url": "b", "repository": "r"}]
        }));
        let urls: Vec<_> = event
            .references
            .iter()
            .map(|r| r.url.as_deref().unwrap())
            .collect();
        assert_eq!(urls, vec!["a", "b"]);
        assert_eq!(event.references[1].repository.as_deref(), Some("r"));
    }

    #[test]
    fn test_wrong_typed_fields_left_default() {
        let event = decode_event(&json!({
            "conversationId": 12,
            "content": "partial",
            "contentType": ["text/plain"],
            "supplementaryWebLinks": "nope",
            "followupPrompt": "not an object",
            "codeQuery": {"userInputMessageId": "u"}
        }));
        assert!(event.conversation_id.is_none());
        assert_eq!(event.content, "partial");
        assert_eq!(event.content_type, EnumValue::Known(ContentType::Markdown));
        assert!(event.supplementary_web_links.is_empty());
        assert!(event.followup_prompt.is_none());
        assert!(event.code_query.is_none());
    }

    #[test]
    fn test_enrichment_counts_as_payload() {
        let event = decode_event(&json!({
            "supplementaryWebLinks": [{"url": "https://docs.rs", "title": "docs", "score": 0.9}]
        }));
        assert!(has_meaningful_payload(&event));
        assert!(validate_event(&event).is_ok());

        let event = decode_event(&json!({"followupPrompt": {"content": "more?"}}));
        assert!(validate_event(&event).is_ok());

        let event = decode_event(&json!({"codeQuery": {"codeQueryId": "q1"}}));
        assert!(validate_event(&event).is_ok());
    }

    #[test]
    fn test_customizations_are_not_payload() {
        let event = decode_event(&json!({"customizations": [{"arn": "arn:aws:x"}]}));
        assert!(!has_meaningful_payload(&event));
        assert!(validate_event(&event).is_err());
    }

    #[test]
    fn test_nested_followup_intent_checked() {
        let event = decode_event(&json!({
            "content": "x",
            "followupPrompt": {"content": "y", "userIntent": "DANCE"}
        }));
        let errors = check_enum_values(&event);
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            EventValidationError::InvalidEnum { field, value, .. } => {
                assert_eq!(*field, "followupPrompt.userIntent");
                assert_eq!(value, "DANCE");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_both_failure_causes_reported() {
        let event = decode_event(&json!({"userIntent": "NOPE"}));
        let failure = validate_event(&event).unwrap_err();
        assert!(failure.has_missing_identifier());
        assert!(failure.has_invalid_enum());
        assert_eq!(failure.errors.len(), 3);
    }

    #[test]
    fn test_encode_omits_empty_fields_but_keeps_identifiers() {
        let event = decode_event(&json!({"content": ""}));
        assert_eq!(
            encode_event(&event),
            json!({
                "conversationId": "",
                "messageId": "",
                "content": "",
                "contentType": "text/markdown",
                "messageStatus": "COMPLETED"
            })
        );
    }

    #[test]
    fn test_content_only_chunk_round_trip() {
        let event = decode_event(&json!({"content": "hi"}));
        assert_eq!(event.conversation_id, None);
        assert_eq!(event.message_id, None);
        assert_eq!(decode_event(&encode_event(&event)), event);

        let event = decode_event(&json!({"conversationId": "", "messageId": "m1"}));
        assert_eq!(event.conversation_id, None);
        assert_eq!(decode_event(&encode_event(&event)), event);
    }

    #[test]
    fn test_full_event_round_trip() {
        let raw = json!({
            "conversationId": "c1",
            "messageId": "m1",
            "content": "Use `Vec::with_capacity`.",
            "contentType": "text/plain",
            "messageStatus": "IN_PROGRESS",
            "supplementaryWebLinks": [{"url": "https://doc.rust-lang.org", "title": "std", "snippet": "Vec", "score": 0.5}],
            "references": [{
                "licenseName": "MIT",
                "repository": "rust-lang/rust",
                "url": "https://github.com/rust-lang/rust",
                "information": "vec.rs",
                "recommendationContentSpan": {"start": 0, "end": 10},
                "mostRelevantMissedAlternative": {"url": "https://x", "licenseName": "Apache-2.0"}
            }],
            "codeReference": [{"url": "https://y"}],
            "followupPrompt": {"content": "Show me more", "userIntent": "SHOW_EXAMPLES"},
            "programmingLanguage": {"languageName": "rust"},
            "customizations": [{"arn": "arn:aws:codewhisperer:1", "name": "team"}],
            "userIntent": "IMPROVE_CODE",
            "codeQuery": {"codeQueryId": "q", "userInputMessageId": "u", "programmingLanguage": {"languageName": "rust"}}
        });
        let event = decode_event(&raw);
        assert!(validate_event(&event).is_ok());
        assert_eq!(encode_event(&event), raw);
        assert_eq!(decode_event(&encode_event(&event)), event);
    }

    #[test]
    fn test_stream_envelope_unwrapped() {
        let event = decode_event_str(r#"{"assistantResponseEvent":{"content":"hey"}}"#).unwrap();
        assert_eq!(event.content, "hey");
        assert!(decode_event_str("{not json").is_err());
    }

    #[test]
    fn test_non_object_payload_yields_default() {
        let event = decode_event(&json!([1, 2, 3]));
        assert_eq!(event, AssistantResponseEvent::default());
    }
}
