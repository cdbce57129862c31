//! 消息内容的解码与编码
//!
//! 内容可以是纯字符串，也可以是按 `type` 区分的内容块数组。
//! 解码是严格的：未知类型、缺少必填字段都会让整个调用失败，
//! 错误中带有出错块的位置和类型。
//!
//! ```text
//! "hi"                                  → [Text("hi")]
//! [{"type":"text","text":"hi"}, ...]    → [Text("hi"), ...]
//! ```

use crate::error::ContentError;
use crate::models::canonical::{
    ContentBlock, ImageMediaType, ImageSource, Message, Role, ToolResultContent,
};
use crate::models::Dialect;
use serde_json::{json, Map, Value};

/// JSON 值的类别名，用于错误信息
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 解码消息内容
pub fn decode_content(raw: &Value) -> Result<Vec<ContentBlock>, ContentError> {
    match raw {
        Value::String(s) => Ok(vec![ContentBlock::text(s.clone())]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| decode_block(index, item))
            .collect(),
        other => Err(ContentError::InvalidShape(json_kind(other))),
    }
}

/// 从 JSON 文本解码消息内容
pub fn decode_content_str(json: &str) -> Result<Vec<ContentBlock>, ContentError> {
    let raw: Value = serde_json::from_str(json)?;
    decode_content(&raw)
}

/// 解码一条 `{"role", "content"}` 消息
pub fn decode_message(raw: &Value) -> Result<Message, ContentError> {
    let role = raw
        .get("role")
        .and_then(Value::as_str)
        .ok_or(ContentError::MissingMessageField("role"))?;
    let role = Role::parse(role).ok_or_else(|| ContentError::UnknownRole(role.to_string()))?;
    let content = raw
        .get("content")
        .ok_or(ContentError::MissingMessageField("content"))?;

    Ok(Message {
        role,
        content: decode_content(content)?,
    })
}

/// 必填的非空字符串字段
fn required_str(
    obj: &Map<String, Value>,
    index: usize,
    block_type: &'static str,
    field: &'static str,
) -> Result<String, ContentError> {
    match obj.get(field).and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ContentError::MissingField {
            index,
            block_type,
            field,
        }),
    }
}

fn decode_block(index: usize, raw: &Value) -> Result<ContentBlock, ContentError> {
    let obj = raw.as_object().ok_or(ContentError::NotAnObject { index })?;

    let block_type = match obj.get("type") {
        None | Some(Value::Null) => return Err(ContentError::MissingType { index }),
        Some(Value::String(t)) => t.as_str(),
        Some(other) => {
            return Err(ContentError::UnknownType {
                index,
                block_type: other.to_string(),
            })
        }
    };

    match block_type {
        "text" => {
            // 空文本是合法的，只要求字段存在
            let text = obj
                .get("text")
                .and_then(Value::as_str)
                .ok_or(ContentError::MissingField {
                    index,
                    block_type: "text",
                    field: "text",
                })?;
            Ok(ContentBlock::text(text))
        }
        "image" => decode_image(index, obj),
        "tool_use" => Ok(ContentBlock::ToolUse {
            id: required_str(obj, index, "tool_use", "id")?,
            name: required_str(obj, index, "tool_use", "name")?,
            input: obj.get("input").cloned().unwrap_or_else(|| json!({})),
        }),
        "tool_result" => {
            let tool_use_id = required_str(obj, index, "tool_result", "tool_use_id")?;
            let content = match obj.get("content") {
                None | Some(Value::Null) => ToolResultContent::Text(String::new()),
                Some(Value::String(s)) => ToolResultContent::Text(s.clone()),
                Some(Value::Array(items)) => ToolResultContent::List(items.clone()),
                Some(Value::Object(map)) => ToolResultContent::Map(map.clone()),
                Some(_) => return Err(ContentError::InvalidToolResult { index }),
            };
            let is_error = obj
                .get("is_error")
                .and_then(Value::as_bool)
                .unwrap_or(false);

            Ok(ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            })
        }
        other => Err(ContentError::UnknownType {
            index,
            block_type: other.to_string(),
        }),
    }
}

fn decode_image(index: usize, obj: &Map<String, Value>) -> Result<ContentBlock, ContentError> {
    let source = obj
        .get("source")
        .and_then(Value::as_object)
        .ok_or(ContentError::MissingField {
            index,
            block_type: "image",
            field: "source",
        })?;

    match source.get("type").and_then(Value::as_str) {
        Some("base64") => {}
        Some(other) => {
            return Err(ContentError::UnsupportedImageSource {
                index,
                source_type: other.to_string(),
            })
        }
        None => {
            return Err(ContentError::MissingField {
                index,
                block_type: "image",
                field: "source.type",
            })
        }
    }

    let media_type = required_str(source, index, "image", "media_type")?;
    let media_type = ImageMediaType::from_mime(&media_type)
        .ok_or(ContentError::UnsupportedMediaType { index, media_type })?;
    let data = required_str(source, index, "image", "data")?;

    Ok(ContentBlock::Image {
        source: ImageSource { media_type, data },
    })
}

/// 编码单个内容块
pub fn encode_block(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({"type": "text", "text": text}),
        ContentBlock::Image { source } => json!({
            "type": "image",
            "source": {
                "type": "base64",
                "media_type": source.media_type.as_mime(),
                "data": source.data,
            }
        }),
        ContentBlock::ToolUse { id, name, input } => json!({
            "type": "tool_use",
            "id": id,
            "name": name,
            "input": input,
        }),
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => {
            let mut obj = json!({
                "type": "tool_result",
                "tool_use_id": tool_use_id,
                "content": content.to_value(),
            });
            if *is_error {
                obj["is_error"] = Value::Bool(true);
            }
            obj
        }
    }
}

/// 编码消息内容
///
/// 目标方言接受裸字符串时，单个 text 块压缩为字符串；否则始终输出块数组。
pub fn encode_content(blocks: &[ContentBlock], dialect: Dialect) -> Value {
    if dialect.accepts_bare_string_content() {
        if let [ContentBlock::Text { text }] = blocks {
            return Value::String(text.clone());
        }
    }
    Value::Array(blocks.iter().map(encode_block).collect())
}

/// 编码 `{"role", "content"}` 消息
pub fn encode_message(message: &Message, dialect: Dialect) -> Value {
    json!({
        "role": message.role.as_str(),
        "content": encode_content(&message.content, dialect),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_string() {
        let blocks = decode_content(&json!("hi")).unwrap();
        assert_eq!(blocks, vec![ContentBlock::text("hi")]);
    }

    #[test]
    fn test_encode_single_text_compacts_when_allowed() {
        let blocks = vec![ContentBlock::text("hi")];
        assert_eq!(encode_content(&blocks, Dialect::Anthropic), json!("hi"));
        assert_eq!(encode_content(&blocks, Dialect::OpenAi), json!("hi"));
        assert_eq!(
            encode_content(&blocks, Dialect::CodeWhisperer),
            json!([{"type": "text", "text": "hi"}])
        );
    }

    #[test]
    fn test_decode_all_block_types() {
        let raw = json!([
            {"type": "text", "text": "look"},
            {"type": "image", "source": {"type": "base64", "media_type": "image/png", "data": "iVBORw0"}},
            {"type": "tool_use", "id": "toolu_1", "name": "read_file", "input": {"path": "a.rs"}},
            {"type": "tool_result", "tool_use_id": "toolu_1", "content": "fn main() {}", "is_error": false}
        ]);
        let blocks = decode_content(&raw).unwrap();
        assert_eq!(blocks.len(), 4);
        assert_eq!(
            blocks[1],
            ContentBlock::Image {
                source: ImageSource {
                    media_type: ImageMediaType::Png,
                    data: "iVBORw0".to_string()
                }
            }
        );
        match &blocks[2] {
            ContentBlock::ToolUse { id, name, input } => {
                assert_eq!(id, "toolu_1");
                assert_eq!(name, "read_file");
                assert_eq!(input["path"], "a.rs");
            }
            other => panic!("unexpected block {other:?}"),
        }
    }

    #[test]
    fn test_unknown_type_is_fatal_with_position() {
        let raw = json!([{"type": "text", "text": "ok"}, {"type": "video", "url": "x"}]);
        match decode_content(&raw) {
            Err(ContentError::UnknownType { index, block_type }) => {
                assert_eq!(index, 1);
                assert_eq!(block_type, "video");
            }
            other => panic!("expected UnknownType, got {other:?}"),
        }
    }

    #[test]
    fn test_tool_use_missing_id_is_error() {
        let raw = json!([{"type": "tool_use", "name": "bash", "input": {}}]);
        assert!(matches!(
            decode_content(&raw),
            Err(ContentError::MissingField {
                index: 0,
                block_type: "tool_use",
                field: "id"
            })
        ));

        let raw = json!([{"type": "tool_use", "id": "t1", "input": {}}]);
        assert!(matches!(
            decode_content(&raw),
            Err(ContentError::MissingField { field: "name", .. })
        ));
    }

    #[test]
    fn test_unsupported_media_type() {
        let raw = json!([{"type": "image", "source": {"type": "base64", "media_type": "image/bmp", "data": "Qk0"}}]);
        assert!(matches!(
            decode_content(&raw),
            Err(ContentError::UnsupportedMediaType { index: 0, .. })
        ));
    }

    #[test]
    fn test_url_image_rejected() {
        let raw = json!([{"type": "image", "source": {"type": "url", "url": "https://x/y.png"}}]);
        assert!(matches!(
            decode_content(&raw),
            Err(ContentError::UnsupportedImageSource { .. })
        ));
    }

    #[test]
    fn test_tool_result_payload_shapes() {
        let raw = json!([
            {"type": "tool_result", "tool_use_id": "a", "content": [{"type": "text", "text": "x"}]},
            {"type": "tool_result", "tool_use_id": "b", "content": {"rows": 3}, "is_error": true},
            {"type": "tool_result", "tool_use_id": "c"}
        ]);
        let blocks = decode_content(&raw).unwrap();
        assert!(matches!(
            &blocks[0],
            ContentBlock::ToolResult { content: ToolResultContent::List(items), is_error: false, .. } if items.len() == 1
        ));
        assert!(matches!(
            &blocks[1],
            ContentBlock::ToolResult { content: ToolResultContent::Map(_), is_error: true, .. }
        ));
        assert!(matches!(
            &blocks[2],
            ContentBlock::ToolResult { content: ToolResultContent::Text(s), .. } if s.is_empty()
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            decode_content_str("[{\"type\":"),
            Err(ContentError::Json(_))
        ));
    }

    #[test]
    fn test_invalid_shape() {
        assert!(matches!(
            decode_content(&json!(42)),
            Err(ContentError::InvalidShape("number"))
        ));
    }

    #[test]
    fn test_decode_message_role() {
        let msg = decode_message(&json!({"role": "assistant", "content": "ok"})).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(matches!(
            decode_message(&json!({"role": "robot", "content": "ok"})),
            Err(ContentError::UnknownRole(_))
        ));
    }

    #[test]
    fn test_is_error_only_emitted_when_set() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "t".to_string(),
            content: ToolResultContent::Text("done".to_string()),
            is_error: false,
        };
        assert!(encode_block(&block).get("is_error").is_none());
    }
}
