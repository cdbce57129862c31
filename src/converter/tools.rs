//! 工具定义与 tool_choice 的方言适配
//!
//! 三种方言的工具定义只在字段嵌套上不同：
//!
//! ```text
//! OpenAI:        {"type":"function","function":{"name","description","parameters"}}
//! Anthropic:     {"name","description","input_schema"}
//! CodeWhisperer: {"toolSpecification":{"name","description","inputSchema":{"json"}}}
//! ```
//!
//! 参数 schema 原样透传，不做结构校验。

use crate::error::ToolError;
use crate::models::canonical::{ToolChoice, ToolDefinition};
use crate::models::Dialect;
use serde_json::{json, Map, Value};

/// 缺省的参数 schema
pub fn empty_parameters() -> Value {
    json!({"type": "object", "properties": {}})
}

/// 将方言工具定义解码为规范定义
pub fn to_canonical_tool(raw: &Value, dialect: Dialect) -> Result<ToolDefinition, ToolError> {
    let obj = raw.as_object().ok_or(ToolError::NotAnObject { dialect })?;

    let (spec, schema_key) = match dialect {
        Dialect::OpenAi => {
            // 兼容不带 function 包装的扁平写法
            let spec = match obj.get("function") {
                Some(Value::Object(function)) => function,
                _ => obj,
            };
            (spec, "parameters")
        }
        Dialect::Anthropic => (obj, "input_schema"),
        Dialect::CodeWhisperer => {
            let spec = obj
                .get("toolSpecification")
                .and_then(Value::as_object)
                .ok_or(ToolError::MissingField {
                    dialect,
                    field: "toolSpecification",
                })?;
            (spec, "inputSchema")
        }
    };

    let name = match spec.get("name").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            return Err(ToolError::MissingField {
                dialect,
                field: "name",
            })
        }
    };
    let description = spec
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let parameters = match (dialect, spec.get(schema_key)) {
        (Dialect::CodeWhisperer, Some(schema)) => schema.get("json").cloned(),
        (_, Some(schema)) => Some(schema.clone()),
        (_, None) => None,
    }
    .filter(|v| !v.is_null())
    .unwrap_or_else(empty_parameters);

    Ok(ToolDefinition {
        name,
        description,
        parameters,
    })
}

/// 将规范工具定义编码为方言结构
pub fn from_canonical_tool(tool: &ToolDefinition, dialect: Dialect) -> Value {
    match dialect {
        Dialect::OpenAi => json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }),
        Dialect::Anthropic => json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": tool.parameters,
        }),
        Dialect::CodeWhisperer => json!({
            "toolSpecification": {
                "name": tool.name,
                "description": tool.description,
                "inputSchema": {"json": tool.parameters},
            }
        }),
    }
}

fn choice_from_keyword(keyword: &str) -> Option<ToolChoice> {
    match keyword {
        "auto" => Some(ToolChoice::Auto),
        "any" | "required" => Some(ToolChoice::Any),
        "none" => Some(ToolChoice::None),
        _ => None,
    }
}

fn specific_name(obj: &Map<String, Value>) -> Option<&str> {
    obj.get("name")
        .and_then(Value::as_str)
        .or_else(|| {
            obj.get("function")
                .and_then(|f| f.get("name"))
                .and_then(Value::as_str)
        })
}

/// 解码 tool_choice
///
/// 接受任一方言的写法：裸字符串 `auto|any|required|none`，
/// 或对象 `{"type":"auto|any|none"}`、`{"type":"tool|function","name"}`、
/// `{"type":"function","function":{"name"}}`。
pub fn to_canonical_tool_choice(raw: &Value) -> Result<ToolChoice, ToolError> {
    match raw {
        Value::String(s) => {
            choice_from_keyword(s).ok_or_else(|| ToolError::UnknownToolChoice(s.clone()))
        }
        Value::Object(obj) => {
            let choice_type = obj
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::UnknownToolChoice(raw.to_string()))?;
            match choice_type {
                "tool" | "function" => specific_name(obj)
                    .map(|name| ToolChoice::Specific(name.to_string()))
                    .ok_or_else(|| ToolError::MissingToolName(choice_type.to_string())),
                other => choice_from_keyword(other)
                    .ok_or_else(|| ToolError::UnknownToolChoice(other.to_string())),
            }
        }
        other => Err(ToolError::UnknownToolChoice(other.to_string())),
    }
}

/// 将 tool_choice 编码为方言写法
pub fn from_canonical_tool_choice(choice: &ToolChoice, dialect: Dialect) -> Value {
    match (dialect, choice) {
        (_, ToolChoice::Auto) => json!("auto"),
        (_, ToolChoice::None) => json!("none"),
        (Dialect::OpenAi, ToolChoice::Any) => json!("required"),
        (_, ToolChoice::Any) => json!("any"),
        (Dialect::OpenAi, ToolChoice::Specific(name)) => {
            json!({"type": "function", "function": {"name": name}})
        }
        (_, ToolChoice::Specific(name)) => json!({"type": "tool", "name": name}),
    }
}
