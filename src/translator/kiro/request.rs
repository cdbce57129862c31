//! 规范请求转换为 CodeWhisperer 请求
//!
//! OpenAI 与 Anthropic 前端先解码为 `ChatRequest`，再经由这里构建
//! CodeWhisperer 的 `conversationState`：
//!
//! - system prompt 合并到第一条用户消息
//! - 连续的 tool_result 合并并按 `tool_use_id` 去重
//! - 历史记录修正为 user/assistant 严格交替，且以 assistant 结尾
//! - 工具数量与描述长度按配置限制

use crate::config::TranslatorConfig;
use crate::models::canonical::{ChatRequest, ContentBlock, Message, Role, ToolChoice, ToolDefinition};
use crate::models::codewhisperer::*;
use crate::translator::traits::TranslateError;
use std::collections::HashSet;
use uuid::Uuid;

const TOOL_RESULTS_PLACEHOLDER: &str = "Tool results provided.";
const CONTINUE_PLACEHOLDER: &str = "Continue";
const ASSISTANT_PLACEHOLDER: &str = "I understand.";

// ============================================================================
// 内部类型
// ============================================================================

#[derive(Debug, Clone)]
struct ProcessedMessage {
    role: Role,
    content: String,
    images: Vec<CWImage>,
    tool_uses: Vec<CWToolUse>,
    tool_results: Vec<CWToolResult>,
}

impl ProcessedMessage {
    fn user(content: String, tool_results: Vec<CWToolResult>) -> Self {
        Self {
            role: Role::User,
            content,
            images: Vec::new(),
            tool_uses: Vec::new(),
            tool_results,
        }
    }

    fn is_tool_results_only(&self) -> bool {
        self.role == Role::User
            && self.content.is_empty()
            && self.images.is_empty()
            && !self.tool_results.is_empty()
    }
}

fn some_if_not_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn dedup_tool_results(results: &mut Vec<CWToolResult>) {
    let mut seen_ids = HashSet::new();
    results.retain(|tr| seen_ids.insert(tr.tool_use_id.clone()));
}

// ============================================================================
// 转换函数
// ============================================================================

/// 将 `ChatRequest` 转换为 CodeWhisperer 请求
///
/// 未知模型返回 `ModelNotFound` 错误。
pub fn build_codewhisperer_request(
    request: &ChatRequest,
    config: &TranslatorConfig,
    profile_arn: Option<String>,
    request_id: &str,
) -> Result<CodeWhispererRequest, TranslateError> {
    let cw_model = config.resolve_model(&request.model, request_id)?.to_string();
    let conversation_id = Uuid::new_v4().to_string();

    let system_prompt = build_system_prompt(request);
    let mut messages = preprocess_messages(&request.messages);

    if !system_prompt.is_empty() {
        match messages.iter_mut().find(|m| m.role == Role::User) {
            Some(first_user) if first_user.content.is_empty() => {
                first_user.content = system_prompt;
            }
            Some(first_user) => {
                first_user.content = format!("{system_prompt}\n\n{}", first_user.content);
            }
            None => messages.insert(0, ProcessedMessage::user(system_prompt, Vec::new())),
        }
    }

    // 最后一条 user 消息作为当前消息；以 assistant 结尾时当前消息为 "Continue"
    let current = match messages.last() {
        Some(last) if last.role == Role::User => messages.pop(),
        _ => None,
    };

    let history: Vec<HistoryItem> = messages
        .into_iter()
        .map(|msg| history_item(msg, &cw_model, config))
        .collect();
    let history = fix_history_alternation(history, &cw_model, config);

    let (current_content, current_images, current_tool_results) = match current {
        Some(msg) => {
            let content = user_content_or_placeholder(&msg);
            (content, msg.images, msg.tool_results)
        }
        None => (CONTINUE_PLACEHOLDER.to_string(), Vec::new(), Vec::new()),
    };

    let tools = convert_tools(&request.tools, config);
    let user_input_message_context = if tools.is_some() || !current_tool_results.is_empty() {
        Some(UserInputMessageContext {
            tools,
            tool_results: some_if_not_empty(current_tool_results),
        })
    } else {
        None
    };

    tracing::debug!(
        "[KIRO_TRANSLATE] model={} -> {}, history={}, request_id={}",
        request.model,
        cw_model,
        history.len(),
        request_id
    );

    Ok(CodeWhispererRequest {
        conversation_state: ConversationState {
            chat_trigger_type: config.chat_trigger_type.clone(),
            conversation_id,
            current_message: CurrentMessage {
                user_input_message: UserInputMessage {
                    content: current_content,
                    model_id: cw_model,
                    origin: config.origin.clone(),
                    images: some_if_not_empty(current_images),
                    user_input_message_context,
                },
            },
            history: some_if_not_empty(history),
        },
        profile_arn,
    })
}

/// system 字段与 system 角色消息合并，并处理强制工具调用
///
/// CodeWhisperer 不支持 tool_choice，通过 prompt 注入实现。
fn build_system_prompt(request: &ChatRequest) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(system) = request.system.as_ref().filter(|s| !s.is_empty()) {
        parts.push(system.clone());
    }
    parts.extend(
        request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(Message::joined_text)
            .filter(|s| !s.is_empty()),
    );
    let mut system_prompt = parts.join("\n");

    if !request.tools.is_empty() {
        match &request.tool_choice {
            Some(ToolChoice::Any) => {
                append_instruction(
                    &mut system_prompt,
                    "[CRITICAL INSTRUCTION] You MUST use one of the provided tools to respond. Do NOT respond with plain text. Call a tool function immediately.",
                );
                tracing::info!("[KIRO_TRANSLATE] tool_choice=any detected, injected tool instruction");
            }
            Some(ToolChoice::Specific(name)) => {
                append_instruction(
                    &mut system_prompt,
                    &format!(
                        "[CRITICAL INSTRUCTION] You MUST call the tool `{name}` to respond. Do NOT respond with plain text."
                    ),
                );
                tracing::info!(
                    "[KIRO_TRANSLATE] tool_choice=tool({}) detected, injected tool instruction",
                    name
                );
            }
            _ => {}
        }
    }

    system_prompt
}

fn append_instruction(system_prompt: &mut String, instruction: &str) {
    if !system_prompt.is_empty() {
        system_prompt.push_str("\n\n");
    }
    system_prompt.push_str(instruction);
}

fn convert_message(msg: &Message) -> ProcessedMessage {
    let mut text_parts: Vec<&str> = Vec::new();
    let mut images = Vec::new();
    let mut tool_uses = Vec::new();
    let mut tool_results = Vec::new();

    for block in &msg.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::Image { source } => images.push(CWImage {
                format: source.media_type.format().to_string(),
                source: CWImageSource {
                    bytes: source.data.clone(),
                },
            }),
            ContentBlock::ToolUse { id, name, input } => tool_uses.push(CWToolUse {
                input: input.clone(),
                name: name.clone(),
                tool_use_id: id.clone(),
            }),
            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => tool_results.push(CWToolResult {
                content: vec![CWTextContent {
                    text: content.to_text(),
                }],
                status: if *is_error { "error" } else { "success" }.to_string(),
                tool_use_id: tool_use_id.clone(),
            }),
        }
    }

    ProcessedMessage {
        role: msg.role,
        content: text_parts.join(""),
        images,
        tool_uses,
        tool_results,
    }
}

/// 预处理消息：合并只含 tool_result 的连续 user 消息
fn preprocess_messages(messages: &[Message]) -> Vec<ProcessedMessage> {
    let mut merged: Vec<ProcessedMessage> = Vec::new();
    let mut pending_tool_results: Vec<CWToolResult> = Vec::new();

    for msg in messages.iter().filter(|m| m.role != Role::System) {
        let mut processed = convert_message(msg);

        if processed.is_tool_results_only() {
            pending_tool_results.append(&mut processed.tool_results);
            continue;
        }

        if processed.role == Role::User {
            pending_tool_results.append(&mut processed.tool_results);
            dedup_tool_results(&mut pending_tool_results);
            processed.tool_results = std::mem::take(&mut pending_tool_results);
            merged.push(processed);
        } else {
            // 如果有待处理的 tool_results，先创建 user 消息
            if !pending_tool_results.is_empty() {
                dedup_tool_results(&mut pending_tool_results);
                merged.push(ProcessedMessage::user(
                    String::new(),
                    std::mem::take(&mut pending_tool_results),
                ));
            }
            merged.push(processed);
        }
    }

    // 处理末尾的 tool_results
    if !pending_tool_results.is_empty() {
        dedup_tool_results(&mut pending_tool_results);
        merged.push(ProcessedMessage::user(String::new(), pending_tool_results));
    }

    merged
}

fn user_content_or_placeholder(msg: &ProcessedMessage) -> String {
    if !msg.content.is_empty() {
        msg.content.clone()
    } else if !msg.tool_results.is_empty() {
        TOOL_RESULTS_PLACEHOLDER.to_string()
    } else {
        CONTINUE_PLACEHOLDER.to_string()
    }
}

fn placeholder_user(model_id: &str, config: &TranslatorConfig) -> HistoryItem {
    HistoryItem::User(UserHistoryItem {
        user_input_message: UserInputMessage {
            content: CONTINUE_PLACEHOLDER.to_string(),
            model_id: model_id.to_string(),
            origin: config.origin.clone(),
            images: None,
            user_input_message_context: None,
        },
    })
}

fn placeholder_assistant() -> HistoryItem {
    HistoryItem::Assistant(AssistantHistoryItem {
        assistant_response_message: AssistantResponseMessage {
            content: ASSISTANT_PLACEHOLDER.to_string(),
            tool_uses: None,
        },
    })
}

fn history_item(msg: ProcessedMessage, model_id: &str, config: &TranslatorConfig) -> HistoryItem {
    match msg.role {
        Role::Assistant => HistoryItem::Assistant(AssistantHistoryItem {
            assistant_response_message: AssistantResponseMessage {
                content: if msg.content.is_empty() {
                    ASSISTANT_PLACEHOLDER.to_string()
                } else {
                    msg.content
                },
                tool_uses: some_if_not_empty(msg.tool_uses),
            },
        }),
        _ => {
            let content = user_content_or_placeholder(&msg);
            let user_input_message_context = if msg.tool_results.is_empty() {
                None
            } else {
                Some(UserInputMessageContext {
                    tools: None,
                    tool_results: Some(msg.tool_results),
                })
            };
            HistoryItem::User(UserHistoryItem {
                user_input_message: UserInputMessage {
                    content,
                    model_id: model_id.to_string(),
                    origin: config.origin.clone(),
                    images: some_if_not_empty(msg.images),
                    user_input_message_context,
                },
            })
        }
    }
}

/// 修复历史记录，确保 user/assistant 严格交替
fn fix_history_alternation(
    history: Vec<HistoryItem>,
    model_id: &str,
    config: &TranslatorConfig,
) -> Vec<HistoryItem> {
    if history.is_empty() {
        return history;
    }

    let mut fixed: Vec<HistoryItem> = Vec::new();

    for item in history {
        match item {
            HistoryItem::User(user_item) => {
                if let Some(HistoryItem::User(last_user)) = fixed.last_mut() {
                    let new_results = user_item
                        .user_input_message
                        .user_input_message_context
                        .as_ref()
                        .and_then(|ctx| ctx.tool_results.clone());

                    // 只含 tool_results 的 user 消息合并到上一条 user 消息
                    if let Some(new_results) = new_results.filter(|_| {
                        user_item.user_input_message.content == TOOL_RESULTS_PLACEHOLDER
                    }) {
                        let ctx = last_user
                            .user_input_message
                            .user_input_message_context
                            .get_or_insert_with(|| UserInputMessageContext {
                                tools: None,
                                tool_results: None,
                            });
                        let existing = ctx.tool_results.get_or_insert_with(Vec::new);
                        existing.extend(new_results);
                        dedup_tool_results(existing);
                        continue;
                    }
                    fixed.push(placeholder_assistant());
                }
                fixed.push(HistoryItem::User(user_item));
            }
            HistoryItem::Assistant(assistant_item) => {
                // 历史不能以 assistant 开头，也不能出现连续的 assistant
                if matches!(fixed.last(), None | Some(HistoryItem::Assistant(_))) {
                    fixed.push(placeholder_user(model_id, config));
                }
                fixed.push(HistoryItem::Assistant(assistant_item));
            }
        }
    }

    // 确保以 assistant 结尾
    if let Some(HistoryItem::User(_)) = fixed.last() {
        fixed.push(placeholder_assistant());
    }

    fixed
}

fn truncate_description(description: String, max_chars: usize) -> String {
    if description.chars().count() <= max_chars {
        return description;
    }
    // 按字符截断，避免切断 UTF-8 多字节字符
    let truncated: String = description
        .chars()
        .take(max_chars.saturating_sub(3))
        .collect();
    format!("{truncated}...")
}

fn is_web_search_tool(tool: &ToolDefinition) -> bool {
    tool.name == "web_search" || tool.name == "web_search_20250305"
}

/// 转换工具定义为 CodeWhisperer tools
fn convert_tools(tools: &[ToolDefinition], config: &TranslatorConfig) -> Option<Vec<CWToolItem>> {
    if tools.is_empty() {
        return None;
    }

    let mut cw_tools: Vec<CWToolItem> = Vec::new();
    let mut function_count = 0;

    for tool in tools {
        if is_web_search_tool(tool) {
            tracing::info!("[CW_TOOLS] 添加 web_search 工具 (from {})", tool.name);
            cw_tools.push(CWToolItem::WebSearch(CWWebSearchTool {
                tool_type: "web_search".to_string(),
            }));
            continue;
        }

        if function_count >= config.max_tools {
            tracing::warn!(
                "[CW_TOOLS] tool limit {} reached, dropping `{}`",
                config.max_tools,
                tool.name
            );
            continue;
        }
        function_count += 1;

        let description = if tool.description.is_empty() {
            format!("Tool: {}", tool.name)
        } else {
            tool.description.clone()
        };

        cw_tools.push(CWToolItem::Standard(CWTool {
            tool_specification: ToolSpecification {
                name: tool.name.clone(),
                description: truncate_description(description, config.max_tool_description_chars),
                input_schema: InputSchema {
                    json: tool.parameters.clone(),
                },
            },
        }));
    }

    Some(cw_tools)
}
