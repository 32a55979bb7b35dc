use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::ToolKind;

/// Lifecycle of a tool invocation as reported by the agent runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolState {
    InputStreaming,
    InputAvailable,
    OutputAvailable,
    OutputError,
}

impl ToolState {
    /// Unknown states decode as `InputStreaming`: the part keeps rendering as
    /// pending until a recognised state arrives.
    pub fn from_wire(state: Option<&str>) -> Self {
        match state {
            Some("input-available") => Self::InputAvailable,
            Some("output-available") => Self::OutputAvailable,
            Some("output-error") => Self::OutputError,
            _ => Self::InputStreaming,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolInvocation {
    pub tool_call_id: Option<String>,
    pub tool_name: String,
    pub state: ToolState,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub error_text: Option<String>,
}

impl ToolInvocation {
    pub fn kind(&self) -> Option<ToolKind> {
        ToolKind::resolve(&self.tool_name)
    }

    pub fn is(&self, kind: ToolKind) -> bool {
        kind.matches(&self.tool_name)
    }

    /// Output of a finished invocation; `None` in every other state.
    pub fn ready_output(&self) -> Option<&Value> {
        match self.state {
            ToolState::OutputAvailable => self.output.as_ref(),
            _ => None,
        }
    }
}

/// One streamed unit of an assistant message.
#[derive(Clone, Debug, PartialEq)]
pub enum MessagePart {
    Text { text: String },
    Tool(ToolInvocation),
    /// Sibling `data-*` part; the runtime buffers sub-agent output here.
    Data { data_type: String, data: Value },
    /// Reasoning, step markers, sources and anything else this core ignores.
    Other { kind: String },
}

impl MessagePart {
    /// Decodes one AI SDK UI message part. Never fails: shapes that are not
    /// text, tool or data parts decode as [`MessagePart::Other`].
    pub fn from_value(value: &Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or_default();

        match kind {
            "text" => Self::Text {
                text: value.get("text").and_then(Value::as_str).unwrap_or_default().to_string(),
            },
            "dynamic-tool" | "tool-invocation" => {
                match value.get("toolName").and_then(Value::as_str) {
                    Some(tool_name) => Self::Tool(decode_tool(tool_name, value)),
                    None => Self::Other { kind: kind.to_string() },
                }
            }
            _ => {
                if let Some(tool_name) = kind.strip_prefix("tool-").filter(|name| !name.is_empty()) {
                    Self::Tool(decode_tool(tool_name, value))
                } else if kind.starts_with("data-") {
                    Self::Data {
                        data_type: kind.to_string(),
                        data: value.get("data").cloned().unwrap_or(Value::Null),
                    }
                } else {
                    Self::Other { kind: kind.to_string() }
                }
            }
        }
    }

    /// Decodes either a UI message (`{"parts": [...]}`) or a bare part array.
    pub fn list_from_value(value: &Value) -> Vec<Self> {
        let parts = match value {
            Value::Array(parts) => parts.as_slice(),
            Value::Object(object) => match object.get("parts") {
                Some(Value::Array(parts)) => parts.as_slice(),
                _ => &[],
            },
            _ => &[],
        };
        parts.iter().map(Self::from_value).collect()
    }

    pub fn as_tool(&self) -> Option<&ToolInvocation> {
        match self {
            Self::Tool(invocation) => Some(invocation),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    pub fn is_tool(&self, kind: ToolKind) -> bool {
        self.as_tool().is_some_and(|invocation| invocation.is(kind))
    }
}

fn decode_tool(tool_name: &str, value: &Value) -> ToolInvocation {
    ToolInvocation {
        tool_call_id: value.get("toolCallId").and_then(Value::as_str).map(str::to_string),
        tool_name: tool_name.to_string(),
        state: ToolState::from_wire(value.get("state").and_then(Value::as_str)),
        input: value.get("input").filter(|input| !input.is_null()).cloned(),
        output: value.get("output").filter(|output| !output.is_null()).cloned(),
        error_text: value.get("errorText").and_then(Value::as_str).map(str::to_string),
    }
}
