//! Shape predicates and the envelope normalization every extractor starts from.
//!
//! Tool outputs arrive as arbitrary JSON. They are classified exactly once,
//! here, into [`Shape`] variants; extractors then match on the variants and
//! never probe raw properties themselves.

use serde_json::{Map, Value};

use nova_core::identity::ToolKind;

pub fn is_product_list_shape(value: &Value) -> bool {
    value.get("products").is_some_and(Value::is_array)
}

pub fn is_valid_product_record(value: &Value) -> bool {
    value.get("id").is_some_and(Value::is_string) && value.get("name").is_some_and(Value::is_string)
}

pub fn is_ticket_record(value: &Value) -> bool {
    value.get("ticketId").is_some_and(Value::is_string)
}

pub fn is_pending_question_shape(value: &Value) -> bool {
    value.get("question").is_some_and(Value::is_string)
        && value.get("suggestions").is_some_and(Value::is_array)
}

/// What a single JSON value looks like to the extractors.
///
/// Classification precedence is products, then ticket, then question.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape<'a> {
    Products(&'a [Value]),
    Ticket(&'a Value),
    Question(&'a Value),
    Opaque,
}

impl<'a> Shape<'a> {
    pub fn of(value: &'a Value) -> Self {
        if let Some(Value::Array(products)) = value.get("products") {
            Self::Products(products)
        } else if is_ticket_record(value) {
            Self::Ticket(value)
        } else if is_pending_question_shape(value) {
            Self::Question(value)
        } else {
            Self::Opaque
        }
    }
}

/// One entry of a sub-agent's buffered `steps` (or `toolResults`) array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Step<'a> {
    pub tool_name: &'a str,
    pub result: Option<&'a Value>,
}

impl<'a> Step<'a> {
    pub fn from_value(value: &'a Value) -> Self {
        let tool_name = value
            .get("toolName")
            .filter(|name| !name.is_null())
            .or_else(|| value.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        let result = value.get("result").filter(|result| is_present(result));
        Self { tool_name, result }
    }

    pub fn is(&self, kind: ToolKind) -> bool {
        kind.matches(self.tool_name)
    }

    pub fn shape(&self) -> Shape<'a> {
        self.result.map(Shape::of).unwrap_or(Shape::Opaque)
    }
}

/// Decodes an optional array of step-like entries; `None` when the field is
/// missing or not an array.
pub fn steps_in<'a>(value: &'a Value, key: &str) -> Option<Vec<Step<'a>>> {
    match value.get(key) {
        Some(Value::Array(items)) => Some(items.iter().map(Step::from_value).collect()),
        _ => None,
    }
}

/// A tool output normalized for extraction.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope<'a> {
    raw: &'a Value,
    pub shape: Shape<'a>,
    pub steps: Option<Vec<Step<'a>>>,
    pub nested_output: Option<&'a Value>,
    pub text: String,
}

impl<'a> Envelope<'a> {
    pub fn normalize(raw: &'a Value) -> Self {
        Self {
            raw,
            shape: Shape::of(raw),
            steps: steps_in(raw, "steps"),
            nested_output: raw.get("output").filter(|output| is_present(output)),
            text: plain_text(raw),
        }
    }

    /// The output when the runtime delivered bare prose instead of an object.
    pub fn as_str(&self) -> Option<&'a str> {
        self.raw.as_str()
    }

    pub fn steps(&self) -> &[Step<'a>] {
        self.steps.as_deref().unwrap_or_default()
    }

    /// The most recent step that ran `kind`, if any.
    pub fn last_step(&self, kind: ToolKind) -> Option<&Step<'a>> {
        self.steps().iter().rev().find(|step| step.is(kind))
    }
}

/// Plain text carried by a tool output.
///
/// A string is its own text. For objects the first present of `text`,
/// `result` and `content` is used when it is a string; otherwise a `content`
/// array contributes its `{type: "text"}` parts joined by single spaces.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(object) => object_text(object),
        _ => String::new(),
    }
}

fn object_text(object: &Map<String, Value>) -> String {
    let first_present = ["text", "result", "content"]
        .into_iter()
        .filter_map(|key| object.get(key))
        .find(|candidate| !candidate.is_null());

    if let Some(Value::String(text)) = first_present {
        return text.clone();
    }

    match object.get("content") {
        Some(Value::Array(parts)) => parts
            .iter()
            .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

fn is_present(value: &Value) -> bool {
    !value.is_null()
}
