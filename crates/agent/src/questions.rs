//! Pending clarification questions raised by a sales sub-agent.
//!
//! Sub-agent output is often streamed into a sibling `data-tool-agent` part
//! while the tool part's own output stays empty, so extraction works over the
//! whole ordered part list plus a cursor rather than over one output.

use serde_json::Value;

use nova_core::domain::message::MessagePart;
use nova_core::domain::question::PendingQuestion;
use nova_core::identity::ToolKind;

use crate::shapes::{steps_in, Envelope, Shape, Step};
use crate::text_fallback::match_known_question;
use crate::tiers::{Matched, Tier, Tiers};

/// Data part type the runtime uses for buffered sub-agent output.
pub const SUBAGENT_DATA_PART: &str = "data-tool-agent";

pub fn extract_pending_question(parts: &[MessagePart], index: usize) -> Option<PendingQuestion> {
    extract_pending_question_tiered(parts, index).map(Matched::into_value)
}

pub fn extract_pending_question_tiered(parts: &[MessagePart], index: usize) -> Option<Matched<PendingQuestion>> {
    Tiers::new("question")
        .then(Tier::Steps, || from_own_output(parts, index))
        .then(Tier::SiblingData, || from_sibling(parts, index))
        .then(Tier::KnownPattern, || from_known_patterns(parts))
        .run()
}

/// Question from a sub-agent output's `steps` alone.
pub fn extract_question_from_output(output: &Value) -> Option<PendingQuestion> {
    let envelope = Envelope::normalize(output);
    match envelope.last_step(ToolKind::AskUserQuestion)?.shape() {
        Shape::Question(result) => question_from_result(result),
        _ => None,
    }
}

/// The question a whole message is waiting on: the first sales sub-agent
/// invocation whose structured output yields one, else a known phrasing in
/// the message text.
pub fn pending_question_in_message(parts: &[MessagePart]) -> Option<PendingQuestion> {
    parts
        .iter()
        .enumerate()
        .filter(|(_, part)| part.is_tool(ToolKind::SalesSubagent))
        .find_map(|(index, _)| from_own_output(parts, index).or_else(|| from_sibling(parts, index)))
        .or_else(|| from_known_patterns(parts))
}

/// A raw ask-question result, accepted only while it awaits a reply.
pub fn question_from_result(result: &Value) -> Option<PendingQuestion> {
    let Shape::Question(result) = Shape::of(result) else {
        return None;
    };
    if !is_awaiting(result) {
        return None;
    }

    let question = result.get("question").and_then(Value::as_str)?;
    let suggestions = match result.get("suggestions") {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect::<Vec<_>>(),
        _ => Vec::new(),
    };
    PendingQuestion::new(question, suggestions, true).ok()
}

fn is_awaiting(result: &Value) -> bool {
    ["waitingForUserResponse", "awaitingResponse"]
        .into_iter()
        .filter_map(|key| result.get(key))
        .any(|flag| flag.as_bool() == Some(true))
}

fn from_own_output(parts: &[MessagePart], index: usize) -> Option<PendingQuestion> {
    let invocation = parts.get(index)?.as_tool()?;
    if !invocation.is(ToolKind::SalesSubagent) {
        return None;
    }
    extract_question_from_output(invocation.ready_output()?)
}

fn from_sibling(parts: &[MessagePart], index: usize) -> Option<PendingQuestion> {
    if !parts.get(index)?.is_tool(ToolKind::SalesSubagent) {
        return None;
    }

    match parts.get(index + 1)? {
        MessagePart::Data { data_type, data } if data_type == SUBAGENT_DATA_PART && !data.is_null() => {
            from_sub_agent_data(data)
        }
        _ => None,
    }
}

fn from_sub_agent_data(data: &Value) -> Option<PendingQuestion> {
    buffered_step_results(data)
        .or_else(|| flat_tool_results(data))
        .or_else(|| ui_parts(data))
        .or_else(|| extract_question_from_output(data))
}

fn buffered_step_results(data: &Value) -> Option<PendingQuestion> {
    let Some(Value::Array(steps)) = data.get("steps") else {
        return None;
    };
    steps.iter().rev().find_map(|step| {
        let results = steps_in(step, "toolResults")?;
        first_ask_result(&results).and_then(question_from_result)
    })
}

fn flat_tool_results(data: &Value) -> Option<PendingQuestion> {
    let results = steps_in(data, "toolResults")?;
    first_ask_result(&results).and_then(question_from_result)
}

fn ui_parts(data: &Value) -> Option<PendingQuestion> {
    let Some(Value::Array(parts)) = data.get("parts") else {
        return None;
    };
    let output = parts
        .iter()
        .map(MessagePart::from_value)
        .filter_map(|part| match part {
            MessagePart::Tool(invocation) if invocation.is(ToolKind::AskUserQuestion) => invocation.output,
            _ => None,
        })
        .find(is_awaiting)?;
    question_from_result(&output)
}

fn first_ask_result<'a>(results: &[Step<'a>]) -> Option<&'a Value> {
    results.iter().find(|result| result.is(ToolKind::AskUserQuestion))?.result
}

fn from_known_patterns(parts: &[MessagePart]) -> Option<PendingQuestion> {
    if !parts.iter().any(|part| part.is_tool(ToolKind::SalesSubagent)) {
        return None;
    }
    parts
        .iter()
        .filter_map(MessagePart::as_text)
        .filter(|text| !text.trim().is_empty())
        .find_map(match_known_question)
}
