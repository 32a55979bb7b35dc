use std::io::Cursor;

use nova_agent::dispatch::{RenderIntent, ToolDispatcher};
use nova_agent::stream::{drive, JsonLinesSource, PartSource, ReplaySource};
use nova_agent::transcript::{Applied, Transcript};
use nova_core::catalog::Catalog;
use nova_core::config::AppConfig;
use nova_core::domain::message::MessagePart;
use nova_core::errors::ApplicationError;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::commands::{load_catalog, read_input, source_name, CommandResult};

#[derive(Debug, Serialize)]
struct RenderReport {
    parts: usize,
    intents: Vec<RenderIntent>,
}

#[derive(Debug, Serialize)]
struct StreamUpdate {
    index: usize,
    replaced: bool,
    intents: Vec<RenderIntent>,
}

pub fn run(config: &AppConfig, input: &str, stream: bool) -> CommandResult {
    match render(config, input, stream) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => CommandResult::from_error("render", error),
    }
}

fn render(config: &AppConfig, input: &str, stream: bool) -> Result<String, ApplicationError> {
    let catalog = load_catalog(config)?;
    let raw = read_input(input)?;
    let mut source = open_source(raw, input)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ApplicationError::Runtime(format!("failed to initialize async runtime: {error}")))?;

    let dispatcher = ToolDispatcher::default();
    let mut transcript = Transcript::new();
    let mut updates = Vec::new();

    runtime
        .block_on(drive(source.as_mut(), &mut transcript, |transcript, applied| {
            if stream {
                updates.push(stream_line(transcript, applied, &dispatcher, config, &catalog));
            }
        }))
        .map_err(|error: anyhow::Error| ApplicationError::InputDecode {
            source_name: source_name(input),
            message: format!("{error:#}"),
        })?;

    info!(
        event_name = "cli.render.completed",
        parts = transcript.len(),
        stream,
        agent = %config.conversation.agent,
        "transcript rendered"
    );

    if stream {
        return Ok(updates.join("\n"));
    }

    let report = RenderReport {
        parts: transcript.len(),
        intents: transcript.render(&dispatcher, &catalog, &config.extraction),
    };
    serde_json::to_string_pretty(&report).map_err(|error| ApplicationError::Runtime(error.to_string()))
}

fn stream_line(
    transcript: &Transcript,
    applied: Applied,
    dispatcher: &ToolDispatcher,
    config: &AppConfig,
    catalog: &Catalog,
) -> String {
    let update = StreamUpdate {
        index: applied.index(),
        replaced: matches!(applied, Applied::Replaced(_)),
        intents: transcript.render(dispatcher, catalog, &config.extraction),
    };
    serde_json::to_string(&update).unwrap_or_else(|error| error_line(&error.to_string()))
}

fn error_line(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// A whole message, a part array or a single part decode as one JSON value;
/// anything else is read as JSON lines.
fn open_source(raw: String, input: &str) -> Result<Box<dyn PartSource>, ApplicationError> {
    match serde_json::from_str::<Value>(&raw) {
        Ok(value @ Value::Array(_)) => Ok(Box::new(ReplaySource::new(MessagePart::list_from_value(&value)))),
        Ok(value @ Value::Object(_)) if value.get("parts").is_some() => {
            Ok(Box::new(ReplaySource::new(MessagePart::list_from_value(&value))))
        }
        Ok(value @ Value::Object(_)) => Ok(Box::new(ReplaySource::new([MessagePart::from_value(&value)]))),
        Ok(_) => Err(ApplicationError::InputDecode {
            source_name: source_name(input),
            message: "expected a message object, an array of parts or JSON lines".to_string(),
        }),
        Err(_) => Ok(Box::new(JsonLinesSource::new(Cursor::new(raw.into_bytes())))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::error_line;

    #[test]
    fn error_line_escapes_the_message() {
        let line = error_line("key \"price\" at line 1\\2");
        let value: Value = serde_json::from_str(&line).expect("error line is valid JSON");
        assert_eq!(value["error"], "key \"price\" at line 1\\2");
    }
}
