use std::collections::VecDeque;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{debug, info};

use nova_core::domain::message::MessagePart;

use crate::transcript::{Applied, Transcript};

/// Push stream of message parts from the agent runtime. Not restartable: once
/// a part has been returned it is gone.
#[async_trait]
pub trait PartSource: Send {
    /// Next part, or `None` when the stream has ended or was aborted.
    async fn next_part(&mut self) -> Result<Option<MessagePart>>;
}

/// Reads one JSON-encoded part per line. Blank lines are skipped.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line_number: 0 }
    }
}

#[async_trait]
impl<R> PartSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_part(&mut self) -> Result<Option<MessagePart>> {
        loop {
            let Some(line) = self.lines.next_line().await.context("failed to read part stream")? else {
                return Ok(None);
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(&line)
                .with_context(|| format!("line {} is not a JSON message part", self.line_number))?;
            return Ok(Some(MessagePart::from_value(&value)));
        }
    }
}

/// Parts already in memory, replayed in order.
#[derive(Debug, Default)]
pub struct ReplaySource {
    parts: VecDeque<MessagePart>,
}

impl ReplaySource {
    pub fn new(parts: impl IntoIterator<Item = MessagePart>) -> Self {
        Self { parts: parts.into_iter().collect() }
    }
}

#[async_trait]
impl PartSource for ReplaySource {
    async fn next_part(&mut self) -> Result<Option<MessagePart>> {
        Ok(self.parts.pop_front())
    }
}

/// Applies every part from `source` to `transcript`, calling `on_update`
/// after each one. Returns how many parts were applied.
pub async fn drive<S, F>(source: &mut S, transcript: &mut Transcript, mut on_update: F) -> Result<usize>
where
    S: PartSource + ?Sized,
    F: FnMut(&Transcript, Applied),
{
    let mut applied = 0;
    while let Some(part) = source.next_part().await? {
        let outcome = transcript.apply(part);
        applied += 1;
        debug!(
            event_name = "stream.part_applied",
            index = outcome.index(),
            replaced = matches!(outcome, Applied::Replaced(_)),
            "message part applied"
        );
        on_update(transcript, outcome);
    }

    info!(event_name = "stream.finished", applied, parts = transcript.len(), "part stream finished");
    Ok(applied)
}
