use nova_core::catalog::Catalog;
use nova_core::config::ExtractionConfig;
use nova_core::domain::message::MessagePart;

use crate::dispatch::{RenderIntent, ToolDispatcher};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Appended(usize),
    /// A newer snapshot of an already-seen tool call took the old one's slot.
    Replaced(usize),
}

impl Applied {
    pub fn index(&self) -> usize {
        match self {
            Self::Appended(index) | Self::Replaced(index) => *index,
        }
    }
}

/// Ordered parts of one assistant message as received so far.
///
/// Positions never shift: lookahead from a tool part to its sibling data part
/// depends on emission order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Transcript {
    parts: Vec<MessagePart>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(parts: impl IntoIterator<Item = MessagePart>) -> Self {
        let mut transcript = Self::new();
        for part in parts {
            transcript.apply(part);
        }
        transcript
    }

    pub fn apply(&mut self, part: MessagePart) -> Applied {
        if let Some(index) = self.position_of_call(&part) {
            self.parts[index] = part;
            return Applied::Replaced(index);
        }

        self.parts.push(part);
        Applied::Appended(self.parts.len() - 1)
    }

    pub fn parts(&self) -> &[MessagePart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn render(
        &self,
        dispatcher: &ToolDispatcher,
        catalog: &Catalog,
        extraction: &ExtractionConfig,
    ) -> Vec<RenderIntent> {
        dispatcher.render_message(&self.parts, catalog, extraction)
    }

    fn position_of_call(&self, part: &MessagePart) -> Option<usize> {
        let call_id = part.as_tool()?.tool_call_id.as_deref()?;
        self.parts.iter().position(|existing| {
            existing.as_tool().and_then(|tool| tool.tool_call_id.as_deref()) == Some(call_id)
        })
    }
}
