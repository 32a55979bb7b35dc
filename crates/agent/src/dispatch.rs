use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use nova_core::catalog::Catalog;
use nova_core::config::ExtractionConfig;
use nova_core::domain::message::{MessagePart, ToolInvocation, ToolState};
use nova_core::domain::product::ProductRecord;
use nova_core::domain::question::PendingQuestion;
use nova_core::domain::ticket::TicketRecord;
use nova_core::identity::ToolKind;

use crate::products::extract_products_tiered;
use crate::questions::{extract_pending_question, question_from_result};
use crate::tickets::{extract_ticket_from_text, extract_ticket_tiered};
use crate::tiers::Matched;

pub const NO_PRODUCTS_NOTICE: &str = "No products found matching the criteria.";
pub const UNKNOWN_ERROR: &str = "Unknown error";

static NULL_OUTPUT: Value = Value::Null;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "card", rename_all = "snake_case")]
pub enum Card {
    Product(ProductRecord),
    Ticket(TicketRecord),
    Question(PendingQuestion),
}

/// What the chat UI should draw for one message part.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum RenderIntent {
    Loading { tool: String, label: String },
    Cards { cards: Vec<Card> },
    ErrorBanner { tool: String, message: String },
    GenericFallback { tool: String },
    Notice { message: String },
    Text { text: String },
    None,
}

impl RenderIntent {
    pub fn cards(cards: Vec<Card>) -> Self {
        if cards.is_empty() {
            Self::None
        } else {
            Self::Cards { cards }
        }
    }

    /// Whether this intent draws a question card.
    pub fn shows_question(&self) -> bool {
        match self {
            Self::Cards { cards } => cards.iter().any(|card| matches!(card, Card::Question(_))),
            _ => false,
        }
    }
}

/// Everything a renderer may consult besides the part itself.
#[derive(Clone, Copy, Debug)]
pub struct RenderContext<'a> {
    pub parts: &'a [MessagePart],
    /// Position of the part being rendered within `parts`.
    pub index: usize,
    pub catalog: &'a Catalog,
    pub extraction: &'a ExtractionConfig,
}

pub trait ToolRenderer: Send + Sync {
    fn kind(&self) -> ToolKind;

    fn loading_label(&self) -> &'static str;

    /// Intent for a finished invocation. `output` is `null` when the runtime
    /// reported none.
    fn render_output(&self, output: &Value, context: &RenderContext<'_>) -> RenderIntent;
}

#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<ToolKind, Box<dyn ToolRenderer>>,
}

impl RendererRegistry {
    /// Registry with a renderer for every known tool.
    pub fn with_defaults() -> Self {
        let mut registry = Self::default();
        registry.register(CatalogQueryRenderer);
        registry.register(AskUserQuestionRenderer);
        registry.register(AssistanceTicketRenderer);
        registry.register(SalesSubagentRenderer);
        registry.register(PostSaleSubagentRenderer);
        registry
    }

    pub fn register<T>(&mut self, renderer: T)
    where
        T: ToolRenderer + 'static,
    {
        self.renderers.insert(renderer.kind(), Box::new(renderer));
    }

    pub fn get(&self, kind: ToolKind) -> Option<&dyn ToolRenderer> {
        self.renderers.get(&kind).map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

pub struct ToolDispatcher {
    registry: RendererRegistry,
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new(RendererRegistry::with_defaults())
    }
}

impl ToolDispatcher {
    pub fn new(registry: RendererRegistry) -> Self {
        Self { registry }
    }

    pub fn render(&self, part: &MessagePart, context: &RenderContext<'_>) -> RenderIntent {
        match part.as_tool() {
            Some(invocation) => self.render_tool(invocation, context),
            None => RenderIntent::None,
        }
    }

    fn render_tool(&self, invocation: &ToolInvocation, context: &RenderContext<'_>) -> RenderIntent {
        let tool = invocation.tool_name.clone();
        let Some(renderer) = invocation.kind().and_then(|kind| self.registry.get(kind)) else {
            debug!(event_name = "dispatch.unknown_tool", tool = %tool, "no renderer for tool");
            return RenderIntent::GenericFallback { tool };
        };

        match invocation.state {
            ToolState::InputStreaming | ToolState::InputAvailable => {
                RenderIntent::Loading { tool, label: renderer.loading_label().to_string() }
            }
            ToolState::OutputAvailable => {
                let output = invocation.output.as_ref().unwrap_or(&NULL_OUTPUT);
                renderer.render_output(output, context)
            }
            ToolState::OutputError => {
                let message = invocation
                    .error_text
                    .as_deref()
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or(UNKNOWN_ERROR)
                    .to_string();
                debug!(event_name = "dispatch.tool_error", tool = %tool, message = %message, "tool reported an error");
                RenderIntent::ErrorBanner { tool, message }
            }
        }
    }

    /// One intent per part of an assistant message, applying the message-wide
    /// rules for text: hidden while a question card is shown, turned into a
    /// ticket card when it names a ticket, hidden when a post-sale ticket card
    /// already covers it.
    pub fn render_message(
        &self,
        parts: &[MessagePart],
        catalog: &Catalog,
        extraction: &ExtractionConfig,
    ) -> Vec<RenderIntent> {
        let tool_intents = parts
            .iter()
            .enumerate()
            .map(|(index, part)| {
                part.as_tool().map(|_| self.render(part, &RenderContext { parts, index, catalog, extraction }))
            })
            .collect::<Vec<_>>();

        let shows_question = tool_intents.iter().flatten().any(RenderIntent::shows_question);
        let text_ticket = |text: &str| {
            if extraction.text_fallback {
                extract_ticket_from_text(text)
            } else {
                None
            }
        };
        let shows_ticket = parts.iter().any(|part| match part {
            MessagePart::Tool(invocation) if invocation.is(ToolKind::PostSaleSubagent) => invocation
                .ready_output()
                .is_some_and(|output| extract_ticket_tiered(output, extraction, Utc::now()).is_some()),
            MessagePart::Text { text } => text_ticket(text).is_some(),
            _ => false,
        });

        parts
            .iter()
            .zip(tool_intents)
            .map(|(part, tool_intent)| match (part, tool_intent) {
                (_, Some(intent)) => intent,
                (MessagePart::Text { .. }, None) if shows_question => RenderIntent::None,
                (MessagePart::Text { text }, None) => match text_ticket(text) {
                    Some(ticket) => RenderIntent::cards(vec![Card::Ticket(ticket)]),
                    None if shows_ticket => RenderIntent::None,
                    None => RenderIntent::Text { text: text.clone() },
                },
                (_, None) => RenderIntent::None,
            })
            .collect()
    }
}

/// [`ToolDispatcher::render_message`] with the default renderers and settings.
pub fn render_message(parts: &[MessagePart], catalog: &Catalog) -> Vec<RenderIntent> {
    ToolDispatcher::default().render_message(parts, catalog, &ExtractionConfig::default())
}

fn product_cards(output: &Value, context: &RenderContext<'_>) -> Vec<Card> {
    extract_products_tiered(output, context.catalog, context.extraction)
        .map(Matched::into_value)
        .unwrap_or_default()
        .into_iter()
        .map(Card::Product)
        .collect()
}

fn ticket_card(output: &Value, context: &RenderContext<'_>) -> RenderIntent {
    match extract_ticket_tiered(output, context.extraction, Utc::now()) {
        Some(matched) => RenderIntent::cards(vec![Card::Ticket(matched.value)]),
        None => RenderIntent::None,
    }
}

pub struct CatalogQueryRenderer;

impl ToolRenderer for CatalogQueryRenderer {
    fn kind(&self) -> ToolKind {
        ToolKind::CatalogQuery
    }

    fn loading_label(&self) -> &'static str {
        "Searching catalog…"
    }

    fn render_output(&self, output: &Value, context: &RenderContext<'_>) -> RenderIntent {
        let failed = output.get("success").and_then(Value::as_bool) == Some(false);
        let cards = if failed { Vec::new() } else { product_cards(output, context) };

        if cards.is_empty() {
            RenderIntent::Notice { message: NO_PRODUCTS_NOTICE.to_string() }
        } else {
            RenderIntent::cards(cards)
        }
    }
}

pub struct AskUserQuestionRenderer;

impl ToolRenderer for AskUserQuestionRenderer {
    fn kind(&self) -> ToolKind {
        ToolKind::AskUserQuestion
    }

    fn loading_label(&self) -> &'static str {
        "Preparing a question…"
    }

    fn render_output(&self, output: &Value, _context: &RenderContext<'_>) -> RenderIntent {
        match question_from_result(output) {
            Some(question) => RenderIntent::cards(vec![Card::Question(question)]),
            None => RenderIntent::None,
        }
    }
}

pub struct AssistanceTicketRenderer;

impl ToolRenderer for AssistanceTicketRenderer {
    fn kind(&self) -> ToolKind {
        ToolKind::CreateAssistanceTicket
    }

    fn loading_label(&self) -> &'static str {
        "Creating support ticket…"
    }

    fn render_output(&self, output: &Value, context: &RenderContext<'_>) -> RenderIntent {
        ticket_card(output, context)
    }
}

pub struct SalesSubagentRenderer;

impl ToolRenderer for SalesSubagentRenderer {
    fn kind(&self) -> ToolKind {
        ToolKind::SalesSubagent
    }

    fn loading_label(&self) -> &'static str {
        "Looking for products…"
    }

    /// Product cards first, then the clarification the sub-agent is waiting on.
    fn render_output(&self, output: &Value, context: &RenderContext<'_>) -> RenderIntent {
        let mut cards = product_cards(output, context);
        if let Some(question) = extract_pending_question(context.parts, context.index) {
            cards.push(Card::Question(question));
        }
        RenderIntent::cards(cards)
    }
}

pub struct PostSaleSubagentRenderer;

impl ToolRenderer for PostSaleSubagentRenderer {
    fn kind(&self) -> ToolKind {
        ToolKind::PostSaleSubagent
    }

    fn loading_label(&self) -> &'static str {
        "Checking your order…"
    }

    fn render_output(&self, output: &Value, context: &RenderContext<'_>) -> RenderIntent {
        ticket_card(output, context)
    }
}
