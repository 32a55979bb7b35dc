//! Output extraction and tool dispatch for the Nova chat.
//!
//! The agent runtime streams heterogeneous JSON: loosely typed tool outputs,
//! sub-agent envelopes with buffered `steps`, sibling `data-tool-agent` parts
//! and plain prose. This crate recovers the structure the chat UI renders.
//!
//! # Layers
//!
//! 1. **Shapes** (`shapes`) - predicates and the one-time `Envelope` normalization
//! 2. **Text fallback** (`text_fallback`) - closed regex tables for ticket ids,
//!    categories and known question phrasings
//! 3. **Extractors** (`products`, `tickets`, `questions`) - ordered `Tier`s,
//!    first success wins
//! 4. **Dispatch** (`dispatch`) - one `RenderIntent` per message part
//!
//! `transcript` and `stream` hold a message while its parts arrive.
//!
//! Extraction is synchronous and pure. Malformed payloads never fail loudly:
//! they miss a tier and fall through to the next one, or to `None`.

pub mod dispatch;
pub mod products;
pub mod questions;
pub mod shapes;
pub mod stream;
pub mod text_fallback;
pub mod tickets;
pub mod tiers;
pub mod transcript;

pub use dispatch::{render_message, Card, RenderContext, RenderIntent, RendererRegistry, ToolDispatcher, ToolRenderer};
pub use products::{extract_products, extract_text};
pub use questions::{extract_pending_question, extract_question_from_output, pending_question_in_message};
pub use stream::{drive, JsonLinesSource, PartSource, ReplaySource};
pub use tickets::{extract_ticket, extract_ticket_from_text};
pub use tiers::{Matched, Tier};
pub use transcript::{Applied, Transcript};
