use chrono::Utc;
use clap::ValueEnum;
use nova_agent::products::extract_products_tiered;
use nova_agent::questions::extract_pending_question_tiered;
use nova_agent::tickets::extract_ticket_tiered;
use nova_agent::tiers::{Matched, Tier};
use nova_core::config::AppConfig;
use nova_core::domain::message::MessagePart;
use nova_core::errors::ApplicationError;
use nova_core::identity::ToolKind;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::commands::{load_catalog, read_json, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExtractTarget {
    Products,
    Ticket,
    Question,
}

impl ExtractTarget {
    fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Ticket => "ticket",
            Self::Question => "question",
        }
    }
}

#[derive(Debug, Serialize)]
struct ExtractReport {
    target: &'static str,
    matched: bool,
    tier: Option<Tier>,
    text_fallback: bool,
    result: Value,
}

impl ExtractReport {
    fn new<T: Serialize>(target: ExtractTarget, matched: Option<Matched<T>>) -> Result<Self, ApplicationError> {
        let Some(Matched { tier, value }) = matched else {
            return Ok(Self {
                target: target.as_str(),
                matched: false,
                tier: None,
                text_fallback: false,
                result: Value::Null,
            });
        };

        let result = serde_json::to_value(value).map_err(|error| ApplicationError::Runtime(error.to_string()))?;
        Ok(Self {
            target: target.as_str(),
            matched: true,
            tier: Some(tier),
            text_fallback: tier.is_text_fallback(),
            result,
        })
    }
}

pub fn run(config: &AppConfig, target: ExtractTarget, input: &str, index: Option<usize>) -> CommandResult {
    match extract(config, target, input, index) {
        Ok(report) => {
            info!(
                event_name = "cli.extract.completed",
                extract_target = report.target,
                matched = report.matched,
                tier = report.tier.map(|tier| tier.as_str()),
                "extraction finished"
            );
            CommandResult::json("extract", &report)
        }
        Err(error) => CommandResult::from_error("extract", error),
    }
}

fn extract(
    config: &AppConfig,
    target: ExtractTarget,
    input: &str,
    index: Option<usize>,
) -> Result<ExtractReport, ApplicationError> {
    match target {
        ExtractTarget::Products => {
            let catalog = load_catalog(config)?;
            let output = read_json(input)?;
            ExtractReport::new(target, extract_products_tiered(&output, &catalog, &config.extraction))
        }
        ExtractTarget::Ticket => {
            let output = read_json(input)?;
            ExtractReport::new(target, extract_ticket_tiered(&output, &config.extraction, Utc::now()))
        }
        ExtractTarget::Question => {
            let message = read_json(input)?;
            let parts = MessagePart::list_from_value(&message);
            let index = index.unwrap_or_else(|| default_question_index(&parts));
            ExtractReport::new(target, extract_pending_question_tiered(&parts, index))
        }
    }
}

/// First sales sub-agent part, else the first part.
fn default_question_index(parts: &[MessagePart]) -> usize {
    parts.iter().position(|part| part.is_tool(ToolKind::SalesSubagent)).unwrap_or(0)
}
