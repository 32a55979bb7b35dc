use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use nova_core::config::ExtractionConfig;
use nova_core::domain::ticket::{
    TicketCategory, TicketId, TicketPriority, TicketRecord, TicketStatus, SYNTHESIZED_DESCRIPTION,
};
use nova_core::identity::ToolKind;

use crate::shapes::{is_ticket_record, Envelope, Shape};
use crate::text_fallback::{infer_category, recognize_ticket_id};
use crate::tiers::{Matched, Tier, Tiers};

pub fn extract_ticket(output: &Value) -> Option<TicketRecord> {
    extract_ticket_tiered(output, &ExtractionConfig::default(), Utc::now()).map(Matched::into_value)
}

/// Ticket recovered from a ticket tool or post-sale sub-agent output.
///
/// `now` stamps tickets synthesized from prose and records whose own
/// `createdAt` cannot be parsed.
pub fn extract_ticket_tiered(
    output: &Value,
    config: &ExtractionConfig,
    now: DateTime<Utc>,
) -> Option<Matched<TicketRecord>> {
    let envelope = Envelope::normalize(output);

    Tiers::new("ticket")
        .then_if(config.text_fallback, Tier::RawText, || {
            envelope.as_str().and_then(|text| ticket_from_text(text, now))
        })
        .then(Tier::Direct, || match envelope.shape {
            Shape::Ticket(record) => ticket_from_record(record, now),
            _ => None,
        })
        .then(Tier::NestedOutput, || {
            envelope
                .nested_output
                .filter(|nested| is_ticket_record(nested))
                .and_then(|nested| ticket_from_record(nested, now))
        })
        .then(Tier::Steps, || {
            envelope
                .steps()
                .iter()
                .filter(|step| step.is(ToolKind::CreateAssistanceTicket))
                .filter_map(|step| step.result.filter(|result| is_ticket_record(result)))
                .find_map(|result| ticket_from_record(result, now))
        })
        .then_if(config.text_fallback, Tier::EnvelopeText, || {
            if envelope.as_str().is_some() {
                return None;
            }
            ticket_from_text(&envelope.text, now)
        })
        .run()
}

/// Ticket card for a plain assistant text part that mentions a ticket id.
pub fn extract_ticket_from_text(text: &str) -> Option<TicketRecord> {
    ticket_from_text(text, Utc::now())
}

fn ticket_from_text(text: &str, now: DateTime<Utc>) -> Option<TicketRecord> {
    let ticket_id = recognize_ticket_id(text)?;
    Some(TicketRecord::synthesized(ticket_id, infer_category(text), now))
}

/// Keeps the record's own fields, validating the id and filling whatever the
/// tool left out.
fn ticket_from_record(value: &Value, now: DateTime<Utc>) -> Option<TicketRecord> {
    let object = value.as_object()?;
    let ticket_id = TicketId::parse(object.get("ticketId")?.as_str()?).ok()?;

    let subject = non_blank(object, "subject");
    let description = non_blank(object, "description");
    let category = object
        .get("category")
        .and_then(Value::as_str)
        .and_then(|category| category.parse::<TicketCategory>().ok())
        .unwrap_or_else(|| {
            let context = [subject.as_deref(), description.as_deref()].into_iter().flatten();
            infer_category(&context.collect::<Vec<_>>().join(" "))
        });
    let priority = object
        .get("priority")
        .and_then(Value::as_str)
        .and_then(|priority| priority.parse::<TicketPriority>().ok())
        .unwrap_or_default();
    let created_at = object
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|created_at| created_at.with_timezone(&Utc))
        .unwrap_or(now);

    Some(TicketRecord {
        ticket_id,
        category,
        subject: subject.unwrap_or_else(|| category.default_subject().to_string()),
        description: description.unwrap_or_else(|| SYNTHESIZED_DESCRIPTION.to_string()),
        priority,
        status: TicketStatus::Open,
        created_at,
    })
}

fn non_blank(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
