//! Last-resort recovery from assistant prose.
//!
//! Every table here is closed and ordered. Nothing in this module attempts
//! general language understanding; it only recognises the handful of
//! phrasings the Nova agents are prompted to use.

use std::sync::LazyLock;

use regex::Regex;

use nova_core::domain::question::PendingQuestion;
use nova_core::domain::ticket::{TicketCategory, TicketId, TICKET_ID_PATTERN};

static TICKET_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(TICKET_ID_PATTERN).expect("ticket id pattern compiles"));

static CATEGORY_KEYWORDS: LazyLock<Vec<(TicketCategory, Regex)>> = LazyLock::new(|| {
    [
        (TicketCategory::Delivery, r"(?i)entrega|pedido|envío|shipping|delivery|llegado|llegar"),
        (TicketCategory::Return, r"(?i)devolución|devolver|return|refund|reembolso"),
        (TicketCategory::Warranty, r"(?i)garantía|warranty|reparación|repair"),
        (TicketCategory::Defect, r"(?i)defecto|defective|no funciona|broken|estropeado"),
        (TicketCategory::Setup, r"(?i)configuración|setup|instalar|install"),
    ]
    .into_iter()
    .map(|(category, pattern)| (category, Regex::new(pattern).expect("category keywords compile")))
    .collect()
});

struct KnownQuestion {
    pattern: Regex,
    question: &'static str,
    suggestions: &'static [&'static str],
}

static KNOWN_QUESTIONS: LazyLock<Vec<KnownQuestion>> = LazyLock::new(|| {
    [
        (
            r"(?i)para\s*qu[eé]\s*lo\s*usar[áa]s|uso\s+principal|gaming\s+o\s+trabajo",
            "¿Para qué lo usarás?",
            &["Gaming", "Trabajo/estudios", "Edición vídeo", "Uso general"][..],
        ),
        (
            r"(?i)presupuesto|budget|precio\s*m[aá]x",
            "¿Presupuesto aproximado?",
            &["<500€", "500-1000€", "1000-1500€", ">1500€"][..],
        ),
        (r"(?i)mochila|portabilidad|llevar.*diario", "¿Lo llevarás en mochila a diario?", &["Sí", "No"][..]),
    ]
    .into_iter()
    .map(|(pattern, question, suggestions)| KnownQuestion {
        pattern: Regex::new(pattern).expect("known question pattern compiles"),
        question,
        suggestions,
    })
    .collect()
});

/// First ticket id mentioned anywhere in `text`, uppercased.
pub fn recognize_ticket_id(text: &str) -> Option<TicketId> {
    let found = TICKET_ID.find(text)?;
    TicketId::parse(found.as_str()).ok()
}

/// Category for free text. Total: text matching no keyword group is `Other`.
pub fn infer_category(text: &str) -> TicketCategory {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.is_match(text))
        .map(|(category, _)| *category)
        .unwrap_or(TicketCategory::Other)
}

/// Canonical question for the first known phrasing found in `text`.
pub fn match_known_question(text: &str) -> Option<PendingQuestion> {
    let known = KNOWN_QUESTIONS.iter().find(|known| known.pattern.is_match(text))?;
    PendingQuestion::new(known.question, known.suggestions.iter().copied(), true).ok()
}
