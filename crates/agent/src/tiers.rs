use serde::Serialize;
use tracing::debug;

/// Named attempt inside an extractor, in the order the extractors try them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// The output itself is prose.
    RawText,
    /// A sub-agent's buffered `steps` array.
    Steps,
    /// The output object has the wanted shape.
    Direct,
    /// A nested `output` field has the wanted shape.
    NestedOutput,
    /// The `data-tool-agent` part following the tool part.
    SiblingData,
    /// Text recovered from the output envelope.
    EnvelopeText,
    /// The closed table of known question phrasings.
    KnownPattern,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawText => "raw_text",
            Self::Steps => "steps",
            Self::Direct => "direct",
            Self::NestedOutput => "nested_output",
            Self::SiblingData => "sibling_data",
            Self::EnvelopeText => "envelope_text",
            Self::KnownPattern => "known_pattern",
        }
    }

    /// Best-effort tiers that work from prose rather than structured output.
    pub fn is_text_fallback(&self) -> bool {
        matches!(self, Self::RawText | Self::EnvelopeText | Self::KnownPattern)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Matched<T> {
    pub tier: Tier,
    pub value: T,
}

impl<T> Matched<T> {
    pub fn into_value(self) -> T {
        self.value
    }
}

type Attempt<'a, T> = Box<dyn FnOnce() -> Option<T> + 'a>;

/// Ordered attempts combined first-success-wins. Later attempts are never
/// evaluated once an earlier one yields a value.
pub struct Tiers<'a, T> {
    extractor: &'static str,
    attempts: Vec<(Tier, Attempt<'a, T>)>,
}

impl<'a, T> Tiers<'a, T> {
    pub fn new(extractor: &'static str) -> Self {
        Self { extractor, attempts: Vec::new() }
    }

    pub fn then(mut self, tier: Tier, attempt: impl FnOnce() -> Option<T> + 'a) -> Self {
        self.attempts.push((tier, Box::new(attempt)));
        self
    }

    /// Adds `attempt` only when `enabled`.
    pub fn then_if(self, enabled: bool, tier: Tier, attempt: impl FnOnce() -> Option<T> + 'a) -> Self {
        if enabled {
            self.then(tier, attempt)
        } else {
            self
        }
    }

    pub fn run(self) -> Option<Matched<T>> {
        let extractor = self.extractor;
        for (tier, attempt) in self.attempts {
            if let Some(value) = attempt() {
                debug!(
                    event_name = "extract.tier_matched",
                    extractor,
                    tier = tier.as_str(),
                    text_fallback = tier.is_text_fallback(),
                    "extraction tier matched"
                );
                return Some(Matched { tier, value });
            }
        }

        debug!(event_name = "extract.exhausted", extractor, "no extraction tier matched");
        None
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::{Tier, Tiers};

    #[test]
    fn first_success_wins_and_later_attempts_are_skipped() {
        let evaluated = Cell::new(0);

        let matched = Tiers::new("test")
            .then(Tier::Steps, || {
                evaluated.set(evaluated.get() + 1);
                None
            })
            .then(Tier::Direct, || {
                evaluated.set(evaluated.get() + 1);
                Some("direct")
            })
            .then(Tier::EnvelopeText, || {
                evaluated.set(evaluated.get() + 1);
                Some("text")
            })
            .run()
            .expect("direct tier matches");

        assert_eq!(matched.tier, Tier::Direct);
        assert_eq!(matched.value, "direct");
        assert_eq!(evaluated.get(), 2);
    }

    #[test]
    fn disabled_attempts_are_not_registered() {
        let matched = Tiers::new("test")
            .then(Tier::Steps, || None::<u8>)
            .then_if(false, Tier::EnvelopeText, || Some(1))
            .run();

        assert!(matched.is_none());
    }

    #[test]
    fn only_prose_tiers_count_as_text_fallback() {
        assert!(Tier::EnvelopeText.is_text_fallback());
        assert!(Tier::KnownPattern.is_text_fallback());
        assert!(!Tier::Steps.is_text_fallback());
        assert!(!Tier::SiblingData.is_text_fallback());
    }
}
