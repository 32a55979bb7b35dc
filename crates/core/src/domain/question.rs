use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const MIN_SUGGESTIONS: usize = 2;
pub const MAX_SUGGESTIONS: usize = 6;

/// An interactive clarification request awaiting a user reply.
///
/// The user's answer travels back as a new ordinary message; a pending
/// question is never mutated into an answered one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    pub question: String,
    pub suggestions: Vec<String>,
    #[serde(rename = "waitingForUserResponse", alias = "awaitingResponse")]
    pub awaiting_response: bool,
}

impl PendingQuestion {
    /// Builds a question, dropping blank suggestions and keeping at most six.
    pub fn new<I, S>(question: impl Into<String>, suggestions: I, awaiting_response: bool) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(DomainError::InvalidQuestion("question text is empty".to_string()));
        }

        let suggestions = suggestions
            .into_iter()
            .map(Into::into)
            .map(|suggestion: String| suggestion.trim().to_string())
            .filter(|suggestion| !suggestion.is_empty())
            .take(MAX_SUGGESTIONS)
            .collect::<Vec<_>>();

        if suggestions.len() < MIN_SUGGESTIONS {
            return Err(DomainError::InvalidQuestion(format!(
                "expected at least {MIN_SUGGESTIONS} suggestions, got {}",
                suggestions.len()
            )));
        }

        Ok(Self { question, suggestions, awaiting_response })
    }
}

#[cfg(test)]
mod tests {
    use super::PendingQuestion;
    use crate::errors::DomainError;

    #[test]
    fn blank_suggestions_are_dropped_and_list_is_capped() {
        let question = PendingQuestion::new(
            "¿Presupuesto?",
            ["a", " ", "b", "c", "d", "e", "f", "g"],
            true,
        )
        .expect("enough suggestions");

        assert_eq!(question.suggestions, vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn fewer_than_two_suggestions_is_invalid() {
        let result = PendingQuestion::new("¿Presupuesto?", ["solo"], true);
        assert!(matches!(result, Err(DomainError::InvalidQuestion(_))));
    }

    #[test]
    fn wire_key_and_alias_both_deserialize() {
        let canonical: PendingQuestion = serde_json::from_str(
            r#"{"question":"Q","suggestions":["a","b"],"waitingForUserResponse":true}"#,
        )
        .expect("canonical key");
        let aliased: PendingQuestion = serde_json::from_str(
            r#"{"question":"Q","suggestions":["a","b"],"awaitingResponse":true}"#,
        )
        .expect("alias key");

        assert_eq!(canonical, aliased);
    }
}
