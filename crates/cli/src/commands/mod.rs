pub mod config;
pub mod doctor;
pub mod extract;
pub mod render;

use std::fs;
use std::io::Read;

use nova_core::catalog::Catalog;
use nova_core::config::AppConfig;
use nova_core::errors::ApplicationError;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    /// Successful command whose output is a JSON document of its own.
    pub fn json<T: Serialize>(command: &str, payload: &T) -> Self {
        match serde_json::to_string_pretty(payload) {
            Ok(output) => Self { exit_code: 0, output },
            Err(error) => Self::failure(command, "serialization", error.to_string(), 6),
        }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: ApplicationError) -> Self {
        Self::failure(command, error.error_class(), error.to_string(), error.exit_code())
    }
}

/// Reads a path, or stdin for `-`.
pub(crate) fn read_input(input: &str) -> Result<String, ApplicationError> {
    let source_name = source_name(input);
    let read = if input == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).map(|_| raw)
    } else {
        fs::read_to_string(input)
    };
    read.map_err(|error| ApplicationError::InputRead { source_name, message: error.to_string() })
}

pub(crate) fn read_json(input: &str) -> Result<Value, ApplicationError> {
    let raw = read_input(input)?;
    serde_json::from_str(&raw).map_err(|error| ApplicationError::InputDecode {
        source_name: source_name(input),
        message: error.to_string(),
    })
}

pub(crate) fn load_catalog(config: &AppConfig) -> Result<Catalog, ApplicationError> {
    Ok(Catalog::load(&config.catalog.products_path, &config.catalog.categories_path)?)
}

pub(crate) fn source_name(input: &str) -> String {
    if input == "-" {
        "stdin".to_string()
    } else {
        input.to_string()
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
