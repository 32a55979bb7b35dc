use std::env;
use std::fs;
use std::path::Path;

use nova_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct Field {
    key_path: &'static str,
    value: String,
    env_keys: &'static [&'static str],
    flag: Option<&'static str>,
}

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let text_fallback_flag = options.overrides.text_fallback.map(|_| "--no-text-fallback");

    let fields = [
        Field {
            key_path: "catalog.products_path",
            value: config.catalog.products_path.display().to_string(),
            env_keys: &["NOVA_CATALOG_PRODUCTS_PATH"],
            flag: None,
        },
        Field {
            key_path: "catalog.categories_path",
            value: config.catalog.categories_path.display().to_string(),
            env_keys: &["NOVA_CATALOG_CATEGORIES_PATH"],
            flag: None,
        },
        Field {
            key_path: "extraction.text_fallback",
            value: config.extraction.text_fallback.to_string(),
            env_keys: &["NOVA_EXTRACTION_TEXT_FALLBACK"],
            flag: text_fallback_flag,
        },
        Field {
            key_path: "extraction.max_text_matches",
            value: config.extraction.max_text_matches.to_string(),
            env_keys: &["NOVA_EXTRACTION_MAX_TEXT_MATCHES"],
            flag: None,
        },
        Field {
            key_path: "conversation.agent",
            value: config.conversation.agent.to_string(),
            env_keys: &["NOVA_CONVERSATION_AGENT"],
            flag: None,
        },
        Field {
            key_path: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["NOVA_LOGGING_LEVEL", "NOVA_LOG_LEVEL"],
            flag: None,
        },
        Field {
            key_path: "logging.format",
            value: format!("{:?}", config.logging.format),
            env_keys: &["NOVA_LOGGING_FORMAT", "NOVA_LOG_FORMAT"],
            flag: None,
        },
    ];

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];
    for field in &fields {
        let source = field_source(field, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(field.key_path, &field.value, source));
    }

    let tools = config.conversation.agent.tools();
    let tool_names = if tools.is_empty() {
        "<none>".to_string()
    } else {
        tools.iter().map(|tool| tool.canonical_name()).collect::<Vec<_>>().join(", ")
    };
    lines.push(format!("- conversation.agent tools = {tool_names}"));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    toml::from_str::<Value>(&raw).ok()
}

fn field_source(field: &Field, config_file_doc: Option<&Value>, config_file_path: Option<&Path>) -> String {
    if let Some(flag) = field.flag {
        return format!("flag ({flag})");
    }

    if let Some(env_key) = field.env_keys.iter().find(|key| env::var_os(**key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, field.key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
