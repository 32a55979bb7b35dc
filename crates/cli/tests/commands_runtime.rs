use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use nova_cli::commands::extract::ExtractTarget;
use nova_cli::commands::{config, doctor, extract, render};
use nova_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use serde_json::{json, Value};
use tempfile::TempDir;

const PRODUCTS: &str = r#"[
  {"id": "lp-001", "name": "ZenBook Air 14", "slug": "zenbook-air-14", "brand": "Asus",
   "categoryId": "laptops", "price": 999.0, "inStock": true, "freeShipping": true},
  {"id": "sp-001", "name": "Galaxy S24", "slug": "galaxy-s24", "brand": "Samsung",
   "categoryId": "smartphones", "price": 859.0, "inStock": true},
  {"id": "lp-003", "name": "Predator Helios 16", "slug": "predator-helios-16", "brand": "Acer",
   "categoryId": "laptops", "price": 1899.0, "inStock": false}
]"#;

const CATEGORIES: &str = r#"[
  {"id": "laptops", "name": "Portátiles"},
  {"id": "smartphones", "name": "Móviles"}
]"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        fs::write(dir.path().join("products.json"), PRODUCTS).expect("products fixture");
        fs::write(dir.path().join("categories.json"), CATEGORIES).expect("categories fixture");
        Self { dir }
    }

    fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.catalog.products_path = self.dir.path().join("products.json");
        config.catalog.categories_path = self.dir.path().join("categories.json");
        config
    }

    fn write(&self, name: &str, contents: &str) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("input fixture");
        path.display().to_string()
    }

    fn write_json(&self, name: &str, value: &Value) -> String {
        self.write(name, &value.to_string())
    }

    fn config_file(&self) -> PathBuf {
        let path = self.dir.path().join("nova.toml");
        let contents = format!(
            "[catalog]\nproducts_path = \"{}\"\ncategories_path = \"{}\"\n\n[extraction]\nmax_text_matches = 2\n",
            toml_path(&self.dir.path().join("products.json")),
            toml_path(&self.dir.path().join("categories.json")),
        );
        fs::write(&path, contents).expect("config fixture");
        path
    }
}

#[test]
fn render_returns_intents_for_whole_message() {
    let fixture = Fixture::new();
    let input = fixture.write_json(
        "message.json",
        &json!({
            "id": "msg-1",
            "role": "assistant",
            "parts": [
                {"type": "text", "text": "Te muestro algunas opciones."},
                {
                    "type": "tool-catalogQuery",
                    "toolCallId": "c1",
                    "state": "output-available",
                    "output": {"success": true, "products": [{"id": "lp-001", "name": "ZenBook Air 14", "price": 999}]}
                },
                {"type": "tool-somethingNew", "toolCallId": "x1", "state": "output-available", "output": {}}
            ]
        }),
    );

    let result = render::run(&fixture.config(), &input, false);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["parts"], 3);
    let intents = payload["intents"].as_array().expect("intents array");
    assert_eq!(intents[0]["intent"], "text");
    assert_eq!(intents[1]["intent"], "cards");
    assert_eq!(intents[1]["cards"][0]["card"], "product");
    assert_eq!(intents[1]["cards"][0]["id"], "lp-001");
    assert_eq!(intents[2]["intent"], "generic_fallback");
    assert_eq!(intents[2]["tool"], "somethingNew");
}

#[test]
fn render_turns_ticket_prose_into_ticket_card() {
    let fixture = Fixture::new();
    let input = fixture.write_json(
        "ticket-text.json",
        &json!([{"type": "text", "text": "He creado el ticket NVA-7F3K9Q por el retraso en la entrega."}]),
    );

    let result = render::run(&fixture.config(), &input, false);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let payload = parse_payload(&result.output);
    let card = &payload["intents"][0]["cards"][0];
    assert_eq!(card["card"], "ticket");
    assert_eq!(card["ticketId"], "NVA-7F3K9Q");
    assert_eq!(card["category"], "delivery");
}

#[test]
fn render_leaves_ticket_prose_as_text_without_text_fallback() {
    let fixture = Fixture::new();
    let mut config = fixture.config();
    config.extraction.text_fallback = false;
    let input = fixture.write_json(
        "ticket-text.json",
        &json!([{"type": "text", "text": "Tu ticket es NVA-7F3K9Q."}]),
    );

    let result = render::run(&config, &input, false);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["intents"][0]["intent"], "text");
}

#[test]
fn render_replays_json_lines_and_replaces_by_tool_call_id() {
    let fixture = Fixture::new();
    let input = fixture.write(
        "parts.jsonl",
        concat!(
            r#"{"type":"tool-catalogQuery","toolCallId":"c1","state":"input-streaming"}"#,
            "\n\n",
            r#"{"type":"tool-catalogQuery","toolCallId":"c1","state":"output-available","output":{"success":true,"products":[]}}"#,
            "\n",
        ),
    );

    let result = render::run(&fixture.config(), &input, false);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["parts"], 1);
    assert_eq!(payload["intents"][0]["intent"], "notice");
}

#[test]
fn render_stream_emits_one_line_per_applied_part() {
    let fixture = Fixture::new();
    let input = fixture.write(
        "parts.jsonl",
        concat!(
            r#"{"type":"tool-catalogQuery","toolCallId":"c1","state":"input-available"}"#,
            "\n",
            r#"{"type":"tool-catalogQuery","toolCallId":"c1","state":"output-error","errorText":"catalog offline"}"#,
            "\n",
        ),
    );

    let result = render::run(&fixture.config(), &input, true);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let lines = result.output.lines().map(parse_payload).collect::<Vec<_>>();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["replaced"], false);
    assert_eq!(lines[0]["intents"][0]["intent"], "loading");
    assert_eq!(lines[1]["index"], 0);
    assert_eq!(lines[1]["replaced"], true);
    assert_eq!(lines[1]["intents"][0]["intent"], "error_banner");
    assert_eq!(lines[1]["intents"][0]["message"], "catalog offline");
}

#[test]
fn render_reports_bad_json_line_as_decode_failure() {
    let fixture = Fixture::new();
    let input = fixture.write("broken.jsonl", "{\"type\":\"text\",\"text\":\"hola\"}\nnot json\n");

    let result = render::run(&fixture.config(), &input, false);
    assert_eq!(result.exit_code, 4);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "render");
    assert_eq!(payload["error_class"], "input_decode");
    assert!(payload["message"].as_str().unwrap_or_default().contains("line 2"));
}

#[test]
fn render_rejects_scalar_json_input() {
    let fixture = Fixture::new();
    let input = fixture.write("scalar.json", "42");

    let result = render::run(&fixture.config(), &input, false);
    assert_eq!(result.exit_code, 4);
    assert_eq!(parse_payload(&result.output)["error_class"], "input_decode");
}

#[test]
fn render_fails_with_catalog_class_when_fixture_missing() {
    let fixture = Fixture::new();
    let mut config = fixture.config();
    config.catalog.products_path = fixture.dir.path().join("missing.json");
    let input = fixture.write_json("message.json", &json!({"parts": []}));

    let result = render::run(&config, &input, false);
    assert_eq!(result.exit_code, 5);
    assert_eq!(parse_payload(&result.output)["error_class"], "catalog_load");
}

#[test]
fn render_fails_with_read_class_when_input_missing() {
    let fixture = Fixture::new();
    let missing = fixture.dir.path().join("nope.json").display().to_string();

    let result = render::run(&fixture.config(), &missing, false);
    assert_eq!(result.exit_code, 3);
    assert_eq!(parse_payload(&result.output)["error_class"], "input_read");
}

#[test]
fn extract_ticket_reports_direct_tier() {
    let fixture = Fixture::new();
    let input = fixture.write_json(
        "ticket.json",
        &json!({
            "ticketId": "nva-a1b2c3",
            "category": "warranty",
            "subject": "La pantalla parpadea",
            "description": "Desde ayer",
            "priority": "high",
            "status": "open",
            "createdAt": "2026-10-01T10:00:00Z"
        }),
    );

    let result = extract::run(&fixture.config(), ExtractTarget::Ticket, &input, None);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["target"], "ticket");
    assert_eq!(payload["matched"], true);
    assert_eq!(payload["tier"], "direct");
    assert_eq!(payload["text_fallback"], false);
    assert_eq!(payload["result"]["ticketId"], "NVA-A1B2C3");
    assert_eq!(payload["result"]["priority"], "high");
}

#[test]
fn extract_products_falls_back_to_catalog_prose() {
    let fixture = Fixture::new();
    let input = fixture.write_json(
        "sales.json",
        &json!({"text": "Para fotografía te recomiendo el Galaxy S24 o algo de Acer."}),
    );

    let result = extract::run(&fixture.config(), ExtractTarget::Products, &input, None);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["tier"], "envelope_text");
    assert_eq!(payload["text_fallback"], true);
    let products = payload["result"].as_array().expect("product list");
    assert_eq!(products.len(), 1, "out-of-stock products never match: {products:?}");
    assert_eq!(products[0]["id"], "sp-001");
    assert_eq!(products[0]["category"], "Móviles");
}

#[test]
fn extract_products_reports_no_match() {
    let fixture = Fixture::new();
    let input = fixture.write_json("sales.json", &json!({"text": "No tengo nada parecido."}));

    let result = extract::run(&fixture.config(), ExtractTarget::Products, &input, None);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["matched"], false);
    assert_eq!(payload["tier"], Value::Null);
    assert_eq!(payload["result"], Value::Null);
}

#[test]
fn extract_question_reads_sibling_data_part() {
    let fixture = Fixture::new();
    let input = fixture.write_json(
        "question.json",
        &json!({
            "parts": [
                {"type": "text", "text": "Déjame preguntarte algo."},
                {"type": "tool-personalShopperSales", "toolCallId": "s1", "state": "input-available"},
                {
                    "type": "data-tool-agent",
                    "data": {
                        "toolResults": [{
                            "toolName": "askUserQuestion",
                            "result": {
                                "question": "¿Cuál es tu presupuesto?",
                                "suggestions": ["Menos de 500 €", "500-1000 €", "Más de 1000 €"],
                                "waitingForUserResponse": true
                            }
                        }]
                    }
                }
            ]
        }),
    );

    let result = extract::run(&fixture.config(), ExtractTarget::Question, &input, None);
    assert_eq!(result.exit_code, 0, "unexpected failure: {}", result.output);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["tier"], "sibling_data");
    assert_eq!(payload["result"]["question"], "¿Cuál es tu presupuesto?");
    assert_eq!(payload["result"]["suggestions"].as_array().map(Vec::len), Some(3));
}

#[test]
fn extract_rejects_invalid_json() {
    let fixture = Fixture::new();
    let input = fixture.write("broken.json", "{not json");

    let result = extract::run(&fixture.config(), ExtractTarget::Ticket, &input, None);
    assert_eq!(result.exit_code, 4);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["command"], "extract");
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["error_class"], "input_decode");
}

#[test]
fn doctor_json_passes_with_valid_config_file() {
    let fixture = Fixture::new();
    let options = explicit_file(fixture.config_file());

    with_env(&[], || {
        let payload = parse_payload(&doctor::run(&options, true));
        assert_eq!(payload["overall_status"], "pass", "doctor report: {payload}");

        let checks = payload["checks"].as_array().expect("checks array");
        let names = checks.iter().map(|check| check["name"].as_str().unwrap_or_default()).collect::<Vec<_>>();
        assert_eq!(names, ["config_validation", "catalog_load", "renderer_coverage"]);
        assert!(checks[1]["details"].as_str().unwrap_or_default().starts_with("3 products (2 in stock)"));
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    let fixture = Fixture::new();
    let options = explicit_file(fixture.config_file());

    with_env(&[("NOVA_EXTRACTION_MAX_TEXT_MATCHES", "0")], || {
        let payload = parse_payload(&doctor::run(&options, true));
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

#[test]
fn doctor_human_output_marks_catalog_failure() {
    let fixture = Fixture::new();
    let options = explicit_file(fixture.config_file());
    let missing = fixture.dir.path().join("missing.json").display().to_string();

    with_env(&[("NOVA_CATALOG_PRODUCTS_PATH", &missing)], || {
        let output = doctor::run(&options, false);
        assert!(output.starts_with("doctor: one or more readiness checks failed"));
        assert!(output.contains("- [ok] config_validation"));
        assert!(output.contains("- [fail] catalog_load"));
    });
}

#[test]
fn config_attributes_each_value_to_its_source() {
    let fixture = Fixture::new();
    let mut options = explicit_file(fixture.config_file());
    options.overrides.text_fallback = Some(false);

    with_env(&[("NOVA_LOG_LEVEL", "debug")], || {
        let output = config::run(&options);
        assert!(output.contains("- extraction.text_fallback = false (source: flag (--no-text-fallback))"));
        assert!(output.contains("- extraction.max_text_matches = 2 (source: file ("));
        assert!(output.contains("- logging.level = debug (source: env (NOVA_LOG_LEVEL))"));
        assert!(output.contains("- conversation.agent = personal-shopper (source: default)"));
        assert!(output.contains("- conversation.agent tools = "));
    });
}

#[test]
fn config_reports_missing_explicit_file() {
    let fixture = Fixture::new();
    let options = explicit_file(fixture.dir.path().join("absent.toml"));

    with_env(&[], || {
        let output = config::run(&options);
        assert!(output.starts_with("config validation failed: required config file was not found"));
    });
}

fn explicit_file(path: PathBuf) -> LoadOptions {
    LoadOptions { config_path: Some(path), require_file: true, overrides: ConfigOverrides::default() }
}

fn toml_path(path: &Path) -> String {
    path.display().to_string().replace('\\', "\\\\")
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "NOVA_CATALOG_PRODUCTS_PATH",
        "NOVA_CATALOG_CATEGORIES_PATH",
        "NOVA_EXTRACTION_TEXT_FALLBACK",
        "NOVA_EXTRACTION_MAX_TEXT_MATCHES",
        "NOVA_CONVERSATION_AGENT",
        "NOVA_LOGGING_LEVEL",
        "NOVA_LOGGING_FORMAT",
        "NOVA_LOG_LEVEL",
        "NOVA_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
