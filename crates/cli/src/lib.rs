pub mod commands;
pub mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nova_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use nova_core::errors::ApplicationError;

use crate::commands::extract::ExtractTarget;
use crate::commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "nova",
    about = "Nova chat replay CLI",
    long_about = "Replay captured Nova chat transcripts through output extraction and tool dispatch, and inspect configuration.",
    after_help = "Examples:\n  nova render transcript.json\n  nova render - --stream < parts.jsonl\n  nova extract ticket output.json\n  nova doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a nova.toml config file (must exist when given)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Disable prose-based product and ticket recovery")]
    no_text_fallback: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Render every part of a captured assistant message as JSON render intents")]
    Render {
        #[arg(help = "Message JSON, part array or JSON lines of parts; `-` reads stdin")]
        input: String,
        #[arg(long, help = "Emit one JSON line per applied part instead of the final render")]
        stream: bool,
    },
    #[command(about = "Run a single extractor over a captured tool output and report the matched tier")]
    Extract {
        #[arg(value_enum)]
        target: ExtractTarget,
        #[arg(help = "Tool output JSON (for `question`, a message or part array); `-` reads stdin")]
        input: String,
        #[arg(long, help = "Part index to inspect for `question` (defaults to the first sales sub-agent)")]
        index: Option<usize>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, catalog fixtures and renderer coverage")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        overrides: ConfigOverrides {
            text_fallback: cli.no_text_fallback.then_some(false),
            ..ConfigOverrides::default()
        },
    };

    let result = match cli.command {
        Command::Render { input, stream } => with_config("render", &options, |config| {
            commands::render::run(config, &input, stream)
        }),
        Command::Extract { target, input, index } => with_config("extract", &options, |config| {
            commands::extract::run(config, target, &input, index)
        }),
        Command::Config => CommandResult { exit_code: 0, output: commands::config::run(&options) },
        Command::Doctor { json } => {
            CommandResult { exit_code: 0, output: commands::doctor::run(&options, json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn with_config(
    command: &str,
    options: &LoadOptions,
    run: impl FnOnce(&AppConfig) -> CommandResult,
) -> CommandResult {
    match AppConfig::load(options.clone()) {
        Ok(config) => {
            logging::init(&config);
            run(&config)
        }
        Err(error) => CommandResult::from_error(command, ApplicationError::from(error)),
    }
}
