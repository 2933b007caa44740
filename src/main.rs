use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

mod analyzer;
mod config;
mod error;
mod logging;
mod mcp;
mod models;
mod output;
mod pdf;
mod service;
mod tools;
mod utils;

#[cfg(test)]
mod test_support;

use analyzer::segmenter::{build_segmenter, Segmenter, SegmenterKind};
use config::{ConfigManager, ExtractionConfig};
use mcp::server::McpServer;
use output::OutputFormat;
use service::{ExtractRequest, PdfExtractionService};

/// Prints a formatted box with the given lines
/// Empty strings create empty lines, other strings are centered within the box
fn print_box(lines: &[&str]) {
    const BOX_WIDTH: usize = 60;
    const CONTENT_WIDTH: usize = BOX_WIDTH - 4;

    eprintln!("\n\x1b[36m╔{}╗", "═".repeat(BOX_WIDTH - 2));

    for line in lines {
        if line.is_empty() {
            eprintln!("║{}║", " ".repeat(BOX_WIDTH - 2));
            continue;
        }
        let visible_len = strip_ansi_codes(line).chars().count();
        if visible_len < CONTENT_WIDTH {
            let total_padding = CONTENT_WIDTH - visible_len;
            let left_padding = total_padding / 2;
            let right_padding = total_padding - left_padding;
            eprintln!(
                "║  {}{}{}\x1b[36m║",
                " ".repeat(left_padding),
                line,
                " ".repeat(right_padding)
            );
        } else {
            eprintln!("║  {}\x1b[36m  ║", line);
        }
    }

    eprintln!("╚{}╝\x1b[0m\n", "═".repeat(BOX_WIDTH - 2));
}

/// Strips ANSI escape codes to calculate visible text length
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::new();
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.next() == Some('[') {
                for c in chars.by_ref() {
                    if c.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

fn build_cli() -> Command {
    Command::new("pdf-extractor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract text and key information from PDF documents")
        .long_about(
            "Extracts the text of every page of a PDF and, optionally, key information:\n\
            headings, keywords, a short extractive summary and list items.\n\n\
            Example: pdf-extractor input.pdf -o output.json -f json --extract-key-info",
        )
        .subcommand_negates_reqs(true)
        .args_conflicts_with_subcommands(true)
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("PDF file path (relative, absolute or starting with ~)")
                .required(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file (JSON)")
                .global(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .value_name("FILE")
                .help("Write the result to FILE instead of stdout")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .value_name("FORMAT")
                .help("Output format [default: from configuration, text]")
                .value_parser(OutputFormat::ALL.map(|format| format.as_str()))
                .ignore_case(true)
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new("extract-key-info")
                .long("extract-key-info")
                .help("Analyze headings, keywords, summary and list items")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-key-info")
                .long("no-key-info")
                .help("Only extract raw text (takes precedence over --extract-key-info)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .help("Show per-page progress for large documents")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show debug logs")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only print results and errors")
                .global(true)
                .conflicts_with("verbose")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("serve")
                .about("Run as a Model Context Protocol server on stdio")
                .long_about(
                    "This MCP server provides the following tools:\n\
                    - extract-pdf: Extract text and key information from a PDF file\n\
                    - analyze-text: Find headings, keywords, summary and list items in text",
                ),
        )
        .subcommand(
            Command::new("init-config")
                .about("Write the effective configuration to a JSON file")
                .arg(
                    Arg::new("path")
                        .value_name("PATH")
                        .help("Target file [default: ~/.pdf_extractor/config.json]"),
                )
                .arg(
                    Arg::new("defaults")
                        .long("defaults")
                        .help("Write built-in defaults instead of the loaded configuration")
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// `--no-key-info` wins; without either flag the configured default applies.
fn resolve_key_info(extract_flag: bool, no_key_info_flag: bool, configured: bool) -> bool {
    if no_key_info_flag {
        false
    } else if extract_flag {
        true
    } else {
        configured
    }
}

/// Flags given on the command line override file and environment values.
fn apply_cli_overrides(matches: &ArgMatches, config: &mut ExtractionConfig) {
    if let Some(format) = matches.get_one::<String>("format") {
        config.default_output_format = format.clone();
    }
    config.extract_key_info = resolve_key_info(
        matches.get_flag("extract-key-info"),
        matches.get_flag("no-key-info"),
        config.extract_key_info,
    );
}

fn segmenter_for(config: &ExtractionConfig) -> Arc<dyn Segmenter> {
    let kind = config.segmenter.parse::<SegmenterKind>().unwrap_or_else(|e| {
        warn!("{}; using jieba", e);
        SegmenterKind::Jieba
    });
    build_segmenter(kind)
}

fn load_config(matches: &ArgMatches) -> ConfigManager {
    let path = matches.get_one::<String>("config").map(PathBuf::from);
    ConfigManager::load(path.as_deref())
}

fn setup_logging(matches: &ArgMatches, config: &ExtractionConfig) {
    let level = logging::resolve_level(
        matches.get_flag("quiet"),
        matches.get_flag("verbose"),
        &config.log_level,
    );
    let log_file = logging::log_file_for(config);
    if let Err(e) = logging::init(level, log_file.as_deref()) {
        eprintln!("Warning: {:#}; logging to stderr", e);
        if let Err(e) = logging::init(level, None) {
            eprintln!("Warning: {:#}; logging disabled", e);
        }
    }
}

async fn run_extract(matches: &ArgMatches, config: ExtractionConfig) -> i32 {
    let quiet = matches.get_flag("quiet");
    let input = matches
        .get_one::<String>("input")
        .cloned()
        .unwrap_or_default();
    let output_file = matches.get_one::<String>("output").map(PathBuf::from);

    let output_format = match config.default_output_format.parse::<OutputFormat>() {
        Ok(format) => format,
        Err(e) => {
            eprintln!("✗ {}", e);
            return 1;
        }
    };

    let extract_key_info = config.extract_key_info;

    if !quiet {
        eprintln!("Processing file: {}", input);
        if extract_key_info {
            eprintln!("Key information will be extracted...");
        }
    }

    let request = ExtractRequest {
        output_format,
        extract_key_info,
        output_file: output_file.clone(),
        show_progress: matches.get_flag("progress") && !quiet,
        ..ExtractRequest::new(input)
    };
    let segmenter = segmenter_for(&config);
    let service = PdfExtractionService::new(config, segmenter);
    let job = tokio::task::spawn_blocking(move || service.extract(&request));

    let outcome = tokio::select! {
        joined = job => joined,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n\n✗ Operation cancelled");
            return 1;
        }
    };

    match outcome {
        Ok(Ok(result)) => {
            match output_file {
                Some(path) => {
                    if !quiet {
                        eprintln!("\n✓ Done. Result saved to: {}", path.display());
                    }
                }
                None => println!("{}", result),
            }
            0
        }
        Ok(Err(e)) => {
            debug!("Extraction failed: {:?}", e);
            eprintln!("\n✗ {}", e);
            1
        }
        Err(join_error) => {
            error!("Extraction task failed: {}", join_error);
            eprintln!("\n✗ Unexpected error: {}", join_error);
            1
        }
    }
}

fn run_init_config(matches: &ArgMatches, mut manager: ConfigManager) -> i32 {
    if matches.get_flag("defaults") {
        manager.reset_to_defaults();
    }
    let target = matches.get_one::<String>("path").map(PathBuf::from);
    match manager.save(target.as_deref()) {
        Ok(path) => {
            eprintln!("✓ Configuration written to: {}", path.display());
            0
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            1
        }
    }
}

async fn run_server(matches: &ArgMatches, config: ExtractionConfig) -> i32 {
    if !matches.get_flag("quiet") {
        print_box(&[
            "",
            "\x1b[1m\x1b[31m PDF Extractor: MCP Server \x1b[0m",
            "",
            "\x1b[0m Text and key information from PDF documents \x1b[0m",
            "",
            "\x1b[90m tools: extract-pdf, analyze-text \x1b[0m",
            "",
        ]);
    }

    let timeout = Duration::from_secs(config.tool_timeout_secs);
    let segmenter = segmenter_for(&config);
    let service = Arc::new(PdfExtractionService::new(config, segmenter));

    info!("Starting MCP server...");
    let mut server = McpServer::new(service, timeout);
    if let Err(e) = server.start().await {
        error!("MCP server stopped: {}", e);
        return 1;
    }
    0
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    // Global flags are visible on the subcommand's matches.
    let (name, active) = match matches.subcommand() {
        Some((name, sub)) => (name, sub),
        None => ("extract", &matches),
    };

    let mut manager = load_config(active);
    if name == "extract" {
        apply_cli_overrides(active, manager.config_mut());
    }
    setup_logging(active, manager.config());
    debug!(config = ?manager.config(), "Configuration resolved");

    let code = match name {
        "serve" => run_server(active, manager.into_config()).await,
        "init-config" => run_init_config(active, manager),
        _ => run_extract(active, manager.into_config()).await,
    };
    process::exit(code);
}
