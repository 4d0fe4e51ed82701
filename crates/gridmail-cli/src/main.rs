use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use gridmail_editor_core::{
    ChangeLog, EditorCommand, Fragment, HtmlEditor, RichDocument, ViewController, WireViolation,
    check_wire, collect_tokens, commit, reconcile, unwrap_document,
};
use miette::{Diagnostic, IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod config;

use config::Settings;

#[derive(Parser)]
#[command(version, about = "Gridmail - tooling for stored email template documents", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a KDL config file (default: <config dir>/gridmail/editor.kdl)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline steps
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a document as the editor would and print what it stores
    Normalize {
        /// Stored document, or `-` for stdin
        file: PathBuf,
    },
    /// Print the raw-HTML view of a document
    Source {
        /// Stored document, or `-` for stdin
        file: PathBuf,

        /// Prefix each row with its line number
        #[arg(long)]
        gutter: bool,
    },
    /// List placeholder tokens, flagging ones missing from the catalog
    Tokens {
        /// Stored document, or `-` for stdin
        file: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Verify that a stored document has the expected shape
    Check {
        /// Stored document, or `-` for stdin
        file: PathBuf,
    },
    /// Apply scripted edits at the end of a document and print the result
    Edit {
        /// Stored document, or `-` for stdin
        file: PathBuf,

        /// Text to type
        #[arg(long = "type", value_name = "TEXT")]
        type_text: Vec<String>,

        /// Placeholder token to insert after the typed text
        #[arg(long, value_name = "TOKEN")]
        placeholder: Vec<String>,

        /// Bold the whole document last
        #[arg(long)]
        bold_all: bool,
    },
}

#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("{source_name}: {} violation(s) of the stored document shape", .violations.len())]
#[diagnostic(code(gridmail::check))]
struct CheckFailed {
    source_name: String,
    #[related]
    violations: Vec<WireViolation>,
}

#[derive(Debug, Serialize)]
struct TokenReport {
    token: String,
    count: usize,
    known: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

fn main() -> Result<()> {
    init_miette();

    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let settings = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Normalize { file } => {
            let input = read_input(&file)?;
            println!("{}", normalize(&input, &settings));
        }
        Commands::Source { file, gutter } => {
            let input = read_input(&file)?;
            let mut view = ViewController::default();
            view.enter_html(&input);
            if gutter {
                println!("{}", view.source_with_gutter());
            } else {
                println!("{}", view.source_string());
            }
        }
        Commands::Tokens { file, json } => {
            let input = read_input(&file)?;
            let reports = token_reports(&input, &settings);
            if json {
                let out = serde_json::to_string_pretty(&reports).into_diagnostic()?;
                println!("{out}");
            } else {
                print_tokens(&reports);
            }
        }
        Commands::Check { file } => {
            let input = read_input(&file)?;
            let violations = check_wire(&input, &settings.editor.inline_styles);
            if !violations.is_empty() {
                return Err(CheckFailed {
                    source_name: file.display().to_string(),
                    violations,
                }
                .into());
            }
            println!("✓ {} is well-formed", file.display());
        }
        Commands::Edit {
            file,
            type_text,
            placeholder,
            bold_all,
        } => {
            let input = read_input(&file)?;
            println!("{}", edit(&input, &settings, &type_text, &placeholder, bold_all));
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .into_diagnostic()
            .wrap_err("couldn't read stdin")?;
        return Ok(buf.trim_end().to_string());
    }
    let content = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("couldn't read {}", path.display()))?;
    Ok(content.trim_end().to_string())
}

/// Adopt the input as an external value and run the commit pipeline once.
fn normalize(input: &str, settings: &Settings) -> String {
    let mut doc = RichDocument::new();
    reconcile(
        &mut doc,
        false,
        input,
        &settings.editor.chip_style,
        &settings.editor.inline_styles,
    );
    commit(&mut doc, &settings.editor.inline_styles)
}

fn token_reports(input: &str, settings: &Settings) -> Vec<TokenReport> {
    let fragment = Fragment::parse(unwrap_document(input));
    let mut reports: Vec<TokenReport> = Vec::new();
    for token in collect_tokens(&fragment.children) {
        if let Some(report) = reports.iter_mut().find(|r| r.token == token) {
            report.count += 1;
            continue;
        }
        let entry = settings.catalog.iter().find(|e| e.token() == token);
        reports.push(TokenReport {
            known: entry.is_some(),
            label: entry.map(|e| e.label.clone()),
            token,
            count: 1,
        });
    }
    reports
}

fn print_tokens(reports: &[TokenReport]) {
    if reports.is_empty() {
        println!("no placeholder tokens");
        return;
    }
    for report in reports {
        match &report.label {
            Some(label) => println!("{}  x{}  {label}", report.token, report.count),
            None => println!("{}  x{}  ⚠ not in catalog", report.token, report.count),
        }
    }
    let unknown = reports.iter().filter(|r| !r.known).count();
    if unknown > 0 {
        tracing::warn!(unknown, "tokens missing from the placeholder catalog");
    }
}

fn edit(input: &str, settings: &Settings, texts: &[String], tokens: &[String], bold_all: bool) -> String {
    let mut editor = HtmlEditor::new(settings.editor.clone(), ChangeLog::default())
        .with_catalog(settings.catalog.clone());
    editor.set_value(input);
    let end = editor.document().len();
    editor.execute(EditorCommand::MoveCursor { offset: end });

    for text in texts {
        editor.type_text(text);
    }
    for token in tokens {
        if !editor.insert_placeholder(token) {
            tracing::warn!(%token, "placeholder not inserted");
        }
    }
    if bold_all {
        editor.execute(EditorCommand::SelectAll);
        editor.execute(EditorCommand::ToggleBold);
    }
    tracing::info!(changes = editor.listener().0.len(), "edits applied");
    editor.value().to_string()
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
