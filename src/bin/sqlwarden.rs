//! sqlwarden: check a SQL query from the command line
//!
//! # Usage
//!
//! ```bash
//! # Validate a query with positional parameters
//! sqlwarden "SELECT * FROM users WHERE id = ?" --params '[42]'
//!
//! # Named parameters, with a suggested fix
//! sqlwarden "UPDATE users SET status = :status" --params '{"status": "off"}' --verbose
//!
//! # Show how the query was read
//! sqlwarden explain "DELETE FROM logs -- WHERE id = 1"
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use serde_json::json;
use sqlwarden::classifier::{self, StatementKind};
use sqlwarden::placeholder;
use sqlwarden::prelude::*;
use sqlwarden::scanner::SqlText;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sqlwarden")]
#[command(version)]
#[command(about = "Runtime SQL query guard", long_about = None)]
#[command(after_help = "EXAMPLES:
    sqlwarden 'SELECT * FROM users WHERE id = ?' --params '[42]'
    sqlwarden 'DELETE FROM sessions' --params '[]' --verbose
    sqlwarden codes")]
struct Cli {
    /// The SQL statement to validate
    query: Option<String>,

    /// Bound parameters as JSON: a list for ?, an object for :name
    #[arg(short, long)]
    params: Option<String>,

    /// Build a suggested fix for the primary finding
    #[arg(short, long)]
    verbose: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Configuration file (default: ./sqlwarden.toml, then the user config dir)
    #[arg(short, long, env = "SQLWARDEN_CONFIG")]
    config: Option<PathBuf>,

    /// SQL dialect, overriding the configuration
    #[arg(short, long, value_enum)]
    dialect: Option<DialectArg>,

    /// Bypass validation
    #[arg(long)]
    disable: bool,

    /// Print the failure summary to stderr when validation fails
    #[arg(long)]
    notify: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Standard,
    Mysql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Standard => Dialect::Standard,
            DialectArg::Mysql => Dialect::MySql,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show segments, placeholders and classification of a query
    Explain {
        /// The SQL statement to explain
        query: String,
    },
    /// Show the finding code reference
    Codes,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let outcome = match &cli.command {
        Some(Commands::Explain { query }) => load_config(&cli).map(|config| {
            explain_query(query, config.dialect);
            0
        }),
        Some(Commands::Codes) => {
            show_codes();
            Ok(0)
        }
        None => match &cli.query {
            Some(query) => validate_query(query, &cli),
            None => {
                println!("{}", "sqlwarden: runtime SQL query guard".cyan().bold());
                println!();
                println!("Usage: sqlwarden <QUERY> [--params <JSON>] [OPTIONS]");
                println!();
                println!("Try: sqlwarden --help");
                Ok(0)
            }
        },
    };

    match outcome {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    }
}

fn load_config(cli: &Cli) -> Result<GuardConfig> {
    let mut config = GuardConfig::load(cli.config.as_deref())?;
    if cli.disable {
        config.enabled = false;
    }
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(dialect) = &cli.dialect {
        config.dialect = dialect.clone().into();
    }
    Ok(config)
}

/// Where and when the check ran.
fn execution_context() -> serde_json::Value {
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let script = std::env::args().next().unwrap_or_else(|| "sqlwarden".to_string());
    json!({
        "script": script,
        "cwd": cwd,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })
}

fn validate_query(sql: &str, cli: &Cli) -> Result<i32> {
    let config = load_config(cli)?;

    let query = match &cli.params {
        Some(raw) => {
            let value: serde_json::Value = serde_json::from_str(raw).context("--params is not valid JSON")?;
            Query::prepared(sql, Params::from_json(&value)?)
        }
        None => Query::raw(sql),
    };

    let mut guard = Guard::new(config);
    if cli.notify {
        guard = guard.with_notifier(|count: usize, summary: &str, _: &Report| -> Result<(), NotifyError> {
            eprintln!("{} {} error(s)", "sqlwarden:".red().bold(), count);
            eprintln!("{}", summary);
            Ok(())
        });
    }

    let report = guard.validate_with_context(&query, Some(execution_context()));

    match cli.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Text => print_report(sql, &report),
    }

    Ok(if report.is_error() { 1 } else { 0 })
}

fn print_report(sql: &str, report: &Report) {
    println!("{} {}", "Query:".dimmed(), sql.yellow());
    println!();

    match report.status {
        Status::Bypassed => {
            println!("{}", "⊘ Validation bypassed".dimmed());
            return;
        }
        Status::Success if report.findings().is_empty() => {
            println!("{}", "✓ No problems found".green().bold());
            return;
        }
        Status::Success => println!("{}", "✓ Passed with notes".green().bold()),
        Status::Error => println!("{}", "✗ Validation failed".red().bold()),
    }
    println!();

    for finding in report.findings() {
        let label = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".cyan().bold(),
        };
        println!("  {:>7} {} {}", label, finding.code.to_string().dimmed(), finding.message);
        if let Some(span) = finding.span {
            println!("          {} {}", "at".dimmed(), sql[span.start..span.end].white());
        }
    }

    if let Some(suggestion) = &report.suggestion {
        println!();
        println!("{}", "Suggested query:".green().bold());
        println!("  {}", suggestion.secure_sql.white());
        println!();
        println!("{}", "Example:".green().bold());
        for line in suggestion.code_example.lines() {
            println!("  {}", line.cyan());
        }
        println!();
        println!("{}", suggestion.explanation.dimmed());
    }
}

fn explain_query(sql: &str, dialect: Dialect) {
    println!("{}", "sqlwarden query explanation".cyan().bold());
    println!();
    println!("{} {}", "Query:".dimmed(), sql.yellow());
    println!();

    let text = SqlText::new(sql, dialect);

    println!("{}", "Segments:".green().bold());
    for segment in text.segments() {
        println!(
            "  {:>4}..{:<4} {:8} {}",
            segment.start,
            segment.end,
            format!("{:?}", segment.kind).cyan(),
            text.slice(segment).white()
        );
    }

    let placeholders = placeholder::extract(&text);
    println!();
    println!("{}", "Placeholders:".green().bold());
    if placeholders.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for p in &placeholders {
        println!("  #{} {} {}", p.ordinal, p.to_string().yellow(), format!("at {}", p.offset).dimmed());
    }

    let classification = classifier::classify(&text);
    let statement = &classification.statement;
    println!();
    println!("{}", "Statement:".green().bold());
    println!("  {} {}", "Kind:".dimmed(), statement.kind.to_string().cyan());
    if let Some(table) = &statement.table {
        println!("  {} {}", "Table:".dimmed(), table.white());
    }
    if let Some(columns) = &statement.columns {
        println!("  {} {}", "Columns:".dimmed(), columns.join(", ").white());
    }
    for (i, row) in statement.value_rows.iter().enumerate() {
        println!(
            "  {} {} {}",
            format!("Row {}:", i + 1).dimmed(),
            text.as_str()[row.span.start..row.span.end].white(),
            format!("({} entries, {} placeholders)", row.entries.len(), row.placeholder_count()).dimmed()
        );
    }
    if !statement.set_columns.is_empty() {
        println!("  {} {}", "SET:".dimmed(), statement.set_columns.join(", ").white());
    }
    if matches!(statement.kind, StatementKind::Update | StatementKind::Delete) {
        println!("  {} {}", "WHERE:".dimmed(), if statement.has_where { "yes".green() } else { "no".red() });
    }
}

fn show_codes() {
    println!("{}", "sqlwarden finding codes".cyan().bold());
    println!();
    println!(
        "{:22} {:9} {}",
        "Code".white().bold(),
        "Severity".white().bold(),
        "Meaning".white().bold()
    );
    println!("{}", "─".repeat(80).dimmed());

    for code in FindingCode::ALL {
        let severity = match code.severity() {
            Severity::Error => "error".red(),
            Severity::Warning => "warning".yellow(),
            Severity::Info => "info".cyan(),
        };
        println!("{:22} {:9} {}", code.as_str().cyan().bold(), severity, code.describe().dimmed());
    }
}
