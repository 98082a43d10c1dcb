//! Workflow Specs CLI Entry Point
//!
//! Provides command-line access to the spec catalog.
//!
//! # Usage
//!
//! ```bash
//! # List every loaded workflow
//! workflow-specs list
//!
//! # Recommend workflows for a task
//! workflow-specs recommend fix the login crash
//!
//! # Validate all loaded documents, or a single file
//! workflow-specs validate
//! workflow-specs validate specs/development/dev.toml
//!
//! # Build a chain from spec towards review
//! workflow-specs chain spec review --max 4
//!
//! # Follow each document's own on_complete links two levels deep
//! workflow-specs flow spec --depth 2
//!
//! # Machine-readable output
//! workflow-specs --json search security
//! ```

use std::env;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use colored::Colorize;
use log::info;
use serde::Serialize;

use workflow_specs::spec::{
    validate_directory, validate_file, SpecSummary, ValidationStatus, ValidationSummary,
};
use workflow_specs::index::lineage::{format_walk, DEFAULT_WALK_DEPTH};
use workflow_specs::triggers::{format_chain, DEFAULT_MAX_CHAIN_LENGTH};
use workflow_specs::{SpecCatalog, SpecDocument, SpecsConfig, ValidationReport, APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug)]
struct Config {
    specs_dir: Option<PathBuf>,
    triggers_file: Option<PathBuf>,
    json: bool,
    verbose: bool,
    max_chain_length: usize,
    depth: usize,
    command: Option<String>,
    args: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            specs_dir: None,
            triggers_file: None,
            json: false,
            verbose: false,
            max_chain_length: DEFAULT_MAX_CHAIN_LENGTH,
            depth: DEFAULT_WALK_DEPTH,
            command: None,
            args: Vec::new(),
        }
    }
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: workflow-specs [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("Commands:");
    println!("  list                       List every loaded workflow");
    println!("  categories                 Workflow names grouped by category");
    println!("  category <NAME>            Workflows in one category");
    println!("  show <NAME>                Summary of a workflow");
    println!("  metadata <NAME>            Constraints, modes, output directory and triggers");
    println!("  phases <NAME>              Phases of a workflow");
    println!("  prompt <NAME>              Full prompt of a workflow");
    println!("  search <QUERY>             Search names, descriptions and tags");
    println!("  recommend <TASK...>        Recommend workflows for a task");
    println!("  validate [NAME|PATH]       Validate loaded workflows, one by name, or files");
    println!("  chain <START> [END]        Build a chain by following suggestions");
    println!("  chains                     List predefined chains");
    println!("  flow <START>               Follow each workflow's own on_complete links");
    println!("  provides <OUTPUT>          Workflows declaring an output");
    println!("  compare <A> <B>            Compare two workflows");
    println!("  summary                    Quick reference guide");
    println!();
    println!("Options:");
    println!("  --specs-dir PATH    Specs root (default: $WORKFLOW_SPECS_DIR or ./specs)");
    println!("  --triggers PATH     Trigger document (default: <specs-dir>/_common/workflow-triggers.toml)");
    println!("  --max N             Maximum chain length (default: {})", DEFAULT_MAX_CHAIN_LENGTH);
    println!("  --depth N           Levels walked by flow (default: {})", DEFAULT_WALK_DEPTH);
    println!("  --json              Print results as JSON");
    println!("  --verbose           Enable debug logging");
    println!("  --help              Show this help message");
    println!("  --version           Show version information");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--json" => {
                config.json = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--specs-dir" => {
                i += 1;
                if i >= args.len() {
                    return Err("--specs-dir requires a path argument".to_string());
                }
                config.specs_dir = Some(PathBuf::from(&args[i]));
            }
            "--triggers" => {
                i += 1;
                if i >= args.len() {
                    return Err("--triggers requires a path argument".to_string());
                }
                config.triggers_file = Some(PathBuf::from(&args[i]));
            }
            "--max" => {
                i += 1;
                if i >= args.len() {
                    return Err("--max requires a number argument".to_string());
                }
                config.max_chain_length = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid max value: {}", args[i]))?;
            }
            "--depth" => {
                i += 1;
                if i >= args.len() {
                    return Err("--depth requires a number argument".to_string());
                }
                config.depth = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid depth value: {}", args[i]))?;
            }
            arg if arg.starts_with("--") => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                if config.command.is_none() {
                    config.command = Some(arg.clone());
                } else {
                    config.args.push(arg.clone());
                }
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn required_arg<'a>(config: &'a Config, index: usize, what: &str) -> Result<&'a str, String> {
    config
        .args
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing argument: {}", what))
}

/// Prints documents as a listing, or their summaries as JSON.
fn print_documents(docs: &[&SpecDocument], json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        let summaries: Vec<SpecSummary> = docs.iter().map(|d| d.summary()).collect();
        return print_json(&summaries);
    }

    if docs.is_empty() {
        println!("No workflows found");
        return Ok(());
    }

    for doc in docs {
        println!(
            "{:<16} {:<16} {}",
            doc.name.bold(),
            doc.category.to_string().dimmed(),
            doc.description
        );
    }
    Ok(())
}

fn print_report(label: &str, report: &ValidationReport, verbose: bool) {
    let status = report.status();
    let status_text = match status {
        ValidationStatus::Valid => status.to_string().green(),
        ValidationStatus::ValidWithWarnings => status.to_string().yellow(),
        ValidationStatus::Invalid => status.to_string().red(),
    };
    println!("{}: {}", label.bold(), status_text);

    for message in &report.errors {
        println!("  {} {}", "✗".red(), message);
    }
    for message in &report.warnings {
        println!("  {} {}", "!".yellow(), message);
    }
    if verbose {
        for message in &report.info {
            println!("  {} {}", "✓".green(), message);
        }
    }
}

#[derive(Serialize)]
struct LabeledReport<'a> {
    name: String,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

/// Prints a batch of reports with totals. Fails if any report is invalid.
fn finish_validation(
    results: &[(String, ValidationReport)],
    config: &Config,
) -> Result<(), Box<dyn Error>> {
    let summary = ValidationSummary::from_reports(results.iter().map(|(_, r)| r));

    if config.json {
        let reports: Vec<LabeledReport> = results
            .iter()
            .map(|(name, report)| LabeledReport {
                name: name.clone(),
                report,
            })
            .collect();
        print_json(&reports)?;
    } else {
        for (name, report) in results {
            print_report(name, report, config.verbose);
        }
        if results.len() > 1 {
            println!();
            println!(
                "{} checked: {} valid, {} invalid ({} errors, {} warnings)",
                summary.files, summary.valid, summary.invalid, summary.errors, summary.warnings
            );
        }
    }

    if summary.invalid > 0 {
        return Err(format!("{} of {} failed validation", summary.invalid, summary.files).into());
    }
    Ok(())
}

fn run_validate(catalog: &SpecCatalog, config: &Config) -> Result<(), Box<dyn Error>> {
    let results: Vec<(String, ValidationReport)> = match config.args.first() {
        None => catalog.validate_all(),
        Some(target) if Path::new(target).is_dir() => validate_directory(Path::new(target))
            .into_iter()
            .map(|(path, report)| (path.display().to_string(), report))
            .collect(),
        Some(target) if Path::new(target).is_file() => {
            vec![(target.clone(), validate_file(Path::new(target)))]
        }
        Some(name) => vec![(name.clone(), catalog.validate(name)?)],
    };

    if results.is_empty() {
        println!("No workflows to validate");
        return Ok(());
    }
    finish_validation(&results, config)
}

fn run_recommend(catalog: &SpecCatalog, config: &Config) -> Result<(), Box<dyn Error>> {
    let task = config.args.join(" ");
    if task.trim().is_empty() {
        return Err("Missing argument: task description".into());
    }

    let recommendations = catalog.recommend(&task);
    let words: Vec<String> = task
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    let chain = catalog.triggers().find_chain_for_task(words.as_slice());

    if config.json {
        #[derive(Serialize)]
        struct Output<'a> {
            recommendations: &'a [workflow_specs::Recommendation],
            chain: Option<&'a workflow_specs::NamedChain>,
        }
        return print_json(&Output {
            recommendations: &recommendations,
            chain,
        });
    }

    if recommendations.is_empty() {
        println!("No matching workflow found for: {}", task);
    } else {
        println!("Recommended workflows for: {}", task.bold());
        for (rank, rec) in recommendations.iter().enumerate() {
            let description = catalog
                .get(&rec.name)
                .map(|d| d.description.as_str())
                .unwrap_or_default();
            println!("  {}. {} (score {}) {}", rank + 1, rec.name.bold(), rec.score, description);
        }
    }

    if let Some(chain) = chain {
        println!();
        println!("Suggested chain '{}': {}", chain.name, format_chain(chain));
    }
    Ok(())
}

fn run_chain(catalog: &SpecCatalog, config: &Config) -> Result<(), Box<dyn Error>> {
    let start = required_arg(config, 0, "chain start")?;
    let end = config.args.get(1).map(String::as_str);
    let chain = catalog.build_chain(start, end, config.max_chain_length);

    if config.json {
        return print_json(&chain);
    }

    println!("{}", chain.join(" → "));
    if let Some(end) = end {
        if chain.last().map(String::as_str) != Some(end) {
            info!("Chain did not reach '{}'", end);
            println!("{}", format!("(did not reach '{}')", end).dimmed());
        }
    }
    Ok(())
}

fn run_command(catalog: &SpecCatalog, config: &Config) -> Result<(), Box<dyn Error>> {
    let Some(command) = config.command.as_deref() else {
        print_usage();
        return Err("No command given".into());
    };

    match command {
        "list" => {
            let docs: Vec<&SpecDocument> = catalog.collection().specs().iter().collect();
            print_documents(&docs, config.json)
        }
        "categories" => {
            let categories = catalog.categories();
            if config.json {
                return print_json(&categories);
            }
            for (category, names) in &categories {
                println!("{} ({})", category.title().bold(), names.len());
                for name in names {
                    println!("  {}", name);
                }
            }
            Ok(())
        }
        "category" => {
            let name = required_arg(config, 0, "category name")?;
            print_documents(&catalog.by_category(name)?, config.json)
        }
        "show" => {
            let doc = catalog.require(required_arg(config, 0, "workflow name")?)?;
            if config.json {
                return print_json(&doc.summary());
            }
            print!("{}", doc.render_summary());
            let next = catalog.triggers().suggested_next(&doc.name);
            if !next.is_empty() {
                println!("\n## Suggested Next\n{}", next.join(", "));
            }
            Ok(())
        }
        "metadata" => {
            let meta = catalog.metadata(required_arg(config, 0, "workflow name")?)?;
            if config.json {
                return print_json(&meta);
            }
            print!("{}", meta.render());
            Ok(())
        }
        "phases" => {
            let doc = catalog.require(required_arg(config, 0, "workflow name")?)?;
            if config.json {
                return print_json(&doc.phases);
            }
            for phase in &doc.phases {
                println!("{}. {}", phase.number, phase.name);
            }
            Ok(())
        }
        "prompt" => {
            let doc = catalog.require(required_arg(config, 0, "workflow name")?)?;
            if config.json {
                return print_json(&doc.prompt);
            }
            println!("{}", doc.prompt);
            Ok(())
        }
        "search" => {
            let query = required_arg(config, 0, "search query")?;
            print_documents(&catalog.search(query), config.json)
        }
        "recommend" => run_recommend(catalog, config),
        "validate" => run_validate(catalog, config),
        "chain" => run_chain(catalog, config),
        "chains" => {
            let chains = catalog.triggers().all_named_chains();
            if config.json {
                return print_json(chains);
            }
            if chains.is_empty() {
                println!("No predefined chains loaded");
            }
            for chain in chains {
                println!("{}: {}", chain.name.bold(), format_chain(chain));
            }
            Ok(())
        }
        "flow" => {
            let start = required_arg(config, 0, "start workflow")?;
            let chain = catalog.workflow_chain(start, config.depth)?;
            if config.json {
                return print_json(&chain);
            }
            print!("{}", format_walk(&chain));
            Ok(())
        }
        "provides" => {
            let output = required_arg(config, 0, "output")?;
            let found = catalog.find_providing(output);
            if config.json {
                return print_json(&found);
            }
            if found.is_empty() {
                println!("No workflows provide '{}'", output);
            }
            for item in &found {
                println!(
                    "{} ({}) matched '{}': {}",
                    item.spec.bold(),
                    item.category,
                    item.matched,
                    item.provides.join(", ")
                );
            }
            Ok(())
        }
        "compare" => {
            let a = required_arg(config, 0, "first workflow")?;
            let b = required_arg(config, 1, "second workflow")?;
            println!("{}", catalog.compare(a, b)?);
            Ok(())
        }
        "summary" => {
            println!("{}", catalog.quick_reference());
            Ok(())
        }
        other => {
            print_usage();
            Err(format!("Unknown command: {}", other).into())
        }
    }
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();

    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    setup_logging(config.verbose);

    let mut specs_config = SpecsConfig::resolve(config.specs_dir.as_deref());
    if let Some(ref triggers) = config.triggers_file {
        specs_config = specs_config.with_triggers_file(triggers);
    }
    info!("Specs directory: {}", specs_config.specs_dir.display());

    let catalog = SpecCatalog::load(&specs_config);
    if catalog.collection().is_empty() {
        info!("No workflows loaded from {}", catalog.specs_dir().display());
    }

    run_command(&catalog, &config)
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
