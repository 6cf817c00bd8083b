use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use gloss_core::{
    Article, Detection, EnrichConfig, Enricher, ExternalEntityLink, GeneratorConfig, HttpGenerator, MemoryStore,
    RelatedCandidate, ReportStatus, RunOptions, SharedContext,
};
use owo_colors::OwoColorize;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Id given to the article read from the command line.
const LOCAL_ARTICLE_ID: &str = "local";

/// Enrich knowledge-base article HTML with summaries, tables and links
#[derive(Parser, Debug)]
#[command(name = "gloss")]
#[command(author = "Gloss Contributors")]
#[command(version)]
#[command(about = "Enrich knowledge-base article HTML", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Print progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report which enrichment elements an article already has
    Inspect {
        /// Local HTML file, or "-" for stdin
        #[arg(value_name = "INPUT")]
        input: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Path prefix that marks links to other articles
        #[arg(long, default_value = "/kb/", value_name = "PREFIX")]
        prefix: String,
    },
    /// Run the enrichment stages over an article and print the report as JSON
    Enrich(EnrichArgs),
}

#[derive(Args, Debug)]
struct EnrichArgs {
    /// Local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Article title (default: file name)
    #[arg(long, value_name = "TITLE")]
    title: Option<String>,

    /// Article category, used to rank related articles
    #[arg(long, value_name = "ID")]
    category: Option<String>,

    /// Article keywords, comma-separated
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    keywords: Vec<String>,

    /// JSON file with an array of related-article candidates
    #[arg(long, value_name = "FILE")]
    related: Option<PathBuf>,

    /// JSON file with an array of approved entity links
    #[arg(long, value_name = "FILE")]
    entities: Option<PathBuf>,

    /// Minimum content length in characters
    #[arg(long, default_value = "5000", value_name = "NUM")]
    min_length: usize,

    /// Compute the report without writing enriched HTML
    #[arg(long)]
    dry_run: bool,

    /// Write enriched HTML to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path prefix for links to other articles
    #[arg(long, default_value = "/kb/", value_name = "PREFIX")]
    prefix: String,

    /// Chat-completions endpoint of the content generator
    #[arg(long, value_name = "URL")]
    generator_url: Option<String>,

    /// Bearer key for the content generator; no summary box is generated without one
    #[arg(long, env = "GLOSS_GENERATOR_KEY", hide_env_values = true, value_name = "KEY")]
    generator_key: Option<String>,

    /// Generator model id
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,
}

/// Print a styled banner for verbose mode
fn print_banner() {
    eprintln!("\n{} {} {}", "Gloss".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Enrich knowledge-base articles".dimmed());
    eprintln!();
}

/// Print a styled step message
fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print a warning message
fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Format file size for display
fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read file: {}", input))
    }
}

fn read_json_list<T: serde::de::DeserializeOwned>(path: Option<&Path>) -> anyhow::Result<Vec<T>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON list in {}", path.display()))
}

fn slug_for(input: &str) -> String {
    Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|_| input != "-")
        .unwrap_or("article")
        .to_string()
}

fn flag(value: bool) -> String {
    if value { "yes".green().to_string() } else { "no".red().to_string() }
}

fn inspect(input: &str, json: bool, prefix: &str, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        print_step(1, 2, &format!("Reading {}", input.bright_white()));
    }
    let html = read_input(input)?;

    if verbose {
        eprintln!("  {} {}", "Size:".dimmed(), format_size(html.len()).bright_white());
        print_step(2, 2, "Detecting enrichment elements");
    }
    let detection = Detection::inspect(&html, prefix);

    if json {
        println!("{}", serde_json::to_string_pretty(&detection)?);
        return Ok(());
    }

    println!("{:<18} {}", "Summary box:", flag(detection.has_summary_box));
    println!("{:<18} {}", "Data table:", flag(detection.has_data_table));
    println!("{:<18} {}", "Internal links:", flag(detection.has_internal_links));
    println!("{:<18} {}", "Related section:", flag(detection.has_related_section));
    println!("{:<18} {}", "Technical lists:", detection.technical_lists);
    Ok(())
}

async fn enrich(args: EnrichArgs, verbose: bool) -> anyhow::Result<()> {
    if verbose {
        print_step(1, 4, &format!("Reading {}", args.input.bright_white()));
    }
    let html = read_input(&args.input)?;
    let slug = slug_for(&args.input);

    let mut article = Article::new(LOCAL_ARTICLE_ID, args.title.clone().unwrap_or_else(|| slug.clone()), slug, html)
        .with_keywords(args.keywords.iter().cloned());
    article.category_id = args.category.clone();

    let context = SharedContext {
        related_pool: read_json_list::<RelatedCandidate>(args.related.as_deref())?,
        entities: read_json_list::<ExternalEntityLink>(args.entities.as_deref())?,
    };

    if verbose {
        eprintln!("  {} {}", "Size:".dimmed(), format_size(article.content.len()).bright_white());
        eprintln!("  {} {}", "Title:".dimmed(), article.title.bright_white());
        eprintln!(
            "  {} {} related, {} entities",
            "Context:".dimmed(),
            context.related_pool.len().bright_white(),
            context.entities.len().bright_white()
        );
        eprintln!();
        print_step(2, 4, "Configuring generator");
    }

    let generator = match args.generator_key.filter(|k| !k.trim().is_empty()) {
        Some(api_key) => {
            let defaults = GeneratorConfig::default();
            let config = GeneratorConfig {
                api_url: args.generator_url.unwrap_or(defaults.api_url),
                api_key,
                model: args.model.unwrap_or(defaults.model),
                ..GeneratorConfig::default()
            };
            Some(HttpGenerator::new(config).context("Invalid generator configuration")?)
        }
        None => {
            if verbose {
                print_warning("No generator key; summary box will be skipped");
            }
            None
        }
    };

    let store = MemoryStore::new();
    store.insert(article.clone())?;
    let config = EnrichConfig::builder().article_prefix(args.prefix).min_length(args.min_length).build();
    let enricher = Enricher::new(config, store, generator);

    if verbose {
        print_step(3, 4, "Running enrichment stages");
    }
    let options = RunOptions { min_length: args.min_length, dry_run: args.dry_run };
    let report = enricher.enrich_article(&article, &context, options).await;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if verbose {
        print_step(4, 4, "Writing output");
    }

    if report.status == ReportStatus::Error {
        anyhow::bail!("Enrichment failed: {}", report.error.as_deref().unwrap_or("unknown error"));
    }
    if args.dry_run || report.status != ReportStatus::Success {
        return Ok(());
    }

    let enriched = enricher.store().article(LOCAL_ARTICLE_ID)?.context("Enriched article missing from store")?;
    match args.output {
        Some(path) => {
            fs::write(&path, enriched.content)
                .with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => print_warning("No --output given; enriched HTML was not saved"),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        print_banner();
    }

    match cli.command {
        Command::Inspect { input, json, prefix } => inspect(&input, json, &prefix, cli.verbose),
        Command::Enrich(args) => enrich(args, cli.verbose).await,
    }
}
