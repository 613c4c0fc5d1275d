use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use sense_core::{
    BatchOrchestrator, BatchState, ExportFormat, InputFile, Summary, read_csv, write_export,
};
use sense_extract::{Extractor, ExtractorSettings, Provider};
use sense_ingest::{PdftoppmRasterizer, input_file_from_path};

mod auth;
mod config;
mod logging;
mod report;
mod state;

use report::{FileTable, SummaryReport, TransactionList};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("STATEMENTSENSE_BUILD_SHA"),
    ")"
);

#[derive(Parser, Debug)]
#[command(
    name = "statementsense",
    version = VERSION,
    about = "Extract, summarize and export transactions from bank statements"
)]
struct Cli {
    /// Debug logging on stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract transactions from statement PDFs/images and summarize them
    Analyze {
        /// Statement files, processed in the given order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// gemini | openai (default: llm.provider from config)
        #[arg(long)]
        provider: Option<String>,

        /// Model name (default: llm.model or the provider default)
        #[arg(long)]
        model: Option<String>,

        /// Directory for export files (default: export.dir)
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Skip the CSV export
        #[arg(long)]
        no_csv: bool,

        /// Also write a JSON export
        #[arg(long)]
        json: bool,

        /// Number of transactions to print (default: 20)
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Summarize a previously exported CSV
    Summarize {
        csv: PathBuf,

        /// Number of transactions to print (default: 20)
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Manage ~/.statementsense/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store API keys in ~/.statementsense/auth.json
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste a Gemini API key
    PasteGeminiKey,
    /// Paste an OpenAI API key
    PasteOpenaiKey,
}

struct AnalyzeArgs {
    files: Vec<PathBuf>,
    provider: Option<String>,
    model: Option<String>,
    export_dir: Option<PathBuf>,
    no_csv: bool,
    json: bool,
    limit: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze {
            files,
            provider,
            model,
            export_dir,
            no_csv,
            json,
            limit,
        } => {
            analyze(AnalyzeArgs {
                files,
                provider,
                model,
                export_dir,
                no_csv,
                json,
                limit,
            })
            .await?;
        }

        Command::Summarize { csv, limit } => {
            summarize(&csv, limit)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config()?,
        },

        Command::Auth { command } => match command {
            AuthCommand::PasteGeminiKey => auth::paste_gemini_key()?,
            AuthCommand::PasteOpenaiKey => auth::paste_openai_key()?,
        },
    }

    Ok(())
}

async fn analyze(args: AnalyzeArgs) -> Result<()> {
    let files: Vec<InputFile> = args
        .files
        .iter()
        .map(input_file_from_path)
        .collect::<Result<_>>()?;

    let cfg = config::load_config()?;
    let settings = extractor_settings(&cfg.llm, args.provider.as_deref(), args.model)?;
    let extractor = Extractor::from_settings(&settings)?;
    let rasterizer = PdftoppmRasterizer::new(cfg.render.options());

    tracing::info!(
        files = files.len(),
        provider = %extractor.provider(),
        model = extractor.model(),
        "starting batch"
    );

    let orchestrator = BatchOrchestrator::new(rasterizer, extractor);
    let mut state = BatchState::new();
    let result = orchestrator
        .run_batch(&files, &mut state, |event, snapshot| {
            if let Some(line) = report::progress_line(event, snapshot) {
                eprintln!("{line}");
            }
        })
        .await;

    println!("{}", FileTable(state.files()));

    let report = result?;

    let summary = Summary::from_transactions(&report.transactions);
    println!("{}", SummaryReport(&summary));
    println!(
        "{}",
        TransactionList {
            transactions: &report.transactions,
            limit: args.limit,
        }
    );

    let export_dir = args.export_dir.unwrap_or_else(|| cfg.export.dir.clone());
    let date = cfg.export.export_date(chrono::Utc::now())?;
    let mut formats = Vec::new();
    if cfg.export.csv && !args.no_csv {
        formats.push(ExportFormat::Csv);
    }
    if cfg.export.json || args.json {
        formats.push(ExportFormat::Json);
    }
    for format in formats {
        if let Some(path) = write_export(&export_dir, format, &report.transactions, date)? {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

/// Provider, model and endpoint from flags over config over provider defaults.
/// Model and base URL from config only apply to the configured provider.
fn extractor_settings(
    llm: &config::LlmSection,
    provider_flag: Option<&str>,
    model_flag: Option<String>,
) -> Result<ExtractorSettings> {
    let configured: Provider = llm.provider.parse().context("llm.provider in config")?;
    let provider = match provider_flag {
        Some(p) => p.parse::<Provider>()?,
        None => configured,
    };

    let api_key = auth::resolve_api_key(provider)?.unwrap_or_default();
    let mut settings = ExtractorSettings::new(provider, api_key);
    settings.timeout = llm.timeout();
    settings.temperature = llm.temperature;

    if provider == configured {
        if let Some(model) = &llm.model {
            settings.model = model.clone();
        }
        if let Some(url) = &llm.base_url {
            settings.base_url = url.clone();
        }
    }
    if let Some(model) = model_flag {
        settings.model = model;
    }

    Ok(settings)
}

fn summarize(csv: &Path, limit: usize) -> Result<()> {
    if !csv.exists() {
        bail!("CSV not found: {}", csv.display());
    }

    let txns = read_csv(csv)?;
    println!("Read {} transactions from {}\n", txns.len(), csv.display());

    let summary = Summary::from_transactions(&txns);
    println!("{}", SummaryReport(&summary));
    println!(
        "{}",
        TransactionList {
            transactions: &txns,
            limit,
        }
    );
    Ok(())
}
