use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod auth;
mod batch;
mod config;
mod driver;
mod error;
mod filter;
mod form;
mod ledger;
mod mapper;
mod models;
mod page;
mod prompt;
mod report;
mod topics;
mod webdriver;

use auth::{CredentialProvider, TokenFileProvider};
use batch::BatchRunner;
use config::Config;
use driver::DriverConfig;
use ledger::{CsvLedger, LedgerSource, RowWindow, SheetsLedger};
use models::{DateRange, SessionRecord};
use prompt::{Prompt, TerminalPrompt};
use webdriver::WebDriverPage;

#[derive(Parser)]
#[command(name = "tutor-eval")]
#[command(about = "Fill the tutor eval form from the session tracker", long_about = None)]
struct Cli {
    /// TOML config file (defaults to ./tutor-eval.toml when present)
    #[arg(long, global = true, env = "TUTOR_EVAL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LedgerArgs {
    /// First session date (YYYY-MM-DD); prompted for when omitted
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Last session date (YYYY-MM-DD); prompted for when omitted
    #[arg(long)]
    end: Option<NaiveDate>,
    /// Read a CSV export of the session tracker instead of Google Sheets
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Stored Google credentials
    #[arg(long, env = "TUTOR_EVAL_TOKEN", default_value = "token.json")]
    token: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill one eval form per session in the date range
    Run {
        #[command(flatten)]
        ledger: LedgerArgs,
        /// WebDriver endpoint (chromedriver, geckodriver)
        #[arg(long, env = "WEBDRIVER_URL")]
        webdriver_url: Option<String>,
        /// Write a markdown summary of the batch
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Show what would be entered for each session without opening the form
    Preview {
        #[command(flatten)]
        ledger: LedgerArgs,
    },
    /// Print the topic tags recognized in a piece of text
    Classify { text: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutor_eval=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let mut prompt = TerminalPrompt::stdio();

    match cli.command {
        Commands::Run {
            ledger,
            webdriver_url,
            report: report_path,
        } => {
            let range = resolve_range(&ledger, &mut prompt)?;
            let rows = fetch_rows(&config, &ledger).await?;

            let webdriver_url = webdriver_url.unwrap_or_else(|| config.webdriver_url.clone());
            let mut page = WebDriverPage::connect(&webdriver_url)
                .await
                .context("failed to start a WebDriver session")?;

            let driver_config = DriverConfig::from_config(&config);
            let summary = BatchRunner::new(&mut page, &mut prompt, &driver_config)
                .run(&rows, &range)
                .await?;

            if summary.is_empty() {
                println!("No sessions found for this range.");
            } else {
                println!(
                    "Filled {} of {} sessions ({} skipped, {} abandoned).",
                    summary.submitted(),
                    summary.results.len(),
                    summary.skipped(),
                    summary.abandoned()
                );
            }

            if let Some(out) = report_path {
                std::fs::write(&out, report::build_report(&range, &summary))
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("Report written to {}.", out.display());
            }

            if config.policy.submit {
                page.close().await?;
            } else {
                info!("Browser left open for review; submit each tab manually.");
            }
        }
        Commands::Preview { ledger } => {
            let range = resolve_range(&ledger, &mut prompt)?;
            let rows = fetch_rows(&config, &ledger).await?;
            let sessions = filter::filter_by_range(&rows, &range);

            if sessions.is_empty() {
                println!("No sessions found for this range.");
                return Ok(());
            }

            for record in &sessions {
                match mapper::map_session(record, config.ledger.clock) {
                    Ok(mapped) => {
                        let tags: Vec<&str> = mapped.topics.iter().map(|t| t.slug()).collect();
                        println!(
                            "- {}: {} <{}> {:?}, b2b {}, prework {}, topics [{}]",
                            mapped.label,
                            mapped.form_name,
                            mapped.email,
                            mapped.attendance,
                            mapped.back_to_back,
                            mapped.prework,
                            tags.join(", ")
                        );
                    }
                    Err(err) => println!("- {}: would be skipped, {}", record.label(), err),
                }
            }
        }
        Commands::Classify { text } => {
            let tags = topics::classify(Some(&text));
            if tags.is_empty() {
                println!("No topics recognized.");
            }
            for tag in tags {
                println!("- {} ({})", tag.label(), tag.slug());
            }
        }
    }

    Ok(())
}

fn resolve_range(args: &LedgerArgs, prompt: &mut dyn Prompt) -> anyhow::Result<DateRange> {
    match (args.start, args.end) {
        (Some(start), Some(end)) => Ok(DateRange::new(start, end)?),
        (Some(start), None) => Ok(DateRange::single(start)),
        (None, end) => {
            if end.is_some() {
                warn!("--end without --start is ignored");
            }
            prompt::prompt_date_range(prompt, Local::now().date_naive())
        }
    }
}

/// Load every ledger row. Missing credentials, a failed fetch, or an empty
/// ledger end the run before any session is touched.
async fn fetch_rows(config: &Config, args: &LedgerArgs) -> anyhow::Result<Vec<SessionRecord>> {
    let window = RowWindow::from_config(&config.ledger);

    let raw = match &args.csv {
        Some(path) => CsvLedger::new(path).get_rows(&window).await?,
        None => {
            let spreadsheet_id = config
                .ledger
                .spreadsheet_id
                .as_deref()
                .context("ledger.spreadsheet_id must be set in the config (or pass --csv)")?;
            let client = TokenFileProvider::new(&args.token)
                .authorized_client()
                .await
                .context("failed to authorize with Google")?;
            SheetsLedger::new(client, spreadsheet_id)
                .get_rows(&window)
                .await
                .context("failed to read the session tracker")?
        }
    };

    if raw.is_empty() {
        anyhow::bail!("No data found in {}.", window.a1_range());
    }
    Ok(ledger::decode_rows(&window, &raw))
}
