//! `rfpflow` daemon and admin commands.
//!
//! Without a subcommand the binary polls the configured inbox until
//! interrupted. The remaining subcommands operate on the same database.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rfpflow::ai::{AiService, GeminiClient};
use rfpflow::config::{load_config, AppConfig, LogFormat, LoggingConfig};
use rfpflow::db::{rfp_repo, vendor_repo, Database};
use rfpflow::email::{
    build_smtp_transport, poller, Correlator, InboundProcessor, MailboxPoller, RfpMailer,
};
use rfpflow::proposal::{compare_proposals, ProposalBuilder};
use rfpflow::{ConfigError, Result};

#[derive(Parser)]
#[command(name = "rfpflow", about = "Collects and scores vendor replies to RFPs", version)]
struct Cli {
    /// YAML config file. Environment variables are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the inbox until interrupted (the default).
    Run,

    /// Scan the inbox once and print the summary.
    Check,

    /// Manage the vendor directory.
    Vendor {
        #[command(subcommand)]
        action: VendorAction,
    },

    /// Create, list and send RFPs.
    Rfp {
        #[command(subcommand)]
        action: RfpAction,
    },

    /// List the proposals received for an RFP.
    Proposals { rfp_id: String },

    /// Score the proposals of an RFP with the LLM.
    Compare { rfp_id: String },
}

#[derive(Subcommand)]
enum VendorAction {
    Add { name: String, email: String },
    List,
}

#[derive(Subcommand)]
enum RfpAction {
    /// Structure a free-text request with the LLM and store it.
    Create {
        description: String,
        /// Keep the RFP as a draft until it is first sent.
        #[arg(long)]
        draft: bool,
    },
    List,
    /// Email the RFP to the given vendors.
    Send {
        rfp_id: String,
        #[arg(required = true)]
        vendor_ids: Vec<String>,
    },
    /// Render the email without sending it.
    Preview { rfp_id: String },
}

fn read_config(path: Option<&PathBuf>) -> std::result::Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => AppConfig::from_env(),
    }
}

fn init_tracing(
    config: &LoggingConfig,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_log::LogTracer::init()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

fn open_database(config: &AppConfig) -> Result<Database> {
    let path = config
        .database
        .resolved_path()
        .ok_or_else(|| ConfigError::Validation {
            message: "database.path is not set and the home directory is unknown".to_string(),
        })?;
    Ok(Database::open(&path)?)
}

fn ai_service(config: &AppConfig) -> Result<Arc<AiService>> {
    let client = GeminiClient::from_config(&config.llm)?;
    info!(model = %client.model(), "LLM client ready");
    Ok(Arc::new(AiService::new(client)))
}

fn mailer(config: &AppConfig, db: Database, ai: Arc<AiService>) -> Result<RfpMailer> {
    let smtp = config.smtp.as_ref().ok_or_else(|| ConfigError::Validation {
        message: "an smtp section is required to send RFPs".to_string(),
    })?;
    let transport = build_smtp_transport(smtp)?;
    Ok(RfpMailer::new(db, Arc::new(transport), ai, &smtp.from)?)
}

async fn mailbox_poller(config: &AppConfig, db: &Database, ai: Arc<AiService>) -> MailboxPoller {
    let processor = InboundProcessor::new(
        Correlator::new(db.clone()),
        ProposalBuilder::new(db.clone(), ai),
    );
    MailboxPoller::connect(config.mailbox.as_ref(), processor).await
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| ConfigError::Validation {
        message: format!("failed to render output: {}", e),
    })?;
    println!("{}", text);
    Ok(())
}

async fn run_daemon(config: &AppConfig, db: &Database) -> Result<()> {
    let ai = ai_service(config)?;
    let scanner = Arc::new(mailbox_poller(config, db, ai).await);
    if !scanner.is_enabled() {
        warn!("email polling is disabled, nothing to do");
    }

    let signal = Arc::clone(&scanner);
    ctrlc::set_handler(move || {
        info!("shutdown requested");
        signal.stop();
    })?;

    if let Err(e) = poller::spawn(scanner).await {
        error!(error = %e, "polling task aborted");
    }
    Ok(())
}

async fn execute(command: Command, config: &AppConfig, db: &Database) -> Result<()> {
    match command {
        Command::Run => run_daemon(config, db).await,
        Command::Check => {
            let ai = ai_service(config)?;
            let scanner = mailbox_poller(config, db, ai).await;
            let summary = scanner.check_now().await;
            scanner.disconnect().await;
            print_json(&summary)
        }
        Command::Vendor { action } => match action {
            VendorAction::Add { name, email } => {
                print_vendor(&vendor_repo::insert(db, &name, &email, None)?);
                Ok(())
            }
            VendorAction::List => {
                for vendor in vendor_repo::list(db)? {
                    print_vendor(&vendor);
                }
                Ok(())
            }
        },
        Command::Rfp { action } => match action {
            RfpAction::Create { description, draft } => {
                let structured = ai_service(config)?
                    .generate_structured_rfp(&description)
                    .await?;
                let rfp = rfp_repo::insert(db, &description, &structured, draft)?;
                println!("{}", rfp.id);
                print_json(&rfp.structured_data)
            }
            RfpAction::List => {
                for rfp in rfp_repo::list(db)? {
                    let state = if rfp.is_draft { "draft" } else { "sent" };
                    println!("{}  {}  {}  {}", rfp.id, state, rfp.created_at, rfp.description_raw);
                }
                Ok(())
            }
            RfpAction::Send { rfp_id, vendor_ids } => {
                let mailer = mailer(config, db.clone(), ai_service(config)?)?;
                print_json(&mailer.send_rfp_to_vendors(&rfp_id, &vendor_ids).await?)
            }
            RfpAction::Preview { rfp_id } => {
                let mailer = mailer(config, db.clone(), ai_service(config)?)?;
                print_json(&mailer.preview(&rfp_id).await?)
            }
        },
        Command::Proposals { rfp_id } => {
            let builder = ProposalBuilder::new(db.clone(), ai_service(config)?);
            for proposal in builder.list_for_rfp(&rfp_id)? {
                println!(
                    "{}  vendor={}  score={}",
                    proposal.id,
                    proposal.vendor_id,
                    proposal
                        .score
                        .map(|s| format!("{:.0}", s))
                        .unwrap_or_else(|| "-".to_string())
                );
            }
            Ok(())
        }
        Command::Compare { rfp_id } => {
            let ai = ai_service(config)?;
            print_json(&compare_proposals(db, ai.as_ref(), &rfp_id).await?)
        }
    }
}

fn print_vendor(vendor: &vendor_repo::VendorRow) {
    println!("{}  {}  <{}>", vendor.id, vendor.name, vendor.email);
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match read_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rfpflow: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config.logging) {
        eprintln!("rfpflow: failed to initialize logging: {}", e);
    }

    info!("Starting rfpflow v{}", env!("CARGO_PKG_VERSION"));

    let result = match open_database(&config) {
        Ok(db) => execute(cli.command.unwrap_or(Command::Run), &config, &db).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "rfpflow failed");
            eprintln!("rfpflow: {}", e);
            ExitCode::FAILURE
        }
    }
}
