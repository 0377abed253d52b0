use clap::{Parser, Subcommand};
use locksall::application::batch::BatchActuator;
use locksall::application::early_access::EarlyAccessList;
use locksall::config::{DEFAULT_STORAGE_PATH, Settings};
use locksall::domain::early_access::ClientInfo;
use locksall::infrastructure::in_memory::{AuditLog, CardRegistry};
use locksall::infrastructure::json_file::JsonFileRepository;
use locksall::infrastructure::session::SharedSecretVerifier;
use locksall::infrastructure::simulator::ProviderSimulator;
use locksall::interfaces::api::{ApiResponse, PrototypeApi};
use locksall::interfaces::csv::entry_writer::EntryWriter;
use miette::{IntoDiagnostic, Result, miette};
use serde_json::json;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Early-access list location
    #[arg(long, env = "EARLY_ACCESS_STORAGE_PATH", default_value = DEFAULT_STORAGE_PATH)]
    storage_path: PathBuf,

    /// Shared secret accepted as a valid session. Without it nobody is authenticated.
    #[arg(long, env = "LOCKSALL_SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    /// Session token presented by this caller
    #[arg(long, env = "LOCKSALL_SESSION", hide_env_values = true)]
    session: Option<String>,

    /// Seed for the provider simulator, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Block every linked card
    BlockAll,
    /// Unblock every linked card (requires a session)
    UnblockAll,
    /// Print cards and the audit trail (requires a session)
    State,
    /// Block all, unblock all, then print the state
    Demo,
    /// Add an email to the early-access list
    Signup {
        email: String,
        /// Caller IP address
        #[arg(long)]
        ip: Option<String>,
        /// Caller user agent
        #[arg(long)]
        user_agent: Option<String>,
    },
    /// Print the early-access list as JSON (requires a session)
    Signups,
    /// Export the early-access list as CSV
    Export,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(if cli.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let settings = Settings {
        storage_path: cli.storage_path,
        session_secret: cli.session_secret,
        seed: cli.seed,
    };

    let simulator = match settings.seed {
        Some(seed) => ProviderSimulator::seeded(seed),
        None => ProviderSimulator::from_entropy(),
    };
    let actuator = BatchActuator::new(
        CardRegistry::seeded(),
        AuditLog::new(),
        Arc::new(simulator),
    );
    let early_access = EarlyAccessList::spawn(Box::new(JsonFileRepository::new(
        settings.storage_path.clone(),
    )));
    let api = PrototypeApi::new(
        actuator,
        early_access.clone(),
        Box::new(SharedSecretVerifier::new(settings.session_secret.clone())),
    );

    let session = cli.session.as_deref();
    let response = match cli.command {
        Command::BlockAll => api.block_all().await,
        Command::UnblockAll => api.unblock_all(session).await,
        Command::State => api.state(session).await,
        Command::Demo => {
            let steps = [
                ("blockAll", api.block_all().await),
                ("unblockAll", api.unblock_all(session).await),
                ("state", api.state(session).await),
            ];
            let status = steps
                .iter()
                .map(|(_, r)| r.status)
                .max()
                .unwrap_or(200);
            let body = steps
                .into_iter()
                .map(|(name, r)| (name.to_string(), r.body))
                .collect::<serde_json::Map<_, _>>();
            ApiResponse {
                status,
                body: body.into(),
            }
        }
        Command::Signup {
            email,
            ip,
            user_agent,
        } => {
            let client = ClientInfo::from_headers(None, ip.as_deref(), user_agent.as_deref());
            api.signup(&json!({ "email": email }), client).await
        }
        Command::Signups => api.list_signups(session).await,
        Command::Export => {
            let entries = early_access.entries().await.into_diagnostic()?;
            let stdout = io::stdout();
            let mut writer = EntryWriter::new(stdout.lock());
            writer.write_entries(&entries).into_diagnostic()?;
            return Ok(());
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&response.body).into_diagnostic()?
    );

    if response.is_success() {
        Ok(())
    } else {
        Err(miette!("request failed with status {}", response.status))
    }
}
