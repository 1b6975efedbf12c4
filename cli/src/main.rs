//! EnergyFlow command line
//!
//! One-shot commands over the session store and dashboards.
//!
//! ```sh
//! # Sign in (the role comes from the email address)
//! energyflowctl login --email ops-admin@campus.edu --password secret
//!
//! # Who is signed in?
//! energyflowctl whoami
//!
//! # Print five telemetry ticks from the signed-in dashboard
//! energyflowctl watch --ticks 5
//!
//! # Government overview as CSV
//! energyflowctl export-csv --out energy-report.csv
//!
//! # Validate config without doing anything else
//! energyflowctl --check
//! ```

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use energyflow::config::{config_path_from_env, AppConfig};
use energyflow::domain::DomainError;
use energyflow::host::{build_storage, init_tracing};
use energyflow::interfaces::{export_campus_csv, LoginForm};
use energyflow::shared::ShutdownSignal;
use energyflow::{create_event_bus, Dashboard, DashboardKind, SessionStore};

/// EnergyFlow campus renewable-energy monitor.
#[derive(Parser, Debug)]
#[command(
    name = "energyflowctl",
    version,
    about = "Campus renewable-energy monitor",
    long_about = "EnergyFlow: sign in, inspect the live dashboard feed and export \
                  campus reports.\n\n\
                  Default config: ~/.config/energyflow/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "ENERGYFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Sign out and clear the persisted session
    Logout,
    /// Print the signed-in identity as JSON
    Whoami,
    /// Mount the signed-in dashboard and print telemetry ticks
    Watch {
        #[arg(long, default_value_t = 3)]
        ticks: u64,
        /// Override the tick interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },
    /// Ask the dashboard assistant a question and print the transcript
    Ask {
        message: String,
    },
    /// Write the campus KPI table as CSV (government sessions only)
    ExportCsv {
        /// Output file; '-' for stdout
        #[arg(long, default_value = "-")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(config_path_from_env);
    let (mut config, load_error) = if config_path.exists() {
        match AppConfig::load(&config_path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (AppConfig::default(), Some(e)),
        }
    } else {
        (AppConfig::default(), None)
    };

    // ── Apply CLI overrides ────────────────────────────────────
    apply_overrides(&cli, &mut config);
    init_tracing(&config.logging);

    if let Some(e) = load_error {
        error!("Failed to load config from {}: {}", config_path.display(), e);
        if cli.check {
            return Err(e.into());
        }
        error!("Using default configuration.");
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file   : {}", config_path.display());
        println!("   Session store : {:?}", config.session.storage);
        println!("   Storage dir   : {}", config.session.resolved_storage_dir().display());
        println!("   Tick interval : {}ms", config.telemetry.interval().as_millis());
        println!("   Log level     : {}", config.logging.level);
        return Ok(());
    }

    let Some(command) = cli.command else {
        eprintln!("No command given; see --help");
        return Ok(());
    };

    let store = SessionStore::from_config(build_storage(&config.session), &config.session);
    store.initialize().await;

    match command {
        Command::Login { email, password } => {
            if let Some(current) = store.current_identity().await {
                return Err(format!("already signed in as {}; run logout first", current.email).into());
            }
            let identity = LoginForm::new(email, password).submit(&store).await?;
            info!("Signed in as {}", identity.email);
            println!("Signed in as {} ({})", identity.name, identity.role);
        }
        Command::Logout => {
            store.logout().await;
            println!("Signed out");
        }
        Command::Whoami => match store.current_identity().await {
            Some(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
            None => println!("Not signed in"),
        },
        Command::Watch { ticks, interval_ms } => {
            if let Some(ms) = interval_ms {
                config.telemetry.interval_ms = ms;
            }
            let dashboard = mount(&store, &config).await?;
            let Some(mut rx) = dashboard.subscribe_telemetry() else {
                dashboard.unmount().await;
                return Err(DomainError::Forbidden("this dashboard has no live telemetry".to_string()).into());
            };

            println!("{}", dashboard.kind().title());
            for _ in 0..ticks {
                if rx.changed().await.is_err() {
                    break;
                }
                let snapshot = rx.borrow_and_update().clone();
                println!("{}", serde_json::to_string(&snapshot)?);
            }
            dashboard.unmount().await;
        }
        Command::Ask { message } => {
            let dashboard = mount(&store, &config).await?;
            let sent = dashboard.ask(&message).await;
            if matches!(sent, Ok(true)) {
                // Reply lands after the configured delay.
                tokio::time::sleep(config.assistant.reply_delay() + Duration::from_millis(50)).await;
            }
            let transcript = dashboard.transcript().await;
            dashboard.unmount().await;
            sent?;

            for msg in transcript {
                println!("[{:?}] {}", msg.speaker, msg.text);
            }
        }
        Command::ExportCsv { out } => {
            let dashboard = mount(&store, &config).await?;
            let kind = dashboard.kind();
            let campuses = dashboard.campuses().to_vec();
            dashboard.unmount().await;
            if kind != DashboardKind::Government {
                return Err(DomainError::Forbidden("campus reports need a government session".to_string()).into());
            }

            if out.as_os_str() == "-" {
                export_campus_csv(&campuses, io::stdout().lock())?;
            } else {
                let file = File::create(&out)?;
                export_campus_csv(&campuses, file)?;
                eprintln!("wrote {} campuses -> {}", campuses.len(), out.display());
            }
        }
    }

    Ok(())
}

/// Command-line flags win over the config file.
fn apply_overrides(cli: &Cli, config: &mut AppConfig) {
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
}

async fn mount(store: &SessionStore, config: &AppConfig) -> Result<Dashboard, DomainError> {
    Dashboard::for_session(store, config, create_event_bus(), ShutdownSignal::new())
        .await
        .ok_or_else(|| DomainError::InvalidState("not signed in; run login first".to_string()))
}
