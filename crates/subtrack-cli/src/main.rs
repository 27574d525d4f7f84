//! subtrack CLI
//!
//! Command-line interface for subtrack - subscription tracking.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use subtrack_core::{
    AuthClient, AuthProvider, BillingCycle, Config, RemoteStore, RestAuth, RestStore, SyncClient,
    User,
};

mod commands;
mod output;
mod prompt;
mod session;

use commands::subscription::EditArgs;
use output::{Output, OutputFormat};
use session::{Session, SessionStore};

#[derive(Parser)]
#[command(name = "subtrack")]
#[command(about = "subtrack - Track recurring subscription payments")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new account
    Register {
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in
    Login {
        email: String,
        /// Password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Add a subscription
    Add {
        /// Display name ("Netflix", ...)
        name: String,
        /// Price per billing cycle
        #[arg(short, long)]
        price: f64,
        /// Currency code
        #[arg(short, long, default_value = "USD")]
        currency: String,
        /// Billing cycle (daily/weekly/monthly/quarterly/yearly)
        #[arg(long, default_value = "monthly")]
        cycle: BillingCycle,
        /// Renewal date (YYYY-MM-DD)
        #[arg(long)]
        renews: NaiveDate,
        /// Logo image URL
        #[arg(long)]
        logo: Option<String>,
        /// Upcoming billing date (YYYY-MM-DD)
        #[arg(long)]
        next_billing: Option<NaiveDate>,
    },
    /// List your subscriptions
    #[command(alias = "ls")]
    List,
    /// Show subscription details
    Show {
        /// Subscription id
        id: String,
    },
    /// Edit a subscription
    Edit {
        /// Subscription id
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        currency: Option<String>,
        #[arg(long)]
        cycle: Option<BillingCycle>,
        #[arg(long)]
        renews: Option<NaiveDate>,
        #[arg(long)]
        next_billing: Option<NaiveDate>,
        /// Logo image URL (empty string clears it)
        #[arg(long)]
        logo: Option<String>,
    },
    /// Record a payment against a subscription
    Pay {
        /// Subscription id
        id: String,
        #[arg(long)]
        amount: f64,
        /// Payment date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
    },
    /// Delete a subscription
    #[command(alias = "rm")]
    Remove {
        /// Subscription id
        id: String,
    },
    /// Show status (account, backend, cache settings)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, api_url, stale_after_secs)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Everything the command handlers need
struct App {
    config: Config,
    sessions: SessionStore,
    auth_provider: Arc<RestAuth>,
    auth: AuthClient,
    client: SyncClient,
    session: Option<Session>,
}

fn build_app() -> Result<App> {
    let config = Config::load()?;
    tracing::debug!(api_url = %config.api_url, "loaded configuration");

    let sessions = SessionStore::new(&config);
    let session = sessions.load()?;

    let auth_provider = Arc::new(RestAuth::new(config.api_url.clone()));
    let auth = AuthClient::new(Arc::clone(&auth_provider) as Arc<dyn AuthProvider>);
    match &session {
        Some(s) => auth.restore(s.user()),
        None => auth.mark_signed_out(),
    }

    let token = session.as_ref().and_then(|s| s.token.clone());
    let store = Arc::new(RestStore::new(config.api_url.clone()).with_token(token));
    let client =
        SyncClient::with_stale_after(store as Arc<dyn RemoteStore>, config.stale_after());

    Ok(App {
        config,
        sessions,
        auth_provider,
        auth,
        client,
        session,
    })
}

fn require_user(app: &App) -> Result<User> {
    match &app.session {
        Some(session) => Ok(session.user()),
        None => bail!("Not signed in. Run `subtrack login` first."),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the backend
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let app = build_app()?;

    match cli.command {
        Commands::Register { email, password } => {
            commands::auth::register(
                &app.auth,
                &app.auth_provider,
                &app.sessions,
                email,
                password,
                &output,
            )
            .await
        }
        Commands::Login { email, password } => {
            commands::auth::login(
                &app.auth,
                &app.auth_provider,
                &app.sessions,
                email,
                password,
                &output,
            )
            .await
        }
        Commands::Logout => {
            commands::auth::logout(&app.auth, &app.client, &app.sessions, &output).await
        }
        Commands::Whoami => commands::auth::whoami(&app.sessions, &output),
        Commands::Add {
            name,
            price,
            currency,
            cycle,
            renews,
            logo,
            next_billing,
        } => {
            let user = require_user(&app)?;
            commands::subscription::add(
                &app.client,
                &user,
                name,
                price,
                currency,
                cycle,
                renews,
                logo,
                next_billing,
                &output,
            )
            .await
        }
        Commands::List => {
            let user = require_user(&app)?;
            commands::subscription::list(&app.client, &user, &output).await
        }
        Commands::Show { id } => commands::subscription::show(&app.client, id, &output).await,
        Commands::Edit {
            id,
            name,
            price,
            currency,
            cycle,
            renews,
            next_billing,
            logo,
        } => {
            let changes = EditArgs {
                name,
                price,
                currency,
                cycle,
                renews,
                next_billing,
                logo,
            };
            commands::subscription::edit(&app.client, id, changes, &output).await
        }
        Commands::Pay { id, amount, date } => {
            commands::subscription::pay(&app.client, id, amount, date, &output).await
        }
        Commands::Remove { id } => {
            let user = require_user(&app)?;
            commands::subscription::remove(&app.client, &user, id, &output).await
        }
        Commands::Status => commands::status::show(&app.config, &app.sessions, &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}
