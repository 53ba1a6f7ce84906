//! AEP Bootcamp CLI - Operator tool for the event bookkeeping core.
//!
//! # Usage
//!
//! ```bash
//! # Save the App ID and Assurance URL
//! aep-cli config app-id launch-abc/def/launch-123-development
//! aep-cli config assurance-url "myapp://?adb_validation_sessionid=1234"
//!
//! # Inspect or rotate the cart session
//! aep-cli session show
//! aep-cli session reset
//!
//! # Log in and send events (payloads are printed to stdout)
//! aep-cli login --first-name Ann --email ann@example.com
//! aep-cli track page-view home
//! aep-cli track add-to-cart --product "S1:Tent:50"
//! aep-cli track purchase --product "S1:Tent:50:2" --total 105.00
//!
//! # Classify a push payload
//! aep-cli push classify '{"data":{"adb_m_id":"m1"}}'
//! ```
//!
//! # Commands
//!
//! - `config` - App ID and Assurance URL
//! - `session` - Cart session id
//! - `login` / `logout` - User profile
//! - `track` - Page, product and cart events
//! - `push classify` - Adobe vs local push routing
//! - `hash-email` - Privacy hash of an email

#![cfg_attr(not(test), forbid(unsafe_code))]

use aep_bootcamp_tracker::TrackerConfig;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod commands;
mod output;
mod product_arg;

use product_arg::ProductArg;

#[derive(Parser)]
#[command(name = "aep-cli")]
#[command(author, version, about = "AEP bootcamp operator tools")]
struct Cli {
    /// ECID reported by the identity provider (guest identity when absent)
    #[arg(long, global = true)]
    ecid: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the SDK configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Manage the cart session id
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Log a user in and send a login event
    Login {
        /// First name
        #[arg(short, long)]
        first_name: String,

        /// Email address
        #[arg(short, long)]
        email: String,
    },
    /// Send a logout event and clear the profile
    Logout,
    /// Build and send an event
    Track {
        #[command(subcommand)]
        event: TrackEvent,
    },
    /// Push message tools
    Push {
        #[command(subcommand)]
        action: PushAction,
    },
    /// Print the SHA-256 privacy hash of an email
    HashEmail {
        /// Email address
        email: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Save the App ID and configure the SDK with it
    AppId {
        /// App ID (environment file id)
        app_id: String,
    },
    /// Save the Assurance URL and start a session with it
    AssuranceUrl {
        /// URL containing `adb_validation_sessionid=`
        url: String,
    },
    /// Show the stored configuration
    Show,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Print the active cart session id, creating one if needed
    Show,
    /// Replace the cart session id
    Reset,
}

#[derive(Subcommand)]
enum TrackEvent {
    /// Page view
    PageView {
        /// Page name
        name: String,

        /// Site section
        #[arg(long)]
        site_section: Option<String>,

        /// Page URL
        #[arg(long)]
        url: Option<String>,
    },
    /// Product detail view
    ProductView {
        /// Product as `SKU:NAME:PRICE[:QTY]`
        #[arg(long)]
        product: ProductArg,

        /// Product category
        #[arg(long)]
        category: Option<String>,
    },
    /// Products added to the cart
    AddToCart {
        /// Product as `SKU:NAME:PRICE[:QTY]` (repeatable)
        #[arg(long = "product", required = true)]
        products: Vec<ProductArg>,
    },
    /// Checkout started
    Checkout {
        /// Product as `SKU:NAME:PRICE[:QTY]` (repeatable)
        #[arg(long = "product", required = true)]
        products: Vec<ProductArg>,
    },
    /// Purchase completed; rotates the cart session
    Purchase {
        /// Product as `SKU:NAME:PRICE[:QTY]` (repeatable)
        #[arg(long = "product", required = true)]
        products: Vec<ProductArg>,

        /// Order total
        #[arg(long)]
        total: Decimal,

        /// ISO 4217 currency code (default: USD)
        #[arg(long)]
        currency: Option<aep_bootcamp_core::CurrencyCode>,
    },
}

#[derive(Subcommand)]
enum PushAction {
    /// Classify a push payload given as JSON
    Classify {
        /// Payload JSON, e.g. `{"data":{"adb_uri":""}}`
        payload: String,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &TrackerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match TrackerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            #[allow(clippy::print_stderr)] // tracing is not initialized yet
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr; stdout carries command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aep_bootcamp_cli=info,aep_bootcamp_tracker=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &TrackerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = app::App::new(config, cli.ecid.as_deref()).await;

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::AppId { app_id } => commands::config::set_app_id(&app, &app_id).await?,
            ConfigAction::AssuranceUrl { url } => {
                commands::config::set_assurance_url(&app, &url).await?;
            }
            ConfigAction::Show => commands::config::show(&app).await?,
        },
        Commands::Session { action } => match action {
            SessionAction::Show => commands::session::show(&app).await,
            SessionAction::Reset => commands::session::reset(&app).await,
        },
        Commands::Login { first_name, email } => {
            commands::track::login(&app, &first_name, &email).await?;
        }
        Commands::Logout => commands::track::logout(&app).await,
        Commands::Track { event } => match event {
            TrackEvent::PageView {
                name,
                site_section,
                url,
            } => commands::track::page_view(&app, name, site_section, url).await,
            TrackEvent::ProductView { product, category } => {
                commands::track::product_view(&app, product, category).await;
            }
            TrackEvent::AddToCart { products } => {
                commands::track::add_to_cart(&app, products).await?;
            }
            TrackEvent::Checkout { products } => commands::track::checkout(&app, products).await?,
            TrackEvent::Purchase {
                products,
                total,
                currency,
            } => commands::track::purchase(&app, products, total, currency).await?,
        },
        Commands::Push { action } => match action {
            PushAction::Classify { payload } => commands::push::classify(&payload)?,
        },
        Commands::HashEmail { email } => commands::identity::hash_email(&email)?,
    }
    Ok(())
}
