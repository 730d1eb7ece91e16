//! Sales funnel CLI
//!
//! Identity comes from the external authentication provider and is passed as
//! `--user-id` / `--email`. Every command goes through `FunnelService`, so the
//! access policy applies the same way it would behind any other front end.
//!
//! # Usage
//! ```sh
//! funnel init --admin 6f1c...
//! funnel --user-id 6f1c... --email ana@example.com capture add --client "Bakery" \
//!     --product Leasing --expected 2500 --close-month 2025-07
//! funnel --user-id 6f1c... --email ana@example.com report --month 2025-06 --json
//! ```
//!
//! # Environment Variables
//! - `DATABASE_URL` - SQLite database (default: sqlite://data/funnel.db)
//! - `SEMAPHORE_RED_MAX` / `SEMAPHORE_YELLOW_MAX` - conversion cutoffs
//! - `RUST_LOG` - log filter (logs go to stderr)

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use salesfunnel::application::FunnelService;
use salesfunnel::config::Config;
use salesfunnel::domain::funnel::{
    CaptureFilter, CaptureRecord, CaptureUpdate, ClientCategory, FunnelStatus, NewCapture,
    ObservationFilter, ProductConfig, types::first_of_month,
};
use salesfunnel::domain::identity::Identity;
use salesfunnel::infrastructure::{Database, Metrics};
use tracing::{Level, info};
use tracing_subscriber::prelude::*;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "funnel", author, version, about = "Sales funnel tracker", long_about = None)]
struct Cli {
    /// Authenticated user id
    #[arg(long, global = true)]
    user_id: Option<Uuid>,

    /// Authenticated user e-mail (its local part is the advisor alias)
    #[arg(long, global = true)]
    email: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the schema, seed the product catalogue and optionally the first admin
    Init {
        #[arg(long)]
        admin: Option<Uuid>,
    },
    /// Product reference data
    #[command(subcommand)]
    Product(ProductCommand),
    /// Lead captures
    #[command(subcommand)]
    Capture(CaptureCommand),
    /// Monthly goals
    #[command(subcommand)]
    Goal(GoalCommand),
    /// Admin set
    #[command(subcommand)]
    Admin(AdminCommand),
    /// Advisor aliases and their user ids
    Advisors,
    /// Notes left by admins for advisors
    #[command(subcommand)]
    Observation(ObservationCommand),
    /// Monthly funnel report
    Report {
        /// Month (YYYY-MM), defaults to the current one
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
        #[arg(long)]
        category: Option<ClientCategory>,
        /// Running totals in the time series
        #[arg(long)]
        cumulative: bool,
        #[arg(long)]
        json: bool,
        /// Also print the Prometheus exposition of the funnel metrics
        #[arg(long)]
        prometheus: bool,
    },
}

#[derive(Subcommand)]
enum ProductCommand {
    List {
        /// Include inactive products
        #[arg(long)]
        all: bool,
    },
    Set {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "0")]
        lag: u32,
        #[arg(long, default_value = "0.5")]
        probability: f64,
        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Subcommand)]
enum CaptureCommand {
    Add(AddCaptureArgs),
    Update(UpdateCaptureArgs),
    List {
        /// First capture date (inclusive)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last capture date (exclusive)
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        category: Option<ClientCategory>,
        #[arg(long)]
        advisor: Option<String>,
        #[arg(long)]
        status: Option<FunnelStatus>,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct AddCaptureArgs {
    #[arg(long)]
    client: String,
    #[arg(long)]
    product: String,
    #[arg(long)]
    expected: Decimal,
    /// Expected closing month (YYYY-MM)
    #[arg(long, value_parser = parse_month)]
    close_month: NaiveDate,
    /// Who referred the client
    #[arg(long)]
    reference: Option<String>,
    #[arg(long)]
    visit_date: Option<NaiveDate>,
    /// Capture date, defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "New")]
    category: ClientCategory,
    #[arg(long, default_value = "Prospect")]
    status: FunnelStatus,
    #[arg(long)]
    probability: Option<f64>,
    #[arg(long)]
    realized: Option<Decimal>,
}

#[derive(Args)]
struct UpdateCaptureArgs {
    id: Uuid,
    #[arg(long)]
    status: Option<FunnelStatus>,
    #[arg(long)]
    realized: Option<Decimal>,
    #[arg(long)]
    probability: Option<f64>,
    #[arg(long)]
    expected: Option<Decimal>,
    #[arg(long, value_parser = parse_month)]
    close_month: Option<NaiveDate>,
    #[arg(long)]
    visit_date: Option<NaiveDate>,
    #[arg(long)]
    reference: Option<String>,
}

#[derive(Subcommand)]
enum GoalCommand {
    Set {
        #[arg(long)]
        advisor: Uuid,
        #[arg(long, value_parser = parse_month)]
        month: NaiveDate,
        #[arg(long)]
        amount: Decimal,
    },
    List {
        #[arg(long)]
        advisor: Option<Uuid>,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    Grant { user: Uuid },
    Revoke { user: Uuid },
    /// Whether the caller is an admin
    Check,
    List,
}

#[derive(Subcommand)]
enum ObservationCommand {
    Add {
        /// Advisor alias
        #[arg(long)]
        advisor: String,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        message: String,
    },
    /// The caller's open notes
    Pending,
    List {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
        #[arg(long)]
        advisor: Option<Uuid>,
        #[arg(long)]
        pending: bool,
    },
    Done { id: Uuid },
    Undo { id: Uuid },
    Delete { id: Uuid },
}

/// Accepts `YYYY-MM` or a full date; returns the first of that month.
fn parse_month(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y-%m-%d"))
        .map(first_of_month)
        .map_err(|_| format!("Invalid month: {} (expected YYYY-MM)", value))
}

impl Cli {
    fn identity(&self) -> Result<Identity> {
        let user_id = self
            .user_id
            .context("--user-id is required for this command")?;
        let email = self
            .email
            .clone()
            .context("--email is required for this command")?;
        Ok(Identity::new(user_id, email))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so reports on stdout stay machine-readable
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(
        "{} {} using {}",
        config.app_name,
        env!("CARGO_PKG_VERSION"),
        config.database_url
    );

    let database = Database::new(&config.database_url, config.database_max_connections).await?;

    if let Commands::Init { admin } = &cli.command {
        let seeded = database.seed(*admin).await?;
        println!("Database initialized.");
        if let Some(user) = admin {
            if seeded {
                println!("{} is the first admin.", user);
            } else {
                println!("Admins already exist, {} was not added.", user);
            }
        }
        return Ok(());
    }

    let identity = cli.identity()?;
    let service = FunnelService::new(&database, config.thresholds, Metrics::new()?)
        .with_capture_limit(config.capture_query_limit);

    run(cli.command, &service, &identity, &config).await
}

async fn run(
    command: Commands,
    service: &FunnelService,
    identity: &Identity,
    config: &Config,
) -> Result<()> {
    match command {
        Commands::Init { .. } => {}

        Commands::Product(ProductCommand::List { all }) => {
            for p in service.list_products(identity, !all).await? {
                println!(
                    "{:<16} lag {:>2}m  p={}  {}",
                    p.name,
                    p.recognition_lag_months,
                    p.default_probability,
                    if p.active { "active" } else { "inactive" }
                );
            }
        }
        Commands::Product(ProductCommand::Set {
            name,
            lag,
            probability,
            inactive,
        }) => {
            let mut product = ProductConfig::new(name, lag, probability)?;
            if inactive {
                product = product.inactive();
            }
            let saved = service.save_product(identity, product).await?;
            println!("Saved product {}", saved.name);
        }

        Commands::Capture(CaptureCommand::Add(args)) => {
            let record = service
                .create_capture(
                    identity,
                    NewCapture {
                        client: args.client,
                        reference: args.reference,
                        product: args.product,
                        expected_amount: args.expected,
                        expected_close_month: args.close_month,
                        capture_date: args.date,
                        visit_date: args.visit_date,
                        category: args.category,
                        status: args.status,
                        probability_adjusted: args.probability,
                        realized_amount: args.realized,
                    },
                )
                .await?;
            println!("{}", record.id);
        }
        Commands::Capture(CaptureCommand::Update(args)) => {
            let record = service
                .update_capture(
                    identity,
                    args.id,
                    CaptureUpdate {
                        status: args.status,
                        realized_amount: args.realized,
                        probability_adjusted: args.probability,
                        expected_amount: args.expected,
                        expected_close_month: args.close_month,
                        visit_date: args.visit_date,
                        reference: args.reference,
                    },
                )
                .await?;
            print_capture(&record);
        }
        Commands::Capture(CaptureCommand::List {
            from,
            to,
            category,
            advisor,
            status,
            limit,
            json,
        }) => {
            let filter = CaptureFilter {
                date_from: from,
                date_to_exclusive: to,
                ..CaptureFilter::default()
            }
            .with_category(category)
            .with_advisor(advisor)
            .with_status(status)
            .with_limit(limit.unwrap_or(config.capture_query_limit));

            let records = service.list_captures(identity, filter).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                records.iter().for_each(print_capture);
            }
        }

        Commands::Goal(GoalCommand::Set {
            advisor,
            month,
            amount,
        }) => {
            let goal = service.set_goal(identity, advisor, month, amount).await?;
            println!("Goal {} for {} in {}", goal.amount, goal.advisor_id, goal.month);
        }
        Commands::Goal(GoalCommand::List { advisor }) => {
            for goal in service.list_goals(identity, advisor).await? {
                println!("{}  {}  {}", goal.month, goal.advisor_id, goal.amount);
            }
        }

        Commands::Admin(AdminCommand::Grant { user }) => {
            service.grant_admin(identity, user).await?;
            println!("Granted admin to {}", user);
        }
        Commands::Admin(AdminCommand::Revoke { user }) => {
            if service.revoke_admin(identity, user).await? {
                println!("Revoked admin from {}", user);
            } else {
                println!("{} was not an admin", user);
            }
        }
        Commands::Admin(AdminCommand::Check) => {
            println!("{}", service.is_admin(identity).await?);
        }
        Commands::Admin(AdminCommand::List) => {
            for user in service.list_admins(identity).await? {
                println!("{}", user);
            }
        }

        Commands::Advisors => {
            for (alias, user_id) in service.advisor_directory(identity).await? {
                println!("{:<20} {}", alias, user_id);
            }
        }

        Commands::Observation(ObservationCommand::Add {
            advisor,
            client,
            message,
        }) => {
            let note = service
                .create_observation(identity, &advisor, client, &message)
                .await?;
            println!("{}", note.id);
        }
        Commands::Observation(ObservationCommand::Pending) => {
            for note in service.pending_observations(identity).await? {
                println!(
                    "{}  {}  {}  {}",
                    note.id,
                    note.created_at.format("%Y-%m-%d"),
                    note.client.as_deref().unwrap_or("-"),
                    note.message
                );
            }
        }
        Commands::Observation(ObservationCommand::List {
            from,
            to,
            advisor,
            pending,
        }) => {
            let filter = ObservationFilter {
                created_from: from,
                created_to_exclusive: to,
                advisor_id: advisor,
                pending_only: pending,
            };
            for note in service.list_observations(identity, filter).await? {
                println!(
                    "{}  {}  {:<16} {}  {}",
                    note.id,
                    note.created_at.format("%Y-%m-%d"),
                    note.advisor_alias,
                    if note.done { "done" } else { "open" },
                    note.message
                );
            }
        }
        Commands::Observation(ObservationCommand::Done { id }) => {
            service.set_observation_done(identity, id, true).await?;
            println!("Marked {} done", id);
        }
        Commands::Observation(ObservationCommand::Undo { id }) => {
            service.set_observation_done(identity, id, false).await?;
            println!("Reopened {}", id);
        }
        Commands::Observation(ObservationCommand::Delete { id }) => {
            service.delete_observation(identity, id).await?;
            println!("Deleted {}", id);
        }

        Commands::Report {
            month,
            category,
            cumulative,
            json,
            prometheus,
        } => {
            let month = month.unwrap_or_else(|| Utc::now().date_naive());
            let dashboard = service
                .dashboard(identity, month, category, cumulative)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print!("{}", dashboard.render_text(&config.app_name));
            }
            if prometheus {
                print!("{}", service.metrics().render());
            }
        }
    }
    Ok(())
}

fn print_capture(record: &CaptureRecord) {
    println!(
        "{}  {}  {:<12} {:<24} {:<14} {:<13} expected {} realized {}",
        record.id,
        record.capture_date,
        record.advisor,
        record.client,
        record.product,
        record.status,
        record.expected_amount,
        record
            .realized_amount
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
}
