use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use shopifree::{
    clock::{Clock, FixedClock, SystemClock},
    status::DiscountState,
    usage::UsageCap,
};
use shopifree_app::context::AppContext;

mod coupons;
mod db;
mod logging;
mod promotions;

#[derive(Debug, Parser)]
#[command(
    name = "shopifree-app",
    about = "Shopifree coupons and promotions CLI",
    long_about = None
)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub logging: logging::LoggingConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Db(db::DbCommand),
    Coupons(coupons::CouponsCommand),
    Promotions(promotions::PromotionsCommand),
}

/// Connection and clock settings shared by the coupon and promotion commands.
#[derive(Debug, Args)]
pub(crate) struct ContextArgs {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Evaluate statuses at this instant instead of the current time
    #[arg(long)]
    at: Option<Timestamp>,
}

impl ContextArgs {
    pub(crate) async fn connect(&self) -> Result<AppContext, String> {
        let clock: Arc<dyn Clock> = match self.at {
            Some(at) => Arc::new(FixedClock::new(at)),
            None => Arc::new(SystemClock),
        };

        AppContext::from_database_url(&self.database_url, clock)
            .await
            .map_err(|error| error.to_string())
    }
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Db(command) => db::run(command).await,
            Commands::Coupons(command) => coupons::run(command).await,
            Commands::Promotions(command) => promotions::run(command).await,
        }
    }
}

/// Whether a discount can be applied now, and how many uses its total cap has left.
fn availability(state: &DiscountState, cap: &UsageCap) -> String {
    let redeemable = if state.is_redeemable() {
        "redeemable"
    } else {
        "blocked"
    };

    match cap.remaining(state.uses) {
        Some(remaining) => format!("{redeemable} remaining={remaining}"),
        None => redeemable.to_string(),
    }
}
