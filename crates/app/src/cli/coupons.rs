use clap::{Args, Subcommand};
use shopifree_app::domain::{
    coupons::{
        data::{CouponCheckout, CouponQuery, CouponSummary},
        records::CouponUuid,
    },
    stores::records::StoreUuid,
};

use super::{ContextArgs, availability};

#[derive(Debug, Args)]
pub(crate) struct CouponsCommand {
    #[command(flatten)]
    context: ContextArgs,

    /// Store owning the coupons
    #[arg(long, env = "STORE_UUID")]
    store: StoreUuid,

    #[command(subcommand)]
    command: CouponsSubcommand,
}

#[derive(Debug, Subcommand)]
enum CouponsSubcommand {
    /// List coupons with their current status and usage
    List {
        /// Only recovery coupons (`true`) or only merchant coupons (`false`)
        #[arg(long)]
        recovery: Option<bool>,
    },

    /// Generate a code no coupon in the store uses yet
    GenerateCode {
        /// Name the code prefix is taken from
        base_name: String,
    },

    /// Pause a coupon
    Pause { uuid: CouponUuid },

    /// Resume a paused coupon
    Resume { uuid: CouponUuid },

    /// Price a coupon code against an order
    Quote {
        code: String,

        /// Order subtotal in minor units
        #[arg(long)]
        subtotal: u64,

        /// Shipping in minor units
        #[arg(long, default_value_t = 0)]
        shipping: u64,

        /// Customer placing the order
        #[arg(long)]
        customer: Option<String>,
    },
}

pub(crate) async fn run(command: CouponsCommand) -> Result<(), String> {
    let context = command.context.connect().await?;
    let coupons = context.coupons;
    let store = command.store;

    match command.command {
        CouponsSubcommand::List { recovery } => {
            let summaries = coupons
                .list_coupons(store, CouponQuery { recovery })
                .await
                .map_err(|error| format!("failed to list coupons: {error}"))?;

            for summary in &summaries {
                print_summary(summary);
            }
        }
        CouponsSubcommand::GenerateCode { base_name } => {
            let code = coupons
                .generate_unique_code(store, base_name)
                .await
                .map_err(|error| format!("failed to generate code: {error}"))?;

            println!("{code}");
        }
        CouponsSubcommand::Pause { uuid } => {
            let summary = coupons
                .set_paused(store, uuid, true)
                .await
                .map_err(|error| format!("failed to pause coupon: {error}"))?;

            print_summary(&summary);
        }
        CouponsSubcommand::Resume { uuid } => {
            let summary = coupons
                .set_paused(store, uuid, false)
                .await
                .map_err(|error| format!("failed to resume coupon: {error}"))?;

            print_summary(&summary);
        }
        CouponsSubcommand::Quote {
            code,
            subtotal,
            shipping,
            customer,
        } => {
            let redemption = coupons
                .quote_coupon(
                    store,
                    CouponCheckout {
                        code,
                        customer,
                        subtotal,
                        shipping,
                    },
                )
                .await
                .map_err(|error| format!("coupon rejected: {error}"))?;

            let quote = redemption.quote;

            println!("coupon_uuid: {}", redemption.coupon);
            println!("discount: {}", quote.discount);
            println!("shipping_discount: {}", quote.shipping_discount);
            println!("total: {}", quote.total);
        }
    }

    Ok(())
}

fn print_summary(summary: &CouponSummary) {
    let record = &summary.record;
    let usage = if summary.live_usage { "live" } else { "cached" };

    println!(
        "{}\t{}\t{}\t{}\t{}\tuses={} ({usage})\t{}",
        record.uuid,
        record.coupon.code,
        record.coupon.discount.as_str(),
        summary.state.status,
        availability(&summary.state, &record.coupon.usage_cap),
        summary.state.uses,
        record.coupon.name,
    );
}
