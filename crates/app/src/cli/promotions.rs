use clap::{Args, Subcommand};
use shopifree_app::domain::{
    promotions::{data::PromotionSummary, records::PromotionUuid},
    stores::records::StoreUuid,
};

use super::{ContextArgs, availability};

#[derive(Debug, Args)]
pub(crate) struct PromotionsCommand {
    #[command(flatten)]
    context: ContextArgs,

    /// Store owning the promotions
    #[arg(long, env = "STORE_UUID")]
    store: StoreUuid,

    #[command(subcommand)]
    command: PromotionsSubcommand,
}

#[derive(Debug, Subcommand)]
enum PromotionsSubcommand {
    /// List promotions, highest priority first
    List,

    /// Price a product with the promotion that applies to it
    Price {
        product_id: String,

        /// Product price in minor units
        price: u64,
    },

    /// Pause a promotion
    Pause { uuid: PromotionUuid },

    /// Resume a paused promotion
    Resume { uuid: PromotionUuid },
}

pub(crate) async fn run(command: PromotionsCommand) -> Result<(), String> {
    let context = command.context.connect().await?;
    let promotions = context.promotions;
    let store = command.store;

    match command.command {
        PromotionsSubcommand::List => {
            let summaries = promotions
                .list_promotions(store)
                .await
                .map_err(|error| format!("failed to list promotions: {error}"))?;

            for summary in &summaries {
                print_summary(summary);
            }
        }
        PromotionsSubcommand::Price { product_id, price } => {
            let price = promotions
                .price_product(store, product_id, price)
                .await
                .map_err(|error| format!("failed to price product: {error}"))?;

            println!("original_price: {}", price.original_price);
            println!("discount: {}", price.discount);
            println!("final_price: {}", price.final_price);

            if let Some(uuid) = price.promotion {
                println!("promotion_uuid: {uuid}");
            }
        }
        PromotionsSubcommand::Pause { uuid } => {
            let summary = promotions
                .set_paused(store, uuid, true)
                .await
                .map_err(|error| format!("failed to pause promotion: {error}"))?;

            print_summary(&summary);
        }
        PromotionsSubcommand::Resume { uuid } => {
            let summary = promotions
                .set_paused(store, uuid, false)
                .await
                .map_err(|error| format!("failed to resume promotion: {error}"))?;

            print_summary(&summary);
        }
    }

    Ok(())
}

fn print_summary(summary: &PromotionSummary) {
    let record = &summary.record;

    println!(
        "{}\tpriority={}\t{}\t{}\t{}\t{}",
        record.uuid,
        record.promotion.priority,
        record.promotion.target.as_str(),
        summary.state.status,
        availability(&summary.state, &record.promotion.usage_cap),
        record.promotion.name,
    );
}
