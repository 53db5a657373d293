use clap::Args;
use storefront_app::{config::AppSettings, context::AppContext, domain::orders::OrderUuid};

#[derive(Debug, Args)]
pub(crate) struct RefundArgs {
    #[command(flatten)]
    settings: AppSettings,

    /// Order to refund
    #[arg(long)]
    order: OrderUuid,
}

pub(crate) async fn run(args: RefundArgs) -> Result<(), String> {
    let app = AppContext::from_settings(&args.settings)
        .await
        .map_err(|error| format!("failed to initialize services: {error}"))?;

    app.fulfillment
        .request_refund(args.order)
        .await
        .map_err(|error| format!("failed to request refund: {error}"))?;

    println!("refund requested for order {}", args.order);
    println!("the order becomes refunded once the provider confirms via webhook");

    Ok(())
}
