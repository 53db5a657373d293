use clap::{Args, Subcommand};

mod refund;

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// Ask the payment provider to refund a completed order
    Refund(refund::RefundArgs),
}

pub(crate) async fn run(command: OrdersCommand) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::Refund(args) => refund::run(args).await,
    }
}
