use clap::{Parser, Subcommand};

mod bookings;
mod db;
mod orders;

#[derive(Debug, Parser)]
#[command(name = "storefront-app", about = "Storefront operator CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Bookings(bookings::BookingsCommand),
    Db(db::DbCommand),
    Orders(orders::OrdersCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        match self.command {
            Commands::Bookings(command) => bookings::run(command).await,
            Commands::Db(command) => db::run(command).await,
            Commands::Orders(command) => orders::run(command).await,
        }
    }
}
