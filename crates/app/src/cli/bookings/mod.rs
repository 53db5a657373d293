use clap::{Args, Subcommand};

mod release_stale;

#[derive(Debug, Args)]
pub(crate) struct BookingsCommand {
    #[command(subcommand)]
    command: BookingsSubcommand,
}

#[derive(Debug, Subcommand)]
enum BookingsSubcommand {
    /// Cancel unpaid bookings and return their seats
    ReleaseStale(release_stale::ReleaseStaleArgs),
}

pub(crate) async fn run(command: BookingsCommand) -> Result<(), String> {
    match command.command {
        BookingsSubcommand::ReleaseStale(args) => release_stale::run(args).await,
    }
}
