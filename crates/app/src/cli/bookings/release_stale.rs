use clap::Args;
use jiff::{SignedDuration, Timestamp};
use storefront_app::{
    config::DatabaseSettings,
    database::{self, Db},
    domain::bookings::{BookingsService, PgBookingsService},
};

#[derive(Debug, Args)]
pub(crate) struct ReleaseStaleArgs {
    #[command(flatten)]
    database: DatabaseSettings,

    /// Only release bookings created at least this many minutes ago
    #[arg(long, default_value_t = 60)]
    older_than_minutes: u32,
}

pub(crate) async fn run(args: ReleaseStaleArgs) -> Result<(), String> {
    let cutoff = Timestamp::now()
        .checked_sub(SignedDuration::from_mins(i64::from(args.older_than_minutes)))
        .map_err(|error| format!("invalid cutoff: {error}"))?;

    let pool = database::connect(&args.database.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let released = PgBookingsService::new(Db::new(pool))
        .release_stale(cutoff)
        .await
        .map_err(|error| format!("failed to release stale bookings: {error}"))?;

    println!("released {released} stale booking(s) created before {cutoff}");

    Ok(())
}
