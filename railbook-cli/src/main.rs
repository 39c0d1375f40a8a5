use std::sync::Arc;

use anyhow::Context;
use railbook_catalog::Train;
use railbook_cli::{menu, AppState};
use railbook_core::Argon2Hasher;
use railbook_order::{BookingDesk, CancellationPolicy, User};
use railbook_store::{Config, JsonFileRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the menu on stdout stays readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "railbook_cli=info,railbook_order=info,railbook_core=info,railbook_store=info,railbook::events=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!(
        "Using train data at {} and user data at {}",
        config.storage.train_file.display(),
        config.storage.user_file.display()
    );

    let trains = Arc::new(JsonFileRepository::<Train>::new(&config.storage.train_file));
    let users = Arc::new(JsonFileRepository::<User>::new(&config.storage.user_file));
    let policy = CancellationPolicy::from_release_flag(config.booking.release_seat_on_cancel);

    let desk = BookingDesk::open(trains, users, Arc::new(Argon2Hasher::new()))
        .await
        .context("Failed to load booking data")?
        .with_policy(policy);

    let mut state = AppState::new(desk);
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    menu::run(&mut state, stdin, tokio::io::stdout()).await?;

    Ok(())
}
