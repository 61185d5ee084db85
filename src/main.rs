use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use jobzoeker::collectors;
use jobzoeker::config::{Cli, Settings};
use jobzoeker::ledger::Ledger;
use jobzoeker::notify::TelegramNotifier;
use jobzoeker::runner;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobzoeker=info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is normal in scheduled environments.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = Settings::load(&cli)?;
    let source = collectors::build_source(&settings.source, settings.http_timeout_secs)?;
    let notifier = TelegramNotifier::new(
        &settings.telegram.api_base,
        settings.telegram.token.clone(),
        settings.telegram.chat_id.clone(),
        settings.http_timeout_secs,
    )?;

    let mut ledger = Ledger::load(&settings.ledger_path)?;

    if settings.send_startup_message {
        let text = runner::startup_message(&settings, Utc::now());
        match notifier.send_status(&text).await {
            Ok(()) => tracing::info!("Test message sent successfully"),
            Err(e) => tracing::error!("Failed to send test message: {e}"),
        }
    }

    let report = runner::run(
        &settings,
        source.as_ref(),
        &notifier,
        &mut ledger,
        Utc::now().date_naive(),
    )
    .await?;

    if report.specs_failed > 0 {
        tracing::warn!(
            "{} of {} searches failed",
            report.specs_failed,
            report.specs_total
        );
    }

    Ok(())
}
