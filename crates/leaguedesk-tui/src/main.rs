// leaguedesk entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Build the session seed (seed file argument, roster CSV)
// 4. Create the form session and mpsc channels
// 5. Spawn the session loop
// 6. Run the TUI until the operator quits
// 7. Print the last accepted submission as JSON

use leaguedesk_core::app;
use leaguedesk_core::config;
use leaguedesk_core::session::FormSession;
use leaguedesk_tui::startup;
use leaguedesk_tui::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("leaguedesk starting up");

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: grace {}ms, {} default rows, pot cap {}",
        config.entry.grace_delay_ms,
        config.entry.default_team_rows,
        config.pot.cap_amount()
    );

    let seed_path = startup::seed_path_from_args(std::env::args());
    let seed = startup::build_seed(&config, seed_path.as_deref())
        .context("failed to build session seed")?;

    let session = FormSession::new(&config, seed);

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, ui_tx, session).await {
            error!("Session loop error: {}", e);
        }
    });

    let submission = match tui::run(ui_rx, cmd_tx).await {
        Ok(submission) => submission,
        Err(e) => {
            error!("TUI error: {}", e);
            None
        }
    };

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    if let Some(submission) = submission {
        let json = serde_json::to_string_pretty(&submission)
            .context("failed to serialize submission")?;
        println!("{}", json);
    }

    info!("leaguedesk shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("leaguedesk.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("leaguedesk=info,leaguedesk_tui=info,leaguedesk_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
