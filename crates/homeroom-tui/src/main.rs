// Homeroom entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config, copying the bundled defaults on first run
// 3. Create mpsc channels
// 4. Build the application state (LLM clients, history file, Gist store)
// 5. Spawn the app logic task
// 6. Run the TUI until the user quits
// 7. Cleanup on exit

use homeroom_app::app::{self, AppState};
use homeroom_core::{config, paths};
use homeroom_tui::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("Homeroom starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: {} profiles, level {}, {} questions per batch",
        config.profiles.len(),
        config.practice.level(),
        config.practice.question_count
    );
    let missing = config.credentials.secrets_status();
    if !missing.all_present() {
        info!("Translate chat secrets missing: {}", missing.missing().join(", "));
    }
    let profiles = config.profiles.clone();

    // 3. Create mpsc channels
    let (llm_tx, llm_rx) = mpsc::channel(256);
    let (task_tx, task_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    // 4. Application state
    let app_state = AppState::from_config(config, llm_tx, task_tx);

    // 5. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(llm_rx, task_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 6. Run the TUI (returns when the user quits)
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx, profiles).await {
        error!("TUI error: {}", e);
    }

    // 7. Cleanup: the app loop exits once Quit arrives or cmd_tx is dropped.
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), app_handle).await;

    info!("Homeroom shut down cleanly");
    Ok(())
}

/// Initialize tracing to a log file; the terminal belongs to the TUI.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = paths::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let log_file = std::fs::File::create(log_dir.join("homeroom.log"))
        .context("failed to create log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("homeroom=info,warn")),
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
