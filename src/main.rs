//! micmode-daemon: push-to-talk microphone control for macOS
//!
//! Runs in the background (e.g. as a LaunchAgent) and provides:
//! - Global hotkey detection via CGEventTap (default Control+Tab)
//! - Hold to toggle the microphone for the duration of the press
//! - Double press to switch between push-to-talk and push-to-stay
//! - Status updates to sketchybar and a one-line state file

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use micmode::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "micmode-daemon starting");

    let config = Config::load()?;
    info!(
        hotkey = %config.hotkey,
        double_press_ms = config.double_press_threshold.as_millis() as u64,
        notifier = ?config.notifier,
        state_file = ?config.state_file,
        "configuration loaded"
    );

    daemon::run(config).await?;

    info!("micmode-daemon stopped");
    Ok(())
}

#[cfg(target_os = "macos")]
mod daemon {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use tokio::sync::{broadcast, mpsc};
    use tracing::{debug, info, warn};

    use micmode::audio::{CoreAudioBackend, MuteController};
    use micmode::config::Config;
    use micmode::events::StateEvent;
    use micmode::gesture::GestureClassifier;
    use micmode::hotkey::HotkeyListener;
    use micmode::lifecycle::ShutdownSignal;
    use micmode::observer::{CommandNotifier, ObserverSync, StateFile};
    use micmode::state::StateMachine;

    pub async fn run(config: Config) -> Result<()> {
        let mut shutdown = ShutdownSignal::new().context("failed to register signal handlers")?;

        let mute = MuteController::new(Arc::new(CoreAudioBackend::new()), config.settle_delay);
        let observer = build_observer(&config, mute.clone());

        // State machine -> event log
        let (event_tx, mut event_rx) = broadcast::channel::<StateEvent>(64);

        // Without the real mute state there is no sane initial mode
        let mut state_machine = StateMachine::initialize(
            mute,
            observer,
            GestureClassifier::new(config.double_press_threshold),
            event_tx,
        )
        .context("failed to read initial microphone state")?;

        // Hotkey listener -> state machine
        let (hotkey_tx, hotkey_rx) = mpsc::channel(32);
        let mut hotkey_listener = HotkeyListener::new(config.hotkey, hotkey_tx);
        hotkey_listener
            .start()
            .await
            .with_context(|| format!("failed to register hotkey {}", config.hotkey))?;

        info!(hotkey = %config.hotkey, "daemon initialized, entering main loop");

        tokio::select! {
            // Only dropped between events, so an in-flight toggle completes
            _ = state_machine.run(hotkey_rx) => {
                info!("state machine exited");
            }

            _ = async {
                loop {
                    match event_rx.recv().await {
                        Ok(event) => match serde_json::to_string(&event) {
                            Ok(json) => info!(%event, %json, "state event"),
                            Err(e) => warn!(%event, %e, "state event not serializable"),
                        },
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "state event receiver lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            } => {
                info!("state event handler exited");
            }

            _ = shutdown.wait() => {
                info!("shutdown signal received");
            }
        }

        info!("shutting down...");
        hotkey_listener.stop();

        Ok(())
    }

    fn build_observer(config: &Config, mute: MuteController) -> ObserverSync {
        let mut observer = ObserverSync::new(mute).with_extended_status(config.extended_status);

        if let Some(program) = &config.notifier {
            observer = observer.with_notifier(
                Box::new(CommandNotifier::new(program.clone())),
                config.notify_event.clone(),
            );
        }

        if let Some(path) = &config.state_file {
            let state_file = StateFile::new(path);
            match state_file.read() {
                Ok(previous) => debug!(?previous, path = ?path, "existing state file"),
                Err(e) => warn!(%e, "existing state file ignored"),
            }
            observer = observer.with_state_file(state_file);
        }

        observer
    }
}

#[cfg(not(target_os = "macos"))]
mod daemon {
    use anyhow::Result;

    use micmode::config::Config;

    pub async fn run(_config: Config) -> Result<()> {
        anyhow::bail!("micmode-daemon needs macOS (CGEventTap hotkeys, CoreAudio mute control)")
    }
}
