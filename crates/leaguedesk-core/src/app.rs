// Session event loop.
//
// Owns the `FormSession`, applies commands from the front end, fires blur
// validations when their grace delay elapses and forwards the resulting
// `UiUpdate`s to the renderer.

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::protocol::{SessionCommand, UiUpdate};
use crate::session::FormSession;

/// Run the session until `Quit` arrives or either channel closes.
///
/// Listens on two sources using `tokio::select!`:
/// 1. Commands from the front end
/// 2. The earliest pending blur deadline, if any
///
/// Returns the session so callers can inspect its final state.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut session: FormSession,
) -> anyhow::Result<FormSession> {
    info!("Session event loop started");

    // Initial redraw queued by the constructor.
    if !flush(&mut session, &ui_tx).await {
        info!("UI channel closed before start");
        return Ok(session);
    }

    loop {
        let deadline = session.next_deadline();

        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        debug!("Command: {:?}", cmd);
                        session.handle(cmd, Instant::now());
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            _ = wait_for(deadline) => {
                let fired = session.poll_due(Instant::now());
                debug!("{} blur validation(s) fired", fired);
            }
        }

        if !flush(&mut session, &ui_tx).await {
            info!("UI channel closed, shutting down");
            break;
        }
    }

    info!("Session event loop exiting");
    Ok(session)
}

/// Sleep until `deadline`, or forever when there is none.
async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Send every queued update. Returns `false` once the receiver is gone.
async fn flush(session: &mut FormSession, ui_tx: &mpsc::Sender<UiUpdate>) -> bool {
    for update in session.drain_updates() {
        if ui_tx.send(update).await.is_err() {
            return false;
        }
    }
    true
}
