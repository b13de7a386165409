//! `zigbridge watch` -- follow the live event stream.

use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Bring the bridge online and print status transitions and raw events
/// until Ctrl-C.
pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let session = super::connect_paired(global)?;
    let bridge = session.bridge;

    let mut status_rx = bridge.status();
    let mut frames = session.connection.subscribe();

    bridge.initialize().await;

    let outcome = loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                break result.map_err(CliError::from);
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let status = status_rx.borrow_and_update().clone();
                if !global.quiet {
                    eprintln!("{} {status}", "status:".bold());
                }
            }
            frame = frames.recv() => match frame {
                Ok(event) => {
                    if !global.quiet {
                        println!("{event}");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "event consumer lagging, frames dropped");
                }
                Err(RecvError::Closed) => break Ok(()),
            }
        }
    };

    bridge.dispose();
    outcome
}
