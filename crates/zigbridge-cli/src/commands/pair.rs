//! `zigbridge pair` -- request an API key from the gateway.

use std::time::Duration;

use owo_colors::OwoColorize;

use zigbridge_core::StatusDetail;

use crate::cli::{GlobalOpts, PairArgs};
use crate::error::CliError;

/// Run the pairing flow and wait for a key to be granted.
///
/// The bridge polls the gateway until the operator unlocks it; every
/// status transition is echoed so the operator can follow along. Gives
/// up after `--wait` seconds or on Ctrl-C.
pub async fn handle(args: PairArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = super::connect(global)?;
    let bridge = session.bridge;

    if bridge.config().api_key.is_some() {
        if !global.quiet {
            eprintln!("Already paired; an API key is configured.");
        }
        return Ok(());
    }

    let mut status_rx = bridge.status();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.wait);

    bridge.initialize().await;

    let outcome = loop {
        if bridge.config().api_key.is_some() {
            break Ok(());
        }

        let status = status_rx.borrow_and_update().clone();
        if status.detail == StatusDetail::CommunicationError {
            break Err(CliError::ConnectionFailed {
                message: status.message.unwrap_or_else(|| "unknown error".into()),
            });
        }
        if !global.quiet {
            if let Some(ref message) = status.message {
                eprintln!("{message}");
            }
        }

        tokio::select! {
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break Err(CliError::PairingFailed);
                }
            }
            () = tokio::time::sleep_until(deadline) => {
                break Err(CliError::PairingTimedOut { seconds: args.wait });
            }
            result = tokio::signal::ctrl_c() => {
                break match result {
                    Ok(()) => Err(CliError::PairingFailed),
                    Err(e) => Err(CliError::from(e)),
                };
            }
        }
    };

    bridge.dispose();

    if outcome.is_ok() && !global.quiet {
        eprintln!(
            "{} API key granted and saved to {}",
            "Paired.".bold(),
            super::settings_path(global).display()
        );
    }
    outcome
}
