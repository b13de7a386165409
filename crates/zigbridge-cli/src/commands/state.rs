//! `zigbridge state` -- show the gateway's configuration snapshot.

use owo_colors::OwoColorize;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let session = super::connect_paired(global)?;
    let bridge = session.bridge;

    let state = bridge.full_state().await.ok_or(CliError::StateUnavailable)?;
    let config = &state.config;

    let mut out = String::new();
    let mut line = |label: &str, value: &str| {
        out.push_str(&format!("{:<18} {}\n", label.bold(), value));
    };
    line("Name:", &config.name);
    line("API version:", &config.apiversion);
    line("Software:", &config.swversion);
    line("Firmware:", &config.fwversion);
    line("Network UUID:", &config.uuid);
    line("Zigbee channel:", &config.zigbeechannel.to_string());
    line("IP address:", &config.ipaddress);
    line("Websocket port:", &config.websocketport.to_string());
    print!("{out}");

    Ok(())
}
