//! `zigbridge config` -- inspect the persisted settings.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let mut settings = super::effective_settings(global)?;
            super::redact_api_key(&mut settings);
            print!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", super::settings_path(global).display());
            Ok(())
        }
    }
}
