use crate::libs::actuator::EnigoActuator;
use crate::libs::calibration::{run_wizard, ConsolePrompt};
use crate::libs::config::Config;
use crate::libs::geometry::Offset;
use crate::libs::messages::Message;
use crate::{msg_error_anyhow, msg_info, msg_print, msg_success};
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::path::{Path, PathBuf};

pub fn cmd(config_path: Option<&Path>) -> Result<()> {
    msg_print!(Message::CalibrationIntro, true);
    let pointer = EnigoActuator::new().map_err(|e| msg_error_anyhow!(Message::InputBackendUnavailable(e.to_string())))?;
    let result = run_wizard(&mut ConsolePrompt, &pointer)?;
    msg_success!(Message::CalibrationResult(result.anchor, result.target, result.offset()));

    let save = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(Message::ConfirmSaveOffset.to_string())
        .default(true)
        .interact()?;
    if save {
        let path = save_offset(config_path, result.offset())?;
        msg_success!(Message::OffsetSaved(path.display().to_string()));
    } else {
        msg_info!(Message::OffsetNotSaved);
    }
    Ok(())
}

/// Writes `offset` into the configuration file, keeping every other key.
pub fn save_offset(config_path: Option<&Path>, offset: Offset) -> Result<PathBuf> {
    let path = Config::location(config_path)?;
    let mut config = Config::read_from(&path)?;
    config.set_offset(offset);
    config.save_to(&path)?;
    Ok(path)
}
