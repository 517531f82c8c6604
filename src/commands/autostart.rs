use super::AutostartAction;
use crate::libs::{autostart, messages::Message};
use crate::msg_print;
use anyhow::Result;

pub fn cmd(action: AutostartAction) -> Result<()> {
    match action {
        AutostartAction::Enable => autostart::enable(),
        AutostartAction::Disable => autostart::disable(),
        AutostartAction::Toggle => autostart::toggle().map(|_| ()),
        AutostartAction::Status => {
            let status = autostart::status()?;
            msg_print!(Message::AutostartStatus(status));
            Ok(())
        }
    }
}
