//! Two-point calibration of the click offset.
//!
//! The operator hovers over the idle cue and confirms, then hovers over the
//! place that should be clicked and confirms again. The offset is the
//! difference between the two pointer positions.

use crate::libs::actuator::PointerPosition;
use crate::libs::geometry::{Offset, Point};
use crate::libs::messages::Message;
use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input};
use tracing::debug;

/// A blocking "press Enter when ready" step.
pub trait Prompt {
    fn wait(&mut self, instruction: &str) -> Result<()>;
}

/// Waits for Enter on the terminal.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn wait(&mut self, instruction: &str) -> Result<()> {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(instruction)
            .allow_empty(true)
            .interact_text()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationResult {
    /// Center of the idle cue as pointed at by the operator.
    pub anchor: Point,
    /// Where the control loop should click.
    pub target: Point,
}

impl CalibrationResult {
    pub fn offset(&self) -> Offset {
        self.target - self.anchor
    }
}

/// Runs exactly two prompts and samples the pointer after each.
pub fn run_wizard<P, R>(prompt: &mut P, pointer: &R) -> Result<CalibrationResult>
where
    P: Prompt + ?Sized,
    R: PointerPosition + ?Sized,
{
    prompt.wait(&Message::CalibrationPointAtIcon.to_string())?;
    let anchor = pointer.position()?;
    debug!("calibration anchor {}", anchor);

    prompt.wait(&Message::CalibrationPointAtTarget.to_string())?;
    let target = pointer.position()?;
    debug!("calibration target {}", target);

    Ok(CalibrationResult { anchor, target })
}
