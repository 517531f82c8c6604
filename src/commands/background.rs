use crate::libs::daemon;
use anyhow::Result;
use std::env;

/// Relaunches this invocation detached, without `--background`.
pub fn cmd() -> Result<()> {
    daemon::spawn(daemon::child_args(env::args_os().skip(1)))?;
    Ok(())
}

pub fn stop() -> Result<()> {
    daemon::stop()?;
    Ok(())
}
