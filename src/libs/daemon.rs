//! Background mode.
//!
//! `--background` relaunches the executable detached from the terminal with
//! the same arguments plus the hidden `--daemon-run` marker. The child's
//! stdout and stderr go to `autocontinue.log` and its PID is recorded in
//! `autocontinue.pid`, both in the data directory. `--stop` reads the PID
//! file and terminates that process.

use crate::libs::data_storage::DataStorage;
use crate::libs::messages::Message;
use crate::{msg_bail_anyhow, msg_error_anyhow, msg_info, msg_warning};
use anyhow::Result;
use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;

pub const PID_FILE: &str = "autocontinue.pid";
pub const LOG_FILE: &str = "autocontinue.log";
pub const DAEMON_RUN_FLAG: &str = "--daemon-run";
pub const BACKGROUND_FLAG: &str = "--background";

pub fn pid_path() -> Result<PathBuf> {
    Ok(DataStorage::new().get_path(PID_FILE)?)
}

pub fn log_path() -> Result<PathBuf> {
    Ok(DataStorage::new().get_path(LOG_FILE)?)
}

/// PID recorded by the last background launch, if any.
pub fn read_pid() -> Result<Option<u32>> {
    let path = pid_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(&path)?;
    let pid = raw.trim().parse().map_err(|_| msg_error_anyhow!(Message::InvalidPidFileContent))?;
    Ok(Some(pid))
}

/// Arguments for the detached child: everything but `--background`, plus the marker.
pub fn child_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out: Vec<OsString> = args
        .into_iter()
        .filter(|arg| arg != BACKGROUND_FLAG && arg != DAEMON_RUN_FLAG)
        .collect();
    out.push(OsString::from(DAEMON_RUN_FLAG));
    out
}

/// Starts a detached instance and returns its PID.
///
/// A previously recorded instance is stopped first.
pub fn spawn(args: Vec<OsString>) -> Result<u32> {
    if let Some(pid) = read_pid().unwrap_or(None) {
        msg_info!(Message::BackgroundStoppingExisting(pid));
        if let Err(e) = stop() {
            msg_warning!(Message::BackgroundFailedToStopExisting(e.to_string()));
            let _ = fs::remove_file(pid_path()?);
        }
        std::thread::sleep(Duration::from_millis(500));
    }

    let exe = std::env::current_exe().map_err(|_| msg_error_anyhow!(Message::FailedToGetCurrentExecutable))?;
    let log = OpenOptions::new().create(true).append(true).open(log_path()?)?;
    let mut command = Command::new(exe);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log.try_clone()?))
        .stderr(Stdio::from(log));

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            command.pre_exec(|| {
                // Leave the terminal's session so closing it does not stop us.
                nix::unistd::setsid()?;
                Ok(())
            });
        }
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x08000000;
        const DETACHED_PROCESS: u32 = 0x00000008;
        command.creation_flags(CREATE_NO_WINDOW | DETACHED_PROCESS);
    }

    #[cfg(not(any(unix, windows)))]
    {
        msg_bail_anyhow!(Message::BackgroundNotSupported);
    }

    let child = command.spawn()?;
    let pid = child.id();
    fs::write(pid_path()?, pid.to_string())?;
    msg_info!(Message::BackgroundStarted(pid, log_path()?.display().to_string()));
    Ok(pid)
}

/// Stops the recorded background instance.
///
/// Returns `false` when nothing was running. The PID file is removed either way.
pub fn stop() -> Result<bool> {
    let Some(pid) = read_pid()? else {
        msg_info!(Message::BackgroundNotRunning);
        return Ok(false);
    };
    let killed = kill_process(pid)?;
    fs::remove_file(pid_path()?)?;
    if killed {
        msg_info!(Message::BackgroundStopped(pid));
    } else {
        msg_info!(Message::BackgroundNotRunning);
    }
    Ok(killed)
}

/// Removes the PID file if it names this process.
pub fn release_pid_file() {
    let ours = matches!(read_pid(), Ok(Some(pid)) if pid == std::process::id());
    if ours {
        if let Ok(path) = pid_path() {
            let _ = fs::remove_file(path);
        }
    }
}

/// Resolves on Ctrl-C, and on SIGTERM where it exists.
pub async fn shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(())
    }
}

#[cfg(windows)]
fn kill_process(pid: u32) -> Result<bool> {
    use winapi::um::errhandlingapi::GetLastError;
    use winapi::um::handleapi::CloseHandle;
    use winapi::um::processthreadsapi::{OpenProcess, TerminateProcess};
    use winapi::um::winnt::PROCESS_TERMINATE;

    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if handle.is_null() {
            let error = GetLastError();
            if error == 87 {
                // ERROR_INVALID_PARAMETER: no such process
                return Ok(false);
            }
            msg_bail_anyhow!(Message::FailedToOpenProcess(error));
        }

        let result = TerminateProcess(handle, 0);
        CloseHandle(handle);

        if result == 0 {
            msg_bail_anyhow!(Message::FailedToTerminateProcess(GetLastError()));
        }
        std::thread::sleep(Duration::from_millis(100));
        Ok(true)
    }
}

#[cfg(unix)]
fn kill_process(pid: u32) -> Result<bool> {
    let alive = |pid: u32| -> Result<bool> { Ok(Command::new("ps").arg("-p").arg(pid.to_string()).output()?.status.success()) };

    if !alive(pid)? {
        return Ok(false);
    }

    Command::new("kill").arg("-TERM").arg(pid.to_string()).output()?;
    for _ in 0..20 {
        std::thread::sleep(Duration::from_millis(100));
        if !alive(pid)? {
            return Ok(true);
        }
    }

    Command::new("kill").arg("-9").arg(pid.to_string()).output()?;
    std::thread::sleep(Duration::from_millis(100));
    Ok(true)
}

#[cfg(not(any(unix, windows)))]
fn kill_process(_pid: u32) -> Result<bool> {
    msg_bail_anyhow!(Message::ProcessTerminationNotSupported);
}
