use std::env;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::error::AppError;

const DEV_INTERPRETER: &str = "python";
const DEV_SCRIPT: &str = "backend/app.py";
#[cfg(windows)]
const PACKAGED_EXECUTABLE: &str = "backend/docfinder-backend.exe";
#[cfg(not(windows))]
const PACKAGED_EXECUTABLE: &str = "backend/docfinder-backend";

const PYTHON_ENV: &str = "DOCFINDER_PYTHON";
const SCRIPT_ENV: &str = "DOCFINDER_BACKEND_SCRIPT";
const EXECUTABLE_ENV: &str = "DOCFINDER_BACKEND_EXE";

const EXIT_WATCH_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    Dev,
    Packaged,
}

/// Fully resolved launch invocation for the backend. Dev mode runs the
/// source entry point under an interpreter; packaged mode runs the compiled
/// executable shipped next to the shell binary. The choice is made from the
/// mode flag alone, never by probing the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCommand {
    pub mode: LaunchMode,
    pub program: PathBuf,
    pub args: Vec<PathBuf>,
}

impl BackendCommand {
    pub fn resolve(mode: LaunchMode) -> Self {
        match mode {
            LaunchMode::Dev => Self {
                mode,
                program: env_path(PYTHON_ENV).unwrap_or_else(|| PathBuf::from(DEV_INTERPRETER)),
                args: vec![env_path(SCRIPT_ENV).unwrap_or_else(|| PathBuf::from(DEV_SCRIPT))],
            },
            LaunchMode::Packaged => Self {
                mode,
                program: env_path(EXECUTABLE_ENV).unwrap_or_else(default_packaged_executable),
                args: Vec::new(),
            },
        }
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn default_packaged_executable() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(PACKAGED_EXECUTABLE)))
        .unwrap_or_else(|| PathBuf::from(PACKAGED_EXECUTABLE))
}

/// Owns the one backend child process. Exit is observed once by a watcher
/// thread; the recorded status stays on the handle after the process is
/// gone. Spawning a second backend without stopping the first is undefined
/// behavior at the product level and is not guarded here.
#[derive(Debug)]
pub struct BackendHandle {
    mode: LaunchMode,
    program: PathBuf,
    child: Arc<Mutex<Child>>,
    exit_status: Arc<Mutex<Option<ExitStatus>>>,
}

impl BackendHandle {
    pub fn mode(&self) -> LaunchMode {
        self.mode
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn exit_status(&self) -> Option<ExitStatus> {
        *self
            .exit_status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Exit code is absent while the process runs (and for signal deaths).
    pub fn exit_code(&self) -> Option<i32> {
        self.exit_status().and_then(|status| status.code())
    }

    pub fn has_exited(&self) -> bool {
        self.exit_status().is_some()
    }
}

pub fn spawn_backend(command: &BackendCommand) -> Result<BackendHandle, AppError> {
    log::info!(
        "starting backend ({:?} mode) from {}",
        command.mode,
        command.program.display()
    );

    let mut child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            AppError::Backend(format!(
                "failed to start backend '{}': {err}",
                command.program.display()
            ))
        })?;

    if let Some(stdout) = child.stdout.take() {
        forward_output("backend", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_output("backend error", stderr);
    }

    let child = Arc::new(Mutex::new(child));
    let exit_status = Arc::new(Mutex::new(None));
    watch_exit(child.clone(), exit_status.clone());

    Ok(BackendHandle {
        mode: command.mode,
        program: command.program.clone(),
        child,
        exit_status,
    })
}

/// Best-effort termination: send the kill and move on without waiting for
/// confirmation. The watcher thread reaps the process and records its exit.
pub fn stop(handle: &BackendHandle) {
    if handle.has_exited() {
        return;
    }
    let mut child = handle
        .child
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Err(err) = child.kill() {
        log::warn!("could not kill backend process: {err}");
    }
}

/// Streams one child pipe to the log sink line-by-line as it arrives, so
/// operators can watch backend startup while the readiness probe is still
/// retrying.
fn forward_output(label: &'static str, pipe: impl Read + Send + 'static) {
    thread::spawn(move || {
        for line in BufReader::new(pipe).lines() {
            match line {
                Ok(line) => log::info!("[{label}] {line}"),
                Err(_) => break,
            }
        }
    });
}

/// An early exit is recorded and logged but does not itself fail the startup
/// flow; an unreachable backend is the readiness probe's call to make.
fn watch_exit(child: Arc<Mutex<Child>>, exit_status: Arc<Mutex<Option<ExitStatus>>>) {
    thread::spawn(move || loop {
        {
            let mut child = child.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            match child.try_wait() {
                Ok(Some(status)) => {
                    log::info!("[backend exited with {status}]");
                    *exit_status
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(status);
                    break;
                }
                Ok(None) => {}
                Err(err) => {
                    log::warn!("backend exit watch failed: {err}");
                    break;
                }
            }
        }
        thread::sleep(EXIT_WATCH_INTERVAL);
    });
}
