// Detached periodic command runner
// Repeats a command every second forever. There is no backoff, no failure
// cap and no drift correction: each run starts one interval after the
// previous one finished.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::time::Duration;

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};
use nix::sys::stat::{Mode, umask};
use nix::unistd::{ForkResult, fork, setsid};
use tracing::{debug, info, warn};

use crate::error::CronError;

/// Interval between two runs of a periodic command
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// File mode creation mask of the detached runner
const DAEMON_UMASK: u32 = 0o002;

/// Exclusive lock on a pid file, released and removed on drop
pub struct PidLock {
    path: PathBuf,
    lock: Option<Flock<File>>,
}

impl std::fmt::Debug for PidLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidLock")
            .field("path", &self.path)
            .field("held", &self.lock.is_some())
            .finish()
    }
}

impl PidLock {
    /// Take the lock and record the current pid in `path`.
    pub fn acquire(path: &Path) -> Result<Self, CronError> {
        let io_error = |source| CronError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(io_error)?;

        let mut lock = match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => lock,
            Err((_, Errno::EWOULDBLOCK)) => return Err(CronError::LockHeld(path.to_path_buf())),
            Err((_, errno)) => return Err(CronError::Detach(errno)),
        };

        lock.set_len(0).map_err(io_error)?;
        writeln!(lock, "{}", std::process::id()).map_err(io_error)?;
        lock.flush().map_err(io_error)?;

        debug!(path = %path.display(), "Acquired pid lock");
        Ok(Self {
            path: path.to_path_buf(),
            lock: Some(lock),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidLock {
    fn drop(&mut self) {
        if let Some(lock) = self.lock.take() {
            let _ = std::fs::remove_file(&self.path);
            drop(lock);
        }
    }
}

/// A shell command repeated at a fixed interval
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timer {
    command: String,
    interval: Duration,
}

impl Timer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the command once through `sh -c`.
    pub fn run_once(&self) -> Result<ExitStatus, CronError> {
        Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .status()
            .map_err(|source| CronError::Spawn {
                command: self.command.clone(),
                source,
            })
    }

    /// Run the command forever, one interval apart. Failures are logged and
    /// the loop carries on.
    pub fn run_forever(&self) -> ! {
        loop {
            match self.run_once() {
                Ok(status) if !status.success() => {
                    warn!(command = %self.command, status = %status, "Periodic command failed");
                }
                Err(e) => warn!(command = %self.command, "{}", e),
                Ok(_) => {}
            }
            std::thread::sleep(self.interval);
        }
    }
}

/// Detach from the controlling terminal: fork, start a new session, fork
/// again. Only the grandchild returns; both parents exit immediately.
fn detach() -> Result<(), CronError> {
    // SAFETY: called before any other thread is started by this process.
    match unsafe { fork() }? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }
    setsid()?;
    // SAFETY: the session leader is still single-threaded.
    match unsafe { fork() }? {
        ForkResult::Parent { .. } => std::process::exit(0),
        ForkResult::Child => {}
    }
    umask(Mode::from_bits_truncate(DAEMON_UMASK));
    Ok(())
}

/// Run `command` every second in a detached background process bound to the
/// pid lock file `pid_file`.
///
/// Returns only on failure to detach or to take the lock; the calling process
/// itself exits once the background process has been forked.
pub fn spawn_periodic(command: &str, pid_file: &Path) -> Result<(), CronError> {
    // Resolve before detaching so a relative path keeps its meaning
    let pid_file = std::path::absolute(pid_file).map_err(|source| CronError::Io {
        path: pid_file.to_path_buf(),
        source,
    })?;

    detach()?;
    let _lock = PidLock::acquire(&pid_file)?;
    info!(command, pid_file = %pid_file.display(), "Started periodic command");
    Timer::new(command).run_forever()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_lock_records_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cron.pid");

        let lock = PidLock::acquire(&path).unwrap();
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_pid_lock_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cron.pid");

        let _held = PidLock::acquire(&path).unwrap();
        let err = PidLock::acquire(&path).unwrap_err();
        assert!(matches!(err, CronError::LockHeld(_)));
    }

    #[test]
    fn test_pid_lock_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cron.pid");

        drop(PidLock::acquire(&path).unwrap());
        assert!(!path.exists());
        assert!(PidLock::acquire(&path).is_ok());
    }

    #[test]
    fn test_timer_run_once() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let timer = Timer::new(format!("touch {}", marker.display()));

        assert!(timer.run_once().unwrap().success());
        assert!(marker.exists());
    }

    #[test]
    fn test_timer_keeps_quoted_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let timer = Timer::new(format!("printf '[%s]' 'a b' > {}", out.display()));

        assert!(timer.run_once().unwrap().success());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "[a b]");
    }

    #[test]
    fn test_timer_reports_failure_status() {
        let timer = Timer::new("exit 4");
        assert_eq!(timer.run_once().unwrap().code(), Some(4));
    }

    #[test]
    fn test_timer_default_interval() {
        let timer = Timer::new("true");
        assert_eq!(timer, Timer::new("true").with_interval(Duration::from_secs(1)));
        assert_eq!(timer.command(), "true");
    }
}
