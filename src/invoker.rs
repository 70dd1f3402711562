//! Running the external configure step.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::target::Target;
use crate::workdir::WorkDir;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of one configure invocation.
#[derive(Debug)]
pub struct ConfigureRun {
    pub output: Output,
}

impl ConfigureRun {
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn success(&self) -> bool {
        self.output.status.success()
    }

    /// Turn a non-zero exit into an error carrying both streams.
    pub fn ensure_success(&self) -> Result<()> {
        if self.success() {
            return Ok(());
        }
        Err(HarnessError::ConfigureFailed {
            code: self.output.status.code(),
            stdout: self.stdout_str(),
            stderr: self.stderr_str(),
        })
    }
}

/// Build `<tool> <generator> [toolchain] [flags...] <source>` for `target`.
pub fn configure_command(cfg: &HarnessConfig, target: Target, flags: &[String]) -> Command {
    let mut cmd = Command::new(&cfg.configure_tool);
    cmd.arg(&cfg.generator);
    if let Some(toolchain) = target.toolchain_flag(&cfg.source_dir) {
        cmd.arg(toolchain);
    }
    cmd.args(flags);
    cmd.arg(&cfg.source_dir);
    cmd.current_dir(&cfg.build_dir);
    cmd
}

/// Wipe the build directory and run the configure step in it.
///
/// The returned run may carry a non-zero status; callers decide via
/// [`ConfigureRun::ensure_success`].
pub fn run_configure(cfg: &HarnessConfig, target: Target, flags: &[String]) -> Result<ConfigureRun> {
    let workdir = WorkDir::acquire(&cfg.build_dir)?;
    let mut cmd = configure_command(cfg, target, flags);
    log::debug!(
        "running {:?} {:?} in {}",
        cmd.get_program(),
        cmd.get_args().collect::<Vec<_>>(),
        workdir.path().display()
    );

    let output = match cfg.timeout {
        None => cmd.output().map_err(HarnessError::Spawn)?,
        Some(limit) => output_with_timeout(&mut cmd, limit)?,
    };
    log::debug!("configure exited with {}", output.status);
    Ok(ConfigureRun { output })
}

fn output_with_timeout(cmd: &mut Command, limit: Duration) -> Result<Output> {
    isolate(cmd);
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(HarnessError::Spawn)?;

    // Drain both pipes concurrently so a chatty child never blocks on write.
    let stdout = drain("stdout", child.stdout.take());
    let stderr = drain("stderr", child.stderr.take());

    match wait_until(&mut child, Instant::now() + limit)? {
        Some(status) => Ok(Output {
            status,
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        }),
        None => {
            // Readers are detached: a grandchild that escaped the group kill
            // may still hold the pipes open.
            log::warn!("configure exceeded {}s, killed", limit.as_secs());
            Err(HarnessError::Timeout(limit))
        }
    }
}

/// Start the tool as leader of its own process group so the whole tree can
/// be signalled at once.
#[cfg(unix)]
fn isolate(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate(_cmd: &mut Command) {}

/// Kill `child` together with everything it spawned, then reap it.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
            // SAFETY: plain syscall on a process group we created; no memory involved.
            let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
            if rc != 0 {
                log::warn!(
                    "failed to kill process group {pgid}: {}",
                    std::io::Error::last_os_error()
                );
            }
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

fn drain<R: Read + Send + 'static>(
    name: &'static str,
    pipe: Option<R>,
) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            if let Err(e) = p.read_to_end(&mut buf) {
                log::warn!("reading configure {name} failed after {} bytes: {e}", buf.len());
            }
        }
        buf
    })
}

/// Wait for `child`, killing its process group at `deadline`. `None` means it
/// was killed.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait().map_err(HarnessError::Spawn)? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_tree(child);
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
