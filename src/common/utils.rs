//! Small helpers shared by the daemon and the one-shot commands.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Render a path with the home directory replaced by `~`.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Check whether a process with `pid` still exists.
pub fn is_process_running(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Outcome of a subprocess run with a deadline.
#[derive(Debug)]
pub enum ProcessOutcome {
    Finished(Output),
    TimedOut,
}

/// Run `command` to completion, killing it if it outlives `timeout`.
///
/// Optional `stdin` is written before waiting; stdout and stderr are captured.
pub fn run_with_timeout(
    mut command: Command,
    stdin: Option<&str>,
    timeout: Duration,
) -> std::io::Result<ProcessOutcome> {
    command
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn()?;

    if let Some(input) = stdin
        && let Some(mut pipe) = child.stdin.take()
    {
        use std::io::Write;
        pipe.write_all(input.as_bytes())?;
        // pipe dropped here so the child sees EOF
    }

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            let mut stdout = Vec::new();
            let mut stderr = Vec::new();
            if let Some(mut out) = child.stdout.take() {
                out.read_to_end(&mut stdout)?;
            }
            if let Some(mut err) = child.stderr.take() {
                err.read_to_end(&mut stderr)?;
            }
            return Ok(ProcessOutcome::Finished(Output {
                status,
                stdout,
                stderr,
            }));
        }

        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(ProcessOutcome::TimedOut);
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_timeout_captures_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "cat"]);
        match run_with_timeout(cmd, Some("coop"), Duration::from_secs(5)).unwrap() {
            ProcessOutcome::Finished(output) => {
                assert!(output.status.success());
                assert_eq!(String::from_utf8_lossy(&output.stdout), "coop");
            }
            ProcessOutcome::TimedOut => panic!("cat should not time out"),
        }
    }

    #[test]
    fn test_run_with_timeout_kills_slow_process() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "sleep 5"]);
        let outcome = run_with_timeout(cmd, None, Duration::from_millis(200)).unwrap();
        assert!(matches!(outcome, ProcessOutcome::TimedOut));
    }

    #[test]
    fn test_current_process_is_running() {
        assert!(is_process_running(std::process::id()));
    }
}
