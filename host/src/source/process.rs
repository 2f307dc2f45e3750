use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::{record::parse_record, SourceRead};
use crate::config::ProducerConfig;
use crate::error::StartError;

/// How often shutdown re-checks the child while waiting for it to exit
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Longest producer line kept; anything longer is skipped
const MAX_LINE_BYTES: usize = 256 * 1024;

/// Pose source backed by an external producer process.
///
/// A reader thread forwards stdout lines over a channel so `read` never
/// blocks longer than the poll timeout. The child is released by
/// [`shutdown`](Self::shutdown), which also runs on drop.
pub struct ProcessSource {
    child: Option<Child>,
    lines: Receiver<String>,
    scale: (f32, f32),
    poll_timeout: Duration,
    shutdown_grace: Duration,
    /// Set once the producer is known to be gone
    terminated: bool,
}

impl ProcessSource {
    /// Launch the producer and wait out its warm-up.
    pub fn start(config: &ProducerConfig, scale: (f32, f32)) -> Result<Self, StartError> {
        let (program, args) = config.command.split_first().ok_or(StartError::EmptyCommand)?;

        info!("Launching pose producer: {}", config.command.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| StartError::Spawn {
                command: program.clone(),
                source,
            })?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(StartError::MissingStdout);
        };
        let (tx, rx) = mpsc::channel();
        spawn_stdout_reader(stdout, tx);
        if let Some(stderr) = child.stderr.take() {
            spawn_stderr_logger(stderr);
        }

        let mut source = Self {
            child: Some(child),
            lines: rx,
            scale,
            poll_timeout: config.poll_timeout(),
            shutdown_grace: config.shutdown_grace(),
            terminated: false,
        };

        thread::sleep(config.warmup());

        if let Some(status) = source.exit_status() {
            source.shutdown();
            return Err(StartError::ExitedDuringWarmup { status });
        }

        info!("Pose producer ready (pid {})", source.pid().unwrap_or_default());
        Ok(source)
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    /// Wait up to the poll timeout for output and parse the newest line.
    pub fn read(&mut self) -> SourceRead {
        self.read_within(self.poll_timeout)
    }

    /// Same as [`read`](Self::read) with the wait capped at `budget`
    pub fn read_within(&mut self, budget: Duration) -> SourceRead {
        if self.terminated {
            return SourceRead::NoFrame;
        }
        if let Some(status) = self.exit_status() {
            self.terminated = true;
            return SourceRead::Terminated { status: Some(status) };
        }

        let first = match self.lines.recv_timeout(budget.min(self.poll_timeout)) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => return SourceRead::NoFrame,
            Err(RecvTimeoutError::Disconnected) => {
                // stdout closed: nothing more can arrive even if the process lingers
                self.terminated = true;
                return SourceRead::Terminated {
                    status: self.exit_status(),
                };
            }
        };

        // Only the most recent record matters; drop anything older
        let mut latest = first;
        while let Ok(next) = self.lines.try_recv() {
            if !next.trim().is_empty() {
                latest = next;
            }
        }

        let line = latest.trim();
        if line.is_empty() {
            return SourceRead::NoFrame;
        }
        match parse_record(line, self.scale) {
            Ok(Some(frame)) => SourceRead::Frame(frame),
            Ok(None) => SourceRead::NoFrame,
            Err(e) => SourceRead::Malformed(e),
        }
    }

    pub fn is_alive(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        if self.exit_status().is_some() {
            self.terminated = true;
            return false;
        }
        self.child.is_some()
    }

    /// Ask the producer to exit, then kill it after the grace period.
    /// Safe to call any number of times.
    pub fn shutdown(&mut self) {
        self.terminated = true;
        let Some(mut child) = self.child.take() else {
            return;
        };

        if let Ok(Some(status)) = child.try_wait() {
            debug!("Producer already exited ({})", status);
            return;
        }

        request_terminate(&mut child);
        let deadline = Instant::now() + self.shutdown_grace;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!("Producer exited ({})", status);
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
                Ok(None) => {
                    warn!(
                        "Producer did not exit within {:?}, killing it",
                        self.shutdown_grace
                    );
                    break;
                }
                Err(e) => {
                    warn!("Failed to query producer status: {}", e);
                    break;
                }
            }
        }

        if let Err(e) = child.kill() {
            warn!("Failed to kill producer: {}", e);
        }
        let _ = child.wait();
    }

    fn exit_status(&mut self) -> Option<ExitStatus> {
        let child = self.child.as_mut()?;
        match child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                warn!("Failed to query producer status: {}", e);
                None
            }
        }
    }
}

impl Drop for ProcessSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(unix)]
fn request_terminate(child: &mut Child) {
    let pid = child.id() as libc::pid_t;
    // SAFETY: pid belongs to a child we have not yet reaped
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc != 0 {
        warn!("SIGTERM to producer failed, killing it");
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn request_terminate(child: &mut Child) {
    let _ = child.kill();
}

fn spawn_stdout_reader<R: Read + Send + 'static>(stdout: R, tx: Sender<String>) {
    thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            match read_line_capped(&mut reader, &mut buf, MAX_LINE_BYTES) {
                Ok(Line::Eof) => break,
                Ok(Line::TooLong) => {
                    warn!("Dropping producer line longer than {} bytes", MAX_LINE_BYTES);
                }
                Ok(Line::Complete) => {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Error reading producer output: {}", e);
                    break;
                }
            }
        }
        debug!("Producer stdout closed");
    });
}

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Complete,
    TooLong,
    Eof,
}

/// Read one newline-terminated line into `buf`, holding at most `limit`
/// bytes of it. An over-long line is consumed up to its newline and
/// reported as `TooLong` with `buf` left empty.
fn read_line_capped<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>, limit: usize) -> io::Result<Line> {
    buf.clear();
    let n = reader.by_ref().take(limit as u64 + 1).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(Line::Eof);
    }
    if buf.len() <= limit || buf.ends_with(b"\n") {
        return Ok(Line::Complete);
    }

    buf.clear();
    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        match chunk.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                break;
            }
            None => {
                let len = chunk.len();
                reader.consume(len);
            }
        }
    }
    Ok(Line::TooLong)
}

fn spawn_stderr_logger<R: Read + Send + 'static>(stderr: R) {
    thread::spawn(move || {
        for line in BufReader::new(stderr).lines() {
            match line {
                Ok(line) => debug!(target: "producer", "{}", line),
                Err(_) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn over_long_line_is_skipped_to_its_newline() {
        let mut reader = Cursor::new(b"0123456789abcdef\n{\"poses\":[]}\npartial".to_vec());
        let mut buf = Vec::new();

        assert_eq!(read_line_capped(&mut reader, &mut buf, 12).unwrap(), Line::TooLong);
        assert!(buf.is_empty());

        assert_eq!(read_line_capped(&mut reader, &mut buf, 12).unwrap(), Line::Complete);
        assert_eq!(buf, b"{\"poses\":[]}\n");

        assert_eq!(read_line_capped(&mut reader, &mut buf, 12).unwrap(), Line::Complete);
        assert_eq!(buf, b"partial");

        assert_eq!(read_line_capped(&mut reader, &mut buf, 12).unwrap(), Line::Eof);
    }

    #[test]
    fn line_at_the_limit_is_kept() {
        let mut reader = Cursor::new(b"abcd\nabcde".to_vec());
        let mut buf = Vec::new();

        assert_eq!(read_line_capped(&mut reader, &mut buf, 4).unwrap(), Line::Complete);
        assert_eq!(buf, b"abcd\n");
        assert_eq!(read_line_capped(&mut reader, &mut buf, 4).unwrap(), Line::TooLong);
        assert_eq!(read_line_capped(&mut reader, &mut buf, 4).unwrap(), Line::Eof);
    }
}
