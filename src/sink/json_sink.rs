//! Shared retry loop: retries a write up to `attempts` times, sleeping 1
//! second between failures.

use std::io::Write;
use std::time::Duration;

use crate::error::SinkError;
use crate::event::AuditEventGroup;
use crate::sink::traits::Sink;

pub(crate) fn retry<F>(attempts: u32, mut attempt: F) -> Result<(), SinkError>
where
    F: FnMut() -> Result<(), SinkError>,
{
    let attempts = attempts.max(1);
    let mut last_err = None;
    for i in 0..attempts {
        match attempt() {
            Ok(()) => return Ok(()),
            Err(err) => {
                log::error!("failed to write event, retrying in 1 second: {}", err);
                last_err = Some(err);
                if i + 1 < attempts {
                    std::thread::sleep(Duration::from_secs(1));
                }
            }
        }
    }
    Err(last_err.unwrap_or(SinkError::Exhausted { attempts }))
}

/// One JSON line per event, written directly to any `io::Write`
/// destination (file, stdout, raw TCP stream).
pub struct RetryingJsonSink<W: Write + Send> {
    writer: W,
    attempts: u32,
}

impl<W: Write + Send> RetryingJsonSink<W> {
    pub fn new(writer: W, attempts: u32) -> Self {
        Self { writer, attempts }
    }

    pub fn replace_writer(&mut self, writer: W) {
        self.writer = writer;
    }

    fn write_once(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        let mut line = serde_json::to_vec(group).map_err(SinkError::Encode)?;
        line.push(b'\n');
        self.writer.write_all(&line).map_err(SinkError::Write)?;
        self.writer.flush().map_err(SinkError::Write)
    }
}

impl<W: Write + Send> Sink for RetryingJsonSink<W> {
    fn write(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        retry(self.attempts, || self.write_once(group))
    }
}
