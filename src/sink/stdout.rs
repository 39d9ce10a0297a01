//! Stdout output: one JSON line per event on stdout. `env_logger` already
//! defaults to stderr, so log lines never mix into the event stream and
//! there is nothing further to redirect here.

use std::io;

use crate::config::StdoutOutputConfig;
use crate::error::SinkError;
use crate::event::AuditEventGroup;
use crate::sink::json_sink::RetryingJsonSink;
use crate::sink::traits::Sink;

pub struct StdoutSink {
    inner: RetryingJsonSink<io::Stdout>,
}

impl StdoutSink {
    pub fn open(config: &StdoutOutputConfig) -> Self {
        Self { inner: RetryingJsonSink::new(io::stdout(), config.attempts) }
    }
}

impl Sink for StdoutSink {
    fn write(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        self.inner.write(group)
    }
}
