//! Output sinks: one JSON line per completed event, delivered to exactly
//! one configured destination. `build` selects among the six output
//! transports; `config::Settings::validate` already guarantees exactly
//! one is enabled.

mod file;
mod gelf;
mod http;
mod json_sink;
mod stdout;
mod syslog_sink;
mod traits;

pub use traits::Sink;

use crate::config::OutputConfig;
use crate::error::SinkError;

/// Builds the single enabled output sink. `config::Settings::validate` has
/// already rejected zero or multiple enabled outputs by the time this runs.
pub fn build(config: &OutputConfig) -> Result<Box<dyn Sink>, SinkError> {
    if config.syslog.enabled {
        return Ok(Box::new(syslog_sink::SyslogSink::open(&config.syslog)?));
    }
    if config.file.enabled {
        return Ok(Box::new(file::FileSink::open(&config.file)?));
    }
    if config.stdout.enabled {
        return Ok(Box::new(stdout::StdoutSink::open(&config.stdout)));
    }
    if config.gelf_udp.enabled {
        return Ok(Box::new(gelf::GelfUdpSink::open(&config.gelf_udp)?));
    }
    if config.gelf_tcp.enabled {
        return Ok(Box::new(gelf::GelfTcpSink::open(&config.gelf_tcp)?));
    }
    if config.http.enabled {
        return Ok(Box::new(http::HttpSink::open(&config.http)?));
    }
    Err(SinkError::Open("no output enabled".to_string()))
}
