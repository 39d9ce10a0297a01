//! Syslog output: dials a syslog destination using the `syslog` crate's
//! `Formatter3164`/`unix`/`tcp`/`udp` constructors.

use syslog::{Facility, Formatter3164, Logger, LoggerBackend};

use crate::config::SyslogOutputConfig;
use crate::error::SinkError;
use crate::event::AuditEventGroup;
use crate::sink::json_sink::retry;
use crate::sink::traits::Sink;

/// `priority` is packed as `facility << 3 | severity`, matching the Go
/// `log/syslog.Priority` encoding the configuration value was written for.
fn facility_from_code(code: i64) -> Facility {
    match code >> 3 {
        0 => Facility::LOG_KERN,
        1 => Facility::LOG_USER,
        2 => Facility::LOG_MAIL,
        3 => Facility::LOG_DAEMON,
        4 => Facility::LOG_AUTH,
        5 => Facility::LOG_SYSLOG,
        6 => Facility::LOG_LPR,
        7 => Facility::LOG_NEWS,
        8 => Facility::LOG_UUCP,
        9 => Facility::LOG_CRON,
        10 => Facility::LOG_AUTHPRIV,
        11 => Facility::LOG_FTP,
        16 => Facility::LOG_LOCAL0,
        17 => Facility::LOG_LOCAL1,
        18 => Facility::LOG_LOCAL2,
        19 => Facility::LOG_LOCAL3,
        20 => Facility::LOG_LOCAL4,
        21 => Facility::LOG_LOCAL5,
        22 => Facility::LOG_LOCAL6,
        23 => Facility::LOG_LOCAL7,
        _ => Facility::LOG_USER,
    }
}

pub struct SyslogSink {
    logger: Logger<LoggerBackend, Formatter3164>,
    severity: u8,
    attempts: u32,
}

impl SyslogSink {
    pub fn open(config: &SyslogOutputConfig) -> Result<Self, SinkError> {
        let formatter = Formatter3164 {
            facility: facility_from_code(config.priority),
            hostname: None,
            process: config.tag.clone(),
            pid: std::process::id() as i32,
        };

        let logger = match config.network.as_str() {
            "" | "unix" => syslog::unix(formatter),
            "tcp" => syslog::tcp(formatter, config.address.as_str()),
            "udp" => syslog::udp(formatter, "0.0.0.0:0", config.address.as_str()),
            other => return Err(SinkError::Open(format!("unsupported syslog network {}", other))),
        }
        .map_err(|err| SinkError::Open(format!("failed to open syslog writer: {}", err)))?;

        Ok(Self { logger, severity: (config.priority & 0x7) as u8, attempts: config.attempts })
    }

    fn write_once(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        let line = serde_json::to_string(group).map_err(SinkError::Encode)?;
        let result = match self.severity {
            0 => self.logger.emerg(line),
            1 => self.logger.alert(line),
            2 => self.logger.crit(line),
            3 => self.logger.err(line),
            4 => self.logger.warning(line),
            5 => self.logger.notice(line),
            6 => self.logger.info(line),
            _ => self.logger.debug(line),
        };
        result.map_err(|err| SinkError::Open(format!("syslog write failed: {}", err)))
    }
}

impl Sink for SyslogSink {
    fn write(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        retry(self.attempts, || self.write_once(group))
    }
}
