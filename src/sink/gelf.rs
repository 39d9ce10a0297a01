//! GELF outputs: UDP with optional gzip compression per the GELF wire
//! format, and a null-byte-delimited TCP variant.

use std::io::Write;
use std::net::{TcpStream, UdpSocket};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{Map, Value};

use crate::config::{GelfTcpOutputConfig, GelfUdpOutputConfig};
use crate::error::SinkError;
use crate::event::AuditEventGroup;
use crate::sink::json_sink::retry;
use crate::sink::traits::Sink;

fn local_hostname() -> String {
    let mut buf = [0u8; 256];
    let result = unsafe { libc::gethostname(buf.as_mut_ptr() as *mut libc::c_char, buf.len()) };
    if result != 0 {
        return "unknown".to_string();
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..end]).into_owned()
}

/// Wraps the event in a minimal GELF 1.1 envelope, flattening the event's
/// own fields into underscore-prefixed additional fields.
fn gelf_envelope(group: &AuditEventGroup, host: &str) -> Result<Vec<u8>, SinkError> {
    let value = serde_json::to_value(group).map_err(SinkError::Encode)?;
    let fields = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let mut envelope = Map::new();
    envelope.insert("version".to_string(), Value::String("1.1".to_string()));
    envelope.insert("host".to_string(), Value::String(host.to_string()));
    envelope.insert(
        "short_message".to_string(),
        Value::String(format!("audit event sequence={}", group.sequence)),
    );
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    envelope.insert("timestamp".to_string(), serde_json::json!(now.as_secs_f64()));
    envelope.insert("level".to_string(), serde_json::json!(6));

    for (key, value) in fields {
        envelope.insert(format!("_{key}"), value);
    }

    serde_json::to_vec(&Value::Object(envelope)).map_err(SinkError::Encode)
}

fn gzip(data: &[u8]) -> Result<Vec<u8>, SinkError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(SinkError::Write)?;
    encoder.finish().map_err(SinkError::Write)
}

pub struct GelfUdpSink {
    socket: UdpSocket,
    host: String,
    compress: bool,
    attempts: u32,
}

impl GelfUdpSink {
    pub fn open(config: &GelfUdpOutputConfig) -> Result<Self, SinkError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .map_err(|err| SinkError::Open(format!("failed to bind gelf-udp socket: {}", err)))?;
        socket
            .connect(&config.address)
            .map_err(|err| SinkError::Open(format!("failed to connect gelf-udp socket to {}: {}", config.address, err)))?;

        Ok(Self {
            socket,
            host: local_hostname(),
            compress: config.compression == "gzip",
            attempts: config.attempts,
        })
    }

    fn write_once(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        let envelope = gelf_envelope(group, &self.host)?;
        let payload = if self.compress { gzip(&envelope)? } else { envelope };
        self.socket.send(&payload).map_err(SinkError::Write)?;
        Ok(())
    }
}

impl Sink for GelfUdpSink {
    fn write(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        retry(self.attempts, || self.write_once(group))
    }
}

pub struct GelfTcpSink {
    stream: TcpStream,
    address: String,
    host: String,
    attempts: u32,
}

impl GelfTcpSink {
    pub fn open(config: &GelfTcpOutputConfig) -> Result<Self, SinkError> {
        let stream = TcpStream::connect(&config.address)
            .map_err(|err| SinkError::Open(format!("failed to connect gelf-tcp socket to {}: {}", config.address, err)))?;
        Ok(Self { stream, address: config.address.clone(), host: local_hostname(), attempts: config.attempts })
    }

    fn write_once(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        let mut envelope = gelf_envelope(group, &self.host)?;
        envelope.push(0); // GELF TCP frames are null-byte terminated; no compression over TCP.

        if let Err(err) = self.stream.write_all(&envelope) {
            if let Ok(reconnected) = TcpStream::connect(&self.address) {
                self.stream = reconnected;
            }
            return Err(SinkError::Write(err));
        }
        Ok(())
    }
}

impl Sink for GelfTcpSink {
    fn write(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        retry(self.attempts, || self.write_once(group))
    }
}
