//! Configuration: loads the keyed bag the supervisor builds its
//! components from into a `serde`-deserializable tree via the `config`
//! crate.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

fn default_true() -> bool {
    true
}

fn default_attempts_one() -> u32 {
    1
}

fn default_syslog_attempts() -> u32 {
    3
}

fn default_max_out_of_order() -> u32 {
    500
}

fn default_events_min() -> u16 {
    1300
}

fn default_events_max() -> u16 {
    1399
}

fn default_syslog_tag() -> String {
    "auditrs".to_string()
}

fn default_file_mode() -> u32 {
    0o644
}

fn default_worker_count() -> usize {
    4
}

fn default_queue_size() -> usize {
    1000
}

fn default_pid_cache_size() -> usize {
    1024
}

fn default_dns_cache_size() -> usize {
    4096
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanaryConfig {
    pub enabled: bool,
    pub host: String,
    pub port: String,
}

impl Default for CanaryConfig {
    fn default() -> Self {
        Self { enabled: false, host: "127.0.0.1".to_string(), port: "7878".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsRange {
    #[serde(default = "default_events_min")]
    pub min: u16,
    #[serde(default = "default_events_max")]
    pub max: u16,
}

impl Default for EventsRange {
    fn default() -> Self {
        Self { min: default_events_min(), max: default_events_max() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTrackingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub log_out_of_order: bool,
    #[serde(default = "default_max_out_of_order")]
    pub max_out_of_order: u32,
}

impl Default for MessageTrackingConfig {
    fn default() -> Self {
        Self { enabled: true, log_out_of_order: false, max_out_of_order: default_max_out_of_order() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocketBufferConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRuleConfig {
    pub message_type: u16,
    pub regex: String,
    pub syscall: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyslogOutputConfig {
    pub enabled: bool,
    #[serde(default = "default_syslog_attempts")]
    pub attempts: u32,
    pub network: String,
    pub address: String,
    pub priority: i64,
    #[serde(default = "default_syslog_tag")]
    pub tag: String,
}

impl Default for SyslogOutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attempts: default_syslog_attempts(),
            network: String::new(),
            address: String::new(),
            priority: (16 << 3) | 4, // LOG_LOCAL0 | LOG_WARNING
            tag: default_syslog_tag(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub enabled: bool,
    #[serde(default = "default_attempts_one")]
    pub attempts: u32,
    pub path: String,
    #[serde(default = "default_file_mode")]
    pub mode: u32,
    pub user: String,
    pub group: String,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attempts: default_attempts_one(),
            path: String::new(),
            mode: default_file_mode(),
            user: String::new(),
            group: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StdoutOutputConfig {
    pub enabled: bool,
    #[serde(default = "default_attempts_one")]
    pub attempts: u32,
}

impl Default for StdoutOutputConfig {
    fn default() -> Self {
        Self { enabled: false, attempts: default_attempts_one() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GelfUdpOutputConfig {
    pub enabled: bool,
    #[serde(default = "default_attempts_one")]
    pub attempts: u32,
    pub address: String,
    pub compression: String,
}

impl Default for GelfUdpOutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attempts: default_attempts_one(),
            address: String::new(),
            compression: "gzip".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GelfTcpOutputConfig {
    pub enabled: bool,
    #[serde(default = "default_attempts_one")]
    pub attempts: u32,
    pub address: String,
}

impl Default for GelfTcpOutputConfig {
    fn default() -> Self {
        Self { enabled: false, attempts: default_attempts_one(), address: String::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpOutputConfig {
    pub enabled: bool,
    #[serde(default = "default_attempts_one")]
    pub attempts: u32,
    pub url: String,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_cert: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<String>,
}

impl Default for HttpOutputConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            attempts: default_attempts_one(),
            url: String::new(),
            worker_count: default_worker_count(),
            queue_size: default_queue_size(),
            client_cert: None,
            client_key: None,
            ca_cert: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub syslog: SyslogOutputConfig,
    pub file: FileOutputConfig,
    pub stdout: StdoutOutputConfig,
    #[serde(rename = "gelf-udp")]
    pub gelf_udp: GelfUdpOutputConfig,
    #[serde(rename = "gelf-tcp")]
    pub gelf_tcp: GelfTcpOutputConfig,
    pub http: HttpOutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainersConfig {
    pub enabled: bool,
    pub docker: bool,
    pub docker_api_version: String,
    pub containerd: bool,
    pub containerd_sock: String,
    pub containerd_namespace: String,
    #[serde(default = "default_pid_cache_size")]
    pub pid_cache: usize,
    #[serde(default = "default_pid_cache_size")]
    pub docker_cache: usize,
    #[serde(default = "default_pid_cache_size")]
    pub containerd_cache: usize,
}

impl Default for ContainersConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            docker: false,
            docker_api_version: "1.24".to_string(),
            containerd: false,
            containerd_sock: "/run/containerd/containerd.sock".to_string(),
            containerd_namespace: String::new(),
            pid_cache: default_pid_cache_size(),
            docker_cache: default_pid_cache_size(),
            containerd_cache: default_pid_cache_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CgroupsConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub enabled: bool,
    pub pairs: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub enabled: bool,
    pub pairs: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DnstapConfig {
    pub enabled: bool,
    pub socket_path: String,
    #[serde(default = "default_dns_cache_size")]
    pub cache_size: usize,
}

impl Default for DnstapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            socket_path: "/var/run/auditrs-dnstap.sock".to_string(),
            cache_size: default_dns_cache_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrasConfig {
    pub containers: ContainersConfig,
    pub cgroups: CgroupsConfig,
    pub labels: LabelsConfig,
    pub metadata: MetadataConfig,
    pub dnstap: DnstapConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub flags: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub canary: CanaryConfig,
    pub events: EventsRange,
    pub message_tracking: MessageTrackingConfig,
    pub socket_buffer: SocketBufferConfig,
    pub rules: Vec<String>,
    pub output: OutputConfig,
    pub filters: Vec<FilterRuleConfig>,
    pub extras: ExtrasConfig,
    pub log: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            canary: CanaryConfig::default(),
            events: EventsRange::default(),
            message_tracking: MessageTrackingConfig::default(),
            socket_buffer: SocketBufferConfig::default(),
            rules: Vec::new(),
            output: OutputConfig::default(),
            filters: Vec::new(),
            extras: ExtrasConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Settings {
    /// Loads and validates settings from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let built = config::Config::builder()
            .add_source(config::File::from(path))
            .build()?;
        let settings: Settings = built.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Enforces "exactly one output enabled" and "attempts >= 1".
    fn validate(&self) -> Result<(), ConfigError> {
        let mut enabled: Vec<(&'static str, u32)> = Vec::new();
        if self.output.syslog.enabled {
            enabled.push(("syslog", self.output.syslog.attempts));
        }
        if self.output.file.enabled {
            enabled.push(("file", self.output.file.attempts));
        }
        if self.output.stdout.enabled {
            enabled.push(("stdout", self.output.stdout.attempts));
        }
        if self.output.gelf_udp.enabled {
            enabled.push(("gelf-udp", self.output.gelf_udp.attempts));
        }
        if self.output.gelf_tcp.enabled {
            enabled.push(("gelf-tcp", self.output.gelf_tcp.attempts));
        }
        if self.output.http.enabled {
            enabled.push(("http", self.output.http.attempts));
        }

        for (name, attempts) in &enabled {
            if *attempts < 1 {
                return Err(ConfigError::InvalidAttempts { transport: name, attempts: *attempts as i64 });
            }
        }

        match enabled.len() {
            0 => Err(ConfigError::NoOutputConfigured),
            1 => Ok(()),
            _ => Err(ConfigError::MultipleOutputsConfigured(enabled.into_iter().map(|(n, _)| n).collect())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let settings = Settings::default();
        assert_eq!(settings.events.min, 1300);
        assert_eq!(settings.events.max, 1399);
        assert!(settings.message_tracking.enabled);
        assert!(!settings.message_tracking.log_out_of_order);
        assert_eq!(settings.message_tracking.max_out_of_order, 500);
    }

    #[test]
    fn validate_rejects_no_outputs() {
        let settings = Settings::default();
        assert!(matches!(settings.validate(), Err(ConfigError::NoOutputConfigured)));
    }

    #[test]
    fn validate_rejects_multiple_outputs() {
        let mut settings = Settings::default();
        settings.output.stdout.enabled = true;
        settings.output.file.enabled = true;
        settings.output.file.attempts = 1;
        assert!(matches!(settings.validate(), Err(ConfigError::MultipleOutputsConfigured(_))));
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut settings = Settings::default();
        settings.output.stdout.enabled = true;
        settings.output.stdout.attempts = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::InvalidAttempts { .. })));
    }

    #[test]
    fn validate_accepts_single_output() {
        let mut settings = Settings::default();
        settings.output.stdout.enabled = true;
        assert!(settings.validate().is_ok());
    }
}
