//! File output: one JSON line per event appended to a file, with
//! mode/user/group enforced on open and reopen on SIGUSR1 for log
//! rotation.

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::PermissionsExt;

use crate::config::FileOutputConfig;
use crate::error::SinkError;
use crate::event::AuditEventGroup;
use crate::sink::json_sink::RetryingJsonSink;
use crate::sink::traits::Sink;

pub struct FileSink {
    inner: RetryingJsonSink<File>,
    config: FileOutputConfig,
}

impl FileSink {
    pub fn open(config: &FileOutputConfig) -> Result<Self, SinkError> {
        let file = Self::open_file(config)?;
        Ok(Self { inner: RetryingJsonSink::new(file, config.attempts), config: config.clone() })
    }

    fn open_file(config: &FileOutputConfig) -> Result<File, SinkError> {
        if config.mode == 0 {
            return Err(SinkError::Open("output file mode must be greater than 0000".to_string()));
        }

        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .write(true)
            .open(&config.path)
            .map_err(|err| SinkError::Open(format!("failed to open output file {}: {}", config.path, err)))?;

        let mut perms = file
            .metadata()
            .map_err(|err| SinkError::Open(format!("failed to stat output file: {}", err)))?
            .permissions();
        perms.set_mode(config.mode);
        file.set_permissions(perms)
            .map_err(|err| SinkError::Open(format!("failed to set output file permissions: {}", err)))?;

        if !config.user.is_empty() && !config.group.is_empty() {
            let uid = users::get_user_by_name(&config.user)
                .map(|u| u.uid())
                .ok_or_else(|| SinkError::Open(format!("could not find uid for user {}", config.user)))?;
            let gid = users::get_group_by_name(&config.group)
                .map(|g| g.gid())
                .ok_or_else(|| SinkError::Open(format!("could not find gid for group {}", config.group)))?;

            let path = CString::new(config.path.as_str())
                .map_err(|err| SinkError::Open(format!("invalid output path: {}", err)))?;
            let result = unsafe { libc::chown(path.as_ptr(), uid, gid) };
            if result != 0 {
                return Err(SinkError::Open(format!(
                    "could not chown output file: {}",
                    std::io::Error::last_os_error()
                )));
            }
        }

        Ok(file)
    }
}

impl Sink for FileSink {
    fn write(&mut self, group: &AuditEventGroup) -> Result<(), SinkError> {
        self.inner.write(group)
    }

    fn reopen(&mut self) -> Result<(), SinkError> {
        let file = Self::open_file(&self.config)?;
        self.inner.replace_writer(file);
        log::info!("reopened output file {}", self.config.path);
        Ok(())
    }
}
