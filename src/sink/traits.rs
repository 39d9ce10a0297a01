use crate::error::SinkError;
use crate::event::AuditEventGroup;

/// One completed event per call.
pub trait Sink: Send {
    fn write(&mut self, group: &AuditEventGroup) -> Result<(), SinkError>;

    /// Reopens the underlying destination, triggered by SIGUSR1. Only the
    /// file sink does anything here; every other sink keeps its connection
    /// for the life of the process.
    fn reopen(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}
