//! Raw `AF_NETLINK`/`NETLINK_AUDIT` socket I/O: opens and binds the
//! socket, decodes the 16-byte NLMSG header, and builds/sends the
//! `audit_status` control frames, all directly on top of `libc`.

use std::io;
use std::mem::size_of;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::TransportError;

/// Published kernel maximum for a single audit NETLINK frame.
const MAX_AUDIT_MESSAGE_LENGTH: usize = 8970;

const NLMSG_HEADER_LEN: usize = 16;

/// `AUDIT_SET`, uapi/linux/audit.h: the control message type used to push
/// an `audit_status` payload (keepalive and initial configuration).
const AUDIT_SET: u16 = 1001;

/// One decoded NETLINK frame: the audit record type carried in the header
/// and the payload with the 16-byte header stripped.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub record_type: u16,
    pub payload: Vec<u8>,
}

/// Decodes one NLMSG frame from a raw buffer: the audit record type lives
/// at offset 4 (`nlmsghdr.nlmsg_type`, little-endian), the payload is
/// everything after the 16-byte header. Split out from `receive()` so it
/// can be exercised directly against captured frames in tests.
pub fn decode_frame(buf: &[u8]) -> Result<RawFrame, TransportError> {
    if buf.is_empty() || buf.len() < NLMSG_HEADER_LEN {
        return Err(TransportError::ZeroLengthFrame);
    }

    let record_type = u16::from_le_bytes([buf[4], buf[5]]);
    Ok(RawFrame { record_type, payload: buf[NLMSG_HEADER_LEN..].to_vec() })
}

/// `audit_status`, ten little-endian `u32` fields.
#[derive(Debug, Default, Clone, Copy)]
struct AuditStatusPayload {
    mask: u32,
    enabled: u32,
    failure: u32,
    pid: u32,
    rate_limit: u32,
    backlog_limit: u32,
    lost: u32,
    backlog: u32,
    version: u32,
    backlog_wait_time: u32,
}

impl AuditStatusPayload {
    fn to_le_bytes(self) -> [u8; 40] {
        let mut buf = [0u8; 40];
        buf[0..4].copy_from_slice(&self.mask.to_le_bytes());
        buf[4..8].copy_from_slice(&self.enabled.to_le_bytes());
        buf[8..12].copy_from_slice(&self.failure.to_le_bytes());
        buf[12..16].copy_from_slice(&self.pid.to_le_bytes());
        buf[16..20].copy_from_slice(&self.rate_limit.to_le_bytes());
        buf[20..24].copy_from_slice(&self.backlog_limit.to_le_bytes());
        buf[24..28].copy_from_slice(&self.lost.to_le_bytes());
        buf[28..32].copy_from_slice(&self.backlog.to_le_bytes());
        buf[32..36].copy_from_slice(&self.version.to_le_bytes());
        buf[36..40].copy_from_slice(&self.backlog_wait_time.to_le_bytes());
        buf
    }
}

fn encode_nlmsg_header(len: u32, msg_type: u16, flags: u16, seq: u32, pid: u32) -> [u8; NLMSG_HEADER_LEN] {
    let mut buf = [0u8; NLMSG_HEADER_LEN];
    buf[0..4].copy_from_slice(&len.to_le_bytes());
    buf[4..6].copy_from_slice(&msg_type.to_le_bytes());
    buf[6..8].copy_from_slice(&flags.to_le_bytes());
    buf[8..12].copy_from_slice(&seq.to_le_bytes());
    buf[12..16].copy_from_slice(&pid.to_le_bytes());
    buf
}

/// Open NETLINK audit socket. `receive` polls a shutdown flag via
/// `SO_RCVTIMEO` since the underlying `recvfrom` is otherwise blocking.
pub struct NetlinkTransport {
    fd: RawFd,
    pid: u32,
    send_seq: AtomicU32,
    shutdown: Arc<AtomicBool>,
}

impl NetlinkTransport {
    /// Opens and binds the socket to port 0 (kernel-assigned), optionally
    /// requesting a larger receive buffer.
    pub fn open(receive_buffer: Option<usize>, shutdown: Arc<AtomicBool>) -> io::Result<Self> {
        let fd = unsafe { libc::socket(libc::AF_NETLINK, libc::SOCK_RAW, libc::NETLINK_AUDIT) };
        if fd < 0 {
            return Err(io::Error::last_os_error());
        }

        let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as u16;
        addr.nl_pid = 0;
        addr.nl_groups = 0;

        let bound = unsafe {
            libc::bind(
                fd,
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if bound < 0 {
            let err = io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(err);
        }

        if let Some(requested) = receive_buffer {
            Self::set_recvbuf(fd, requested);
        }

        let timeout = libc::timeval { tv_sec: 1, tv_usec: 0 };
        unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_RCVTIMEO,
                &timeout as *const _ as *const libc::c_void,
                size_of::<libc::timeval>() as libc::socklen_t,
            );
        }

        Ok(Self { fd, pid: unsafe { libc::getpid() as u32 }, send_seq: AtomicU32::new(0), shutdown })
    }

    fn set_recvbuf(fd: RawFd, requested: usize) {
        let requested = requested as libc::c_int;
        let result = unsafe {
            libc::setsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_RCVBUF,
                &requested as *const _ as *const libc::c_void,
                size_of::<libc::c_int>() as libc::socklen_t,
            )
        };
        if result < 0 {
            log::warn!("failed to set SO_RCVBUF to {} bytes: {}", requested, io::Error::last_os_error());
            return;
        }

        let mut effective: libc::c_int = 0;
        let mut len = size_of::<libc::c_int>() as libc::socklen_t;
        let read_back = unsafe {
            libc::getsockopt(
                fd,
                libc::SOL_SOCKET,
                libc::SO_RCVBUF,
                &mut effective as *mut _ as *mut libc::c_void,
                &mut len,
            )
        };
        if read_back == 0 {
            log::info!("requested receive buffer of {} bytes, kernel reports {} bytes effective", requested, effective);
        }
    }

    /// Blocks until one frame arrives. Returns
    /// `TransportError::ShutdownRequested` once the shared flag is set,
    /// `ZeroLengthFrame` on a 0-length or truncated read, `SocketError`
    /// otherwise. The caller retries without tearing the socket down.
    pub fn receive(&self) -> Result<RawFrame, TransportError> {
        loop {
            let mut buf = [0u8; MAX_AUDIT_MESSAGE_LENGTH];
            let n = unsafe {
                libc::recvfrom(
                    self.fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                    0,
                    std::ptr::null_mut(),
                    std::ptr::null_mut(),
                )
            };

            if n < 0 {
                let err = io::Error::last_os_error();
                if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) {
                    if self.shutdown.load(Ordering::Relaxed) {
                        return Err(TransportError::ShutdownRequested);
                    }
                    continue;
                }
                return Err(TransportError::SocketError(err));
            }

            let n = n as usize;
            return decode_frame(&buf[..n]);
        }
    }

    /// Builds and sends an `audit_status` control message. The length
    /// field is computed by serializing twice: once with `len = 0` to
    /// measure, once with the measured length populated.
    pub fn send_status(&self, mask: u32, enabled: u32) -> Result<(), TransportError> {
        let payload = AuditStatusPayload { mask, enabled, ..Default::default() }.to_le_bytes();
        let seq = self.send_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let flags = (libc::NLM_F_REQUEST | libc::NLM_F_ACK) as u16;

        let mut len = 0u32;
        let frame = loop {
            let header = encode_nlmsg_header(len, AUDIT_SET, flags, seq, self.pid);
            let mut buf = Vec::with_capacity(header.len() + payload.len());
            buf.extend_from_slice(&header);
            buf.extend_from_slice(&payload);
            if len == 0 {
                len = buf.len() as u32;
                continue;
            }
            break buf;
        };

        let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as u16;

        let sent = unsafe {
            libc::sendto(
                self.fd,
                frame.as_ptr() as *const libc::c_void,
                frame.len(),
                0,
                &addr as *const libc::sockaddr_nl as *const libc::sockaddr,
                size_of::<libc::sockaddr_nl>() as libc::socklen_t,
            )
        };
        if sent < 0 {
            return Err(TransportError::SocketError(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Background task sending a keepalive status frame every 5 seconds.
    /// Shares only `send_seq` with `receive`; failures are logged and
    /// never fatal.
    pub async fn keepalive(self: Arc<Self>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        loop {
            ticker.tick().await;
            if self.shutdown.load(Ordering::Relaxed) {
                return;
            }
            if let Err(err) = self.send_status(4, 1) {
                log::warn!("keepalive send_status failed: {}", err);
            }
        }
    }
}

impl Drop for NetlinkTransport {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_frame_strips_header_and_reads_type() {
        let mut buf = encode_nlmsg_header(16 + 4, 1300, 0, 1, 0).to_vec();
        buf.extend_from_slice(b"abcd");

        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.record_type, 1300);
        assert_eq!(frame.payload, b"abcd");
    }

    #[test]
    fn decode_frame_rejects_truncated_buffer() {
        assert!(matches!(decode_frame(&[0u8; 8]), Err(TransportError::ZeroLengthFrame)));
        assert!(matches!(decode_frame(&[]), Err(TransportError::ZeroLengthFrame)));
    }
}
