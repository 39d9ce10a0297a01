//! Reverse-DNS enrichment: a background task listens on a UNIX socket for
//! dnstap frames, unpacks response messages, and populates a bounded
//! ip/cname -> hostname cache. The hook itself just reads that cache when
//! a group carries a SOCKADDR record.

mod framestream;
mod proto;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;
use prost::Message;
use tokio::net::{UnixListener, UnixStream};

use crate::enrich::dns_wire::parse_answers;
use crate::enrich::traits::EnrichHook;
use crate::event::{AuditEventGroup, DnsTap};
use crate::sockaddr::{extract_saddr, parse_sockaddr};
use framestream::FrameStreamReader;
use proto::{Dnstap as DnstapFrame, DNSTAP_TYPE_MESSAGE};

pub type DnsCache = Arc<Mutex<LruCache<String, String>>>;

pub fn new_cache(capacity: usize) -> DnsCache {
    Arc::new(Mutex::new(LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap())))
}

fn trim_trailing_dot(name: &str) -> String {
    name.strip_suffix('.').unwrap_or(name).to_string()
}

async fn handle_connection(stream: UnixStream, cache: DnsCache) {
    let mut reader = FrameStreamReader::new(stream);
    if let Err(err) = reader.handshake().await {
        log::warn!("dnstap handshake failed: {}", err);
        return;
    }

    loop {
        match reader.next_frame().await {
            Ok(Some(frame)) => process_frame(&frame, &cache),
            Ok(None) => return,
            Err(err) => {
                log::warn!("dnstap connection read failed: {}", err);
                return;
            }
        }
    }
}

fn process_frame(frame: &[u8], cache: &DnsCache) {
    let Ok(dt) = DnstapFrame::decode(frame) else {
        log::warn!("failed to decode dnstap frame");
        return;
    };
    if dt.r#type != Some(DNSTAP_TYPE_MESSAGE) {
        return;
    }
    let Some(response) = dt.message.and_then(|m| m.response_message) else { return };

    for answer in parse_answers(&response) {
        let key = trim_trailing_dot(&answer.value);
        let value = trim_trailing_dot(&answer.name);
        cache.lock().unwrap().put(key, value);
    }
}

/// Binds `socket_path` (removing a stale socket file first) and accepts
/// connections for the lifetime of the process.
pub async fn listen(socket_path: String, cache: DnsCache) {
    let _ = std::fs::remove_file(&socket_path);
    let listener = match UnixListener::bind(&socket_path) {
        Ok(listener) => listener,
        Err(err) => {
            log::error!("failed to bind dnstap socket {}: {}", socket_path, err);
            return;
        }
    };
    log::info!("started dnstap listener on {}", socket_path);

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let cache = Arc::clone(&cache);
                tokio::spawn(handle_connection(stream, cache));
            }
            Err(err) => log::warn!("dnstap accept failed: {}", err),
        }
    }
}

pub struct DnsTapHook {
    cache: DnsCache,
}

impl DnsTapHook {
    pub fn new(cache: DnsCache) -> Self {
        Self { cache }
    }
}

impl EnrichHook for DnsTapHook {
    fn enrich(&self, group: &mut AuditEventGroup) {
        let Some(record) = group.messages.iter().find(|m| m.type_num() == 1306) else { return };
        let Some(hex) = extract_saddr(&record.data) else { return };
        let Some(sockaddr) = parse_sockaddr(hex) else { return };
        let Some(ip) = sockaddr.ip else { return };

        if let Some(hostname) = self.cache.lock().unwrap().get(&ip) {
            group.dnstap = Some(DnsTap {
                ip: ip.clone(),
                port: sockaddr.port.map(|p| p.to_string()).unwrap_or_default(),
                record: hostname.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_annotates_group_when_ip_is_cached() {
        let cache = new_cache(16);
        cache.lock().unwrap().put("1.2.3.4".to_string(), "example.com".to_string());
        let hook = DnsTapHook::new(cache);

        let mut group = AuditEventGroup::new(1, "1.0".to_string());
        group.push(crate::record::AuditRecord::new(
            crate::record::RecordType::from(1306),
            "saddr=0200003501020304".to_string(),
        ));

        hook.enrich(&mut group);
        let dnstap = group.dnstap.expect("dnstap annotation");
        assert_eq!(dnstap.ip, "1.2.3.4");
        assert_eq!(dnstap.record, "example.com");
    }

    #[test]
    fn hook_leaves_group_untouched_when_ip_not_cached() {
        let cache = new_cache(16);
        let hook = DnsTapHook::new(cache);

        let mut group = AuditEventGroup::new(1, "1.0".to_string());
        group.push(crate::record::AuditRecord::new(
            crate::record::RecordType::from(1306),
            "saddr=0200003501020304".to_string(),
        ));

        hook.enrich(&mut group);
        assert!(group.dnstap.is_none());
    }

    #[test]
    fn process_frame_populates_cache_from_a_record() {
        use proto::DnstapMessage;

        let mut dns_msg = Vec::new();
        dns_msg.extend_from_slice(&[0, 0, 0x81, 0x80]);
        dns_msg.extend_from_slice(&1u16.to_be_bytes());
        dns_msg.extend_from_slice(&1u16.to_be_bytes());
        dns_msg.extend_from_slice(&0u16.to_be_bytes());
        dns_msg.extend_from_slice(&0u16.to_be_bytes());
        let name_offset = dns_msg.len();
        dns_msg.push(7);
        dns_msg.extend_from_slice(b"example");
        dns_msg.push(3);
        dns_msg.extend_from_slice(b"com");
        dns_msg.push(0);
        dns_msg.extend_from_slice(&1u16.to_be_bytes());
        dns_msg.extend_from_slice(&1u16.to_be_bytes());
        let pointer = 0xC000u16 | (name_offset as u16);
        dns_msg.extend_from_slice(&pointer.to_be_bytes());
        dns_msg.extend_from_slice(&1u16.to_be_bytes());
        dns_msg.extend_from_slice(&1u16.to_be_bytes());
        dns_msg.extend_from_slice(&300u32.to_be_bytes());
        dns_msg.extend_from_slice(&4u16.to_be_bytes());
        dns_msg.extend_from_slice(&[93, 184, 216, 34]);

        let dt = DnstapFrame {
            identity: None,
            version: None,
            message: Some(DnstapMessage { r#type: Some(2), response_message: Some(dns_msg) }),
            r#type: Some(DNSTAP_TYPE_MESSAGE),
        };
        let frame = dt.encode_to_vec();

        let cache = new_cache(16);
        process_frame(&frame, &cache);
        assert_eq!(cache.lock().unwrap().get("93.184.216.34"), Some(&"example.com".to_string()));
    }
}
