//! Minimal DNS message answer-section parsing, just enough to recover
//! A/AAAA/CNAME records out of a dnstap `response_message` payload.

const TYPE_A: u16 = 1;
const TYPE_CNAME: u16 = 5;
const TYPE_AAAA: u16 = 28;

/// One resolved `name -> address-or-alias` mapping recovered from a
/// response's answer section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsAnswer {
    pub name: String,
    pub rtype: u16,
    pub value: String,
}

/// Parses the 12-byte DNS header, skips the question section, then walks
/// every answer resource record. Malformed messages yield an empty vec
/// rather than an error -- this is best-effort enrichment, never fatal.
pub fn parse_answers(msg: &[u8]) -> Vec<DnsAnswer> {
    let mut answers = Vec::new();
    if msg.len() < 12 {
        return answers;
    }

    let qdcount = u16::from_be_bytes([msg[4], msg[5]]) as usize;
    let ancount = u16::from_be_bytes([msg[6], msg[7]]) as usize;

    let mut offset = 12;
    for _ in 0..qdcount {
        let Some(next) = skip_name(msg, offset) else { return answers };
        offset = next;
        if offset + 4 > msg.len() {
            return answers;
        }
        offset += 4; // qtype + qclass
    }

    for _ in 0..ancount {
        let Some((name, next)) = read_name(msg, offset) else { return answers };
        offset = next;
        if offset + 10 > msg.len() {
            return answers;
        }
        let rtype = u16::from_be_bytes([msg[offset], msg[offset + 1]]);
        let rdlength = u16::from_be_bytes([msg[offset + 8], msg[offset + 9]]) as usize;
        offset += 10;
        if offset + rdlength > msg.len() {
            return answers;
        }
        let rdata = &msg[offset..offset + rdlength];

        match rtype {
            TYPE_A if rdata.len() == 4 => {
                answers.push(DnsAnswer {
                    name: name.clone(),
                    rtype,
                    value: format!("{}.{}.{}.{}", rdata[0], rdata[1], rdata[2], rdata[3]),
                });
            }
            TYPE_AAAA if rdata.len() == 16 => {
                let groups: Vec<String> = rdata.chunks(2).map(|c| format!("{:02x}{:02x}", c[0], c[1])).collect();
                answers.push(DnsAnswer { name: name.clone(), rtype, value: groups.join(":") });
            }
            TYPE_CNAME => {
                if let Some((target, _)) = read_name(msg, offset) {
                    answers.push(DnsAnswer { name: name.clone(), rtype, value: target });
                }
            }
            _ => {}
        }

        offset += rdlength;
    }

    answers
}

/// Reads one (possibly compressed) domain name starting at `offset`,
/// returning the decoded dotted name and the offset just past it in the
/// *original* (non-pointer-followed) stream.
fn read_name(msg: &[u8], offset: usize) -> Option<(String, usize)> {
    let mut labels = Vec::new();
    let mut cursor = offset;
    let mut end_of_name = None;
    let mut jumps = 0;

    loop {
        if jumps > 32 {
            return None; // compression loop guard
        }
        let len = *msg.get(cursor)?;

        if len == 0 {
            if end_of_name.is_none() {
                end_of_name = Some(cursor + 1);
            }
            break;
        }

        if len & 0xC0 == 0xC0 {
            let hi = (len & 0x3F) as usize;
            let lo = *msg.get(cursor + 1)? as usize;
            if end_of_name.is_none() {
                end_of_name = Some(cursor + 2);
            }
            cursor = hi << 8 | lo;
            jumps += 1;
            continue;
        }

        let start = cursor + 1;
        let stop = start + len as usize;
        let label = msg.get(start..stop)?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        cursor = stop;
    }

    Some((labels.join("."), end_of_name?))
}

fn skip_name(msg: &[u8], offset: usize) -> Option<usize> {
    read_name(msg, offset).map(|(_, next)| next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(s: &str) -> Vec<u8> {
        let mut out = vec![s.len() as u8];
        out.extend_from_slice(s.as_bytes());
        out
    }

    /// Builds a minimal DNS response: one question (example.com A), one
    /// answer (example.com A 93.184.216.34), with the answer's name
    /// pointing back at the question via compression.
    fn build_response() -> Vec<u8> {
        let mut msg = Vec::new();
        msg.extend_from_slice(&[0, 0]); // id
        msg.extend_from_slice(&[0x81, 0x80]); // flags
        msg.extend_from_slice(&1u16.to_be_bytes()); // qdcount
        msg.extend_from_slice(&1u16.to_be_bytes()); // ancount
        msg.extend_from_slice(&0u16.to_be_bytes()); // nscount
        msg.extend_from_slice(&0u16.to_be_bytes()); // arcount

        let question_name_offset = msg.len();
        msg.extend_from_slice(&label("example"));
        msg.extend_from_slice(&label("com"));
        msg.push(0);
        msg.extend_from_slice(&1u16.to_be_bytes()); // qtype A
        msg.extend_from_slice(&1u16.to_be_bytes()); // qclass IN

        // Answer: compressed pointer back to the question name.
        let pointer = 0xC000u16 | (question_name_offset as u16);
        msg.extend_from_slice(&pointer.to_be_bytes());
        msg.extend_from_slice(&1u16.to_be_bytes()); // type A
        msg.extend_from_slice(&1u16.to_be_bytes()); // class IN
        msg.extend_from_slice(&300u32.to_be_bytes()); // ttl
        msg.extend_from_slice(&4u16.to_be_bytes()); // rdlength
        msg.extend_from_slice(&[93, 184, 216, 34]);

        msg
    }

    #[test]
    fn parses_a_record_with_compressed_name() {
        let msg = build_response();
        let answers = parse_answers(&msg);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].name, "example.com");
        assert_eq!(answers[0].rtype, TYPE_A);
        assert_eq!(answers[0].value, "93.184.216.34");
    }

    #[test]
    fn truncated_message_yields_no_answers() {
        assert!(parse_answers(&[0u8; 4]).is_empty());
    }

    #[test]
    fn empty_message_yields_no_answers() {
        assert!(parse_answers(&[]).is_empty());
    }
}
