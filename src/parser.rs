//! Record parser: strips the `audit(<secs>.<millis>:<seq>): ` header the
//! kernel prepends to every record's payload.

/// Minimum length of a valid header.
const HEADER_MIN_LENGTH: usize = 7;
const HEADER_PREFIX: &str = "audit(";

/// Parsed header: timestamp string and sequence number. `sequence == 0`
/// signals a malformed or absent header -- the caller treats that as
/// "invalid record, discard, flush old groups".
pub struct ParsedHeader {
    pub timestamp: String,
    pub sequence: u32,
}

/// Extracts the audit header from the front of `payload`, returning the
/// parsed header and the remaining payload with the header (and its
/// trailing `): ` or `) : ` separator) stripped.
pub fn parse_header(payload: &str) -> (ParsedHeader, String) {
    let Some(close) = payload.find(')') else {
        return (
            ParsedHeader { timestamp: String::new(), sequence: 0 },
            payload.to_string(),
        );
    };

    if close < HEADER_MIN_LENGTH || !payload.starts_with(HEADER_PREFIX) {
        return (
            ParsedHeader { timestamp: String::new(), sequence: 0 },
            payload.to_string(),
        );
    }

    let header = &payload[..close];
    let Some(colon) = header.find(':') else {
        return (
            ParsedHeader { timestamp: String::new(), sequence: 0 },
            payload.to_string(),
        );
    };

    let timestamp = header[HEADER_PREFIX.len()..colon].to_string();
    let sequence: u32 = header[colon + 1..].parse().unwrap_or(0);

    // Kernel records end the header with "): "; PROCTITLE sometimes emits
    // ") : " instead. Strip whatever separator follows the closing paren.
    let mut rest = &payload[close + 1..];
    rest = rest.trim_start_matches(' ');
    rest = rest.strip_prefix(':').unwrap_or(rest);
    rest = rest.strip_prefix(' ').unwrap_or(rest);

    (ParsedHeader { timestamp, sequence }, rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_header() {
        let (header, rest) = parse_header("audit(10000001.123:7): uid=0 syscall=59");
        assert_eq!(header.timestamp, "10000001.123");
        assert_eq!(header.sequence, 7);
        assert_eq!(rest, "uid=0 syscall=59");
    }

    #[test]
    fn parses_eoe_header_with_no_body() {
        let (header, rest) = parse_header("audit(10000001.123:7): ");
        assert_eq!(header.sequence, 7);
        assert_eq!(rest, "");
    }

    #[test]
    fn parses_header_with_space_before_colon() {
        let (header, rest) = parse_header("audit(1364481363.243:24287) : proctitle=abc");
        assert_eq!(header.sequence, 24287);
        assert_eq!(rest, "proctitle=abc");
    }

    #[test]
    fn missing_prefix_yields_zero_sequence() {
        let (header, rest) = parse_header("not an audit header at all");
        assert_eq!(header.sequence, 0);
        assert_eq!(rest, "not an audit header at all");
    }

    #[test]
    fn too_short_header_yields_zero_sequence() {
        let (header, _) = parse_header("a(1:2)x");
        assert_eq!(header.sequence, 0);
    }
}
