//! Shared record-scanning helpers for the enrichment hooks.

/// Scans `data` for `pid=` and `ppid=` tokens in one pass. Either value is
/// `0` if the token was absent or unparsable.
pub fn extract_pid_ppid(data: &str) -> (i32, i32) {
    let mut cursor = data;
    let mut pid = 0;
    let mut ppid = 0;

    loop {
        let Some(start) = cursor.find("pid=") else { break };
        let is_ppid = start > 0 && cursor.as_bytes()[start - 1] == b'p';
        let rest = &cursor[start + 4..];
        let end = rest.find(' ').unwrap_or(rest.len());
        let value = &rest[..end];

        if let Ok(parsed) = value.parse::<i32>() {
            if is_ppid {
                ppid = parsed;
            } else {
                pid = parsed;
            }
        }

        if pid != 0 && ppid != 0 {
            break;
        }
        if end >= rest.len() {
            break;
        }
        cursor = &rest[end + 1..];
    }

    (pid, ppid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_both_pid_and_ppid() {
        assert_eq!(extract_pid_ppid("pid=123 ppid=1 comm=\"sh\""), (123, 1));
        assert_eq!(extract_pid_ppid("ppid=1 pid=123"), (123, 1));
    }

    #[test]
    fn missing_tokens_default_to_zero() {
        assert_eq!(extract_pid_ppid("comm=\"sh\""), (0, 0));
    }
}
