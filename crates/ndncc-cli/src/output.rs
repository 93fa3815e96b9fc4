//! Line-oriented rendering of command results and events.

use std::io::{self, Write};

use ndncc_core::{EventPayload, control_response_record};
use ndncc_proto::ControlResponse;

/// `key=value` pairs in key order, separated by spaces.
pub fn render(payload: &EventPayload) -> String {
    payload.iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join(" ")
}

/// One event line: `<event>: key=value ...`.
pub fn event_line(event: &str, payload: &EventPayload) -> String {
    format!("{event}: {}", render(payload))
}

/// Status line of a command reply, or `no response`.
pub fn response_line(response: Option<&ControlResponse>) -> String {
    response.map_or_else(|| "no response".to_owned(), |r| render(&control_response_record(r)))
}

/// Write `line` to stdout.
pub fn emit(line: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn pairs_are_sorted_by_key() {
        let payload = BTreeMap::from([
            ("st_text".to_owned(), "OK".to_owned()),
            ("st_code".to_owned(), "200".to_owned()),
        ]);
        assert_eq!(render(&payload), "st_code=200 st_text=OK");
    }

    #[test]
    fn response_lines() {
        let refused = ControlResponse::new(410, "Face not found");
        assert_eq!(response_line(Some(&refused)), "st_code=410 st_text=Face not found");
        assert_eq!(response_line(None), "no response");
    }

    #[test]
    fn event_line_is_prefixed() {
        let payload = BTreeMap::from([("face_id".to_owned(), "256".to_owned())]);
        assert_eq!(event_line("face event", &payload), "face event: face_id=256");
    }
}
