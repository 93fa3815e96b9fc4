//! Flat, display-ready records.
//!
//! Decoded management structures are rendered into string maps for the
//! consumer on the other side of an [`EventSink`]. Rendering is total: an
//! enum code outside the known table becomes `"unknown"`.

use std::collections::BTreeMap;

use ndncc_proto::{
    ControlResponse, FaceEventKind, FaceEventNotification, FacePersistency, FaceScope, LinkType,
};

/// Event name used for face event notifications.
pub const FACE_EVENT: &str = "face event";

/// Rendered value for codes outside the known tables.
pub const UNKNOWN: &str = "unknown";

/// Key-value payload handed to an [`EventSink`].
pub type EventPayload = BTreeMap<String, String>;

/// Consumer of emitted records.
pub trait EventSink: Send + Sync {
    /// Deliver one record.
    fn emit(&self, event: &str, payload: EventPayload);
}

impl<F> EventSink for F
where
    F: Fn(&str, EventPayload) + Send + Sync,
{
    fn emit(&self, event: &str, payload: EventPayload) {
        self(event, payload);
    }
}

fn symbol<T>(code: u64, from_code: fn(u64) -> Option<T>, as_str: fn(T) -> &'static str) -> String {
    from_code(code).map_or(UNKNOWN, as_str).to_owned()
}

/// Render a face event notification.
///
/// Keys: `face_event_kind`, `face_id`, `local_uri`, `remote_uri`,
/// `face_scope`, `face_persistency`, `link_type`, `flags`.
pub fn face_event_record(event: &FaceEventNotification) -> EventPayload {
    BTreeMap::from([
        (
            "face_event_kind".to_owned(),
            symbol(event.kind, FaceEventKind::from_code, FaceEventKind::as_str),
        ),
        ("face_id".to_owned(), event.face_id.to_string()),
        ("local_uri".to_owned(), event.local_uri.clone()),
        ("remote_uri".to_owned(), event.uri.clone()),
        ("face_scope".to_owned(), symbol(event.face_scope, FaceScope::from_code, FaceScope::as_str)),
        (
            "face_persistency".to_owned(),
            symbol(event.face_persistency, FacePersistency::from_code, FacePersistency::as_str),
        ),
        ("link_type".to_owned(), symbol(event.link_type, LinkType::from_code, LinkType::as_str)),
        ("flags".to_owned(), event.flags.to_string()),
    ])
}

/// Render a control response as `st_code` and `st_text`.
pub fn control_response_record(response: &ControlResponse) -> EventPayload {
    BTreeMap::from([
        ("st_code".to_owned(), response.status_code.to_string()),
        ("st_text".to_owned(), response.status_text.clone()),
    ])
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use proptest::prelude::*;

    use super::*;

    fn event(kind: u64, scope: u64, persistency: u64, link_type: u64) -> FaceEventNotification {
        FaceEventNotification {
            kind,
            face_id: 262,
            uri: "udp4://192.0.2.1:6363".into(),
            local_uri: "udp4://10.0.0.2:6363".into(),
            face_scope: scope,
            face_persistency: persistency,
            link_type,
            flags: 1,
        }
    }

    #[test]
    fn renders_known_codes() {
        let record = face_event_record(&event(1, 0, 0, 0));
        assert_eq!(record["face_event_kind"], "CREATED");
        assert_eq!(record["face_id"], "262");
        assert_eq!(record["remote_uri"], "udp4://192.0.2.1:6363");
        assert_eq!(record["local_uri"], "udp4://10.0.0.2:6363");
        assert_eq!(record["face_scope"], "non-local");
        assert_eq!(record["face_persistency"], "persistent");
        assert_eq!(record["link_type"], "point-to-point");
        assert_eq!(record["flags"], "1");
        assert_eq!(record.len(), 8);
    }

    #[test]
    fn symbol_tables() {
        let kinds: Vec<_> = (1..=4)
            .map(|k| face_event_record(&event(k, 0, 0, 0))["face_event_kind"].clone())
            .collect();
        assert_eq!(kinds, ["CREATED", "DESTROYED", "UP", "DOWN"]);

        assert_eq!(face_event_record(&event(1, 1, 0, 0))["face_scope"], "local");
        assert_eq!(face_event_record(&event(1, 0, 1, 0))["face_persistency"], "on-demand");
        assert_eq!(face_event_record(&event(1, 0, 2, 0))["face_persistency"], "permanent");
        assert_eq!(face_event_record(&event(1, 0, 0, 1))["link_type"], "multi-access");
        assert_eq!(face_event_record(&event(1, 0, 0, 2))["link_type"], "ad-hoc");
    }

    #[test]
    fn kind_zero_is_unknown() {
        assert_eq!(face_event_record(&event(0, 0, 0, 0))["face_event_kind"], UNKNOWN);
    }

    #[test]
    fn control_response_keys() {
        let record = control_response_record(&ControlResponse::new(410, "Face not found"));
        assert_eq!(record["st_code"], "410");
        assert_eq!(record["st_text"], "Face not found");
    }

    #[test]
    fn closure_is_a_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |name: &str, payload: EventPayload| {
            seen.lock().unwrap().push((name.to_owned(), payload));
        };

        sink.emit(FACE_EVENT, face_event_record(&event(3, 0, 0, 0)));
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "face event");
        assert_eq!(seen[0].1["face_event_kind"], "UP");
    }

    proptest! {
        #[test]
        fn rendering_never_fails(
            kind in any::<u64>(),
            scope in any::<u64>(),
            persistency in any::<u64>(),
            link_type in any::<u64>(),
        ) {
            let record = face_event_record(&event(kind, scope, persistency, link_type));
            prop_assert_eq!(record.len(), 8);
            if kind == 0 || kind > 4 {
                prop_assert_eq!(record["face_event_kind"].as_str(), UNKNOWN);
            }
            if scope > 1 {
                prop_assert_eq!(record["face_scope"].as_str(), UNKNOWN);
            }
            if persistency > 2 {
                prop_assert_eq!(record["face_persistency"].as_str(), UNKNOWN);
            }
            if link_type > 2 {
                prop_assert_eq!(record["link_type"].as_str(), UNKNOWN);
            }
        }
    }
}
