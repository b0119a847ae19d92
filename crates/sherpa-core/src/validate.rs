use serde_json::Value;

use crate::event::{Meta, TrackEvent};
use crate::kind::EventKind;

/// Upper bound on `from`/`to` length, in characters.
pub const MAX_PATH_LEN: usize = 200;

/// Why an ingest request was rejected. The display text is the message
/// returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid JSON")]
    InvalidJson,
    #[error("Invalid body")]
    InvalidBody,
    #[error("Invalid event payload")]
    InvalidPayload,
    #[error("Navigation events require a valid `to` path")]
    MissingDestination,
}

impl ValidationError {
    /// HTTP status the ingest endpoint answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            ValidationError::InvalidJson | ValidationError::InvalidBody => 400,
            ValidationError::InvalidPayload | ValidationError::MissingDestination => 422,
        }
    }
}

/// A site path: leading `/`, at most [`MAX_PATH_LEN`] characters.
pub fn is_valid_path(s: &str) -> bool {
    s.starts_with('/') && s.chars().count() <= MAX_PATH_LEN
}

/// Turn an untyped request body into a [`TrackEvent`], or reject it whole.
pub fn validate_payload(body: &Value) -> Result<TrackEvent, ValidationError> {
    let obj = body.as_object().ok_or(ValidationError::InvalidBody)?;

    let event = obj
        .get("event")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<EventKind>().ok())
        .ok_or(ValidationError::InvalidPayload)?;

    let from = obj
        .get("from")
        .and_then(Value::as_str)
        .filter(|s| is_valid_path(s))
        .ok_or(ValidationError::InvalidPayload)?
        .to_string();

    let to = match obj.get("to") {
        None | Some(Value::Null) => None,
        Some(v) => match v.as_str().filter(|s| is_valid_path(s)) {
            Some(s) => Some(s.to_string()),
            None if event.is_navigation() => return Err(ValidationError::MissingDestination),
            None => return Err(ValidationError::InvalidPayload),
        },
    };
    if event.is_navigation() && to.is_none() {
        return Err(ValidationError::MissingDestination);
    }

    let meta = match obj.get("meta") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            serde_json::from_value::<Meta>(v.clone()).map_err(|_| ValidationError::InvalidPayload)?,
        ),
    };

    Ok(TrackEvent {
        event,
        from,
        to,
        meta,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::MetaValue;
    use serde_json::json;

    #[test]
    fn accepts_behavioral_without_destination() {
        let ev = validate_payload(&json!({
            "event": "scroll_depth",
            "from": "/journeys/everest-base-camp",
            "meta": {"depth": 75}
        }))
        .unwrap();
        assert_eq!(ev.event, EventKind::ScrollDepth);
        assert_eq!(ev.to, None);
        assert_eq!(ev.meta.unwrap()["depth"], MetaValue::Number(75.into()));
    }

    #[test]
    fn accepts_navigation_with_destination() {
        let ev = validate_payload(&json!({
            "event": "topic_to_pillar",
            "from": "/topics/altitude",
            "to": "/himalayan-retreats"
        }))
        .unwrap();
        assert_eq!(ev.to.as_deref(), Some("/himalayan-retreats"));
    }

    #[test]
    fn rejects_non_object() {
        assert_eq!(validate_payload(&json!([1, 2])), Err(ValidationError::InvalidBody));
        assert_eq!(validate_payload(&json!("x")), Err(ValidationError::InvalidBody));
    }

    #[test]
    fn rejects_unknown_kind() {
        let err = validate_payload(&json!({"event": "page_view", "from": "/"})).unwrap_err();
        assert_eq!(err, ValidationError::InvalidPayload);
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn rejects_bad_source_paths() {
        let long = format!("/{}", "a".repeat(MAX_PATH_LEN));
        for from in [json!("journeys"), json!(""), json!(long), json!(42)] {
            let err = validate_payload(&json!({"event": "faq_expand", "from": from})).unwrap_err();
            assert_eq!(err, ValidationError::InvalidPayload);
        }
    }

    #[test]
    fn overlong_destination_is_rejected_by_kind() {
        let long = format!("/{}", "a".repeat(MAX_PATH_LEN));
        let err = validate_payload(&json!({"event": "blog_to_journey", "from": "/b", "to": long}))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingDestination);
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.to_string(), "Navigation events require a valid `to` path");

        let err = validate_payload(&json!({"event": "faq_expand", "from": "/b", "to": long}))
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidPayload);
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn path_of_exactly_max_len_is_valid() {
        let path = format!("/{}", "a".repeat(MAX_PATH_LEN - 1));
        assert!(is_valid_path(&path));
        assert!(!is_valid_path(&format!("{path}a")));
    }

    #[test]
    fn navigation_requires_valid_destination() {
        for body in [
            json!({"event": "blog_to_journey", "from": "/blog/x"}),
            json!({"event": "blog_to_journey", "from": "/blog/x", "to": "journeys/y"}),
            json!({"event": "blog_to_journey", "from": "/blog/x", "to": null}),
        ] {
            assert_eq!(validate_payload(&body), Err(ValidationError::MissingDestination));
        }
    }

    #[test]
    fn behavioral_with_malformed_destination_is_rejected() {
        let err = validate_payload(&json!({
            "event": "compare_sort",
            "from": "/compare",
            "to": "nowhere"
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidPayload);
    }

    #[test]
    fn rejects_nested_meta() {
        let err = validate_payload(&json!({
            "event": "compare_filter",
            "from": "/compare",
            "meta": {"filter": {"intensity": "high"}}
        }))
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidPayload);
    }

    #[test]
    fn status_codes_split_body_and_payload_errors() {
        assert_eq!(ValidationError::InvalidJson.status_code(), 400);
        assert_eq!(ValidationError::InvalidBody.status_code(), 400);
        assert_eq!(ValidationError::MissingDestination.status_code(), 422);
    }
}
