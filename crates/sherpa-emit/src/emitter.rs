use std::time::Duration;

use serde::{Deserialize, Serialize};
use sherpa_core::Meta;

/// Request body for `POST /api/track`. Not validated here; the server decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPayload {
    pub event: String,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("ingest endpoint answered {0}")]
    Rejected(u16),
    #[error("delivery failed: {0}")]
    Transport(#[from] ureq::Error),
    #[error("cannot encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

const TIMEOUT: Duration = Duration::from_secs(5);

/// Sends events to an ingest endpoint.
#[derive(Clone)]
pub struct Emitter {
    endpoint: String,
    agent: ureq::Agent,
}

impl Emitter {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(TIMEOUT))
            .build()
            .new_agent();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One blocking POST. Used where the caller wants to know the outcome
    /// (the `track` CLI command); instrumentation goes through [`Emitter::emit`].
    pub fn deliver(&self, payload: &TrackPayload) -> Result<(), EmitError> {
        let body = serde_json::to_string(payload)?;
        match self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .send(body)
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::StatusCode(code)) => Err(EmitError::Rejected(code)),
            Err(e) => Err(EmitError::Transport(e)),
        }
    }

    /// Fire and forget. Delivery runs on a detached thread and its result is
    /// dropped after a `debug!` line; callers get control back immediately and
    /// must not depend on the event arriving. No retry.
    ///
    /// Each call spawns its own thread with no pooling or cap, so a burst against
    /// a stalled endpoint holds one thread per event for up to the 5 s timeout.
    pub fn emit(&self, payload: TrackPayload) {
        let emitter = self.clone();
        let spawned = std::thread::Builder::new()
            .name("sherpa-emit".to_string())
            .spawn(move || {
                if let Err(e) = emitter.deliver(&payload) {
                    tracing::debug!(error = %e, kind = %payload.event, "telemetry not delivered");
                }
            });
        if let Err(e) = spawned {
            tracing::debug!(error = %e, "cannot spawn telemetry thread");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sherpa_core::MetaValue;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::time::Instant;

    const OK_RESPONSE: &[u8] =
        b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 11\r\nconnection: close\r\n\r\n{\"ok\":true}";
    const REJECT_RESPONSE: &[u8] =
        b"HTTP/1.1 422 Unprocessable Entity\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}";

    /// True once headers and a `content-length` body have fully arrived.
    fn request_complete(buf: &[u8]) -> bool {
        let text = String::from_utf8_lossy(buf);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let len = text[..header_end]
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        buf.len() >= header_end + 4 + len
    }

    /// One-shot HTTP listener that captures the raw request and answers `response`.
    fn capture_one(response: &'static [u8]) -> (String, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_millis(500)))
                .unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while let Ok(n) = stream.read(&mut chunk) {
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                if request_complete(&buf) {
                    break;
                }
            }
            let _ = stream.write_all(response);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
        (format!("http://{addr}/api/track"), rx)
    }

    fn scroll_payload() -> TrackPayload {
        let mut meta = Meta::new();
        meta.insert("depth".into(), MetaValue::from(75u32));
        TrackPayload {
            event: "scroll_depth".into(),
            from: "/journeys/manaslu-circuit".into(),
            to: None,
            meta: Some(meta),
        }
    }

    #[test]
    fn payload_omits_absent_fields() {
        let json = serde_json::to_string(&scroll_payload()).unwrap();
        assert_eq!(
            json,
            r#"{"event":"scroll_depth","from":"/journeys/manaslu-circuit","meta":{"depth":75}}"#
        );
    }

    #[test]
    fn deliver_posts_json_body() {
        let (url, rx) = capture_one(OK_RESPONSE);
        Emitter::new(url).deliver(&scroll_payload()).unwrap();

        let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(request.starts_with("POST /api/track"));
        assert!(request.contains(r#""event":"scroll_depth""#));
        assert!(request.contains(r#""depth":75"#));
    }

    #[test]
    fn deliver_reports_rejection_status() {
        let (url, _rx) = capture_one(REJECT_RESPONSE);
        let err = Emitter::new(url).deliver(&scroll_payload()).unwrap_err();
        assert!(matches!(err, EmitError::Rejected(422)));
    }

    #[test]
    fn deliver_reports_unreachable_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = Emitter::new(format!("http://{addr}/api/track"))
            .deliver(&scroll_payload())
            .unwrap_err();
        assert!(matches!(err, EmitError::Transport(_)));
    }

    #[test]
    fn emit_eventually_delivers() {
        let (url, rx) = capture_one(OK_RESPONSE);
        Emitter::new(url).emit(scroll_payload());
        let request = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(request.contains(r#""from":"/journeys/manaslu-circuit""#));
    }

    #[test]
    fn emit_does_not_wait_for_a_stalled_endpoint() {
        // Accepts the connection but never answers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let _held = listener.accept();
            std::thread::sleep(Duration::from_secs(10));
        });

        let emitter = Emitter::new(format!("http://{addr}/api/track"));
        let started = Instant::now();
        emitter.emit(scroll_payload());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn emit_swallows_unreachable_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Emitter::new(format!("http://{addr}/api/track")).emit(scroll_payload());
    }
}
