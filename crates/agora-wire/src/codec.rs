use thiserror::Error;

use crate::event::{Event, Next, RequestHead, ResponseEvent, ResponseHead};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed request line")]
    MalformedRequestLine,
    #[error("malformed header")]
    MalformedHeader,
    #[error("invalid content-length")]
    InvalidContentLength,
    #[error("invalid protocol state: {0}")]
    InvalidState(&'static str),
}

/// Our half of the connection's request/response cycle. Named after h11's
/// `our_state`: IDLE -> SEND_RESPONSE -> DONE -> IDLE on keep-alive, or
/// DONE -> MUST_CLOSE when either side asked for the connection to close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OurState {
    Idle,
    SendResponse,
    Done,
    MustClose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ParseState {
    RequestLine,
    Headers,
    Body { remaining: usize },
}

/// Sans-I/O HTTP/1.1 parser and response encoder. Feed raw bytes in with
/// `receive_data`, drain parsed events with `next_event`, and push response
/// events out with `send` to get framed bytes to write back.
///
/// One instance handles exactly one connection's full keep-alive lifetime;
/// `start_next_cycle` resets it between requests.
pub struct HttpCodec {
    inbuf: Vec<u8>,
    eof: bool,
    parse_state: ParseState,
    pending_headers: Vec<(String, String)>,
    our_state: OurState,
    /// Set once the request's `Connection` header (or absence of keep-alive
    /// on HTTP/1.0) is known; drives the DONE -> MUST_CLOSE transition.
    close_after_response: bool,
}

impl Default for HttpCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpCodec {
    pub fn new() -> Self {
        Self {
            inbuf: Vec::new(),
            eof: false,
            parse_state: ParseState::RequestLine,
            pending_headers: Vec::new(),
            our_state: OurState::Idle,
            close_after_response: false,
        }
    }

    pub fn our_state(&self) -> OurState {
        self.our_state
    }

    /// Feed newly-read bytes in. An empty slice signals EOF (peer closed
    /// their write side), matching h11's `receive_data(b"")` convention.
    pub fn receive_data(&mut self, data: &[u8]) {
        if data.is_empty() {
            self.eof = true;
        } else {
            self.inbuf.extend_from_slice(data);
        }
    }

    /// Pull the next parsed event, or a sentinel telling the caller what to
    /// do (read more data, or wait for the write side to advance).
    pub fn next_event(&mut self) -> Result<Next, WireError> {
        loop {
            match &self.parse_state {
                ParseState::RequestLine => match find_crlf(&self.inbuf) {
                    None => {
                        if self.eof && self.inbuf.is_empty() {
                            return Ok(Next::Event(Event::ConnectionClosed));
                        }
                        return Ok(Next::NeedData);
                    }
                    Some(idx) => {
                        let line = drain_line(&mut self.inbuf, idx);
                        let text = std::str::from_utf8(&line)
                            .map_err(|_| WireError::MalformedRequestLine)?;
                        let mut parts = text.splitn(3, ' ');
                        let method = parts.next().ok_or(WireError::MalformedRequestLine)?;
                        let target = parts.next().ok_or(WireError::MalformedRequestLine)?;
                        let version = parts.next().ok_or(WireError::MalformedRequestLine)?;
                        if method.is_empty()
                            || !method.bytes().all(|b| b.is_ascii_uppercase())
                            || target.is_empty()
                            || !version.starts_with("HTTP/1.")
                        {
                            return Err(WireError::MalformedRequestLine);
                        }
                        self.close_after_response = version.trim() == "HTTP/1.0";
                        self.pending_headers = vec![
                            ("__method".into(), method.to_string()),
                            ("__target".into(), target.to_string()),
                        ];
                        self.parse_state = ParseState::Headers;
                    }
                },
                ParseState::Headers => match find_crlf(&self.inbuf) {
                    None => {
                        if self.eof {
                            return Err(WireError::MalformedHeader);
                        }
                        return Ok(Next::NeedData);
                    }
                    Some(idx) => {
                        let line = drain_line(&mut self.inbuf, idx);
                        if line.is_empty() {
                            let method = self.take_pseudo("__method");
                            let target = self.take_pseudo("__target");
                            let headers = std::mem::take(&mut self.pending_headers);
                            if let Some(connection) =
                                headers.iter().find(|(k, _)| k.eq_ignore_ascii_case("connection"))
                            {
                                self.close_after_response =
                                    connection.1.eq_ignore_ascii_case("close");
                            }
                            let content_length = headers
                                .iter()
                                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                                .map(|(_, v)| v.trim().parse::<usize>())
                                .transpose()
                                .map_err(|_| WireError::InvalidContentLength)?
                                .unwrap_or(0);
                            self.parse_state = ParseState::Body {
                                remaining: content_length,
                            };
                            return Ok(Next::Event(Event::Request(RequestHead {
                                method,
                                target,
                                headers,
                            })));
                        }
                        let text = std::str::from_utf8(&line)
                            .map_err(|_| WireError::MalformedHeader)?;
                        let (name, value) =
                            text.split_once(':').ok_or(WireError::MalformedHeader)?;
                        self.pending_headers
                            .push((name.trim().to_string(), value.trim().to_string()));
                    }
                },
                ParseState::Body { remaining } => {
                    let remaining = *remaining;
                    if remaining == 0 {
                        self.parse_state = ParseState::RequestLine;
                        return Ok(Next::Event(Event::EndOfMessage));
                    }
                    if self.inbuf.len() < remaining {
                        if self.eof {
                            return Err(WireError::InvalidContentLength);
                        }
                        return Ok(Next::NeedData);
                    }
                    let chunk: Vec<u8> = self.inbuf.drain(..remaining).collect();
                    self.parse_state = ParseState::Body { remaining: 0 };
                    return Ok(Next::Event(Event::Data(chunk)));
                }
            }
        }
    }

    fn take_pseudo(&mut self, key: &str) -> String {
        if let Some(pos) = self.pending_headers.iter().position(|(k, _)| k == key) {
            self.pending_headers.remove(pos).1
        } else {
            String::new()
        }
    }

    /// Push a response event out, getting back the bytes to write to the
    /// socket. Panics-free: returns `InvalidState` if called out of order.
    pub fn send(&mut self, event: ResponseEvent) -> Result<Vec<u8>, WireError> {
        match event {
            ResponseEvent::Response(head) => self.send_head(head),
            ResponseEvent::Data(chunk) => self.send_data(chunk),
            ResponseEvent::EndOfMessage => self.send_end_of_message(),
        }
    }

    fn send_head(&mut self, head: ResponseHead) -> Result<Vec<u8>, WireError> {
        if self.our_state != OurState::Idle {
            return Err(WireError::InvalidState("expected Idle before Response"));
        }
        self.our_state = OurState::SendResponse;
        let reason = if head.reason.is_empty() {
            default_reason(head.status)
        } else {
            head.reason.as_str()
        };
        let mut out = format!("HTTP/1.1 {} {}\r\n", head.status, reason).into_bytes();
        for (name, value) in &head.headers {
            out.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        Ok(out)
    }

    fn send_data(&mut self, chunk: Vec<u8>) -> Result<Vec<u8>, WireError> {
        if self.our_state != OurState::SendResponse {
            return Err(WireError::InvalidState("expected SendResponse before Data"));
        }
        Ok(chunk)
    }

    fn send_end_of_message(&mut self) -> Result<Vec<u8>, WireError> {
        if self.our_state != OurState::SendResponse {
            return Err(WireError::InvalidState(
                "expected SendResponse before EndOfMessage",
            ));
        }
        self.our_state = if self.close_after_response {
            OurState::MustClose
        } else {
            OurState::Done
        };
        Ok(Vec::new())
    }

    /// Reset for the next keep-alive request/response cycle. Only valid
    /// from `Done`.
    pub fn start_next_cycle(&mut self) -> Result<(), WireError> {
        if self.our_state != OurState::Done {
            return Err(WireError::InvalidState("expected Done before next cycle"));
        }
        self.our_state = OurState::Idle;
        self.close_after_response = false;
        Ok(())
    }
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn drain_line(buf: &mut Vec<u8>, crlf_at: usize) -> Vec<u8> {
    let line: Vec<u8> = buf.drain(..crlf_at).collect();
    buf.drain(..2); // the CRLF itself
    line
}

fn default_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_get_with_no_body() {
        let mut codec = HttpCodec::new();
        codec.receive_data(b"GET /status HTTP/1.1\r\nHost: x\r\nAuthorization: Bearer abc\r\n\r\n");

        let req = match codec.next_event().unwrap() {
            Next::Event(Event::Request(r)) => r,
            other => panic!("expected Request, got {other:?}"),
        };
        assert_eq!(req.method, "GET");
        assert_eq!(req.target, "/status");
        assert_eq!(req.header("authorization"), Some("Bearer abc"));

        assert_eq!(
            codec.next_event().unwrap(),
            Next::Event(Event::EndOfMessage)
        );
    }

    #[test]
    fn parses_post_with_body_in_one_chunk() {
        let mut codec = HttpCodec::new();
        let body = br#"{"user_name":"alice"}"#;
        let head = format!(
            "POST /get-token HTTP/1.1\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        codec.receive_data(head.as_bytes());
        codec.receive_data(body);

        match codec.next_event().unwrap() {
            Next::Event(Event::Request(r)) => assert_eq!(r.method, "POST"),
            other => panic!("expected Request, got {other:?}"),
        }
        match codec.next_event().unwrap() {
            Next::Event(Event::Data(d)) => assert_eq!(d, body),
            other => panic!("expected Data, got {other:?}"),
        }
        assert_eq!(
            codec.next_event().unwrap(),
            Next::Event(Event::EndOfMessage)
        );
    }

    #[test]
    fn needs_more_data_on_partial_request_line() {
        let mut codec = HttpCodec::new();
        codec.receive_data(b"GET /status HTTP/1.1\r\n");
        assert_eq!(codec.next_event().unwrap(), Next::NeedData);
    }

    #[test]
    fn needs_more_data_on_partial_body() {
        let mut codec = HttpCodec::new();
        codec.receive_data(b"POST /send HTTP/1.1\r\nContent-Length: 10\r\n\r\n12345");
        // Drain the Request event first.
        assert!(matches!(
            codec.next_event().unwrap(),
            Next::Event(Event::Request(_))
        ));
        assert_eq!(codec.next_event().unwrap(), Next::NeedData);
    }

    #[test]
    fn rejects_malformed_request_line() {
        let mut codec = HttpCodec::new();
        codec.receive_data(b"bogus\r\n\r\n");
        assert!(codec.next_event().is_err());
    }

    #[test]
    fn keep_alive_cycle_resets_state() {
        let mut codec = HttpCodec::new();
        codec.receive_data(b"GET /status HTTP/1.1\r\n\r\n");
        assert!(matches!(
            codec.next_event().unwrap(),
            Next::Event(Event::Request(_))
        ));
        assert_eq!(
            codec.next_event().unwrap(),
            Next::Event(Event::EndOfMessage)
        );

        codec
            .send(ResponseEvent::Response(ResponseHead {
                status: 200,
                reason: String::new(),
                headers: vec![],
            }))
            .unwrap();
        codec.send(ResponseEvent::EndOfMessage).unwrap();
        assert_eq!(codec.our_state(), OurState::Done);

        codec.start_next_cycle().unwrap();
        assert_eq!(codec.our_state(), OurState::Idle);
    }

    #[test]
    fn http_1_0_forces_must_close() {
        let mut codec = HttpCodec::new();
        codec.receive_data(b"GET /status HTTP/1.0\r\n\r\n");
        assert!(matches!(
            codec.next_event().unwrap(),
            Next::Event(Event::Request(_))
        ));
        assert_eq!(
            codec.next_event().unwrap(),
            Next::Event(Event::EndOfMessage)
        );
        codec
            .send(ResponseEvent::Response(ResponseHead {
                status: 200,
                reason: String::new(),
                headers: vec![],
            }))
            .unwrap();
        codec.send(ResponseEvent::EndOfMessage).unwrap();
        assert_eq!(codec.our_state(), OurState::MustClose);
    }
}
