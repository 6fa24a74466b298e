use std::sync::Arc;

use agora_core::messages;
use agora_wire::{Event, HttpCodec, Next, OurState, RequestHead, ResponseEvent};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::response::json_response;
use crate::router;

/// Drives one TCP connection end to end: feeds raw bytes into the codec,
/// assembles full requests, dispatches them, and writes framed responses.
/// HTTP/1.1 without pipelining: request/response pairs on one connection
/// are strictly serialized.
pub async fn handle_connection(mut socket: TcpStream, state: Arc<AppState>) {
    let mut codec = HttpCodec::new();
    let mut read_buf = [0u8; 8192];
    let mut current_request: Option<RequestHead> = None;
    let mut body = Vec::new();

    loop {
        let event = match codec.next_event() {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "protocol error, closing connection");
                write_raw_error(&mut socket, 405, messages::METHOD_NOT_ALLOWED).await;
                return;
            }
        };

        match event {
            Next::NeedData => match socket.read(&mut read_buf).await {
                Ok(0) => codec.receive_data(b""),
                Ok(n) => codec.receive_data(&read_buf[..n]),
                Err(e) => {
                    debug!(error = %e, "read error, closing connection");
                    return;
                }
            },
            Next::Paused => return,
            Next::Event(Event::Request(head)) => {
                current_request = Some(head);
                body.clear();
            }
            Next::Event(Event::Data(chunk)) => body.extend_from_slice(&chunk),
            Next::Event(Event::EndOfMessage) => {
                let request = current_request
                    .take()
                    .expect("EndOfMessage without a preceding Request");

                let (status, response_body) = if body.is_empty() {
                    router::dispatch(&state, &request, &Value::Null)
                } else {
                    match serde_json::from_slice::<Value>(&body) {
                        Ok(parsed) => router::dispatch(&state, &request, &parsed),
                        Err(_) => {
                            write_raw_error(&mut socket, 400, messages::BAD_REQUEST).await;
                            return;
                        }
                    }
                };

                if !send_response(&mut codec, &mut socket, status, &response_body).await {
                    return;
                }

                match codec.our_state() {
                    OurState::MustClose => return,
                    OurState::Done => {
                        if codec.start_next_cycle().is_err() {
                            return;
                        }
                    }
                    _ => {}
                }
            }
            Next::Event(Event::ConnectionClosed) => return,
        }
    }
}

async fn send_response(
    codec: &mut HttpCodec,
    socket: &mut TcpStream,
    status: u16,
    body: &Value,
) -> bool {
    let (head, payload) = json_response(status, body);
    let Ok(head_bytes) = codec.send(ResponseEvent::Response(head)) else {
        return false;
    };
    if socket.write_all(&head_bytes).await.is_err() {
        return false;
    }
    if !payload.is_empty() {
        let Ok(data_bytes) = codec.send(ResponseEvent::Data(payload)) else {
            return false;
        };
        if socket.write_all(&data_bytes).await.is_err() {
            return false;
        }
    }
    if codec.send(ResponseEvent::EndOfMessage).is_err() {
        return false;
    }
    socket.flush().await.is_ok()
}

/// Write a minimal response outside the codec's state machine, for cases
/// where the request never parsed far enough to drive it normally.
async fn write_raw_error(socket: &mut TcpStream, status: u16, message: &str) {
    let (_, payload) = json_response(status, &serde_json::json!({ "error": message }));
    let reason = match status {
        400 => "Bad Request",
        405 => "Method Not Allowed",
        _ => "Error",
    };
    let mut out = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason,
        payload.len()
    )
    .into_bytes();
    out.extend_from_slice(&payload);
    let _ = socket.write_all(&out).await;
    let _ = socket.flush().await;
}
