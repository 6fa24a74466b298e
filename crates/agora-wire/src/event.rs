/// A parsed request line plus headers. Emitted once per request, before any
/// `Event::Data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Case-insensitive header lookup, as HTTP requires.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Events produced by `HttpCodec::next_event` while reading a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Request(RequestHead),
    Data(Vec<u8>),
    EndOfMessage,
    ConnectionClosed,
}

/// Either a parsed event, or a control sentinel telling the caller what to
/// do next. Mirrors h11's `NEED_DATA`/`PAUSED` sentinels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    Event(Event),
    /// The buffer doesn't hold a complete event yet; read more bytes.
    NeedData,
    /// Nothing more can happen on the read side until the write side
    /// advances (e.g. we finished a request and are waiting to be told to
    /// start the next cycle).
    Paused,
}

/// A response status line plus headers, fed into `HttpCodec::send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
}

/// Events consumed by `HttpCodec::send` while writing a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseEvent {
    Response(ResponseHead),
    Data(Vec<u8>),
    EndOfMessage,
}
