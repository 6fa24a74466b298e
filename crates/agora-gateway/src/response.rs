use std::io;

use agora_wire::ResponseHead;
use serde::Serialize;
use serde_json::ser::Formatter;

/// Matches the wire format mandated for response bodies: 4-space indent,
/// `", "` between array/object elements, `": "` between key and value —
/// the comma carries a trailing space before the newline, unlike
/// `serde_json`'s stock `PrettyFormatter`.
#[derive(Default)]
struct AgoraJsonFormatter {
    current_indent: usize,
    has_value: bool,
}

const INDENT: &[u8] = b"    ";

fn write_indent<W: ?Sized + io::Write>(writer: &mut W, n: usize) -> io::Result<()> {
    for _ in 0..n {
        writer.write_all(INDENT)?;
    }
    Ok(())
}

impl Formatter for AgoraJsonFormatter {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            write_indent(writer, self.current_indent)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            writer.write_all(b"\n")?;
        } else {
            writer.write_all(b", \n")?;
        }
        write_indent(writer, self.current_indent)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent += 1;
        self.has_value = false;
        writer.write_all(b"{")
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.current_indent -= 1;
        if self.has_value {
            writer.write_all(b"\n")?;
            write_indent(writer, self.current_indent)?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        if first {
            writer.write_all(b"\n")?;
        } else {
            writer.write_all(b", \n")?;
        }
        write_indent(writer, self.current_indent)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.has_value = true;
        Ok(())
    }
}

fn render(body: &impl Serialize) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, AgoraJsonFormatter::default());
    body.serialize(&mut serializer).expect("json bodies are always serializable");
    buf
}

/// Build a framed JSON response: status line + headers + exact
/// Content-Length, ready to hand to `HttpCodec::send`.
pub fn json_response(status: u16, body: &impl Serialize) -> (ResponseHead, Vec<u8>) {
    let bytes = render(body);
    let head = ResponseHead {
        status,
        reason: String::new(),
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Content-Length".to_string(), bytes.len().to_string()),
        ],
    };
    (head, bytes)
}
