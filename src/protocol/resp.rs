//! Streaming frame parser and reply encoder
//!
//! The parser walks an immutable byte buffer left to right and yields one
//! `Command` per top-level frame. The encoder turns `RespValue` replies
//! back into bytes.

use super::command::Command;
use super::types::{ParseError, RespValue};
use bytes::{BufMut, Bytes, BytesMut};

const CRLF: &[u8] = b"\r\n";

/// Maximum aggregate nesting accepted before giving up
pub const MAX_DEPTH: usize = 64;

/// Cursor over a buffer holding zero or more encoded frames
///
/// Not meant to be shared: every call advances the cursor.
pub struct StreamingParser<'a> {
    buf: &'a [u8],
    pos: usize,
    frame_start: usize,
    strict: bool,
}

impl<'a> StreamingParser<'a> {
    /// Create a parser positioned at the start of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        StreamingParser {
            buf,
            pos: 0,
            frame_start: 0,
            strict: false,
        }
    }

    /// Require the CRLF after every bulk payload to be present
    ///
    /// Without this, a bulk payload ending exactly at the end of the buffer
    /// is accepted. Network callers enable it so that a read split right
    /// after the payload is reported as truncated and retried.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Number of bytes consumed so far
    pub fn position(&self) -> usize {
        self.pos
    }

    /// True once every byte of the buffer has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Raw bytes of the most recently parsed top-level frame
    pub fn last_frame(&self) -> &'a [u8] {
        let buf = self.buf;
        &buf[self.frame_start..self.pos]
    }

    /// Parse the next top-level frame
    ///
    /// Returns `Ok(None)` at end of input. On error the cursor is left at
    /// the start of the offending frame.
    pub fn parse_command(&mut self) -> Result<Option<Command>, ParseError> {
        if self.is_exhausted() {
            return Ok(None);
        }

        self.frame_start = self.pos;
        match self.parse_frame(0) {
            Ok(command) => Ok(Some(command)),
            Err(e) => {
                self.pos = self.frame_start;
                Err(e)
            }
        }
    }

    fn parse_frame(&mut self, depth: usize) -> Result<Command, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::TooDeep(MAX_DEPTH));
        }

        match self.peek()? {
            b'*' | b'~' | b'>' | b'%' => self.parse_aggregate(depth),
            _ => self.parse_scalar().map(|text| Command::new(text, Vec::new())),
        }
    }

    /// Aggregates: *<n>\r\n followed by n frames
    fn parse_aggregate(&mut self, depth: usize) -> Result<Command, ParseError> {
        self.pos += 1;
        let count = self.read_length()?;
        if count < 0 {
            return Err(ParseError::InvalidLength(count.to_string()));
        }
        let count = count as usize;

        let mut name = String::new();
        // The count is untrusted, don't let it size the allocation
        let mut args = Vec::with_capacity(count.saturating_sub(1).min(64));

        for i in 0..count {
            let element = self.parse_frame(depth + 1)?;
            let (element_name, element_args) = element.into_parts();
            if i == 0 {
                name = element_name;
            } else {
                args.push(element_name);
            }
            args.extend(element_args);
        }

        Ok(Command::new(name, args))
    }

    /// Every non-aggregate frame decodes to a single piece of text
    fn parse_scalar(&mut self) -> Result<String, ParseError> {
        let offset = self.pos;
        let token = self.peek()?;
        self.pos += 1;

        match token {
            b'$' | b'!' => self.parse_bulk(token == b'$'),
            b':' => {
                let text = self.read_text_line()?;
                if text.parse::<i64>().is_err() {
                    return Err(ParseError::InvalidInteger(text));
                }
                Ok(text)
            }
            b'+' | b'-' => self.read_text_line(),
            b'#' => {
                let text = self.read_text_line()?;
                match text.as_str() {
                    "t" | "f" => Ok(text),
                    _ => Err(ParseError::InvalidBoolean(text)),
                }
            }
            b'_' => {
                let line_start = self.pos;
                let line = self.read_line()?;
                if !line.is_empty() {
                    return Err(ParseError::MissingCrlf { offset: line_start });
                }
                Ok("null".to_string())
            }
            other => Err(ParseError::UnexpectedToken {
                token: char::from(other),
                offset,
            }),
        }
    }

    /// Bulk strings and blob errors: <len>\r\n<bytes>\r\n
    fn parse_bulk(&mut self, allow_null: bool) -> Result<String, ParseError> {
        let len = self.read_length()?;
        if len == -1 && allow_null {
            return Ok("null".to_string());
        }
        if len < 0 {
            return Err(ParseError::InvalidLength(len.to_string()));
        }
        let len = len as usize;

        let start = self.pos;
        if self.remaining() < len {
            return Err(ParseError::Truncated { offset: self.buf.len() });
        }
        self.pos += len;
        let text = Self::decode(&self.buf[start..self.pos], start)?;

        // The trailing CRLF is only checked when the buffer still holds it
        match self.remaining() {
            0 if !self.strict => {}
            0 => return Err(ParseError::Truncated { offset: self.pos }),
            1 if self.strict && self.buf[self.pos] == b'\r' => {
                return Err(ParseError::Truncated { offset: self.buf.len() });
            }
            1 => return Err(ParseError::MissingCrlf { offset: self.pos }),
            _ => {
                if &self.buf[self.pos..self.pos + 2] != CRLF {
                    return Err(ParseError::MissingCrlf { offset: self.pos });
                }
                self.pos += 2;
            }
        }

        Ok(text)
    }

    /// Read a signed decimal header line (lengths and counts)
    fn read_length(&mut self) -> Result<i64, ParseError> {
        let text = self.read_text_line()?;
        text.parse::<i64>()
            .map_err(|_| ParseError::InvalidLength(text))
    }

    fn read_text_line(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        let line = self.read_line()?;
        Self::decode(line, start)
    }

    /// Read up to the next CRLF, advance past it, return the line without it
    fn read_line(&mut self) -> Result<&'a [u8], ParseError> {
        let buf = self.buf;
        let start = self.pos;
        let cr = match buf[start..].iter().position(|&b| b == b'\r') {
            Some(i) => start + i,
            None => return Err(ParseError::Truncated { offset: buf.len() }),
        };

        match buf.get(cr + 1) {
            Some(b'\n') => {
                self.pos = cr + 2;
                Ok(&buf[start..cr])
            }
            Some(_) => Err(ParseError::MissingCrlf { offset: cr }),
            None => Err(ParseError::Truncated { offset: buf.len() }),
        }
    }

    fn peek(&self) -> Result<u8, ParseError> {
        self.buf
            .get(self.pos)
            .copied()
            .ok_or(ParseError::Truncated { offset: self.pos })
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn decode(bytes: &[u8], offset: usize) -> Result<String, ParseError> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| ParseError::InvalidUtf8 {
                offset: offset + e.valid_up_to(),
            })
    }
}

impl Iterator for StreamingParser<'_> {
    type Item = Result<Command, ParseError>;

    /// Yields commands until end of input; stops for good after an error
    fn next(&mut self) -> Option<Self::Item> {
        match self.parse_command() {
            Ok(Some(command)) => Some(Ok(command)),
            Ok(None) => None,
            Err(e) => {
                self.pos = self.buf.len();
                Some(Err(e))
            }
        }
    }
}

/// Reply encoder
pub struct RespEncoder;

impl RespEncoder {
    /// Encode a RESP value to bytes
    pub fn encode(value: &RespValue) -> Bytes {
        let mut buf = BytesMut::new();
        Self::encode_to(&mut buf, value);
        buf.freeze()
    }

    /// Encode a RESP value into an existing buffer
    pub fn encode_to(buf: &mut BytesMut, value: &RespValue) {
        match value {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Error(e) => {
                buf.put_u8(b'-');
                buf.put_slice(e.as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::Integer(i) => {
                buf.put_u8(b':');
                buf.put_slice(i.to_string().as_bytes());
                buf.put_slice(CRLF);
            }
            RespValue::BulkString(bytes) => {
                buf.put_u8(b'$');
                buf.put_slice(bytes.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                buf.put_slice(bytes);
                buf.put_slice(CRLF);
            }
            RespValue::Null => {
                buf.put_slice(b"$-1\r\n");
            }
            RespValue::Array(arr) => {
                buf.put_u8(b'*');
                buf.put_slice(arr.len().to_string().as_bytes());
                buf.put_slice(CRLF);
                for elem in arr {
                    Self::encode_to(buf, elem);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &str) -> Result<Option<Command>, ParseError> {
        StreamingParser::new(input.as_bytes()).parse_command()
    }

    fn cmd(name: &str, args: &[&str]) -> Command {
        Command::new(name, args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_parse_command_array() {
        let result = parse_one("*2\r\n$4\r\nPING\r\n$4\r\ntest\r\n").unwrap();
        assert_eq!(result, Some(cmd("PING", &["test"])));
    }

    #[test]
    fn test_parse_empty_array() {
        let result = parse_one("*0\r\n").unwrap();
        assert_eq!(result, Some(cmd("", &[])));
    }

    #[test]
    fn test_parse_mixed_elements() {
        let input = "*7\r\n$3\r\nSET\r\n+key\r\n:42\r\n#t\r\n_\r\n-oops\r\n!3\r\nbad\r\n";
        let result = parse_one(input).unwrap();
        assert_eq!(result, Some(cmd("SET", &["key", "42", "t", "null", "oops", "bad"])));
    }

    #[test]
    fn test_parse_nested_aggregates_flatten() {
        // [CMD, [a, b, c], d]
        let input = "*3\r\n$3\r\nCMD\r\n*3\r\n$1\r\na\r\n$1\r\nb\r\n$1\r\nc\r\n$1\r\nd\r\n";
        let result = parse_one(input).unwrap();
        assert_eq!(result, Some(cmd("CMD", &["a", "b", "c", "d"])));

        // A nested aggregate in first position supplies the name
        let input = "%2\r\n~2\r\n$3\r\nGET\r\n$1\r\nk\r\n$1\r\nx\r\n";
        let result = parse_one(input).unwrap();
        assert_eq!(result, Some(cmd("GET", &["k", "x"])));
    }

    #[test]
    fn test_parse_top_level_scalars() {
        assert_eq!(parse_one("$5\r\nhello\r\n").unwrap(), Some(cmd("hello", &[])));
        assert_eq!(parse_one("+OK\r\n").unwrap(), Some(cmd("OK", &[])));
        assert_eq!(parse_one(":-12\r\n").unwrap(), Some(cmd("-12", &[])));
        assert_eq!(parse_one("_\r\n").unwrap(), Some(cmd("null", &[])));
        assert_eq!(parse_one("$-1\r\n").unwrap(), Some(cmd("null", &[])));
    }

    #[test]
    fn test_parse_multiple_frames_then_end() {
        let input = b"*1\r\n$4\r\nPING\r\n*2\r\n$3\r\nGET\r\n$1\r\nk\r\n";
        let mut parser = StreamingParser::new(input);

        assert_eq!(parser.parse_command().unwrap(), Some(cmd("PING", &[])));
        assert_eq!(parser.last_frame(), b"*1\r\n$4\r\nPING\r\n");
        assert_eq!(parser.parse_command().unwrap(), Some(cmd("GET", &["k"])));
        assert_eq!(parser.last_frame(), b"*2\r\n$3\r\nGET\r\n$1\r\nk\r\n");
        assert_eq!(parser.parse_command().unwrap(), None);
        assert!(parser.is_exhausted());
    }

    #[test]
    fn test_parse_empty_input() {
        assert_eq!(parse_one("").unwrap(), None);
    }

    #[test]
    fn test_unexpected_token() {
        let err = parse_one("?what\r\n").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedToken { token: '?', offset: 0 });

        let err = parse_one("*2\r\n$3\r\nGET\r\n?k\r\n").unwrap_err();
        assert_eq!(err, ParseError::UnexpectedToken { token: '?', offset: 13 });
    }

    #[test]
    fn test_bulk_length_past_end() {
        let err = parse_one("$10\r\nshort\r\n").unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_array_missing_elements() {
        let err = parse_one("*3\r\n$3\r\nSET\r\n$1\r\nk\r\n").unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_lone_carriage_return() {
        let err = parse_one("+OK\rX\n").unwrap_err();
        assert_eq!(err, ParseError::MissingCrlf { offset: 3 });

        let err = parse_one("+OK\r").unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_invalid_integer() {
        let err = parse_one("*2\r\n$4\r\nINCR\r\n:12a\r\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidInteger("12a".to_string()));
    }

    #[test]
    fn test_invalid_boolean() {
        let err = parse_one("#x\r\n").unwrap_err();
        assert_eq!(err, ParseError::InvalidBoolean("x".to_string()));
        assert!(parse_one("#tt\r\n").is_err());
    }

    #[test]
    fn test_invalid_lengths() {
        assert_eq!(
            parse_one("*x\r\n").unwrap_err(),
            ParseError::InvalidLength("x".to_string())
        );
        assert_eq!(
            parse_one("*-1\r\n").unwrap_err(),
            ParseError::InvalidLength("-1".to_string())
        );
        assert_eq!(
            parse_one("!-1\r\n").unwrap_err(),
            ParseError::InvalidLength("-1".to_string())
        );
    }

    #[test]
    fn test_null_with_payload_is_rejected() {
        assert!(matches!(
            parse_one("_x\r\n").unwrap_err(),
            ParseError::MissingCrlf { .. }
        ));
    }

    #[test]
    fn test_bulk_without_trailing_crlf_at_end() {
        // Lenient mode accepts a payload that ends the buffer
        assert_eq!(parse_one("$4\r\ntest").unwrap(), Some(cmd("test", &[])));

        // Strict mode waits for the terminator
        let mut parser = StreamingParser::new(b"$4\r\ntest").strict();
        assert!(parser.parse_command().unwrap_err().is_incomplete());
        let mut parser = StreamingParser::new(b"$4\r\ntest\r").strict();
        assert!(parser.parse_command().unwrap_err().is_incomplete());

        // Bytes present but not CRLF are always an error
        assert!(matches!(
            parse_one("$4\r\ntestXY").unwrap_err(),
            ParseError::MissingCrlf { offset: 8 }
        ));
    }

    #[test]
    fn test_error_rewinds_cursor() {
        let input = b"*1\r\n$4\r\nPING\r\n*2\r\n$3\r\nGET\r\n";
        let mut parser = StreamingParser::new(input);
        parser.parse_command().unwrap();
        let consumed = parser.position();

        assert!(parser.parse_command().is_err());
        assert_eq!(parser.position(), consumed);
    }

    #[test]
    fn test_invalid_utf8() {
        let err = StreamingParser::new(b"$2\r\n\xff\xfe\r\n").parse_command().unwrap_err();
        assert_eq!(err, ParseError::InvalidUtf8 { offset: 4 });
    }

    #[test]
    fn test_nesting_limit() {
        let input = "*1\r\n".repeat(MAX_DEPTH + 2);
        assert_eq!(parse_one(&input).unwrap_err(), ParseError::TooDeep(MAX_DEPTH));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let input = b"*1\r\n$4\r\nPING\r\n?\r\n*1\r\n$4\r\nPING\r\n";
        let results: Vec<_> = StreamingParser::new(input).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }

    #[test]
    fn test_command_wire_round_trip() {
        let original = cmd("SET", &["user:1", "hello world"]);
        let wire = original.to_wire();
        let parsed = StreamingParser::new(&wire).parse_command().unwrap();
        assert_eq!(parsed, Some(original));
    }

    #[test]
    fn test_encode_replies() {
        assert_eq!(RespEncoder::encode(&RespValue::ok()), Bytes::from("+OK\r\n"));
        assert_eq!(RespEncoder::encode(&RespValue::integer(-2)), Bytes::from(":-2\r\n"));
        assert_eq!(
            RespEncoder::encode(&RespValue::bulk_string("v1")),
            Bytes::from("$2\r\nv1\r\n")
        );
        assert_eq!(RespEncoder::encode(&RespValue::null()), Bytes::from("$-1\r\n"));
        assert_eq!(
            RespEncoder::encode(&RespValue::error("ERR boom")),
            Bytes::from("-ERR boom\r\n")
        );
    }
}
