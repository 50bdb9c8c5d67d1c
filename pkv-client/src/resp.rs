//! # RESP2 Framing
//!
//! Purpose: Encode commands as RESP2 arrays of bulk strings and parse the
//! replies the store sends back.
//!
//! ## Design Principles
//! 1. **Buffer Reuse**: The encoder writes into a caller-owned `BytesMut` and
//!    the reader keeps one line buffer for the connection's lifetime.
//! 2. **Binary-Safe**: Bulk strings are raw bytes end to end.
//! 3. **Fail Fast**: Any framing violation is a `StoreError::Protocol`.

use std::io::{BufRead, Read};

use bytes::{BufMut, BytesMut};

use pkv_common::{StoreError, StoreResult};

const CRLF: &[u8] = b"\r\n";

/// One parsed RESP2 reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+OK`, `+PONG`.
    Status(Vec<u8>),
    /// `-ERR ...`.
    Error(Vec<u8>),
    /// `:42`.
    Integer(i64),
    /// `$n` bulk string, `None` for the null bulk `$-1`.
    Bulk(Option<Vec<u8>>),
    /// `*n` array, `None` for the null array `*-1`.
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// Turns an error reply into `StoreError::Server`, passing others through.
    pub fn into_result(self) -> StoreResult<Reply> {
        match self {
            Reply::Error(message) => Err(StoreError::Server { message }),
            other => Ok(other),
        }
    }
}

/// ASCII decimal rendered into a stack buffer.
pub struct Decimal {
    digits: [u8; 20],
    start: usize,
}

impl Decimal {
    pub fn new(mut value: u64) -> Self {
        let mut digits = [0u8; 20];
        let mut start = digits.len();
        loop {
            start -= 1;
            digits[start] = b'0' + (value % 10) as u8;
            value /= 10;
            if value == 0 {
                break;
            }
        }
        Decimal { digits, start }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.digits[self.start..]
    }
}

/// Appends `args` to `out` as one RESP2 command frame.
pub fn encode_command(args: &[&[u8]], out: &mut BytesMut) {
    let body: usize = args.iter().map(|arg| arg.len() + 26).sum();
    out.reserve(body + 24);

    put_header(out, b'*', args.len());
    for arg in args {
        put_header(out, b'$', arg.len());
        out.put_slice(arg);
        out.put_slice(CRLF);
    }
}

fn put_header(out: &mut BytesMut, marker: u8, len: usize) {
    out.put_u8(marker);
    out.put_slice(Decimal::new(len as u64).as_bytes());
    out.put_slice(CRLF);
}

/// Largest bulk payload accepted, matching the server's `proto-max-bulk-len`.
const MAX_BULK_LEN: i64 = 512 * 1024 * 1024;
/// Largest element count accepted for one array reply.
const MAX_ARRAY_LEN: i64 = 1024 * 1024 * 1024;

const PREALLOC_BYTES: usize = 64 * 1024;
const PREALLOC_ITEMS: usize = 1024;

/// Incremental reply parser holding the connection's line buffer.
#[derive(Debug, Default)]
pub struct ReplyReader {
    line: Vec<u8>,
}

impl ReplyReader {
    pub fn new() -> Self {
        ReplyReader {
            line: Vec::with_capacity(128),
        }
    }

    /// Reads exactly one reply (recursing into arrays) from `src`.
    pub fn read<R: BufRead>(&mut self, src: &mut R) -> StoreResult<Reply> {
        self.read_line(src)?;
        let (&marker, rest) = self.line.split_first().ok_or(StoreError::Protocol)?;

        match marker {
            b'+' => Ok(Reply::Status(rest.to_vec())),
            b'-' => Ok(Reply::Error(rest.to_vec())),
            b':' => Ok(Reply::Integer(parse_integer(rest)?)),
            b'$' => {
                let len = parse_integer(rest)?;
                read_bulk(src, len).map(Reply::Bulk)
            }
            b'*' => {
                let len = parse_integer(rest)?;
                if len < 0 {
                    return Ok(Reply::Array(None));
                }
                if len > MAX_ARRAY_LEN {
                    return Err(StoreError::Protocol);
                }
                let mut items = Vec::with_capacity((len as usize).min(PREALLOC_ITEMS));
                for _ in 0..len {
                    items.push(self.read(src)?);
                }
                Ok(Reply::Array(Some(items)))
            }
            _ => Err(StoreError::Protocol),
        }
    }

    fn read_line<R: BufRead>(&mut self, src: &mut R) -> StoreResult<()> {
        self.line.clear();
        if src.read_until(b'\n', &mut self.line)? == 0 {
            return Err(StoreError::Protocol);
        }
        if !self.line.ends_with(CRLF) {
            return Err(StoreError::Protocol);
        }
        self.line.truncate(self.line.len() - CRLF.len());
        Ok(())
    }
}

fn read_bulk<R: BufRead>(src: &mut R, len: i64) -> StoreResult<Option<Vec<u8>>> {
    if len < 0 {
        return Ok(None);
    }
    if len > MAX_BULK_LEN {
        return Err(StoreError::Protocol);
    }
    // Payload and trailing CRLF are read in one call; the buffer grows with
    // the bytes that actually arrive.
    let want = len as usize + CRLF.len();
    let mut data = Vec::with_capacity(want.min(PREALLOC_BYTES));
    src.by_ref().take(want as u64).read_to_end(&mut data)?;
    if data.len() < want {
        return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into());
    }
    if !data.ends_with(CRLF) {
        return Err(StoreError::Protocol);
    }
    data.truncate(len as usize);
    Ok(Some(data))
}

fn parse_integer(text: &[u8]) -> StoreResult<i64> {
    std::str::from_utf8(text)
        .ok()
        .and_then(|digits| digits.parse().ok())
        .ok_or(StoreError::Protocol)
}
