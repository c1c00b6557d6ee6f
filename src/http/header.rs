//! Parsed header block and the resumable line parser that fills it.

use crate::{
    errors::ErrorKind,
    http::{
        types::{slice_to_usize, trim_value, CacheControl, ContentType, ETag, Expires, Method, MimeType, Version},
        uri::Uri,
    },
    limits::ReqLimits,
};
use memchr::memchr;
use std::mem;
use tracing::debug;

/// `METHOD SP target SP version`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StartLine {
    /// `None` until a start line was parsed.
    pub method: Option<Method>,
    pub target: Uri,
    pub version: Version,
}

/// `Accept-*` lists in the order the client sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accept {
    pub language: Vec<String>,
    pub charset: Vec<String>,
    pub encoding: Vec<String>,
}

/// `Content-Disposition: form-data; name="..."; filename="..."`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Disposition {
    pub kind: String,
    pub name: String,
    pub filename: String,
}

/// `Content-*` fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    pub content_type: ContentType,
    pub length: usize,
    pub encoding: Vec<String>,
    pub language: Vec<String>,
    pub location: Uri,
    pub disposition: Disposition,
}

/// Header block of a request, a multipart part or a response.
///
/// Only the fields below are interpreted, every other header line is skipped.
///
/// | Header                  | Field                                  |
/// |-------------------------|----------------------------------------|
/// | `User-Agent`            | [`user_agent`](Header::user_agent)     |
/// | `Host`                  | [`host`](Header::host)                 |
/// | `Accept-Language`       | [`accept.language`](Accept::language)  |
/// | `Accept-Charset`        | [`accept.charset`](Accept::charset)    |
/// | `Accept-Encoding`       | [`accept.encoding`](Accept::encoding)  |
/// | `Content-Type`          | [`content.content_type`](Content::content_type) |
/// | `Content-Disposition`   | [`content.disposition`](Content::disposition) |
/// | `Content-Length`        | [`content.length`](Content::length)    |
/// | `Content-Encoding`      | [`content.encoding`](Content::encoding) |
/// | `Content-Language`      | [`content.language`](Content::language) |
/// | `Content-Location`      | [`content.location`](Content::location) |
/// | `Expires`               | [`expires`](Header::expires)           |
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub start_line: StartLine,
    pub user_agent: String,
    pub host: String,
    pub accept: Accept,
    pub content: Content,
    pub expires: Expires,
    pub cache_control: CacheControl,
    pub etag: ETag,
    /// Set once the empty line ending the block was parsed.
    pub complete: bool,
}

impl Header {
    /// Header of a response with the given type, expiring at `expires`.
    pub fn with_content(content_type: ContentType, expires: Expires) -> Self {
        let mut header = Header::default();
        header.content.content_type = content_type;
        header.expires = expires;
        header
    }

    #[inline]
    pub fn clear(&mut self) {
        *self = Header::default();
    }
}

// PARSER

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockKind {
    /// Starts with a start line, leading blank lines are skipped.
    Request,
    /// Header fields only, may be empty.
    Part,
}

/// Parser state kept between chunks.
#[derive(Debug, Default)]
pub(crate) struct HeaderCursor {
    line: Vec<u8>,
    consumed: usize,
    start_line_seen: bool,
}

impl HeaderCursor {
    #[inline]
    pub(crate) fn reset(&mut self) {
        self.line.clear();
        self.consumed = 0;
        self.start_line_seen = false;
    }

    // CR bytes never reach the line.
    #[inline]
    fn push(&mut self, bytes: &[u8], limit: usize) -> Result<(), ErrorKind> {
        for part in bytes.split(|&byte| byte == b'\r') {
            self.line.extend_from_slice(part);
        }

        match self.line.len() > limit {
            true => Err(ErrorKind::HeaderLineTooLong),
            false => Ok(()),
        }
    }

    #[inline]
    fn may_end(&self, kind: BlockKind) -> bool {
        match kind {
            BlockKind::Part => true,
            BlockKind::Request => self.consumed >= 3 && self.start_line_seen,
        }
    }
}

/// Feeds `data` into the header block, returns how many bytes were used.
///
/// Stops right after the empty line that ends the block and sets
/// [`Header::complete`]; otherwise all of `data` is used and the unfinished
/// line is kept in `cursor` for the next call.
pub(crate) fn parse_header_block(
    data: &[u8],
    cursor: &mut HeaderCursor,
    header: &mut Header,
    kind: BlockKind,
    limits: &ReqLimits,
) -> Result<usize, ErrorKind> {
    let mut pos = 0;

    while pos < data.len() {
        let rest = &data[pos..];
        let Some(lf) = memchr(b'\n', rest) else {
            cursor.push(rest, limits.header_line_size)?;
            cursor.consumed += rest.len();
            return Ok(data.len());
        };

        cursor.push(&rest[..lf], limits.header_line_size)?;
        cursor.consumed += lf + 1;
        pos += lf + 1;

        if cursor.line.is_empty() {
            if cursor.may_end(kind) {
                header.complete = true;
                cursor.reset();
                return Ok(pos);
            }
            continue;
        }

        let mut line = mem::take(&mut cursor.line);
        let result = parse_line(&line, cursor, header, kind);
        line.clear();
        cursor.line = line;
        result?;
    }

    Ok(data.len())
}

fn parse_line(
    line: &[u8],
    cursor: &mut HeaderCursor,
    header: &mut Header,
    kind: BlockKind,
) -> Result<(), ErrorKind> {
    let line = simdutf8::basic::from_utf8(line).map_err(|_| ErrorKind::InvalidEncoding)?;

    if kind == BlockKind::Request && !cursor.start_line_seen {
        cursor.start_line_seen = true;
        return parse_start_line(line, &mut header.start_line);
    }

    match line.split_once(':') {
        Some((name, _)) if name.trim().is_empty() => Err(ErrorKind::InvalidHeader),
        Some((name, value)) => parse_field(name.trim(), trim_value(value), header),
        None => {
            debug!(line, "header line without a colon skipped");
            Ok(())
        }
    }
}

fn parse_start_line(line: &str, start_line: &mut StartLine) -> Result<(), ErrorKind> {
    let mut parts = line.splitn(3, ' ');

    let method = Method::from_bytes(parts.next().unwrap_or_default().as_bytes())?;
    let target = parts.next().ok_or(ErrorKind::InvalidUri)?;
    let version = parts.next().ok_or(ErrorKind::UnsupportedVersion)?;

    start_line.method = Some(method);
    start_line.target.parse_into(target.as_bytes())?;
    start_line.version = Version::from_bytes(version.as_bytes())?;

    Ok(())
}

fn parse_field(name: &str, value: &str, header: &mut Header) -> Result<(), ErrorKind> {
    match name.to_ascii_lowercase().as_str() {
        "user-agent" => header.user_agent = value.to_string(),
        "host" => header.host = value.to_string(),

        "accept-language" => header.accept.language = parse_list(value),
        "accept-charset" => header.accept.charset = parse_list(value),
        "accept-encoding" => header.accept.encoding = parse_list(value),

        "content-type" => parse_content_type(value, &mut header.content.content_type),
        "content-disposition" => parse_disposition(value, &mut header.content.disposition),
        "content-length" => {
            header.content.length =
                slice_to_usize(value.as_bytes()).ok_or(ErrorKind::InvalidContentLength)?
        }
        "content-encoding" => header.content.encoding = parse_list(value),
        "content-language" => header.content.language = parse_list(value),
        "content-location" => {
            if !header.content.location.parse_val(value) {
                debug!(value, "invalid Content-Location skipped");
            }
        }

        "expires" => match Expires::parse(value) {
            Some(expires) => header.expires = expires,
            None => debug!(value, "invalid Expires skipped"),
        },

        _ => {}
    }

    Ok(())
}

#[inline]
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(trim_value)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

// `type/subtype; boundary=...; charset=...`
fn parse_content_type(value: &str, content_type: &mut ContentType) {
    let mut params = value.split(';');
    let media = params.next().unwrap_or_default().trim();
    let (name, sub_type) = media.split_once('/').unwrap_or((media, ""));

    content_type.name = MimeType::from_name(name.trim());
    content_type.sub_type = sub_type.trim().to_ascii_lowercase();
    content_type.boundary.clear();
    content_type.charset.clear();

    for (key, value) in params.filter_map(|param| param.split_once('=')) {
        match key.trim() {
            key if key.eq_ignore_ascii_case("boundary") => {
                content_type.boundary = trim_value(value).to_string()
            }
            key if key.eq_ignore_ascii_case("charset") => {
                content_type.charset = trim_value(value).to_string()
            }
            _ => {}
        }
    }
}

// `form-data; name="..."; filename="..."`
fn parse_disposition(value: &str, disposition: &mut Disposition) {
    let mut params = value.split(';');

    disposition.kind = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    disposition.name.clear();
    disposition.filename.clear();

    for (key, value) in params.filter_map(|param| param.split_once('=')) {
        match key.trim() {
            key if key.eq_ignore_ascii_case("name") => disposition.name = trim_value(value).to_string(),
            key if key.eq_ignore_ascii_case("filename") => {
                disposition.filename = trim_value(value).to_string()
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod header_tests {
    use super::*;
    use crate::tools::*;

    fn parse<C: AsRef<[u8]>>(kind: BlockKind, chunks: &[C]) -> Result<(Header, usize), ErrorKind> {
        let mut cursor = HeaderCursor::default();
        let mut header = Header::default();
        let mut used = 0;

        for chunk in chunks {
            let chunk = chunk.as_ref();
            used += parse_header_block(chunk, &mut cursor, &mut header, kind, &ReqLimits::default())?;
            if header.complete {
                break;
            }
        }

        Ok((header, used))
    }

    #[test]
    fn request_head_fields() {
        let packet = request_head();
        let (header, used) = parse(BlockKind::Request, &[packet.as_bytes()]).unwrap();

        assert!(header.complete);
        assert_eq!(used, packet.len());

        assert_eq!(header.start_line.method, Some(Method::Get));
        assert_eq!(header.start_line.target.path(), ["hello.txt"]);
        assert_eq!(header.start_line.version, Version::Http11);

        assert_eq!(header.user_agent, "curl/7.16.3 libcurl/7.16.3 OpenSSL/0.9.7l zlib/1.2.3");
        assert_eq!(header.host, "www.example.com");
        assert_eq!(header.accept.language, ["en", "mi", "ru"]);
        assert_eq!(header.accept.charset, ["iso-8859-5", "unicode-1-1;q=0.8"]);
        assert_eq!(header.accept.encoding, ["gzip;q=1.0", "identity; q=0.5", "*;q=0"]);

        let content = &header.content;
        assert_eq!(content.content_type.name, MimeType::Multipart);
        assert_eq!(content.content_type.sub_type, "mixed");
        assert_eq!(content.content_type.boundary, "gc0pJq0M:08jU534c0p");
        assert_eq!(content.content_type.charset, "ISO-8859-4");
        assert_eq!(content.encoding, ["gzip"]);
        assert_eq!(content.language, ["mi", "en"]);
        assert_eq!(content.location.path(), ["hello.txt"]);
        assert_eq!(content.length, 556);
    }

    #[test]
    fn chunk_invariant() {
        let packet = request_head();
        let (expected, _) = parse(BlockKind::Request, &[packet.as_bytes()]).unwrap();

        for size in [1, 2, 3, 7, 64] {
            let chunks: Vec<&[u8]> = packet.as_bytes().chunks(size).collect();
            let (mut header, used) = parse(BlockKind::Request, &chunks).unwrap();

            header.expires = expected.expires;
            assert_eq!(header, expected, "chunk size {size}");
            assert_eq!(used, packet.len(), "chunk size {size}");
        }
    }

    #[test]
    fn stops_after_block() {
        let data = b"GET / HTTP/1.1\r\nHost: a\r\n\r\nBODY";
        let (header, used) = parse(BlockKind::Request, &[data]).unwrap();

        assert!(header.complete);
        assert_eq!(&data[used..], b"BODY");
    }

    #[test]
    fn leading_blank_lines() {
        let data = b"\r\n\r\nGET / HTTP/1.0\r\n\r\n";
        let (header, used) = parse(BlockKind::Request, &[data]).unwrap();

        assert!(header.complete);
        assert_eq!(used, data.len());
        assert_eq!(header.start_line.version, Version::Http10);

        let (header, _) = parse(BlockKind::Request, &[b"\r\n"]).unwrap();
        assert!(!header.complete);
    }

    #[test]
    fn part_block() {
        let (header, used) = parse(BlockKind::Part, &[b"\r\nrest"]).unwrap();
        assert!(header.complete);
        assert_eq!(used, 2);

        let data = b"Content-Disposition: form-data; name=\"AttachedFile1\"; filename=\"horror-photo-1.jpg\"\r\n\
                     Content-Type: image/jpeg\r\n\r\n";
        let (header, used) = parse(BlockKind::Part, &[data]).unwrap();

        assert_eq!(used, data.len());
        assert_eq!(header.start_line.method, None);
        assert_eq!(header.content.disposition.kind, "form-data");
        assert_eq!(header.content.disposition.name, "AttachedFile1");
        assert_eq!(header.content.disposition.filename, "horror-photo-1.jpg");
        assert_eq!(header.content.content_type.to_string(), "image/jpeg");
    }

    #[test]
    fn invalid_request() {
        #[rustfmt::skip]
        let cases: [(&[u8], ErrorKind); 10] = [
            (b"get / HTTP/1.1\r\n\r\n",                 ErrorKind::InvalidMethod),
            (b"Host: a\r\nGET / HTTP/1.1\r\n\r\n",      ErrorKind::InvalidMethod),
            (b"GET\r\n\r\n",                            ErrorKind::InvalidUri),
            (b"GET  HTTP/1.1\r\n\r\n",                  ErrorKind::InvalidUri),
            (b"GET /a b HTTP/1.1\r\n\r\n",              ErrorKind::UnsupportedVersion),
            (b"GET /\r\n\r\n",                          ErrorKind::UnsupportedVersion),
            (b"GET / HTTP/2.0\r\n\r\n",                 ErrorKind::UnsupportedVersion),
            (b"GET / HTTP/1.1\r\nContent-Length: 1a\r\n\r\n", ErrorKind::InvalidContentLength),
            (b"GET / HTTP/1.1\r\nHost: \xFF\r\n\r\n",  ErrorKind::InvalidEncoding),
            (b"GET / HTTP/1.1\r\n : a\r\n\r\n",         ErrorKind::InvalidHeader),
        ];

        for (data, expected) in cases {
            assert_eq!(parse(BlockKind::Request, &[data]).err(), Some(expected), "{}", str_lossy(data));
        }
    }

    #[test]
    fn line_too_long() {
        let long = format!("GET / HTTP/1.1\r\nUser-Agent: {}\r\n\r\n", "a".repeat(600));
        assert_eq!(
            parse(BlockKind::Request, &[long.as_bytes()]).err(),
            Some(ErrorKind::HeaderLineTooLong)
        );

        // Split across chunks as well
        let chunks: Vec<&[u8]> = long.as_bytes().chunks(10).collect();
        assert_eq!(
            parse(BlockKind::Request, &chunks).err(),
            Some(ErrorKind::HeaderLineTooLong)
        );

        let fits = format!("GET / HTTP/1.1\r\nUser-Agent: {}\r\n\r\n", "a".repeat(500));
        assert!(parse(BlockKind::Request, &[fits.as_bytes()]).is_ok());
    }

    #[test]
    fn skipped_fields() {
        let data = b"GET / HTTP/1.1\r\n\
                     X-Custom: 1\r\n\
                     no colon here\r\n\
                     Content-Location: /bad path\r\n\
                     HOST:  \"example.com\" \r\n\r\n";
        let (header, _) = parse(BlockKind::Request, &[data]).unwrap();

        assert!(header.complete);
        assert_eq!(header.host, "example.com");
        assert!(header.content.location.is_empty());
    }
}
