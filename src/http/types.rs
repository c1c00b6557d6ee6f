#![allow(rustdoc::bare_urls)]

//! Core HTTP protocol types and utilities

use crate::errors::ErrorKind;
use std::{
    fmt,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

// TO LOWER CASE

#[rustfmt::skip]
const ASCII_TABLE: [u8; 256] = [
    //   x0    x1    x2    x3    x4    x5    x6    x7    x8    x9    xA    xB    xC    xD    xE    xF
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, // 0x
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, // 1x
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x2B, 0x2C, 0x2D, 0x2E, 0x2F, // 2x
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F, // 3x
    0x40, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 4x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x5B, 0x5C, 0x5D, 0x5E, 0x5F, // 5x
    0x60, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o', // 6x
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x7B, 0x7C, 0x7D, 0x7E, 0x7F, // 7x
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E, 0x8F, // 8x
    0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0x9B, 0x9C, 0x9D, 0x9E, 0x9F, // 9x
    0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xAB, 0xAC, 0xAD, 0xAE, 0xAF, // Ax
    0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xBB, 0xBC, 0xBD, 0xBE, 0xBF, // Bx
    0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB, 0xCC, 0xCD, 0xCE, 0xCF, // Cx
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE, 0xDF, // Dx
    0xE0, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xEB, 0xEC, 0xED, 0xEE, 0xEF, // Ex
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF, // Fx
];

#[inline(always)]
pub(crate) fn to_lower_case(src: &mut [u8]) {
    for byte in src.iter_mut() {
        *byte = ASCII_TABLE[*byte as usize];
    }
}

#[inline(always)]
pub(crate) fn slice_to_usize(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() {
        return None;
    }

    let mut result: usize = 0;

    for &byte in bytes {
        if !byte.is_ascii_digit() {
            return None;
        }

        result = result
            .checked_mul(10)?
            .checked_add((byte - b'0') as usize)?;
    }

    Some(result)
}

/// Strips spaces, tabs and double quotes from both ends of `value`.
#[inline]
pub(crate) fn trim_value(value: &str) -> &str {
    value.trim_matches(|c| matches!(c, ' ' | '\t' | '"'))
}

// METHOD

/// HTTP request methods
///
/// Matched case-sensitively: `get` is not a method.
///
/// # References
///
/// - [RFC 7231, Section 4](https://datatracker.ietf.org/doc/html/rfc7231#section-4)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    /// OPTIONS method - describe the communication options for the target resource
    /// [[RFC7231, Section 4.3.7](https://tools.ietf.org/html/rfc7231#section-4.3.7)]
    Options,
    /// GET method - transfer a current representation of the target resource
    /// [[RFC7231, Section 4.3.1](https://tools.ietf.org/html/rfc7231#section-4.3.1)]
    Get,
    /// HEAD method - same as GET but without response body
    /// [[RFC7231, Section 4.3.2](https://tools.ietf.org/html/rfc7231#section-4.3.2)]
    Head,
    /// POST method - perform resource-specific processing on the request payload
    /// [[RFC7231, Section 4.3.3](https://tools.ietf.org/html/rfc7231#section-4.3.3)]
    Post,
    /// PUT method - replace all current representations of the target resource with the request payload
    /// [[RFC7231, Section 4.3.4](https://tools.ietf.org/html/rfc7231#section-4.3.4)]
    Put,
    /// DELETE method - remove all current representations of the target resource
    /// [[RFC7231, Section 4.3.5](https://tools.ietf.org/html/rfc7231#section-4.3.5)]
    Delete,
    /// TRACE method - perform a message loop-back test along the path to the target resource
    /// [[RFC7231, Section 4.3.8](https://tools.ietf.org/html/rfc7231#section-4.3.8)]
    Trace,
    /// CONNECT method - establish a tunnel to the server identified by the target resource
    /// [[RFC7231, Section 4.3.6](https://tools.ietf.org/html/rfc7231#section-4.3.6)]
    Connect,
}

impl Method {
    #[inline(always)]
    pub(crate) fn from_bytes(src: &[u8]) -> Result<Self, ErrorKind> {
        match src {
            b"OPTIONS" => Ok(Method::Options),
            b"GET" => Ok(Method::Get),
            b"HEAD" => Ok(Method::Head),
            b"POST" => Ok(Method::Post),
            b"PUT" => Ok(Method::Put),
            b"DELETE" => Ok(Method::Delete),
            b"TRACE" => Ok(Method::Trace),
            b"CONNECT" => Ok(Method::Connect),
            _ => Err(ErrorKind::InvalidMethod),
        }
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Options => "OPTIONS",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Trace => "TRACE",
            Method::Connect => "CONNECT",
        }
    }
}

// VERSION

/// HTTP protocol version
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Version {
    /// HTTP/1.0 - [RFC 1945](https://tools.ietf.org/html/rfc1945)
    Http10,

    /// HTTP/1.1 - [RFC 7230](https://tools.ietf.org/html/rfc7230) and related
    #[default]
    Http11,
}

impl Version {
    #[inline(always)]
    pub(crate) const fn from_bytes(src: &[u8]) -> Result<Self, ErrorKind> {
        match src {
            b"HTTP/1.1" => Ok(Self::Http11),
            b"HTTP/1.0" => Ok(Self::Http10),
            _ => Err(ErrorKind::UnsupportedVersion),
        }
    }
}

// STATUS_CODE

macro_rules! set_status_codes {
    ($(
        $(#[$docs:meta])+
        $name:ident = ($num:literal, $str:literal);
    )+) => {
        /// HTTP status codes the server emits
        ///
        /// Any other code is answered as
        /// [`NotImplemented`](StatusCode::NotImplemented).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $(
            #[doc = concat!(stringify!($num), " ", $str)]
            $(#[$docs])+
            $name = $num,
        )+ }

        impl StatusCode {
            /// Maps a numeric code onto a known status, unknown codes become `501`.
            #[inline]
            pub const fn from_u16(code: u16) -> Self {
                match code {
                    $( $num => StatusCode::$name, )+
                    _ => StatusCode::NotImplemented,
                }
            }

            #[inline]
            pub const fn reason(&self) -> &'static str {
                match self { $(
                    StatusCode::$name => $str,
                )+ }
            }

            // Returns the HTTP first line as bytes (e.g., `b"HTTP/1.1 200 OK\r\n"`).
            #[inline]
            pub(crate) const fn into_first_line(&self) -> &'static [u8] {
                match self { $(
                    StatusCode::$name => concat!("HTTP/1.1 ", $num, " ", $str, "\r\n").as_bytes(),
                )+ }
            }
        }
    }
}

set_status_codes! {
    /// [[RFC9110, Section 15.3.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.1)]
    Ok = (200, "OK");
    /// [[RFC9110, Section 15.3.3](https://datatracker.ietf.org/doc/html/rfc9110#section-15.3.3)]
    Accepted = (202, "Accepted");
    /// [[RFC9110, Section 15.4.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.2)]
    MovedPermanently = (301, "Moved Permanently");
    /// [[RFC9110, Section 15.4.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.4.5)]
    NotModified = (304, "Not Modified");
    /// [[RFC9110, Section 15.5.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.1)]
    BadRequest = (400, "Bad Request");
    /// [[RFC9110, Section 15.5.4](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.4)]
    Forbidden = (403, "Forbidden");
    /// [[RFC9110, Section 15.5.5](https://datatracker.ietf.org/doc/html/rfc9110#section-15.5.5)]
    NotFound = (404, "Not Found");
    /// [[RFC9110, Section 15.6.1](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.1)]
    InternalServerError = (500, "Internal Server Error");
    /// [[RFC9110, Section 15.6.2](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.2)]
    NotImplemented = (501, "Not Implemented");
    /// [[RFC9110, Section 15.6.6](https://datatracker.ietf.org/doc/html/rfc9110#section-15.6.6)]
    HttpVersionNotSupported = (505, "HTTP Version Not Supported");
}

impl StatusCode {
    #[inline(always)]
    pub const fn as_u16(&self) -> u16 {
        *self as u16
    }
}

// MIME

/// Top-level media type
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum MimeType {
    Text,
    Image,
    Audio,
    Video,
    #[default]
    Application,
    Multipart,
    Message,
}

impl MimeType {
    /// Case-insensitive lookup, unknown names map to `application`.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        const NAMES: [(&str, MimeType); 7] = [
            ("text", MimeType::Text),
            ("image", MimeType::Image),
            ("audio", MimeType::Audio),
            ("video", MimeType::Video),
            ("application", MimeType::Application),
            ("multipart", MimeType::Multipart),
            ("message", MimeType::Message),
        ];

        NAMES
            .iter()
            .find(|(known, _)| known.eq_ignore_ascii_case(name))
            .map(|&(_, mime)| mime)
            .unwrap_or_default()
    }

    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MimeType::Text => "text",
            MimeType::Image => "image",
            MimeType::Audio => "audio",
            MimeType::Video => "video",
            MimeType::Application => "application",
            MimeType::Multipart => "multipart",
            MimeType::Message => "message",
        }
    }
}

/// `type/subtype` with the `boundary` and `charset` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContentType {
    pub name: MimeType,
    pub sub_type: String,
    pub boundary: String,
    pub charset: String,
}

impl ContentType {
    #[inline]
    pub fn new(name: MimeType, sub_type: &str) -> Self {
        Self {
            name,
            sub_type: sub_type.to_string(),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_charset(mut self, charset: &str) -> Self {
        self.charset = charset.to_string();
        self
    }

    /// Content type of a file by its extension (case-insensitive),
    /// `application/octet-stream` when the extension is unknown.
    ///
    /// # Examples
    /// ```
    /// use webapp_http::{ContentType, MimeType};
    ///
    /// assert_eq!(ContentType::for_extension("HTML"), ContentType::new(MimeType::Text, "html"));
    /// assert_eq!(ContentType::for_extension("svg").sub_type, "svg+xml");
    /// assert_eq!(ContentType::for_extension("exe").sub_type, "octet-stream");
    /// ```
    pub fn for_extension(extension: &str) -> Self {
        Self::known_extension(extension)
            .unwrap_or_else(|| ContentType::new(MimeType::Application, "octet-stream"))
    }

    pub(crate) fn known_extension(extension: &str) -> Option<Self> {
        #[rustfmt::skip]
        const FILE_TYPES: [(&str, MimeType, &str); 12] = [
            ("txt",  MimeType::Text,        "plain"),
            ("html", MimeType::Text,        "html"),
            ("htm",  MimeType::Text,        "html"),
            ("css",  MimeType::Text,        "css"),
            ("js",   MimeType::Text,        "javascript"),
            ("json", MimeType::Application, "json"),
            ("bmp",  MimeType::Image,       "bmp"),
            ("jpeg", MimeType::Image,       "jpeg"),
            ("jpg",  MimeType::Image,       "jpeg"),
            ("png",  MimeType::Image,       "png"),
            ("svg",  MimeType::Image,       "svg+xml"),
            ("ico",  MimeType::Image,       "x-icon"),
        ];

        FILE_TYPES
            .iter()
            .find(|(ext, _, _)| ext.eq_ignore_ascii_case(extension))
            .map(|&(_, name, sub_type)| ContentType::new(name, sub_type))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name.as_str(), self.sub_type)
    }
}

// EXPIRES

/// Point in time sent in the `Expires` header.
///
/// Rendered as `%a, %d %b %Y %H:%M:%S UTC` with whole seconds.
///
/// # Examples
/// ```
/// use webapp_http::Expires;
///
/// let expires = Expires::parse("Tue, 09 Aug 2016 18:00:00 UTC").unwrap();
/// assert_eq!(expires.hour(1).day(1).to_string(), "Wed, 10 Aug 2016 19:00:00 UTC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Expires(SystemTime);

impl Expires {
    const HOUR: u64 = 60 * 60;
    const DAY: u64 = 24 * Self::HOUR;
    const WEEK: u64 = 7 * Self::DAY;
    /// `Fri, 31 Dec 9999 23:59:59`, the last second an HTTP date can hold.
    const MAX_SECS: u64 = 253_402_300_799;

    /// Current time truncated to whole seconds.
    #[inline]
    pub fn now() -> Self {
        Self::at(SystemTime::now())
    }

    #[inline]
    pub fn at(time: SystemTime) -> Self {
        let secs = time
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_secs())
            .unwrap_or(0);
        Self::from_secs(secs)
    }

    /// Parses the rendered form; a trailing `GMT` is accepted as well.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        let gmt = match value.strip_suffix(" UTC") {
            Some(head) => format!("{head} GMT"),
            None => value.to_string(),
        };

        httpdate::parse_http_date(&gmt).ok().map(Self)
    }

    #[inline]
    pub fn hour(self, count: u64) -> Self {
        self.shift(count.saturating_mul(Self::HOUR))
    }

    #[inline]
    pub fn day(self, count: u64) -> Self {
        self.shift(count.saturating_mul(Self::DAY))
    }

    #[inline]
    pub fn week(self, count: u64) -> Self {
        self.shift(count.saturating_mul(Self::WEEK))
    }

    #[inline]
    pub const fn time(&self) -> SystemTime {
        self.0
    }

    // Saturates at `MAX_SECS`.
    #[inline(always)]
    fn shift(self, secs: u64) -> Self {
        let since = self
            .0
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_secs())
            .unwrap_or(0);
        Self::from_secs(since.saturating_add(secs))
    }

    #[inline(always)]
    fn from_secs(secs: u64) -> Self {
        Self(UNIX_EPOCH + Duration::from_secs(secs.min(Self::MAX_SECS)))
    }
}

impl Default for Expires {
    #[inline]
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Expires {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = httpdate::fmt_http_date(self.0);
        match date.strip_suffix("GMT") {
            Some(head) => write!(f, "{head}UTC"),
            None => f.write_str(&date),
        }
    }
}

// CACHE-CONTROL

/// `Cache-Control` response directive, empty by default.
///
/// # Examples
/// ```
/// use webapp_http::CacheControl;
///
/// let mut cache = CacheControl::default();
/// cache.max_age(3600).must_revalidate();
/// assert_eq!(cache.to_string(), "max-age=3600, must-revalidate");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheControl {
    directives: Vec<String>,
}

impl CacheControl {
    #[inline]
    pub fn max_age(&mut self, seconds: u64) -> &mut Self {
        self.push(format!("max-age={seconds}"))
    }

    #[inline]
    pub fn no_store(&mut self) -> &mut Self {
        self.push("no-store".to_string())
    }

    #[inline]
    pub fn no_cache(&mut self) -> &mut Self {
        self.push("no-cache".to_string())
    }

    #[inline]
    pub fn must_revalidate(&mut self) -> &mut Self {
        self.push("must-revalidate".to_string())
    }

    #[inline]
    pub fn reset(&mut self) {
        self.directives.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    #[inline(always)]
    fn push(&mut self, directive: String) -> &mut Self {
        self.directives.push(directive);
        self
    }
}

impl fmt::Display for CacheControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.directives.join(", "))
    }
}

// ETAG

/// Entity tag sent in the `ETag` header, empty by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ETag(String);

impl ETag {
    /// Uses `value` as the tag, an empty value clears it.
    ///
    /// # Examples
    /// ```
    /// use webapp_http::ETag;
    ///
    /// let mut etag = ETag::default();
    /// etag.predefined("v1.2");
    /// assert_eq!(etag.to_string(), "\"v1.2\"");
    /// ```
    pub fn predefined(&mut self, value: &str) -> &mut Self {
        self.0 = match value.is_empty() {
            true => String::new(),
            false => format!("\"{value}\""),
        };
        self
    }

    /// Generates a tag from the current time in seconds and microseconds.
    pub fn random(&mut self) -> &mut Self {
        let since = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        self.0 = format!("\"{}{}\"", since.as_secs(), since.subsec_micros());
        self
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn method() {
        #[rustfmt::skip]
        let cases = [
            ("OPTIONS", Ok(Method::Options)),
            ("GET",     Ok(Method::Get)),
            ("HEAD",    Ok(Method::Head)),
            ("POST",    Ok(Method::Post)),
            ("PUT",     Ok(Method::Put)),
            ("DELETE",  Ok(Method::Delete)),
            ("TRACE",   Ok(Method::Trace)),
            ("CONNECT", Ok(Method::Connect)),
            ("OPTION",  Err(ErrorKind::InvalidMethod)),
            ("get",     Err(ErrorKind::InvalidMethod)),
            ("PATCH",   Err(ErrorKind::InvalidMethod)),
            ("",        Err(ErrorKind::InvalidMethod)),
        ];

        for (src, expected) in cases {
            let result = Method::from_bytes(src.as_bytes());
            assert_eq!(result, expected, "{src}");
            if let Ok(method) = result {
                assert_eq!(method.as_str(), src);
            }
        }
    }

    #[test]
    fn status_code() {
        assert_eq!(StatusCode::from_u16(200), StatusCode::Ok);
        assert_eq!(StatusCode::from_u16(505), StatusCode::HttpVersionNotSupported);
        assert_eq!(StatusCode::from_u16(418), StatusCode::NotImplemented);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::Accepted.reason(), "Accepted");
        assert_eq!(
            StatusCode::MovedPermanently.into_first_line(),
            b"HTTP/1.1 301 Moved Permanently\r\n"
        );
    }

    #[test]
    fn mime_type() {
        assert_eq!(MimeType::from_name("TEXT"), MimeType::Text);
        assert_eq!(MimeType::from_name("multipart"), MimeType::Multipart);
        assert_eq!(MimeType::from_name("font"), MimeType::Application);
        assert_eq!(
            ContentType::new(MimeType::Image, "jpeg").to_string(),
            "image/jpeg"
        );
    }

    #[test]
    fn file_types() {
        #[rustfmt::skip]
        let cases = [
            ("txt",  "text/plain"),
            ("html", "text/html"),
            ("htm",  "text/html"),
            ("css",  "text/css"),
            ("js",   "text/javascript"),
            ("json", "application/json"),
            ("bmp",  "image/bmp"),
            ("jpeg", "image/jpeg"),
            ("JPG",  "image/jpeg"),
            ("png",  "image/png"),
            ("svg",  "image/svg+xml"),
            ("rbf",  "application/octet-stream"),
            ("",     "application/octet-stream"),
        ];

        for (ext, expected) in cases {
            assert_eq!(ContentType::for_extension(ext).to_string(), expected, "{ext}");
        }
    }

    #[test]
    fn expires() {
        let base = Expires::parse("Tue, 09 Aug 2016 18:00:00 UTC").unwrap();

        #[rustfmt::skip]
        let cases = [
            (base,                  "Tue, 09 Aug 2016 18:00:00 UTC"),
            (base.hour(1),          "Tue, 09 Aug 2016 19:00:00 UTC"),
            (base.hour(1).day(1),   "Wed, 10 Aug 2016 19:00:00 UTC"),
            (base.week(1),          "Tue, 16 Aug 2016 18:00:00 UTC"),
            (base.hour(2).day(1).week(1), "Wed, 17 Aug 2016 20:00:00 UTC"),
        ];

        for (expires, expected) in cases {
            assert_eq!(expires.to_string(), expected);
        }

        assert_eq!(base.hour(1).day(1), base.day(1).hour(1));
        assert_eq!(Expires::parse("Tue, 09 Aug 2016 18:00:00 GMT"), Some(base));
        assert_eq!(Expires::parse("2016-08-09 18:00:00"), None);
        assert!(Expires::now().to_string().ends_with(" UTC"));
    }

    #[test]
    fn expires_saturates() {
        let base = Expires::parse("Tue, 09 Aug 2016 18:00:00 UTC").unwrap();
        let last = "Fri, 31 Dec 9999 23:59:59 UTC";

        #[rustfmt::skip]
        let cases = [
            base.hour(u64::MAX),
            base.day(u64::MAX),
            base.week(u64::MAX),
            base.week(1_000_000).week(1_000_000),
            Expires::at(UNIX_EPOCH + Duration::from_secs(1_000_000_000_000_000)),
        ];

        for expires in cases {
            assert_eq!(expires.to_string(), last);
        }
        assert!(base.week(u64::MAX) > base);
    }

    #[test]
    fn cache_control() {
        let mut cache = CacheControl::default();
        assert!(cache.is_empty());

        cache.max_age(60);
        assert_eq!(cache.to_string(), "max-age=60");

        cache.no_store().no_cache();
        assert_eq!(cache.to_string(), "max-age=60, no-store, no-cache");

        cache.reset();
        assert_eq!(cache.to_string(), "");
    }

    #[test]
    fn etag() {
        let mut etag = ETag::default();
        assert!(etag.is_empty());

        etag.predefined("abc");
        assert_eq!(etag.to_string(), "\"abc\"");

        etag.predefined("");
        assert!(etag.is_empty());

        etag.random();
        let value = etag.to_string();
        assert!(value.len() > 2 && value.starts_with('"') && value.ends_with('"'));
    }

    #[test]
    fn helpers() {
        assert_eq!(slice_to_usize(b"556"), Some(556));
        assert_eq!(slice_to_usize(b""), None);
        assert_eq!(slice_to_usize(b"5 5"), None);
        assert_eq!(slice_to_usize(b"99999999999999999999999"), None);
        assert_eq!(trim_value(" \"gc0pJq0M:08jU534c0p\" "), "gc0pJq0M:08jU534c0p");

        let mut scheme = *b"HTTp";
        to_lower_case(&mut scheme);
        assert_eq!(&scheme, b"http");
    }
}
