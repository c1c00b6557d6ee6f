//! HTTP response assembled by the route handlers and drained by the session.

use crate::{
    errors::ErrorKind,
    http::{
        header::Header,
        source::{ArraySource, BufferSource, FileSource, ResponseSource},
        types::{CacheControl, ContentType, ETag, Expires, MimeType, StatusCode},
    },
    BodyWriter, WriteBuffer,
};
use std::{borrow::Cow, fmt, io, path::Path, rc::Rc, sync::Arc};

/// HTTP response filled by a route handler.
///
/// A fresh response is `404 Not Found` with an HTML header and no body.
/// Handlers pick a status and a header, then a body: bytes, a static array
/// or a file. The header block is written only when the response is sent;
/// `Content-Length` is taken from the body at that moment.
///
/// Wire format:
/// ```text
/// HTTP/1.1 <code> <reason>
/// Content-Type: <type>/<subtype>
/// Content-Length: <body size>
/// Expires: <date>
/// Cache-Control: <directives>     only when set
/// ETag: <tag>                     only when set
///
/// <body>
/// ```
///
/// # Examples
/// ```
/// use webapp_http::{Response, StatusCode};
///
/// let mut resp = Response::default();
/// assert_eq!(resp.status(), StatusCode::NotFound);
///
/// resp.set_body("<h1>Hello World</h1>");
/// assert_eq!(resp.status(), StatusCode::Ok);
///
/// resp.cache_control_mut().max_age(3600).must_revalidate();
/// resp.etag_mut().predefined("v1");
/// ```
pub struct Response {
    status: StatusCode,
    header: Header,
    header_source: Option<BufferSource>,
    body_source: Option<Box<dyn ResponseSource>>,
}

impl Default for Response {
    #[inline]
    fn default() -> Self {
        Self {
            status: StatusCode::NotFound,
            header: Self::header_for_text("", ""),
            header_source: None,
            body_source: None,
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("header", &self.header)
            .field("header_ready", &self.header_source.is_some())
            .field("body_size", &self.body_size())
            .finish()
    }
}

// Header presets
impl Response {
    /// `text/<format>` header with `charset`, valid for an hour.
    ///
    /// An empty `format` means `html`, an empty `charset` means `utf-8`.
    pub fn header_for_text(format: &str, charset: &str) -> Header {
        let format = if format.is_empty() { "html" } else { format };
        let charset = if charset.is_empty() { "utf-8" } else { charset };

        Header::with_content(
            ContentType::new(MimeType::Text, format).with_charset(charset),
            Expires::now().hour(1),
        )
    }

    /// `image/<format>` header valid for an hour; an empty `format` means
    /// `application/octet-stream`.
    pub fn header_for_image(format: &str) -> Header {
        let content_type = match format {
            "" => ContentType::new(MimeType::Application, "octet-stream"),
            format => ContentType::new(MimeType::Image, format),
        };

        Header::with_content(content_type, Expires::now().hour(1))
    }

    /// `application/json` header that is already expired.
    pub fn header_for_json() -> Header {
        Header::with_content(ContentType::new(MimeType::Application, "json"), Expires::now())
    }
}

// Public API
impl Response {
    #[inline(always)]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline(always)]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Sets the status with the default HTML header.
    #[inline]
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.set_header(status, Self::header_for_text("", ""))
    }

    #[inline]
    pub fn set_header(&mut self, status: StatusCode, header: Header) -> &mut Self {
        self.status = status;
        self.header = header;
        self
    }

    /// Switches to `200 OK` with the content type of a file extension.
    ///
    /// Returns `false` and changes nothing for an unknown extension.
    ///
    /// # Examples
    /// ```
    /// use webapp_http::{Response, StatusCode};
    ///
    /// let mut resp = Response::default();
    ///
    /// assert!(resp.set_header_for_extension("css"));
    /// assert_eq!(resp.status(), StatusCode::Ok);
    /// assert_eq!(resp.header().content.content_type.to_string(), "text/css");
    ///
    /// assert!(!resp.set_header_for_extension("exe"));
    /// ```
    pub fn set_header_for_extension(&mut self, extension: &str) -> bool {
        match ContentType::known_extension(extension) {
            Some(content_type) => {
                self.set_header(
                    StatusCode::Ok,
                    Header::with_content(content_type, Expires::now().hour(1)),
                );
                true
            }
            None => false,
        }
    }

    /// Replaces the body with `data`.
    ///
    /// A response still at `404 Not Found` becomes `200 OK` with the HTML
    /// header.
    ///
    /// # Examples
    /// ```
    /// use webapp_http::Response;
    ///
    /// let mut resp = Response::default();
    ///
    /// resp.set_body("text");
    /// resp.set_body(42);
    /// resp.set_body(vec![b'o', b'k']);
    /// ```
    pub fn set_body<T: WriteBuffer>(&mut self, data: T) -> &mut Self {
        let mut buffer = Vec::new();
        data.write_to(&mut buffer);
        self.use_source(BufferSource::new(buffer))
    }

    /// Builds the body piece by piece, see [`BodyWriter`].
    pub fn body_with<F: FnOnce(&mut BodyWriter)>(&mut self, f: F) -> &mut Self {
        let mut buffer = Vec::new();
        f(&mut BodyWriter(&mut buffer));
        self.use_source(BufferSource::new(buffer))
    }

    /// Sends static bytes without copying them.
    #[inline]
    pub fn set_body_static(&mut self, data: &'static [u8]) -> &mut Self {
        self.use_source(ArraySource::new(data))
    }

    /// Sends the file at `path` as `content_type`, valid for a week.
    ///
    /// Fails with [`ErrorKind::SourceUnavailable`] and leaves the response
    /// untouched when the file cannot be opened.
    pub fn use_file<P: AsRef<Path>>(&mut self, content_type: ContentType, path: P) -> Result<(), ErrorKind> {
        let source = FileSource::open(path)?;

        self.set_header(
            StatusCode::Ok,
            Header::with_content(content_type, Expires::now().week(1)),
        );
        self.body_source = Some(Box::new(source));
        Ok(())
    }

    /// Sends the bytes of any [`ResponseSource`].
    pub fn use_source<S: ResponseSource + 'static>(&mut self, source: S) -> &mut Self {
        if self.status == StatusCode::NotFound {
            self.set_status(StatusCode::Ok);
        }

        self.body_source = Some(Box::new(source));
        self
    }

    #[inline(always)]
    pub fn cache_control_mut(&mut self) -> &mut CacheControl {
        &mut self.header.cache_control
    }

    #[inline(always)]
    pub fn etag_mut(&mut self) -> &mut ETag {
        &mut self.header.etag
    }

    /// Size of the body, `0` without one.
    #[inline]
    pub fn body_size(&self) -> usize {
        self.body_source.as_deref().map_or(0, ResponseSource::size)
    }
}

// Sending
impl Response {
    /// Serializes the header block; once written it no longer changes.
    pub(crate) fn setup_header(&mut self) {
        if self.header_source.is_some() {
            return;
        }

        let header = &self.header;
        let mut buffer = Vec::with_capacity(256);

        buffer.extend_from_slice(self.status.into_first_line());
        write_field(&mut buffer, "Content-Type", header.content.content_type.to_string());
        write_field(&mut buffer, "Content-Length", self.body_size());
        write_field(&mut buffer, "Expires", header.expires.to_string());
        if !header.cache_control.is_empty() {
            write_field(&mut buffer, "Cache-Control", header.cache_control.to_string());
        }
        if !header.etag.is_empty() {
            write_field(&mut buffer, "ETag", header.etag.to_string());
        }
        buffer.extend_from_slice(b"\r\n");

        self.header_source = Some(BufferSource::new(buffer));
    }

    /// Copies the next bytes of the header block into `out`, `0` once it
    /// was handed out whole.
    pub(crate) fn read_header(&mut self, out: &mut [u8]) -> usize {
        self.setup_header();

        match self.header_source.as_mut() {
            Some(source) => source.read_some(out).unwrap_or_default(),
            None => 0,
        }
    }

    /// Copies the next body bytes into `out`, `Ok(0)` once drained.
    pub(crate) fn read_body(&mut self, out: &mut [u8]) -> io::Result<usize> {
        match self.body_source.as_deref_mut() {
            Some(source) if source.is_available() => source.read_some(out),
            _ => Ok(0),
        }
    }

    /// Back to a fresh `404 Not Found`.
    #[inline]
    pub(crate) fn reset_state(&mut self) {
        *self = Self::default();
    }
}

#[inline]
fn write_field<V: WriteBuffer>(buffer: &mut Vec<u8>, name: &str, value: V) {
    name.write_to(buffer);
    buffer.extend_from_slice(b": ");
    value.write_to(buffer);
    buffer.extend_from_slice(b"\r\n");
}

pub mod write {
    use super::*;

    /// Writer for constructing the response body.
    /// Used in [body_with](Response::body_with).
    ///
    /// # Examples
    ///
    /// With [WriteBuffer]:
    /// ```
    /// use webapp_http::Response;
    ///
    /// let mut resp = Response::default();
    /// resp.body_with(|w| {
    ///     w.write("<p>");
    ///     w.write(123);
    ///     w.write(true);
    ///     w.write("</p>");
    /// });
    /// assert_eq!(resp.body_size(), 14);
    /// ```
    /// With [std::io::Write]:
    /// ```
    /// use std::io::Write;
    /// use webapp_http::Response;
    ///
    /// let mut resp = Response::default();
    /// resp.body_with(|w| {
    ///     write!(w, "{} - {} = {}", 6, 2, 4).unwrap();
    /// });
    /// ```
    #[derive(Debug)]
    pub struct BodyWriter<'a>(pub(crate) &'a mut Vec<u8>);

    impl BodyWriter<'_> {
        /// Appends content to the response body.
        #[inline]
        pub fn write<T: WriteBuffer>(&mut self, value: T) {
            value.write_to(self.0);
        }
    }

    impl io::Write for BodyWriter<'_> {
        #[inline]
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.extend_from_slice(buf);
            Ok(buf.len())
        }

        #[inline]
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Trait for writing data into a response body or header value.
    ///
    /// Implemented for strings, bytes, booleans, chars and integer types.
    /// Floating-point numbers are left out on purpose: format them to a
    /// string with the precision you need.
    ///
    /// # Example
    /// ```
    /// use webapp_http::WriteBuffer;
    ///
    /// struct MyString(String);
    ///
    /// impl WriteBuffer for MyString {
    ///     fn write_to(&self, buffer: &mut Vec<u8>) {
    ///         buffer.extend_from_slice(self.0.as_bytes())
    ///     }
    /// }
    /// ```
    pub trait WriteBuffer {
        /// Appends the value's representation to the buffer.
        fn write_to(&self, buffer: &mut Vec<u8>);
    }

    macro_rules! impl_write_buffer {
        (bytes, $conn:expr => $($t:ty),*) => {
            $(impl WriteBuffer for $t {
                #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                    let closure = $conn;
                    closure(self, buffer);
                }
            })*
        };
        (number($type:ty), $conn:expr => $($t:ty),*) => {
            $(impl WriteBuffer for $t {
                #[inline] fn write_to(&self, buffer: &mut Vec<u8>) {
                    $conn(*self as $type, buffer);
                }
            })*
        };
    }

    impl<T: WriteBuffer + ?Sized> WriteBuffer for &T {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            T::write_to(*self, buffer);
        }
    }
    impl WriteBuffer for str {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self.as_bytes());
        }
    }
    impl WriteBuffer for [u8] {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self);
        }
    }
    impl_write_buffer! {
        bytes, |value: &str, buffer: &mut Vec<u8>| {
            buffer.extend_from_slice(value.as_bytes());
        } => String, Box<str>, Cow<'_, str>, Arc<str>, Rc<str>
    }
    impl_write_buffer! {
        bytes, |value: &[u8], buffer: &mut Vec<u8>| {
            buffer.extend_from_slice(value);
        } => Vec<u8>, Box<[u8]>, Cow<'_, [u8]>, Arc<[u8]>, Rc<[u8]>
    }
    impl<const N: usize> WriteBuffer for [u8; N] {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(self);
        }
    }
    impl_write_buffer! {
        number(u128), write_unsigned => u8, u16, u32, u64, u128, usize
    }
    impl_write_buffer! {
        number(i128), write_signed => i8, i16, i32, i64, i128, isize
    }
    impl WriteBuffer for bool {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            buffer.extend_from_slice(match self {
                true => b"true",
                false => b"false",
            });
        }
    }
    impl WriteBuffer for char {
        #[inline]
        fn write_to(&self, buffer: &mut Vec<u8>) {
            let mut buf = [0u8; 4];
            buffer.extend_from_slice(self.encode_utf8(&mut buf).as_bytes());
        }
    }

    #[inline(always)]
    fn write_unsigned(value: u128, buffer: &mut Vec<u8>) {
        let (arr, start) = number_to_bytes(value);
        buffer.extend_from_slice(&arr[start..]);
    }

    #[inline(always)]
    fn write_signed(value: i128, buffer: &mut Vec<u8>) {
        if value < 0 {
            buffer.push(b'-');
        }

        let (arr, start) = number_to_bytes(value.unsigned_abs());
        buffer.extend_from_slice(&arr[start..]);
    }

    #[inline]
    const fn number_to_bytes(mut n: u128) -> ([u8; 39], usize) {
        let mut buffer = [b'0'; 39];
        let mut i = 39;

        if n == 0 {
            return (buffer, 38);
        }

        while n > 0 {
            i -= 1;
            buffer[i] = b'0' + (n % 10) as u8;
            n /= 10;
        }

        (buffer, i)
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use crate::tools::*;
    use std::io::Write;

    fn expires(resp: &Response) -> String {
        resp.header().expires.to_string()
    }

    #[test]
    fn hello_body() {
        for step in [1, 7, 1514] {
            let mut resp = Response::default();
            resp.set_body("hello");

            assert_eq!(
                response_text(&mut resp, step),
                format!(
                    "HTTP/1.1 200 OK\r\n\
                     Content-Type: text/html\r\n\
                     Content-Length: 5\r\n\
                     Expires: {}\r\n\
                     \r\n\
                     hello",
                    expires(&resp)
                )
            );
        }
    }

    #[test]
    fn default_not_found() {
        let mut resp = Response::default();
        let text = response_text(&mut resp, 64);

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\nContent-Type: text/html\r\n"));
        assert!(text.contains("Content-Length: 0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn optional_fields() {
        let mut resp = Response::default();
        resp.set_header(StatusCode::Accepted, Response::header_for_json());
        resp.cache_control_mut().no_cache().max_age(60);
        resp.etag_mut().predefined("v1");
        resp.set_body(-42);

        assert_eq!(
            response_text(&mut resp, 1514),
            format!(
                "HTTP/1.1 202 Accepted\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: 3\r\n\
                 Expires: {}\r\n\
                 Cache-Control: no-cache, max-age=60\r\n\
                 ETag: \"v1\"\r\n\
                 \r\n\
                 -42",
                expires(&resp)
            )
        );
    }

    #[test]
    fn header_presets() {
        #[rustfmt::skip]
        let cases = [
            (Response::header_for_text("", ""),         "text/html",                "utf-8"),
            (Response::header_for_text("plain", "cp1251"), "text/plain",            "cp1251"),
            (Response::header_for_image("png"),         "image/png",                ""),
            (Response::header_for_image(""),            "application/octet-stream", ""),
            (Response::header_for_json(),               "application/json",         ""),
        ];

        for (header, content_type, charset) in cases {
            assert_eq!(header.content.content_type.to_string(), content_type);
            assert_eq!(header.content.content_type.charset, charset);
        }

        let now = Expires::now();
        assert!(Response::header_for_text("", "").expires >= now.hour(1));
        assert!(Response::header_for_json().expires < now.hour(1));
    }

    #[test]
    fn header_is_fixed_once_written() {
        let mut resp = Response::default();
        resp.set_body("first");
        resp.setup_header();

        resp.set_status(StatusCode::Forbidden);
        let text = response_text(&mut resp, 1514);

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.ends_with("first"));
    }

    #[test]
    fn status_keeps_body() {
        let mut resp = Response::default();
        resp.set_status(StatusCode::Forbidden).set_body("denied");

        assert_eq!(resp.status(), StatusCode::Forbidden);
        assert!(response_text(&mut resp, 1514).starts_with("HTTP/1.1 403 Forbidden\r\n"));
    }

    #[test]
    fn static_body() {
        let mut resp = Response::default();
        resp.set_body_static(b"<svg/>");
        resp.set_header_for_extension("svg");

        let text = response_text(&mut resp, 4);
        assert!(text.contains("Content-Type: image/svg+xml\r\n"));
        assert!(text.contains("Content-Length: 6\r\n"));
        assert!(text.ends_with("\r\n\r\n<svg/>"));
    }

    #[test]
    fn body_writer() {
        let mut resp = Response::default();
        resp.body_with(|w| {
            w.write("a=");
            w.write(1u8);
            w.write(',');
            write!(w, "b={}", 2.5).unwrap();
        });

        assert!(response_text(&mut resp, 1514).ends_with("\r\n\r\na=1,b=2.5"));
    }

    #[test]
    fn file_body() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"file content").unwrap();

        let mut resp = Response::default();
        resp.use_file(ContentType::for_extension("txt"), file.path()).unwrap();
        assert!(resp.header().expires >= Expires::now().day(6));

        let text = response_text(&mut resp, 5);
        assert!(text.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 12\r\n"));
        assert!(text.ends_with("\r\n\r\nfile content"));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut resp = Response::default();

        assert_eq!(
            resp.use_file(ContentType::for_extension("txt"), dir.path().join("none.txt")),
            Err(ErrorKind::SourceUnavailable)
        );
        assert_eq!(resp.status(), StatusCode::NotFound);
        assert_eq!(resp.body_size(), 0);
    }

    #[test]
    fn reset_state() {
        let mut resp = Response::default();
        resp.set_body("x");
        resp.etag_mut().random();
        response_text(&mut resp, 1514);

        resp.reset_state();
        assert_eq!(resp.status(), StatusCode::NotFound);
        assert!(resp.header().etag.is_empty());
        assert_eq!(resp.body_size(), 0);
    }
}
