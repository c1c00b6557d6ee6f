//! Incremental HTTP request state.

use crate::{
    errors::ErrorKind,
    http::{
        field::{Field, InMemoryStorage, Storage, StorageGenerator},
        header::{parse_header_block, BlockKind, Header, HeaderCursor},
        multipart::MultipartCursor,
        types::{Method, MimeType},
        uri::Uri,
    },
    limits::ReqLimits,
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
};

/// An HTTP request assembled from socket chunks.
///
/// The request is filled in two stages: the header block first, then
/// `Content-Length` bytes of body. A `multipart/*` body is split into named
/// [`Field`]s available through [`post`](Request::post); any other body is
/// kept whole in [`body`](Request::body). Bytes past `Content-Length` are
/// ignored.
///
/// Instances are created by the protocol and passed to the route handlers
/// once [`completed`](Request::completed).
///
/// # Examples
/// ```
/// use webapp_http::Request;
///
/// let mut req = Request::default();
/// req.parse(b"GET /search?q=rust&page=2 HTTP/1.1\r\n").unwrap();
/// assert!(!req.completed());
///
/// req.parse(b"Host: example.com\r\n\r\n").unwrap();
/// assert!(req.completed());
///
/// assert_eq!(req.get("q"), "rust");
/// assert_eq!(req.get_or("page", 1), 2);
/// assert_eq!(req.header().host, "example.com");
/// ```
pub struct Request {
    header: Header,
    header_cursor: HeaderCursor,

    body_consumed: usize,
    complete_body: bool,
    multipart: Option<MultipartCursor>,
    fields: HashMap<String, Field>,
    body: Option<Field>,

    storage_generator: Option<StorageGenerator>,
    limits: ReqLimits,

    pub(crate) client_addr: SocketAddr,
}

impl Default for Request {
    #[inline]
    fn default() -> Self {
        Self::new(&ReqLimits::default())
    }
}

impl Request {
    const UNKNOWN_CLIENT: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0);

    #[inline]
    pub fn new(limits: &ReqLimits) -> Self {
        Self {
            header: Header::default(),
            header_cursor: HeaderCursor::default(),

            body_consumed: 0,
            complete_body: false,
            multipart: None,
            fields: HashMap::new(),
            body: None,

            storage_generator: None,
            limits: limits.clone(),

            client_addr: Self::UNKNOWN_CLIENT,
        }
    }

    /// Forgets everything parsed so far; the storage generator is kept.
    pub fn reset_state(&mut self) {
        self.header.clear();
        self.header_cursor.reset();

        self.body_consumed = 0;
        self.complete_body = false;
        self.multipart = None;
        self.fields.clear();
        self.body = None;
    }

    /// Installs the generator asked for the storage of every new field.
    #[inline]
    pub fn use_storage_generator(&mut self, generator: StorageGenerator) {
        self.storage_generator = Some(generator);
    }

    /// Feeds the next chunk read from the socket.
    ///
    /// The chunk may end anywhere: in the middle of a header line, a
    /// multipart delimiter or the body. A chunk arriving after the request
    /// is [`completed`](Request::completed) is ignored.
    pub fn parse(&mut self, data: &[u8]) -> Result<(), ErrorKind> {
        let mut data = data;

        if !self.header.complete {
            let used = parse_header_block(
                data,
                &mut self.header_cursor,
                &mut self.header,
                BlockKind::Request,
                &self.limits,
            )?;

            if !self.header.complete {
                return Ok(());
            }

            self.start_body()?;
            data = &data[used..];
        }

        if !self.complete_body {
            self.parse_body(data)?;
        }

        Ok(())
    }

    fn start_body(&mut self) -> Result<(), ErrorKind> {
        let content = &self.header.content;

        if content.length > self.limits.body_size {
            return Err(ErrorKind::BodyTooLarge);
        }

        if content.length == 0 {
            self.complete_body = true;
            return Ok(());
        }

        let content_type = &content.content_type;
        if content_type.name == MimeType::Multipart && !content_type.boundary.is_empty() {
            self.multipart = Some(MultipartCursor::new(&content_type.boundary));
            return Ok(());
        }

        let storage = self
            .storage_generator
            .as_ref()
            .and_then(|generator| generator(content_type))
            .unwrap_or_else(|| Box::new(InMemoryStorage::default()) as Box<dyn Storage>);

        let mut body = Field::new(content_type.clone());
        body.use_storage(storage);
        self.body = Some(body);
        Ok(())
    }

    fn parse_body(&mut self, data: &[u8]) -> Result<(), ErrorKind> {
        let length = self.header.content.length;
        let data = &data[..data.len().min(length - self.body_consumed)];
        self.body_consumed += data.len();

        match (self.multipart.as_mut(), self.body.as_mut()) {
            // Epilogue, nothing left to store.
            (Some(cursor), _) if cursor.finished() => {}
            (Some(cursor), _) => cursor.parse(
                data,
                &mut self.fields,
                self.storage_generator.as_ref(),
                &self.limits,
            )?,
            (None, Some(body)) => body.append(data)?,
            (None, None) => {}
        }

        self.complete_body = self.body_consumed >= length;
        Ok(())
    }
}

// Public API
impl Request {
    /// `true` once the header block and the whole body were parsed.
    #[inline(always)]
    pub fn completed(&self) -> bool {
        self.header.complete && self.complete_body
    }

    #[inline(always)]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[inline(always)]
    pub fn method(&self) -> Option<Method> {
        self.header.start_line.method
    }

    /// The request target.
    #[inline(always)]
    pub fn uri(&self) -> &Uri {
        &self.header.start_line.target
    }

    #[inline(always)]
    pub const fn client_addr(&self) -> &SocketAddr {
        &self.client_addr
    }

    /// The query parameter `name`, empty when missing.
    #[inline]
    pub fn get(&self, name: &str) -> &str {
        self.uri().query(name).unwrap_or_default()
    }

    /// The query parameter `name` parsed as `T`, `default` when missing or
    /// unparsable.
    ///
    /// # Examples
    /// ```
    /// use webapp_http::Request;
    ///
    /// let mut req = Request::default();
    /// req.parse(b"GET /?limit=50&ratio=x HTTP/1.1\r\n\r\n").unwrap();
    ///
    /// assert_eq!(req.get_or("limit", 10u32), 50);
    /// assert_eq!(req.get_or("ratio", 0.5), 0.5);
    /// assert_eq!(req.get_or("offset", 0i64), 0);
    /// ```
    #[inline]
    pub fn get_or<T: FromStr>(&self, name: &str, default: T) -> T {
        self.uri()
            .query(name)
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    /// `true` only when the query parameter `name` is exactly `true`.
    #[inline]
    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name) == "true"
    }

    /// The multipart field `name`.
    #[inline]
    pub fn post(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    #[inline(always)]
    pub fn post_fields(&self) -> &HashMap<String, Field> {
        &self.fields
    }

    /// The raw body of a request that is not `multipart/*`.
    #[inline(always)]
    pub fn body(&self) -> Option<&Field> {
        self.body.as_ref()
    }
}

#[cfg(test)]
mod request_tests {
    use super::*;
    use crate::{http::types::ContentType, tools::*};
    use std::sync::Arc;

    fn parse_in_chunks(req: &mut Request, packet: &[u8], step: usize) {
        for chunk in packet.chunks(step) {
            req.parse(chunk).unwrap();
        }
    }

    #[test]
    fn test_packet() {
        let packet = request_packet();

        for step in [1, 10, packet.len()] {
            let mut req = Request::default();
            parse_in_chunks(&mut req, packet.as_bytes(), step);

            assert!(req.completed(), "step {step}");
            assert_eq!(req.method(), Some(Method::Get));
            assert_eq!(req.uri().path(), ["hello.txt"]);
            assert_eq!(req.header().content.length, 556);
            assert_eq!(req.header().content.content_type.boundary, BOUNDARY);

            let title = req.post("MessageTitle").unwrap();
            assert_eq!(title.value_string().unwrap(), "Привет мир!\nHello world!");
            assert_eq!(
                req.post("DestAddress").unwrap().value_string().unwrap(),
                "brutal-vasya@example.com"
            );
            assert_eq!(
                req.post("AttachedFile1").unwrap().value_string().unwrap(),
                "the image must be here"
            );
            assert_eq!(req.post_fields().len(), 4);
            assert!(req.body().is_none());
        }
    }

    #[test]
    fn storage_generator() {
        let generator: StorageGenerator = Arc::new(|content_type: &ContentType| {
            (content_type.name == MimeType::Application)
                .then(|| Box::new(TestStorage::default()) as Box<dyn Storage>)
        });

        let mut req = Request::default();
        req.use_storage_generator(generator);
        parse_in_chunks(&mut req, request_packet().as_bytes(), 10);

        // Parts without a Content-Type default to `application`.
        let title = req.post("MessageTitle").unwrap();
        assert_eq!(title.storage_name(), Some("TestStorage"));
        assert_eq!(title.value_string().unwrap(), "Привет мир!\nHello world!");
        assert_eq!(
            req.post("AttachedFile2").unwrap().storage_name(),
            Some("InMemoryStorage")
        );
    }

    #[test]
    fn query_params() {
        let mut req = Request::default();
        req.parse(b"GET /find?name=john&age=25&flag=true&no=TRUE HTTP/1.1\r\n\r\n")
            .unwrap();

        assert!(req.completed());
        assert_eq!(req.get("name"), "john");
        assert_eq!(req.get("missing"), "");
        assert_eq!(req.get_or("age", 0), 25);
        assert_eq!(req.get_or("name", 7), 7);
        assert_eq!(req.get_or("missing", 7), 7);
        assert!(req.get_bool("flag"));
        assert!(!req.get_bool("no"));
        assert!(!req.get_bool("missing"));

        let mut req = Request::default();
        req.parse(b"GET /node0?var_0=val_0&var_1=val_1 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.uri().path(), ["node0"]);
        assert_eq!((req.get("var_0"), req.get("var_1")), ("val_0", "val_1"));
    }

    #[test]
    fn raw_body() {
        let packet = b"POST /echo HTTP/1.1\r\n\
                       Content-Type: text/plain\r\n\
                       Content-Length: 5\r\n\
                       \r\n\
                       helloIGNORED";

        for step in [1, 3, packet.len()] {
            let mut req = Request::default();
            parse_in_chunks(&mut req, packet, step);

            assert!(req.completed());
            let body = req.body().unwrap();
            assert_eq!(body.value_string().unwrap(), "hello");
            assert_eq!(body.content_type().name, MimeType::Text);
            assert!(req.post_fields().is_empty());
        }
    }

    #[test]
    fn awaiting_body() {
        let mut req = Request::default();
        req.parse(b"POST / HTTP/1.1\r\nContent-Length: 4\r\n\r\nab").unwrap();
        assert!(req.header().complete);
        assert!(!req.completed());

        req.parse(b"cd").unwrap();
        assert!(req.completed());
        assert_eq!(req.body().unwrap().value_string().unwrap(), "abcd");
    }

    #[test]
    fn reset_state() {
        let mut req = Request::default();
        parse_in_chunks(&mut req, request_packet().as_bytes(), 64);
        assert!(req.completed());

        req.reset_state();
        assert!(!req.completed());
        assert!(req.post("MessageTitle").is_none());
        assert_eq!(req.method(), None);

        req.parse(b"HEAD /again HTTP/1.0\r\n\r\n").unwrap();
        assert!(req.completed());
        assert_eq!(req.method(), Some(Method::Head));
        assert_eq!(req.uri().path(), ["again"]);
    }

    #[test]
    fn parse_errors() {
        #[rustfmt::skip]
        let cases: [(&[u8], ErrorKind); 4] = [
            (b"FETCH / HTTP/1.1\r\n\r\n",                     ErrorKind::InvalidMethod),
            (b"GET /a b HTTP/1.1\r\n\r\n",                    ErrorKind::UnsupportedVersion),
            (b"GET / HTTP/2.0\r\n\r\n",                       ErrorKind::UnsupportedVersion),
            (b"GET / HTTP/1.1\r\nContent-Length: 1x\r\n\r\n", ErrorKind::InvalidContentLength),
        ];

        for (packet, error) in cases {
            let mut req = Request::default();
            assert_eq!(req.parse(packet), Err(error), "{}", str_lossy(packet));
        }
    }

    #[test]
    fn body_size_limit() {
        let limits = ReqLimits {
            body_size: 8,
            ..ReqLimits::default()
        };

        #[rustfmt::skip]
        let cases = [
            ("0",             Ok(true)),
            ("8",             Ok(true)),
            ("9",             Err(ErrorKind::BodyTooLarge)),
            ("1000000000000", Err(ErrorKind::BodyTooLarge)),
        ];

        for (length, expected) in cases {
            let mut req = Request::new(&limits);
            let packet = format!("POST / HTTP/1.1\r\nContent-Length: {length}\r\n\r\n12345678");

            let result = req.parse(packet.as_bytes()).map(|()| req.completed());
            assert_eq!(result, expected, "{length}");
            if expected.is_err() {
                assert!(req.body().is_none(), "{length}");
            }
        }
    }
}
