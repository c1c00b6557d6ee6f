//! URI reference parser ([RFC 3986](https://datatracker.ietf.org/doc/html/rfc3986)).

use crate::{
    errors::ErrorKind,
    http::{grammar, percent, query::Query, types::to_lower_case},
};
use memchr::{memchr, memchr2, memchr3};
use std::{collections::HashMap, fmt};

/// `userinfo@host:port` part of a URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authority {
    pub userinfo: String,
    pub host: String,
    pub port: Option<u16>,
}

impl Authority {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.userinfo.is_empty() && self.host.is_empty() && self.port.is_none()
    }
}

/// A parsed URI reference.
///
/// Absolute (`http://host/path?query#fragment`) and relative (`/path?query`)
/// references are accepted. Path segments, query pairs and the fragment are
/// stored percent-decoded; empty path segments are dropped.
///
/// # Examples
/// ```
/// use webapp_http::Uri;
///
/// let uri = Uri::parse("HTTP://user@example.com:8080/a/%7Eb/?q=1#top").unwrap();
///
/// assert_eq!(uri.scheme(), "http");
/// assert_eq!(uri.authority().userinfo, "user");
/// assert_eq!(uri.authority().host, "example.com");
/// assert_eq!(uri.authority().port, Some(8080));
/// assert_eq!(uri.path(), ["a", "~b"]);
/// assert_eq!(uri.query("q"), Some("1"));
/// assert_eq!(uri.fragment(), "top");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Uri {
    scheme: String,
    authority: Authority,
    path: Vec<String>,
    query: HashMap<String, String>,
    fragment: String,
}

impl Uri {
    /// Parses `raw` into a new [`Uri`].
    #[inline]
    pub fn parse(raw: &str) -> Result<Self, ErrorKind> {
        let mut uri = Uri::default();
        uri.parse_into(raw.as_bytes())?;
        Ok(uri)
    }

    /// Replaces the content of `self` with `raw`.
    ///
    /// Returns `false` when `raw` is not a valid URI reference, `self` is
    /// left cleared in that case.
    pub fn parse_val(&mut self, raw: &str) -> bool {
        match self.parse_into(raw.as_bytes()) {
            Ok(()) => true,
            Err(_) => {
                self.clear();
                false
            }
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.scheme.clear();
        self.authority = Authority::default();
        self.path.clear();
        self.query.clear();
        self.fragment.clear();
    }

    pub(crate) fn parse_into(&mut self, raw: &[u8]) -> Result<(), ErrorKind> {
        self.clear();

        let rest = self.parse_scheme(raw)?;
        let rest = self.parse_authority(rest)?;
        let rest = self.parse_path(rest)?;
        let rest = self.parse_query(rest)?;
        self.parse_fragment(rest)
    }

    // scheme ":" ...
    fn parse_scheme<'a>(&mut self, raw: &'a [u8]) -> Result<&'a [u8], ErrorKind> {
        let colon = match memchr(b':', raw) {
            Some(colon) if memchr3(b'/', b'?', b'#', &raw[..colon]).is_none() => colon,
            _ => return Ok(raw),
        };

        let scheme = &raw[..colon];
        if !grammar::is_scheme(scheme) {
            return Err(ErrorKind::InvalidUri);
        }

        let mut scheme = scheme.to_vec();
        to_lower_case(&mut scheme);
        self.scheme = String::from_utf8(scheme).map_err(|_| ErrorKind::InvalidUri)?;

        Ok(&raw[colon + 1..])
    }

    // "//" [ userinfo "@" ] host [ ":" port ]
    fn parse_authority<'a>(&mut self, rest: &'a [u8]) -> Result<&'a [u8], ErrorKind> {
        let rest = match rest {
            [b'/', b'/', rest @ ..] => rest,
            [b'/', ..] => return Ok(rest),
            [b'?' | b'#', ..] if self.scheme.is_empty() => return Ok(rest),
            _ => return Err(ErrorKind::InvalidUri),
        };

        let end = memchr3(b'/', b'?', b'#', rest).unwrap_or(rest.len());
        let (authority, rest) = rest.split_at(end);

        let host_port = match memchr(b'@', authority) {
            Some(at) => {
                let userinfo = &authority[..at];
                if !grammar::USERINFO.validate(userinfo) {
                    return Err(ErrorKind::InvalidUri);
                }
                self.authority.userinfo = percent::decode_str(userinfo);
                &authority[at + 1..]
            }
            None => authority,
        };

        let (host, port) = match memchr(b':', host_port) {
            Some(colon) => (&host_port[..colon], Some(&host_port[colon + 1..])),
            None => (host_port, None),
        };

        if !grammar::HOST.validate(host) {
            return Err(ErrorKind::InvalidUri);
        }
        self.authority.host = String::from_utf8_lossy(host).into_owned();

        if let Some(port) = port.filter(|port| !port.is_empty()) {
            if !grammar::PORT.validate(port) {
                return Err(ErrorKind::InvalidUri);
            }
            let port = simdutf8::basic::from_utf8(port).map_err(|_| ErrorKind::InvalidUri)?;
            self.authority.port = Some(port.parse().map_err(|_| ErrorKind::InvalidUri)?);
        }

        Ok(rest)
    }

    // *( "/" segment )
    fn parse_path<'a>(&mut self, rest: &'a [u8]) -> Result<&'a [u8], ErrorKind> {
        if rest.first() != Some(&b'/') {
            return Ok(rest);
        }

        let end = memchr2(b'?', b'#', rest).unwrap_or(rest.len());
        let (path, rest) = rest.split_at(end);

        for segment in path.split(|&byte| byte == b'/') {
            if segment.is_empty() {
                continue;
            }
            if !grammar::PATH_SEGMENTS.validate(segment) {
                return Err(ErrorKind::InvalidUri);
            }
            self.path.push(percent::decode_str(segment));
        }

        Ok(rest)
    }

    // "?" query
    fn parse_query<'a>(&mut self, rest: &'a [u8]) -> Result<&'a [u8], ErrorKind> {
        if rest.first() != Some(&b'?') {
            return Ok(rest);
        }

        let end = memchr(b'#', rest).unwrap_or(rest.len());
        let (query, rest) = rest.split_at(end);

        Query::parse_into(&mut self.query, query)?;
        Ok(rest)
    }

    // "#" fragment
    fn parse_fragment(&mut self, rest: &[u8]) -> Result<(), ErrorKind> {
        match rest {
            [] => Ok(()),
            [b'#', fragment @ ..] if grammar::FRAGMENT.validate(fragment) => {
                self.fragment = percent::decode_str(fragment);
                Ok(())
            }
            _ => Err(ErrorKind::InvalidUri),
        }
    }
}

// Public API
impl Uri {
    /// Lowercased scheme, empty for a relative reference.
    #[inline(always)]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[inline(always)]
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Decoded path segments.
    ///
    /// # Examples
    ///
    /// For `/api//users/123/`:
    /// ```text
    /// ["api", "users", "123"]
    /// ```
    #[inline(always)]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Returns the decoded value of query parameter `key`.
    ///
    /// A parameter without `=` has an empty value.
    #[inline]
    pub fn query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    #[inline(always)]
    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query
    }

    #[inline(always)]
    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    /// Returns `true` if nothing was parsed into `self`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scheme.is_empty()
            && self.authority.is_empty()
            && self.path.is_empty()
            && self.query.is_empty()
            && self.fragment.is_empty()
    }
}

/// Serializes the URI with every decoded component percent-encoded again,
/// so that parsing the output yields an equal [`Uri`].
impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scheme.is_empty() {
            write!(f, "{}:", self.scheme)?;
        }

        if !self.authority.is_empty() {
            f.write_str("//")?;
            if !self.authority.userinfo.is_empty() {
                write!(f, "{}@", percent::encode(self.authority.userinfo.as_bytes()))?;
            }
            f.write_str(&self.authority.host)?;
            if let Some(port) = self.authority.port {
                write!(f, ":{}", port)?;
            }
        }

        if self.path.is_empty() && self.authority.is_empty() {
            f.write_str("/")?;
        }
        for segment in &self.path {
            write!(f, "/{}", percent::encode(segment.as_bytes()))?;
        }

        let mut separator = '?';
        for (key, value) in &self.query {
            write!(
                f,
                "{}{}={}",
                separator,
                percent::encode(key.as_bytes()),
                percent::encode(value.as_bytes())
            )?;
            separator = '&';
        }

        if !self.fragment.is_empty() {
            write!(f, "#{}", percent::encode(self.fragment.as_bytes()))?;
        }

        Ok(())
    }
}
