//! URL query string parser with flexible collection support.

use crate::{
    errors::ErrorKind,
    http::{grammar, percent},
};
use memchr::memchr;
use std::collections::HashMap;

/// URL query string parser.
///
/// Splits the query on `&`, each pair on its first `=`, checks the raw pair
/// against the query grammar and percent-decodes key and value separately.
///
/// # Examples
/// ```rust
/// use webapp_http::query::Query;
/// use std::collections::HashMap;
///
/// // Parse into Vec (preserves order)
/// let vec_params: Vec<(String, String)> = Query::parse(b"name=john&age=25&city").unwrap();
/// assert_eq!(vec_params.len(), 3);
///
/// // Parse into HashMap (last write wins)
/// let hash_params: HashMap<String, String> = Query::parse(b"key=1&key=2").unwrap();
/// assert_eq!(hash_params["key"], "2");
/// ```
/// All possible formats:
/// ```rust
/// use webapp_http::query::Query;
///
/// let params: Vec<(String, String)> = Query::parse(b"debug&name=&=Qwe&key=%41").unwrap();
///
/// assert_eq!(params[0], ("debug".into(), "".into()));
/// assert_eq!(params[1], ("name".into(), "".into()));
/// assert_eq!(params[2], ("".into(), "Qwe".into()));
/// assert_eq!(params[3], ("key".into(), "A".into()));
/// ```
pub struct Query;

impl Query {
    /// Parses a URL query string into a new collection.
    ///
    /// A leading `?` is skipped, so `?a=1` and `a=1` are equivalent.
    #[inline(always)]
    pub fn parse<C: QueryCollector + Default>(query: &[u8]) -> Result<C, ErrorKind> {
        let mut result = C::default();
        Self::parse_into(&mut result, query)?;
        Ok(result)
    }

    /// Parses a URL query string into an existing collection.
    ///
    /// Fails with [`ErrorKind::InvalidUri`] on the first pair containing a byte
    /// outside the query grammar; pairs before it stay in `result`.
    ///
    /// # Examples
    /// ```
    /// use webapp_http::query::Query;
    ///
    /// let mut collector = Vec::new();
    ///
    /// Query::parse_into(&mut collector, b"a=1&b=2").unwrap();
    /// Query::parse_into(&mut collector, b"c=3").unwrap();
    /// assert_eq!(collector.len(), 3); // parameters are appended
    ///
    /// assert!(Query::parse_into(&mut collector, b"d= 4").is_err());
    /// ```
    pub fn parse_into<C: QueryCollector>(result: &mut C, query: &[u8]) -> Result<(), ErrorKind> {
        let data = match query.first() {
            Some(b'?') => &query[1..],
            _ => query,
        };

        let mut start = 0;
        while start < data.len() {
            let end = memchr(b'&', &data[start..])
                .map(|pos| start + pos)
                .unwrap_or(data.len());

            let pair = &data[start..end];
            if !grammar::QUERY.validate(pair) {
                return Err(ErrorKind::InvalidUri);
            }

            let (key, value) = match memchr(b'=', pair) {
                Some(index) => (&pair[..index], &pair[index + 1..]),
                None => (pair, &b""[..]),
            };

            result.add_param(percent::decode_str(key), percent::decode_str(value));
            start = end + 1;
        }

        Ok(())
    }
}

/// A trait for types that can collect parsed query parameters.
///
/// # Examples
/// ```rust
/// use webapp_http::query::QueryCollector;
///
/// #[derive(Default)]
/// struct Keys(Vec<String>);
///
/// impl QueryCollector for Keys {
///     fn add_param(&mut self, key: String, _: String) {
///         self.0.push(key);
///     }
/// }
/// ```
pub trait QueryCollector {
    /// Adds a decoded parameter to the collection.
    fn add_param(&mut self, key: String, value: String);
}

// Preserves parameter order
impl QueryCollector for Vec<(String, String)> {
    #[inline(always)]
    fn add_param(&mut self, key: String, value: String) {
        self.push((key, value));
    }
}

// Deduplicates parameters (last wins)
impl QueryCollector for HashMap<String, String> {
    #[inline(always)]
    fn add_param(&mut self, key: String, value: String) {
        self.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::*;

    #[test]
    fn basic() {
        let cases = ["var_0=val_0&var_1=val_1", "?var_0=val_0&var_1=val_1"];

        for line in cases {
            let params: Vec<(String, String)> = Query::parse(line.as_bytes()).unwrap();

            assert_eq!(params.len(), 2);
            assert_eq!(pair(&params[0]), ("var_0", "val_0"));
            assert_eq!(pair(&params[1]), ("var_1", "val_1"));
        }
    }

    #[test]
    fn full() {
        let params: Vec<(String, String)> = Query::parse(b"flag&empty=&=val&&key=value").unwrap();

        assert_eq!(params.len(), 5);
        assert_eq!(pair(&params[0]), ("flag", ""));
        assert_eq!(pair(&params[1]), ("empty", ""));
        assert_eq!(pair(&params[2]), ("", "val"));
        assert_eq!(pair(&params[3]), ("", ""));
        assert_eq!(pair(&params[4]), ("key", "value"));
    }

    #[test]
    fn decoded() {
        let line = "%D1%82%D0%B5%D1%81%D1%82%3D%D1%80%D0%B0%D0%B1%D0%BE%D1%82%D1%8B=\
                    %D0%BF%D1%80%D0%BE%D0%B9%D0%B4%D0%B5%D0%BD";
        let params: HashMap<String, String> = Query::parse(line.as_bytes()).unwrap();

        assert_eq!(params["тест=работы"], "пройден");
    }

    #[test]
    fn value_with_slashes() {
        let line = b"from=ftp://jenny/firmwares/F1772/cortex_a8.regigraf.1772.53.UNIVERSAL-last.rbf";
        let params: HashMap<String, String> = Query::parse(line).unwrap();

        assert_eq!(
            params["from"],
            "ftp://jenny/firmwares/F1772/cortex_a8.regigraf.1772.53.UNIVERSAL-last.rbf"
        );
    }

    #[test]
    fn invalid() {
        #[rustfmt::skip]
        let cases: [&[u8]; 3] = [
            b"var_0=val_0&var_1= val_1",
            b"a=b#c",
            b"a=\"b\"",
        ];

        for line in cases {
            assert_eq!(
                Query::parse::<Vec<(String, String)>>(line),
                Err(ErrorKind::InvalidUri)
            );
        }
    }

    #[test]
    fn empty() {
        let params: Vec<(String, String)> = Query::parse(b"").unwrap();
        assert!(params.is_empty());

        let params: Vec<(String, String)> = Query::parse(b"?").unwrap();
        assert!(params.is_empty());
    }
}
