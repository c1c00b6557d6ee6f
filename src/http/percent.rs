//! Percent-encoding ([RFC 3986, Section 2.1](https://datatracker.ietf.org/doc/html/rfc3986#section-2.1)).

use memchr::memchr;

const HEX: &[u8; 16] = b"0123456789ABCDEF";

#[inline(always)]
const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Replaces every `%XX` escape with the byte it encodes.
///
/// A `%` that is not followed by two hex digits is kept as is.
/// Input without `%` is returned unchanged.
///
/// # Examples
/// ```
/// use webapp_http::percent;
///
/// assert_eq!(percent::decode(b"%7Esmith"), b"~smith");
/// assert_eq!(percent::decode(b"100%"), b"100%");
/// ```
pub fn decode(src: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(src.len());
    let mut rest = src;

    while let Some(pos) = memchr(b'%', rest) {
        result.extend_from_slice(&rest[..pos]);

        match (rest.get(pos + 1), rest.get(pos + 2)) {
            (Some(&high), Some(&low)) => match (hex_value(high), hex_value(low)) {
                (Some(high), Some(low)) => {
                    result.push(high << 4 | low);
                    rest = &rest[pos + 3..];
                }
                _ => {
                    result.push(b'%');
                    rest = &rest[pos + 1..];
                }
            },
            _ => {
                result.push(b'%');
                rest = &rest[pos + 1..];
            }
        }
    }

    result.extend_from_slice(rest);
    result
}

/// [`decode`] into a `String`, invalid UTF-8 is replaced with `U+FFFD`.
pub fn decode_str(src: &[u8]) -> String {
    String::from_utf8(decode(src))
        .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}

/// Escapes every byte outside RFC 3986 `unreserved` (`ALPHA DIGIT - . _ ~`).
pub fn encode(src: &[u8]) -> String {
    let mut result = String::with_capacity(src.len());

    for &byte in src {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                result.push(byte as char)
            }
            _ => {
                result.push('%');
                result.push(HEX[(byte >> 4) as usize] as char);
                result.push(HEX[(byte & 0x0F) as usize] as char);
            }
        }
    }

    result
}

#[cfg(test)]
mod percent_tests {
    use super::*;

    #[test]
    fn decoding() {
        #[rustfmt::skip]
        let cases = [
            ("%7Esmith",                   "~smith"),
            ("%D0%BF%D1%80%D0%BE%D0%B2",   "пров"),
            ("a%2Fb",                      "a/b"),
            ("a%2fb",                      "a/b"),
            ("100%",                       "100%"),
            ("%4",                         "%4"),
            ("%zz%41",                     "%zzA"),
            ("",                           ""),
        ];

        for (src, expected) in cases {
            assert_eq!(decode_str(src.as_bytes()), expected, "{src}");
        }
    }

    #[test]
    fn idempotent_without_escapes() {
        for src in ["plain", "with space", "тест", "a+b=c"] {
            assert_eq!(decode(src.as_bytes()), src.as_bytes());
        }
    }

    #[test]
    fn encoding() {
        assert_eq!(encode(b"~smith"), "~smith");
        assert_eq!(encode(b"a b/c"), "a%20b%2Fc");
        assert_eq!(encode("ф".as_bytes()), "%D1%84");
        assert_eq!(decode_str(encode("фраг#мент".as_bytes()).as_bytes()), "фраг#мент");
    }

    #[test]
    fn invalid_utf8() {
        assert_eq!(decode_str(b"%FF"), "\u{FFFD}");
    }
}
