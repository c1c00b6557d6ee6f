//! Character classes of the URI grammar
//! ([RFC 3986, Appendix A](https://datatracker.ietf.org/doc/html/rfc3986#appendix-A)).
//!
//! Every class is a 256-entry lookup table built at compile time, so a check
//! is a single index per byte.

macro_rules! char_class {
    ($(
        $(#[$docs:meta])*
        $name:ident = ($pat:pat);
    )+) => { $(
        $(#[$docs])*
        pub const $name: CharClass = CharClass({
            let mut table = [false; 256];
            let mut byte: u8 = 0;
            loop {
                if matches!(byte, $pat) {
                    table[byte as usize] = true;
                }
                if byte == 255 {
                    break;
                }
                byte += 1;
            }
            table
        });
    )+ };
}

/// A set of bytes allowed at some position of a URI.
#[derive(Clone, Copy)]
pub struct CharClass([bool; 256]);

impl CharClass {
    #[inline(always)]
    pub const fn contains(&self, byte: u8) -> bool {
        self.0[byte as usize]
    }

    /// Bytes of either class.
    pub const fn union(self, other: CharClass) -> CharClass {
        let mut table = self.0;
        let mut index = 0;
        while index < 256 {
            table[index] = table[index] || other.0[index];
            index += 1;
        }
        CharClass(table)
    }

    /// Returns `true` when every byte of `value` belongs to the class.
    ///
    /// An empty value is valid.
    #[inline]
    pub fn validate(&self, value: &[u8]) -> bool {
        value.iter().all(|&byte| self.contains(byte))
    }
}

impl std::fmt::Debug for CharClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set()
            .entries((0..=255u8).filter(|&b| self.contains(b)).map(char::from))
            .finish()
    }
}

char_class! {
    LOW_ALPHA = (b'a'..=b'z');
    UP_ALPHA = (b'A'..=b'Z');
    DIGIT = (b'0'..=b'9');
    HEX_LETTER = (b'a'..=b'f' | b'A'..=b'F');

    MARK = (b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')');
    RESERVED = (b';' | b'/' | b'?' | b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b',');
    PERCENT = (b'%');

    /// Extra bytes of `pchar`.
    PCHAR_EXTRA = (b':' | b'@' | b'&' | b'=' | b'+' | b'$' | b',');
    /// Extra bytes of `userinfo`.
    USERINFO_EXTRA = (b';' | b':' | b'&' | b'=' | b'+' | b'$' | b',');
    /// Bytes after the first letter of a scheme besides alphanumerics.
    SCHEME_EXTRA = (b'+' | b'-' | b'.');
    HOST_EXTRA = (b'.' | b'-');
    PATH_EXTRA = (b';' | b'/');
    QUERY_EXTRA = (b'/' | b'?');
}

pub const ALPHA: CharClass = LOW_ALPHA.union(UP_ALPHA);
pub const ALPHA_NUM: CharClass = ALPHA.union(DIGIT);
pub const HEX_DIGIT: CharClass = DIGIT.union(HEX_LETTER);

pub const UNRESERVED: CharClass = ALPHA_NUM.union(MARK);
/// Bytes that may appear inside an escape: the `%` itself and hex digits.
pub const ESCAPED: CharClass = PERCENT.union(HEX_DIGIT);

/// `unreserved | escaped | ":" | "@" | "&" | "=" | "+" | "$" | ","`
pub const PCHAR: CharClass = UNRESERVED.union(ESCAPED).union(PCHAR_EXTRA);
/// `pchar | ";" | "/"`
pub const PATH_SEGMENTS: CharClass = PCHAR.union(PATH_EXTRA);

/// Bytes after the first one of a scheme.
pub const SCHEME: CharClass = ALPHA_NUM.union(SCHEME_EXTRA);
/// `unreserved | escaped | ";" | ":" | "&" | "=" | "+" | "$" | ","`
pub const USERINFO: CharClass = UNRESERVED.union(ESCAPED).union(USERINFO_EXTRA);
pub const HOST: CharClass = ALPHA_NUM.union(HOST_EXTRA);
pub const PORT: CharClass = DIGIT;

/// `pchar | "/" | "?"`, used for each `key=value` pair of a query.
pub const QUERY: CharClass = PCHAR.union(QUERY_EXTRA);
/// `reserved | unreserved | escaped`
pub const FRAGMENT: CharClass = RESERVED.union(UNRESERVED).union(ESCAPED);

/// A scheme is `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )`.
#[inline]
pub fn is_scheme(value: &[u8]) -> bool {
    match value.split_first() {
        Some((&first, rest)) => ALPHA.contains(first) && SCHEME.validate(rest),
        None => false,
    }
}
