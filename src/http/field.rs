//! Request fields and the storages holding their values.

use crate::http::types::ContentType;
use std::{fmt, io, str::FromStr, sync::Arc};

/// Append-only byte sink a [`Field`] keeps its value in.
///
/// The engine only appends; handlers read the value back through
/// [`write_to`](Storage::write_to). Implement it to stream uploads to disk
/// or anywhere else, and install it with
/// [`Request::use_storage_generator`](crate::Request::use_storage_generator).
///
/// # Examples
/// ```
/// use std::io;
/// use webapp_http::Storage;
///
/// #[derive(Default, Clone)]
/// struct Counter(usize);
///
/// impl Storage for Counter {
///     fn name(&self) -> &str {
///         "Counter"
///     }
///     fn append(&mut self, data: &[u8]) -> io::Result<()> {
///         self.0 += data.len();
///         Ok(())
///     }
///     fn size(&self) -> usize {
///         self.0
///     }
///     fn clear(&mut self) {
///         self.0 = 0;
///     }
///     fn write_to(&self, _: &mut dyn io::Write) -> io::Result<()> {
///         Ok(())
///     }
///     fn clone_box(&self) -> Box<dyn Storage> {
///         Box::new(self.clone())
///     }
/// }
/// ```
pub trait Storage: Send + Sync {
    /// Name of the implementation, used for diagnostics.
    fn name(&self) -> &str;

    /// Appends `data` to the end of the value.
    fn append(&mut self, data: &[u8]) -> io::Result<()>;

    /// Total number of bytes appended since the last [`clear`](Storage::clear).
    fn size(&self) -> usize;

    fn clear(&mut self);

    /// Writes the whole value to `out`.
    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()>;

    /// Deep copy of the storage and its content.
    fn clone_box(&self) -> Box<dyn Storage>;
}

/// Picks the storage for a new field by its content type.
///
/// Returning `None` falls back to [`InMemoryStorage`].
pub type StorageGenerator = Arc<dyn Fn(&ContentType) -> Option<Box<dyn Storage>> + Send + Sync>;

/// Keeps the value in memory as a list of appended segments.
///
/// Appending never copies what was stored before.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    segments: Vec<Box<[u8]>>,
    size: usize,
}

impl InMemoryStorage {
    #[inline]
    pub fn segments(&self) -> impl Iterator<Item = &[u8]> {
        self.segments.iter().map(|segment| &segment[..])
    }
}

impl Storage for InMemoryStorage {
    #[inline]
    fn name(&self) -> &str {
        "InMemoryStorage"
    }

    #[inline]
    fn append(&mut self, data: &[u8]) -> io::Result<()> {
        if !data.is_empty() {
            self.segments.push(data.into());
            self.size += data.len();
        }
        Ok(())
    }

    #[inline]
    fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn clear(&mut self) {
        self.segments.clear();
        self.size = 0;
    }

    fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
        self.segments().try_for_each(|segment| out.write_all(segment))
    }

    fn clone_box(&self) -> Box<dyn Storage> {
        Box::new(self.clone())
    }
}

/// A named request value: a multipart part or the raw request body.
///
/// A field is null until a storage is attached; cloning a field copies
/// the stored value.
///
/// # Examples
/// ```
/// use webapp_http::{Field, InMemoryStorage};
///
/// let mut field = Field::default();
/// assert!(field.is_null());
///
/// field.use_storage(Box::new(InMemoryStorage::default()));
/// field.append(b"4").unwrap();
/// field.append(b"2").unwrap();
///
/// assert_eq!(field.value_i64(), Some(42));
/// assert_eq!(field.storage_name(), Some("InMemoryStorage"));
/// ```
#[derive(Default)]
pub struct Field {
    content_type: ContentType,
    filename: String,
    storage: Option<Box<dyn Storage>>,
}

impl Field {
    #[inline]
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            filename: String::new(),
            storage: None,
        }
    }

    #[inline(always)]
    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    #[inline]
    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = content_type;
    }

    /// The `filename` of the part's `Content-Disposition`, empty if absent.
    #[inline(always)]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    #[inline]
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    #[inline(always)]
    pub fn is_null(&self) -> bool {
        self.storage.is_none()
    }

    /// Replaces the storage, the previous value is dropped.
    #[inline]
    pub fn use_storage(&mut self, storage: Box<dyn Storage>) {
        self.storage = Some(storage);
    }

    #[inline]
    pub fn storage_name(&self) -> Option<&str> {
        self.storage.as_deref().map(Storage::name)
    }

    /// Number of stored bytes, `0` for a null field.
    #[inline]
    pub fn size(&self) -> usize {
        self.storage.as_deref().map_or(0, Storage::size)
    }

    /// Empties the value, the storage stays attached.
    #[inline]
    pub fn clear(&mut self) {
        if let Some(storage) = self.storage.as_deref_mut() {
            storage.clear();
        }
    }

    /// Appends to the value; a null field ignores the data.
    #[inline]
    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        match self.storage.as_deref_mut() {
            Some(storage) => storage.append(data),
            None => Ok(()),
        }
    }

    /// Writes the value to `out`, nothing for a null field.
    #[inline]
    pub fn write_to(&self, out: &mut dyn io::Write) -> io::Result<()> {
        match self.storage.as_deref() {
            Some(storage) => storage.write_to(out),
            None => Ok(()),
        }
    }

    /// The whole value; a failing storage yields what it wrote before the error.
    pub fn value_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.size());
        let _ = self.write_to(&mut result);
        result
    }

    /// The value as text, `None` for a null field or invalid UTF-8.
    pub fn value_string(&self) -> Option<String> {
        if self.is_null() {
            return None;
        }

        String::from_utf8(self.value_bytes()).ok()
    }

    #[inline]
    pub fn value_i64(&self) -> Option<i64> {
        self.value_parsed()
    }

    #[inline]
    pub fn value_f64(&self) -> Option<f64> {
        self.value_parsed()
    }

    /// `true` only for the exact value `true`.
    #[inline]
    pub fn value_bool(&self) -> bool {
        self.value_string().as_deref() == Some("true")
    }

    #[inline]
    fn value_parsed<T: FromStr>(&self) -> Option<T> {
        self.value_string()?.trim().parse().ok()
    }
}

impl Clone for Field {
    fn clone(&self) -> Self {
        Self {
            content_type: self.content_type.clone(),
            filename: self.filename.clone(),
            storage: self.storage.as_deref().map(Storage::clone_box),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("content_type", &self.content_type)
            .field("filename", &self.filename)
            .field("storage", &self.storage_name())
            .field("size", &self.size())
            .finish()
    }
}
