//! Incremental `multipart/*` body parser.
//!
//! The body is fed in arbitrary chunks. Delimiter matching state survives
//! between calls, so the fields come out the same however the body is split:
//!
//! ```text
//! --B\r\n  part header  \r\n\r\n  content  \r\n--B\r\n  part header ...  \r\n--B--
//! ^^^                                       ^^^^^^^                       ^^^^^^^^^
//! first delimiter, CRLF implied             delimiter                     close delimiter
//! ```

use crate::{
    errors::ErrorKind,
    http::{
        field::{Field, InMemoryStorage, Storage, StorageGenerator},
        header::{parse_header_block, BlockKind, Header, HeaderCursor},
    },
    limits::ReqLimits,
};
use memchr::memchr;
use std::{collections::HashMap, mem};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Part content, scanned for the delimiter.
    Content,
    /// Rest of the delimiter line: transport padding or `--`.
    DelimiterTail { dashes: u8 },
    PartHeader,
    /// After the close delimiter, everything is discarded.
    Epilogue,
}

/// Multipart state kept between body chunks.
#[derive(Debug)]
pub(crate) struct MultipartCursor {
    /// `\r\n--` followed by the boundary.
    delimiter: Vec<u8>,
    /// How many delimiter bytes the end of the previous chunk matched.
    matched: usize,
    phase: Phase,
    part_header: Header,
    part_cursor: HeaderCursor,
    /// Field receiving the content, `None` discards it.
    active: Option<String>,
}

impl MultipartCursor {
    pub(crate) fn new(boundary: &str) -> Self {
        let mut delimiter = Vec::with_capacity(boundary.len() + 4);
        delimiter.extend_from_slice(b"\r\n--");
        delimiter.extend_from_slice(boundary.as_bytes());

        Self {
            delimiter,
            // The body may start with the first delimiter right away.
            matched: 2,
            phase: Phase::Content,
            part_header: Header::default(),
            part_cursor: HeaderCursor::default(),
            active: None,
        }
    }

    /// `true` once the close delimiter was seen.
    #[inline]
    pub(crate) fn finished(&self) -> bool {
        self.phase == Phase::Epilogue
    }

    /// Feeds the next body chunk; every byte of `data` is used.
    pub(crate) fn parse(
        &mut self,
        data: &[u8],
        fields: &mut HashMap<String, Field>,
        generator: Option<&StorageGenerator>,
        limits: &ReqLimits,
    ) -> Result<(), ErrorKind> {
        let mut pos = 0;

        while pos < data.len() {
            let rest = &data[pos..];
            pos += match self.phase {
                Phase::Content => self.scan_content(rest, fields)?,
                Phase::DelimiterTail { dashes } => self.delimiter_tail(rest, dashes),
                Phase::PartHeader => self.part_header(rest, fields, generator, limits)?,
                Phase::Epilogue => rest.len(),
            };
        }

        Ok(())
    }

    fn scan_content(
        &mut self,
        data: &[u8],
        fields: &mut HashMap<String, Field>,
    ) -> Result<usize, ErrorKind> {
        let active = self.active.as_deref();
        let delimiter = &self.delimiter[..];
        let mut run_start = 0;
        let mut i = 0;

        while i < data.len() {
            if self.matched == 0 {
                match memchr(delimiter[0], &data[i..]) {
                    Some(offset) => i += offset,
                    None => break,
                }
            }

            if data[i] == delimiter[self.matched] {
                if self.matched == 0 {
                    append(fields, active, &data[run_start..i])?;
                }

                self.matched += 1;
                i += 1;
                run_start = i;

                if self.matched == delimiter.len() {
                    self.matched = 0;
                    self.phase = Phase::DelimiterTail { dashes: 0 };
                    return Ok(i);
                }
            } else {
                // The held prefix was content after all, the current byte
                // is checked again as a possible delimiter start.
                let held = mem::take(&mut self.matched);
                append(fields, active, &delimiter[..held])?;
                run_start = i;
            }
        }

        append(fields, active, &data[run_start..])?;
        Ok(data.len())
    }

    fn delimiter_tail(&mut self, data: &[u8], mut dashes: u8) -> usize {
        for (i, &byte) in data.iter().enumerate() {
            match byte {
                b'-' => {
                    dashes += 1;
                    if dashes == 2 {
                        self.phase = Phase::Epilogue;
                        self.active = None;
                        return i + 1;
                    }
                }
                b'\n' => {
                    self.phase = Phase::PartHeader;
                    self.part_header.clear();
                    self.part_cursor.reset();
                    self.active = None;
                    return i + 1;
                }
                _ => {}
            }
        }

        self.phase = Phase::DelimiterTail { dashes };
        data.len()
    }

    fn part_header(
        &mut self,
        data: &[u8],
        fields: &mut HashMap<String, Field>,
        generator: Option<&StorageGenerator>,
        limits: &ReqLimits,
    ) -> Result<usize, ErrorKind> {
        let used = parse_header_block(
            data,
            &mut self.part_cursor,
            &mut self.part_header,
            BlockKind::Part,
            limits,
        )?;

        if self.part_header.complete {
            self.open_field(fields, generator);
            self.phase = Phase::Content;
        }

        Ok(used)
    }

    fn open_field(&mut self, fields: &mut HashMap<String, Field>, generator: Option<&StorageGenerator>) {
        let content = &self.part_header.content;
        let name = &content.disposition.name;

        if name.is_empty() {
            debug!("multipart part without a name discarded");
            self.active = None;
            return;
        }

        let field = fields.entry(name.clone()).or_default();
        if field.is_null() {
            let storage = generator
                .and_then(|generator| generator(&content.content_type))
                .unwrap_or_else(|| Box::new(InMemoryStorage::default()) as Box<dyn Storage>);
            field.use_storage(storage);
        }
        field.set_content_type(content.content_type.clone());
        field.set_filename(content.disposition.filename.as_str());

        self.active = Some(name.clone());
    }
}

#[inline]
fn append(fields: &mut HashMap<String, Field>, active: Option<&str>, data: &[u8]) -> Result<(), ErrorKind> {
    if data.is_empty() {
        return Ok(());
    }

    match active.and_then(|name| fields.get_mut(name)) {
        Some(field) => Ok(field.append(data)?),
        None => Ok(()),
    }
}

#[cfg(test)]
mod multipart_tests {
    use super::*;
    use crate::{
        http::types::{ContentType, MimeType},
        tools::*,
    };
    use std::sync::Arc;

    fn parse_in_chunks(body: &[u8], boundary: &str, step: usize) -> (HashMap<String, Field>, bool) {
        let mut cursor = MultipartCursor::new(boundary);
        let mut fields = HashMap::new();

        for chunk in body.chunks(step) {
            cursor.parse(chunk, &mut fields, None, &ReqLimits::default()).unwrap();
        }

        (fields, cursor.finished())
    }

    fn value(fields: &HashMap<String, Field>, name: &str) -> String {
        fields[name].value_string().unwrap()
    }

    #[test]
    fn test_packet() {
        let body = multipart_body();

        for step in [1, 2, 3, 7, 10, 64, body.len()] {
            let (fields, _) = parse_in_chunks(body.as_bytes(), BOUNDARY, step);

            assert_eq!(fields.len(), 4, "step {step}");
            assert_eq!(value(&fields, "MessageTitle"), "Привет мир!\nHello world!");
            assert_eq!(value(&fields, "DestAddress"), "brutal-vasya@example.com");
            assert_eq!(value(&fields, "AttachedFile1"), "the image must be here");
            assert_eq!(value(&fields, "AttachedFile2"), "Hello from \"test.txt\" file!");

            let image = &fields["AttachedFile1"];
            assert_eq!(image.content_type().name, MimeType::Image);
            assert_eq!(image.content_type().sub_type, "jpeg");
            assert_eq!(image.filename(), "horror-photo-1.jpg");
            assert_eq!(fields["MessageTitle"].filename(), "");
        }
    }

    #[test]
    fn preamble_and_epilogue() {
        let body = "This is the preamble.\r\n\
                    --xyz\r\n\
                    Content-Disposition: form-data; name=\"a\"\r\n\
                    \r\n\
                    first\r\n\
                    --xyz  \r\n\
                    Content-Disposition: form-data; name=\"b\"\r\n\
                    \r\n\
                    second\r\n\
                    --xyz--\r\n\
                    This is the epilogue.\r\n--xyz\r\n";

        for step in [1, 5, body.len()] {
            let (fields, finished) = parse_in_chunks(body.as_bytes(), "xyz", step);

            assert!(finished);
            assert_eq!(fields.len(), 2);
            assert_eq!(value(&fields, "a"), "first");
            assert_eq!(value(&fields, "b"), "second");
        }
    }

    #[test]
    fn delimiter_lookalikes() {
        #[rustfmt::skip]
        let cases = [
            "\r\n",
            "\r\n-",
            "\r\n--xy",
            "\r\r\n--xy\r\n--x",
            "--xyz",
            "a\r\n--xyZ",
        ];

        for content in cases {
            let body = format!(
                "--xyz\r\nContent-Disposition: form-data; name=\"v\"\r\n\r\n{content}\r\n--xyz--"
            );

            for step in 1..=body.len() {
                let (fields, finished) = parse_in_chunks(body.as_bytes(), "xyz", step);
                assert!(finished, "{content:?} / {step}");
                assert_eq!(value(&fields, "v"), content, "{content:?} / {step}");
            }
        }
    }

    #[test]
    fn unnamed_parts_discarded() {
        let body = "--b\r\nContent-Type: text/plain\r\n\r\nlost\r\n\
                    --b\r\nContent-Disposition: form-data; name=\"kept\"\r\n\r\nvalue\r\n--b--";
        let (fields, _) = parse_in_chunks(body.as_bytes(), "b", 4);

        assert_eq!(fields.len(), 1);
        assert_eq!(value(&fields, "kept"), "value");
    }

    #[test]
    fn repeated_name_appends() {
        let body = "--b\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\n12\r\n\
                    --b\r\nContent-Disposition: form-data; name=\"x\"\r\n\r\n34\r\n--b--";
        let (fields, _) = parse_in_chunks(body.as_bytes(), "b", 3);

        assert_eq!(value(&fields, "x"), "1234");
        assert_eq!(fields["x"].value_i64(), Some(1234));
    }

    #[test]
    fn storage_generator() {
        let generator: StorageGenerator = Arc::new(|content_type: &ContentType| {
            (content_type.name == MimeType::Image).then(|| Box::new(TestStorage::default()) as Box<dyn Storage>)
        });

        let body = multipart_body();
        let mut cursor = MultipartCursor::new(BOUNDARY);
        let mut fields = HashMap::new();
        for chunk in body.as_bytes().chunks(10) {
            cursor
                .parse(chunk, &mut fields, Some(&generator), &ReqLimits::default())
                .unwrap();
        }

        assert_eq!(fields["AttachedFile1"].storage_name(), Some("TestStorage"));
        assert_eq!(value(&fields, "AttachedFile1"), "the image must be here");
        assert_eq!(fields["AttachedFile2"].storage_name(), Some("InMemoryStorage"));
    }
}
