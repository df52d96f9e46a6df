use std::io::BufRead;

use crate::error::{Error, Result};

pub const SEPARATOR: u8 = b';';
pub const COMMENT: u8 = b'#';

/// Streaming `key;value` reader over one byte range.
///
/// The row buffer is reused across records, so [`RecordParser::next_record`]
/// hands out a key borrowed from it. Offsets in errors are absolute file
/// offsets when the parser was built with [`RecordParser::starting_at`].
pub struct RecordParser<R> {
    reader: R,
    row: Vec<u8>,
    offset: u64,
    done: bool,
}

impl<R: BufRead> RecordParser<R> {
    pub fn new(reader: R) -> Self {
        Self::starting_at(reader, 0)
    }

    /// Parser whose first byte sits at `offset` in the source file.
    pub fn starting_at(reader: R, offset: u64) -> Self {
        RecordParser {
            reader,
            row: Vec::with_capacity(128),
            offset,
            done: false,
        }
    }

    /// Absolute offset of the next unread byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Advances to the next data row, skipping blank and comment lines.
    ///
    /// # Errors
    ///
    /// [`Error::Read`] if the underlying reader fails; [`Error::FieldCount`],
    /// [`Error::InvalidKey`] or [`Error::InvalidReading`] for a malformed row.
    pub fn next_record(&mut self) -> Result<Option<(&str, f64)>> {
        let line_offset = loop {
            if self.done {
                return Ok(None);
            }
            self.row.clear();
            let line_offset = self.offset;
            let read = match self.reader.read_until(b'\n', &mut self.row) {
                Ok(read) => read,
                Err(source) => {
                    self.done = true;
                    return Err(Error::Read {
                        offset: line_offset,
                        source,
                    });
                }
            };
            if read == 0 {
                self.done = true;
                return Ok(None);
            }
            self.offset += read as u64;

            let line = trim_line_ending(&self.row);
            if line.is_empty() || line[0] == COMMENT {
                continue;
            }
            break line_offset;
        };

        let parsed = parse_line(trim_line_ending(&self.row), line_offset);
        if parsed.is_err() {
            self.done = true;
        }
        parsed.map(Some)
    }
}

impl<R: BufRead> Iterator for RecordParser<R> {
    type Item = Result<(String, f64)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record()
            .map(|record| record.map(|(key, reading)| (key.to_owned(), reading)))
            .transpose()
    }
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Splits one non-comment line into its key and reading.
fn parse_line(line: &[u8], offset: u64) -> Result<(&str, f64)> {
    let Some(sep) = memchr::memchr(SEPARATOR, line) else {
        return Err(Error::FieldCount { offset, found: 1 });
    };
    let (key, value) = (&line[..sep], &line[sep + 1..]);

    let extra = memchr::memchr_iter(SEPARATOR, value).count();
    if extra > 0 {
        return Err(Error::FieldCount {
            offset,
            found: 2 + extra,
        });
    }

    let key = std::str::from_utf8(key).map_err(|_| Error::InvalidKey { offset })?;
    let reading = lexical_core::parse::<f64>(value)
        .ok()
        .filter(|r| r.is_finite())
        .ok_or_else(|| Error::InvalidReading {
            offset,
            value: String::from_utf8_lossy(value).into_owned(),
        })?;

    Ok((key, reading))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::compute_chunks;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn parse_all(data: &[u8]) -> Result<Vec<(String, f64)>> {
        RecordParser::new(data).collect()
    }

    #[test]
    fn test_basic() {
        let records = parse_all(b"A;1.0\nB;-2.5\n").unwrap();
        assert_eq!(records, vec![("A".into(), 1.0), ("B".into(), -2.5)]);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let records = parse_all(b"# header;with;separators\n\nA;1.0\n#B;2.0\n").unwrap();
        assert_eq!(records, vec![("A".into(), 1.0)]);
    }

    #[test]
    fn test_missing_trailing_newline() {
        let records = parse_all(b"A;1.0\nB;2").unwrap();
        assert_eq!(records, vec![("A".into(), 1.0), ("B".into(), 2.0)]);
    }

    #[test]
    fn test_crlf() {
        let records = parse_all(b"A;1.5\r\n").unwrap();
        assert_eq!(records, vec![("A".into(), 1.5)]);
    }

    #[test]
    fn test_utf8_key() {
        let records = parse_all("São Paulo;25.9\nİzmir;18.1\n".as_bytes()).unwrap();
        assert_eq!(records[0].0, "São Paulo");
        assert_eq!(records[1].0, "İzmir");
    }

    #[test]
    fn test_one_field() {
        let err = parse_all(b"A;1.0\nB 2.0\n").unwrap_err();
        assert!(matches!(err, Error::FieldCount { offset: 6, found: 1 }));
    }

    #[test]
    fn test_three_fields() {
        let err = parse_all(b"A;1.0;2.0\n").unwrap_err();
        assert!(matches!(err, Error::FieldCount { offset: 0, found: 3 }));
    }

    #[test]
    fn test_invalid_reading() {
        let err = parse_all(b"A;1.0\nA;warm\n").unwrap_err();
        match err {
            Error::InvalidReading { offset, value } => {
                assert_eq!(offset, 6);
                assert_eq!(value, "warm");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_empty_reading() {
        let err = parse_all(b"A;\n").unwrap_err();
        assert!(matches!(err, Error::InvalidReading { offset: 0, .. }));
    }

    #[test]
    fn test_invalid_key() {
        let err = parse_all(b"\xff\xfe;1.0\n").unwrap_err();
        assert!(matches!(err, Error::InvalidKey { offset: 0 }));
    }

    #[test]
    fn test_offsets_are_absolute() {
        let mut parser = RecordParser::starting_at(&b"A;1.0\nB;x\n"[..], 100);
        assert_eq!(parser.next_record().unwrap(), Some(("A", 1.0)));
        assert_eq!(parser.offset(), 106);
        assert!(matches!(
            parser.next_record(),
            Err(Error::InvalidReading { offset: 106, .. })
        ));
    }

    #[test]
    fn test_stops_after_error() {
        let mut parser = RecordParser::new(&b"A;x\nB;1.0\n"[..]);
        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
    }

    fn measurements() -> impl Strategy<Value = Vec<u8>> {
        let line = prop_oneof![
            4 => ("[a-zA-Z]{1,10}", -999i32..=999)
                .prop_map(|(key, tenths)| format!("{key};{:.1}\n", f64::from(tenths) / 10.0)),
            1 => "[a-z ]{0,10}".prop_map(|text| format!("#{text}\n")),
        ];
        prop::collection::vec(line, 0..48).prop_map(|lines| lines.concat().into_bytes())
    }

    proptest! {
        #[test]
        fn chunked_parse_matches_whole_parse(data in measurements(), workers in 1usize..9) {
            let whole = parse_all(&data).unwrap();
            let chunks = compute_chunks(&mut Cursor::new(&data), data.len() as u64, workers, 32).unwrap();
            let mut pieces = Vec::new();
            for chunk in chunks {
                let parser = RecordParser::starting_at(&data[chunk.range()], chunk.start);
                for record in parser {
                    pieces.push(record.unwrap());
                }
            }
            prop_assert_eq!(whole, pieces);
        }
    }
}
