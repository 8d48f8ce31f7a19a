use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use super::{PacketEvent, PacketSource, SourceError};
use crate::registry::PacketId;

/// One packet per line: `{"id": 5, "header": "<b64>", "data": "<b64>", "ts": 1.5}`.
///
/// `header` and `ts` may be omitted; blank lines are skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
    buf: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CaptureRecord {
    id: PacketId,
    #[serde(default)]
    header: String,
    data: String,
    #[serde(default)]
    ts: Option<f64>,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonLinesSource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }

    fn decode_field(&self, field: &'static str, value: &str) -> Result<Vec<u8>, SourceError> {
        STANDARD
            .decode(value.trim())
            .map_err(|err| SourceError::Base64 {
                line: self.line,
                field,
                message: err.to_string(),
            })
    }
}

impl<R: BufRead> PacketSource for JsonLinesSource<R> {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }

            let record: CaptureRecord =
                serde_json::from_str(text).map_err(|err| SourceError::Record {
                    line: self.line,
                    message: err.to_string(),
                })?;
            let header = self.decode_field("header", &record.header)?;
            let data = self.decode_field("data", &record.data)?;
            return Ok(Some(PacketEvent {
                ts: record.ts,
                id: record.id,
                header,
                data,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::JsonLinesSource;
    use crate::capture::{PacketSource, SourceError};

    #[test]
    fn reads_records_and_skips_blank_lines() {
        let input = "{\"id\": 5, \"data\": \"CJYB\", \"ts\": 1.5}\n\n{\"id\": 6, \"header\": \"CAE=\", \"data\": \"\"}\n";
        let mut source = JsonLinesSource::from_reader(Cursor::new(input));

        let first = source.next_packet().unwrap().unwrap();
        assert_eq!(first.id, 5);
        assert_eq!(first.data, vec![0x08, 0x96, 0x01]);
        assert!(first.header.is_empty());
        assert_eq!(first.ts, Some(1.5));

        let second = source.next_packet().unwrap().unwrap();
        assert_eq!(second.id, 6);
        assert_eq!(second.header, vec![0x08, 0x01]);
        assert!(second.data.is_empty());
        assert_eq!(second.ts, None);

        assert!(source.next_packet().unwrap().is_none());
    }

    #[test]
    fn malformed_record_reports_line() {
        let input = "{\"id\": 1, \"data\": \"\"}\nnot json\n";
        let mut source = JsonLinesSource::from_reader(Cursor::new(input));
        source.next_packet().unwrap();
        let err = source.next_packet().unwrap_err();
        assert!(matches!(err, SourceError::Record { line: 2, .. }));
    }

    #[test]
    fn invalid_base64_names_field() {
        let input = "{\"id\": 1, \"data\": \"@@@\"}\n";
        let mut source = JsonLinesSource::from_reader(Cursor::new(input));
        let err = source.next_packet().unwrap_err();
        assert!(matches!(
            err,
            SourceError::Base64 {
                line: 1,
                field: "data",
                ..
            }
        ));
    }
}
