use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::capture::{JsonLinesSource, PacketEvent, PacketSource, SourceError};
use crate::config::Config;
use crate::host::DefaultHost;
use crate::matcher::{MatchError, Matcher, ShapeComparer};
use crate::registry::{PacketId, Registry};
use crate::{
    CaptureSummary, DEFAULT_GENERATED_AT, DecodeReport, MatchReport, PacketSummary,
    make_decode_report, make_match_report,
};

mod summary;

use summary::{summarize_message, summarize_registry};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("Match error: {0}")]
    Match(#[from] MatchError),
}

/// Builds a matcher from `config`: hints seeded, host environment set and
/// the shape comparer installed.
pub fn matcher_from_config(config: &Config) -> Result<Matcher, AnalysisError> {
    let host = Arc::new(DefaultHost::new(config.env.clone()));
    let mut matcher = Matcher::with_host(Registry::shared(), host);
    matcher.seed(&config.hints)?;
    matcher.add_comparer(Box::new(ShapeComparer::new(config.matching.min_score)));
    Ok(matcher)
}

pub fn analyze_capture_file(path: &Path, config: &Config) -> Result<MatchReport, AnalysisError> {
    let source = JsonLinesSource::open(path)?;
    let mut matcher = matcher_from_config(config)?;
    analyze_source(path, source, &mut matcher)
}

/// Runs every packet of `source` through `matcher` and reports what the
/// registry knows afterwards.
///
/// Packets that fail to decode are counted and skipped.
pub fn analyze_source<S: PacketSource>(
    path: &Path,
    mut source: S,
    matcher: &mut Matcher,
) -> Result<MatchReport, AnalysisError> {
    let mut packets_total = 0u64;
    let mut decode_errors = 0u64;
    let mut span = TimeSpan::default();
    let mut per_id: BTreeMap<PacketId, u64> = BTreeMap::new();

    while let Some(PacketEvent {
        ts,
        id,
        header,
        data,
    }) = source.next_packet()?
    {
        packets_total += 1;
        span.observe(ts);
        *per_id.entry(id).or_default() += 1;

        match matcher.compare(id, &header, &data) {
            Ok(()) => {}
            Err(err @ MatchError::Decode { .. }) => {
                decode_errors += 1;
                log::warn!("packet {id} #{packets_total}: {err}");
            }
            Err(err) => return Err(err.into()),
        }
    }

    let registry = matcher.snapshot()?;
    let mut report = make_match_report(&path.display().to_string(), path.metadata()?.len());
    report.capture_summary = Some(CaptureSummary {
        packets_total,
        decode_errors,
        time_start: span.start(),
        time_end: span.end(),
    });
    report.generated_at = report
        .capture_summary
        .as_ref()
        .and_then(|summary| summary.time_end.clone().or(summary.time_start.clone()))
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    report.packets = per_id
        .into_iter()
        .map(|(id, count)| {
            let name = registry.name_of(id).map(str::to_string);
            PacketSummary {
                id,
                identified: name.is_some(),
                name,
                count,
            }
        })
        .collect();
    report.registry = summarize_registry(&registry);
    Ok(report)
}

/// Decodes one buffer into a report, using the schema known for
/// `packet_id` when one is given.
///
/// `input_bytes` is the size of the input as stored, which differs from
/// `bytes.len()` for text-encoded input.
pub fn decode_to_report(
    input_path: &str,
    input_bytes: u64,
    bytes: &[u8],
    packet_id: Option<PacketId>,
    matcher: &Matcher,
) -> Result<DecodeReport, AnalysisError> {
    let message = match packet_id {
        Some(id) => matcher.decode_known(id, bytes)?,
        None => crate::wire::decode(bytes).map_err(|source| MatchError::Decode {
            context: "input",
            source,
        })?,
    };
    let mut report = make_decode_report(input_path, input_bytes);
    report.packet_id = packet_id;
    report.packet_name = packet_id.and_then(|id| {
        matcher
            .snapshot()
            .ok()
            .and_then(|registry| registry.name_of(id).map(str::to_string))
    });
    report.fields = summarize_message(&message);
    Ok(report)
}

/// Earliest and latest capture timestamps, in seconds since the epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct TimeSpan {
    bounds: Option<(f64, f64)>,
}

impl TimeSpan {
    fn observe(&mut self, ts: Option<f64>) {
        let Some(ts) = ts else { return };
        self.bounds = Some(match self.bounds {
            Some((start, end)) => (start.min(ts), end.max(ts)),
            None => (ts, ts),
        });
    }

    fn start(&self) -> Option<String> {
        self.bounds.and_then(|(start, _)| format_epoch_seconds(start))
    }

    fn end(&self) -> Option<String> {
        self.bounds.and_then(|(_, end)| format_epoch_seconds(end))
    }
}

fn format_epoch_seconds(seconds: f64) -> Option<String> {
    let nanos = (seconds * 1e9) as i128;
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()?
        .format(&Rfc3339)
        .ok()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use super::{TimeSpan, decode_to_report, format_epoch_seconds, matcher_from_config};
    use crate::capture::JsonLinesSource;
    use crate::config::Config;
    use crate::matcher::{FieldData, Matcher};
    use crate::registry::Registry;

    #[test]
    fn time_span_tracks_earliest_and_latest() {
        let mut span = TimeSpan::default();
        assert_eq!(span.start(), None);
        for ts in [Some(2.0), Some(1.0), None, Some(3.0)] {
            span.observe(ts);
        }
        assert_eq!(span.bounds, Some((1.0, 3.0)));
        assert_eq!(span.end().as_deref(), Some("1970-01-01T00:00:03Z"));
    }

    #[test]
    fn epoch_seconds_format_as_rfc3339() {
        assert_eq!(
            format_epoch_seconds(0.0).as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(
            format_epoch_seconds(1.5).as_deref(),
            Some("1970-01-01T00:00:01.5Z")
        );
    }

    #[test]
    fn analyze_counts_decode_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.jsonl");
        std::fs::write(&path, "").unwrap();

        // fields 1 and 2 as floats, then an unterminated varint
        let input = "{\"id\": 10, \"data\": \"DQAAgD8VAAAAQA==\", \"ts\": 2.0}\n{\"id\": 11, \"data\": \"CA==\", \"ts\": 1.0}\n";
        let source = JsonLinesSource::from_reader(Cursor::new(input));
        let config = Config::from_toml_str(
            "[[hints]]\nname = \"Move\"\nid = 10\nfields = [{ field_name = \"x\", field_type = \"float\", field_id = 1 }, { field_name = \"y\", field_type = \"float\", field_id = 2 }]\n",
        )
        .unwrap();
        let mut matcher = matcher_from_config(&config).unwrap();
        let report = super::analyze_source(Path::new(&path), source, &mut matcher).unwrap();

        let summary = report.capture_summary.unwrap();
        assert_eq!(summary.packets_total, 2);
        assert_eq!(summary.decode_errors, 1);
        assert_eq!(summary.time_start.as_deref(), Some("1970-01-01T00:00:01Z"));
        assert_eq!(report.generated_at, "1970-01-01T00:00:02Z");
        assert_eq!(report.packets.len(), 2);
        assert!(report.packets[0].identified);
        assert!(!report.packets[1].identified);
    }

    #[test]
    fn decode_report_uses_known_schema() {
        let matcher = Matcher::new(Registry::shared());
        matcher
            .identify("Blob", 3, &FieldData::new("payload", "bytes", 1))
            .unwrap();
        let bytes = [0x0a, 0x02, b'o', b'k'];

        let report = decode_to_report("input.hex", 11, &bytes, Some(3), &matcher).unwrap();
        assert_eq!(report.packet_name.as_deref(), Some("Blob"));
        assert_eq!(report.fields[0].value, Some(serde_json::json!("6f6b")));

        assert_eq!(report.input.bytes, 11);

        let report = decode_to_report("input.bin", 4, &bytes, None, &matcher).unwrap();
        assert_eq!(report.fields[0].value, Some(serde_json::json!("ok")));
        assert_eq!(report.input.bytes, 4);
    }
}
