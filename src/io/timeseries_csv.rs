use std::{fs, path::Path};

use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};

use crate::{error::TimeSeriesError, timeseries::TimeSeries};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Layout of a delimited time-series file.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesFormat {
    pub delimiter: u8,
    pub has_headers: bool,
    /// Accepted names of the timestamp column, compared case-insensitively.
    pub time_headers: Vec<String>,
    /// Accepted names of the active power column, compared case-insensitively.
    pub value_headers: Vec<String>,
    /// `chrono` layouts tried in order. Date-only layouts map to midnight.
    pub timestamp_formats: Vec<String>,
    /// Accept `1,5` for `1.5`.
    pub decimal_comma: bool,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

impl Default for TimeSeriesFormat {
    fn default() -> Self {
        Self {
            delimiter: b';',
            has_headers: true,
            time_headers: owned(&["Datum", "Date", "Zeit", "Time", "timestamp"]),
            value_headers: owned(&["MW", "P_MW", "Leistung"]),
            timestamp_formats: owned(&[
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%d %H:%M",
                "%Y-%m-%dT%H:%M:%S",
                "%d.%m.%Y %H:%M:%S",
                "%d.%m.%Y %H:%M",
                "%d/%m/%Y %H:%M",
                "%Y-%m-%d",
                "%d.%m.%Y",
            ]),
            decimal_comma: true,
        }
    }
}

impl TimeSeriesFormat {
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn parse_time(&self, raw: &str) -> Option<NaiveDateTime> {
        self.timestamp_formats.iter().find_map(|fmt| {
            NaiveDateTime::parse_from_str(raw, fmt).ok().or_else(|| {
                NaiveDate::parse_from_str(raw, fmt)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
        })
    }

    fn parse_value(&self, raw: &str) -> Option<f64> {
        let value = if self.decimal_comma && !raw.contains('.') {
            raw.replace(',', ".").parse::<f64>()
        } else {
            raw.parse::<f64>()
        };
        value.ok().filter(|v| v.is_finite())
    }

    /// Column indices of timestamp and value.
    fn columns(&self, headers: Option<&StringRecord>) -> Result<(usize, usize), TimeSeriesError> {
        let Some(headers) = headers else {
            return Ok((0, 1));
        };
        let find = |names: &[String]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| n.eq_ignore_ascii_case(h)))
        };
        match (find(&self.time_headers), find(&self.value_headers)) {
            (Some(t), Some(v)) => Ok((t, v)),
            (None, None) if headers.len() >= 2 => Ok((0, 1)),
            (None, _) => Err(TimeSeriesError::MissingColumn { what: "timestamp" }),
            (_, None) => Err(TimeSeriesError::MissingColumn { what: "active power" }),
        }
    }
}

/// Reads a `(timestamp, p_mw)` series from delimited text.
///
/// Header names are matched against the configured candidates; when none
/// matches, the first two columns are used. Row numbers in errors are file
/// line numbers.
pub fn read_time_series(
    path: impl AsRef<Path>,
    format: &TimeSeriesFormat,
) -> Result<TimeSeries, TimeSeriesError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| TimeSeriesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_time_series(&bytes, format)
}

pub fn parse_time_series(
    bytes: &[u8],
    format: &TimeSeriesFormat,
) -> Result<TimeSeries, TimeSeriesError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut rdr = ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_headers)
        .trim(Trim::All)
        .from_reader(bytes);
    let headers = if format.has_headers {
        Some(rdr.headers()?.clone())
    } else {
        None
    };
    let (time_col, value_col) = format.columns(headers.as_ref())?;

    let mut times: Vec<NaiveDateTime> = Vec::new();
    let mut values = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record?;
        let row = record
            .position()
            .map_or(idx + 1, |pos| pos.line() as usize);
        let raw_time = record.get(time_col).unwrap_or_default();
        let time = format
            .parse_time(raw_time)
            .ok_or_else(|| TimeSeriesError::BadTimestamp {
                row,
                value: raw_time.to_owned(),
            })?;
        if times.last().is_some_and(|last| time < *last) {
            return Err(TimeSeriesError::OutOfOrder { row });
        }
        let raw_value = record.get(value_col).unwrap_or_default();
        let value = format
            .parse_value(raw_value)
            .ok_or_else(|| TimeSeriesError::BadValue {
                row,
                value: raw_value.to_owned(),
            })?;
        times.push(time);
        values.push(value);
    }
    TimeSeries::new(times, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(text: &str) -> Result<TimeSeries, TimeSeriesError> {
        parse_time_series(text.as_bytes(), &TimeSeriesFormat::default())
    }

    #[test]
    fn reads_localized_file_with_bom() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(UTF8_BOM).unwrap();
        write!(
            file,
            "Datum;MW\n2021-06-01 00:00:00;0\n2021-06-01 00:15:00;1,25\n2021-06-01 00:15:00;2.5\n"
        )
        .unwrap();
        let ts = read_time_series(file.path(), &TimeSeriesFormat::default()).unwrap();
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.values(), &[0.0, 1.25, 2.5]);
        assert_eq!(ts.times()[1], ts.times()[2]);
    }

    #[test]
    fn header_lookup_and_positional_fallback() {
        let ts = parse("id;p_mw;timestamp\n1;0.5;01.06.2021 12:00\n").unwrap();
        assert_eq!(ts.values(), &[0.5]);
        assert_eq!(ts.times()[0].to_string(), "2021-06-01 12:00:00");

        let ts = parse("when;what\n2021-06-01;3\n").unwrap();
        assert_eq!(ts.values(), &[3.0]);

        assert!(matches!(
            parse("Datum;other\n2021-06-01;3\n"),
            Err(TimeSeriesError::MissingColumn { what: "active power" })
        ));

        let fmt = TimeSeriesFormat {
            has_headers: false,
            ..TimeSeriesFormat::default().with_delimiter(b',')
        };
        let ts = parse_time_series(b"2021-06-01 00:00,1.5\n", &fmt).unwrap();
        assert_eq!(ts.values(), &[1.5]);
    }

    #[test]
    fn errors_name_the_row() {
        assert!(matches!(
            parse("Datum;MW\n2021-06-01 00:00;1\nyesterday;2\n"),
            Err(TimeSeriesError::BadTimestamp { row: 3, .. })
        ));
        assert!(matches!(
            parse("Datum;MW\n2021-06-01 00:00;abc\n"),
            Err(TimeSeriesError::BadValue { row: 2, .. })
        ));
        assert!(matches!(
            parse("Datum;MW\n2021-06-01 00:15;1\n2021-06-01 00:00;2\n"),
            Err(TimeSeriesError::OutOfOrder { row: 3 })
        ));
        assert!(matches!(
            read_time_series("/nonexistent/pv.csv", &TimeSeriesFormat::default()),
            Err(TimeSeriesError::Io { .. })
        ));
    }

    #[test]
    fn header_only_file_is_empty() {
        assert!(parse("Datum;MW\n").unwrap().is_empty());
    }
}
