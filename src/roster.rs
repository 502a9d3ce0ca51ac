//! Device roster loading

use crate::errors::{MonitorError, Result};
use csv::{ByteRecord, ReaderBuilder};
use std::io::Read;
use std::path::Path;
use tracing::debug;

pub const DEVICE_ID_COLUMN: &str = "device id";
pub const WORK_NAME_COLUMN: &str = "work name";

/// One device to check, as listed in the roster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceRecord {
    pub device_id: String,
    pub work_name: String,
}

impl DeviceRecord {
    pub fn new(device_id: impl Into<String>, work_name: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            work_name: work_name.into(),
        }
    }
}

/// Read the whole roster into memory, in file order
pub fn load_roster(path: impl AsRef<Path>) -> Result<Vec<DeviceRecord>> {
    let path = path.as_ref();
    let source_name = path.display().to_string();

    let file = std::fs::File::open(path).map_err(|err| MonitorError::FileAccess {
        path: source_name.clone(),
        source: csv::Error::from(err),
    })?;

    let records = read_roster(file, &source_name)?;
    debug!("Loaded {} devices from {}", records.len(), source_name);

    Ok(records)
}

/// Parse roster rows from any reader; `source` names it in errors
///
/// Fields are decoded lossily so one row with bad bytes does not drop the others.
pub fn read_roster<R: Read>(reader: R, source: &str) -> Result<Vec<DeviceRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let file_error = |err: csv::Error| MonitorError::FileAccess {
        path: source.to_string(),
        source: err,
    };

    let headers = reader.byte_headers().map_err(file_error)?.clone();
    let device_id_index = column_index(&headers, DEVICE_ID_COLUMN, source)?;
    let work_name_index = column_index(&headers, WORK_NAME_COLUMN, source)?;

    let mut records = Vec::new();
    for row in reader.byte_records() {
        let row = row.map_err(file_error)?;
        records.push(DeviceRecord {
            device_id: field(&row, device_id_index),
            work_name: field(&row, work_name_index),
        });
    }

    Ok(records)
}

fn field(row: &ByteRecord, index: usize) -> String {
    row.get(index)
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

fn column_index(headers: &ByteRecord, column: &'static str, source: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| {
            String::from_utf8_lossy(header).trim_start_matches('\u{feff}') == column
        })
        .ok_or_else(|| MonitorError::MissingColumn {
            path: source.to_string(),
            column,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_rows_load_in_file_order() {
        let csv = "device id,work name\nd1,Press A\nd2,Press B\nd3,Lathe 7\n";

        let records = read_roster(csv.as_bytes(), "inline").unwrap();

        assert_eq!(
            records,
            vec![
                DeviceRecord::new("d1", "Press A"),
                DeviceRecord::new("d2", "Press B"),
                DeviceRecord::new("d3", "Lathe 7"),
            ]
        );
    }

    #[test]
    fn test_column_order_and_extra_columns() {
        let csv = "site,work name,device id\nnorth,Press A,d1\n";

        let records = read_roster(csv.as_bytes(), "inline").unwrap();

        assert_eq!(records, vec![DeviceRecord::new("d1", "Press A")]);
    }

    #[test]
    fn test_short_rows_yield_empty_fields() {
        let csv = "device id,work name\nd1\n,\n";

        let records = read_roster(csv.as_bytes(), "inline").unwrap();

        assert_eq!(
            records,
            vec![DeviceRecord::new("d1", ""), DeviceRecord::new("", "")]
        );
    }

    #[test]
    fn test_values_are_not_trimmed_or_deduplicated() {
        let csv = "device id,work name\n d1 ,Press A\n d1 ,Press A\n";

        let records = read_roster(csv.as_bytes(), "inline").unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].device_id, " d1 ");
    }

    #[test]
    fn test_column_names_are_exact() {
        let csv = "Device ID,work name\nd1,Press A\n";

        match read_roster(csv.as_bytes(), "inline") {
            Err(MonitorError::MissingColumn { column, .. }) => {
                assert_eq!(column, DEVICE_ID_COLUMN)
            }
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_utf8_row_does_not_drop_neighbours() {
        let mut csv = b"device id,work name\nd1,Press A\nd2,Pr".to_vec();
        csv.extend_from_slice(&[0xff, 0xfe]);
        csv.extend_from_slice(b"ss B\nd3,Press C\n");

        let records = read_roster(csv.as_slice(), "inline").unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], DeviceRecord::new("d1", "Press A"));
        assert_eq!(records[1].device_id, "d2");
        assert_eq!(records[1].work_name, "Pr\u{fffd}\u{fffd}ss B");
        assert_eq!(records[2], DeviceRecord::new("d3", "Press C"));
    }

    #[test]
    fn test_bom_before_header_is_ignored() {
        let csv = "\u{feff}device id,work name\nd1,Press A\n";

        let records = read_roster(csv.as_bytes(), "inline").unwrap();

        assert_eq!(records, vec![DeviceRecord::new("d1", "Press A")]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "device id,work name").unwrap();
        writeln!(file, "d1,Press A").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "d2,Press B").unwrap();

        let records = load_roster(file.path()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1], DeviceRecord::new("d2", "Press B"));
    }

    #[test]
    fn test_missing_file_is_file_access_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.csv");

        let err = load_roster(&path).unwrap_err();

        assert!(matches!(err, MonitorError::FileAccess { .. }));
    }
}
