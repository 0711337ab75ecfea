//! Reference-data CSV emission.
//!
//! The file is UTF-8 with a byte-order marker so spreadsheet software opens
//! the Cyrillic columns correctly, one dated file per run, columns in the
//! canonical order.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use spbe_lib::{BondRecord, CANONICAL_FIELDS};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Dated default filename, one file per run day.
pub fn reference_data_filename() -> String {
    format!(
        "SPBE_ReferenceData_{}.csv",
        Local::now().format("%Y-%m-%d")
    )
}

/// Writes one row per record, every canonical column present.
pub fn write_reference_csv<'a, I>(path: &Path, records: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a BondRecord>,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }

    let mut file =
        File::create(path).with_context(|| format!("cannot create {}", path.display()))?;
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(CANONICAL_FIELDS)?;

    let mut rows = 0usize;
    for record in records {
        writer.write_record(record.values())?;
        rows += 1;
    }
    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spbe_lib::{FieldMapper, RunConfig};

    fn sample_record() -> BondRecord {
        let raw = json!({
            "srtsCode": "RK0001",
            "sisinCode": "RU000A0JX0J2",
            "fullName": "ООО \"Рога и Копыта\"",
            "sfaceValue": "1000"
        });
        FieldMapper::new(&RunConfig::default()).map_record(raw.as_object().unwrap())
    }

    fn scratch_file(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("spbe_csv_{}_{}.csv", std::process::id(), name))
    }

    #[test]
    fn file_starts_with_bom_and_header() {
        let path = scratch_file("bom");
        let records = vec![sample_record()];
        let rows = write_reference_csv(&path, &records).unwrap();
        assert_eq!(rows, 1);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], UTF8_BOM);

        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("Security Symbol,ISIN,Full Name Issuer"));
        assert!(header.ends_with("First Payment Date"));
    }

    #[test]
    fn every_row_has_every_column() {
        let path = scratch_file("cols");
        let records = vec![sample_record()];
        write_reference_csv(&path, &records).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), CANONICAL_FIELDS.len());
        assert_eq!(&row[0], "RK0001");
        assert_eq!(&row[1], "RU000A0JX0J2");
        assert_eq!(&row[2], "ООО \"Рога и Копыта\"");
    }

    #[test]
    fn filename_is_dated() {
        let name = reference_data_filename();
        assert!(name.starts_with("SPBE_ReferenceData_"));
        assert!(name.ends_with(".csv"));
    }
}
