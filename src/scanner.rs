use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::Record;

/// Discover the input table: either a single CSV file, or every `.csv`
/// shard under a directory (large header dumps ship split into parts).
/// Shards are returned sorted so every run sees the same row order.
pub fn discover_inputs(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut shards = Vec::new();
    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        // Skip editor droppings and hidden files.
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with('.') {
            continue;
        }
        shards.push(path.to_path_buf());
    }
    shards.sort();

    if shards.is_empty() {
        return Err(Error::NoInput(root.to_path_buf()));
    }
    Ok(shards)
}

/// Deserialize all rows from the discovered shards, in shard order.
/// Columns beyond the five the pipeline uses are ignored.
pub fn load_records(shards: &[PathBuf]) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    for path in shards {
        let mut reader = csv::Reader::from_path(path).map_err(|source| Error::Csv {
            path: path.clone(),
            source,
        })?;
        for row in reader.deserialize::<Record>() {
            let record = row.map_err(|source| Error::Csv {
                path: path.clone(),
                source,
            })?;
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_rows_and_ignores_extra_columns() {
        let dir = std::env::temp_dir().join("mail_resolve_scanner_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("part-00.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "person_id,folder,sender_field,recipient_field,timestamp,subject"
        )
        .unwrap();
        writeln!(
            f,
            "smith-j,sent,\"Smith, John <jsmith@x.com>\",\"Doe, Jane <jdoe@x.com>\",946684800,hello"
        )
        .unwrap();
        drop(f);

        let shards = discover_inputs(&dir).unwrap();
        assert_eq!(shards, vec![path.clone()]);
        let records = load_records(&shards).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].person_id, "smith-j");
        assert_eq!(records[0].timestamp, 946_684_800);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = std::env::temp_dir().join("mail_resolve_scanner_empty");
        std::fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            discover_inputs(&dir),
            Err(Error::NoInput(_))
        ));
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
