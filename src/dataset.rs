//! The growing CSV file every record ends up in.
//!
//! Each append rereads and rewrites the whole file, so the file has exactly one
//! writer during a run: the task started by [`spawn_writer`].

use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};

use crate::record::ListingRecord;
use crate::{info_time, Error, Result};

/// Header + rows of string cells. An empty cell is a null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    pub fn from_record(record: &ListingRecord) -> Self {
        let (columns, row): (Vec<_>, Vec<_>) = record
            .cells()
            .into_iter()
            .map(|(name, cell)| (name.to_string(), cell))
            .unzip();
        Self {
            columns,
            rows: vec![row],
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for (i, row) in reader.records().enumerate() {
            let row = row?;
            // Cells past the header have no column to go to; rewriting would lose them.
            if row.len() > columns.len() {
                return Err(Error::DatasetRowTooLong {
                    row: i + 1,
                    found: row.len(),
                    expected: columns.len(),
                });
            }
            // Short rows are padded so every row spans every column.
            let mut cells: Vec<String> = row.iter().map(str::to_string).collect();
            cells.resize(columns.len(), String::new());
            rows.push(cells);
        }
        Ok(Self { columns, rows })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Removes every column whose cells are all empty.
    pub fn drop_empty_columns(&mut self) {
        let keep: Vec<bool> = (0..self.columns.len())
            .map(|i| self.rows.iter().any(|row| !row[i].is_empty()))
            .collect();

        self.columns = retain_by(&self.columns, &keep);
        for row in &mut self.rows {
            *row = retain_by(row, &keep);
        }
    }

    /// Appends `other`'s rows below ours. The result has our columns first, then
    /// the ones only `other` has; missing cells on either side are empty.
    pub fn concat(mut self, other: Dataset) -> Self {
        for column in &other.columns {
            if !self.columns.contains(column) {
                self.columns.push(column.clone());
            }
        }
        let width = self.columns.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }

        let positions: Vec<usize> = other
            .columns
            .iter()
            .filter_map(|c| self.columns.iter().position(|own| own == c))
            .collect();
        for row in other.rows {
            let mut cells = vec![String::new(); width];
            for (pos, cell) in positions.iter().zip(row) {
                cells[*pos] = cell;
            }
            self.rows.push(cells);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The cell at `row` under `column`, if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }
}

fn retain_by(cells: &[String], keep: &[bool]) -> Vec<String> {
    cells
        .iter()
        .zip(keep)
        .filter(|(_, keep)| **keep)
        .map(|(cell, _)| cell.clone())
        .collect()
}

/// Read-modify-write of the whole file for one record.
pub fn append(record: &ListingRecord, destination: &Path) -> Result<()> {
    let new = Dataset::from_record(record);

    let combined = if destination.exists() {
        let mut existing = Dataset::load(destination)?;
        existing.drop_empty_columns();
        let mut new = new;
        new.drop_empty_columns();
        existing.concat(new)
    } else {
        new
    };

    combined.save(destination)
}

/// Starts the only task allowed to touch `destination`.
/// It appends records in arrival order until every sender is dropped and returns how many it wrote.
/// The first failed append ends the task with that error.
pub fn spawn_writer(destination: PathBuf, capacity: usize) -> (mpsc::Sender<ListingRecord>, JoinHandle<Result<usize>>) {
    let (record_tx, record_rx) = mpsc::channel(capacity);
    let handle = tokio::spawn(async move { write_records(record_rx, destination).await });
    (record_tx, handle)
}

async fn write_records(mut record_rx: mpsc::Receiver<ListingRecord>, destination: PathBuf) -> Result<usize> {
    info_time!("Started writing records to {}", destination.display());
    let start_time = Local::now();
    let mut written = 0;

    while let Some(record) = record_rx.recv().await {
        let path = destination.clone();
        spawn_blocking(move || append(&record, &path)).await??;
        written += 1;
    }

    info_time!(start_time, "DONE: wrote {} records", written);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FieldValue;
    use crate::record::{BEDROOMS, COLUMNS, LOCALITY, PRICE, TERRACE_SURFACE, URL};

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("immo_scrap_{}_{name}.csv", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn concat_is_a_union_of_columns() {
        let existing = table(&["B", "C"], &[&["b1", "c1"], &["b2", "c2"]]);
        let new = table(&["A", "B"], &[&["a3", "b3"]]);

        let combined = existing.concat(new);
        assert_eq!(combined.columns, vec!["B", "C", "A"]);
        assert_eq!(
            combined.rows,
            vec![
                vec!["b1", "c1", ""],
                vec!["b2", "c2", ""],
                vec!["b3", "", "a3"],
            ]
        );
    }

    #[test]
    fn empty_columns_are_dropped() {
        let mut data = table(&["A", "B", "C"], &[&["1", "", ""], &["2", "", "x"]]);
        data.drop_empty_columns();
        assert_eq!(data, table(&["A", "C"], &[&["1", ""], &["2", "x"]]));
    }

    #[test]
    fn append_to_missing_file_creates_one_row() {
        let path = temp_path("fresh");
        let record = ListingRecord {
            price: FieldValue::Int(300_000),
            url: FieldValue::Text("https://example.test/1".into()),
            ..ListingRecord::table_defaults()
        };

        append(&record, &path).unwrap();
        let data = Dataset::load(&path).unwrap();
        assert_eq!(data, Dataset::from_record(&record));
        assert_eq!(data.columns, COLUMNS);
        assert_eq!(data.get(0, PRICE), Some("300000"));
        assert_eq!(data.get(0, LOCALITY), Some(""));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn append_keeps_old_rows_and_adds_columns() {
        let path = temp_path("merge");
        table(&["Old column", BEDROOMS], &[&["kept", "2"]])
            .save(&path)
            .unwrap();

        let record = ListingRecord {
            bedrooms: FieldValue::Int(5),
            url: FieldValue::Text("https://example.test/5".into()),
            ..Default::default()
        };
        append(&record, &path).unwrap();

        let data = Dataset::load(&path).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(&data.columns[..2], ["Old column", BEDROOMS]);
        assert!(data.columns.iter().any(|c| c == URL));
        // Surfaces always render, so the pair columns survive even on sparse records.
        assert!(data.columns.iter().any(|c| c == TERRACE_SURFACE));
        // All-empty columns of the new row are not carried over.
        assert!(!data.columns.iter().any(|c| c == LOCALITY));
        assert_eq!(data.get(0, "Old column"), Some("kept"));
        assert_eq!(data.get(0, URL), Some(""));
        assert_eq!(data.get(1, BEDROOMS), Some("5"));
        assert_eq!(data.get(1, "Old column"), Some(""));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"A,B\n\"unterminated\xff,x\n").unwrap();
        assert!(append(&ListingRecord::default(), &path).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn row_wider_than_header_is_an_error() {
        let path = temp_path("wide_row");
        std::fs::write(&path, "A,B\n1,2,EXTRA_DATA\n").unwrap();

        let result = append(&ListingRecord::table_defaults(), &path);
        assert!(matches!(
            result,
            Err(Error::DatasetRowTooLong { row: 1, found: 3, expected: 2 })
        ));
        // The file is left as it was.
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("EXTRA_DATA"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn short_rows_are_padded() {
        let path = temp_path("short_row");
        std::fs::write(&path, "A,B,C\n1\n").unwrap();
        let data = Dataset::load(&path).unwrap();
        assert_eq!(data.rows, vec![vec!["1", "", ""]]);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn writer_appends_everything_it_receives() {
        let path = temp_path("writer");
        let (record_tx, handle) = spawn_writer(path.clone(), 4);
        for i in 0..5 {
            let record = ListingRecord {
                price: FieldValue::Int(i),
                ..ListingRecord::table_defaults()
            };
            record_tx.send(record).await.unwrap();
        }
        drop(record_tx);

        assert_eq!(handle.await.unwrap().unwrap(), 5);
        let data = Dataset::load(&path).unwrap();
        assert_eq!(data.len(), 5);
        assert_eq!(data.get(4, PRICE), Some("4"));

        std::fs::remove_file(&path).unwrap();
    }
}
