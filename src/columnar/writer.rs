use arrow::array::{ArrayRef, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::decoder::Decoder;
use crate::error::{BenchError, Result};
use crate::query::Query;
use crate::types::{DataCategory, Record};

/// Writes the records of one category to `<dir>/<category>.parquet`.
///
/// Every column is nullable UTF-8: strings are stored as-is, other JSON
/// values as their JSON text. Each `write` call becomes one row group.
pub struct CategoryWriter {
    category: DataCategory,
    path: PathBuf,
    columns: Vec<String>,
    schema: SchemaRef,
    writer: ArrowWriter<File>,
    rows: u64,
}

impl CategoryWriter {
    pub fn create(dir: &Path, category: DataCategory, columns: Vec<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(BenchError::Config(format!(
                "No columns selected for {} output",
                category
            )));
        }

        let schema: SchemaRef = Arc::new(Schema::new(
            columns
                .iter()
                .map(|name| Field::new(name.as_str(), DataType::Utf8, true))
                .collect::<Vec<_>>(),
        ));

        let path = dir.join(category.file_name());
        let file = File::create(&path)?;
        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(props))?;

        debug!("Opened {} for {} columns", path.display(), columns.len());

        Ok(Self {
            category,
            path,
            columns,
            schema,
            writer,
            rows: 0,
        })
    }

    pub fn write(&mut self, records: &[Record]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut builders: Vec<StringBuilder> = self
            .columns
            .iter()
            .map(|_| StringBuilder::with_capacity(records.len(), records.len() * 32))
            .collect();

        for record in records {
            for (column, builder) in self.columns.iter().zip(builders.iter_mut()) {
                match record.get(column) {
                    None | Some(Value::Null) => builder.append_null(),
                    Some(Value::String(s)) => builder.append_value(s),
                    Some(other) => builder.append_value(other.to_string()),
                }
            }
        }

        let arrays: Vec<ArrayRef> = builders
            .into_iter()
            .map(|mut builder| Arc::new(builder.finish()) as ArrayRef)
            .collect();

        let batch = RecordBatch::try_new(Arc::clone(&self.schema), arrays)?;
        self.writer.write(&batch)?;
        self.writer.flush()?;
        self.rows += records.len() as u64;

        Ok(records.len())
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Drop the writer without a footer and delete the partial file
    pub fn discard(self) -> Result<()> {
        drop(self.writer);
        fs::remove_file(&self.path)?;
        debug!("Discarded {}", self.path.display());
        Ok(())
    }

    pub fn finish(self) -> Result<PathBuf> {
        self.writer.close()?;
        debug!("Closed {} with {} {} rows", self.path.display(), self.rows, self.category);
        Ok(self.path)
    }
}

/// A set of category writers sharing one output directory
pub struct ParquetSink {
    dir: PathBuf,
    writers: BTreeMap<DataCategory, CategoryWriter>,
}

impl ParquetSink {
    /// Creates the directory and one empty file per category up front, so
    /// every expected file exists even when no rows arrive.
    pub fn create(dir: &Path, layout: Vec<(DataCategory, Vec<String>)>) -> Result<Self> {
        fs::create_dir_all(dir)?;

        let mut writers = BTreeMap::new();
        for (category, columns) in layout {
            writers.insert(category, CategoryWriter::create(dir, category, columns)?);
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            writers,
        })
    }

    /// Layout derived from the query's field selection, plus `decoded_logs`
    /// when a decoder is present
    pub fn for_query(dir: &Path, query: &Query, decoder: Option<&Decoder>) -> Result<Self> {
        let mut layout: Vec<(DataCategory, Vec<String>)> = query
            .requested_categories()
            .into_iter()
            .map(|category| {
                let columns = query
                    .field_selection
                    .columns(category)
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                (category, columns)
            })
            .collect();

        if let Some(decoder) = decoder {
            layout.push((DataCategory::DecodedLogs, decoder.columns().to_vec()));
        }

        Self::create(dir, layout)
    }

    pub fn write(&mut self, category: DataCategory, records: &[Record]) -> Result<usize> {
        match self.writers.get_mut(&category) {
            Some(writer) => writer.write(records),
            None => {
                if !records.is_empty() {
                    debug!("Dropping {} {} records without an output file", records.len(), category);
                }
                Ok(0)
            }
        }
    }

    pub fn categories(&self) -> Vec<DataCategory> {
        self.writers.keys().copied().collect()
    }

    pub fn finish(self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(self.writers.len());
        for (_, writer) in self.writers {
            paths.push(writer.finish()?);
        }
        info!("Wrote {} parquet files to {}", paths.len(), self.dir.display());
        Ok(paths)
    }

    /// Remove every file this sink created. Used when the stream feeding it
    /// fails, so no footer-less files are left behind.
    pub fn discard(self) -> Result<()> {
        for (_, writer) in self.writers {
            writer.discard()?;
        }
        warn!("Discarded partial parquet output in {}", self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columnar::{count_rows, ParquetFooterReader, RowGroupMetadata};
    use crate::query::{FieldSelection, LogField};
    use serde_json::json;
    use tempfile::tempdir;

    fn log_records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| match json!({"block_number": i, "data": format!("0x{:02x}", i), "topic0": null}) {
                Value::Object(map) => map,
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn test_each_write_is_a_row_group() {
        let dir = tempdir().unwrap();
        let columns = vec!["block_number".to_string(), "data".to_string(), "topic0".to_string()];
        let mut writer = CategoryWriter::create(dir.path(), DataCategory::Logs, columns).unwrap();

        assert_eq!(writer.write(&log_records(10)).unwrap(), 10);
        assert_eq!(writer.write(&[]).unwrap(), 0);
        assert_eq!(writer.write(&log_records(5)).unwrap(), 5);
        assert_eq!(writer.rows(), 15);
        let path = writer.finish().unwrap();

        assert_eq!(path, dir.path().join("logs.parquet"));
        let reader = ParquetFooterReader;
        assert_eq!(reader.row_group_sizes(&path).unwrap(), vec![10, 5]);
        assert_eq!(count_rows(&reader, &path).unwrap(), 15);
    }

    #[test]
    fn test_sink_creates_files_for_every_category() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("run");
        let query = Query {
            field_selection: FieldSelection {
                log: vec![LogField::BlockNumber, LogField::Data],
                ..Default::default()
            },
            ..Default::default()
        };
        let decoder =
            Decoder::from_signatures(&["Transfer(address indexed from, address indexed to, uint256 value)"])
                .unwrap();

        let mut sink = ParquetSink::for_query(&out, &query, Some(&decoder)).unwrap();
        assert_eq!(
            sink.categories(),
            vec![DataCategory::Logs, DataCategory::DecodedLogs]
        );
        sink.write(DataCategory::Logs, &log_records(3)).unwrap();
        assert_eq!(sink.write(DataCategory::Traces, &log_records(3)).unwrap(), 0);
        let paths = sink.finish().unwrap();

        assert_eq!(paths.len(), 2);
        let reader = ParquetFooterReader;
        assert_eq!(count_rows(&reader, &out.join("logs.parquet")).unwrap(), 3);
        assert_eq!(count_rows(&reader, &out.join("decoded_logs.parquet")).unwrap(), 0);
    }

    #[test]
    fn test_discard_removes_partial_files() {
        let dir = tempdir().unwrap();
        let layout = vec![
            (DataCategory::Logs, vec!["data".to_string()]),
            (DataCategory::Blocks, vec!["number".to_string()]),
        ];
        let mut sink = ParquetSink::create(dir.path(), layout).unwrap();
        sink.write(DataCategory::Logs, &log_records(2)).unwrap();

        sink.discard().unwrap();
        assert!(!dir.path().join("logs.parquet").exists());
        assert!(!dir.path().join("blocks.parquet").exists());
    }

    #[test]
    fn test_empty_layout_column_list_is_rejected() {
        let dir = tempdir().unwrap();
        assert!(CategoryWriter::create(dir.path(), DataCategory::Logs, Vec::new()).is_err());
    }
}
