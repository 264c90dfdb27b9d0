use parquet::file::metadata::ParquetMetaDataReader;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::types::DataCategory;

/// Row-group level metadata of a columnar file. Implementations must only
/// look at the footer, never at row data.
pub trait RowGroupMetadata {
    fn row_group_sizes(&self, path: &Path) -> Result<Vec<i64>>;
}

/// Reads row-group sizes from the Parquet footer
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetFooterReader;

impl RowGroupMetadata for ParquetFooterReader {
    fn row_group_sizes(&self, path: &Path) -> Result<Vec<i64>> {
        let file = File::open(path)?;
        let metadata = ParquetMetaDataReader::new().parse_and_finish(&file)?;

        Ok(metadata
            .row_groups()
            .iter()
            .map(|row_group| row_group.num_rows())
            .collect())
    }
}

/// Total rows of a file: the sum of its row groups
pub fn count_rows<M: RowGroupMetadata + ?Sized>(reader: &M, path: &Path) -> Result<u64> {
    let sizes = reader.row_group_sizes(path)?;
    let total = sizes.iter().map(|rows| (*rows).max(0) as u64).sum();
    debug!("{}: {} rows in {} row groups", path.display(), total, sizes.len());
    Ok(total)
}

/// Row counts for `<dir>/<category>.parquet`, in the given category order
pub fn count_all_rows<M: RowGroupMetadata + ?Sized>(
    reader: &M,
    dir: &Path,
    categories: &[DataCategory],
) -> Result<Vec<(DataCategory, u64)>> {
    categories
        .iter()
        .map(|category| Ok((*category, count_rows(reader, &dir.join(category.file_name()))?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Serves canned row-group sizes and remembers which files were opened
    #[derive(Default)]
    struct CannedFooters {
        sizes: HashMap<PathBuf, Vec<i64>>,
        opened: RefCell<Vec<PathBuf>>,
    }

    impl RowGroupMetadata for CannedFooters {
        fn row_group_sizes(&self, path: &Path) -> Result<Vec<i64>> {
            self.opened.borrow_mut().push(path.to_path_buf());
            self.sizes.get(path).cloned().ok_or_else(|| {
                BenchError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"))
            })
        }
    }

    #[test]
    fn test_sums_row_groups() {
        let mut footers = CannedFooters::default();
        footers.sizes.insert(PathBuf::from("/r/logs.parquet"), vec![10, 5]);

        assert_eq!(count_rows(&footers, Path::new("/r/logs.parquet")).unwrap(), 15);
        assert_eq!(footers.opened.borrow().len(), 1);
    }

    #[test]
    fn test_count_all_rows_per_category() {
        let mut footers = CannedFooters::default();
        footers.sizes.insert(PathBuf::from("/r/logs.parquet"), vec![3]);
        footers.sizes.insert(PathBuf::from("/r/decoded_logs.parquet"), vec![2, 1]);
        footers.sizes.insert(PathBuf::from("/r/blocks.parquet"), vec![]);

        let counts = count_all_rows(
            &footers,
            Path::new("/r"),
            &[DataCategory::Logs, DataCategory::DecodedLogs, DataCategory::Blocks],
        )
        .unwrap();

        assert_eq!(
            counts,
            vec![
                (DataCategory::Logs, 3),
                (DataCategory::DecodedLogs, 3),
                (DataCategory::Blocks, 0),
            ]
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let footers = CannedFooters::default();
        assert!(count_all_rows(&footers, Path::new("/r"), &[DataCategory::Traces]).is_err());
    }

    #[test]
    fn test_footer_reader_rejects_non_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.parquet");
        std::fs::write(&path, b"not a parquet file").unwrap();

        assert!(ParquetFooterReader.row_group_sizes(&path).is_err());
    }
}
