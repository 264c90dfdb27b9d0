//! Parquet output: one file per data category, counted from footers

mod row_count;
mod writer;

pub use row_count::{count_all_rows, count_rows, ParquetFooterReader, RowGroupMetadata};
pub use writer::{CategoryWriter, ParquetSink};
