//! CSV export of tabular API data.
//!
//! `csv` turns uniform flat records into a CSV document and writes it to
//! the export directory; `shapes` flattens nested analytics payloads into
//! such records first.

mod csv;
mod shapes;

pub use self::csv::{convert_to_csv, download_csv, CsvExporter};
pub use self::shapes::{format_analytics_for_export, ExportShape};
