pub mod filename;
pub mod raster;

pub use filename::{page_file_name, sanitize_stem};
pub use raster::{ExportError, export_pages};
