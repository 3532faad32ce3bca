pub mod cells;
mod writer;
mod xlsx;

pub use writer::{CsvDialect, SheetTarget, SheetWriter, DEFAULT_OUTPUT};

pub use anyhow;
