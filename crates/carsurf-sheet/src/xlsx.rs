use std::path::Path;

use carsurf_crawler::Record;
use rust_xlsxwriter::{Workbook, XlsxError};

use crate::cells::{record_row, HEADER};

pub fn write_workbook(path: &Path, records: &[Record]) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, title) in (0u16..).zip(HEADER) {
        sheet.write_string(0, col, title)?;
    }
    for (row, record) in (1u32..).zip(records) {
        for (col, cell) in (0u16..).zip(record_row(record)) {
            sheet.write_string(row, col, cell)?;
        }
    }

    workbook.save(path)
}
