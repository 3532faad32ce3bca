use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use carsurf_crawler::{Record, TabularWriter};

use crate::cells::{record_row, HEADER};
use crate::xlsx;

pub const DEFAULT_OUTPUT: &str = "search_results.xlsx";

/// Separator, quoting and line ending of CSV output.
///
/// Defaults to `,` separated fields, doubled `"` quotes and `\n` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    delimiter: u8,
    escape: Option<u8>,
    crlf: bool,
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            escape: None,
            crlf: false,
        }
    }
}

impl CsvDialect {
    /// Fails when `delimiter` or `escape` isn't a single ASCII character.
    pub fn new(delimiter: char, escape: Option<char>, crlf: bool) -> anyhow::Result<Self> {
        let delimiter = ascii_byte("delimiter", delimiter)?;
        let escape = escape.map(|c| ascii_byte("escape", c)).transpose()?;
        if escape == Some(delimiter) {
            anyhow::bail!("CSV escape can't be the delimiter {:?}", delimiter as char);
        }
        Ok(Self {
            delimiter,
            escape,
            crlf,
        })
    }

    pub fn delimiter(&self) -> char {
        self.delimiter as char
    }

    pub fn escape(&self) -> Option<char> {
        self.escape.map(char::from)
    }

    pub fn crlf(&self) -> bool {
        self.crlf
    }

    fn builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder.delimiter(self.delimiter);
        if self.crlf {
            builder.terminator(csv::Terminator::CRLF);
        }
        match self.escape {
            Some(escape) => builder.double_quote(false).escape(escape),
            None => builder.double_quote(true),
        };
        builder
    }
}

fn ascii_byte(what: &str, c: char) -> anyhow::Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        anyhow::bail!("CSV {what} must be an ASCII character, got {c:?}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetTarget {
    Xlsx(PathBuf),
    Csv(PathBuf),
    Stdout,
}

impl SheetTarget {
    /// `-` is stdout, `.xlsx` files are workbooks, anything else is CSV.
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            return Self::Stdout;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => Self::Xlsx(path.to_path_buf()),
            _ => Self::Csv(path.to_path_buf()),
        }
    }
}

impl Default for SheetTarget {
    fn default() -> Self {
        Self::Xlsx(PathBuf::from(DEFAULT_OUTPUT))
    }
}

enum CsvWriter {
    File(csv::Writer<fs_err::File>),
    Stdout(csv::Writer<io::Stdout>),
}

impl CsvWriter {
    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::File(wtr) => wtr.flush(),
            Self::Stdout(wtr) => wtr.flush(),
        }
    }

    fn write_record<I, T>(&mut self, record: I) -> csv::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        match self {
            Self::File(wtr) => wtr.write_record(record),
            Self::Stdout(wtr) => wtr.write_record(record),
        }
    }
}

/// Writes records as one header row plus one row per record.
#[derive(Debug, Clone, Default)]
pub struct SheetWriter {
    target: SheetTarget,
    dialect: CsvDialect,
}

impl SheetWriter {
    pub fn new(target: SheetTarget) -> Self {
        Self {
            target,
            dialect: CsvDialect::default(),
        }
    }

    pub fn with_dialect(mut self, dialect: CsvDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn target(&self) -> &SheetTarget {
        &self.target
    }

    fn write_csv(&self, records: &[Record]) -> anyhow::Result<()> {
        let builder = self.dialect.builder();
        let mut wtr = match &self.target {
            SheetTarget::Csv(path) => CsvWriter::File(builder.from_writer(fs_err::File::create(path)?)),
            _ => CsvWriter::Stdout(builder.from_writer(io::stdout())),
        };

        wtr.write_record(HEADER)?;
        for record in records {
            wtr.write_record(record_row(record))?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl TabularWriter for SheetWriter {
    fn write(&mut self, records: &[Record]) -> anyhow::Result<()> {
        match &self.target {
            SheetTarget::Xlsx(path) => xlsx::write_workbook(path, records)
                .with_context(|| format!("Couldn't write {}", path.display()))?,
            SheetTarget::Csv(path) => self
                .write_csv(records)
                .with_context(|| format!("Couldn't write {}", path.display()))?,
            SheetTarget::Stdout => self.write_csv(records)?,
        }
        log::info!("Saved {} records to {:?}", records.len(), self.target);
        Ok(())
    }
}
