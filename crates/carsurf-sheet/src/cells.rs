use carsurf_crawler::{Record, SummaryEntry};

pub const HEADER: [&str; 4] = ["Names", "Price", "Vehicle Summary", "Vehicle Options"];

/// `['Mileage':'42,100','Transmission':'Automatic']`
pub fn summary_cell(summary: &[SummaryEntry]) -> String {
    let pairs: Vec<String> = summary
        .iter()
        .map(|e| format!("'{}':'{}'", e.key, e.value))
        .collect();
    format!("[{}]", pairs.join(","))
}

/// `['Sunroof','Heated Seats']`
pub fn options_cell(options: &[String]) -> String {
    let quoted: Vec<String> = options.iter().map(|o| format!("'{o}'")).collect();
    format!("[{}]", quoted.join(","))
}

pub fn record_row(record: &Record) -> [String; 4] {
    [
        record.name().to_string(),
        record.price().to_string(),
        summary_cell(record.summary()),
        options_cell(record.options()),
    ]
}
