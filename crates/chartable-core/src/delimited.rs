//! Delimited (CSV/TSV) text in and out.

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use chartable_model::{CellValue, DelimitedOptions, ErrorRendering, ParseOptions, Result, Row, TableError};

/// Header and rows read from delimited text. Cells are kept as text; kinds
/// parse them later.
#[derive(Debug, Clone, Default)]
pub struct DelimitedText {
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

fn normalize_cell(raw: &str, trim: bool) -> String {
    let stripped = raw.trim_matches('\u{feff}');
    if trim {
        stripped.trim().to_string()
    } else {
        stripped.to_string()
    }
}

/// Tab when the header line has more tabs than commas, else comma.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or_default();
    let tabs = header.matches('\t').count();
    let commas = header.matches(',').count();
    if tabs > commas { b'\t' } else { b',' }
}

fn delimited_error(error: &csv::Error) -> TableError {
    TableError::Delimited {
        message: error.to_string(),
    }
}

/// Read `text` into a header and rows.
///
/// Blank text gives no headers and no rows. Records shorter than the header
/// leave the trailing cells undefined; extra fields are dropped.
pub fn parse_delimited(text: &str, options: &ParseOptions) -> Result<DelimitedText> {
    if text.trim().is_empty() {
        return Ok(DelimitedText::default());
    }
    let delimiter = options.delimiter.unwrap_or_else(|| sniff_delimiter(text));
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| delimited_error(&e))?
            .iter()
            .map(|cell| normalize_cell(cell, true))
            .collect(),
        None => return Ok(DelimitedText::default()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| delimited_error(&e))?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| {
                (
                    header.clone(),
                    CellValue::Text(normalize_cell(cell, options.trim)),
                )
            })
            .collect();
        rows.push(row);
    }
    tracing::debug!(
        columns = headers.len(),
        rows = rows.len(),
        delimiter = %char::from(delimiter).escape_default(),
        "parsed delimited text"
    );
    Ok(DelimitedText { headers, rows })
}

/// Render one cell for export.
pub fn export_cell(cell: &CellValue, errors: ErrorRendering) -> String {
    match (cell, errors) {
        (CellValue::Error(error), ErrorRendering::Name) => error.error_string().to_string(),
        _ => cell.to_plain_string(),
    }
}

/// Write a header and records as delimited text, quoting only where needed.
pub fn write_delimited<'a, I>(header: &[String], records: I, options: &DelimitedOptions) -> Result<String>
where
    I: IntoIterator<Item = Vec<&'a CellValue>>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(header).map_err(|e| delimited_error(&e))?;
    for record in records {
        let fields: Vec<String> = record
            .into_iter()
            .map(|cell| export_cell(cell, options.errors))
            .collect();
        writer.write_record(&fields).map_err(|e| delimited_error(&e))?;
    }
    let bytes = writer.into_inner().map_err(|e| TableError::Delimited {
        message: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| TableError::Delimited {
        message: e.to_string(),
    })
}
