//! Reader for the annotated CSV returned by InfluxDB's `/api/v2/query`.
//!
//! The body is a sequence of blocks separated by blank lines. Each block
//! starts with `#datatype`/`#group`/`#default` annotation rows, then a
//! header row, then data rows whose `table` column identifies the result
//! table the row belongs to. Query failures that happen after the HTTP
//! status was sent show up as a block with an `error` column.

use chrono::{DateTime, Utc};

use super::{FluxRecord, FluxTable};
use crate::error::StoreError;

/// Positions of the columns the gateway reads.
#[derive(Debug, Default)]
struct Columns {
    table: Option<usize>,
    time: Option<usize>,
    field: Option<usize>,
    value: Option<usize>,
    measurement: Option<usize>,
    error: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[String]) -> Self {
        let find = |name: &str| cells.iter().position(|c| c == name);
        Self {
            table: find("table"),
            time: find("_time"),
            field: find("_field"),
            value: find("_value"),
            measurement: find("_measurement"),
            error: find("error"),
        }
    }
}

/// Parses an annotated CSV body into tables, preserving row order.
///
/// Rows with an empty `_value` are skipped.
///
/// # Errors
///
/// Returns [`StoreError::Query`] for an in-band error block and
/// [`StoreError::Csv`] when a data row is missing a required column or
/// holds an unparsable timestamp or number.
pub fn parse(body: &str) -> Result<Vec<FluxTable>, StoreError> {
    let mut tables: Vec<FluxTable> = Vec::new();
    let mut columns: Option<Columns> = None;

    for (line_no, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            columns = None;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let cells = split_line(line);
        let Some(cols) = &columns else {
            columns = Some(Columns::from_header(&cells));
            continue;
        };

        if let Some(message) = cols.error.and_then(|i| cells.get(i)) {
            if !message.is_empty() {
                return Err(StoreError::Query(message.clone()));
            }
            continue;
        }

        let cell = |idx: Option<usize>, name: &str| {
            idx.and_then(|i| cells.get(i))
                .map(String::as_str)
                .ok_or_else(|| StoreError::Csv(format!("line {}: missing {name}", line_no + 1)))
        };

        let value = cell(cols.value, "_value")?;
        if value.is_empty() {
            continue;
        }
        let value: f64 = value
            .parse()
            .map_err(|_| StoreError::Csv(format!("line {}: bad _value {value:?}", line_no + 1)))?;

        let time = cell(cols.time, "_time")?;
        let time = DateTime::parse_from_rfc3339(time)
            .map_err(|e| StoreError::Csv(format!("line {}: bad _time {time:?}: {e}", line_no + 1)))?
            .with_timezone(&Utc);

        let field = cell(cols.field, "_field")?.to_string();
        let measurement = cols
            .measurement
            .and_then(|i| cells.get(i))
            .cloned()
            .unwrap_or_default();
        let table_id: u64 = cell(cols.table, "table")?
            .parse()
            .map_err(|_| StoreError::Csv(format!("line {}: bad table id", line_no + 1)))?;

        let record = FluxRecord {
            time,
            field,
            measurement,
            value,
        };
        match tables.last_mut() {
            Some(table) if table.id == table_id => table.records.push(record),
            _ => tables.push(FluxTable {
                id: table_id,
                records: vec![record],
            }),
        }
    }

    Ok(tables)
}

/// Splits one CSV line, honouring double-quoted cells with `""` escapes.
fn split_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    cells.push(current);
    cells
}
