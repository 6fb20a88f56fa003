use crate::error::RowError;
use crate::records::Record;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, error, warn};
use std::fs::File;
use std::io;
use std::path::Path;

/// Treats a row as a header when any cell mentions an id or a name column.
///
/// This is a heuristic: a data row whose text happens to contain "id"
/// (an email such as `sid@example.com`, a name like "David") is mistaken
/// for a header when it is the first row of the file.
pub fn looks_like_header(row: &StringRecord) -> bool {
    row.iter().any(|cell| {
        let cell = cell.to_lowercase();
        cell.contains("id") || cell.contains("nombre") || cell.contains("name")
    })
}

fn parse_row<T: Record>(row: &StringRecord) -> Result<T, RowError> {
    if row.len() != T::FIELDS {
        return Err(RowError::FieldCount {
            expected: T::FIELDS,
            found: row.len(),
        });
    }
    let record: T = row.deserialize(None)?;
    record.validate()?;
    Ok(record)
}

/// Parses semicolon-delimited rows into records, in source order.
///
/// Rows that do not parse are logged and skipped; duplicates are kept.
pub fn read_records<T: Record, R: io::Read>(source: R) -> Vec<T> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'"')
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(source);

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(err) if err.is_io_error() => {
                error!("aborting read after I/O failure: {}", err);
                break;
            }
            Err(err) => {
                warn!("row {} could not be read, will be skipped: {}", index + 1, err);
                continue;
            }
        };
        if index == 0 && looks_like_header(&row) {
            debug!("skipping header row {:?}", row);
            continue;
        }
        match parse_row::<T>(&row) {
            Ok(record) => records.push(record),
            Err(err) => warn!("row {} {:?} will be skipped: {}", index + 1, row, err),
        }
    }
    records
}

/// Reads a record file; a missing or unreadable file yields no records.
pub fn load_file<T: Record>(path: &Path) -> Vec<T> {
    match File::open(path) {
        Ok(file) => read_records(file),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            warn!("{} not found, nothing loaded from it", path.display());
            Vec::new()
        }
        Err(err) => {
            error!("could not open {}: {}", path.display(), err);
            Vec::new()
        }
    }
}

#[cfg(test)]
use crate::records::{Client, Event, Sale};
#[cfg(test)]
use rust_decimal_macros::dec;

#[test]
fn skips_exactly_one_header_row() {
    let data = "id;nombre;email;fecha_alta;activo\n\
                1;Ana;ana@example.com;2024-01-05;1\n\
                2;Luis;luis@example.com;2024-02-10;0\n";
    let clients: Vec<Client> = read_records(data.as_bytes());
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].name, "Ana");
    assert!(clients[0].active);
    assert!(!clients[1].active);
}

#[test]
fn headerless_file_keeps_first_row() {
    let data = "1;Concert;Music;2024-06-01;50.0\n2;Play;Theatre;2024-07-01;20\n";
    let events: Vec<Event> = read_records(data.as_bytes());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].price, dec!(50.0));
    assert_eq!(events[1].category, "Theatre");
}

#[test]
fn header_only_matches_on_the_first_row() {
    let data = "1;Ana;ana@example.com;2024-01-05;1\n\
                2;David;david@example.com;2024-01-06;1\n";
    let clients: Vec<Client> = read_records(data.as_bytes());
    assert_eq!(clients.len(), 2);
}

#[test]
fn malformed_rows_are_skipped() {
    let data = "1;1;1;2024-03-01;2;50.0\n\
                2;1;1;2024-03-01;2\n\
                3;1;x;2024-03-01;2;50.0\n\
                4;1;1;01/03/2024;2;50.0\n\
                5;1;1;2024-03-01;0;50.0\n\
                6;1;1;2024-03-01;1;-5\n\
                7;2;1;2024-03-02;1;50.0\n";
    let sales: Vec<Sale> = read_records(data.as_bytes());
    let ids: Vec<u32> = sales.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 7]);
}

#[test]
fn overflowing_sale_total_is_skipped() {
    let data = "1;1;1;2024-03-01;2;79228162514264337593543950335\n\
                2;1;1;2024-03-01;1;79228162514264337593543950335\n";
    let sales: Vec<Sale> = read_records(data.as_bytes());
    let ids: Vec<u32> = sales.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![2]);
}

#[test]
fn quoted_cells_and_duplicates_survive() {
    let data = "1;\"Rock; Live\";Music;2024-06-01;50\n1;Again;Music;2024-06-02;10\n";
    let events: Vec<Event> = read_records(data.as_bytes());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].name, "Rock; Live");
    assert_eq!(events[1].name, "Again");
}

#[test]
fn missing_file_loads_nothing() {
    let path = std::env::temp_dir().join("crm-loader-missing/does-not-exist.csv");
    let clients: Vec<Client> = load_file(&path);
    assert!(clients.is_empty());
}
