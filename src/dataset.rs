use crate::config::DataPaths;
use crate::error::CrmError;
use crate::index::Index;
use crate::loader::load_file;
use crate::records::{Client, Event, Sale};
use crate::stats::Statistics;
use chrono::NaiveDate;
use csv::WriterBuilder;
use log::info;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Display stand-in for a client or event id with no matching record.
pub const UNKNOWN: &str = "?";

/// Clients, events and sales loaded together, with their id indexes.
#[derive(Debug, Clone)]
pub struct Dataset {
    clients: Vec<Client>,
    events: Vec<Event>,
    sales: Vec<Sale>,
    client_index: Index<Client>,
    event_index: Index<Event>,
}

impl Dataset {
    pub fn new(clients: Vec<Client>, events: Vec<Event>, sales: Vec<Sale>) -> Self {
        Dataset {
            client_index: Index::build(&clients),
            event_index: Index::build(&events),
            clients,
            events,
            sales,
        }
    }

    /// Reads all three files; missing files and bad rows leave gaps, not errors.
    pub fn load(paths: &DataPaths) -> Result<Self, CrmError> {
        paths.ensure_data_dir()?;
        let dataset = Dataset::new(
            load_file(&paths.clients()),
            load_file(&paths.events()),
            load_file(&paths.sales()),
        );
        info!(
            "loaded {} clients, {} events, {} sales",
            dataset.clients.len(),
            dataset.events.len(),
            dataset.sales.len()
        );
        Ok(dataset)
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn sales(&self) -> &[Sale] {
        &self.sales
    }

    pub fn client(&self, id: u32) -> Option<&Client> {
        self.client_index.get(&self.clients, id)
    }

    pub fn event(&self, id: u32) -> Option<&Event> {
        self.event_index.get(&self.events, id)
    }

    pub fn client_name(&self, id: u32) -> &str {
        self.client(id).map_or(UNKNOWN, |c| c.name.as_str())
    }

    pub fn event_name(&self, id: u32) -> &str {
        self.event(id).map_or(UNKNOWN, |e| e.name.as_str())
    }

    pub fn next_client_id(&self) -> Result<u32, CrmError> {
        next_id(&self.clients)
    }

    pub fn add_client(&mut self, client: Client) {
        self.client_index.insert(client.id, self.clients.len());
        self.clients.push(client);
    }

    pub fn statistics(&self, today: NaiveDate) -> Statistics {
        Statistics::compute(&self.events, &self.sales, today)
    }

    /// Sales dated within `start..=end`, joined with client and event names.
    pub fn sales_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SaleLine<'_>>, CrmError> {
        if end < start {
            return Err(CrmError::InvalidDateRange { start, end });
        }
        Ok(self
            .sales
            .iter()
            .filter(|sale| (start..=end).contains(&sale.sale_date))
            .map(|sale| SaleLine {
                sale,
                client_name: self.client_name(sale.client_id),
                event_name: self.event_name(sale.event_id),
            })
            .collect())
    }
}

/// A sale resolved against the client and event indexes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaleLine<'a> {
    pub sale: &'a Sale,
    pub client_name: &'a str,
    pub event_name: &'a str,
}

impl fmt::Display for SaleLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} -> {} | {:.2}",
            self.sale.sale_date,
            self.client_name,
            self.event_name,
            self.sale.total().round_dp(2)
        )
    }
}

pub(crate) fn next_id(clients: &[Client]) -> Result<u32, CrmError> {
    clients
        .iter()
        .map(|c| c.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or(CrmError::IdsExhausted)
}

pub fn write_client<T: io::Write>(
    target: T,
    client: &Client,
    with_header: bool,
) -> Result<(), CrmError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .has_headers(with_header)
        .from_writer(target);
    writer.serialize(client)?;
    writer.flush()?;
    Ok(())
}

/// Appends one client row, writing the header only when the file is new.
pub fn append_client(path: &Path, client: &Client) -> Result<(), CrmError> {
    let is_new = !path.exists();
    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    // a last row without its newline would merge with the appended one
    if file.metadata()?.len() > 0 {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            file.write_all(b"\n")?;
        }
    }
    write_client(file, client, is_new)?;
    info!("client {} appended to {}", client.id, path.display());
    Ok(())
}

#[cfg(test)]
use crate::loader::read_records;

#[cfg(test)]
fn sample() -> Dataset {
    let clients = read_records(
        "1;Ana;ana@example.com;2024-01-05;1\n2;Luis;luis@example.com;2024-02-10;0\n".as_bytes(),
    );
    let events = read_records("1;Concert;Music;2024-06-01;50\n".as_bytes());
    let sales = read_records(
        "1;1;1;2024-03-01;2;50\n2;2;1;2024-03-05;1;50\n3;7;9;2024-03-05;1;10\n4;1;1;2024-04-01;1;50\n"
            .as_bytes(),
    );
    Dataset::new(clients, events, sales)
}

#[cfg(test)]
fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, crate::records::DATE_FORMAT).unwrap()
}

#[test]
fn range_filter_is_inclusive_and_joined() {
    let dataset = sample();
    let lines = dataset
        .sales_between(day("2024-03-01"), day("2024-03-05"))
        .unwrap();
    let ids: Vec<u32> = lines.iter().map(|l| l.sale.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(lines[1].client_name, "Luis");
    assert_eq!(lines[2].client_name, UNKNOWN);
    assert_eq!(lines[2].event_name, UNKNOWN);
    assert_eq!(lines[0].to_string(), "2024-03-01 | Ana -> Concert | 100.00");
}

#[test]
fn single_day_range() {
    let dataset = sample();
    let lines = dataset
        .sales_between(day("2024-03-05"), day("2024-03-05"))
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.sale.sale_date == day("2024-03-05")));
}

#[test]
fn reversed_range_is_rejected() {
    let dataset = sample();
    let result = dataset.sales_between(day("2024-03-05"), day("2024-03-01"));
    assert!(matches!(result, Err(CrmError::InvalidDateRange { .. })));
}

#[test]
fn added_client_is_indexed() {
    let mut dataset = sample();
    assert_eq!(dataset.next_client_id().unwrap(), 3);
    dataset.add_client(Client {
        id: 3,
        name: "Eva".into(),
        email: "eva@example.com".into(),
        signup_date: day("2024-05-01"),
        active: true,
    });
    assert_eq!(dataset.client_name(3), "Eva");
    assert_eq!(dataset.next_client_id().unwrap(), 4);
}

#[test]
fn client_ids_can_run_out() {
    let mut dataset = sample();
    dataset.add_client(Client {
        id: u32::MAX,
        name: "Last".into(),
        email: "last@example.com".into(),
        signup_date: day("2024-05-01"),
        active: true,
    });
    assert!(matches!(
        dataset.next_client_id(),
        Err(CrmError::IdsExhausted)
    ));
}

#[test]
fn client_row_format() {
    let dataset = sample();
    let mut output = Vec::new();
    write_client(&mut output, &dataset.clients()[1], true).unwrap();
    assert_eq!(
        output,
        b"id;nombre;email;fecha_alta;activo\n2;Luis;luis@example.com;2024-02-10;0\n"
    );
}
