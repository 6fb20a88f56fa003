use crate::error::CrmError;
use crate::records::{Event, Sale};
use crate::stats::revenue_per_event;
use csv::WriterBuilder;
use log::info;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fs::{self, File};
use std::io;
use std::path::Path;

const HEADER: [&str; 3] = ["evento_id", "nombre_evento", "ingresos_totales"];

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub event_id: u32,
    pub event_name: String,
    pub revenue: Decimal,
}

impl Serialize for ReportRow {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ReportRow", 3)?;
        state.serialize_field(HEADER[0], &self.event_id)?;
        state.serialize_field(HEADER[1], &self.event_name)?;
        state.serialize_field(HEADER[2], &format!("{:.2}", self.revenue.round_dp(2)))?;
        state.end()
    }
}

/// One row per event with at least one sale, ordered by event id.
pub fn report_rows(events: &[Event], sales: &[Sale]) -> Vec<ReportRow> {
    revenue_per_event(sales)
        .into_iter()
        .map(|(event_id, revenue)| ReportRow {
            event_id,
            event_name: events
                .iter()
                .find(|e| e.id == event_id)
                .map(|e| e.name.clone())
                .unwrap_or_else(|| format!("Event {event_id}")),
            revenue,
        })
        .collect()
}

pub fn write_report<T: io::Write>(rows: &[ReportRow], target: T) -> Result<(), CrmError> {
    let mut writer = WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .from_writer(target);
    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Overwrites `path` with the per-event revenue report. Returns the row count.
pub fn export_report(events: &[Event], sales: &[Sale], path: &Path) -> Result<usize, CrmError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let rows = report_rows(events, sales);
    write_report(&rows, File::create(path)?)?;
    info!("report with {} rows written to {}", rows.len(), path.display());
    Ok(rows.len())
}

#[cfg(test)]
use chrono::NaiveDate;
#[cfg(test)]
use rust_decimal_macros::dec;

#[cfg(test)]
fn sale(id: u32, event_id: u32, quantity: u32, unit_price: Decimal) -> Sale {
    Sale {
        id,
        client_id: 1,
        event_id,
        sale_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        quantity,
        unit_price,
    }
}

#[test]
fn concert_report() {
    let events = vec![Event {
        id: 1,
        name: "Concert".into(),
        category: "Music".into(),
        event_date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
        price: dec!(50.0),
    }];
    let sales = vec![sale(1, 1, 2, dec!(50.0))];

    let mut output = Vec::new();
    write_report(&report_rows(&events, &sales), &mut output).unwrap();
    assert_eq!(output, b"evento_id;nombre_evento;ingresos_totales\n1;Concert;100.00\n");
}

#[test]
fn unsold_events_are_omitted_and_unknown_ones_labelled() {
    let events = vec![
        Event {
            id: 1,
            name: "Quiet".into(),
            category: "Talk".into(),
            event_date: NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            price: dec!(5),
        },
        Event {
            id: 2,
            name: "Fair".into(),
            category: "Expo".into(),
            event_date: NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
            price: dec!(3.333),
        },
    ];
    let sales = vec![sale(1, 4, 1, dec!(12)), sale(2, 2, 3, dec!(3.333))];

    let rows = report_rows(&events, &sales);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].event_name, "Fair");
    assert_eq!(rows[1].event_name, "Event 4");

    let mut output = Vec::new();
    write_report(&rows, &mut output).unwrap();
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "evento_id;nombre_evento;ingresos_totales\n2;Fair;10.00\n4;Event 4;12.00\n"
    );
}
