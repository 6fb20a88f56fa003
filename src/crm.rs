//! Mini-CRM for event ticket sales: loads clients, events and sales from
//! semicolon-delimited CSV files, indexes them by id, and reports on them.

pub mod config;
pub mod dataset;
pub mod error;
pub mod index;
pub mod loader;
pub mod records;
pub mod report;
pub mod session;
pub mod stats;

pub use config::DataPaths;
pub use dataset::{Dataset, SaleLine, UNKNOWN};
pub use error::{CrmError, RowError};
pub use records::{Client, ClientDraft, Event, Sale};
pub use report::{export_report, ReportRow};
pub use session::Session;
pub use stats::{PriceSummary, Statistics};
