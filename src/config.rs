//! Location of the CSV files a session reads and writes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const CLIENTS_FILENAME: &str = "clientes.csv";
pub const EVENTS_FILENAME: &str = "eventos.csv";
pub const SALES_FILENAME: &str = "ventas.csv";
pub const REPORT_FILENAME: &str = "informe_resumen.csv";

pub const DEFAULT_DATA_DIR: &str = "./data";

#[derive(Debug, Clone)]
pub struct DataPaths {
    data_dir: PathBuf,
}

impl DataPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        DataPaths {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn clients(&self) -> PathBuf {
        self.data_dir.join(CLIENTS_FILENAME)
    }

    pub fn events(&self) -> PathBuf {
        self.data_dir.join(EVENTS_FILENAME)
    }

    pub fn sales(&self) -> PathBuf {
        self.data_dir.join(SALES_FILENAME)
    }

    pub fn report(&self) -> PathBuf {
        self.data_dir.join(REPORT_FILENAME)
    }

    pub fn ensure_data_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths::new(DEFAULT_DATA_DIR)
    }
}
