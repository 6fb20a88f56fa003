use crate::config::DataPaths;
use crate::dataset::{append_client, next_id, Dataset};
use crate::error::CrmError;
use crate::loader::load_file;
use crate::records::{Client, ClientDraft};

/// Interactive session state: unloaded until the first `load`.
#[derive(Debug)]
pub struct Session {
    paths: DataPaths,
    dataset: Option<Dataset>,
}

impl Session {
    pub fn new(paths: DataPaths) -> Self {
        Session {
            paths,
            dataset: None,
        }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// `None` until data has been loaded.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Replaces any previous dataset with a fresh read of the data files.
    pub fn load(&mut self) -> Result<&Dataset, CrmError> {
        let dataset = Dataset::load(&self.paths)?;
        Ok(&*self.dataset.insert(dataset))
    }

    /// Validates `draft`, persists it and, when data is loaded, adds it to the dataset.
    pub fn create_client(&mut self, draft: ClientDraft) -> Result<Client, CrmError> {
        let id = match &self.dataset {
            Some(dataset) => dataset.next_client_id()?,
            None => next_id(&load_file::<Client>(&self.paths.clients()))?,
        };
        let client = draft.into_client(id)?;
        self.paths.ensure_data_dir()?;
        append_client(&self.paths.clients(), &client)?;
        if let Some(dataset) = self.dataset.as_mut() {
            dataset.add_client(client.clone());
        }
        Ok(client)
    }
}
