use crate::error::{DashError, Result};
use crate::models::Dataset;

/// Canonical dataset for one session.
#[derive(Debug, Default)]
pub struct DatasetStore {
    dataset: Option<Dataset>,
    revision: u64,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Result<&Dataset> {
        self.dataset.as_ref().ok_or(DashError::Uninitialized)
    }

    /// Seed the store unless a dataset already exists. Returns true when the
    /// seed function actually ran.
    pub fn initialize_if_absent<F>(&mut self, seed: F) -> bool
    where
        F: FnOnce() -> Dataset,
    {
        if self.dataset.is_some() {
            return false;
        }
        let dataset = seed();
        log::debug!("seeded session dataset with {} rows", dataset.len());
        self.dataset = Some(dataset);
        true
    }

    pub fn replace(&mut self, dataset: Dataset) {
        self.revision += 1;
        log::debug!(
            "canonical dataset replaced (revision {}, {} rows)",
            self.revision,
            dataset.len()
        );
        self.dataset = Some(dataset);
    }

    /// Number of replacements since the session started.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
