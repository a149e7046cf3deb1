use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::KeyValueStore;
use crate::models::{Delta, Subject, Threshold, Update};

pub const STORAGE_KEY: &str = "attendanceSubjects";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no subject #{position} (store holds {len})", position = .index + 1)]
    UnknownSubject { index: usize, len: usize },
    #[error("subject name must not be blank{}", csv_row_suffix(.row))]
    BlankName { row: Option<usize> },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored subjects are not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn csv_row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" (csv row {r})")).unwrap_or_default()
}

/// Ordered subjects plus the backend they are persisted to.
pub struct SubjectStore {
    backend: KeyValueStore,
    subjects: Vec<Subject>,
}

impl SubjectStore {
    pub async fn load(backend: KeyValueStore) -> Result<Self, StoreError> {
        let subjects = match backend.get(STORAGE_KEY).await? {
            Some(bytes) => serde_json::from_slice(&bytes)?,
            None => Vec::new(),
        };
        info!(count = subjects.len(), "loaded subjects");
        Ok(Self { backend, subjects })
    }

    pub async fn save(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&self.subjects)?;
        self.backend.put(STORAGE_KEY, &bytes).await?;
        info!(count = self.subjects.len(), "saved subjects");
        Ok(())
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn add(&mut self, name: &str, min_percentage: Threshold) -> Result<&Subject, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::BlankName { row: None });
        }
        self.subjects.push(Subject::new(name, min_percentage));
        debug!(name, %min_percentage, "added subject");
        Ok(&self.subjects[self.subjects.len() - 1])
    }

    pub fn extend(&mut self, subjects: Vec<Subject>) -> usize {
        let added = subjects.len();
        self.subjects.extend(subjects);
        added
    }

    /// Applies one counter change. Decrementing a zero counter leaves it at zero.
    pub fn apply(&mut self, update: Update) -> Result<&Subject, StoreError> {
        let subject = self.get_mut(update.index)?;
        let counter = subject.counter_mut(update.field);
        *counter = match update.delta {
            Delta::Increment => counter.saturating_add(1),
            Delta::Decrement => counter.saturating_sub(1),
        };
        subject.updated_at = Utc::now();
        debug!(?update, attended = subject.attended, missed = subject.missed, "applied update");
        Ok(subject)
    }

    pub fn rename(&mut self, index: usize, name: &str) -> Result<&Subject, StoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::BlankName { row: None });
        }
        let subject = self.get_mut(index)?;
        subject.name = name.to_string();
        subject.updated_at = Utc::now();
        Ok(subject)
    }

    pub fn set_goal(&mut self, index: usize, min_percentage: Threshold) -> Result<&Subject, StoreError> {
        let subject = self.get_mut(index)?;
        subject.min_percentage = min_percentage;
        subject.updated_at = Utc::now();
        Ok(subject)
    }

    pub fn remove(&mut self, index: usize) -> Result<Subject, StoreError> {
        self.check_index(index)?;
        Ok(self.subjects.remove(index))
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Subject, StoreError> {
        self.check_index(index)?;
        Ok(&mut self.subjects[index])
    }

    fn check_index(&self, index: usize) -> Result<(), StoreError> {
        if index >= self.subjects.len() {
            return Err(StoreError::UnknownSubject {
                index,
                len: self.subjects.len(),
            });
        }
        Ok(())
    }
}
