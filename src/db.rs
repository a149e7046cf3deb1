use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, info};

use crate::models::{Subject, Threshold};
use crate::store::StoreError;

/// Byte storage addressed by string keys.
#[derive(Debug, Clone)]
pub enum KeyValueStore {
    File { dir: PathBuf },
    Postgres(PgPool),
}

impl KeyValueStore {
    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::File { dir: dir.into() }
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self {
            Self::File { dir } => {
                let path = entry_path(dir, key);
                match tokio::fs::read(&path).await {
                    Ok(bytes) => {
                        debug!(path = %path.display(), bytes = bytes.len(), "read entry");
                        Ok(Some(bytes))
                    }
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
                    Err(err) => Err(err.into()),
                }
            }
            Self::Postgres(pool) => {
                let row = sqlx::query(
                    "SELECT value, updated_at FROM attendance_tracker.kv_entries WHERE key = $1",
                )
                .bind(key)
                .fetch_optional(pool)
                .await?;

                Ok(row.map(|row| {
                    let updated_at: DateTime<Utc> = row.get("updated_at");
                    debug!(key, %updated_at, "read entry");
                    row.get("value")
                }))
            }
        }
    }

    pub async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        match self {
            Self::File { dir } => {
                tokio::fs::create_dir_all(dir).await?;
                let path = entry_path(dir, key);
                let staging = path.with_extension("json.tmp");
                tokio::fs::write(&staging, value).await?;
                tokio::fs::rename(&staging, &path).await?;
                debug!(path = %path.display(), bytes = value.len(), "wrote entry");
            }
            Self::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO attendance_tracker.kv_entries (key, value, updated_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT (key) DO UPDATE
                    SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
                    "#,
                )
                .bind(key)
                .bind(value)
                .execute(pool)
                .await?;
                debug!(key, bytes = value.len(), "wrote entry");
            }
        }
        Ok(())
    }
}

fn entry_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("migrations applied");
    Ok(())
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CsvRow {
    name: String,
    min_percentage: Threshold,
    #[serde(default)]
    attended: u32,
    #[serde(default)]
    missed: u32,
}

/// Reads subjects from CSV. Rows with a blank name are rejected.
pub fn read_csv(csv_path: &Path) -> Result<Vec<Subject>, StoreError> {
    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut subjects = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result?;
        let name = row.name.trim();
        if name.is_empty() {
            return Err(StoreError::BlankName { row: Some(line + 1) });
        }
        let mut subject = Subject::new(name, row.min_percentage);
        subject.attended = row.attended;
        subject.missed = row.missed;
        subjects.push(subject);
    }

    Ok(subjects)
}

pub fn write_csv(csv_path: &Path, subjects: &[Subject]) -> Result<usize, StoreError> {
    let mut writer = csv::Writer::from_path(csv_path)?;
    for subject in subjects {
        writer.serialize(CsvRow {
            name: subject.name.clone(),
            min_percentage: subject.min_percentage,
            attended: subject.attended,
            missed: subject.missed,
        })?;
    }
    writer.flush()?;
    Ok(subjects.len())
}

#[cfg(test)]
pub(crate) fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("attendance-tracker-{label}-{}", uuid::Uuid::new_v4()))
}
