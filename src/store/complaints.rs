//! Complaint document store
//!
//! SQLite-backed collection of complaint records. All mutation goes through
//! this module; every successful write re-queries the ordered collection and
//! publishes the full result set on a watch channel, so subscribers always
//! receive a complete snapshot (never a delta). Dropping the receiver cancels
//! the subscription.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::watch;

use crate::error::AppError;
use crate::model::{ComplaintRecord, ComplaintStatus};

/// Fields supplied by the submission workflow when creating a record.
///
/// `created_at` and the document id are assigned here, not by the caller:
/// the store clock is the single source of feed ordering.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub complaint_id: String,
    pub name: String,
    pub phone: String,
    pub aadhar: String,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    /// Resolvable image URLs in capture order
    pub images: Vec<String>,
}

/// Raw row shape; validated into [`ComplaintRecord`] at the read boundary.
#[derive(sqlx::FromRow)]
struct ComplaintRow {
    id: String,
    complaint_id: String,
    name: String,
    phone: String,
    aadhar: String,
    description: String,
    lat: f64,
    lng: f64,
    images: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ComplaintRow> for ComplaintRecord {
    type Error = AppError;

    fn try_from(row: ComplaintRow) -> Result<Self, AppError> {
        let status = ComplaintStatus::parse(&row.status).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "unknown status {:?} on complaint {}",
                row.status,
                row.id
            ))
        })?;

        let images: Vec<String> = serde_json::from_str(&row.images).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "invalid image list on complaint {}: {}",
                row.id,
                e
            ))
        })?;

        Ok(ComplaintRecord {
            id: row.id,
            complaint_id: row.complaint_id,
            name: row.name,
            phone: row.phone,
            aadhar: row.aadhar,
            description: row.description,
            lat: row.lat,
            lng: row.lng,
            images,
            status,
            created_at: row.created_at,
        })
    }
}

/// Complaint collection with snapshot-replace change notification.
pub struct ComplaintStore {
    pool: SqlitePool,
    snapshot_tx: watch::Sender<Vec<ComplaintRecord>>,
}

impl ComplaintStore {
    /// Connect to the complaint database.
    ///
    /// Creates the database file if it doesn't exist and runs pending
    /// migrations. The initial snapshot is published on connect so a
    /// subscriber sees the current collection immediately.
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            tracing::error!("Migration failed: {}", e);
            AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
        })?;

        let (snapshot_tx, _) = watch::channel(Vec::new());
        let store = Self { pool, snapshot_tx };

        let initial = store.list().await?;
        store.snapshot_tx.send_replace(initial);

        tracing::info!("Complaint store connected and migrated");
        Ok(store)
    }

    /// Subscribe to collection changes.
    ///
    /// Each delivery carries the full ordered result set; consumers must
    /// treat it as a total replace. Dropping the receiver cancels the
    /// subscription.
    pub fn subscribe(&self) -> watch::Receiver<Vec<ComplaintRecord>> {
        self.snapshot_tx.subscribe()
    }

    /// Insert a new complaint with status `Pending`.
    ///
    /// The document id and `created_at` are assigned here (store clock,
    /// not the submitting client's).
    pub async fn insert(&self, new: NewComplaint) -> Result<ComplaintRecord, AppError> {
        let record = ComplaintRecord {
            id: ulid::Ulid::new().to_string(),
            complaint_id: new.complaint_id,
            name: new.name,
            phone: new.phone,
            aadhar: new.aadhar,
            description: new.description,
            lat: new.lat,
            lng: new.lng,
            images: new.images,
            status: ComplaintStatus::Pending,
            created_at: Utc::now(),
        };

        let images_json = serde_json::to_string(&record.images)
            .map_err(|e| AppError::Internal(e.into()))?;

        sqlx::query(
            r#"
            INSERT INTO complaints (
                id, complaint_id, name, phone, aadhar, description,
                lat, lng, images, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.complaint_id)
        .bind(&record.name)
        .bind(&record.phone)
        .bind(&record.aadhar)
        .bind(&record.description)
        .bind(record.lat)
        .bind(record.lng)
        .bind(&images_json)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        self.publish_snapshot().await?;

        Ok(record)
    }

    /// All complaints ordered by creation time, newest first.
    pub async fn list(&self) -> Result<Vec<ComplaintRecord>, AppError> {
        let rows = sqlx::query_as::<_, ComplaintRow>(
            "SELECT * FROM complaints ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ComplaintRecord::try_from).collect()
    }

    /// Look up by document id.
    pub async fn get(&self, id: &str) -> Result<Option<ComplaintRecord>, AppError> {
        let row = sqlx::query_as::<_, ComplaintRow>("SELECT * FROM complaints WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ComplaintRecord::try_from).transpose()
    }

    /// Look up by the human-shareable `CF-XXXXXX` identifier.
    pub async fn get_by_complaint_id(
        &self,
        complaint_id: &str,
    ) -> Result<Option<ComplaintRecord>, AppError> {
        let row =
            sqlx::query_as::<_, ComplaintRow>("SELECT * FROM complaints WHERE complaint_id = ?")
                .bind(complaint_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(ComplaintRecord::try_from).transpose()
    }

    /// Mark a complaint resolved (single-field status update).
    ///
    /// The transition is one-directional: an already-resolved complaint is
    /// left untouched and the call succeeds. Status never regresses.
    /// Returns `true` when the status actually changed, so callers can
    /// distinguish a transition from an idempotent repeat.
    pub async fn resolve(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE complaints SET status = ? WHERE id = ? AND status = ?")
            .bind(ComplaintStatus::Resolved.as_str())
            .bind(id)
            .bind(ComplaintStatus::Pending.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            // Either unknown id or already resolved; only the former is an error.
            if self.get(id).await?.is_none() {
                return Err(AppError::NotFound);
            }
            return Ok(false);
        }

        self.publish_snapshot().await?;
        Ok(true)
    }

    async fn publish_snapshot(&self) -> Result<(), AppError> {
        let snapshot = self.list().await?;
        self.snapshot_tx.send_replace(snapshot);
        Ok(())
    }
}

/// Map write failures onto the portal's error taxonomy.
///
/// A write rejected because the database is read-only is the store's access
/// policy saying no; everything else stays a generic database error.
fn map_write_error(error: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &error {
        let message = db_err.message().to_ascii_lowercase();
        if message.contains("readonly") || message.contains("read-only") {
            return AppError::Permission(
                "complaint store rejected the write: database is read-only; \
                 fix the database file permissions"
                    .to_string(),
            );
        }
    }
    AppError::Database(error)
}
