//! Dashboard view model
//!
//! Read side of the admin dashboard: holds the latest complaint snapshot
//! delivered by the store's watch channel and derives the list, the
//! counters, and the map pins from it. The view never mutates its local
//! copy; a resolve action goes to the store and the refreshed state
//! arrives through the next snapshot.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::error::AppError;
use crate::model::{ComplaintRecord, MarkerColor};
use crate::store::ComplaintStore;

/// Summary counters shown in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub resolved: usize,
    pub pending: usize,
}

impl DashboardStats {
    /// Derive counters from a snapshot. Pending is the complement of
    /// resolved, so the three always add up.
    pub fn from_records(records: &[ComplaintRecord]) -> Self {
        let total = records.len();
        let resolved = records.iter().filter(|r| r.status.is_resolved()).count();
        Self {
            total,
            resolved,
            pending: total - resolved,
        }
    }
}

/// One map marker, colored by status.
#[derive(Debug, Clone, Serialize)]
pub struct MapPin {
    pub id: String,
    #[serde(rename = "complaintId")]
    pub complaint_id: String,
    pub lat: f64,
    pub lng: f64,
    pub color: MarkerColor,
}

impl MapPin {
    pub fn from_record(record: &ComplaintRecord) -> Self {
        Self {
            id: record.id.clone(),
            complaint_id: record.complaint_id.clone(),
            lat: record.lat,
            lng: record.lng,
            color: record.status.marker_color(),
        }
    }
}

/// Live read model over the complaint store.
///
/// Dropping the view model drops its watch receiver, which cancels the
/// subscription.
pub struct DashboardViewModel {
    store: Arc<ComplaintStore>,
    snapshots: watch::Receiver<Vec<ComplaintRecord>>,
}

impl DashboardViewModel {
    pub fn new(store: Arc<ComplaintStore>) -> Self {
        let snapshots = store.subscribe();
        Self { store, snapshots }
    }

    /// Current full snapshot, newest first.
    pub fn snapshot(&self) -> Vec<ComplaintRecord> {
        self.snapshots.borrow().clone()
    }

    /// Counters over the current snapshot.
    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_records(&self.snapshots.borrow())
    }

    /// Map pins for every complaint in the current snapshot.
    pub fn map_pins(&self) -> Vec<MapPin> {
        self.snapshots.borrow().iter().map(MapPin::from_record).collect()
    }

    /// Mark a complaint resolved.
    ///
    /// The local snapshot is left untouched; the updated state arrives via
    /// the watch channel once the store has committed. Returns whether the
    /// status actually changed.
    pub async fn resolve(&self, id: &str) -> Result<bool, AppError> {
        self.store.resolve(id).await
    }

    /// Wait for the next snapshot to land.
    pub async fn changed(&mut self) -> Result<(), AppError> {
        self.snapshots
            .changed()
            .await
            .map_err(|_| AppError::Internal(anyhow::anyhow!("complaint snapshot channel closed")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ComplaintStatus;
    use crate::store::NewComplaint;
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(id: &str, status: ComplaintStatus) -> ComplaintRecord {
        ComplaintRecord {
            id: id.to_string(),
            complaint_id: format!("CF-{:0>6}", id.to_uppercase()),
            name: "Test".to_string(),
            phone: "+91 9876543210".to_string(),
            aadhar: "1234 5678 9012 3456".to_string(),
            description: "desc".to_string(),
            lat: 13.0,
            lng: 80.2,
            images: vec![],
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn stats_counters_always_add_up() {
        let records = vec![
            record("a", ComplaintStatus::Pending),
            record("b", ComplaintStatus::Resolved),
            record("c", ComplaintStatus::Pending),
            record("d", ComplaintStatus::Resolved),
            record("e", ComplaintStatus::Resolved),
        ];

        let stats = DashboardStats::from_records(&records);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.resolved, 3);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.pending + stats.resolved, stats.total);
    }

    #[test]
    fn stats_of_empty_snapshot_are_zero() {
        let stats = DashboardStats::from_records(&[]);
        assert_eq!(
            stats,
            DashboardStats {
                total: 0,
                resolved: 0,
                pending: 0
            }
        );
    }

    #[test]
    fn pin_color_follows_status() {
        let pending = MapPin::from_record(&record("a", ComplaintStatus::Pending));
        let resolved = MapPin::from_record(&record("b", ComplaintStatus::Resolved));
        assert_eq!(pending.color, MarkerColor::Red);
        assert_eq!(resolved.color, MarkerColor::Green);
    }

    async fn create_store() -> (Arc<ComplaintStore>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(
            ComplaintStore::connect(&temp_dir.path().join("test.db"))
                .await
                .unwrap(),
        );
        (store, temp_dir)
    }

    fn new_complaint(complaint_id: &str) -> NewComplaint {
        NewComplaint {
            complaint_id: complaint_id.to_string(),
            name: "Test".to_string(),
            phone: "+91 9876543210".to_string(),
            aadhar: "1234 5678 9012 3456".to_string(),
            description: "Streetlight out".to_string(),
            lat: 13.08,
            lng: 80.27,
            images: vec![],
        }
    }

    #[tokio::test]
    async fn view_tracks_store_through_snapshots() {
        let (store, _temp_dir) = create_store().await;
        let mut view = DashboardViewModel::new(Arc::clone(&store));

        assert!(view.snapshot().is_empty());

        let inserted = store.insert(new_complaint("CF-VIEW01")).await.unwrap();
        view.changed().await.unwrap();
        assert_eq!(view.snapshot().len(), 1);
        assert_eq!(view.stats().pending, 1);

        assert!(view.resolve(&inserted.id).await.unwrap());
        view.changed().await.unwrap();

        let stats = view.stats();
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.pending, 0);

        let pins = view.map_pins();
        assert_eq!(pins.len(), 1);
        assert_eq!(pins[0].color, MarkerColor::Green);
    }
}
