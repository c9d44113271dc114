use chrono::Local;
use shared::{HistoryItem, SaveHistoryRequest};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("History lock poisoned")]
    Poisoned,
}

/// Saved analysis summaries, newest first.
pub trait HistoryRepository: Send + Sync {
    fn insert(&self, request: SaveHistoryRequest) -> Result<HistoryItem, HistoryError>;
    fn list(&self) -> Result<Vec<HistoryItem>, HistoryError>;
}

pub fn new_history_item(request: SaveHistoryRequest) -> HistoryItem {
    HistoryItem {
        id: Uuid::new_v4(),
        date: Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        prediction: request.prediction,
        confidence: request.confidence,
        risk: request.risk,
        thumbnail_url: request.thumbnail_url,
    }
}

pub struct InMemoryHistory {
    items: Mutex<VecDeque<HistoryItem>>,
    capacity: usize,
}

impl InMemoryHistory {
    pub fn new(capacity: usize) -> Self {
        Self::with_items(Vec::new(), capacity)
    }

    fn with_items(items: Vec<HistoryItem>, capacity: usize) -> Self {
        let mut items: VecDeque<HistoryItem> = items.into();
        items.truncate(capacity);
        Self {
            items: Mutex::new(items),
            capacity,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, VecDeque<HistoryItem>>, HistoryError> {
        self.items.lock().map_err(|_| HistoryError::Poisoned)
    }

    fn push_front(items: &mut VecDeque<HistoryItem>, item: HistoryItem, capacity: usize) {
        items.push_front(item);
        while items.len() > capacity {
            if let Some(evicted) = items.pop_back() {
                log::debug!("Evicted history item {}", evicted.id);
            }
        }
    }
}

impl HistoryRepository for InMemoryHistory {
    fn insert(&self, request: SaveHistoryRequest) -> Result<HistoryItem, HistoryError> {
        let item = new_history_item(request);
        let mut items = self.lock()?;
        Self::push_front(&mut items, item.clone(), self.capacity);
        Ok(item)
    }

    fn list(&self) -> Result<Vec<HistoryItem>, HistoryError> {
        Ok(self.lock()?.iter().cloned().collect())
    }
}

/// Bounded history persisted as a JSON array, rewritten after every insert.
pub struct JsonFileHistory {
    inner: InMemoryHistory,
    path: PathBuf,
}

impl JsonFileHistory {
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Result<Self, HistoryError> {
        let path = path.into();
        let items = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            Vec::new()
        };
        log::info!(
            "Loaded {} history item(s) from {}",
            items.len(),
            path.display()
        );
        Ok(Self {
            inner: InMemoryHistory::with_items(items, capacity),
            path,
        })
    }

    fn persist(path: &Path, items: &VecDeque<HistoryItem>) -> Result<(), HistoryError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl HistoryRepository for JsonFileHistory {
    fn insert(&self, request: SaveHistoryRequest) -> Result<HistoryItem, HistoryError> {
        let item = new_history_item(request);
        let mut items = self.inner.lock()?;
        let mut updated = items.clone();
        InMemoryHistory::push_front(&mut updated, item.clone(), self.inner.capacity);
        Self::persist(&self.path, &updated)?;
        *items = updated;
        Ok(item)
    }

    fn list(&self) -> Result<Vec<HistoryItem>, HistoryError> {
        self.inner.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::RiskLevel;

    fn request(prediction: &str) -> SaveHistoryRequest {
        SaveHistoryRequest {
            prediction: prediction.to_string(),
            confidence: 90,
            risk: RiskLevel::Medium,
            thumbnail_url: "blob:thumb".to_string(),
        }
    }

    #[test]
    fn newest_item_comes_first() {
        let history = InMemoryHistory::new(10);
        history.insert(request("first")).unwrap();
        let second = history.insert(request("second")).unwrap();

        let items = history.list().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], second);
        assert_eq!(items[1].prediction, "first");
    }

    #[test]
    fn capacity_evicts_oldest() {
        let history = InMemoryHistory::new(2);
        for name in ["a", "b", "c"] {
            history.insert(request(name)).unwrap();
        }
        let names: Vec<String> = history
            .list()
            .unwrap()
            .into_iter()
            .map(|item| item.prediction)
            .collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn items_get_id_and_timestamp() {
        let item = new_history_item(request("x"));
        assert_eq!(item.date.len(), "2025-04-05T10:30:00".len());
        assert!(chrono::NaiveDateTime::parse_from_str(&item.date, "%Y-%m-%dT%H:%M:%S").is_ok());
        assert_eq!(item.id.get_version_num(), 4);
    }

    #[test]
    fn file_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("history.json");

        let history = JsonFileHistory::open(&path, 5).unwrap();
        assert!(history.list().unwrap().is_empty());
        history.insert(request("saved")).unwrap();
        drop(history);

        let reopened = JsonFileHistory::open(&path, 5).unwrap();
        let items = reopened.list().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].prediction, "saved");
        assert_eq!(items[0].risk, RiskLevel::Medium);
    }

    #[test]
    fn reopen_trims_to_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");

        let history = JsonFileHistory::open(&path, 10).unwrap();
        for name in ["a", "b", "c"] {
            history.insert(request(name)).unwrap();
        }

        let reopened = JsonFileHistory::open(&path, 2).unwrap();
        let names: Vec<String> = reopened
            .list()
            .unwrap()
            .into_iter()
            .map(|item| item.prediction)
            .collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileHistory::open(&path, 5),
            Err(HistoryError::Serialization(_))
        ));
    }
}
