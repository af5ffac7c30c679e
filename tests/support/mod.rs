//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use flagforge::application::cache::{CacheError, FlagCache};
use flagforge::application::flags::FeatureFlagService;
use flagforge::application::notify::{Notifier, NotifierError};
use flagforge::application::pagination::OffsetPage;
use flagforge::application::repos::{FlagsRepo, FlagsWriteRepo, RepoError};
use flagforge::cache::{CacheConfig, FlagStore};
use flagforge::domain::entities::{FeatureFlag, NewFeatureFlag};
use flagforge::domain::types::ChangeStatus;

const CODE_CONSTRAINT: &str = "feature_flags_code_key";

/// Insertion-ordered flag table with operation counters and failure switches.
#[derive(Default)]
pub struct InMemoryFlags {
    rows: Mutex<Vec<FeatureFlag>>,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
    pub code_lookups: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl InMemoryFlags {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reads the stored row directly, bypassing counters.
    pub fn stored(&self, code: &str) -> Option<FeatureFlag> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|flag| flag.code == code)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn writes(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.deletes.load(Ordering::SeqCst)
    }

    fn check_reads(&self) -> Result<(), RepoError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }

    fn check_writes(&self) -> Result<(), RepoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::Persistence("connection reset by peer".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl FlagsRepo for InMemoryFlags {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FeatureFlag>, RepoError> {
        self.check_reads()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|flag| flag.id == id)
            .cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<FeatureFlag>, RepoError> {
        self.check_reads()?;
        self.code_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.stored(code))
    }

    async fn list(&self, page: OffsetPage) -> Result<Vec<FeatureFlag>, RepoError> {
        self.check_reads()?;
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FlagsWriteRepo for InMemoryFlags {
    async fn insert(&self, flag: NewFeatureFlag) -> Result<Uuid, RepoError> {
        self.check_writes()?;
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|existing| existing.code == flag.code) {
            return Err(RepoError::Duplicate {
                constraint: CODE_CONSTRAINT.into(),
            });
        }
        let id = Uuid::new_v4();
        rows.push(flag.into_flag(id));
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn update(&self, flag: &FeatureFlag) -> Result<(), RepoError> {
        self.check_writes()?;
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|existing| existing.code == flag.code && existing.id != flag.id)
        {
            return Err(RepoError::Duplicate {
                constraint: CODE_CONSTRAINT.into(),
            });
        }
        let row = rows
            .iter_mut()
            .find(|existing| existing.id == flag.id)
            .ok_or(RepoError::NotFound)?;
        *row = flag.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.check_writes()?;
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|flag| flag.id != id);
        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A [`FlagStore`] whose operations can be made to fail on demand.
pub struct FlakyCache {
    pub store: FlagStore,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_delete: AtomicBool,
    pub sets: AtomicUsize,
}

impl FlakyCache {
    pub fn new() -> Arc<Self> {
        Self::wrapping(FlagStore::new(&CacheConfig::default()))
    }

    pub fn wrapping(store: FlagStore) -> Arc<Self> {
        Arc::new(Self {
            store,
            fail_get: AtomicBool::new(false),
            fail_set: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            sets: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FlagCache for FlakyCache {
    async fn get(&self, code: &str) -> Result<Option<FeatureFlag>, CacheError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(CacheError::unavailable("read refused"));
        }
        self.store.get(code).await
    }

    async fn set(&self, flag: &FeatureFlag) -> Result<(), CacheError> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(CacheError::unavailable("write refused"));
        }
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.store.set(flag).await
    }

    async fn delete(&self, code: &str) -> Result<(), CacheError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(CacheError::unavailable("delete refused"));
        }
        self.store.delete(code).await
    }

    async fn clear(&self) -> Result<(), CacheError> {
        self.store.clear().await
    }
}

/// Forwards every notification to a channel.
pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<(String, ChangeStatus)>,
}

impl RecordingNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, ChangeStatus)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, flag: &FeatureFlag, status: ChangeStatus) -> Result<(), NotifierError> {
        self.tx
            .send((flag.code.clone(), status))
            .map_err(NotifierError::transport)
    }
}

pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

impl FailingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            attempts: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _flag: &FeatureFlag, _status: ChangeStatus) -> Result<(), NotifierError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotifierError::Rejected {
            status: 500,
            body: "webhook down".into(),
        })
    }
}

pub fn service(repo: &Arc<InMemoryFlags>) -> FeatureFlagService {
    FeatureFlagService::new(repo.clone(), repo.clone())
}

pub fn cached_service(repo: &Arc<InMemoryFlags>, cache: &Arc<FlakyCache>) -> FeatureFlagService {
    service(repo).with_cache(cache.clone())
}

pub async fn next_notification(
    rx: &mut mpsc::UnboundedReceiver<(String, ChangeStatus)>,
) -> (String, ChangeStatus) {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("notification delivered in time")
        .expect("notifier channel open")
}

pub async fn assert_no_notification(rx: &mut mpsc::UnboundedReceiver<(String, ChangeStatus)>) {
    let outcome = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(outcome.is_err(), "unexpected notification: {outcome:?}");
}
