//! An in-process [`Database`] backed by a `BTreeMap`.
//!
//! It follows the same filter, ordering and transaction rules as the
//! PostgreSQL backend, which makes it suitable for tests and local demos.
//! A transaction locks the whole table until it is committed or dropped, so
//! readers never see a half-applied import.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use model::{
    establishment::Establishment, filter::EstablishmentFilter, stats::EstablishmentStats,
    WithId,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use utility::id::Id;

use crate::database::{
    Database, DatabaseError, DatabaseTransaction, EstablishmentRepo, Result,
};

#[derive(Debug, Clone, Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<i32, Establishment>,
}

impl Table {
    fn get(&self, id: Id<Establishment>) -> Result<WithId<Establishment>> {
        self.rows
            .get(&id.raw())
            .cloned()
            .map(|establishment| WithId::new(id, establishment))
            .ok_or(DatabaseError::NotFound)
    }

    fn find(&self, filter: &EstablishmentFilter, limit: usize) -> Vec<WithId<Establishment>> {
        self.rows
            .iter()
            .filter(|(_, establishment)| filter.matches(establishment))
            .take(limit)
            .map(|(id, establishment)| WithId::new(Id::new(*id), establishment.clone()))
            .collect()
    }

    fn type_counts(&self) -> BTreeMap<String, i64> {
        let mut counts = BTreeMap::new();
        for establishment in self.rows.values() {
            *counts
                .entry(establishment.establishment_type.clone())
                .or_insert(0) += 1;
        }
        counts
    }

    fn delete_by_types(&mut self, types: &[String]) -> u64 {
        let before = self.rows.len();
        self.rows
            .retain(|_, establishment| !types.contains(&establishment.establishment_type));
        (before - self.rows.len()) as u64
    }

    fn insert_all(&mut self, establishments: &[Establishment]) -> u64 {
        for establishment in establishments {
            self.last_id += 1;
            self.rows.insert(self.last_id, establishment.clone());
        }
        establishments.len() as u64
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    table: Arc<Mutex<Table>>,
    offline: Arc<AtomicBool>,
    reject_inserts: Arc<AtomicBool>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts establishments directly, outside of any transaction.
    pub async fn seed(&self, establishments: Vec<Establishment>) {
        self.table.lock().await.insert_all(&establishments);
    }

    /// While offline, acquiring a connection or transaction fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// While set, every `insert_all` fails after validating its input.
    pub fn set_reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(DatabaseError::Unavailable("memory database is offline".to_owned()))
        } else {
            Ok(())
        }
    }
}

fn check_inserts(reject_inserts: &AtomicBool) -> Result<()> {
    if reject_inserts.load(Ordering::SeqCst) {
        Err(DatabaseError::Other("insert rejected".into()))
    } else {
        Ok(())
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Connection = MemoryConnection;
    type Transaction = MemoryTransaction;

    const BULK_INSERT_MAX: usize = usize::MAX;

    async fn connection(&self) -> Result<Self::Connection> {
        self.ensure_online()?;
        Ok(MemoryConnection {
            table: self.table.clone(),
            reject_inserts: self.reject_inserts.clone(),
        })
    }

    async fn transaction(&self) -> Result<Self::Transaction> {
        self.ensure_online()?;
        let guard = self.table.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryTransaction {
            guard,
            staged,
            reject_inserts: self.reject_inserts.clone(),
        })
    }
}

pub struct MemoryConnection {
    table: Arc<Mutex<Table>>,
    reject_inserts: Arc<AtomicBool>,
}

#[async_trait]
impl EstablishmentRepo for MemoryConnection {
    async fn get(&mut self, id: Id<Establishment>) -> Result<WithId<Establishment>> {
        self.table.lock().await.get(id)
    }

    async fn find(
        &mut self,
        filter: &EstablishmentFilter,
        limit: usize,
    ) -> Result<Vec<WithId<Establishment>>> {
        Ok(self.table.lock().await.find(filter, limit))
    }

    async fn types(&mut self) -> Result<Vec<String>> {
        Ok(self.table.lock().await.type_counts().into_keys().collect())
    }

    async fn stats(&mut self) -> Result<EstablishmentStats> {
        let table = self.table.lock().await;
        Ok(EstablishmentStats::from_type_counts(
            table.rows.len() as i64,
            table.type_counts(),
        ))
    }

    async fn delete_by_types(&mut self, types: &[String]) -> Result<u64> {
        Ok(self.table.lock().await.delete_by_types(types))
    }

    async fn insert_all(&mut self, establishments: &[Establishment]) -> Result<u64> {
        check_inserts(&self.reject_inserts)?;
        Ok(self.table.lock().await.insert_all(establishments))
    }
}

/// Works on a private copy of the table which replaces the shared one on
/// commit.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Table>,
    staged: Table,
    reject_inserts: Arc<AtomicBool>,
}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn commit(mut self) -> Result<()> {
        *self.guard = self.staged;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl EstablishmentRepo for MemoryTransaction {
    async fn get(&mut self, id: Id<Establishment>) -> Result<WithId<Establishment>> {
        self.staged.get(id)
    }

    async fn find(
        &mut self,
        filter: &EstablishmentFilter,
        limit: usize,
    ) -> Result<Vec<WithId<Establishment>>> {
        Ok(self.staged.find(filter, limit))
    }

    async fn types(&mut self) -> Result<Vec<String>> {
        Ok(self.staged.type_counts().into_keys().collect())
    }

    async fn stats(&mut self) -> Result<EstablishmentStats> {
        Ok(EstablishmentStats::from_type_counts(
            self.staged.rows.len() as i64,
            self.staged.type_counts(),
        ))
    }

    async fn delete_by_types(&mut self, types: &[String]) -> Result<u64> {
        Ok(self.staged.delete_by_types(types))
    }

    async fn insert_all(&mut self, establishments: &[Establishment]) -> Result<u64> {
        check_inserts(&self.reject_inserts)?;
        Ok(self.staged.insert_all(establishments))
    }
}
