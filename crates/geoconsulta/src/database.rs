use std::{error, result};

use async_trait::async_trait;
use model::{
    establishment::Establishment, filter::EstablishmentFilter, stats::EstablishmentStats,
    WithId,
};
use thiserror::Error;
use utility::id::Id;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("record not found")]
    NotFound,

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(Box<dyn error::Error + Send + Sync>),
}

impl DatabaseError {
    pub fn other<E: error::Error + Send + Sync + 'static>(why: E) -> Self {
        Self::Other(Box::new(why))
    }
}

pub type Result<T> = result::Result<T, DatabaseError>;

/// A store of establishments.
///
/// Handles returned by [`Database::connection`] and [`Database::transaction`]
/// hold a pooled connection for as long as they live and give it back when
/// dropped, so nothing is held across requests.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized + 'static {
    type Connection: EstablishmentRepo;
    type Transaction: DatabaseTransaction + EstablishmentRepo;

    /// Maximum number of rows a single bulk insert statement may carry.
    const BULK_INSERT_MAX: usize;

    async fn connection(&self) -> Result<Self::Connection>;

    async fn transaction(&self) -> Result<Self::Transaction>;
}

/// A unit of work. Dropping a transaction without committing it rolls it back.
#[async_trait]
pub trait DatabaseTransaction: Send + Sized {
    async fn commit(self) -> Result<()>;

    async fn rollback(self) -> Result<()>;
}

#[async_trait]
pub trait EstablishmentRepo: Send {
    async fn get(&mut self, id: Id<Establishment>) -> Result<WithId<Establishment>>;

    /// Establishments matching every filter, ordered by id, at most `limit`.
    async fn find(
        &mut self,
        filter: &EstablishmentFilter,
        limit: usize,
    ) -> Result<Vec<WithId<Establishment>>>;

    /// Distinct establishment types, sorted.
    async fn types(&mut self) -> Result<Vec<String>>;

    /// Total and per-type counts, types sorted.
    async fn stats(&mut self) -> Result<EstablishmentStats>;

    /// Removes every establishment whose type is one of `types`.
    async fn delete_by_types(&mut self, types: &[String]) -> Result<u64>;

    async fn insert_all(&mut self, establishments: &[Establishment]) -> Result<u64>;
}
