use async_trait::async_trait;
use geoconsulta::database::{EstablishmentRepo, Result};
use model::{
    establishment::{Coordinates, Establishment},
    filter::EstablishmentFilter,
    stats::EstablishmentStats,
    WithId,
};
use sqlx::prelude::FromRow;
use utility::id::Id;

use super::DatabaseRow;
use crate::{
    queries::establishment::{delete_by_types, find, get, insert_all, stats, types},
    PgDatabaseConnection, PgDatabaseTransaction,
};

/// Table: `establishments`. The point is read back through `ST_Y`/`ST_X`.
#[derive(Debug, Clone, FromRow)]
pub struct EstablishmentRow {
    pub id: i32,
    pub name: String,
    #[sqlx(rename = "type")]
    pub establishment_type: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl DatabaseRow for EstablishmentRow {
    type Model = Establishment;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Establishment {
            name: self.name,
            establishment_type: self.establishment_type,
            address: self.address.unwrap_or_default(),
            location: Coordinates::new(self.latitude, self.longitude),
        }
    }
}

#[async_trait]
impl EstablishmentRepo for PgDatabaseConnection {
    async fn get(&mut self, id: Id<Establishment>) -> Result<WithId<Establishment>> {
        get(&mut *self.conn, id).await
    }

    async fn find(
        &mut self,
        filter: &EstablishmentFilter,
        limit: usize,
    ) -> Result<Vec<WithId<Establishment>>> {
        find(&mut *self.conn, filter, limit).await
    }

    async fn types(&mut self) -> Result<Vec<String>> {
        types(&mut *self.conn).await
    }

    async fn stats(&mut self) -> Result<EstablishmentStats> {
        stats(&mut *self.conn).await
    }

    async fn delete_by_types(&mut self, types: &[String]) -> Result<u64> {
        delete_by_types(&mut *self.conn, types).await
    }

    async fn insert_all(&mut self, establishments: &[Establishment]) -> Result<u64> {
        insert_all(&mut *self.conn, establishments).await
    }
}

#[async_trait]
impl EstablishmentRepo for PgDatabaseTransaction {
    async fn get(&mut self, id: Id<Establishment>) -> Result<WithId<Establishment>> {
        get(&mut *self.tx, id).await
    }

    async fn find(
        &mut self,
        filter: &EstablishmentFilter,
        limit: usize,
    ) -> Result<Vec<WithId<Establishment>>> {
        find(&mut *self.tx, filter, limit).await
    }

    async fn types(&mut self) -> Result<Vec<String>> {
        types(&mut *self.tx).await
    }

    async fn stats(&mut self) -> Result<EstablishmentStats> {
        stats(&mut *self.tx).await
    }

    async fn delete_by_types(&mut self, types: &[String]) -> Result<u64> {
        delete_by_types(&mut *self.tx, types).await
    }

    async fn insert_all(&mut self, establishments: &[Establishment]) -> Result<u64> {
        insert_all(&mut *self.tx, establishments).await
    }
}
