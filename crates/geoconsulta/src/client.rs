use model::{
    establishment::Establishment, filter::EstablishmentFilter, stats::EstablishmentStats,
    WithId, MAX_RESULTS,
};
use utility::id::Id;

use crate::{
    database::{Database, EstablishmentRepo},
    RequestResult,
};

/// Read-only access to the establishments of a store.
///
/// Every call acquires its own connection and releases it before returning.
#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database,
{
    pub database: D,
}

impl<D> Client<D>
where
    D: Database,
{
    pub fn new(database: D) -> Self {
        Self { database }
    }

    pub async fn find_establishments(
        &self,
        filter: &EstablishmentFilter,
    ) -> RequestResult<Vec<WithId<Establishment>>> {
        log::debug!("finding establishments matching {:?}", filter);
        let mut connection = self.database.connection().await?;
        Ok(connection.find(filter, MAX_RESULTS).await?)
    }

    pub async fn get_establishment(
        &self,
        id: Id<Establishment>,
    ) -> RequestResult<WithId<Establishment>> {
        let mut connection = self.database.connection().await?;
        Ok(connection.get(id).await?)
    }

    pub async fn get_types(&self) -> RequestResult<Vec<String>> {
        let mut connection = self.database.connection().await?;
        Ok(connection.types().await?)
    }

    pub async fn get_stats(&self) -> RequestResult<EstablishmentStats> {
        let mut connection = self.database.connection().await?;
        Ok(connection.stats().await?)
    }
}

#[cfg(test)]
mod tests {
    use model::{
        establishment::{Coordinates, GAS_STATION, PHARMACY},
        filter::Proximity,
    };

    use super::*;
    use crate::{memory::MemoryDatabase, RequestError};

    async fn client_with(establishments: Vec<Establishment>) -> Client<MemoryDatabase> {
        let database = MemoryDatabase::new();
        database.seed(establishments).await;
        Client::new(database)
    }

    fn sample() -> Vec<Establishment> {
        vec![
            Establishment::new(
                "Drogasil Centro",
                PHARMACY,
                "Setor Comercial Sul, Brasília-DF",
                Coordinates::new(-15.7942, -47.8822),
            ),
            Establishment::new(
                "Farmácia Popular",
                PHARMACY,
                "Asa Norte, Brasília-DF",
                Coordinates::new(-15.7850, -47.8750),
            ),
            Establishment::new(
                "Posto Shell",
                GAS_STATION,
                "Eixo Monumental, Brasília-DF",
                Coordinates::new(-15.7980, -47.8850),
            ),
        ]
    }

    #[tokio::test]
    async fn find_by_search_is_case_insensitive() {
        let client = client_with(sample()).await;
        let found = client
            .find_establishments(&EstablishmentFilter {
                search: Some("drog".to_owned()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content.name, "Drogasil Centro");
    }

    #[tokio::test]
    async fn find_within_radius_only_returns_close_records() {
        let client = client_with(sample()).await;
        let proximity = Proximity {
            latitude: -15.7942,
            longitude: -47.8822,
            radius: 600.0,
        };
        let found = client
            .find_establishments(&EstablishmentFilter {
                proximity: Some(proximity),
                ..Default::default()
            })
            .await
            .unwrap();

        let names = found
            .iter()
            .map(|e| e.content.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Drogasil Centro", "Posto Shell"]);
        assert!(found
            .iter()
            .all(|e| proximity.contains(&e.content.location)));
    }

    #[tokio::test]
    async fn find_is_capped() {
        let many = (0..250)
            .map(|i| {
                Establishment::new(
                    format!("Farmácia {i}"),
                    PHARMACY,
                    "",
                    Coordinates::new(-15.79, -47.88),
                )
            })
            .collect();
        let client = client_with(many).await;

        let found = client
            .find_establishments(&EstablishmentFilter::default())
            .await
            .unwrap();
        assert_eq!(found.len(), MAX_RESULTS);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let client = client_with(sample()).await;
        let result = client.get_establishment(Id::new(999)).await;
        assert!(matches!(result, Err(RequestError::NotFound)));
    }

    #[tokio::test]
    async fn types_and_stats() {
        let client = client_with(sample()).await;

        assert_eq!(
            client.get_types().await.unwrap(),
            vec![GAS_STATION.to_owned(), PHARMACY.to_owned()]
        );

        let stats = client.get_stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type.get(PHARMACY), Some(&2));
        assert_eq!(stats.by_type.get(GAS_STATION), Some(&1));
    }

    #[tokio::test]
    async fn unavailable_store_is_a_store_error() {
        let client = client_with(sample()).await;
        client.database.set_offline(true);

        let result = client.get_stats().await;
        assert!(matches!(result, Err(RequestError::Store(_))));
    }
}
