use geoconsulta::database::{Database, Result};
use model::{
    establishment::Establishment, filter::EstablishmentFilter, stats::EstablishmentStats,
    WithId,
};
use sqlx::{Executor, PgConnection, Postgres, QueryBuilder};
use utility::{id::Id, let_also::LetAlso};

use super::{contains_pattern, convert_error};
use crate::{
    data_model::{establishment::EstablishmentRow, with_id, with_ids},
    PgDatabase,
};

const SELECT_ESTABLISHMENTS: &str = "
    SELECT
        id, name, type, address,
        ST_Y(location) AS latitude, ST_X(location) AS longitude
    FROM
        establishments";

pub async fn get<'c, E>(executor: E, id: Id<Establishment>) -> Result<WithId<Establishment>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, name, type, address,
            ST_Y(location) AS latitude, ST_X(location) AS longitude
        FROM
            establishments
        WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map(|row: EstablishmentRow| with_id(row))
    .map_err(convert_error)
}

pub async fn find<'c, E>(
    executor: E,
    filter: &EstablishmentFilter,
    limit: usize,
) -> Result<Vec<WithId<Establishment>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let mut query = QueryBuilder::<Postgres>::new(SELECT_ESTABLISHMENTS);
    query.push(" WHERE TRUE");

    if let Some(search) = &filter.search {
        query
            .push(" AND name ILIKE ")
            .push_bind(contains_pattern(search));
    }

    if let Some(establishment_type) = &filter.establishment_type {
        query
            .push(" AND type = ")
            .push_bind(establishment_type.clone());
    }

    if let Some(proximity) = &filter.proximity {
        // geography makes the radius a distance in meters
        query
            .push(" AND ST_DWithin(location::geography, ST_SetSRID(ST_MakePoint(")
            .push_bind(proximity.longitude)
            .push(", ")
            .push_bind(proximity.latitude)
            .push("), 4326)::geography, ")
            .push_bind(proximity.radius)
            .push(")");
    }

    query
        .push(" ORDER BY id LIMIT ")
        .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));

    query
        .build_query_as::<EstablishmentRow>()
        .fetch_all(executor)
        .await
        .map_err(convert_error)?
        .let_owned(|rows| Ok(with_ids(rows)))
}

pub async fn types<'c, E>(executor: E) -> Result<Vec<String>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar(
        "
        SELECT DISTINCT type
        FROM establishments
        ORDER BY type;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)
}

pub async fn stats<'c, E>(executor: E) -> Result<EstablishmentStats>
where
    E: Executor<'c, Database = Postgres>,
{
    // `type` is never null, so the per-type counts add up to the total
    sqlx::query_as(
        "
        SELECT type, COUNT(*) AS count
        FROM establishments
        GROUP BY type
        ORDER BY type;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|type_counts: Vec<(String, i64)>| {
        let total = type_counts.iter().map(|(_, count)| count).sum();
        Ok(EstablishmentStats::from_type_counts(total, type_counts))
    })
}

pub async fn delete_by_types<'c, E>(executor: E, types: &[String]) -> Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        DELETE FROM establishments
        WHERE type = ANY($1);
        ",
    )
    .bind(types.to_vec())
    .execute(executor)
    .await
    .map(|result| result.rows_affected())
    .map_err(convert_error)
}

/// Inserts in chunks of [`Database::BULK_INSERT_MAX`] rows. Run it inside a
/// transaction to get all or nothing.
pub async fn insert_all(
    conn: &mut PgConnection,
    establishments: &[Establishment],
) -> Result<u64> {
    let mut inserted = 0;
    for chunk in establishments.chunks(PgDatabase::BULK_INSERT_MAX) {
        let mut query = QueryBuilder::<Postgres>::new(
            "INSERT INTO establishments (name, type, address, location) ",
        );
        query.push_values(chunk, |mut row, establishment| {
            row.push_bind(establishment.name.clone())
                .push_bind(establishment.establishment_type.clone())
                .push_bind(establishment.address.clone())
                .push("ST_SetSRID(ST_MakePoint(")
                .push_bind_unseparated(establishment.location.longitude)
                .push_unseparated(", ")
                .push_bind_unseparated(establishment.location.latitude)
                .push_unseparated("), 4326)");
        });

        inserted += query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(convert_error)?
            .rows_affected();
    }
    log::debug!("inserted {} establishments", inserted);
    Ok(inserted)
}
