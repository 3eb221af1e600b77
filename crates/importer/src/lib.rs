use std::{
    io,
    path::{Path, PathBuf},
    str::FromStr,
};

use geoconsulta::database::{Database, DatabaseError, DatabaseTransaction, EstablishmentRepo};
use indexmap::IndexMap;
use itertools::Itertools;
use model::establishment::Establishment;
use thiserror::Error;

pub mod feature;
pub mod sample;

use feature::{extract_record, load_feature_collection};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file not found: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("malformed GeoJSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("could not read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("import failed: {0}")]
    Store(#[from] DatabaseError),
}

/// A GeoJSON file whose features all belong to one category.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub category: String,
    pub path: PathBuf,
}

impl Source {
    pub fn new<C: Into<String>, P: Into<PathBuf>>(category: C, path: P) -> Self {
        Self {
            category: category.into(),
            path: path.into(),
        }
    }
}

impl FromStr for Source {
    type Err = String;

    /// Parses `CATEGORY=PATH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, path) = s
            .split_once('=')
            .ok_or_else(|| format!("expected CATEGORY=PATH, got {:?}", s))?;
        let category = category.trim();
        if category.is_empty() || path.is_empty() {
            return Err(format!("expected CATEGORY=PATH, got {:?}", s));
        }
        Ok(Self::new(category, path))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBatch {
    pub category: String,
    pub records: Vec<Establishment>,
}

impl CategoryBatch {
    pub fn new<C: Into<String>>(category: C, records: Vec<Establishment>) -> Self {
        Self {
            category: category.into(),
            records,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportSummary {
    /// Rows removed because their category was re-imported.
    pub deleted: u64,
    pub inserted: u64,
    pub by_category: IndexMap<String, u64>,
}

/// Loads one source file and extracts its point features.
pub async fn load_batch<P: AsRef<Path>>(
    path: P,
    category: &str,
) -> Result<CategoryBatch, ImportError> {
    let collection = load_feature_collection(path).await?;
    let total = collection.features.len();
    let records = collection
        .features
        .iter()
        .filter_map(|feature| extract_record(feature, category))
        .collect_vec();

    if records.len() < total {
        log::warn!(
            "skipped {} of {} {} features",
            total - records.len(),
            total,
            category
        );
    }
    Ok(CategoryBatch::new(category, records))
}

/// Loads every source, skipping those that are missing or malformed. Falls
/// back to the sample dataset when nothing could be loaded.
pub async fn collect_batches(sources: &[Source]) -> Vec<CategoryBatch> {
    let mut batches = Vec::with_capacity(sources.len());
    for source in sources {
        match load_batch(&source.path, &source.category).await {
            Ok(batch) => batches.push(batch),
            Err(why) => log::warn!("skipping {}: {}", source.category, why),
        }
    }

    if batches.is_empty() {
        log::info!("no source data loaded, using sample dataset");
        return sample::sample_batches();
    }
    batches
}

/// Replaces all establishments of the batches' categories in one transaction.
/// Nothing is changed if any step fails.
pub async fn import_all<D: Database>(
    database: &D,
    batches: &[CategoryBatch],
) -> Result<ImportSummary, ImportError> {
    let mut tx = database.transaction().await?;

    match replace_categories(&mut tx, batches).await {
        Ok(summary) => {
            tx.commit().await?;
            log::info!(
                "imported {} establishments, replacing {}",
                summary.inserted,
                summary.deleted
            );
            Ok(summary)
        }
        Err(why) => {
            log::error!("import failed, rolling back: {}", why);
            if let Err(rollback) = tx.rollback().await {
                log::error!("rollback failed: {}", rollback);
            }
            Err(why.into())
        }
    }
}

async fn replace_categories<T: EstablishmentRepo>(
    tx: &mut T,
    batches: &[CategoryBatch],
) -> Result<ImportSummary, DatabaseError> {
    let categories = batches
        .iter()
        .map(|batch| batch.category.clone())
        .unique()
        .collect_vec();

    let deleted = tx.delete_by_types(&categories).await?;
    log::debug!("deleted {} rows of {}", deleted, categories.join(", "));

    let mut summary = ImportSummary {
        deleted,
        ..Default::default()
    };
    for batch in batches {
        let inserted = tx.insert_all(&batch.records).await?;
        log::info!("inserted {} {} records", inserted, batch.category);
        summary.inserted += inserted;
        *summary.by_category.entry(batch.category.clone()).or_insert(0) += inserted;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use geoconsulta::{client::Client, memory::MemoryDatabase};
    use model::{
        establishment::{Coordinates, GAS_STATION, PHARMACY},
        filter::EstablishmentFilter,
    };
    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;

    fn establishment(name: &str, category: &str) -> Establishment {
        Establishment::new(name, category, "", Coordinates::new(-15.79, -47.88))
    }

    fn geojson_file(features: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({ "type": "FeatureCollection", "features": features })
        )
        .unwrap();
        file
    }

    #[test]
    fn parses_source_argument() {
        assert_eq!(
            "atm=data/atms.geojson".parse::<Source>(),
            Ok(Source::new("atm", "data/atms.geojson"))
        );
        assert!("data/atms.geojson".parse::<Source>().is_err());
        assert!("=data/atms.geojson".parse::<Source>().is_err());
    }

    #[tokio::test]
    async fn import_produces_stats_per_type() {
        let database = MemoryDatabase::new();
        let batches = vec![
            CategoryBatch::new(PHARMACY, vec![establishment("Drogasil", PHARMACY)]),
            CategoryBatch::new(GAS_STATION, vec![establishment("Shell", GAS_STATION)]),
        ];

        let summary = import_all(&database, &batches).await.unwrap();
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.by_category.get(PHARMACY), Some(&1));

        let stats = Client::new(database).get_stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_type.get(PHARMACY), Some(&1));
        assert_eq!(stats.by_type.get(GAS_STATION), Some(&1));
    }

    #[tokio::test]
    async fn reimport_replaces_category() {
        let database = MemoryDatabase::new();
        database
            .seed(vec![
                establishment("Old Pharmacy", PHARMACY),
                establishment("Shell", GAS_STATION),
            ])
            .await;

        let batches = vec![CategoryBatch::new(
            PHARMACY,
            vec![
                establishment("Drogasil", PHARMACY),
                establishment("Farmácia Popular", PHARMACY),
            ],
        )];
        import_all(&database, &batches).await.unwrap();
        let summary = import_all(&database, &batches).await.unwrap();
        assert_eq!(summary.deleted, 2);

        let client = Client::new(database);
        let stats = client.get_stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_type.get(PHARMACY), Some(&2));
        assert_eq!(stats.by_type.get(GAS_STATION), Some(&1));

        let names = client
            .find_establishments(&EstablishmentFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.content.name)
            .collect_vec();
        assert!(!names.contains(&"Old Pharmacy".to_owned()));
    }

    #[tokio::test]
    async fn failed_import_leaves_store_unchanged() {
        let database = MemoryDatabase::new();
        database.seed(vec![establishment("Drogasil", PHARMACY)]).await;
        database.set_reject_inserts(true);

        let batches = vec![CategoryBatch::new(
            PHARMACY,
            vec![establishment("Farmácia Popular", PHARMACY)],
        )];
        let result = import_all(&database, &batches).await;
        assert!(matches!(result, Err(ImportError::Store(_))));

        database.set_reject_inserts(false);
        let found = Client::new(database)
            .find_establishments(&EstablishmentFilter::default())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].content.name, "Drogasil");
    }

    #[tokio::test]
    async fn load_batch_skips_non_point_features() {
        let file = geojson_file(json!([
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-47.8822, -15.7942] },
                "properties": { "name": "Drogasil Centro" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]] },
                "properties": { "name": "Area" }
            },
            {
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [-47.8750, -15.7850] },
                "properties": { "nome": "Farmácia Popular" }
            }
        ]));

        let batch = load_batch(file.path(), PHARMACY).await.unwrap();
        let names = batch.records.iter().map(|e| e.name.as_str()).collect_vec();
        assert_eq!(names, vec!["Drogasil Centro", "Farmácia Popular"]);
    }

    #[tokio::test]
    async fn unreadable_sources_are_skipped() {
        let good = geojson_file(json!([{
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-47.8850, -15.7980] },
            "properties": { "name": "Posto Shell" }
        }]));
        let mut broken = NamedTempFile::new().unwrap();
        write!(broken, "{{ not json").unwrap();

        let sources = vec![
            Source::new(PHARMACY, "/nonexistent/pharmacies.geojson"),
            Source::new("atm", broken.path()),
            Source::new(GAS_STATION, good.path()),
        ];
        let batches = collect_batches(&sources).await;

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].category, GAS_STATION);
        assert_eq!(batches[0].records[0].name, "Posto Shell");
    }

    #[tokio::test]
    async fn falls_back_to_sample_dataset() {
        let batches = collect_batches(&[]).await;
        assert_eq!(batches, sample::sample_batches());

        let sources = vec![Source::new(PHARMACY, "/nonexistent/pharmacies.geojson")];
        let batches = collect_batches(&sources).await;
        assert_eq!(batches.iter().map(|b| b.records.len()).sum::<usize>(), 4);
    }
}
