use indexmap::IndexMap;
use serde::Serialize;

/// Record counts, overall and per establishment type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EstablishmentStats {
    pub total: i64,
    pub by_type: IndexMap<String, i64>,
}

impl EstablishmentStats {
    /// Builds the stats from `(type, count)` pairs, keeping their order.
    pub fn from_type_counts<I>(total: i64, type_counts: I) -> Self
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        Self {
            total,
            by_type: type_counts.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn serializes_counts_as_map() {
        let stats = EstablishmentStats::from_type_counts(
            3,
            vec![("gas_station".to_owned(), 1), ("pharmacy".to_owned(), 2)],
        );
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({ "total": 3, "by_type": { "gas_station": 1, "pharmacy": 2 } })
        );
    }
}
