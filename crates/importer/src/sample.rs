use model::establishment::{Coordinates, Establishment, GAS_STATION, PHARMACY};

use crate::CategoryBatch;

/// A handful of establishments in central Brasília, imported when none of
/// the configured source files could be loaded.
pub fn sample_batches() -> Vec<CategoryBatch> {
    vec![
        CategoryBatch::new(
            PHARMACY,
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
            ],
        ),
        CategoryBatch::new(
            GAS_STATION,
            vec![
                Establishment::new(
                    "Posto Shell",
                    GAS_STATION,
                    "Eixo Monumental, Brasília-DF",
                    Coordinates::new(-15.7980, -47.8850),
                ),
                Establishment::new(
                    "Posto Petrobras",
                    GAS_STATION,
                    "W3 Norte, Brasília-DF",
                    Coordinates::new(-15.7850, -47.8750),
                ),
            ],
        ),
    ]
}
