//! Reading GeoJSON feature collections and turning features into
//! establishments.

use std::{io, path::Path};

use model::establishment::{Coordinates, Establishment};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::ImportError;

/// Property keys probed for the display name, in priority order.
pub const NAME_ALIASES: &[&str] = &["name", "nome", "NAME", "Name", "NOME"];

/// Property keys probed for the address, in priority order.
pub const ADDRESS_ALIASES: &[&str] = &[
    "address",
    "endereco",
    "endereço",
    "ADDRESS",
    "Address",
    "ENDERECO",
    "addr:full",
];

pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_ADDRESS: &str = "";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Value,
}

pub async fn load_feature_collection<P: AsRef<Path>>(
    path: P,
) -> Result<FeatureCollection, ImportError> {
    let path = path.as_ref();
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|why| match why.kind() {
            io::ErrorKind::NotFound => ImportError::FileMissing(path.to_owned()),
            _ => ImportError::Io {
                path: path.to_owned(),
                source: why,
            },
        })?;

    let collection: FeatureCollection =
        serde_json::from_str(&content).map_err(|why| ImportError::Parse {
            path: path.to_owned(),
            source: why,
        })?;

    log::info!(
        "loaded {} with {} features",
        path.display(),
        collection.features.len()
    );
    Ok(collection)
}

/// Builds an establishment of `category` from a point feature. Features that
/// are no points or carry malformed coordinates are logged and yield `None`.
pub fn extract_record(feature: &Feature, category: &str) -> Option<Establishment> {
    let Some(geometry) = &feature.geometry else {
        log::warn!("skipping feature without geometry");
        return None;
    };

    if geometry.kind.as_deref() != Some("Point") {
        log::warn!("unsupported geometry type: {:?}", geometry.kind);
        return None;
    }

    let Some(location) = point_coordinates(&geometry.coordinates) else {
        log::warn!("invalid coordinates in feature: {}", geometry.coordinates);
        return None;
    };

    let properties = feature.properties.as_ref();
    let name = probe(properties, NAME_ALIASES).unwrap_or_else(|| DEFAULT_NAME.to_owned());
    let address =
        probe(properties, ADDRESS_ALIASES).unwrap_or_else(|| DEFAULT_ADDRESS.to_owned());

    Some(Establishment::new(name, category, address, location))
}

/// `[lon, lat]`, both numbers and in range.
fn point_coordinates(coordinates: &Value) -> Option<Coordinates> {
    match coordinates.as_array()?.as_slice() {
        [longitude, latitude] => {
            Some(Coordinates::new(latitude.as_f64()?, longitude.as_f64()?))
                .filter(Coordinates::is_valid)
        }
        _ => None,
    }
}

/// The first alias whose value is usable text wins.
fn probe(properties: Option<&Map<String, Value>>, aliases: &[&str]) -> Option<String> {
    let properties = properties?;
    aliases
        .iter()
        .find_map(|alias| properties.get(*alias).and_then(property_text))
}

fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use model::establishment::PHARMACY;
    use serde_json::json;

    use super::*;

    fn parse(value: Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn extracts_point_feature() {
        let feature = parse(json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-47.8822, -15.7942] },
            "properties": { "name": "Drogasil Centro", "address": "Setor Comercial Sul" }
        }));

        let establishment = extract_record(&feature, PHARMACY).unwrap();
        assert_eq!(establishment.name, "Drogasil Centro");
        assert_eq!(establishment.establishment_type, PHARMACY);
        assert_eq!(establishment.address, "Setor Comercial Sul");
        assert_eq!(establishment.location, Coordinates::new(-15.7942, -47.8822));
    }

    #[test]
    fn aliases_are_probed_in_order() {
        let feature = parse(json!({
            "geometry": { "type": "Point", "coordinates": [-47.88, -15.79] },
            "properties": { "NAME": "Upper", "nome": "Farmácia Popular", "endereco": "Asa Norte" }
        }));

        let establishment = extract_record(&feature, PHARMACY).unwrap();
        assert_eq!(establishment.name, "Farmácia Popular");
        assert_eq!(establishment.address, "Asa Norte");
    }

    #[test]
    fn blank_values_fall_through_to_next_alias() {
        let feature = parse(json!({
            "geometry": { "type": "Point", "coordinates": [-47.88, -15.79] },
            "properties": { "name": "  ", "NAME": "Posto Shell" }
        }));

        let establishment = extract_record(&feature, "gas_station").unwrap();
        assert_eq!(establishment.name, "Posto Shell");
    }

    #[test]
    fn defaults_when_no_alias_matches() {
        let feature = parse(json!({
            "geometry": { "type": "Point", "coordinates": [-47.88, -15.79] },
            "properties": null
        }));

        let establishment = extract_record(&feature, PHARMACY).unwrap();
        assert_eq!(establishment.name, DEFAULT_NAME);
        assert_eq!(establishment.address, DEFAULT_ADDRESS);
    }

    #[test]
    fn non_point_geometries_are_skipped() {
        let feature = parse(json!({
            "geometry": {
                "type": "LineString",
                "coordinates": [[-47.88, -15.79], [-47.87, -15.78]]
            },
            "properties": { "name": "Road" }
        }));
        assert_eq!(extract_record(&feature, PHARMACY), None);

        let feature = parse(json!({ "geometry": null, "properties": {} }));
        assert_eq!(extract_record(&feature, PHARMACY), None);
    }

    #[test]
    fn malformed_coordinates_are_skipped() {
        for coordinates in [
            json!([-47.88]),
            json!([-47.88, -15.79, 1000.0]),
            json!(["-47.88", "-15.79"]),
            json!([-47.88, 95.0]),
            json!(null),
        ] {
            let feature = parse(json!({
                "geometry": { "type": "Point", "coordinates": coordinates.clone() }
            }));
            assert_eq!(
                extract_record(&feature, PHARMACY),
                None,
                "coordinates: {coordinates}"
            );
        }
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_feature_collection(dir.path().join("nope.geojson")).await;
        assert!(matches!(result, Err(ImportError::FileMissing(_))));
    }

    #[tokio::test]
    async fn malformed_json_reports_location() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\n  \"features\": [\n    {{ oops }}\n  ]\n}}").unwrap();

        let error = load_feature_collection(file.path()).await.unwrap_err();
        match &error {
            ImportError::Parse { source, .. } => assert_eq!(source.line(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(error.to_string().contains("line 3"));
    }

    #[tokio::test]
    async fn loads_feature_collection() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!({
                "type": "FeatureCollection",
                "features": [
                    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }, "properties": {} },
                    { "type": "Feature", "geometry": { "type": "Point", "coordinates": [3.0, 4.0] }, "properties": {} }
                ]
            })
        )
        .unwrap();

        let collection = load_feature_collection(file.path()).await.unwrap();
        assert_eq!(collection.features.len(), 2);
    }
}
