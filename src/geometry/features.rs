//! Building the ID-keyed FeatureCollection.

use geo::BoundingRect;
use geo_types::Geometry;
use geojson::{feature::Id, Feature, FeatureCollection, JsonObject};
use hashbrown::HashMap;
use tracing::{debug, info};

use super::GeometryParser;
use crate::error::LoadError;

/// Output of [`normalize`]: parsed shapes by neighborhood id plus the
/// feature collection derived from them.
#[derive(Debug, Clone)]
pub struct NormalizedGeometry {
    pub by_id: HashMap<String, Geometry<f64>>,
    pub features: FeatureCollection,
}

/// Parse every `(id, wkt)` pair and build the feature collection.
///
/// Feature order follows input order and each `feature.id` is the
/// neighborhood id, untouched. Any parse failure or repeated id aborts the
/// whole run; no partial collection is ever returned.
pub fn normalize<'a, P, I>(parser: &P, shapes: I) -> Result<NormalizedGeometry, LoadError>
where
    P: GeometryParser,
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut by_id: HashMap<String, Geometry<f64>> = HashMap::new();
    let mut features = Vec::new();

    for (id, text) in shapes {
        if by_id.contains_key(id) {
            return Err(LoadError::DuplicateNeighborhood(id.to_string()));
        }

        let geometry = parser
            .parse_polygon(text)
            .map_err(|source| LoadError::Geometry {
                neighborhood: id.to_string(),
                source,
            })?;

        features.push(to_feature(id, &geometry));
        by_id.insert(id.to_string(), geometry);
        debug!("Normalized geometry for '{}'", id);
    }

    info!("Normalized {} neighborhood geometries", features.len());

    Ok(NormalizedGeometry {
        by_id,
        features: FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        },
    })
}

fn to_feature(id: &str, geometry: &Geometry<f64>) -> Feature {
    let bbox = geometry
        .bounding_rect()
        .map(|rect| vec![rect.min().x, rect.min().y, rect.max().x, rect.max().y]);

    let mut properties = JsonObject::new();
    properties.insert("name".to_string(), serde_json::Value::from(id));

    Feature {
        bbox,
        geometry: Some(geojson::Geometry::new(geojson::Value::from(geometry))),
        id: Some(Id::String(id.to_string())),
        properties: Some(properties),
        foreign_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use crate::geometry::WktParser;
    use geo::CoordsIter;

    const CARME: &str = "POLYGON ((-0.38 39.47, -0.37 39.47, -0.37 39.48, -0.38 39.47))";
    const RUSSAFA: &str =
        "MULTIPOLYGON (((-0.37 39.46, -0.36 39.46, -0.36 39.47, -0.37 39.46)), \
         ((-0.35 39.45, -0.34 39.45, -0.34 39.46, -0.35 39.45)))";

    fn feature_ids(collection: &FeatureCollection) -> Vec<String> {
        collection
            .features
            .iter()
            .map(|f| match &f.id {
                Some(Id::String(s)) => s.clone(),
                other => panic!("unexpected feature id {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_feature_ids_match_input_verbatim() {
        let normalized = normalize(
            &WktParser,
            vec![("EL CARME", CARME), ("Russafa", RUSSAFA)],
        )
        .unwrap();

        assert_eq!(feature_ids(&normalized.features), vec!["EL CARME", "Russafa"]);
        assert_eq!(normalized.by_id.len(), 2);
        assert!(normalized.by_id.contains_key("Russafa"));
        assert!(!normalized.by_id.contains_key("RUSSAFA"));
    }

    #[test]
    fn test_feature_geometry_matches_source_coordinates() {
        let normalized = normalize(&WktParser, vec![("Russafa", RUSSAFA)]).unwrap();
        let feature = &normalized.features.features[0];

        let value = feature.geometry.as_ref().unwrap().value.clone();
        let from_json = Geometry::<f64>::try_from(value).unwrap();
        let source = &normalized.by_id["Russafa"];

        assert_eq!(from_json.coords_count(), source.coords_count());
        for (a, b) in from_json.coords_iter().zip(source.coords_iter()) {
            approx::assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
            approx::assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-9);
        }

        assert_eq!(
            feature.bbox.as_deref(),
            Some(&[-0.37, 39.45, -0.34, 39.47][..])
        );
    }

    #[test]
    fn test_duplicate_id_is_fatal() {
        let err = normalize(&WktParser, vec![("EL CARME", CARME), ("EL CARME", CARME)])
            .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateNeighborhood(id) if id == "EL CARME"));
    }

    #[test]
    fn test_malformed_shape_is_fatal() {
        let err = normalize(
            &WktParser,
            vec![("EL CARME", CARME), ("Russafa", "POLYGON ((-0.37 39.46, oops))")],
        )
        .unwrap_err();

        match err {
            LoadError::Geometry {
                neighborhood,
                source: GeometryError::Malformed(_),
            } => assert_eq!(neighborhood, "Russafa"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collection_serializes_as_geojson() {
        let normalized = normalize(&WktParser, vec![("EL CARME", CARME)]).unwrap();
        let json = serde_json::to_value(&normalized.features).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["id"], "EL CARME");
        assert_eq!(json["features"][0]["geometry"]["type"], "Polygon");
        assert_eq!(json["features"][0]["properties"]["name"], "EL CARME");
    }
}
