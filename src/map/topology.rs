//! TopoJSON decoding into per-country polygons
//!
//! Handles the subset the world atlas uses: an optional quantization
//! `transform`, delta-encoded arcs, and `Polygon` / `MultiPolygon`
//! geometries inside a `GeometryCollection`.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Longitude/latitude in degrees
pub type Position = [f64; 2];
pub type Ring = Vec<Position>;
/// Outer ring first, then holes
pub type Polygon = Vec<Ring>;

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("Invalid topology JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Topology has no object named '{0}'")]
    MissingObject(String),

    #[error("Arc index {0} out of range")]
    BadArc(i64),

    #[error("Malformed {kind} geometry: {source}")]
    Geometry {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One named country and its polygons
#[derive(Debug, Clone, PartialEq)]
pub struct CountryFeature {
    pub id: Option<String>,
    pub name: String,
    pub polygons: Vec<Polygon>,
}

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    #[serde(default)]
    objects: HashMap<String, GeometryObject>,
    #[serde(default)]
    arcs: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
struct GeometryObject {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<HashMap<String, Value>>,
    #[serde(default)]
    arcs: Option<Value>,
    #[serde(default)]
    geometries: Vec<GeometryObject>,
}

impl GeometryObject {
    fn name(&self) -> Option<String> {
        let name = self.properties.as_ref()?.get("name")?.as_str()?.trim();
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }

    fn id(&self) -> Option<String> {
        match self.id.as_ref()? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Decode the named object of a TopoJSON document into country features.
/// Geometries that are not polygons or carry no `name` property are skipped.
pub fn decode(json: &str, object: &str) -> Result<Vec<CountryFeature>, TopologyError> {
    let topology: Topology = serde_json::from_str(json)?;
    let arcs = decode_arcs(&topology.arcs, topology.transform);

    let root = topology
        .objects
        .get(object)
        .ok_or_else(|| TopologyError::MissingObject(object.to_string()))?;

    let mut features = Vec::new();
    collect(root, &arcs, &mut features)?;
    Ok(features)
}

fn collect(
    geometry: &GeometryObject,
    arcs: &[Vec<Position>],
    out: &mut Vec<CountryFeature>,
) -> Result<(), TopologyError> {
    let kind = geometry.kind.as_deref().unwrap_or_default();
    let polygons = match kind {
        "GeometryCollection" => {
            for child in &geometry.geometries {
                collect(child, arcs, out)?;
            }
            return Ok(());
        }
        "Polygon" => {
            let rings: Vec<Vec<i64>> = parse_arcs(geometry, kind)?;
            vec![stitch_polygon(&rings, arcs)?]
        }
        "MultiPolygon" => {
            let polys: Vec<Vec<Vec<i64>>> = parse_arcs(geometry, kind)?;
            polys
                .iter()
                .map(|rings| stitch_polygon(rings, arcs))
                .collect::<Result<Vec<_>, _>>()?
        }
        _ => return Ok(()),
    };

    if let Some(name) = geometry.name() {
        out.push(CountryFeature {
            id: geometry.id(),
            name,
            polygons,
        });
    }
    Ok(())
}

fn parse_arcs<T: serde::de::DeserializeOwned + Default>(
    geometry: &GeometryObject,
    kind: &str,
) -> Result<T, TopologyError> {
    match &geometry.arcs {
        Some(value) => serde_json::from_value(value.clone()).map_err(|source| TopologyError::Geometry {
            kind: kind.to_string(),
            source,
        }),
        None => Ok(T::default()),
    }
}

/// Absolute coordinates for every arc
fn decode_arcs(raw: &[Vec<Vec<f64>>], transform: Option<Transform>) -> Vec<Vec<Position>> {
    raw.iter()
        .map(|arc| {
            let points = arc.iter().filter(|p| p.len() >= 2);
            match transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    points
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            [x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1]]
                        })
                        .collect::<Vec<Position>>()
                }
                None => points.map(|p| [p[0], p[1]]).collect::<Vec<Position>>(),
            }
        })
        .collect()
}

fn stitch_polygon(rings: &[Vec<i64>], arcs: &[Vec<Position>]) -> Result<Polygon, TopologyError> {
    rings.iter().map(|ring| stitch_ring(ring, arcs)).collect()
}

/// Join arcs into one ring. A negative index `!i` walks arc `i` backwards;
/// consecutive arcs share an endpoint, which is kept once.
fn stitch_ring(indices: &[i64], arcs: &[Vec<Position>]) -> Result<Ring, TopologyError> {
    let mut ring: Ring = Vec::new();
    for &index in indices {
        let (arc_index, reversed) = if index < 0 { (!index, true) } else { (index, false) };
        let arc = usize::try_from(arc_index)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(TopologyError::BadArc(index))?;

        ring.pop();
        if reversed {
            ring.extend(arc.iter().rev().copied());
        } else {
            ring.extend(arc.iter().copied());
        }
    }
    Ok(ring)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two squares sharing the edge x=1: arc 0 is the shared edge
    const SHARED_EDGE: &str = r#"{
        "type": "Topology",
        "arcs": [
            [[1, 0], [1, 1]],
            [[1, 1], [0, 1], [0, 0], [1, 0]],
            [[1, 0], [2, 0], [2, 1], [1, 1]]
        ],
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "id": "001", "arcs": [[0, 1]], "properties": {"name": "West"}},
                    {"type": "Polygon", "id": 2, "arcs": [[2, -1]], "properties": {"name": "East"}},
                    {"type": null},
                    {"type": "Polygon", "arcs": [[1]], "properties": {}}
                ]
            }
        }
    }"#;

    #[test]
    fn test_decode_shared_edges() {
        let features = decode(SHARED_EDGE, "countries").unwrap();
        assert_eq!(features.len(), 2);

        let west = &features[0];
        assert_eq!(west.name, "West");
        assert_eq!(west.id.as_deref(), Some("001"));
        assert_eq!(
            west.polygons[0][0],
            vec![[1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0], [1.0, 0.0]]
        );

        let east = &features[1];
        assert_eq!(east.id.as_deref(), Some("2"));
        assert_eq!(
            east.polygons[0][0],
            vec![[1.0, 0.0], [2.0, 0.0], [2.0, 1.0], [1.0, 1.0], [1.0, 0.0]]
        );
    }

    #[test]
    fn test_quantized_arcs_are_delta_decoded() {
        let json = r#"{
            "type": "Topology",
            "transform": {"scale": [0.5, 2.0], "translate": [-10.0, 5.0]},
            "arcs": [[[0, 0], [2, 0], [0, 1], [-2, -1]]],
            "objects": {"countries": {"type": "GeometryCollection", "geometries": [
                {"type": "MultiPolygon", "arcs": [[[0]], [[0]]], "properties": {"name": "Quant"}}
            ]}}
        }"#;
        let features = decode(json, "countries").unwrap();
        let ring = &features[0].polygons[0][0];
        assert_eq!(ring[0], [-10.0, 5.0]);
        assert_eq!(ring[1], [-9.0, 5.0]);
        assert_eq!(ring[2], [-9.0, 7.0]);
        assert_eq!(ring[3], [-10.0, 5.0]);
        assert_eq!(features[0].polygons.len(), 2);
    }

    #[test]
    fn test_missing_object() {
        let err = decode(SHARED_EDGE, "land").unwrap_err();
        assert!(matches!(err, TopologyError::MissingObject(name) if name == "land"));
    }

    #[test]
    fn test_bad_arc_index() {
        let json = r#"{"arcs": [[[0, 0], [1, 1]]], "objects": {"countries":
            {"type": "Polygon", "arcs": [[5]], "properties": {"name": "Broken"}}}}"#;
        assert!(matches!(decode(json, "countries"), Err(TopologyError::BadArc(5))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(decode("{", "countries"), Err(TopologyError::Json(_))));
    }
}
