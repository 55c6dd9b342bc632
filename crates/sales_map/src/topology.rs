//! TopoJSON boundary loading.
//!
//! Decodes the shared arcs of a topology into closed rings, resolves the
//! geometries of one named object into [`Region`]s and derives a
//! representative point per region.

use crate::error::{Result, SalesMapError};

use geo::{Area, Centroid, LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, feature::Id};
use itertools::Either;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

type Position = (f64, f64);
type Properties = Map<String, Value>;

/// Quantization transform
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Transform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

/// TopoJSON geometry object
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum TopoGeometry {
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Properties>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        id: Option<Value>,
        #[serde(default)]
        properties: Option<Properties>,
    },
    GeometryCollection {
        #[serde(deserialize_with = "nullable_geometries")]
        geometries: Vec<TopoGeometry>,
        #[serde(default)]
        properties: Option<Properties>,
    },
    /// Points, lines and null geometries carry no area
    #[serde(other)]
    Unsupported,
}

/// A geometry slot that may hold `"type": null` (a feature without geometry)
#[derive(Deserialize)]
#[serde(untagged)]
enum GeometrySlot {
    Known(TopoGeometry),
    Null {
        #[serde(rename = "type")]
        _kind: Option<()>,
    },
}

impl From<GeometrySlot> for TopoGeometry {
    fn from(slot: GeometrySlot) -> Self {
        match slot {
            GeometrySlot::Known(geom) => geom,
            GeometrySlot::Null { .. } => TopoGeometry::Unsupported,
        }
    }
}

fn nullable_geometries<'de, D>(deserializer: D) -> std::result::Result<Vec<TopoGeometry>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = Vec::<GeometrySlot>::deserialize(deserializer)?;
    Ok(slots.into_iter().map(TopoGeometry::from).collect())
}

fn nullable_objects<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, TopoGeometry>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = BTreeMap::<String, GeometrySlot>::deserialize(deserializer)?;
    Ok(slots
        .into_iter()
        .map(|(name, slot)| (name, TopoGeometry::from(slot)))
        .collect())
}

/// TopoJSON document
#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(deserialize_with = "nullable_objects")]
    pub objects: BTreeMap<String, TopoGeometry>,
    pub arcs: Vec<Vec<Vec<f64>>>,
}

/// One area feature of the topology, keyed by its region property
#[derive(Debug, Clone)]
pub struct Region {
    pub key: String,
    pub shape: MultiPolygon<f64>,
    pub properties: Properties,
}

/// Representative point of a region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionCentroid {
    pub lat: f64,
    pub lon: f64,
}

impl Topology {
    /// Loads a TopoJSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| SalesMapError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let topo = Self::from_reader(std::io::BufReader::new(file))?;
        log::info!(
            "loaded topology {} ({} objects, {} arcs)",
            path.display(),
            topo.objects.len(),
            topo.arcs.len()
        );
        Ok(topo)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Arcs in absolute coordinates.
    ///
    /// Quantized topologies store each arc as deltas from the previous
    /// position; without a transform the positions are used as-is.
    pub fn decode_arcs(&self) -> Vec<Vec<Position>> {
        self.arcs
            .iter()
            .map(|arc| match self.transform {
                Some(t) => {
                    let (mut x, mut y) = (0.0, 0.0);
                    arc.iter()
                        .filter(|p| p.len() >= 2)
                        .map(|p| {
                            x += p[0];
                            y += p[1];
                            (
                                x * t.scale[0] + t.translate[0],
                                y * t.scale[1] + t.translate[1],
                            )
                        })
                        .collect()
                }
                None => arc
                    .iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| (p[0], p[1]))
                    .collect(),
            })
            .collect()
    }

    fn object(&self, object_name: &str) -> Result<&TopoGeometry> {
        self.objects
            .get(object_name)
            .ok_or_else(|| SalesMapError::UnknownObject(object_name.to_string()))
    }

    /// Resolves every area geometry of `object_name` into a [`Region`]
    /// keyed by `key_property`.
    pub fn regions(&self, object_name: &str, key_property: &str) -> Result<Vec<Region>> {
        let object = self.object(object_name)?;
        let arcs = self.decode_arcs();

        let mut regions = Vec::new();
        for geom in flatten(object) {
            let Some(resolved) = resolve_shape(geom, &arcs)? else {
                log::debug!("skipping non-area geometry in '{}'", object_name);
                continue;
            };
            let properties = resolved.properties.cloned().unwrap_or_default();
            let key = properties
                .get(key_property)
                .and_then(property_key)
                .ok_or_else(|| SalesMapError::MissingProperty {
                    object: object_name.to_string(),
                    property: key_property.to_string(),
                })?;
            regions.push(Region {
                key,
                shape: resolved.shape.into_multi_polygon(),
                properties,
            });
        }
        log::debug!("resolved {} regions from '{}'", regions.len(), object_name);
        Ok(regions)
    }

    /// GeoJSON FeatureCollection of the decoded object
    pub fn to_geojson(&self, object_name: &str) -> Result<Value> {
        let object = self.object(object_name)?;
        let arcs = self.decode_arcs();

        let mut features = Vec::new();
        for geom in flatten(object) {
            let Some(resolved) = resolve_shape(geom, &arcs)? else {
                continue;
            };
            features.push(Feature {
                bbox: None,
                geometry: Some(resolved.shape.geometry()),
                id: resolved.id.and_then(feature_id),
                properties: Some(resolved.properties.cloned().unwrap_or_default()),
                foreign_members: None,
            });
        }

        let collection = FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        };
        Ok(serde_json::to_value(&collection)?)
    }
}

impl Region {
    /// Area-weighted centroid as (lat, lon) = (y, x).
    /// Zero-area shapes have no centroid.
    pub fn centroid(&self) -> Option<RegionCentroid> {
        if self.shape.unsigned_area() <= 0.0 {
            return None;
        }
        self.shape.centroid().map(|p| RegionCentroid {
            lat: p.y(),
            lon: p.x(),
        })
    }
}

/// region key -> (lat, lon)
pub fn centroid_table(regions: &[Region]) -> BTreeMap<String, RegionCentroid> {
    let mut table = BTreeMap::new();
    for region in regions {
        match region.centroid() {
            Some(c) => {
                if table.insert(region.key.clone(), c).is_some() {
                    log::warn!("duplicate region key '{}', last one wins", region.key);
                }
            }
            None => log::warn!("region '{}' has no area, no centroid", region.key),
        }
    }
    table
}

/// Stringified region key (numeric codes are allowed)
pub fn property_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn flatten(geom: &TopoGeometry) -> Vec<&TopoGeometry> {
    match geom {
        TopoGeometry::GeometryCollection { geometries, .. } => {
            geometries.iter().flat_map(flatten).collect()
        }
        other => vec![other],
    }
}

/// Area geometry of one object, as declared in the topology
enum AreaShape {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl AreaShape {
    fn geometry(&self) -> Geometry {
        let value = match self {
            AreaShape::Polygon(p) => geojson::Value::from(p),
            AreaShape::MultiPolygon(mp) => geojson::Value::from(mp),
        };
        Geometry::new(value)
    }

    fn into_multi_polygon(self) -> MultiPolygon<f64> {
        match self {
            AreaShape::Polygon(p) => MultiPolygon::new(vec![p]),
            AreaShape::MultiPolygon(mp) => mp,
        }
    }
}

struct ResolvedGeometry<'a> {
    shape: AreaShape,
    properties: Option<&'a Properties>,
    id: Option<&'a Value>,
}

fn resolve_shape<'a>(
    geom: &'a TopoGeometry,
    arcs: &[Vec<Position>],
) -> Result<Option<ResolvedGeometry<'a>>> {
    let (shape, properties, id) = match geom {
        TopoGeometry::Polygon {
            arcs: rings,
            id,
            properties,
        } => (AreaShape::Polygon(build_polygon(rings, arcs)?), properties, id),
        TopoGeometry::MultiPolygon {
            arcs: polys,
            id,
            properties,
        } => {
            let polys = polys
                .iter()
                .map(|rings| build_polygon(rings, arcs))
                .collect::<Result<Vec<_>>>()?;
            (AreaShape::MultiPolygon(MultiPolygon::new(polys)), properties, id)
        }
        _ => return Ok(None),
    };
    Ok(Some(ResolvedGeometry {
        shape,
        properties: properties.as_ref(),
        id: id.as_ref(),
    }))
}

fn build_polygon(rings: &[Vec<i64>], arcs: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings
        .iter()
        .map(|r| stitch_ring(r, arcs).map(LineString::from))
        .collect::<Result<Vec<_>>>()?;
    if rings.is_empty() {
        return Ok(Polygon::new(LineString::new(vec![]), vec![]));
    }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

fn feature_id(value: &Value) -> Option<Id> {
    match value {
        Value::String(s) => Some(Id::String(s.clone())),
        Value::Number(n) => Some(Id::Number(n.clone())),
        _ => None,
    }
}

/// Joins the referenced arcs into one ring.
/// A negative index `i` means arc `!i` traversed backwards; consecutive arcs
/// share an endpoint, so the first point of every following arc is dropped.
fn stitch_ring(indices: &[i64], arcs: &[Vec<Position>]) -> Result<Vec<Position>> {
    let mut ring: Vec<Position> = Vec::new();
    for &index in indices {
        let arc_no = if index >= 0 { index } else { !index };
        let arc = usize::try_from(arc_no)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(SalesMapError::ArcIndex {
                index,
                len: arcs.len(),
            })?;

        let points = if index >= 0 {
            Either::Left(arc.iter())
        } else {
            Either::Right(arc.iter().rev())
        };
        let skip = usize::from(!ring.is_empty());
        ring.extend(points.skip(skip).copied());
    }
    Ok(ring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TWO_SQUARES_TOPOJSON;

    fn topo() -> Topology {
        Topology::from_reader(TWO_SQUARES_TOPOJSON.as_bytes()).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_decode_quantized_arcs() {
        let arcs = topo().decode_arcs();
        assert_eq!(arcs.len(), 3);
        // (1,0),(1,1) in quantized space
        assert_eq!(arcs[0], vec![(10.5, 40.0), (10.5, 42.0)]);
        assert_eq!(arcs[1].last(), Some(&(10.5, 40.0)));
    }

    #[test]
    fn test_decode_without_transform() {
        let t = Topology {
            transform: None,
            objects: BTreeMap::new(),
            arcs: vec![vec![vec![1.0, 2.0], vec![3.0, 4.0, 99.0]]],
        };
        assert_eq!(t.decode_arcs(), vec![vec![(1.0, 2.0), (3.0, 4.0)]]);
    }

    #[test]
    fn test_stitch_reversed_arc_closes_ring() {
        let arcs = topo().decode_arcs();
        let ring = stitch_ring(&[2, -1], &arcs).unwrap();
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[3], (10.5, 42.0));
    }

    #[test]
    fn test_arc_index_out_of_range() {
        let arcs = topo().decode_arcs();
        let err = stitch_ring(&[0, 7], &arcs).unwrap_err();
        assert!(matches!(err, SalesMapError::ArcIndex { index: 7, len: 3 }));
        assert!(stitch_ring(&[-9], &arcs).is_err());
    }

    #[test]
    fn test_regions_and_centroids() {
        let regions = topo().regions("test2", "KAM8").unwrap();
        let keys: Vec<_> = regions.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B"]);

        let a = regions[0].centroid().unwrap();
        assert!(approx(a.lon, 10.25));
        assert!(approx(a.lat, 41.0));

        let table = centroid_table(&regions);
        let b = table["B"];
        assert!(approx(b.lon, 10.75));
        assert!(approx(b.lat, 41.0));
    }

    #[test]
    fn test_centroid_with_hole() {
        let exterior = LineString::from(vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0), (0.0, 0.0)]);
        let hole = LineString::from(vec![(2.0, 0.0), (4.0, 0.0), (4.0, 4.0), (2.0, 4.0), (2.0, 0.0)]);
        let region = Region {
            key: "H".to_string(),
            shape: MultiPolygon::new(vec![Polygon::new(exterior, vec![hole])]),
            properties: Map::new(),
        };
        let c = region.centroid().unwrap();
        assert!(approx(c.lon, 1.0));
        assert!(approx(c.lat, 2.0));
    }

    #[test]
    fn test_degenerate_region_has_no_centroid() {
        let line = LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let region = Region {
            key: "L".to_string(),
            shape: MultiPolygon::new(vec![Polygon::new(line, vec![])]),
            properties: Map::new(),
        };
        assert!(region.centroid().is_none());
        assert!(centroid_table(&[region]).is_empty());
    }

    #[test]
    fn test_unknown_object() {
        let err = topo().regions("nope", "KAM8").unwrap_err();
        assert!(matches!(err, SalesMapError::UnknownObject(_)));
    }

    #[test]
    fn test_missing_key_property() {
        let err = topo().regions("test2", "CODE").unwrap_err();
        assert!(matches!(err, SalesMapError::MissingProperty { .. }));
    }

    #[test]
    fn test_numeric_key_and_unsupported_geometry() {
        let json = r#"{
          "type": "Topology",
          "objects": { "o": { "type": "GeometryCollection", "geometries": [
            { "type": "Point", "coordinates": [0, 0] },
            { "type": "MultiPolygon", "arcs": [[[0]]], "properties": { "KAM8": 75 } }
          ] } },
          "arcs": [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]]
        }"#;
        let topo = Topology::from_reader(json.as_bytes()).unwrap();
        let regions = topo.regions("o", "KAM8").unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].key, "75");
        let c = regions[0].centroid().unwrap();
        assert!(approx(c.lat, 1.0) && approx(c.lon, 1.0));

        let gj = topo.to_geojson("o").unwrap();
        let features = gj["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["geometry"]["type"], "MultiPolygon");
        assert_eq!(features[0]["properties"]["KAM8"], 75);
    }

    #[test]
    fn test_null_geometry_is_skipped() {
        let json = r#"{
          "type": "Topology",
          "objects": { "o": { "type": "GeometryCollection", "geometries": [
            { "type": null, "properties": { "KAM8": "X" } },
            { "type": "Polygon", "arcs": [[0]], "id": 7, "properties": { "KAM8": "Y" } },
            { "properties": { "KAM8": "Z" } }
          ] } },
          "arcs": [[[0, 0], [2, 0], [2, 2], [0, 2], [0, 0]]]
        }"#;
        let topo = Topology::from_reader(json.as_bytes()).unwrap();
        let regions = topo.regions("o", "KAM8").unwrap();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].key, "Y");

        let gj = topo.to_geojson("o").unwrap();
        let features = gj["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["id"], 7);
        assert_eq!(features[0]["properties"]["KAM8"], "Y");
    }

    #[test]
    fn test_null_top_level_object() {
        let json = r#"{ "type": "Topology", "objects": { "empty": { "type": null } }, "arcs": [] }"#;
        let topo = Topology::from_reader(json.as_bytes()).unwrap();
        assert!(topo.regions("empty", "KAM8").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_polygon_still_fails() {
        let json = r#"{ "type": "Topology", "objects": { "o": { "type": "Polygon", "arcs": "x" } }, "arcs": [] }"#;
        assert!(Topology::from_reader(json.as_bytes()).is_err());
    }

    #[test]
    fn test_to_geojson_keeps_properties() {
        let gj = topo().to_geojson("test2").unwrap();
        assert_eq!(gj["type"], "FeatureCollection");
        let features = gj["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[1]["properties"]["NAME"], "Beta");
        assert_eq!(features[0]["type"], "Feature");
        assert_eq!(features[0]["geometry"]["type"], "Polygon");
        let ring = features[0]["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
    }
}
