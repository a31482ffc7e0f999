//! Ecological Zone Classification
//!
//! Classifies a WGS84 coordinate into a named ecological zone (FAO Global
//! Ecological Zones, `gez_2010_wgs84.shp`) by strict point-in-polygon tests.
//!
//! Zones are loaded once and never mutated. If the shapefile cannot be read,
//! the resolver is empty and every query returns None.

use anyhow::{Context, Result};
use geo::{BoundingRect, Contains, Intersects, MultiPolygon, Point, Rect};
use shapefile::dbase::{FieldValue, Record};
use shapefile::Shape;
use std::path::Path;

/// Attribute holding the zone name in the GEZ 2010 layer
pub const DEFAULT_ZONE_NAME_FIELD: &str = "gez_name";

/// A named polygonal region
#[derive(Debug, Clone)]
pub struct EcologicalZone {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

impl EcologicalZone {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let bounds = geometry.bounding_rect();
        EcologicalZone {
            name: name.into(),
            geometry,
            bounds,
        }
    }

    /// Strict containment: points on the boundary are outside
    pub fn contains(&self, point: &Point<f64>) -> bool {
        match self.bounds {
            Some(bounds) if bounds.intersects(point) => self.geometry.contains(point),
            _ => false,
        }
    }
}

/// Point → zone name lookup over a fixed zone collection
#[derive(Debug, Clone, Default)]
pub struct ZoneResolver {
    zones: Vec<EcologicalZone>,
}

impl ZoneResolver {
    pub fn new(zones: Vec<EcologicalZone>) -> Self {
        ZoneResolver { zones }
    }

    /// Resolver with no zones; every query returns None
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load zones from a shapefile, degrading to an empty resolver on error
    ///
    /// The failure is logged once here and never surfaces to estimation.
    pub fn load(path: &Path, name_field: &str) -> Self {
        match Self::try_load(path, name_field) {
            Ok(resolver) => resolver,
            Err(e) => {
                tracing::warn!(
                    "Ecological zones unavailable ({:#}); zone lookups will return unknown",
                    e
                );
                Self::empty()
            }
        }
    }

    /// Load zones from a polygon shapefile and its `.dbf` attribute table
    ///
    /// Records without a usable name in `name_field` are skipped, as are
    /// shapes that are not plain polygons (null shapes, PolygonZ/PolygonM),
    /// so one odd record does not empty the whole layer.
    pub fn try_load(path: &Path, name_field: &str) -> Result<Self> {
        let mut reader = shapefile::Reader::from_path(path)
            .with_context(|| format!("Failed to open zone shapefile: {:?}", path))?;

        let mut zones = Vec::new();
        let mut unnamed = 0usize;
        let mut non_polygon = 0usize;

        for shape_record in reader.iter_shapes_and_records() {
            let (shape, record) = shape_record
                .with_context(|| format!("Failed to read zone record: {:?}", path))?;

            let polygon = match shape {
                Shape::Polygon(polygon) => polygon,
                _ => {
                    non_polygon += 1;
                    continue;
                }
            };

            match zone_name(&record, name_field) {
                Some(name) => {
                    zones.push(EcologicalZone::new(name, MultiPolygon::<f64>::from(polygon)))
                }
                None => unnamed += 1,
            }
        }

        if unnamed > 0 {
            tracing::warn!(
                "Skipped {} zone records without a '{}' attribute in {:?}",
                unnamed,
                name_field,
                path
            );
        }
        if non_polygon > 0 {
            tracing::warn!("Skipped {} non-polygon zone records in {:?}", non_polygon, path);
        }
        tracing::info!("Loaded {} ecological zone polygons from {:?}", zones.len(), path);

        Ok(ZoneResolver { zones })
    }

    /// Name of the first zone (in load order) strictly containing the point
    ///
    /// Overlapping zones are not deduplicated: the first match wins.
    /// Out-of-range coordinates are tested like any other and simply miss.
    pub fn classify(&self, latitude: f64, longitude: f64) -> Option<&str> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }

        let point = Point::new(longitude, latitude);
        self.zones
            .iter()
            .find(|zone| zone.contains(&point))
            .map(|zone| zone.name.as_str())
    }

    pub fn zone_names(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().map(|zone| zone.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

fn zone_name(record: &Record, name_field: &str) -> Option<String> {
    let name = match record.get(name_field) {
        Some(FieldValue::Character(Some(name))) => name.trim(),
        Some(FieldValue::Memo(name)) => name.trim(),
        _ => return None,
    };
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
