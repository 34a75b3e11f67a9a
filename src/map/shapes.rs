//! Projected country outlines: triangulated fill and point hit testing

use earcutr::earcut;

use super::projection::natural_earth;
use super::topology::CountryFeature;

/// A projected polygon: outer ring first, then holes, closing point removed
type ProjectedPolygon = Vec<Vec<[f64; 2]>>;

#[derive(Debug, Clone)]
pub struct CountryShape {
    pub name: String,
    polygons: Vec<ProjectedPolygon>,
    bounds: [f64; 4],
    /// Triangle vertices in projected space
    vertices: Vec<[f64; 2]>,
    indices: Vec<u32>,
}

impl CountryShape {
    pub fn from_feature(feature: &CountryFeature) -> Option<Self> {
        let polygons: Vec<ProjectedPolygon> = feature
            .polygons
            .iter()
            .map(|rings| {
                rings
                    .iter()
                    .map(|ring| project_ring(ring))
                    .filter(|ring| ring.len() >= 3)
                    .collect::<ProjectedPolygon>()
            })
            .filter(|rings| !rings.is_empty())
            .collect();

        if polygons.is_empty() {
            return None;
        }

        let mut bounds = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
        for p in polygons.iter().flatten().flatten() {
            bounds[0] = bounds[0].min(p[0]);
            bounds[1] = bounds[1].min(p[1]);
            bounds[2] = bounds[2].max(p[0]);
            bounds[3] = bounds[3].max(p[1]);
        }

        let mut vertices = Vec::new();
        let mut indices = Vec::new();
        for rings in &polygons {
            triangulate(rings, &mut vertices, &mut indices);
        }

        Some(Self {
            name: feature.name.clone(),
            polygons,
            bounds,
            vertices,
            indices,
        })
    }

    /// Even-odd containment across every ring of each polygon
    pub fn contains(&self, p: [f64; 2]) -> bool {
        let [min_x, min_y, max_x, max_y] = self.bounds;
        if p[0] < min_x || p[0] > max_x || p[1] < min_y || p[1] > max_y {
            return false;
        }
        self.polygons.iter().any(|rings| {
            rings
                .iter()
                .fold(false, |inside, ring| inside ^ ring_contains(ring, p))
        })
    }

    pub fn rings(&self) -> impl Iterator<Item = &Vec<[f64; 2]>> {
        self.polygons.iter().flatten()
    }

    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn bounds(&self) -> [f64; 4] {
        self.bounds
    }
}

fn project_ring(ring: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut points: Vec<[f64; 2]> = ring.iter().map(|p| natural_earth(p[0], p[1])).collect();
    drop_closing_duplicate(&mut points);
    points
}

fn drop_closing_duplicate(points: &mut Vec<[f64; 2]>) {
    if points.len() >= 2 {
        let first = points[0];
        let last = points[points.len() - 1];
        if (first[0] - last[0]).abs() < 1e-12 && (first[1] - last[1]).abs() < 1e-12 {
            points.pop();
        }
    }
}

fn triangulate(rings: &[Vec<[f64; 2]>], vertices: &mut Vec<[f64; 2]>, indices: &mut Vec<u32>) {
    let mut coords: Vec<f64> = Vec::new();
    let mut holes: Vec<usize> = Vec::new();
    let mut count = 0usize;

    for (i, ring) in rings.iter().enumerate() {
        if i > 0 {
            holes.push(count);
        }
        for p in ring {
            coords.push(p[0]);
            coords.push(p[1]);
        }
        count += ring.len();
    }

    let triangles = match earcut(&coords, &holes, 2) {
        Ok(ix) => ix,
        Err(_) => return,
    };

    let base = vertices.len() as u32;
    vertices.extend(rings.iter().flatten().copied());
    indices.extend(triangles.into_iter().map(|i| base + i as u32));
}

/// Ray casting for a single closed ring
fn ring_contains(ring: &[[f64; 2]], p: [f64; 2]) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a[1] > p[1]) != (b[1] > p[1]) {
            let x = (b[0] - a[0]) * (p[1] - a[1]) / (b[1] - a[1]) + a[0];
            if p[0] < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::topology::Ring;

    fn square(x0: f64, y0: f64, size: f64) -> Ring {
        vec![[x0, y0], [x0 + size, y0], [x0 + size, y0 + size], [x0, y0 + size], [x0, y0]]
    }

    fn feature(name: &str, polygons: Vec<Vec<Ring>>) -> CountryFeature {
        CountryFeature {
            id: None,
            name: name.to_string(),
            polygons,
        }
    }

    #[test]
    fn test_contains_with_hole() {
        let shape = CountryShape::from_feature(&feature(
            "Donut",
            vec![vec![square(0.0, 0.0, 20.0), square(5.0, 5.0, 10.0)]],
        ))
        .unwrap();

        assert!(shape.contains(natural_earth(2.0, 2.0)));
        assert!(!shape.contains(natural_earth(10.0, 10.0)));
        assert!(!shape.contains(natural_earth(30.0, 2.0)));
    }

    #[test]
    fn test_multipolygon_contains_each_part() {
        let shape = CountryShape::from_feature(&feature(
            "Islands",
            vec![vec![square(0.0, 0.0, 5.0)], vec![square(50.0, 0.0, 5.0)]],
        ))
        .unwrap();

        assert!(shape.contains(natural_earth(2.0, 2.0)));
        assert!(shape.contains(natural_earth(52.0, 2.0)));
        assert!(!shape.contains(natural_earth(25.0, 2.0)));
    }

    #[test]
    fn test_triangulation_covers_square() {
        let shape = CountryShape::from_feature(&feature("Square", vec![vec![square(0.0, 0.0, 10.0)]])).unwrap();
        assert_eq!(shape.vertices().len(), 4);
        assert_eq!(shape.indices().len(), 6);
        assert!(shape.indices().iter().all(|&i| (i as usize) < shape.vertices().len()));
    }

    #[test]
    fn test_degenerate_feature_is_dropped() {
        let line = vec![[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]];
        assert!(CountryShape::from_feature(&feature("Line", vec![vec![line]])).is_none());
    }
}
