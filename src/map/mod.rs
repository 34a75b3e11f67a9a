//! Interactive world map: one clickable region per country

pub mod projection;
pub mod shapes;
pub mod topology;

use std::ops::Range;
use std::sync::Arc;

use egui::epaint::Mesh;
use egui::{Color32, Sense, Shape, Stroke};

use projection::ScreenTransform;
use shapes::CountryShape;
pub use topology::TopologyError;

/// Object holding country geometries in the world atlas
pub const COUNTRIES_OBJECT: &str = "countries";

const LAND: Color32 = Color32::from_rgb(51, 65, 85);
const LAND_HOVER: Color32 = Color32::from_rgb(71, 85, 105);
const LAND_SELECTED: Color32 = Color32::from_rgb(102, 126, 234);
const BORDER: Color32 = Color32::from_rgb(15, 23, 42);

fn fill_color(index: usize, selected: Option<usize>, hovered: Option<usize>) -> Color32 {
    if Some(index) == selected {
        LAND_SELECTED
    } else if Some(index) == hovered {
        LAND_HOVER
    } else {
        LAND
    }
}

/// Screen-space geometry for one transform; only vertex colours change between frames
#[derive(Debug, Clone)]
struct ScreenCache {
    transform: ScreenTransform,
    fill: Arc<Mesh>,
    borders: Vec<Shape>,
    /// Vertex range of each country inside `fill`
    spans: Vec<Range<usize>>,
    /// (selected, hovered) the fill colours currently reflect
    tinted: (Option<usize>, Option<usize>),
}

impl ScreenCache {
    fn build(shapes: &[CountryShape], transform: ScreenTransform) -> Self {
        let mut fill = Mesh::default();
        let mut spans = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let base = fill.vertices.len();
            for v in shape.vertices() {
                fill.colored_vertex(transform.to_screen(*v), LAND);
            }
            fill.indices.extend(shape.indices().iter().map(|i| base as u32 + i));
            spans.push(base..fill.vertices.len());
        }

        let border = Stroke::new(0.5, BORDER);
        let borders = shapes
            .iter()
            .flat_map(|shape| shape.rings())
            .map(|ring| Shape::closed_line(ring.iter().map(|p| transform.to_screen(*p)).collect(), border))
            .collect();

        Self {
            transform,
            fill: Arc::new(fill),
            borders,
            spans,
            tinted: (None, None),
        }
    }

    /// Recolour only the countries whose highlight changed
    fn tint(&mut self, selected: Option<usize>, hovered: Option<usize>) {
        let (old_selected, old_hovered) = self.tinted;
        if (old_selected, old_hovered) == (selected, hovered) {
            return;
        }
        let mesh = Arc::make_mut(&mut self.fill);
        for index in [old_selected, old_hovered, selected, hovered].into_iter().flatten() {
            if let Some(span) = self.spans.get(index) {
                let color = fill_color(index, selected, hovered);
                for vertex in &mut mesh.vertices[span.clone()] {
                    vertex.color = color;
                }
            }
        }
        self.tinted = (selected, hovered);
    }
}

#[derive(Debug, Clone, Default)]
pub struct WorldMap {
    shapes: Vec<CountryShape>,
    selected: Option<usize>,
    hovered: Option<usize>,
    cache: Option<ScreenCache>,
}

impl WorldMap {
    pub fn from_topojson(json: &str) -> Result<Self, TopologyError> {
        let features = topology::decode(json, COUNTRIES_OBJECT)?;
        let shapes = features.iter().filter_map(CountryShape::from_feature).collect();
        Ok(Self {
            shapes,
            selected: None,
            hovered: None,
            cache: None,
        })
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Index of the country under a projected point
    pub fn country_at(&self, p: [f64; 2]) -> Option<usize> {
        self.shapes.iter().position(|s| s.contains(p))
    }

    /// Mark exactly one region as selected and return its display name
    pub fn select(&mut self, index: usize) -> Option<&str> {
        let shape = self.shapes.get(index)?;
        self.selected = Some(index);
        Some(shape.name.as_str())
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.and_then(|i| self.shapes.get(i)).map(|s| s.name.as_str())
    }

    /// Paint the map into the remaining space. Returns the clicked country's name.
    pub fn show(&mut self, ui: &mut egui::Ui) -> Option<String> {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
        let transform = ScreenTransform::fit(response.rect);

        self.hovered = response
            .hover_pos()
            .and_then(|pos| self.country_at(transform.from_screen(pos)));

        let mut clicked = None;
        if response.clicked() {
            if let Some(index) = response
                .interact_pointer_pos()
                .and_then(|pos| self.country_at(transform.from_screen(pos)))
            {
                clicked = self.select(index).map(str::to_string);
            }
        }

        let cache = self.prepare(transform);
        painter.add(Shape::mesh(Arc::clone(&cache.fill)));
        painter.extend(cache.borders.iter().cloned());

        if let Some(i) = self.hovered {
            if let Some(shape) = self.shapes.get(i) {
                response.on_hover_text(shape.name.as_str());
            }
        }

        clicked
    }

    /// Reuse projected geometry while the transform is unchanged, then apply highlight colours
    fn prepare(&mut self, transform: ScreenTransform) -> &ScreenCache {
        if self.cache.as_ref().is_some_and(|c| c.transform != transform) {
            self.cache = None;
        }
        let (selected, hovered) = (self.selected, self.hovered);
        let cache = self.cache.get_or_insert_with(|| ScreenCache::build(&self.shapes, transform));
        cache.tint(selected, hovered);
        cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projection::natural_earth;

    const ATLAS: &str = r#"{
        "type": "Topology",
        "arcs": [
            [[130, 30], [145, 30], [145, 45], [130, 45], [130, 30]],
            [[-5, 42], [8, 42], [8, 51], [-5, 51], [-5, 42]]
        ],
        "objects": {"countries": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "id": "392", "arcs": [[0]], "properties": {"name": "Japan"}},
            {"type": "Polygon", "id": "250", "arcs": [[1]], "properties": {"name": "France"}}
        ]}}
    }"#;

    #[test]
    fn test_click_lookup_and_single_selection() {
        let mut map = WorldMap::from_topojson(ATLAS).unwrap();
        assert_eq!(map.len(), 2);

        let tokyo = map.country_at(natural_earth(139.7, 35.7)).unwrap();
        assert_eq!(map.select(tokyo), Some("Japan"));
        assert_eq!(map.selected_name(), Some("Japan"));

        let paris = map.country_at(natural_earth(2.35, 48.85)).unwrap();
        map.select(paris);
        assert_eq!(map.selected_name(), Some("France"));
    }

    #[test]
    fn test_ocean_click_hits_nothing() {
        let map = WorldMap::from_topojson(ATLAS).unwrap();
        assert_eq!(map.country_at(natural_earth(-30.0, 0.0)), None);
    }

    fn transform(width: f32, height: f32) -> ScreenTransform {
        ScreenTransform::fit(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(width, height)))
    }

    fn colors(map: &WorldMap, index: usize) -> Vec<Color32> {
        let cache = map.cache.as_ref().unwrap();
        cache.fill.vertices[cache.spans[index].clone()].iter().map(|v| v.color).collect()
    }

    #[test]
    fn test_geometry_reused_across_highlight_changes() {
        let mut map = WorldMap::from_topojson(ATLAS).unwrap();
        let t = transform(800.0, 400.0);
        let first = Arc::as_ptr(&map.prepare(t).fill);

        map.select(0);
        map.hovered = Some(1);
        let second = Arc::as_ptr(&map.prepare(t).fill);
        assert_eq!(first, second);
        assert!(colors(&map, 0).iter().all(|&c| c == LAND_SELECTED));
        assert!(colors(&map, 1).iter().all(|&c| c == LAND_HOVER));

        map.select(1);
        map.hovered = None;
        map.prepare(t);
        assert!(colors(&map, 0).iter().all(|&c| c == LAND));
        assert!(colors(&map, 1).iter().all(|&c| c == LAND_SELECTED));
    }

    #[test]
    fn test_geometry_rebuilt_on_resize() {
        let mut map = WorldMap::from_topojson(ATLAS).unwrap();
        map.select(0);
        let small = map.prepare(transform(800.0, 400.0)).fill.vertices[0].pos;
        let large = map.prepare(transform(1600.0, 800.0)).fill.vertices[0].pos;
        assert_ne!(small, large);
        assert!(colors(&map, 0).iter().all(|&c| c == LAND_SELECTED));
    }

    #[test]
    fn test_select_out_of_range_keeps_previous() {
        let mut map = WorldMap::from_topojson(ATLAS).unwrap();
        map.select(0);
        assert_eq!(map.select(7), None);
        assert_eq!(map.selected_name(), Some("Japan"));
    }
}
