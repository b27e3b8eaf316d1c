use egui::epaint::Mesh;
use egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2};

use crate::store::{BufferError, RenderBuffer, Vertex};
use crate::view::View;

/// Screen-space width of committed strokes.
const LINE_WIDTH: f32 = 1.0;

/// Half length of the crosshair arms, in pixels.
const CROSSHAIR_ARM: f32 = 10.0;

/// GPU-side copy of the drawing, painted as line segments.
pub struct LineMesh {
    vertices: Vec<Vertex>,
    capacity: usize,
}

impl LineMesh {
    pub fn new(capacity: usize) -> Self {
        Self {
            vertices: Vec::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Paints the first `count` vertices as segments through `view` into
    /// `rect`.
    pub fn paint(&self, painter: &Painter, rect: Rect, view: &View, count: usize) {
        let count = count.min(self.vertices.len());
        let mut mesh = Mesh::default();
        for pair in self.vertices[..count].chunks_exact(2) {
            let from = rect.min + view.world_to_pixel(pair[0].position, rect.size()).to_vec2();
            let to = rect.min + view.world_to_pixel(pair[1].position, rect.size()).to_vec2();
            add_segment(&mut mesh, from, to, pair[0].color, pair[1].color);
        }
        if !mesh.is_empty() {
            painter.add(Shape::mesh(mesh));
        }
    }
}

impl RenderBuffer for LineMesh {
    fn update(&mut self, vertices: &[Vertex], offset: usize) -> Result<(), BufferError> {
        if offset > self.vertices.len() {
            return Err(BufferError::Gap {
                offset,
                len: self.vertices.len(),
            });
        }
        if offset + vertices.len() > self.capacity {
            return Err(BufferError::Overflow {
                offset,
                count: vertices.len(),
                capacity: self.capacity,
            });
        }
        self.vertices.truncate(offset);
        self.vertices.extend_from_slice(vertices);
        Ok(())
    }
}

/// A segment as a thin quad, blending between the endpoint colors.
fn add_segment(mesh: &mut Mesh, from: Pos2, to: Pos2, from_color: Color32, to_color: Color32) {
    let direction = (to - from).normalized();
    let direction = if direction.is_finite() && direction != Vec2::ZERO {
        direction
    } else {
        Vec2::X
    };
    let normal = direction.rot90() * (LINE_WIDTH / 2.0);

    let base = mesh.vertices.len() as u32;
    mesh.colored_vertex(from + normal, from_color);
    mesh.colored_vertex(from - normal, from_color);
    mesh.colored_vertex(to + normal, to_color);
    mesh.colored_vertex(to - normal, to_color);
    mesh.add_triangle(base, base + 1, base + 2);
    mesh.add_triangle(base + 2, base + 1, base + 3);
}

/// Uncommitted geometry of a stroke in progress, drawn on top.
pub fn paint_preview(painter: &Painter, rect: Rect, view: &View, vertices: &[Vertex]) {
    for pair in vertices.chunks_exact(2) {
        let from = rect.min + view.world_to_pixel(pair[0].position, rect.size()).to_vec2();
        let to = rect.min + view.world_to_pixel(pair[1].position, rect.size()).to_vec2();
        painter.line_segment([from, to], Stroke::new(LINE_WIDTH, pair[0].color));
    }
}

/// Screen-fixed cross at the window center.
pub fn paint_crosshair(painter: &Painter, rect: Rect, color: Color32) {
    let center = rect.center();
    let stroke = Stroke::new(LINE_WIDTH, color);
    painter.line_segment(
        [
            center - Vec2::new(CROSSHAIR_ARM, 0.0),
            center + Vec2::new(CROSSHAIR_ARM, 0.0),
        ],
        stroke,
    );
    painter.line_segment(
        [
            center - Vec2::new(0.0, CROSSHAIR_ARM),
            center + Vec2::new(0.0, CROSSHAIR_ARM),
        ],
        stroke,
    );
}
