use std::f32::consts::PI;

use egui::{Color32, Pos2};

use crate::store::{SEGMENT_VERTICES, Vertex};

/// Vertices in one circle fan; every consecutive pair is a segment.
pub const CIRCLE_VERTICES: usize = 150;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    /// Follows the pointer, committing a segment on every move.
    #[default]
    Freehand,
    /// One straight segment from press to release.
    Ruler,
    /// A circle centered on the press point through the release point.
    Circle,
}

impl Tool {
    pub fn label(self) -> &'static str {
        match self {
            Tool::Freehand => "freehand",
            Tool::Ruler => "ruler",
            Tool::Circle => "circle",
        }
    }

    /// Vertices one finished stroke of this tool adds at release.
    pub fn stroke_vertices(self) -> usize {
        match self {
            Tool::Freehand | Tool::Ruler => SEGMENT_VERTICES,
            Tool::Circle => CIRCLE_VERTICES,
        }
    }

    /// Selecting the active tool again goes back to freehand.
    pub fn toggled(self, tool: Tool) -> Tool {
        if self == tool { Tool::Freehand } else { tool }
    }
}

pub fn segment(from: Pos2, to: Pos2, color: Color32) -> [Vertex; 2] {
    [Vertex::new(from, color), Vertex::new(to, color)]
}

/// Approximates the circle around `center` through `rim` with
/// `CIRCLE_VERTICES / 2` segments.
pub fn circle_fan(center: Pos2, rim: Pos2, color: Color32) -> Vec<Vertex> {
    let radius = center.distance(rim);
    let step = 4.0 * PI / CIRCLE_VERTICES as f32;
    let point = |i: usize| {
        let angle = i as f32 * step;
        Pos2::new(
            center.x + radius * angle.cos(),
            center.y + radius * angle.sin(),
        )
    };
    (0..CIRCLE_VERTICES / 2)
        .flat_map(|i| segment(point(i), point(i + 1), color))
        .collect()
}
