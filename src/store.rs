use std::collections::TryReserveError;

use egui::{Color32, Pos2};
use thiserror::Error;

/// Upper bound on the number of vertices a drawing may hold.
pub const DEFAULT_CAPACITY: usize = 100_000_000;

/// Vertices per straight segment.
pub const SEGMENT_VERTICES: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: Pos2,
    pub color: Color32,
}

impl Vertex {
    pub const fn new(position: Pos2, color: Color32) -> Self {
        Self { position, color }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("write at offset {offset} would leave a gap after {len} vertices")]
    Gap { offset: usize, len: usize },
    #[error("write of {count} vertices at offset {offset} overflows capacity {capacity}")]
    Overflow {
        offset: usize,
        count: usize,
        capacity: usize,
    },
}

/// The render pipeline's copy of the drawing.
///
/// Writes address the buffer by vertex offset; a write either lands
/// completely or not at all.
pub trait RenderBuffer {
    fn update(&mut self, vertices: &[Vertex], offset: usize) -> Result<(), BufferError>;
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("appending {requested} vertices to {committed} exceeds capacity {capacity}")]
    CapacityExceeded {
        requested: usize,
        committed: usize,
        capacity: usize,
    },
    #[error("render buffer rejected the write: {0}")]
    BufferRejected(#[from] BufferError),
    #[error("vertex storage could not grow: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// Append-only vertex history with a render-visible prefix.
///
/// `committed` is everything written this session, `visible` is the prefix
/// that gets drawn. `visible <= committed` holds at all times.
pub struct VertexStore<B> {
    vertices: Vec<Vertex>,
    visible: usize,
    capacity: usize,
    buffer: B,
}

impl<B: RenderBuffer> VertexStore<B> {
    pub fn new(capacity: usize, buffer: B) -> Self {
        Self {
            vertices: Vec::new(),
            visible: 0,
            capacity,
            buffer,
        }
    }

    /// Replaces the contents of an empty store with a loaded drawing.
    pub fn preload(&mut self, vertices: Vec<Vertex>) -> Result<usize, StoreError> {
        debug_assert!(self.vertices.is_empty(), "preload into a used store");
        if vertices.len() > self.capacity {
            return Err(StoreError::CapacityExceeded {
                requested: vertices.len(),
                committed: 0,
                capacity: self.capacity,
            });
        }
        self.buffer.update(&vertices, 0)?;
        self.visible = vertices.len();
        self.vertices = vertices;
        Ok(self.visible)
    }

    /// Appends whole segments at the end of the committed history.
    ///
    /// The render buffer is written first; when it refuses, the store is
    /// left untouched so both stay in step.
    pub fn append(&mut self, vertices: &[Vertex]) -> Result<(), StoreError> {
        debug_assert!(vertices.len() % SEGMENT_VERTICES == 0);
        let committed = self.vertices.len();
        if committed + vertices.len() > self.capacity {
            return Err(StoreError::CapacityExceeded {
                requested: vertices.len(),
                committed,
                capacity: self.capacity,
            });
        }
        self.vertices.try_reserve(vertices.len())?;
        self.buffer.update(vertices, committed)?;
        self.vertices.extend_from_slice(vertices);
        self.visible = self.vertices.len();
        Ok(())
    }

    /// Drops the hidden tail so that the next append continues from what
    /// is on screen.
    pub fn truncate_to_visible(&mut self) {
        self.vertices.truncate(self.visible);
    }

    /// Whether a stroke of `count` vertices still fits, keeping `count`
    /// slots of headroom for the segment that finishes it.
    pub fn has_room_for(&self, count: usize) -> bool {
        self.visible < self.capacity.saturating_sub(count)
    }

    pub fn scrub_back(&mut self, count: usize) {
        self.visible = self.visible.saturating_sub(count);
    }

    pub fn scrub_forward(&mut self, count: usize) {
        self.set_visible(self.visible.saturating_add(count));
    }

    pub fn set_visible(&mut self, visible: usize) {
        self.visible = visible.min(self.vertices.len());
    }

    pub fn hide_all(&mut self) {
        self.visible = 0;
    }

    pub fn reveal_all(&mut self) {
        self.visible = self.vertices.len();
    }

    pub fn committed(&self) -> usize {
        self.vertices.len()
    }

    pub fn visible(&self) -> usize {
        self.visible
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn visible_vertices(&self) -> &[Vertex] {
        &self.vertices[..self.visible]
    }

    pub fn buffer(&self) -> &B {
        &self.buffer
    }
}
