//! The input state machine: turns pointer, wheel and key events into
//! strokes, undo steps, scrubbing and view changes.

use std::collections::TryReserveError;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use egui::{Color32, Key, Modifiers, PointerButton, Pos2, Vec2};
use thiserror::Error;

use crate::colors::ColorPalette;
use crate::export;
use crate::state::{self, PersistError};
use crate::store::{RenderBuffer, SEGMENT_VERTICES, StoreError, Vertex, VertexStore};
use crate::tools::{Tool, circle_fan, segment};
use crate::undo::UndoStack;
use crate::view::View;

/// Vertices revealed or hidden per microsecond of a held arrow key.
const COARSE_SCRUB_PER_MICROSECOND: usize = 2;
const FINE_SCRUB_STEP: usize = 2;
const ROTATION_DEGREES_PER_SECOND: f32 = 80.0;
/// Wheel lines per e-fold of zoom.
const WHEEL_ZOOM_LINES: f32 = 3.0;

/// Raw input in window pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PointerMoved(Pos2),
    PointerButton {
        pos: Pos2,
        button: PointerButton,
        pressed: bool,
    },
    /// Wheel travel in lines, positive away from the user.
    Wheel(f32),
    Key {
        key: Key,
        pressed: bool,
        repeat: bool,
        modifiers: Modifiers,
    },
    FocusLost,
    CloseRequested,
}

/// What the shell should do after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    Continue,
    /// The final save happened; the window can go.
    Exit,
    /// Ask the user for a file and hand it to [`Session::save_as`].
    PickSavePath,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),
}

/// Time-driven action running while its key is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Continuous {
    #[default]
    None,
    ScrubCoarseFwd,
    ScrubCoarseBack,
    ScrubFineFwd,
    ScrubFineBack,
    ZoomIn,
    ZoomOut,
    RotateLeft,
    RotateRight,
}

impl Continuous {
    fn for_key(key: Key, command: bool) -> Option<Self> {
        let action = match key {
            Key::ArrowLeft => Self::ScrubCoarseBack,
            Key::ArrowRight => Self::ScrubCoarseFwd,
            Key::ArrowUp => Self::ScrubFineFwd,
            Key::ArrowDown => Self::ScrubFineBack,
            Key::Z if !command => Self::ZoomIn,
            Key::X => Self::ZoomOut,
            Key::Slash => Self::RotateLeft,
            Key::Period => Self::RotateRight,
            _ => return None,
        };
        Some(action)
    }

    fn is_scrub(self) -> bool {
        matches!(
            self,
            Self::ScrubCoarseFwd | Self::ScrubCoarseBack | Self::ScrubFineFwd | Self::ScrubFineBack
        )
    }

    fn is_view(self) -> bool {
        matches!(
            self,
            Self::ZoomIn | Self::ZoomOut | Self::RotateLeft | Self::RotateRight
        )
    }
}

/// Monotonic clock that is read and reset in one step.
#[derive(Clone, Copy, Debug)]
struct Stopwatch {
    started: Instant,
}

impl Stopwatch {
    fn restart(&mut self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.started);
        self.started = now;
        elapsed
    }
}

/// Everything one drawing window owns.
pub struct Session<B> {
    store: VertexStore<B>,
    undo: UndoStack,
    view: View,
    window: Vec2,
    tool: Tool,
    palette: ColorPalette,
    crosshair: bool,
    drawing: bool,
    panning: bool,
    /// Where the current stroke or pan continues from, in pixels.
    anchor: Pos2,
    cursor: Pos2,
    continuous: Continuous,
    clock: Stopwatch,
    save_path: Option<PathBuf>,
    save_dir: PathBuf,
}

impl<B: RenderBuffer> Session<B> {
    /// Whatever the store already shows becomes the undo baseline.
    pub fn new(
        store: VertexStore<B>,
        window: Vec2,
        save_dir: PathBuf,
        save_path: Option<PathBuf>,
        now: Instant,
    ) -> Self {
        Self {
            undo: UndoStack::with_baseline(store.visible()),
            store,
            view: View::for_window(window),
            window,
            tool: Tool::default(),
            palette: ColorPalette::default(),
            crosshair: false,
            drawing: false,
            panning: false,
            anchor: Pos2::ZERO,
            cursor: Pos2::ZERO,
            continuous: Continuous::None,
            clock: Stopwatch { started: now },
            save_path,
            save_dir,
        }
    }

    pub fn handle_event(&mut self, event: InputEvent, now: Instant) -> Result<Response, SessionError> {
        match event {
            InputEvent::PointerMoved(pos) => self.pointer_moved(pos)?,
            InputEvent::PointerButton {
                pos,
                button,
                pressed: true,
            } => self.button_pressed(pos, button),
            InputEvent::PointerButton {
                pos,
                button,
                pressed: false,
            } => self.button_released(pos, button)?,
            InputEvent::Wheel(lines) => self.view.zoom((lines / WHEEL_ZOOM_LINES).exp()),
            InputEvent::Key {
                key,
                pressed: true,
                repeat,
                modifiers,
            } => return self.key_pressed(key, repeat, modifiers, now),
            InputEvent::Key { key, pressed: false, .. } => self.key_released(key)?,
            InputEvent::FocusLost => self.focus_lost()?,
            InputEvent::CloseRequested => {
                self.save_logged();
                return Ok(Response::Exit);
            }
        }
        Ok(Response::Continue)
    }

    /// Advances the held continuous action by the time since the last tick.
    pub fn tick(&mut self, now: Instant) {
        let elapsed = match self.continuous {
            Continuous::None => return,
            _ => self.clock.restart(now),
        };
        let coarse = usize::try_from(elapsed.as_micros())
            .unwrap_or(usize::MAX)
            .saturating_mul(COARSE_SCRUB_PER_MICROSECOND);
        let seconds = elapsed.as_secs_f32();
        match self.continuous {
            Continuous::None => {}
            Continuous::ScrubCoarseBack => self.store.scrub_back(coarse),
            Continuous::ScrubCoarseFwd => self.store.scrub_forward(coarse),
            Continuous::ScrubFineBack => self.store.scrub_back(FINE_SCRUB_STEP),
            Continuous::ScrubFineFwd => self.store.scrub_forward(FINE_SCRUB_STEP),
            Continuous::ZoomIn => self.view.zoom((-seconds).exp()),
            Continuous::ZoomOut => self.view.zoom(seconds.exp()),
            Continuous::RotateLeft => self.view.rotate(seconds * ROTATION_DEGREES_PER_SECOND),
            Continuous::RotateRight => self.view.rotate(-seconds * ROTATION_DEGREES_PER_SECOND),
        }
    }

    /// Whether frames must keep coming without input.
    pub fn is_animating(&self) -> bool {
        self.continuous != Continuous::None
    }

    /// Follows a new window size; a view nobody has touched follows along.
    pub fn resize(&mut self, window: Vec2) {
        if window == self.window {
            return;
        }
        if self.view == View::for_window(self.window) {
            self.view = View::for_window(window);
        }
        self.window = window;
    }

    fn pointer_moved(&mut self, pos: Pos2) -> Result<(), SessionError> {
        self.cursor = pos;
        if self.panning {
            let delta = self.to_world(self.anchor) - self.to_world(pos);
            self.view.translate(delta);
            self.anchor = pos;
        } else if self.drawing
            && self.tool == Tool::Freehand
            && self.store.has_room_for(SEGMENT_VERTICES)
        {
            let vertices = segment(self.to_world(self.anchor), self.to_world(pos), self.color());
            if self.append(&vertices)? {
                self.anchor = pos;
            }
        }
        Ok(())
    }

    fn button_pressed(&mut self, pos: Pos2, button: PointerButton) {
        match button {
            PointerButton::Primary
                if self.continuous == Continuous::None
                    && self.store.has_room_for(self.tool.stroke_vertices()) =>
            {
                self.store.truncate_to_visible();
                self.drawing = true;
            }
            PointerButton::Middle => self.panning = true,
            _ => {}
        }
        self.anchor = pos;
        self.cursor = pos;
    }

    fn button_released(&mut self, pos: Pos2, button: PointerButton) -> Result<(), SessionError> {
        match button {
            PointerButton::Primary if self.drawing => self.finish_stroke(pos)?,
            PointerButton::Middle => self.panning = false,
            _ => {}
        }
        Ok(())
    }

    fn finish_stroke(&mut self, pos: Pos2) -> Result<(), SessionError> {
        self.drawing = false;
        self.cursor = pos;
        let vertices = self.stroke_to(pos);
        self.append(&vertices)?;
        self.checkpoint()
    }

    /// Geometry a release at `pos` would commit.
    fn stroke_to(&self, pos: Pos2) -> Vec<Vertex> {
        let from = self.to_world(self.anchor);
        let to = self.to_world(pos);
        match self.tool {
            Tool::Circle => circle_fan(from, to, self.color()),
            Tool::Freehand | Tool::Ruler => segment(from, to, self.color()).to_vec(),
        }
    }

    fn key_pressed(
        &mut self,
        key: Key,
        repeat: bool,
        modifiers: Modifiers,
        now: Instant,
    ) -> Result<Response, SessionError> {
        let command = modifiers.command || modifiers.ctrl;
        if repeat && !(command && key == Key::Z) {
            return Ok(Response::Continue);
        }
        let mut response = Response::Continue;
        if !self.drawing {
            match key {
                Key::S if command && modifiers.shift => response = Response::PickSavePath,
                Key::S if command => self.save_logged(),
                Key::E if command => self.export_logged(),
                Key::W => self.tool = self.tool.toggled(Tool::Ruler),
                Key::C => self.tool = self.tool.toggled(Tool::Circle),
                Key::R if modifiers.alt => self.hide_all(),
                Key::F if modifiers.alt => self.reveal_all(),
                Key::F => self.view = View::for_window(self.window),
                Key::Z if command => self.undo(),
                Key::B if command => self.crosshair = !self.crosshair,
                Key::B => self.view.set_size(self.window),
                _ => {
                    if let Some(action) = Continuous::for_key(key, command) {
                        self.continuous = action;
                        self.clock.restart(now);
                    }
                }
            }
        }
        self.palette.select_key(key);
        Ok(response)
    }

    fn key_released(&mut self, key: Key) -> Result<(), SessionError> {
        match key {
            Key::ArrowLeft | Key::ArrowRight | Key::ArrowUp | Key::ArrowDown => {
                if self.continuous.is_scrub() {
                    self.continuous = Continuous::None;
                }
                if !self.drawing {
                    self.checkpoint()?;
                }
            }
            Key::Z | Key::X | Key::Slash | Key::Period => {
                if self.continuous.is_view() {
                    self.continuous = Continuous::None;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Drops every held action; a stroke in progress ends where the
    /// pointer was last seen.
    fn focus_lost(&mut self) -> Result<(), SessionError> {
        self.continuous = Continuous::None;
        self.panning = false;
        if self.drawing {
            self.finish_stroke(self.cursor)?;
        }
        Ok(())
    }

    pub fn undo(&mut self) {
        let visible = self.undo.undo(self.store.visible());
        self.store.set_visible(visible);
    }

    fn hide_all(&mut self) {
        self.store.hide_all();
        self.undo.rebase(self.store.visible());
    }

    fn reveal_all(&mut self) {
        self.store.reveal_all();
        self.undo.rebase(self.store.visible());
    }

    fn checkpoint(&mut self) -> Result<(), SessionError> {
        if let Some(length) = self.undo.checkpoint(self.store.visible())? {
            log::trace!("recorded action of {length} vertices");
        }
        Ok(())
    }

    /// Returns false when the vertices were refused; only running out of
    /// memory is an error.
    fn append(&mut self, vertices: &[Vertex]) -> Result<bool, SessionError> {
        match self.store.append(vertices) {
            Ok(()) => Ok(true),
            Err(StoreError::OutOfMemory(err)) => Err(err.into()),
            Err(err @ StoreError::CapacityExceeded { .. }) => {
                log::debug!("stroke refused: {err}");
                Ok(false)
            }
            Err(err) => {
                log::warn!("stroke dropped: {err}");
                Ok(false)
            }
        }
    }

    /// Saves every committed vertex to the chosen file, or to a new
    /// autonamed one.
    pub fn save(&self) -> Result<PathBuf, PersistError> {
        let vertices = self.store.vertices();
        match &self.save_path {
            Some(path) => state::save_to(path, vertices).map(|()| path.clone()),
            None => state::save_autonamed(&self.save_dir, vertices),
        }
    }

    /// Makes `path` the save target and saves there.
    pub fn save_as(&mut self, path: PathBuf) -> Result<PathBuf, PersistError> {
        self.save_path = Some(path);
        self.save()
    }

    pub fn export(&self) -> Result<PathBuf, PersistError> {
        export::export_autonamed(&self.save_dir, self.store.vertices())
    }

    fn save_logged(&self) {
        match self.save() {
            Ok(path) => log::info!("saved {} vertices to {}", self.store.committed(), path.display()),
            Err(err) => log::error!("failed to save: {err}"),
        }
    }

    fn export_logged(&self) {
        match self.export() {
            Ok(path) => log::info!("exported {}", path.display()),
            Err(err) => log::error!("failed to export: {err}"),
        }
    }

    /// Rubber band of a ruler or circle stroke in progress; never stored.
    pub fn preview(&self) -> Vec<Vertex> {
        if !self.drawing || self.tool == Tool::Freehand {
            return Vec::new();
        }
        self.stroke_to(self.cursor)
    }

    pub fn status_line(&self) -> String {
        format!(
            "Freehand - {}/{} vertices - {}",
            self.store.visible(),
            self.store.committed(),
            self.tool.label()
        )
    }

    fn to_world(&self, pixel: Pos2) -> Pos2 {
        self.view.pixel_to_world(pixel, self.window)
    }

    fn color(&self) -> Color32 {
        self.palette.get_current_color()
    }

    pub fn store(&self) -> &VertexStore<B> {
        &self.store
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn crosshair(&self) -> bool {
        self.crosshair
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn continuous(&self) -> Continuous {
        self.continuous
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::LineMesh;
    use crate::state::tests::TempDir;
    use crate::tools::CIRCLE_VERTICES;

    // a power of two keeps pixel to world mapping exact
    const WINDOW: Vec2 = Vec2::new(128.0, 128.0);

    struct Harness {
        session: Session<LineMesh>,
        now: Instant,
        dir: TempDir,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_capacity(1_000)
        }

        fn with_capacity(capacity: usize) -> Self {
            Self::build(VertexStore::new(capacity, LineMesh::new(capacity)))
        }

        fn build(store: VertexStore<LineMesh>) -> Self {
            let dir = TempDir::new("session");
            let now = Instant::now();
            let session = Session::new(store, WINDOW, dir.0.clone(), None, now);
            Self { session, now, dir }
        }

        fn send(&mut self, event: InputEvent) -> Response {
            self.session.handle_event(event, self.now).unwrap()
        }

        fn button(&mut self, button: PointerButton, x: f32, y: f32, pressed: bool) {
            self.send(InputEvent::PointerButton {
                pos: Pos2::new(x, y),
                button,
                pressed,
            });
        }

        fn press(&mut self, x: f32, y: f32) {
            self.button(PointerButton::Primary, x, y, true);
        }

        fn release(&mut self, x: f32, y: f32) {
            self.button(PointerButton::Primary, x, y, false);
        }

        fn move_to(&mut self, x: f32, y: f32) {
            self.send(InputEvent::PointerMoved(Pos2::new(x, y)));
        }

        fn line(&mut self, from: (f32, f32), to: (f32, f32)) {
            self.press(from.0, from.1);
            self.release(to.0, to.1);
        }

        fn key_with(&mut self, key: Key, pressed: bool, modifiers: Modifiers) -> Response {
            self.send(InputEvent::Key {
                key,
                pressed,
                repeat: false,
                modifiers,
            })
        }

        fn key_down(&mut self, key: Key) -> Response {
            self.key_with(key, true, Modifiers::NONE)
        }

        fn key_up(&mut self, key: Key) {
            self.key_with(key, false, Modifiers::NONE);
        }

        fn ctrl(&mut self, key: Key) -> Response {
            self.key_with(key, true, Modifiers::CTRL)
        }

        fn alt(&mut self, key: Key) -> Response {
            self.key_with(key, true, Modifiers::ALT)
        }

        fn advance(&mut self, elapsed: Duration) {
            self.now += elapsed;
            self.session.tick(self.now);
        }

        fn visible(&self) -> usize {
            self.session.store().visible()
        }

        fn committed(&self) -> usize {
            self.session.store().committed()
        }
    }

    #[test]
    fn single_line_undo_and_reload() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (10.0, 0.0));
        assert_eq!((h.committed(), h.visible()), (2, 2));
        assert_eq!(
            h.session.store().vertices(),
            [
                Vertex::new(Pos2::new(0.0, 0.0), Color32::WHITE),
                Vertex::new(Pos2::new(10.0, 0.0), Color32::WHITE),
            ]
        );

        h.ctrl(Key::Z);
        assert_eq!((h.committed(), h.visible()), (2, 0));

        let path = h.session.save().unwrap();
        let mut fresh = VertexStore::new(1_000, LineMesh::new(1_000));
        let count = fresh.preload(state::load(&path).unwrap()).unwrap();
        assert_eq!(count, 2);
        assert_eq!((fresh.committed(), fresh.visible()), (2, 2));
        assert_eq!(fresh.vertices(), h.session.store().vertices());
    }

    #[test]
    fn freehand_commits_while_moving() {
        let mut h = Harness::new();
        h.press(0.0, 0.0);
        h.move_to(5.0, 0.0);
        assert_eq!(h.visible(), 2);
        h.move_to(10.0, 0.0);
        h.release(10.0, 5.0);
        assert_eq!((h.committed(), h.visible()), (6, 6));
        let positions: Vec<_> = h.session.store().vertices().iter().map(|v| v.position).collect();
        assert_eq!(
            positions,
            [
                Pos2::new(0.0, 0.0),
                Pos2::new(5.0, 0.0),
                Pos2::new(5.0, 0.0),
                Pos2::new(10.0, 0.0),
                Pos2::new(10.0, 0.0),
                Pos2::new(10.0, 5.0),
            ]
        );
        assert_eq!(h.session.undo_depth(), 1);
        h.ctrl(Key::Z);
        assert_eq!(h.visible(), 0);
    }

    #[test]
    fn ruler_commits_one_segment_on_release() {
        let mut h = Harness::new();
        h.key_down(Key::W);
        assert_eq!(h.session.tool(), Tool::Ruler);
        h.press(1.0, 1.0);
        h.move_to(20.0, 20.0);
        h.move_to(30.0, 40.0);
        assert_eq!(h.visible(), 0);
        assert_eq!(h.session.preview().len(), 2);
        h.release(30.0, 40.0);
        assert_eq!((h.committed(), h.visible()), (2, 2));
        assert!(h.session.preview().is_empty());
    }

    #[test]
    fn circle_stroke_commits_a_fan() {
        let mut h = Harness::new();
        h.key_down(Key::C);
        h.press(50.0, 50.0);
        h.move_to(55.0, 50.0);
        assert_eq!(h.session.preview().len(), CIRCLE_VERTICES);
        h.release(60.0, 50.0);
        assert_eq!((h.committed(), h.visible()), (150, 150));
        for v in h.session.store().vertices() {
            assert!((v.position.distance(Pos2::new(50.0, 50.0)) - 10.0).abs() < 1e-3);
        }
        h.key_down(Key::C);
        assert_eq!(h.session.tool(), Tool::Freehand);
    }

    #[test]
    fn undo_every_stroke_then_noop() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 1.0));
        h.key_down(Key::C);
        h.line((10.0, 10.0), (12.0, 10.0));
        h.key_down(Key::W);
        h.line((3.0, 3.0), (4.0, 4.0));
        assert_eq!(h.visible(), 2 + 150 + 2);
        assert_eq!(h.session.undo_depth(), 3);

        for _ in 0..3 {
            h.ctrl(Key::Z);
        }
        assert_eq!(h.visible(), 0);
        h.ctrl(Key::Z);
        assert_eq!(h.visible(), 0);
        assert_eq!(h.committed(), 154);
    }

    #[test]
    fn coarse_scrub_follows_elapsed_time_and_clamps() {
        let mut h = Harness::new();
        for i in 0..10 {
            let x = i as f32;
            h.line((x, 0.0), (x, 10.0));
        }
        assert_eq!(h.visible(), 20);

        h.key_down(Key::ArrowLeft);
        assert!(h.session.is_animating());
        h.advance(Duration::from_micros(3));
        assert_eq!(h.visible(), 14);
        h.advance(Duration::from_micros(100));
        assert_eq!(h.visible(), 0);
        h.key_up(Key::ArrowLeft);
        assert!(!h.session.is_animating());

        h.key_down(Key::ArrowRight);
        h.advance(Duration::from_micros(4));
        assert_eq!(h.visible(), 8);
        h.advance(Duration::from_secs(1));
        assert_eq!(h.visible(), 20);
        h.key_up(Key::ArrowRight);
    }

    #[test]
    fn fine_scrub_steps_by_one_segment() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        h.line((1.0, 0.0), (2.0, 0.0));

        h.key_down(Key::ArrowDown);
        h.advance(Duration::from_secs(5));
        assert_eq!(h.visible(), 2);
        for _ in 0..3 {
            h.advance(Duration::from_millis(1));
        }
        assert_eq!(h.visible(), 0);
        h.key_up(Key::ArrowDown);

        h.key_down(Key::ArrowUp);
        for _ in 0..5 {
            h.advance(Duration::from_millis(1));
        }
        assert_eq!(h.visible(), 4);
        h.key_up(Key::ArrowUp);
    }

    #[test]
    fn new_stroke_discards_scrubbed_tail() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        h.line((1.0, 0.0), (2.0, 0.0));
        h.line((2.0, 0.0), (3.0, 0.0));

        h.key_down(Key::ArrowDown);
        h.advance(Duration::from_millis(1));
        h.advance(Duration::from_millis(1));
        h.key_up(Key::ArrowDown);
        assert_eq!((h.committed(), h.visible()), (6, 2));

        h.line((50.0, 50.0), (60.0, 60.0));
        assert_eq!((h.committed(), h.visible()), (4, 4));
        assert_eq!(h.session.store().vertices()[2].position, Pos2::new(50.0, 50.0));

        h.alt(Key::F);
        assert_eq!(h.visible(), 4);
        h.ctrl(Key::Z);
        assert_eq!(h.visible(), 2);
    }

    #[test]
    fn stroke_after_hide_all_undoes_completely() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        h.line((1.0, 0.0), (2.0, 0.0));
        h.line((2.0, 0.0), (3.0, 0.0));
        h.alt(Key::R);
        assert_eq!(h.visible(), 0);

        h.key_down(Key::C);
        h.line((50.0, 50.0), (60.0, 50.0));
        assert_eq!((h.committed(), h.visible()), (150, 150));
        h.ctrl(Key::Z);
        assert_eq!(h.visible(), 0);
    }

    #[test]
    fn stroke_after_reveal_all_undoes_only_itself() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        h.line((1.0, 0.0), (2.0, 0.0));
        h.alt(Key::R);
        h.alt(Key::F);
        assert_eq!(h.visible(), 4);

        h.line((5.0, 5.0), (6.0, 6.0));
        h.ctrl(Key::Z);
        assert_eq!(h.visible(), 4);
        h.ctrl(Key::Z);
        assert_eq!(h.visible(), 2);
    }

    #[test]
    fn held_modifier_blocks_drawing() {
        let mut h = Harness::new();
        h.key_down(Key::X);
        h.press(0.0, 0.0);
        assert!(!h.session.is_drawing());
        h.release(5.0, 5.0);
        assert_eq!(h.committed(), 0);
        h.key_up(Key::X);
        h.line((0.0, 0.0), (5.0, 5.0));
        assert_eq!(h.committed(), 2);
    }

    #[test]
    fn keys_other_than_digits_are_ignored_mid_stroke() {
        let mut h = Harness::new();
        h.press(0.0, 0.0);
        h.key_down(Key::C);
        h.key_down(Key::ArrowLeft);
        h.key_down(Key::Num9);
        assert_eq!(h.session.tool(), Tool::Freehand);
        assert_eq!(h.session.continuous(), Continuous::None);
        h.release(4.0, 0.0);
        assert!(h.session.store().vertices().iter().all(|v| v.color == Color32::RED));
    }

    #[test]
    fn ctrl_turns_z_into_undo() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        h.ctrl(Key::Z);
        assert_eq!(h.visible(), 0);
        assert_eq!(h.session.continuous(), Continuous::None);

        h.key_down(Key::Z);
        assert_eq!(h.session.continuous(), Continuous::ZoomIn);
        h.advance(Duration::from_secs(1));
        let expected = 128.0 * (-1.0f32).exp();
        assert!((h.session.view().size().x - expected).abs() < 1e-3);
        h.key_up(Key::Z);
        assert!(!h.session.is_animating());
    }

    #[test]
    fn zoom_out_and_rotation_rates() {
        let mut h = Harness::new();
        h.key_down(Key::X);
        h.advance(Duration::from_millis(500));
        let expected = 128.0 * 0.5f32.exp();
        assert!((h.session.view().size().x - expected).abs() < 1e-3);
        h.key_up(Key::X);

        h.key_down(Key::Slash);
        h.advance(Duration::from_millis(500));
        assert!((h.session.view().rotation() - 40.0).abs() < 1e-3);
        h.key_up(Key::Slash);

        h.key_down(Key::Period);
        h.advance(Duration::from_millis(250));
        assert!((h.session.view().rotation() - 20.0).abs() < 1e-3);
        h.key_up(Key::Period);

        h.key_down(Key::F);
        assert_eq!(*h.session.view(), View::for_window(WINDOW));
    }

    #[test]
    fn wheel_zoom_is_exponential() {
        let mut h = Harness::new();
        h.send(InputEvent::Wheel(3.0));
        assert!((h.session.view().size().x - 128.0 * 1f32.exp()).abs() < 1e-3);
        h.send(InputEvent::Wheel(-3.0));
        assert!((h.session.view().size().x - 128.0).abs() < 1e-3);
    }

    #[test]
    fn middle_drag_pans_the_view() {
        let mut h = Harness::new();
        h.button(PointerButton::Middle, 10.0, 10.0, true);
        h.move_to(30.0, 15.0);
        assert_eq!(h.session.view().center(), Pos2::new(44.0, 59.0));
        h.button(PointerButton::Middle, 30.0, 15.0, false);
        h.move_to(80.0, 80.0);
        assert_eq!(h.session.view().center(), Pos2::new(44.0, 59.0));

        // strokes land in world coordinates
        h.line((50.0, 50.0), (60.0, 50.0));
        assert_eq!(h.session.store().vertices()[0].position, Pos2::new(30.0, 45.0));

        h.key_down(Key::B);
        assert_eq!(h.session.view().center(), Pos2::new(44.0, 59.0));
        h.key_down(Key::F);
        assert_eq!(h.session.view().center(), Pos2::new(64.0, 64.0));
    }

    #[test]
    fn focus_loss_completes_stroke_and_drops_modifiers() {
        let mut h = Harness::new();
        h.press(0.0, 0.0);
        h.move_to(3.0, 4.0);
        h.send(InputEvent::FocusLost);
        assert!(!h.session.is_drawing());
        assert_eq!(h.committed(), 4);
        assert_eq!(h.session.undo_depth(), 1);

        h.key_down(Key::ArrowLeft);
        h.send(InputEvent::FocusLost);
        assert!(!h.session.is_animating());
    }

    #[test]
    fn rejected_buffer_write_skips_the_stroke() {
        let mut h = Harness::build(VertexStore::new(1_000, LineMesh::new(2)));
        h.line((0.0, 0.0), (1.0, 0.0));
        h.line((1.0, 0.0), (2.0, 0.0));
        assert_eq!((h.committed(), h.visible()), (2, 2));
        assert_eq!(h.session.undo_depth(), 1);
        assert_eq!(h.session.store().buffer().len(), 2);
    }

    #[test]
    fn full_store_refuses_new_strokes() {
        let mut h = Harness::with_capacity(8);
        for i in 0..6 {
            let x = i as f32;
            h.line((x, 0.0), (x, 1.0));
        }
        assert_eq!(h.committed(), 6);
        h.key_down(Key::C);
        h.line((50.0, 50.0), (55.0, 50.0));
        assert_eq!(h.committed(), 6);
    }

    #[test]
    fn hide_and_reveal_everything() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        h.line((0.0, 1.0), (1.0, 1.0));
        h.alt(Key::R);
        assert_eq!(h.visible(), 0);
        h.alt(Key::F);
        assert_eq!(h.visible(), 4);
    }

    #[test]
    fn crosshair_and_status() {
        let mut h = Harness::new();
        assert!(!h.session.crosshair());
        h.ctrl(Key::B);
        assert!(h.session.crosshair());
        h.line((0.0, 0.0), (1.0, 0.0));
        assert_eq!(h.session.status_line(), "Freehand - 2/2 vertices - freehand");
    }

    #[test]
    fn close_saves_to_the_chosen_path() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        let target = h.dir.0.join("mine.draw");
        h.session.save_as(target.clone()).unwrap();
        h.line((2.0, 0.0), (3.0, 0.0));
        assert_eq!(h.send(InputEvent::CloseRequested), Response::Exit);
        assert_eq!(state::load(&target).unwrap().len(), 4);
        assert_eq!(h.session.save_path(), Some(target.as_path()));
    }

    #[test]
    fn save_shortcuts() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        let save_as = h.key_with(Key::S, true, Modifiers::CTRL | Modifiers::SHIFT);
        assert_eq!(save_as, Response::PickSavePath);
        assert_eq!(h.ctrl(Key::S), Response::Continue);
        h.ctrl(Key::E);
        let mut extensions: Vec<_> = std::fs::read_dir(&h.dir.0)
            .unwrap()
            .map(|entry| entry.unwrap().path().extension().unwrap().to_owned())
            .collect();
        extensions.sort();
        assert_eq!(extensions, ["draw", "html"]);
    }

    #[test]
    fn key_repeat_only_repeats_undo() {
        let mut h = Harness::new();
        h.line((0.0, 0.0), (1.0, 0.0));
        h.line((1.0, 0.0), (2.0, 0.0));
        let repeated = |key, modifiers| InputEvent::Key {
            key,
            pressed: true,
            repeat: true,
            modifiers,
        };
        h.send(repeated(Key::W, Modifiers::NONE));
        assert_eq!(h.session.tool(), Tool::Freehand);
        h.send(repeated(Key::Z, Modifiers::CTRL));
        h.send(repeated(Key::Z, Modifiers::CTRL));
        assert_eq!(h.visible(), 0);
    }

    #[test]
    fn loaded_drawing_is_the_undo_baseline() {
        let mut store = VertexStore::new(1_000, LineMesh::new(1_000));
        store.preload(segment(Pos2::ZERO, Pos2::new(9.0, 9.0), Color32::RED).to_vec()).unwrap();
        let mut h = Harness::build(store);
        h.line((0.0, 0.0), (1.0, 0.0));
        h.ctrl(Key::Z);
        h.ctrl(Key::Z);
        assert_eq!(h.visible(), 2);
    }

    #[test]
    fn untouched_view_follows_resize() {
        let mut h = Harness::new();
        h.session.resize(Vec2::new(200.0, 100.0));
        assert_eq!(*h.session.view(), View::for_window(Vec2::new(200.0, 100.0)));
        h.send(InputEvent::Wheel(1.0));
        let zoomed = *h.session.view();
        h.session.resize(Vec2::new(300.0, 300.0));
        assert_eq!(*h.session.view(), zoomed);
    }
}
