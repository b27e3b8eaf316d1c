pub mod cli;
pub mod colors;
pub mod config;
pub mod export;
pub mod render;
pub mod session;
pub mod state;
pub mod store;
pub mod tools;
pub mod undo;
pub mod view;

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, Result};
use egui::{Color32, Event, MouseWheelUnit, Pos2, Vec2, ViewportCommand};

use crate::config::Settings;
use crate::render::LineMesh;
use crate::session::{InputEvent, Response, Session};
use crate::store::VertexStore;

/// Wheel travel in points that counts as one line.
const POINTS_PER_LINE: f32 = 50.0;
const LINES_PER_PAGE: f32 = 10.0;

pub struct FreehandApp {
    session: Session<LineMesh>,
    background: Color32,
    crosshair: Color32,
    title: String,
    closing: bool,
    failed: Rc<Cell<bool>>,
}

impl FreehandApp {
    /// Sets up the drawing, loading `load_file` first when one is given.
    /// A drawing that cannot be loaded is fatal.
    pub fn launch(
        settings: &Settings,
        load_file: Option<PathBuf>,
        window: Vec2,
        failed: Rc<Cell<bool>>,
    ) -> Result<Self> {
        let mut store = VertexStore::new(settings.capacity, LineMesh::new(settings.capacity));
        if let Some(path) = &load_file {
            let vertices = state::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let count = store
                .preload(vertices)
                .context("failed to upload the loaded drawing")?;
            log::info!("loaded {count} vertices from {}", path.display());
        }
        let session = Session::new(
            store,
            window,
            settings.save_dir(),
            load_file,
            Instant::now(),
        );
        Ok(Self {
            session,
            background: settings.background_color(),
            crosshair: settings.crosshair_color(),
            title: String::new(),
            closing: false,
            failed,
        })
    }

    fn pump(&mut self, ctx: &egui::Context, origin: Pos2, now: Instant) {
        let (events, close) = ctx.input(|i| (i.events.clone(), i.viewport().close_requested()));
        let inputs = events
            .iter()
            .filter_map(|event| translate(event, origin))
            .chain(close.then_some(InputEvent::CloseRequested));
        for input in inputs {
            match self.session.handle_event(input, now) {
                Ok(Response::Continue) => {}
                Ok(Response::Exit) => {
                    self.closing = true;
                    break;
                }
                Ok(Response::PickSavePath) => self.pick_save_path(),
                Err(err) => {
                    log::error!("{err}, shutting down");
                    self.failed.set(true);
                    self.closing = true;
                    ctx.send_viewport_cmd(ViewportCommand::Close);
                    break;
                }
            }
        }
    }

    fn pick_save_path(&mut self) {
        let dialog = rfd::FileDialog::new()
            .add_filter("drawing", &[state::DRAWING_EXTENSION])
            .set_file_name(format!("drawing.{}", state::DRAWING_EXTENSION));
        let Some(path) = dialog.save_file() else {
            return;
        };
        match self.session.save_as(path) {
            Ok(path) => log::info!("saved to {}", path.display()),
            Err(err) => log::error!("failed to save: {err}"),
        }
    }

    fn update_title(&mut self, ctx: &egui::Context) {
        let title = self.session.status_line();
        if title != self.title {
            ctx.send_viewport_cmd(ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }
}

impl eframe::App for FreehandApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(self.background))
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let painter = ui.painter_at(rect);
                self.session.resize(rect.size());
                if !self.closing {
                    self.pump(ctx, rect.min, now);
                }
                self.session.tick(now);

                let view = self.session.view();
                let store = self.session.store();
                store.buffer().paint(&painter, rect, view, store.visible());
                render::paint_preview(&painter, rect, view, &self.session.preview());
                if self.session.crosshair() {
                    render::paint_crosshair(&painter, rect, self.crosshair);
                }
            });

        self.update_title(ctx);
        // reactive repaint waits for input; held keys need every frame
        if self.session.is_animating() {
            ctx.request_repaint();
        }
    }
}

fn translate(event: &Event, origin: Pos2) -> Option<InputEvent> {
    let local = |pos: Pos2| (pos - origin).to_pos2();
    let input = match event {
        Event::PointerMoved(pos) => InputEvent::PointerMoved(local(*pos)),
        Event::PointerButton {
            pos,
            button,
            pressed,
            ..
        } => InputEvent::PointerButton {
            pos: local(*pos),
            button: *button,
            pressed: *pressed,
        },
        Event::MouseWheel { unit, delta, .. } => InputEvent::Wheel(wheel_lines(*unit, delta.y)),
        Event::Key {
            key,
            pressed,
            repeat,
            modifiers,
            ..
        } => InputEvent::Key {
            key: *key,
            pressed: *pressed,
            repeat: *repeat,
            modifiers: *modifiers,
        },
        Event::WindowFocused(false) => InputEvent::FocusLost,
        _ => return None,
    };
    Some(input)
}

fn wheel_lines(unit: MouseWheelUnit, delta: f32) -> f32 {
    match unit {
        MouseWheelUnit::Line => delta,
        MouseWheelUnit::Point => delta / POINTS_PER_LINE,
        MouseWheelUnit::Page => delta * LINES_PER_PAGE,
    }
}
