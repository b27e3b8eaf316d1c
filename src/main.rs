use std::cell::Cell;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{Result, anyhow};
use clap::Parser;
use egui::{Style, Vec2, Visuals};
use freehand::FreehandApp;
use freehand::cli::{Cli, DEFAULT_WINDOW, WindowSize};
use freehand::config::Settings;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let launch = cli.launch_options();
    let settings = Settings::load_or_default();

    let viewport = egui::ViewportBuilder::default().with_title("Freehand");
    let (viewport, window) = match launch.window {
        WindowSize::Fixed { width, height } => {
            let size = Vec2::new(width as f32, height as f32);
            (viewport.with_inner_size(size).with_resizable(false), size)
        }
        // the real size arrives with the first frame
        WindowSize::Desktop => (
            viewport.with_maximized(true),
            Vec2::new(DEFAULT_WINDOW[0] as f32, DEFAULT_WINDOW[1] as f32),
        ),
    };

    let failed = Rc::new(Cell::new(false));
    let app = FreehandApp::launch(&settings, launch.load_file, window, Rc::clone(&failed))?;

    let native_options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "Freehand",
        native_options,
        Box::new(move |ctx| {
            let style = Style {
                visuals: Visuals::dark(),
                ..Default::default()
            };
            ctx.egui_ctx.set_style(style);
            Ok(Box::new(app))
        }),
    )
    .map_err(|err| anyhow!("failed to open the window: {err}"))?;

    Ok(if failed.get() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
