use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_WINDOW: [u32; 2] = [1000, 1000];

/// Freehand vector drawing canvas
#[derive(Parser, Debug)]
#[command(name = "freehand")]
#[command(version)]
#[command(after_help = "Drawings are saved on close, to LOAD_FILE when one was given.")]
pub struct Cli {
    /// Window width, or `-` for the desktop resolution
    pub width: Option<String>,

    /// Window height
    pub height: Option<String>,

    /// Drawing to open at startup; also the save target
    pub load_file: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowSize {
    Fixed { width: u32, height: u32 },
    Desktop,
}

#[derive(Debug, PartialEq, Eq)]
pub struct LaunchOptions {
    pub window: WindowSize,
    pub load_file: Option<PathBuf>,
}

impl Cli {
    pub fn launch_options(self) -> LaunchOptions {
        let default = WindowSize::Fixed {
            width: DEFAULT_WINDOW[0],
            height: DEFAULT_WINDOW[1],
        };
        match (self.width.as_deref(), self.height) {
            (Some("-"), height) => LaunchOptions {
                window: WindowSize::Desktop,
                // `- FILE` is accepted as well as `- _ FILE`
                load_file: self.load_file.or(height.map(PathBuf::from)),
            },
            (Some(width), Some(height)) => {
                let window = match (width.parse::<u32>(), height.parse::<u32>()) {
                    (Ok(width), Ok(height)) if width > 0 && height > 0 => {
                        WindowSize::Fixed { width, height }
                    }
                    _ => {
                        log::warn!("incorrect window size {width}x{height}, using the default");
                        default
                    }
                };
                LaunchOptions {
                    window,
                    load_file: self.load_file,
                }
            }
            (Some(width), None) => {
                log::warn!("window width {width} given without a height, using the default");
                LaunchOptions {
                    window: default,
                    load_file: None,
                }
            }
            (None, _) => LaunchOptions {
                window: default,
                load_file: None,
            },
        }
    }
}
