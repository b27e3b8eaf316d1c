use std::io::{self, Write};
use std::path::{Path, PathBuf};

use egui::Rect;

use crate::state::{PersistError, write_autonamed};
use crate::store::Vertex;

pub const EXPORT_EXTENSION: &str = "html";

/// Writes an HTML page holding one SVG `<line>` per stored segment, with
/// the drawing's bounding box moved to the origin.
pub fn write_svg<W: Write>(mut out: W, vertices: &[Vertex]) -> io::Result<()> {
    let bounds = Rect::from_points(&vertices.iter().map(|v| v.position).collect::<Vec<_>>());
    let width = (bounds.width() + 1.0) as u32;
    let height = (bounds.height() + 1.0) as u32;

    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html>")?;
    writeln!(out, "<body style=\"background-color:#000000;\">")?;
    writeln!(out, "<h1>svg</h1>")?;
    writeln!(out, "<svg width=\"{width}\" height=\"{height}\">")?;
    for pair in vertices.chunks_exact(2) {
        let from = pair[0].position - bounds.min;
        let to = pair[1].position - bounds.min;
        let [r, g, b, a] = pair[0].color.to_array();
        let alpha = f32::from(a) / 255.0;
        writeln!(
            out,
            "<line x1=\"{:.6}\" y1=\"{:.6}\" x2=\"{:.6}\" y2=\"{:.6}\" \
             style=\"stroke:rgba({r},{g},{b},{alpha:.3});stroke-width:1\" />",
            from.x, from.y, to.x, to.y
        )?;
    }
    write!(out, "</svg>\n</body>\n</html>")?;
    out.flush()
}

/// Exports under a fresh `<nanoseconds>.html` name in `dir`.
pub fn export_autonamed(dir: &Path, vertices: &[Vertex]) -> Result<PathBuf, PersistError> {
    if vertices.is_empty() {
        return Err(PersistError::Empty);
    }
    write_autonamed(dir, EXPORT_EXTENSION, |out| write_svg(out, vertices))
}
