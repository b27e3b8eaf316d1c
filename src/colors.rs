use egui::{Color32, Key};

pub const BACKGROUND: Color32 = Color32::from_rgb(18, 20, 31);
pub const CROSSHAIR: Color32 = Color32::from_rgba_premultiplied(160, 160, 160, 160);

const PALETTE: [Color32; 10] = [
    Color32::from_rgb(18, 20, 31),
    Color32::from_rgb(233, 243, 255),
    Color32::from_rgb(127, 216, 240),
    Color32::from_rgb(228, 64, 168),
    Color32::from_rgb(231, 228, 180),
    Color32::from_rgb(115, 124, 242),
    Color32::from_rgb(126, 218, 177),
    Color32::from_rgb(206, 173, 243),
    Color32::from_rgb(130, 134, 133),
    Color32::from_rgb(255, 0, 0),
];

/// Stroke colors bound to the digit keys. Drawing starts in plain white,
/// which is not one of the slots.
pub struct ColorPalette {
    colors: [Color32; 10],
    current: Color32,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self {
            colors: PALETTE,
            current: Color32::WHITE,
        }
    }
}

impl ColorPalette {
    /// Switches to the slot bound to a digit key. Returns false for any
    /// other key.
    pub fn select_key(&mut self, key: Key) -> bool {
        match digit(key) {
            Some(slot) => {
                self.current = self.colors[slot];
                true
            }
            None => false,
        }
    }

    pub fn get_current_color(&self) -> Color32 {
        self.current
    }
}

fn digit(key: Key) -> Option<usize> {
    let slot = match key {
        Key::Num0 => 0,
        Key::Num1 => 1,
        Key::Num2 => 2,
        Key::Num3 => 3,
        Key::Num4 => 4,
        Key::Num5 => 5,
        Key::Num6 => 6,
        Key::Num7 => 7,
        Key::Num8 => 8,
        Key::Num9 => 9,
        _ => return None,
    };
    Some(slot)
}

/// Builds a color from raw channel bytes, keeping them exactly as given.
pub fn from_channels([r, g, b, a]: [u8; 4]) -> Color32 {
    Color32::from_rgba_premultiplied(r, g, b, a)
}
