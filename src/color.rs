use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use rusty_waterfall::data::waterfall::BarDirection;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// starting at `hue_offset` degrees.
pub fn generate_palette(n: usize, hue_offset: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (hue_offset + (i as f32 / n as f32) * 360.0) % 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Chart colours
// ---------------------------------------------------------------------------

/// Fill colours for waterfall bars and comparison series.
#[derive(Debug, Clone)]
pub struct ChartPalette {
    pub increasing: Color32,
    pub decreasing: Color32,
    pub total: Color32,
    pub connector: Color32,
    pub series: Vec<Color32>,
}

impl Default for ChartPalette {
    fn default() -> Self {
        // blue and orange
        let series = generate_palette(2, 200.0);
        Self {
            increasing: Color32::from_rgb(61, 153, 112),
            decreasing: Color32::from_rgb(214, 69, 65),
            total: Color32::from_rgb(70, 110, 180),
            connector: Color32::from_rgb(63, 63, 63),
            series,
        }
    }
}

impl ChartPalette {
    pub fn bar_color(&self, direction: BarDirection) -> Color32 {
        match direction {
            BarDirection::Increasing => self.increasing,
            BarDirection::Decreasing => self.decreasing,
            BarDirection::Total => self.total,
        }
    }

    /// Colour of comparison series `i`, translucent so overlaps stay visible.
    pub fn series_color(&self, i: usize) -> Color32 {
        let c = self.series.get(i).copied().unwrap_or(Color32::GRAY);
        Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), 150)
    }
}
