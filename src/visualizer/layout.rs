/// One spectrum bar in cell coordinates relative to the drawing area.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bar {
    pub x: u16,
    pub width: u16,
    /// Height in eighths of a cell, so the top cell can use partial blocks.
    pub height_eighths: u32,
}

/// Horizontal gap between bars, in cells.
pub const BAR_GAP: u16 = 1;

/// Lay bins out left to right as fixed-width bars separated by `BAR_GAP`.
///
/// Bar width is `2.5 * width / bins` (at least one cell), so only the lower
/// part of the spectrum fits; bars that would start past the right edge are
/// dropped and the last one is clipped. Height is proportional to magnitude.
pub fn bar_layout(width: u16, height: u16, bins: &[u8]) -> Vec<Bar> {
    if width == 0 || height == 0 || bins.is_empty() {
        return Vec::new();
    }

    let bar_width = ((width as f32 / bins.len() as f32) * 2.5).round().max(1.0) as u16;
    let full = height as u32 * 8;

    let mut bars = Vec::new();
    let mut x: u16 = 0;
    for &magnitude in bins {
        if x >= width {
            break;
        }
        bars.push(Bar {
            x,
            width: bar_width.min(width - x),
            height_eighths: magnitude as u32 * full / 255,
        });
        x = x.saturating_add(bar_width + BAR_GAP);
    }
    bars
}

/// Vertical gradient stop for row `row` of `rows` (0 = top): purple at the
/// top fading to pink at the bottom.
pub fn gradient_rgb(row: u16, rows: u16) -> (u8, u8, u8) {
    const TOP: (u8, u8, u8) = (0x8b, 0x5c, 0xf6);
    const BOTTOM: (u8, u8, u8) = (0xec, 0x48, 0x99);

    let t = if rows <= 1 {
        0.0
    } else {
        row.min(rows - 1) as f32 / (rows - 1) as f32
    };
    let lerp = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
    (
        lerp(TOP.0, BOTTOM.0),
        lerp(TOP.1, BOTTOM.1),
        lerp(TOP.2, BOTTOM.2),
    )
}
