use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::{Block, Widget},
};

use crate::visualizer::{bar_layout, gradient_rgb};

const EIGHTHS: [&str; 9] = [" ", "▁", "▂", "▃", "▄", "▅", "▆", "▇", "█"];

/// Frequency bars drawn bottom-up, one bar per bin.
pub struct SpectrumWidget<'a> {
    bins: &'a [u8],
    block: Option<Block<'a>>,
}

impl<'a> SpectrumWidget<'a> {
    pub fn new(bins: &'a [u8]) -> Self {
        SpectrumWidget { bins, block: None }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

impl Widget for SpectrumWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = self.block {
            let inner = block.inner(area);
            block.render(area, buf);
            inner
        } else {
            area
        };

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        // Clear the surface every frame.
        for y in inner.top()..inner.bottom() {
            for x in inner.left()..inner.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol(" ");
                }
            }
        }

        let rows = inner.height;
        for bar in bar_layout(inner.width, inner.height, self.bins) {
            for row_from_bottom in 0..rows {
                let filled = bar
                    .height_eighths
                    .saturating_sub(row_from_bottom as u32 * 8)
                    .min(8) as usize;
                if filled == 0 {
                    break;
                }
                let row = rows - 1 - row_from_bottom;
                let (r, g, b) = gradient_rgb(row, rows);
                for dx in 0..bar.width {
                    let pos = (inner.x + bar.x + dx, inner.y + row);
                    if let Some(cell) = buf.cell_mut(pos) {
                        cell.set_symbol(EIGHTHS[filled]).set_fg(Color::Rgb(r, g, b));
                    }
                }
            }
        }
    }
}
