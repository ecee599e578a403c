pub const DEFAULT_BAR_WIDTH: usize = 50;
pub const FILLED_GLYPH: char = '\u{2588}';
pub const EMPTY_GLYPH: char = '\u{2591}';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BarStyle {
    pub width: usize,
    pub filled: char,
    pub empty: char,
}

impl Default for BarStyle {
    fn default() -> Self {
        BarStyle {
            width: DEFAULT_BAR_WIDTH,
            filled: FILLED_GLYPH,
            empty: EMPTY_GLYPH,
        }
    }
}

impl BarStyle {
    /// Filled slots are `percent` of `width`, rounded; out-of-range input is clamped.
    pub fn render(&self, percent: f64) -> String {
        let ratio = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0) / 100.0
        };
        let filled = ((ratio * self.width as f64).round() as usize).min(self.width);
        let mut bar = String::with_capacity(self.width * self.filled.len_utf8());
        bar.extend(std::iter::repeat_n(self.filled, filled));
        bar.extend(std::iter::repeat_n(self.empty, self.width - filled));
        bar
    }
}

pub fn generate_usage_bar(percent: f64, width: usize) -> String {
    BarStyle {
        width,
        ..BarStyle::default()
    }
    .render(percent)
}
