//! "Please rotate" check.

/// Widest terminal, in columns, that still counts as a small screen.
pub const NARROW_COLS: u16 = 80;

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
}

impl Viewport {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    /// Narrow and portrait. Cells are about twice as tall as they are wide,
    /// so a row counts double.
    pub fn needs_rotation(&self) -> bool {
        self.cols <= NARROW_COLS && u32::from(self.rows) * 2 > u32::from(self.cols)
    }
}
