mod week_grid;

pub use week_grid::{draw_week_grid, DayColumn, GridCursor};
