pub mod footer;
pub mod header;
pub mod utils;

pub use footer::{draw_footer, Tone};
pub use header::{draw_header, HeaderInfo};
pub use utils::{availability_color, availability_symbol, truncate};
