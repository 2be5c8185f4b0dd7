pub mod bitmap_font;
pub mod error;
pub mod font_safe;
pub mod renderer;
