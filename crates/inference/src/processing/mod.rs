pub mod palette;
pub mod post;
