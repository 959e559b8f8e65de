pub mod extract;
pub mod fetch;
pub mod score;
pub mod train;
