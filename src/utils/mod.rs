pub mod coordinate;
pub mod embedding;
pub mod image;
