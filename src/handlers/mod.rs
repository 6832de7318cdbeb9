mod health;
mod heatmap;
mod predict;

pub use health::health;
pub use heatmap::heatmap;
pub use predict::predict;
