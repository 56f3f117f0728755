pub mod cluster;
pub mod filter;
pub mod layer;
pub mod markers;
pub mod symbology;

pub use layer::*;
