pub mod crs;
pub mod error;
pub mod layer_reader;
pub mod locate_roughness;
