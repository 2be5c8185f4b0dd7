pub mod data_loader;
pub mod enricher;
pub mod error;
