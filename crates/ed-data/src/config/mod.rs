//! Configuration for the shadow store and the decoder

pub mod decoder_config;
pub mod null_handling;
pub mod store_config;

pub use decoder_config::*;
pub use null_handling::*;
pub use store_config::*;
