pub mod error;
pub mod consts;
pub mod timecode;
pub mod asset;
pub mod frame;
pub mod decode;
pub mod raster;
pub mod sharpness;
pub mod analyze;
