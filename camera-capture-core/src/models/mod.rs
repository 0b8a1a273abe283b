pub mod asset;
pub mod camera;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod frame;
pub mod lighting;
pub mod request;
pub mod state;
