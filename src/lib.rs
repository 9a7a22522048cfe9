pub mod commands;
pub mod config;
pub mod constants;
pub mod error;
pub mod protocol;
pub mod vapix;

pub use commands::*;
pub use config::{CameraConfig, Scheme};
pub use error::{Result, VapixError};
pub use protocol::{CommandParams, Query, Toggle, YesNo};
pub use vapix::{CommandResponse, VapixCam};
