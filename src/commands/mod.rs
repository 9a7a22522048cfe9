pub mod image_settings;
pub mod media;
pub mod presets;
pub mod ptz;
pub mod stream_profile;
pub mod system_info;
pub mod user_management;

pub use image_settings::*;
pub use media::*;
pub use presets::*;
pub use ptz::*;
pub use stream_profile::*;
pub use system_info::*;
pub use user_management::*;
