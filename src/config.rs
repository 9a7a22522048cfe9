use crate::constants::{DEFAULT_CAMERA, DEFAULT_TIMEOUT, HTTP_PORT};
use crate::vapix::VapixCam;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::{AsRefStr, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => HTTP_PORT,
            Scheme::Https => 443,
        }
    }
}

/// Connection settings for one camera, loadable from any serde format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub scheme: Scheme,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_camera")]
    pub camera: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_camera() -> u32 {
    DEFAULT_CAMERA
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

impl CameraConfig {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
            scheme: Scheme::default(),
            port: None,
            camera: DEFAULT_CAMERA,
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl VapixCam {
    pub fn from_config(config: &CameraConfig) -> Self {
        let cam = VapixCam::new(&config.host, &config.username, &config.password)
            .with_scheme(config.scheme)
            .with_camera(config.camera)
            .with_timeout(config.timeout());

        match config.port {
            Some(port) => cam.with_port(port),
            None => cam,
        }
    }
}

impl From<CameraConfig> for VapixCam {
    fn from(config: CameraConfig) -> Self {
        VapixCam::from_config(&config)
    }
}
