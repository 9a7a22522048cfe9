use crate::constants::PARAM_CGI;
use crate::error::{Result, VapixError};
use crate::protocol::{CommandParams, Query, check_not_empty, check_range, parse_lines, strip_markup};
use crate::vapix::VapixCam;
use async_trait::async_trait;
use serde::Serialize;
use strum_macros::{AsRefStr, EnumString};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VideoCodec {
    H264,
    H265,
    Jpeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum H264Profile {
    Baseline,
    Main,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BitratePriority {
    None,
    Framerate,
    Quality,
}

/// Encoder settings stored in a stream profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileOptions {
    /// e.g. `1920x1080`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(rename = "videocodec", skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<VideoCodec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<u32>,
    #[serde(rename = "h264profile", skip_serializing_if = "Option::is_none")]
    pub h264_profile: Option<H264Profile>,
    /// Group of pictures length.
    #[serde(rename = "videokeyframeinterval", skip_serializing_if = "Option::is_none")]
    pub gop: Option<u32>,
    #[serde(rename = "videobitrate", skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    #[serde(rename = "videobitratepriority", skip_serializing_if = "Option::is_none")]
    pub bitrate_priority: Option<BitratePriority>,
}

impl CommandParams for ProfileOptions {
    fn validate(&self) -> Result<()> {
        check_range("compression", self.compression, 0, 100)?;
        check_range("fps", self.fps, 1, 120)?;
        if let Some(resolution) = &self.resolution {
            check_not_empty("resolution", resolution)?;
        }
        Ok(())
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

/// Profile names from a `root.StreamProfile` listing.
pub fn parse_profile_names(body: &str) -> Vec<String> {
    parse_lines(body)
        .filter(|(key, _)| key.ends_with(".Name"))
        .map(|(_, value)| value.to_string())
        .collect()
}

#[async_trait]
pub trait StreamProfiles: Send + Sync {
    /// Names of every stream profile
    async fn list_profiles(&self) -> Result<Vec<String>>;

    /// Check if a profile exists
    async fn check_profile(&self, name: &str) -> Result<bool>;

    /// Create a profile, refusing to overwrite an existing one
    async fn create_profile(&self, name: &str, options: &ProfileOptions) -> Result<String>;
}

#[async_trait]
impl StreamProfiles for VapixCam {
    async fn list_profiles(&self) -> Result<Vec<String>> {
        let query = Query::new()
            .with("action", "list")
            .with("group", "root.StreamProfile");
        let text = self.cgi_get(PARAM_CGI, &query).await?;
        Ok(parse_profile_names(&text))
    }

    async fn check_profile(&self, name: &str) -> Result<bool> {
        Ok(self.list_profiles().await?.iter().any(|p| p == name))
    }

    async fn create_profile(&self, name: &str, options: &ProfileOptions) -> Result<String> {
        check_not_empty("profile name", name)?;
        let parameters = options.to_query()?.to_urlencoded();

        // Not atomic with the add below; a concurrent writer can still race us.
        if self.check_profile(name).await? {
            return Err(VapixError::AlreadyExists(name.to_string()));
        }

        let query = Query::new()
            .with("action", "add")
            .with("template", "streamprofile")
            .with("group", "StreamProfile")
            .with("StreamProfile.S.Name", name)
            .with("StreamProfile.S.Parameters", parameters);

        info!(profile = %name, "creating stream profile");
        let text = self.cgi_get(PARAM_CGI, &query).await?;
        Ok(strip_markup(&text).trim().to_string())
    }
}
