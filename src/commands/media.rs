use crate::constants::{
    BITMAP_CGI, DYNAMIC_OVERLAY_CGI, IMAGE_SIZE_CGI, JPEG_CGI, RTSP_PORT, VIDEO_STATUS_CGI,
};
use crate::error::{Result, VapixError};
use crate::protocol::{CommandParams, Query, check_range, parse_lines, serialize_flag};
use crate::vapix::VapixCam;
use async_trait::async_trait;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TextColor {
    Black,
    White,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TextBackgroundColor {
    Black,
    White,
    Transparent,
    Semitransparent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TextPosition {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StreamKind {
    /// Motion JPEG over HTTP
    Mjpeg,
    Rtsp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl From<ImageSize> for (u32, u32) {
    fn from(size: ImageSize) -> Self {
        (size.width, size.height)
    }
}

/// Parse an `imagesize.cgi` reply:
///
/// ```text
/// image width = 1920
/// image height = 1080
/// ```
pub fn parse_image_size(body: &str) -> Result<ImageSize> {
    let mut width = None;
    let mut height = None;
    for (key, value) in parse_lines(body) {
        let target = match key {
            "image width" => &mut width,
            "image height" => &mut height,
            _ => continue,
        };
        *target = Some(value.parse::<u32>().map_err(|e| {
            VapixError::UnexpectedResponse(format!("bad {} {:?}: {}", key, value, e))
        })?);
    }

    match (width, height) {
        (Some(width), Some(height)) => Ok(ImageSize { width, height }),
        _ => Err(VapixError::UnexpectedResponse(format!(
            "image size missing from {:?}",
            body.trim()
        ))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BitmapOptions {
    /// e.g. `640x480`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Video source; the client's channel when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<u32>,
    #[serde(
        rename = "squarepixel",
        serialize_with = "serialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub square_pixel: Option<bool>,
}

impl CommandParams for BitmapOptions {
    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JpegOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Video source; the client's channel when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<u32>,
    #[serde(
        rename = "squarepixel",
        serialize_with = "serialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub square_pixel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<u32>,
    #[serde(serialize_with = "serialize_flag", skip_serializing_if = "Option::is_none")]
    pub clock: Option<bool>,
    #[serde(serialize_with = "serialize_flag", skip_serializing_if = "Option::is_none")]
    pub date: Option<bool>,
    #[serde(serialize_with = "serialize_flag", skip_serializing_if = "Option::is_none")]
    pub text: Option<bool>,
    #[serde(rename = "textstring", skip_serializing_if = "Option::is_none")]
    pub text_string: Option<String>,
    #[serde(rename = "textcolor", skip_serializing_if = "Option::is_none")]
    pub text_color: Option<TextColor>,
    #[serde(rename = "textbackgroundcolor", skip_serializing_if = "Option::is_none")]
    pub text_background_color: Option<TextBackgroundColor>,
    /// Clockwise, in degrees: 0, 90, 180 or 270.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<u32>,
    #[serde(rename = "textpos", skip_serializing_if = "Option::is_none")]
    pub text_position: Option<TextPosition>,
    #[serde(
        rename = "overlayimage",
        serialize_with = "serialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub overlay_image: Option<bool>,
    /// `<x>x<y>`
    #[serde(rename = "overlaypos", skip_serializing_if = "Option::is_none")]
    pub overlay_position: Option<String>,
}

impl CommandParams for JpegOptions {
    fn validate(&self) -> Result<()> {
        check_range("compression", self.compression, 0, 100)?;
        match self.rotation {
            Some(r) if ![0, 90, 180, 270].contains(&r) => Err(VapixError::InvalidParameter(
                format!("rotation must be 0, 90, 180 or 270, got {}", r),
            )),
            _ => Ok(()),
        }
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[async_trait]
pub trait Media: Send + Sync {
    /// Current image size of the client's channel
    async fn get_image_size(&self) -> Result<ImageSize>;

    /// Status of one video source, or of all of them
    async fn get_video_status(&self, source: Option<u32>) -> Result<String>;

    async fn get_dynamic_text_overlay(&self) -> Result<String>;

    async fn set_dynamic_text_overlay(&self, text: &str, camera: Option<u32>) -> Result<String>;

    /// BMP snapshot. The bytes are returned as-is.
    async fn get_bitmap(&self, options: &BitmapOptions) -> Result<Vec<u8>>;

    /// JPEG snapshot. The bytes are returned as-is.
    async fn get_jpeg(&self, options: &JpegOptions) -> Result<Vec<u8>>;

    /// Live stream address for an external player, without credentials
    fn stream_url(&self, kind: StreamKind) -> Result<Url>;
}

impl VapixCam {
    fn snapshot_query<P: CommandParams>(&self, options: &P) -> Result<Query> {
        let mut query = options.to_query()?;
        if !query.contains_key("camera") {
            query.push("camera", self.camera);
        }
        Ok(query)
    }
}

#[async_trait]
impl Media for VapixCam {
    async fn get_image_size(&self) -> Result<ImageSize> {
        let query = Query::new().with("camera", self.camera);
        let text = self.cgi_get(IMAGE_SIZE_CGI, &query).await?;
        parse_image_size(&text)
    }

    async fn get_video_status(&self, source: Option<u32>) -> Result<String> {
        let mut query = Query::new();
        query.push_opt("status", source);
        self.cgi_get(VIDEO_STATUS_CGI, &query).await
    }

    async fn get_dynamic_text_overlay(&self) -> Result<String> {
        self.cgi_get(DYNAMIC_OVERLAY_CGI, &Query::new().with("action", "gettext"))
            .await
    }

    async fn set_dynamic_text_overlay(&self, text: &str, camera: Option<u32>) -> Result<String> {
        let mut query = Query::new().with("action", "settext").with("text", text);
        query.push_opt("camera", camera);
        self.cgi_get(DYNAMIC_OVERLAY_CGI, &query).await
    }

    async fn get_bitmap(&self, options: &BitmapOptions) -> Result<Vec<u8>> {
        let query = self.snapshot_query(options)?;
        self.cgi_get_bytes(BITMAP_CGI, &query).await
    }

    async fn get_jpeg(&self, options: &JpegOptions) -> Result<Vec<u8>> {
        let query = self.snapshot_query(options)?;
        self.cgi_get_bytes(JPEG_CGI, &query).await
    }

    fn stream_url(&self, kind: StreamKind) -> Result<Url> {
        match kind {
            StreamKind::Mjpeg => {
                self.build_url(&format!("/mjpg/{}/video.mjpg", self.camera), &Query::new())
            }
            StreamKind::Rtsp => {
                let mut url = Url::parse(&format!(
                    "rtsp://{}:{}/axis-media/media.amp",
                    self.host_for_url(),
                    RTSP_PORT
                ))?;
                url.query_pairs_mut()
                    .append_pair("camera", &self.camera.to_string());
                Ok(url)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size_parses_spaced_lines() {
        let size = parse_image_size("image width = 1920\r\nimage height = 1080\r\n").unwrap();
        assert_eq!(<(u32, u32)>::from(size), (1920, 1080));
        assert!(matches!(
            parse_image_size("image width = 1920\r\n"),
            Err(VapixError::UnexpectedResponse(_))
        ));
        assert!(parse_image_size("image width = wide\r\nimage height = 1\r\n").is_err());
    }

    #[test]
    fn jpeg_options_use_vapix_keys_and_flags() {
        let query = JpegOptions {
            resolution: Some("640x480".to_string()),
            clock: Some(true),
            date: Some(false),
            text_string: Some("Gate 3".to_string()),
            text_background_color: Some(TextBackgroundColor::Semitransparent),
            text_position: Some(TextPosition::Bottom),
            ..Default::default()
        }
        .to_query()
        .unwrap();
        assert_eq!(query.get("resolution"), Some("640x480"));
        assert_eq!(query.get("clock"), Some("1"));
        assert_eq!(query.get("date"), Some("0"));
        assert_eq!(query.get("textstring"), Some("Gate 3"));
        assert_eq!(query.get("textbackgroundcolor"), Some("semitransparent"));
        assert_eq!(query.get("textpos"), Some("bottom"));
        assert!(!query.contains_key("compression"));
    }

    #[test]
    fn jpeg_rotation_is_validated() {
        let options = JpegOptions {
            rotation: Some(45),
            ..Default::default()
        };
        assert!(matches!(
            options.to_query(),
            Err(VapixError::InvalidParameter(_))
        ));
    }

    #[test]
    fn snapshots_default_to_client_channel() {
        let cam = VapixCam::new("192.0.2.1", "root", "pass").with_camera(3);
        let query = cam.snapshot_query(&BitmapOptions::default()).unwrap();
        assert_eq!(query.get("camera"), Some("3"));

        let query = cam
            .snapshot_query(&BitmapOptions {
                camera: Some(2),
                square_pixel: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(query.get("camera"), Some("2"));
        assert_eq!(query.get("squarepixel"), Some("1"));
    }

    #[test]
    fn stream_urls_carry_no_credentials() {
        let cam = VapixCam::new("192.0.2.1", "root", "s3cret").with_camera(2);
        let mjpeg = cam.stream_url(StreamKind::Mjpeg).unwrap();
        assert_eq!(mjpeg.as_str(), "http://192.0.2.1/mjpg/2/video.mjpg");

        let rtsp = cam.stream_url(StreamKind::Rtsp).unwrap();
        assert_eq!(
            rtsp.as_str(),
            "rtsp://192.0.2.1:554/axis-media/media.amp?camera=2"
        );
        assert!(!rtsp.as_str().contains("s3cret"));
    }

    #[test]
    fn mjpeg_url_keeps_custom_port() {
        let cam = VapixCam::new("cam.local", "root", "pass").with_port(8080);
        assert_eq!(
            cam.stream_url(StreamKind::Mjpeg).unwrap().as_str(),
            "http://cam.local:8080/mjpg/1/video.mjpg"
        );
    }
}
