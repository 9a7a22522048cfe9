use crate::constants::PARAM_CGI;
use crate::error::{Result, VapixError};
use crate::protocol::{
    CommandParams, Query, Toggle, YesNo, check_not_empty, check_range, serialize_flag,
};
use crate::vapix::VapixCam;
use async_trait::async_trait;
use serde::Serialize;
use strum_macros::{AsRefStr, EnumString};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IrCutFilter {
    /// Day mode, filter in place
    #[serde(rename = "yes")]
    #[strum(to_string = "yes", serialize = "on")]
    On,
    /// Night mode, filter removed
    #[serde(rename = "no")]
    #[strum(to_string = "no", serialize = "off")]
    Off,
    /// Switch with the lighting conditions
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExposureMode {
    FlickerFree60,
    FlickerFree50,
    FlickerReduced60,
    FlickerReduced50,
    Auto,
    Hold,
}

/// Part of the image used to compute exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExposureWindow {
    Auto,
    Center,
    Spot,
    Upper,
    Lower,
    Left,
    Right,
    Custom,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct Stabilizer {
    #[serde(rename = "ImageSource.I0.Sensor.Stabilizer", skip_serializing_if = "Option::is_none")]
    enabled: Option<Toggle>,
    #[serde(rename = "ImageSource.I0.Sensor.StabilizerMargin", skip_serializing_if = "Option::is_none")]
    margin: Option<u32>,
}

impl CommandParams for Stabilizer {
    fn validate(&self) -> Result<()> {
        check_range("stabilizer margin", self.margin, 0, 200)
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct Wdr {
    #[serde(rename = "ImageSource.I0.Sensor.WDR", skip_serializing_if = "Option::is_none")]
    enabled: Option<Toggle>,
    #[serde(rename = "ImageSource.I0.Sensor.LocalContrast", skip_serializing_if = "Option::is_none")]
    contrast: Option<i32>,
}

impl CommandParams for Wdr {
    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

/// Brightness, color level, sharpness and contrast, each 0..=100.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Appearance {
    #[serde(rename = "ImageSource.I0.Sensor.Brightness", skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u32>,
    #[serde(rename = "ImageSource.I0.Sensor.Contrast", skip_serializing_if = "Option::is_none")]
    pub contrast: Option<u32>,
    #[serde(rename = "ImageSource.I0.Sensor.ColorLevel", skip_serializing_if = "Option::is_none")]
    pub saturation: Option<u32>,
    #[serde(rename = "ImageSource.I0.Sensor.Sharpness", skip_serializing_if = "Option::is_none")]
    pub sharpness: Option<u32>,
}

impl CommandParams for Appearance {
    fn validate(&self) -> Result<()> {
        check_range("brightness", self.brightness, 0, 100)?;
        check_range("contrast", self.contrast, 0, 100)?;
        check_range("saturation", self.saturation, 0, 100)?;
        check_range("sharpness", self.sharpness, 0, 100)
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct DayNight {
    #[serde(rename = "ImageSource.I0.DayNight.IrCutFilter", skip_serializing_if = "Option::is_none")]
    ir_cut: Option<IrCutFilter>,
    #[serde(rename = "ImageSource.I0.DayNight.ShiftLevel", skip_serializing_if = "Option::is_none")]
    shift_level: Option<u32>,
}

impl CommandParams for DayNight {
    fn validate(&self) -> Result<()> {
        check_range("shift level", self.shift_level, 0, 100)
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExposureOptions {
    #[serde(rename = "ImageSource.I0.Sensor.Exposure", skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExposureMode>,
    #[serde(rename = "ImageSource.I0.Sensor.ExposureWindow", skip_serializing_if = "Option::is_none")]
    pub window: Option<ExposureWindow>,
    /// Longest shutter time in milliseconds.
    #[serde(rename = "ImageSource.I0.Sensor.MaxExposureTime", skip_serializing_if = "Option::is_none")]
    pub max_exposure_time: Option<u32>,
    #[serde(rename = "ImageSource.I0.Sensor.MaxGain", skip_serializing_if = "Option::is_none")]
    pub max_gain: Option<u32>,
    /// Trade-off between motion blur (0) and noise (100).
    #[serde(rename = "ImageSource.I0.Sensor.ExposurePriorityNormal", skip_serializing_if = "Option::is_none")]
    pub priority_normal: Option<u32>,
    #[serde(rename = "ImageSource.I0.DCIris.Enable", skip_serializing_if = "Option::is_none")]
    pub lock_aperture: Option<YesNo>,
    #[serde(rename = "ImageSource.I0.Sensor.ExposureValue", skip_serializing_if = "Option::is_none")]
    pub exposure_value: Option<u32>,
}

impl CommandParams for ExposureOptions {
    fn validate(&self) -> Result<()> {
        check_range("exposure priority", self.priority_normal, 0, 100)?;
        check_range("exposure value", self.exposure_value, 0, 100)
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

/// Custom exposure zone used with `ExposureWindow::Custom`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExposureArea {
    #[serde(rename = "ImageSource.I0.Sensor.CustomExposureWindow.C0.Top", skip_serializing_if = "Option::is_none")]
    pub top: Option<u32>,
    #[serde(rename = "ImageSource.I0.Sensor.CustomExposureWindow.C0.Bottom", skip_serializing_if = "Option::is_none")]
    pub bottom: Option<u32>,
    #[serde(rename = "ImageSource.I0.Sensor.CustomExposureWindow.C0.Left", skip_serializing_if = "Option::is_none")]
    pub left: Option<u32>,
    #[serde(rename = "ImageSource.I0.Sensor.CustomExposureWindow.C0.Right", skip_serializing_if = "Option::is_none")]
    pub right: Option<u32>,
}

impl CommandParams for ExposureArea {
    fn validate(&self) -> Result<()> {
        check_range("top", self.top, 0, 9999)?;
        check_range("bottom", self.bottom, 0, 9999)?;
        check_range("left", self.left, 0, 9999)?;
        check_range("right", self.right, 0, 9999)
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImageOptions {
    #[serde(rename = "ImageSource.I0.Sensor.Defog", skip_serializing_if = "Option::is_none")]
    pub defog: Option<Toggle>,
    #[serde(rename = "ImageSource.I0.Sensor.NoiseReduction", skip_serializing_if = "Option::is_none")]
    pub noise_reduction: Option<Toggle>,
    #[serde(rename = "ImageSource.I0.Sensor.NoiseReductionTuning", skip_serializing_if = "Option::is_none")]
    pub noise_reduction_tuning: Option<u32>,
    /// Freeze the image while the head is moving.
    #[serde(rename = "PTZ.UserAdv.U1.ImageFreeze", skip_serializing_if = "Option::is_none")]
    pub image_freeze_ptz: Option<Toggle>,
}

impl CommandParams for ImageOptions {
    fn validate(&self) -> Result<()> {
        check_range("noise reduction tuning", self.noise_reduction_tuning, 0, 100)
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct HighlightCompensation {
    #[serde(
        rename = "ImageSource.I0.Sensor.HLCSensitivity",
        serialize_with = "serialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    enabled: Option<bool>,
}

impl CommandParams for HighlightCompensation {
    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
struct AxisEnable {
    #[serde(rename = "PTZ.Various.V1.PanEnabled", skip_serializing_if = "Option::is_none")]
    pan: Option<bool>,
    #[serde(rename = "PTZ.Various.V1.TiltEnabled", skip_serializing_if = "Option::is_none")]
    tilt: Option<bool>,
    #[serde(rename = "PTZ.Various.V1.ZoomEnabled", skip_serializing_if = "Option::is_none")]
    zoom: Option<bool>,
}

impl CommandParams for AxisEnable {
    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

#[async_trait]
pub trait ImageSettings: Send + Sync {
    /// Electronic image stabilization and its margin (0..=200)
    async fn set_stabilizer(&self, enabled: Option<Toggle>, margin: Option<u32>) -> Result<String>;

    /// Sensor capture mode, e.g. `1` for 1080p or `2` for 720p on Full HD models
    async fn set_capture_mode(&self, mode: &str) -> Result<String>;

    /// Wide dynamic range and local contrast
    async fn set_wdr(&self, enabled: Option<Toggle>, contrast: Option<i32>) -> Result<String>;

    async fn set_appearance(&self, appearance: &Appearance) -> Result<String>;

    /// Day/night filter and the light level it switches at
    async fn set_ir_cut_filter(
        &self,
        filter: Option<IrCutFilter>,
        shift_level: Option<u32>,
    ) -> Result<String>;

    async fn set_exposure(&self, options: &ExposureOptions) -> Result<String>;

    async fn set_custom_exposure_window(&self, area: &ExposureArea) -> Result<String>;

    /// Backlight compensation
    async fn set_backlight(&self, enabled: bool) -> Result<String>;

    /// Mask bright spots such as headlights
    async fn set_highlight(&self, enabled: bool) -> Result<String>;

    /// Defog, noise reduction and image freeze during PTZ moves
    async fn set_image_settings(&self, options: &ImageOptions) -> Result<String>;

    /// Enable or disable individual PTZ axes
    async fn set_pan_tilt_zoom_enable(
        &self,
        pan: Option<bool>,
        tilt: Option<bool>,
        zoom: Option<bool>,
    ) -> Result<String>;
}

impl VapixCam {
    /// `param.cgi?action=update` with the given parameters. An empty update
    /// is refused before anything is sent.
    pub(crate) async fn update_params<P>(&self, params: &P) -> Result<String>
    where
        P: CommandParams + Sync,
    {
        let params = params.to_query()?;
        if params.is_empty() {
            return Err(VapixError::InvalidParameter(
                "update needs at least one parameter".to_string(),
            ));
        }
        debug!(keys = ?params.keys().collect::<Vec<_>>(), "updating parameters");

        let mut query = Query::new().with("action", "update");
        query.extend(params);
        self.cgi_get(PARAM_CGI, &query).await
    }
}

#[async_trait]
impl ImageSettings for VapixCam {
    async fn set_stabilizer(&self, enabled: Option<Toggle>, margin: Option<u32>) -> Result<String> {
        self.update_params(&Stabilizer { enabled, margin }).await
    }

    async fn set_capture_mode(&self, mode: &str) -> Result<String> {
        check_not_empty("capture mode", mode)?;
        let query = Query::new()
            .with("action", "update")
            .with("ImageSource.I0.Sensor.CaptureMode", mode);
        self.cgi_get(PARAM_CGI, &query).await
    }

    async fn set_wdr(&self, enabled: Option<Toggle>, contrast: Option<i32>) -> Result<String> {
        self.update_params(&Wdr { enabled, contrast }).await
    }

    async fn set_appearance(&self, appearance: &Appearance) -> Result<String> {
        self.update_params(appearance).await
    }

    async fn set_ir_cut_filter(
        &self,
        filter: Option<IrCutFilter>,
        shift_level: Option<u32>,
    ) -> Result<String> {
        self.update_params(&DayNight {
            ir_cut: filter,
            shift_level,
        })
        .await
    }

    async fn set_exposure(&self, options: &ExposureOptions) -> Result<String> {
        self.update_params(options).await
    }

    async fn set_custom_exposure_window(&self, area: &ExposureArea) -> Result<String> {
        self.update_params(area).await
    }

    async fn set_backlight(&self, enabled: bool) -> Result<String> {
        let query = Query::new()
            .with("action", "update")
            .with("PTZ.Various.V1.BackLight", enabled);
        self.cgi_get(PARAM_CGI, &query).await
    }

    async fn set_highlight(&self, enabled: bool) -> Result<String> {
        self.update_params(&HighlightCompensation {
            enabled: Some(enabled),
        })
        .await
    }

    async fn set_image_settings(&self, options: &ImageOptions) -> Result<String> {
        self.update_params(options).await
    }

    async fn set_pan_tilt_zoom_enable(
        &self,
        pan: Option<bool>,
        tilt: Option<bool>,
        zoom: Option<bool>,
    ) -> Result<String> {
        self.update_params(&AxisEnable { pan, tilt, zoom }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ir_cut_filter_uses_device_values() {
        let query = DayNight {
            ir_cut: Some(IrCutFilter::On),
            shift_level: Some(40),
        }
        .to_query()
        .unwrap();
        assert_eq!(query.get("ImageSource.I0.DayNight.IrCutFilter"), Some("yes"));
        assert_eq!(query.get("ImageSource.I0.DayNight.ShiftLevel"), Some("40"));
        assert_eq!("off".parse::<IrCutFilter>().unwrap(), IrCutFilter::Off);
        assert_eq!("auto".parse::<IrCutFilter>().unwrap(), IrCutFilter::Auto);
    }

    #[test]
    fn exposure_sends_only_given_fields() {
        let query = ExposureOptions {
            mode: Some(ExposureMode::FlickerFree50),
            lock_aperture: Some(YesNo::No),
            ..Default::default()
        }
        .to_query()
        .unwrap();
        assert_eq!(query.len(), 2);
        assert_eq!(query.get("ImageSource.I0.Sensor.Exposure"), Some("flickerfree50"));
        assert_eq!(query.get("ImageSource.I0.DCIris.Enable"), Some("no"));
    }

    #[test]
    fn highlight_is_a_numeric_flag() {
        let query = HighlightCompensation {
            enabled: Some(true),
        }
        .to_query()
        .unwrap();
        assert_eq!(query.get("ImageSource.I0.Sensor.HLCSensitivity"), Some("1"));
    }

    #[test]
    fn axis_enable_serializes_booleans() {
        let query = AxisEnable {
            pan: Some(false),
            zoom: Some(true),
            ..Default::default()
        }
        .to_query()
        .unwrap();
        assert_eq!(query.get("PTZ.Various.V1.PanEnabled"), Some("false"));
        assert_eq!(query.get("PTZ.Various.V1.ZoomEnabled"), Some("true"));
        assert!(!query.contains_key("PTZ.Various.V1.TiltEnabled"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let margin = Stabilizer {
            enabled: None,
            margin: Some(201),
        };
        assert!(matches!(margin.to_query(), Err(VapixError::InvalidParameter(_))));

        let area = ExposureArea {
            right: Some(10_000),
            ..Default::default()
        };
        assert!(matches!(area.to_query(), Err(VapixError::InvalidParameter(_))));

        let options = ImageOptions {
            noise_reduction_tuning: Some(101),
            ..Default::default()
        };
        assert!(matches!(options.to_query(), Err(VapixError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn empty_update_is_refused_without_io() {
        let cam = VapixCam::new("192.0.2.1", "root", "pass");
        let result = cam.set_appearance(&Appearance::default()).await;
        assert!(matches!(result, Err(VapixError::InvalidParameter(_))));
    }
}
