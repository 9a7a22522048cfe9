use phf::phf_map;
use std::time::Duration;

/// Clock format used by `date.cgi?action=get`, e.g. `Oct 19, 2026 14:03:22`.
pub const DATE_FORMAT: &str = "%b %d, %Y %H:%M:%S";

pub const HTTP_PORT: u16 = 80;
pub const RTSP_PORT: u16 = 554;
pub const DEFAULT_CAMERA: u32 = 1;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const OK_CODES: &[u16] = &[200, 204];

pub const PTZ_CGI: &str = "/axis-cgi/com/ptz.cgi";
pub const PARAM_CGI: &str = "/axis-cgi/param.cgi";
pub const PWDGRP_CGI: &str = "/axis-cgi/pwdgrp.cgi";
pub const DATE_CGI: &str = "/axis-cgi/date.cgi";
pub const FACTORY_DEFAULT_CGI: &str = "/axis-cgi/factorydefault.cgi";
pub const HARD_FACTORY_DEFAULT_CGI: &str = "/axis-cgi/hardfactorydefault.cgi";
pub const RESTART_CGI: &str = "/axis-cgi/restart.cgi";
pub const SERVER_REPORT_CGI: &str = "/axis-cgi/serverreport.cgi";
pub const SYSTEM_LOG_CGI: &str = "/axis-cgi/systemlog.cgi";
pub const ACCESS_LOG_CGI: &str = "/axis-cgi/accesslog.cgi";
pub const IMAGE_SIZE_CGI: &str = "/axis-cgi/imagesize.cgi";
pub const VIDEO_STATUS_CGI: &str = "/axis-cgi/videostatus.cgi";
pub const DYNAMIC_OVERLAY_CGI: &str = "/axis-cgi/dynamicoverlay.cgi";
pub const BITMAP_CGI: &str = "/axis-cgi/bitmap/image.bmp";
pub const JPEG_CGI: &str = "/axis-cgi/jpg/image.cgi";

pub const PRESET_KEY_PREFIX: &str = "presetposno";

/// Security group name -> the full `sgrp` list the device expects.
pub static SECURITY_GROUPS: phf::Map<&'static str, &'static str> = phf_map! {
    "admin" => "admin:operator:viewer:ptz",
    "operator" => "operator:viewer:ptz",
    "ptz" => "viewer:ptz",
    "viewer" => "viewer",
};
