use crate::error::{Result, VapixError};
use crate::protocol::{CommandParams, Query, Toggle, check_range, parse_tokens};
use crate::vapix::{CommandResponse, VapixCam};
use async_trait::async_trait;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Direction {
    Home,
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

/// Move to an absolute position. Pan and tilt are degrees from the (0,0)
/// position, zoom is in device steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AbsoluteMove {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
}

impl CommandParams for AbsoluteMove {
    fn validate(&self) -> Result<()> {
        check_range("pan", self.pan, -180.0, 180.0)?;
        check_range("tilt", self.tilt, -180.0, 180.0)?;
        check_range("zoom", self.zoom, 1, 9999)?;
        check_range("speed", self.speed, 1, 100)
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

/// Offset from the current position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RelativeMove {
    #[serde(rename = "rpan", skip_serializing_if = "Option::is_none")]
    pub pan: Option<f64>,
    #[serde(rename = "rtilt", skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    #[serde(rename = "rzoom", skip_serializing_if = "Option::is_none")]
    pub zoom: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
}

impl CommandParams for RelativeMove {
    fn validate(&self) -> Result<()> {
        check_range("pan", self.pan, -360.0, 360.0)?;
        check_range("tilt", self.tilt, -360.0, 360.0)?;
        check_range("zoom", self.zoom, -9999, 9999)?;
        check_range("speed", self.speed, 1, 100)
    }

    fn query(&self) -> Result<Query> {
        Query::from_params(self)
    }
}

/// Velocity-controlled move, -100..=100 per axis. Runs until stopped.
///
/// If only one of pan/tilt is given the other axis is sent as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContinuousMove {
    pub pan: Option<i32>,
    pub tilt: Option<i32>,
    pub zoom: Option<i32>,
}

impl ContinuousMove {
    pub fn new(pan: i32, tilt: i32, zoom: i32) -> Self {
        Self {
            pan: Some(pan),
            tilt: Some(tilt),
            zoom: Some(zoom),
        }
    }
}

impl CommandParams for ContinuousMove {
    fn validate(&self) -> Result<()> {
        if self.pan.is_none() && self.tilt.is_none() && self.zoom.is_none() {
            return Err(VapixError::InvalidParameter(
                "continuous move needs at least one axis".to_string(),
            ));
        }
        check_range("pan", self.pan, -100, 100)?;
        check_range("tilt", self.tilt, -100, 100)?;
        check_range("zoom", self.zoom, -100, 100)
    }

    fn query(&self) -> Result<Query> {
        let mut query = Query::new();
        if self.pan.is_some() || self.tilt.is_some() {
            query.push(
                "continuouspantiltmove",
                format!("{},{}", self.pan.unwrap_or(0), self.tilt.unwrap_or(0)),
            );
        }
        query.push_opt("continuouszoommove", self.zoom);
        Ok(query)
    }
}

/// Center the image on a clicked point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CenterMove {
    pub x: u32,
    pub y: u32,
    pub speed: Option<u32>,
}

impl CommandParams for CenterMove {
    fn validate(&self) -> Result<()> {
        check_range("speed", self.speed, 1, 100)
    }

    fn query(&self) -> Result<Query> {
        let mut query = Query::new().with("center", format!("{},{}", self.x, self.y));
        query.push_opt("speed", self.speed);
        Ok(query)
    }
}

/// Center on a point and zoom by `zoom / 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AreaZoom {
    pub x: u32,
    pub y: u32,
    pub zoom: u32,
    pub speed: Option<u32>,
}

impl CommandParams for AreaZoom {
    fn validate(&self) -> Result<()> {
        if self.zoom == 0 {
            return Err(VapixError::InvalidParameter(
                "area zoom factor must be at least 1".to_string(),
            ));
        }
        check_range("speed", self.speed, 1, 100)
    }

    fn query(&self) -> Result<Query> {
        let mut query = Query::new().with(
            "areazoom",
            format!("{},{},{}", self.x, self.y, self.zoom),
        );
        query.push_opt("speed", self.speed);
        Ok(query)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PtzPosition {
    pub pan: f64,
    pub tilt: f64,
    pub zoom: f64,
}

impl From<PtzPosition> for (f64, f64, f64) {
    fn from(p: PtzPosition) -> Self {
        (p.pan, p.tilt, p.zoom)
    }
}

/// Parse a `query=position` reply. The first three tokens must be
/// `pan`, `tilt` and `zoom`, in that order.
pub fn parse_position(body: &str) -> Result<PtzPosition> {
    let tokens = parse_tokens(body)?;
    if tokens.len() < 3 {
        return Err(VapixError::UnexpectedResponse(format!(
            "position reply has {} fields, expected at least 3",
            tokens.len()
        )));
    }

    let mut values = [0.0f64; 3];
    for (slot, (expected, (key, value))) in ["pan", "tilt", "zoom"]
        .iter()
        .zip(tokens.iter())
        .enumerate()
    {
        if key != expected {
            return Err(VapixError::UnexpectedResponse(format!(
                "expected {} at position {}, got {}",
                expected, slot, key
            )));
        }
        values[slot] = value.parse().map_err(|_| {
            VapixError::UnexpectedResponse(format!("{} is not a number: {:?}", key, value))
        })?;
    }

    Ok(PtzPosition {
        pan: values[0],
        tilt: values[1],
        zoom: values[2],
    })
}

/// Parse a `query=speed` reply.
pub fn parse_speed(body: &str) -> Result<u32> {
    let tokens = parse_tokens(body)?;
    match tokens.first() {
        Some(("speed", value)) => value.parse().map_err(|_| {
            VapixError::UnexpectedResponse(format!("speed is not an integer: {:?}", value))
        }),
        _ => Err(VapixError::UnexpectedResponse(format!(
            "expected speed=<n>, got {:?}",
            body.trim()
        ))),
    }
}

#[async_trait]
pub trait Ptz: Send + Sync {
    /// Move pan, tilt or zoom to an absolute destination
    async fn absolute_move(&self, target: AbsoluteMove) -> Result<CommandResponse>;

    /// Start a continuous pan/tilt/zoom movement; stop it with `stop_move`
    async fn continuous_move(&self, velocity: ContinuousMove) -> Result<CommandResponse>;

    /// Move relative to the current position
    async fn relative_move(&self, offset: RelativeMove) -> Result<CommandResponse>;

    /// Stop every ongoing movement
    async fn stop_move(&self) -> Result<CommandResponse>;

    /// Center the image on a point
    async fn center_move(&self, target: CenterMove) -> Result<CommandResponse>;

    /// Center on a point and zoom
    async fn area_zoom(&self, target: AreaZoom) -> Result<CommandResponse>;

    /// Move 5 degrees in a named direction
    async fn move_direction(
        &self,
        direction: Direction,
        speed: Option<u32>,
    ) -> Result<CommandResponse>;

    /// Return to the home position
    async fn go_home_position(&self, speed: Option<u32>) -> Result<CommandResponse>;

    /// Current pan, tilt and zoom
    async fn get_ptz(&self) -> Result<PtzPosition>;

    /// Set the head speed
    async fn set_speed(&self, speed: u32) -> Result<CommandResponse>;

    /// Current head speed
    async fn get_speed(&self) -> Result<u32>;

    /// Description of the PTZ commands the device supports
    async fn info_ptz_commands(&self) -> Result<String>;

    /// Enable or disable autofocus
    async fn auto_focus(&self, focus: Toggle) -> Result<CommandResponse>;

    /// Enable or disable automatic iris
    async fn auto_iris(&self, iris: Toggle) -> Result<CommandResponse>;
}

#[async_trait]
impl Ptz for VapixCam {
    async fn absolute_move(&self, target: AbsoluteMove) -> Result<CommandResponse> {
        self.send_command(target.to_query()?).await
    }

    async fn continuous_move(&self, velocity: ContinuousMove) -> Result<CommandResponse> {
        self.send_command(velocity.to_query()?).await
    }

    async fn relative_move(&self, offset: RelativeMove) -> Result<CommandResponse> {
        self.send_command(offset.to_query()?).await
    }

    async fn stop_move(&self) -> Result<CommandResponse> {
        let query = Query::new()
            .with("continuouspantiltmove", "0,0")
            .with("continuouszoommove", 0);
        self.send_command(query).await
    }

    async fn center_move(&self, target: CenterMove) -> Result<CommandResponse> {
        self.send_command(target.to_query()?).await
    }

    async fn area_zoom(&self, target: AreaZoom) -> Result<CommandResponse> {
        self.send_command(target.to_query()?).await
    }

    async fn move_direction(
        &self,
        direction: Direction,
        speed: Option<u32>,
    ) -> Result<CommandResponse> {
        check_range("speed", speed, 1, 100)?;
        let mut query = Query::new().with("move", direction);
        query.push_opt("speed", speed);
        self.send_command(query).await
    }

    async fn go_home_position(&self, speed: Option<u32>) -> Result<CommandResponse> {
        self.move_direction(Direction::Home, speed).await
    }

    async fn get_ptz(&self) -> Result<PtzPosition> {
        let reply = self
            .send_command(Query::new().with("query", "position"))
            .await?;
        parse_position(&reply.body)
    }

    async fn set_speed(&self, speed: u32) -> Result<CommandResponse> {
        check_range("speed", Some(speed), 1, 100)?;
        self.send_command(Query::new().with("speed", speed)).await
    }

    async fn get_speed(&self) -> Result<u32> {
        let reply = self.send_command(Query::new().with("query", "speed")).await?;
        parse_speed(&reply.body)
    }

    async fn info_ptz_commands(&self) -> Result<String> {
        let reply = self.send_command(Query::new().with("info", 1)).await?;
        Ok(reply.body)
    }

    async fn auto_focus(&self, focus: Toggle) -> Result<CommandResponse> {
        self.send_command(Query::new().with("autofocus", focus.as_ref()))
            .await
    }

    async fn auto_iris(&self, iris: Toggle) -> Result<CommandResponse> {
        self.send_command(Query::new().with("autoiris", iris.as_ref()))
            .await
    }
}
