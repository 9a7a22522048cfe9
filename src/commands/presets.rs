use crate::constants::PRESET_KEY_PREFIX;
use crate::error::{Result, VapixError};
use crate::protocol::{Query, check_not_empty, check_range, parse_lines, strip_markup};
use crate::vapix::{CommandResponse, VapixCam};
use async_trait::async_trait;

/// A stored position as reported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub index: u32,
    pub name: String,
}

impl From<Preset> for (u32, String) {
    fn from(p: Preset) -> Self {
        (p.index, p.name)
    }
}

/// Parse a preset listing. The index comes from the `presetposno<N>` key
/// suffix, since devices may skip numbers.
pub fn parse_presets(body: &str) -> Result<Vec<Preset>> {
    let text = strip_markup(body);
    parse_lines(&text)
        .map(|(key, name)| -> Result<Preset> {
            let index = key
                .strip_prefix(PRESET_KEY_PREFIX)
                .and_then(|suffix| suffix.parse::<u32>().ok())
                .ok_or_else(|| {
                    VapixError::UnexpectedResponse(format!("unexpected preset key {:?}", key))
                })?;
            Ok(Preset {
                index,
                name: name.to_string(),
            })
        })
        .collect()
}

#[async_trait]
pub trait Presets: Send + Sync {
    /// Move to a server preset by name
    async fn go_to_server_preset_name(
        &self,
        name: &str,
        speed: Option<u32>,
    ) -> Result<CommandResponse>;

    /// Move to a server preset by number
    async fn go_to_server_preset_no(
        &self,
        number: u32,
        speed: Option<u32>,
    ) -> Result<CommandResponse>;

    /// Move to a preset stored on the PTZ device itself, bypassing the
    /// server's preset table
    async fn go_to_device_preset(
        &self,
        position: u32,
        speed: Option<u32>,
    ) -> Result<CommandResponse>;

    /// Presets stored on the device
    async fn list_preset_device(&self) -> Result<Vec<Preset>>;

    /// Every available preset
    async fn list_all_preset(&self) -> Result<Vec<Preset>>;
}

impl VapixCam {
    async fn goto_preset(
        &self,
        key: &str,
        value: String,
        speed: Option<u32>,
    ) -> Result<CommandResponse> {
        check_range("speed", speed, 1, 100)?;
        let mut query = Query::new().with(key, value);
        query.push_opt("speed", speed);
        self.send_command(query).await
    }

    async fn query_presets(&self, kind: &str) -> Result<Vec<Preset>> {
        let reply = self.send_command(Query::new().with("query", kind)).await?;
        parse_presets(&reply.body)
    }
}

#[async_trait]
impl Presets for VapixCam {
    async fn go_to_server_preset_name(
        &self,
        name: &str,
        speed: Option<u32>,
    ) -> Result<CommandResponse> {
        check_not_empty("preset name", name)?;
        self.goto_preset("gotoserverpresetname", name.to_string(), speed)
            .await
    }

    async fn go_to_server_preset_no(
        &self,
        number: u32,
        speed: Option<u32>,
    ) -> Result<CommandResponse> {
        self.goto_preset("gotoserverpresetno", number.to_string(), speed)
            .await
    }

    async fn go_to_device_preset(
        &self,
        position: u32,
        speed: Option<u32>,
    ) -> Result<CommandResponse> {
        self.goto_preset("gotodevicepreset", position.to_string(), speed)
            .await
    }

    async fn list_preset_device(&self) -> Result<Vec<Preset>> {
        self.query_presets("presetposcam").await
    }

    async fn list_all_preset(&self) -> Result<Vec<Preset>> {
        self.query_presets("presetposall").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_device_indices_and_order() {
        let presets = parse_presets("presetposno1=Entrance\r\npresetposno5=Dock\r\n").unwrap();
        let pairs: Vec<(u32, String)> = presets.into_iter().map(Into::into).collect();
        assert_eq!(
            pairs,
            vec![(1, "Entrance".to_string()), (5, "Dock".to_string())]
        );
    }

    #[test]
    fn skips_heading_and_markup() {
        let body = "<html><body>Preset Positions for camera 1\r\npresetposno3=Loading Bay\r\n</body></html>";
        let presets = parse_presets(body).unwrap();
        assert_eq!(
            presets,
            vec![Preset {
                index: 3,
                name: "Loading Bay".to_string()
            }]
        );
    }

    #[test]
    fn empty_listing_is_not_an_error() {
        assert!(parse_presets("").unwrap().is_empty());
        assert!(
            parse_presets("Preset Positions for camera 1\r\n")
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn foreign_keys_are_unexpected() {
        assert!(matches!(
            parse_presets("presetposno1=A\r\npan=10\r\n"),
            Err(VapixError::UnexpectedResponse(_))
        ));
        assert!(matches!(
            parse_presets("presetposnoX=A\r\n"),
            Err(VapixError::UnexpectedResponse(_))
        ));
    }
}
