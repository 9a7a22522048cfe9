use crate::constants::{
    ACCESS_LOG_CGI, DATE_CGI, DATE_FORMAT, FACTORY_DEFAULT_CGI, HARD_FACTORY_DEFAULT_CGI,
    PARAM_CGI, RESTART_CGI, SERVER_REPORT_CGI, SYSTEM_LOG_CGI,
};
use crate::error::{Result, VapixError};
use crate::protocol::{Query, YesNo, check_not_empty};
use crate::vapix::VapixCam;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Value of the first `key=value` line, e.g. `root.Brand.ProdType=PTZ Dome Network Camera`.
pub fn parse_param_value(body: &str) -> Result<String> {
    body.split_once('=')
        .map(|(_, value)| value.lines().next().unwrap_or_default().trim().to_string())
        .ok_or_else(|| {
            VapixError::UnexpectedResponse(format!("expected key=value, got {:?}", body.trim()))
        })
}

/// Parse the device clock as reported by `date.cgi?action=get`.
pub fn parse_device_time(body: &str) -> Result<NaiveDateTime> {
    let text = body.trim();
    NaiveDateTime::parse_from_str(text, DATE_FORMAT).map_err(|e| {
        VapixError::UnexpectedResponse(format!("Error parsing date {:?}: {}", text, e))
    })
}

#[async_trait]
pub trait SystemInfo: Send + Sync {
    /// Reset every parameter except the basic network settings
    async fn factory_reset_default(&self) -> Result<String>;

    /// Reset every parameter, network settings included
    async fn hard_factory_reset_default(&self) -> Result<String>;

    /// Restart the device
    async fn restart_server(&self) -> Result<String>;

    /// Server report, useful when contacting support
    async fn get_server_report(&self) -> Result<String>;

    /// System log
    async fn get_system_log(&self) -> Result<String>;

    /// Client access log
    async fn get_system_access_log(&self) -> Result<String>;

    /// Date and time as text, e.g. `Oct 19, 2026 14:03:22`
    async fn get_date_and_time(&self) -> Result<String>;

    /// Date and time parsed into a `NaiveDateTime`
    async fn get_device_time(&self) -> Result<NaiveDateTime>;

    /// Change the system date
    async fn set_date(&self, date: NaiveDate) -> Result<String>;

    /// Change the system time, optionally interpreted in `timezone`
    async fn set_time(&self, time: NaiveTime, timezone: Option<&str>) -> Result<String>;

    /// Change date and time in one request
    async fn set_date_time(
        &self,
        datetime: NaiveDateTime,
        timezone: Option<&str>,
    ) -> Result<String>;

    /// Configure the NTP server
    async fn set_ntp_server(&self, server: &str) -> Result<String>;

    /// Set a static hostname and/or let DHCP provide one
    async fn set_hostname(
        &self,
        hostname: Option<&str>,
        obtain_from_dhcp: Option<bool>,
    ) -> Result<String>;

    /// Product type, e.g. `PTZ Dome Network Camera`
    async fn get_type_camera(&self) -> Result<String>;
}

fn date_query(date: NaiveDate) -> Query {
    Query::new()
        .with("year", date.year())
        .with("month", date.month())
        .with("day", date.day())
}

fn time_query(time: NaiveTime, timezone: Option<&str>) -> Query {
    let mut query = Query::new()
        .with("hour", time.hour())
        .with("minute", time.minute())
        .with("second", time.second());
    query.push_opt("timezone", timezone);
    query
}

#[async_trait]
impl SystemInfo for VapixCam {
    async fn factory_reset_default(&self) -> Result<String> {
        self.cgi_get(FACTORY_DEFAULT_CGI, &Query::new()).await
    }

    async fn hard_factory_reset_default(&self) -> Result<String> {
        self.cgi_get(HARD_FACTORY_DEFAULT_CGI, &Query::new()).await
    }

    async fn restart_server(&self) -> Result<String> {
        self.cgi_get(RESTART_CGI, &Query::new()).await
    }

    async fn get_server_report(&self) -> Result<String> {
        self.cgi_get(SERVER_REPORT_CGI, &Query::new()).await
    }

    async fn get_system_log(&self) -> Result<String> {
        self.cgi_get(SYSTEM_LOG_CGI, &Query::new()).await
    }

    async fn get_system_access_log(&self) -> Result<String> {
        self.cgi_get(ACCESS_LOG_CGI, &Query::new()).await
    }

    async fn get_date_and_time(&self) -> Result<String> {
        self.cgi_get(DATE_CGI, &Query::new().with("action", "get"))
            .await
    }

    async fn get_device_time(&self) -> Result<NaiveDateTime> {
        let text = self.get_date_and_time().await?;
        parse_device_time(&text)
    }

    async fn set_date(&self, date: NaiveDate) -> Result<String> {
        let mut query = Query::new().with("action", "set");
        query.extend(date_query(date));
        self.cgi_get(DATE_CGI, &query).await
    }

    async fn set_time(&self, time: NaiveTime, timezone: Option<&str>) -> Result<String> {
        let mut query = Query::new().with("action", "set");
        query.extend(time_query(time, timezone));
        self.cgi_get(DATE_CGI, &query).await
    }

    async fn set_date_time(
        &self,
        datetime: NaiveDateTime,
        timezone: Option<&str>,
    ) -> Result<String> {
        let mut query = Query::new().with("action", "set");
        query.extend(date_query(datetime.date()));
        query.extend(time_query(datetime.time(), timezone));
        self.cgi_get(DATE_CGI, &query).await
    }

    async fn set_ntp_server(&self, server: &str) -> Result<String> {
        check_not_empty("NTP server", server)?;
        let query = Query::new()
            .with("action", "update")
            .with("Time.NTP.Server", server);
        self.cgi_get(PARAM_CGI, &query).await
    }

    async fn set_hostname(
        &self,
        hostname: Option<&str>,
        obtain_from_dhcp: Option<bool>,
    ) -> Result<String> {
        if hostname.is_none() && obtain_from_dhcp.is_none() {
            return Err(VapixError::InvalidParameter(
                "set_hostname needs a hostname or a DHCP setting".to_string(),
            ));
        }
        let mut query = Query::new().with("action", "update");
        query.push_opt("Network.HostName", hostname);
        query.push_opt(
            "Network.VolatileHostName.ObtainFromDHCP",
            obtain_from_dhcp.map(|dhcp| YesNo::from(dhcp).as_ref().to_string()),
        );
        self.cgi_get(PARAM_CGI, &query).await
    }

    async fn get_type_camera(&self) -> Result<String> {
        let query = Query::new()
            .with("action", "list")
            .with("group", "Brand.ProdType");
        let text = self.cgi_get(PARAM_CGI, &query).await?;
        parse_param_value(&text)
    }
}
