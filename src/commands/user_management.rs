use crate::constants::{PWDGRP_CGI, SECURITY_GROUPS};
use crate::error::{Result, VapixError};
use crate::protocol::{Query, check_not_empty, parse_lines, strip_markup};
use crate::vapix::VapixCam;
use async_trait::async_trait;
use strum_macros::{AsRefStr, EnumString};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SecurityGroup {
    Admin,
    Operator,
    Viewer,
    Ptz,
}

impl SecurityGroup {
    /// Colon-separated `sgrp` value; higher groups include the lower ones.
    pub fn expanded(&self) -> &'static str {
        SECURITY_GROUPS.get(self.as_ref()).copied().unwrap_or("viewer")
    }
}

/// A new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub name: String,
    pub password: String,
    pub security_group: SecurityGroup,
    /// Primary group, `users` unless set.
    pub group: Option<String>,
    pub comment: Option<String>,
}

impl UserAccount {
    pub fn new(
        name: impl Into<String>,
        password: impl Into<String>,
        security_group: SecurityGroup,
    ) -> Self {
        Self {
            name: name.into(),
            password: password.into(),
            security_group,
            group: None,
            comment: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Fields to change on an existing account; `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub group: Option<String>,
    pub security_group: Option<SecurityGroup>,
    pub comment: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.group.is_none()
            && self.security_group.is_none()
            && self.comment.is_none()
    }
}

/// Account names from a `pwdgrp.cgi?action=get` reply, taken from every
/// line whose key ends in `users` (`users=`, `digusers=`).
pub fn parse_user_list(body: &str) -> Vec<String> {
    let mut users: Vec<String> = Vec::new();
    for (key, value) in parse_lines(body) {
        if !key.ends_with("users") {
            continue;
        }
        for name in value.trim_matches('"').split(',') {
            let name = name.trim().trim_matches('"');
            if !name.is_empty() && !users.iter().any(|u| u == name) {
                users.push(name.to_string());
            }
        }
    }
    users
}

#[async_trait]
pub trait UserManagement: Send + Sync {
    /// Get the list of users
    async fn list_users(&self) -> Result<Vec<String>>;

    /// Check if a user exists
    async fn check_user(&self, name: &str) -> Result<bool>;

    /// Add a new user, refusing to overwrite an existing one
    async fn create_user(&self, account: &UserAccount) -> Result<String>;

    /// Modify an existing user
    async fn update_user(&self, name: &str, update: &UserUpdate) -> Result<String>;

    /// Delete a user
    async fn remove_user(&self, name: &str) -> Result<String>;
}

impl VapixCam {
    async fn pwdgrp(&self, query: Query) -> Result<String> {
        let text = self.cgi_get(PWDGRP_CGI, &query).await?;
        Ok(strip_markup(&text).trim().to_string())
    }
}

#[async_trait]
impl UserManagement for VapixCam {
    async fn list_users(&self) -> Result<Vec<String>> {
        let text = self
            .cgi_get(PWDGRP_CGI, &Query::new().with("action", "get"))
            .await?;
        Ok(parse_user_list(&text))
    }

    async fn check_user(&self, name: &str) -> Result<bool> {
        Ok(self.list_users().await?.iter().any(|u| u == name))
    }

    async fn create_user(&self, account: &UserAccount) -> Result<String> {
        check_not_empty("user name", &account.name)?;
        check_not_empty("password", &account.password)?;

        // Not atomic with the add below; a concurrent writer can still race us.
        if self.check_user(&account.name).await? {
            return Err(VapixError::AlreadyExists(account.name.clone()));
        }

        let mut query = Query::new()
            .with("action", "add")
            .with("user", &account.name)
            .with("pwd", &account.password)
            .with("grp", account.group.as_deref().unwrap_or("users"))
            .with("sgrp", account.security_group.expanded());
        query.push_opt("comment", account.comment.as_deref());

        info!(user = %account.name, sgrp = account.security_group.expanded(), "creating user");
        self.pwdgrp(query).await
    }

    async fn update_user(&self, name: &str, update: &UserUpdate) -> Result<String> {
        if update.is_empty() {
            return Err(VapixError::InvalidParameter(
                "update_user needs at least one field to change".to_string(),
            ));
        }
        if !self.check_user(name).await? {
            return Err(VapixError::NotFound(name.to_string()));
        }

        let mut query = Query::new().with("action", "update").with("user", name);
        query.push_opt("pwd", update.password.as_deref());
        query.push_opt("grp", update.group.as_deref());
        query.push_opt("sgrp", update.security_group.map(|g| g.expanded()));
        query.push_opt("comment", update.comment.as_deref());

        self.pwdgrp(query).await
    }

    async fn remove_user(&self, name: &str) -> Result<String> {
        if !self.check_user(name).await? {
            return Err(VapixError::NotFound(name.to_string()));
        }

        let query = Query::new().with("action", "remove").with("user", name);
        info!(user = %name, "removing user");
        self.pwdgrp(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_groups_expand() {
        assert_eq!(SecurityGroup::Admin.expanded(), "admin:operator:viewer:ptz");
        assert_eq!(SecurityGroup::Operator.expanded(), "operator:viewer:ptz");
        assert_eq!(SecurityGroup::Ptz.expanded(), "viewer:ptz");
        assert_eq!(SecurityGroup::Viewer.expanded(), "viewer");
        assert_eq!("ADMIN".parse::<SecurityGroup>().unwrap(), SecurityGroup::Admin);
    }

    #[test]
    fn user_list_collects_every_users_line() {
        let body = "admin=\"root\"\r\noperator=\"root,alice\"\r\nviewer=\"root,alice,bob\"\r\ndigusers=\"root,alice,bob\"\r\nusers=\"carol\"\r\n";
        assert_eq!(parse_user_list(body), vec!["root", "alice", "bob", "carol"]);
    }

    #[test]
    fn update_with_no_fields_is_empty() {
        assert!(UserUpdate::default().is_empty());
        let update = UserUpdate {
            comment: Some("night shift".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn user_list_tolerates_empty_reply() {
        assert!(parse_user_list("").is_empty());
        assert!(parse_user_list("users=\"\"\r\n").is_empty());
    }
}
