//! Caller scope supplied by the surrounding portal.
//!
//! Authentication happens upstream; by the time a call reaches this crate the gateway has
//! stamped the verified user, client scope, and role onto the request headers.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const USER_HEADER: &str = "x-user-id";
pub const CLIENT_HEADER: &str = "x-client-id";
pub const ROLE_HEADER: &str = "x-role";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClientId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    Client,
    Staff,
}

impl CallerRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Staff => "staff",
        }
    }
}

/// The acting user and the client scope every read and write is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub client_id: Option<ClientId>,
    pub role: CallerRole,
}

impl Caller {
    pub fn client(user_id: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id.into()),
            client_id: Some(ClientId(client_id.into())),
            role: CallerRole::Client,
        }
    }

    pub fn staff(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id.into()),
            client_id: None,
            role: CallerRole::Staff,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.role == CallerRole::Staff
    }

    /// True when the caller is a client scoped to `client_id`.
    pub fn acts_for(&self, client_id: &ClientId) -> bool {
        self.role == CallerRole::Client && self.client_id.as_ref() == Some(client_id)
    }

    /// Staff may read any client; clients only their own.
    pub fn can_view(&self, client_id: &ClientId) -> bool {
        self.is_staff() || self.acts_for(client_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),
    #[error("unknown caller role '{0}'")]
    UnknownRole(String),
    #[error("client callers must carry a client scope")]
    MissingClientScope,
}

/// Resolves the authenticated caller for an inbound request.
pub trait IdentityProvider: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<Caller, IdentityError>;
}

/// Reads the identity headers stamped by the portal gateway.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderIdentity;

impl IdentityProvider for HeaderIdentity {
    fn resolve(&self, headers: &HeaderMap) -> Result<Caller, IdentityError> {
        let user_id = header_value(headers, USER_HEADER)
            .ok_or(IdentityError::MissingHeader(USER_HEADER))?;
        let role = match header_value(headers, ROLE_HEADER).as_deref() {
            None | Some("client") => CallerRole::Client,
            Some("staff") | Some("admin") => CallerRole::Staff,
            Some(other) => return Err(IdentityError::UnknownRole(other.to_string())),
        };
        let client_id = header_value(headers, CLIENT_HEADER).map(ClientId);

        if role == CallerRole::Client && client_id.is_none() {
            return Err(IdentityError::MissingClientScope);
        }

        Ok(Caller {
            user_id: UserId(user_id),
            client_id,
            role,
        })
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Back-office recipients for notifications addressed to "staff".
pub trait StaffDirectory: Send + Sync {
    fn staff_recipients(&self) -> Vec<UserId>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    #[test]
    fn resolves_client_scope() {
        let caller = HeaderIdentity
            .resolve(&headers(&[(USER_HEADER, "u-1"), (CLIENT_HEADER, "acme")]))
            .expect("client resolves");
        assert_eq!(caller, Caller::client("u-1", "acme"));
        assert!(caller.acts_for(&ClientId("acme".to_string())));
        assert!(!caller.can_view(&ClientId("globex".to_string())));
    }

    #[test]
    fn resolves_staff_without_client_scope() {
        let caller = HeaderIdentity
            .resolve(&headers(&[(USER_HEADER, "ops-7"), (ROLE_HEADER, "staff")]))
            .expect("staff resolves");
        assert!(caller.is_staff());
        assert!(caller.can_view(&ClientId("anyone".to_string())));
        assert!(!caller.acts_for(&ClientId("anyone".to_string())));
    }

    #[test]
    fn rejects_incomplete_headers() {
        assert_eq!(
            HeaderIdentity.resolve(&headers(&[(CLIENT_HEADER, "acme")])),
            Err(IdentityError::MissingHeader(USER_HEADER))
        );
        assert_eq!(
            HeaderIdentity.resolve(&headers(&[(USER_HEADER, "u-1")])),
            Err(IdentityError::MissingClientScope)
        );
        assert_eq!(
            HeaderIdentity.resolve(&headers(&[(USER_HEADER, "u-1"), (ROLE_HEADER, "root")])),
            Err(IdentityError::UnknownRole("root".to_string()))
        );
    }
}
