use actix_session::Session;
use serde::Serialize;

use crate::errors::AppError;
use crate::models::role::Role;

/// Wrapper around granted access keys with a `has()` check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions(pub Vec<String>);

impl Permissions {
    pub fn has(&self, code: &str) -> bool {
        self.0.iter().any(|p| p == code)
    }

    pub fn from_csv(csv: &str) -> Self {
        let codes = csv
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Permissions(codes)
    }

    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codes: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into().trim().to_string();
            if !key.is_empty() && !codes.contains(&key) {
                codes.push(key);
            }
        }
        Permissions(codes)
    }

    pub fn to_csv(&self) -> String {
        self.0.join(",")
    }
}

/// Caller identity handed to every engine operation. Nothing in the engine
/// reads ambient session state; handlers build this from the cookie session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub role: Role,
    pub access_token: String,
    pub permissions: Permissions,
}

impl SessionContext {
    pub fn new(role: Role, access_token: impl Into<String>, permissions: Permissions) -> Self {
        SessionContext {
            role,
            access_token: access_token.into(),
            permissions,
        }
    }

    /// Admin bypasses key checks.
    pub fn may_access(&self, key: &str) -> bool {
        self.role == Role::Admin || self.permissions.has(key)
    }
}

const TOKEN_KEY: &str = "access_token";
const ROLE_KEY: &str = "role";
const PERMISSIONS_KEY: &str = "permissions";

pub fn store_context(session: &Session, ctx: &SessionContext) -> Result<(), AppError> {
    session.insert(TOKEN_KEY, &ctx.access_token)?;
    session.insert(ROLE_KEY, ctx.role.code())?;
    session.insert(PERMISSIONS_KEY, ctx.permissions.to_csv())?;
    Ok(())
}

pub fn has_token(session: &Session) -> bool {
    session.get::<String>(TOKEN_KEY).unwrap_or(None).is_some()
}

pub fn get_context(session: &Session) -> Result<SessionContext, AppError> {
    let access_token = match session.get::<String>(TOKEN_KEY) {
        Ok(Some(token)) => token,
        Ok(None) => return Err(AppError::Session("Not authenticated".to_string())),
        Err(e) => return Err(AppError::Session(format!("Session error: {}", e))),
    };
    let role = session
        .get::<String>(ROLE_KEY)
        .unwrap_or(None)
        .and_then(|code| Role::from_code(&code))
        .ok_or_else(|| AppError::Session("No role in session".to_string()))?;
    let permissions = session
        .get::<String>(PERMISSIONS_KEY)
        .unwrap_or(None)
        .map(|csv| Permissions::from_csv(&csv))
        .unwrap_or_default();
    Ok(SessionContext {
        role,
        access_token,
        permissions,
    })
}

/// Check an access key; returns Err(AppError) if denied.
pub fn require_permission(ctx: &SessionContext, code: &str) -> Result<(), AppError> {
    if ctx.may_access(code) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(code.to_string()))
    }
}
