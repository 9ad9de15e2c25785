use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorForbidden,
    error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};
use serde_json::json;

use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::models::TokenType;

/// The authenticated caller.
///
/// Inside the protected scope the middleware has already decoded the token
/// and stored the user in the request extensions; elsewhere the bearer token
/// is decoded here.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

fn decode_bearer(req: &HttpRequest) -> Result<AuthUser, actix_web::Error> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or_else(|| ErrorUnauthorized(json!({"message": "Missing token"})))?;

    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Config missing"))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| ErrorUnauthorized(json!({"message": "Invalid token"})))?;

    if claims.token_type != TokenType::Access {
        return Err(ErrorUnauthorized(json!({"message": "Access token required"})));
    }

    let role = Role::from_id(claims.role)
        .ok_or_else(|| ErrorUnauthorized(json!({"message": "Invalid role"})))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        username: claims.sub,
        role,
    })
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }
        ready(decode_bearer(req))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ErrorForbidden(json!({"message": "Admin only"})))
        }
    }

    /// Admins and approved operators; pending accounts are refused.
    pub fn require_approved(&self) -> actix_web::Result<()> {
        if matches!(self.role, Role::Admin | Role::Operator) {
            Ok(())
        } else {
            Err(ErrorForbidden(json!({"message": "Account awaiting approval"})))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "ana".into(),
            role,
        }
    }

    #[test]
    fn pending_users_are_refused_everywhere() {
        let pending = user(Role::Pending);
        let err = pending.require_approved().unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);
        assert!(pending.require_admin().is_err());
    }

    #[test]
    fn operators_are_approved_but_not_admins() {
        let operator = user(Role::Operator);
        assert!(operator.require_approved().is_ok());
        assert!(operator.require_admin().is_err());
    }

    #[test]
    fn admins_pass_both_guards() {
        let admin = user(Role::Admin);
        assert!(admin.require_approved().is_ok());
        assert!(admin.require_admin().is_ok());
    }
}
