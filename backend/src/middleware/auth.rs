//! Authentication middleware
//!
//! JWT authentication, role-based access control, and step-up verification.
//! The step-up grant travels as its own short-lived token in the `x-step-up`
//! header, so sensitive views never rely on ambient session state.

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use shared::{can_access, requires_step_up, Role, View};

use crate::error::{AppError, ErrorResponse};

/// Header carrying the step-up token for sensitive views
pub const STEP_UP_HEADER: &str = "x-step-up";

/// Authenticated user information extracted from the JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub username: String,
    pub role: Role,
    /// True when a valid, unexpired step-up token accompanied the request
    pub step_up_verified: bool,
}

/// Check that the user's role reaches `view`, and that a step-up grant is
/// present when the view demands one.
pub fn check_view(user: &AuthUser, view: View) -> Result<(), AppError> {
    if !can_access(user.role, view) {
        return Err(AppError::InsufficientPermissions);
    }
    if requires_step_up(view) && !user.step_up_verified {
        return Err(AppError::StepUpRequired);
    }
    Ok(())
}

/// Authentication middleware that validates JWT tokens.
/// Note: token validation is done inline against the environment-provided
/// secret to avoid state dependency issues in the middleware layer.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    let jwt_secret = jwt_secret();

    let claims = match decode_jwt(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(msg) => {
            return unauthorized_response(&msg);
        }
    };

    let role = match Role::from_str(&claims.role) {
        Some(role) => role,
        None => return unauthorized_response("Invalid role in token"),
    };

    // A step-up token is optional; when present it must be valid, unexpired,
    // and issued to the same user.
    let step_up_verified = request
        .headers()
        .get(STEP_UP_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|token| validate_step_up(token, &jwt_secret, &claims.sub))
        .unwrap_or(false);

    let auth_user = AuthUser {
        username: claims.sub,
        role,
        step_up_verified,
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// JWT secret from the environment (fallback for middleware without state)
pub fn jwt_secret() -> String {
    std::env::var("STOCKBOOK__AUTH__JWT_SECRET")
        .or_else(|_| std::env::var("STOCKBOOK_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string())
}

/// Access token claims
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Step-up token claims; `scope` pins the token to step-up use only
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct StepUpClaims {
    pub sub: String,
    pub scope: String,
    pub exp: i64,
    pub iat: i64,
}

/// Decode and validate an access token
fn decode_jwt(token: &str, secret: &str) -> Result<Claims, String> {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Invalid token: {}", e))
}

/// Validate a step-up token against the requesting user
fn validate_step_up(token: &str, secret: &str, username: &str) -> bool {
    use jsonwebtoken::{decode, DecodingKey, Validation};

    decode::<StepUpClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.scope == "step_up" && data.claims.sub == username)
    .unwrap_or(false)
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: crate::error::ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: crate::error::ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, step_up: bool) -> AuthUser {
        AuthUser {
            username: "tester".to_string(),
            role,
            step_up_verified: step_up,
        }
    }

    #[test]
    fn biller_cannot_reach_inventory() {
        let err = check_view(&user(Role::Biller, false), View::Inventory).unwrap_err();
        assert!(matches!(err, AppError::InsufficientPermissions));
    }

    #[test]
    fn sensitive_view_demands_step_up_even_for_admin() {
        let err = check_view(&user(Role::Admin, false), View::ProfitAnalysis).unwrap_err();
        assert!(matches!(err, AppError::StepUpRequired));
        assert!(check_view(&user(Role::Admin, true), View::ProfitAnalysis).is_ok());
    }

    #[test]
    fn role_check_precedes_step_up_check() {
        // A biller with a step-up grant still cannot see profit analysis.
        let err = check_view(&user(Role::Biller, true), View::ProfitAnalysis).unwrap_err();
        assert!(matches!(err, AppError::InsufficientPermissions));
    }
}
