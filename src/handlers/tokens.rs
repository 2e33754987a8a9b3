//! JSON Web Token endpoints: obtain, refresh and verify.
//!
//! Every failure is a 400 with the reason under `non_field_errors`, the
//! exception being missing fields, which are reported per field.

use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::{TokenError, decode_token, issue_token, refresh_token},
    error::{ApiError, FieldErrors, NON_FIELD_ERRORS},
    extract::ApiJson,
    models::{ObtainTokenRequest, TokenRequest, TokenResponse},
    password::verify_password,
};

const INVALID_CREDENTIALS: &str = "Unable to log in with provided credentials.";

fn required(value: Option<String>, name: &str, errors: &mut FieldErrors) -> String {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(value) => value,
        None => {
            errors.add(name, "This field is required.");
            String::new()
        }
    }
}

fn rejected(error: TokenError) -> ApiError {
    match error {
        TokenError::Signing => ApiError::Internal(error.to_string()),
        other => ApiError::field(NON_FIELD_ERRORS, other.to_string()),
    }
}

/// obtain_token
///
/// [Public Route] Exchanges username and password for a token.
#[utoipa::path(
    post,
    path = "/api-token-auth/",
    request_body = ObtainTokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Missing fields or bad credentials")
    )
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ObtainTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    let username = required(payload.username, "username", &mut errors);
    let password = required(payload.password, "password", &mut errors);
    errors.into_result()?;

    let user = state
        .repo
        .get_user_by_username(&username)
        .await?
        .filter(|user| verify_password(&password, &user.password_hash));

    let Some(user) = user else {
        tracing::info!(%username, "token request with invalid credentials");
        return Err(ApiError::field(NON_FIELD_ERRORS, INVALID_CREDENTIALS));
    };

    let token = issue_token(&state.config, &user).map_err(rejected)?;
    tracing::info!(user_id = user.id, username = %user.username, "token issued");
    Ok(Json(TokenResponse { token }))
}

/// refresh_token
///
/// [Public Route] Exchanges a valid token for one with a later expiry, as long
/// as the refresh window of the original token has not closed.
#[utoipa::path(
    post,
    path = "/api-token-refresh/",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 400, description = "Invalid, expired or no longer refreshable token")
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    let token = required(payload.token, "token", &mut errors);
    errors.into_result()?;

    let token = refresh_token(&state.config, &token).map_err(rejected)?;
    Ok(Json(TokenResponse { token }))
}

/// verify_token
///
/// [Public Route] Echoes the token back when it is valid.
#[utoipa::path(
    post,
    path = "/api-token-verify/",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token is valid", body = TokenResponse),
        (status = 400, description = "Invalid or expired token")
    )
)]
pub async fn verify(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut errors = FieldErrors::new();
    let token = required(payload.token, "token", &mut errors);
    errors.into_result()?;

    decode_token(&state.config, &token).map_err(rejected)?;
    Ok(Json(TokenResponse { token }))
}
