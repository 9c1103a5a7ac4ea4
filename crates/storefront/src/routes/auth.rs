//! Authentication route handlers.
//!
//! # Flows
//!
//! - Signup: `POST /signup` (passcode) → `PUT /otp` (verify) → `PUT /signup` (password).
//!   The verify step records the email in the session; completion only
//!   accepts that email.
//! - Passcode login: `POST /otp` → `POST /login` with `code`
//! - Password login: `POST /login` with `password`

use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use elegance_core::OtpPurpose;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::session::keys;
use crate::models::{CurrentUser, Profile, User, VerifiedEmail};
use crate::services::IssuedOtp;
use crate::state::AppState;

// =============================================================================
// Request / response bodies
// =============================================================================

/// Body of the passcode request endpoints.
#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

/// Body of `PUT /api/auth/otp`.
#[derive(Debug, Deserialize)]
pub struct OtpVerification {
    pub email: String,
    pub code: String,
    /// What the code was issued for. Defaults to signup.
    #[serde(default = "signup")]
    pub purpose: OtpPurpose,
}

const fn signup() -> OtpPurpose {
    OtpPurpose::Signup
}

/// Body of `PUT /api/auth/signup`.
#[derive(Debug, Deserialize)]
pub struct CompleteSignup {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// Body of `POST /api/auth/login`. Exactly one of `password` or `code`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: Option<String>,
    pub code: Option<String>,
}

/// Response to a passcode request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpIssued {
    pub message: &'static str,
    pub expires_at: DateTime<Utc>,
    /// Only present when passcode echoing is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<IssuedOtp> for OtpIssued {
    fn from(issued: IssuedOtp) -> Self {
        Self {
            message: "Verification code sent",
            expires_at: issued.expires_at,
            code: issued.code,
        }
    }
}

/// Response to a passcode verification.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpVerified {
    pub verified: bool,
    /// Whether the account still needs a password to finish signup.
    pub needs_password: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Issue a login passcode.
#[instrument(skip(state, input))]
pub async fn request_otp(
    State(state): State<AppState>,
    Json(input): Json<OtpRequest>,
) -> Result<Json<OtpIssued>> {
    let issued = state.auth().request_otp(&input.email, OtpPurpose::Login).await?;
    Ok(Json(issued.into()))
}

/// Verify a passcode without logging in.
///
/// The verified email is kept in the session for signup completion.
#[instrument(skip(state, session, input))]
pub async fn verify_otp(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<OtpVerification>,
) -> Result<Json<OtpVerified>> {
    let user = state
        .auth()
        .verify_otp(&input.email, &input.code, input.purpose)
        .await?;
    session
        .insert(
            keys::VERIFIED_EMAIL,
            VerifiedEmail::new(user.email.clone(), Utc::now()),
        )
        .await?;
    Ok(Json(OtpVerified {
        verified: true,
        needs_password: !user.has_password,
    }))
}

/// Issue a signup passcode.
#[instrument(skip(state, input))]
pub async fn request_signup(
    State(state): State<AppState>,
    Json(input): Json<OtpRequest>,
) -> Result<(StatusCode, Json<OtpIssued>)> {
    let issued = state
        .auth()
        .request_otp(&input.email, OtpPurpose::Signup)
        .await?;
    Ok((StatusCode::CREATED, Json(issued.into())))
}

/// Set the password of the email verified in this session and log in.
#[instrument(skip(state, session, input))]
pub async fn complete_signup(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<CompleteSignup>,
) -> Result<(StatusCode, Json<Profile>)> {
    let verified = session
        .get::<VerifiedEmail>(keys::VERIFIED_EMAIL)
        .await?;
    let user = state
        .auth()
        .complete_signup(
            verified.as_ref(),
            &input.email,
            &input.password,
            input.name.as_deref(),
        )
        .await?;
    session.remove::<VerifiedEmail>(keys::VERIFIED_EMAIL).await?;
    start_session(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Log in with a password or a passcode.
#[instrument(skip(state, session, input))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(input): Json<LoginRequest>,
) -> Result<Json<Profile>> {
    let auth = state.auth();
    let user = match (input.password.as_deref(), input.code.as_deref()) {
        (Some(password), None) => auth.login_with_password(&input.email, password).await?,
        (None, Some(code)) => auth.login_with_otp(&input.email, code).await?,
        _ => {
            return Err(AppError::BadRequest(
                "Provide either a password or a code".to_owned(),
            ));
        }
    };
    start_session(&session, &user).await?;
    Ok(Json(user.into()))
}

/// End the session.
#[instrument(skip(session, user))]
pub async fn logout(session: Session, OptionalAuth(user): OptionalAuth) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "User logged out");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_purpose_defaults_to_signup() {
        let input: OtpVerification =
            serde_json::from_str(r#"{"email":"a@example.com","code":"123456"}"#).unwrap();
        assert_eq!(input.purpose, OtpPurpose::Signup);

        let input: OtpVerification = serde_json::from_str(
            r#"{"email":"a@example.com","code":"123456","purpose":"login"}"#,
        )
        .unwrap();
        assert_eq!(input.purpose, OtpPurpose::Login);
    }

    #[test]
    fn test_issued_code_only_serialized_when_echoed() {
        let hidden = OtpIssued {
            message: "Verification code sent",
            expires_at: Utc::now(),
            code: None,
        };
        let json = serde_json::to_value(&hidden).unwrap();
        assert!(json.get("code").is_none());
        assert!(json.get("expiresAt").is_some());

        let echoed = OtpIssued {
            code: Some("123456".to_owned()),
            ..hidden
        };
        assert_eq!(serde_json::to_value(&echoed).unwrap()["code"], "123456");
    }
}
