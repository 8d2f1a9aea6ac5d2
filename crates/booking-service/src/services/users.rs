//! User registration.

use crate::errors::BookingError;
use crate::models::{
    is_valid_email, normalize_email, NewUser, RegisterUserRequest, UserResponse,
    MAX_CLIENT_NAME_LENGTH, MIN_PASSWORD_LENGTH,
};
use crate::repositories::{BookingStore, StoreError};
use secrecy::ExposeSecret;
use tracing::instrument;

/// Register a client account.
///
/// The name is trimmed, the email normalized, and the password stored only
/// as a bcrypt hash.
///
/// # Errors
///
/// - `BookingError::BadRequest` - blank name, malformed email, short password
/// - `BookingError::Conflict` - email already registered
/// - `BookingError::ServiceUnavailable` - store failure
#[instrument(skip_all, name = "booking.service.register_user")]
pub async fn register_user(
    store: &dyn BookingStore,
    request: RegisterUserRequest,
    bcrypt_cost: u32,
) -> Result<UserResponse, BookingError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(BookingError::BadRequest("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_CLIENT_NAME_LENGTH {
        return Err(BookingError::BadRequest(format!(
            "name must be at most {} characters",
            MAX_CLIENT_NAME_LENGTH
        )));
    }

    let email = normalize_email(&request.email);
    if !is_valid_email(&email) {
        return Err(BookingError::BadRequest(
            "email must be a valid email address".to_string(),
        ));
    }

    if request.password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(BookingError::BadRequest(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || {
        bcrypt::hash(password.expose_secret(), bcrypt_cost)
    })
    .await
    .map_err(|e| {
        tracing::error!(target: "booking.service.users", error = %e, "Hashing task failed");
        BookingError::Internal
    })?
    .map_err(|e| {
        tracing::error!(target: "booking.service.users", error = %e, "Password hashing failed");
        BookingError::Internal
    })?;

    let user = store
        .create_user(&NewUser {
            name,
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => {
                BookingError::Conflict("Email already registered.".to_string())
            }
            other => BookingError::from(other),
        })?;

    tracing::info!(target: "booking.service.users", user_id = user.user_id, "User registered");

    Ok(UserResponse {
        id: user.user_id,
        name: user.name,
        email: user.email,
    })
}
