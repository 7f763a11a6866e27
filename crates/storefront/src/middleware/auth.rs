//! Authentication extractors.
//!
//! Login state lives in the session; handlers declare what they need by
//! extractor. The admin gate is a role check on the account, not a
//! distinguished customer id.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentCustomer, session_keys};

/// Extractor that requires a logged-in customer.
///
/// Anonymous callers are redirected to the login page.
///
/// # Example
///
/// ```rust,ignore
/// async fn cart(RequireCustomer(customer): RequireCustomer) -> impl IntoResponse {
///     format!("Hello, {}!", customer.name)
/// }
/// ```
pub struct RequireCustomer(pub CurrentCustomer);

/// Rejection for [`RequireCustomer`]: send the caller to the login page.
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = RedirectToLogin;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = current_customer(parts).await.ok_or(RedirectToLogin)?;
        Ok(Self(customer))
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike [`RequireCustomer`], this never rejects; the product listing is
/// public and merely renders differently for logged-in viewers.
pub struct OptionalCustomer(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalCustomer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_customer(parts).await))
    }
}

/// Extractor that requires an authenticated admin.
///
/// Anonymous callers and customers without the admin role both fail with
/// 403 Forbidden; catalog management is not discoverable, so there is no
/// login redirect.
pub struct RequireAdmin(pub CurrentCustomer);

/// Rejection for [`RequireAdmin`].
pub struct Forbidden;

impl IntoResponse for Forbidden {
    fn into_response(self) -> Response {
        (StatusCode::FORBIDDEN, "Forbidden").into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = Forbidden;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer = current_customer(parts).await.ok_or(Forbidden)?;

        if !customer.role.is_admin() {
            return Err(Forbidden);
        }

        Ok(Self(customer))
    }
}

/// Read the current customer from the request's session, if any.
async fn current_customer(parts: &mut Parts) -> Option<CurrentCustomer> {
    let session = parts.extensions.get::<Session>()?;

    session
        .get(session_keys::CURRENT_CUSTOMER)
        .await
        .ok()
        .flatten()
}

/// Store the logged-in customer in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Remove the logged-in customer from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await?;
    Ok(())
}
