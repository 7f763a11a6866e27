//! Registration, login and logout handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use curio_core::{Email, Role};

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::{clear_current_customer, set_current_customer};
use crate::models::CurrentCustomer;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub customer: Option<CurrentCustomer>,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub customer: Option<CurrentCustomer>,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        customer: None,
        error: query.error.as_deref().map(login_error_message),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let auth = AuthService::new(state.pool());

    match auth.login_with_password(&form.email, &form.password).await {
        Ok(customer) => log_in_and_redirect(&session, &(&customer).into()).await,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            tracing::warn!("Login failed");
            Redirect::to("/login?error=credentials").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Login error");
            Redirect::to("/login?error=failed").into_response()
        }
    }
}

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        customer: None,
        error: query
            .error
            .map(|_| "Registration failed, please try again.".to_owned()),
    }
}

/// Handle registration form submission.
///
/// A duplicate email redirects to the login page with a message, matching
/// the storefront's "you already have an account" flow. Successful
/// registration logs the customer straight in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    if form.name.trim().is_empty() {
        return RegisterTemplate {
            customer: None,
            error: Some("Please enter your name.".to_owned()),
        }
        .into_response();
    }

    // The bootstrap admin is designated by configuration
    let role = match Email::parse(&form.email) {
        Ok(email) if state.config().admin_email.as_ref() == Some(&email) => Role::Admin,
        _ => Role::Customer,
    };

    let auth = AuthService::new(state.pool());

    match auth
        .register_with_password(form.name.trim(), &form.email, &form.password, role)
        .await
    {
        Ok(customer) => log_in_and_redirect(&session, &(&customer).into()).await,
        Err(AuthError::AlreadyRegistered) => {
            Redirect::to("/login?error=email_taken").into_response()
        }
        Err(e @ (AuthError::InvalidEmail(_) | AuthError::WeakPassword(_))) => RegisterTemplate {
            customer: None,
            error: Some(registration_error_message(&e)),
        }
        .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Registration error");
            Redirect::to("/register?error=failed").into_response()
        }
    }
}

/// Handle logout: drop the session entirely and return to the listing.
pub async fn logout(session: Session) -> Response {
    if let Err(e) = clear_current_customer(&session).await {
        tracing::error!(error = %e, "Failed to clear session");
    }

    if let Err(e) = session.flush().await {
        tracing::error!(error = %e, "Failed to flush session");
    }

    clear_sentry_user();

    Redirect::to("/").into_response()
}

// =============================================================================
// Helpers
// =============================================================================

/// Store the authenticated customer in the session and send them home.
async fn log_in_and_redirect(session: &Session, customer: &CurrentCustomer) -> Response {
    if let Err(e) = set_current_customer(session, customer).await {
        tracing::error!(error = %e, "Failed to set session");
        return Redirect::to("/login?error=session").into_response();
    }

    set_sentry_user(&customer.id, Some(customer.email.as_str()));

    Redirect::to("/").into_response()
}

/// Map a login error slug from a redirect back to display text.
fn login_error_message(slug: &str) -> String {
    match slug {
        "credentials" => "Invalid email or password, please try again.".to_owned(),
        "email_taken" => "Email already registered, log in instead!".to_owned(),
        "session" => "Session expired, please log in again.".to_owned(),
        _ => "Login failed, please try again.".to_owned(),
    }
}

/// Display text for a rejected registration form.
fn registration_error_message(error: &AuthError) -> String {
    match error {
        AuthError::InvalidEmail(_) => "Please enter a valid email address.".to_owned(),
        AuthError::WeakPassword(msg) => format!("Please pick a stronger password: {msg}."),
        _ => "Registration failed, please try again.".to_owned(),
    }
}
