//! Authorization header construction.

use base64::Engine;

use crate::config::Credentials;

/// Build the `Authorization` header value for a set of credentials.
///
/// A configured token wins and produces a bearer value; otherwise the
/// user and password are sent as HTTP basic auth.
#[must_use]
pub fn auth_header(credentials: &Credentials) -> String {
    match credentials.token.as_deref() {
        Some(token) if !token.is_empty() => format!("Bearer {token}"),
        _ => {
            let pair = format!("{}:{}", credentials.user, credentials.password);
            format!(
                "Basic {}",
                base64::engine::general_purpose::STANDARD.encode(pair)
            )
        }
    }
}
