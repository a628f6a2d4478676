use axum::http::{header, HeaderMap};
use axum_extra::headers::{authorization::Basic, Authorization, Header};
use subtle::ConstantTimeEq;

/// A (user, pass) pair, either configured or supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Reads `Authorization: Basic <base64(user:pass)>`.
///
/// A missing header, another scheme, bad base64 or a token without a colon all
/// yield the empty pair, which then goes through the normal comparison.
pub fn extract_credentials(headers: &HeaderMap) -> Credentials {
    let mut values = headers.get_all(header::AUTHORIZATION).iter();
    match Authorization::<Basic>::decode(&mut values) {
        Ok(auth) => Credentials::new(auth.username(), auth.password()),
        Err(_) => Credentials::default(),
    }
}

/// Compares both halves without short-circuiting on the first mismatch.
pub fn authenticate(expected: &Credentials, supplied: &Credentials) -> bool {
    let user_ok = expected
        .username
        .as_bytes()
        .ct_eq(supplied.username.as_bytes());
    let pass_ok = expected
        .password
        .as_bytes()
        .ct_eq(supplied.password.as_bytes());
    (user_ok & pass_ok).into()
}
