//! Extract HTTP Basic credentials from the `Authorization` header.

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Optional Basic credentials. Absent or malformed headers yield `None`.
#[derive(Clone, Debug)]
pub struct BasicAuth(pub Option<Credentials>);

pub fn parse_basic(headers: &HeaderMap) -> Option<Credentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for BasicAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BasicAuth(parse_basic(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn parses_basic_credentials() {
        let encoded = STANDARD.encode("alice:pa:ss");
        let creds = parse_basic(&headers(&format!("Basic {}", encoded))).unwrap();
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "pa:ss");
    }

    #[test]
    fn rejects_other_schemes_and_garbage() {
        assert!(parse_basic(&HeaderMap::new()).is_none());
        assert!(parse_basic(&headers("Bearer abc")).is_none());
        assert!(parse_basic(&headers("Basic !!!")).is_none());
        assert!(parse_basic(&headers(&format!("Basic {}", STANDARD.encode("nocolon")))).is_none());
    }

    #[test]
    fn debug_hides_password() {
        let c = Credentials {
            username: "alice".into(),
            password: "secret".into(),
        };
        assert!(!format!("{:?}", c).contains("secret"));
    }
}
