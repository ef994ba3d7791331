use axum::http::{header, HeaderMap};
use gameforge::{AuthGate, Caller};
use std::collections::HashSet;

/// Name of the cookie that carries the session token.
pub const SESSION_COOKIE: &str = "gameforge_session";

/// Accepts a fixed set of access tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenGate {
    tokens: HashSet<String>,
}

impl TokenGate {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait::async_trait]
impl AuthGate for TokenGate {
    async fn is_authenticated(&self, caller: &Caller) -> bool {
        caller
            .token()
            .is_some_and(|token| self.tokens.contains(token))
    }
}

/// The caller behind a request: a bearer token wins over the session cookie.
#[must_use]
pub fn caller_from_headers(headers: &HeaderMap) -> Caller {
    bearer_token(headers)
        .or_else(|| session_cookie(headers))
        .map_or_else(Caller::anonymous, Caller::with_token)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that signs the browser in. `secure` keeps the cookie
/// off plain http.
#[must_use]
pub fn session_cookie_header(token: &str, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax{secure}")
}

/// `Set-Cookie` value that signs the browser out.
#[must_use]
pub fn clear_session_cookie_header() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).expect("valid header"));
        }
        map
    }

    #[tokio::test]
    async fn token_gate_accepts_only_configured_tokens() {
        let gate = TokenGate::new(["alpha", "beta"]);
        assert!(gate.is_authenticated(&Caller::with_token("alpha")).await);
        assert!(!gate.is_authenticated(&Caller::with_token("gamma")).await);
        assert!(!gate.is_authenticated(&Caller::anonymous()).await);
    }

    #[test]
    fn reads_bearer_tokens() {
        let caller = caller_from_headers(&headers(&[(header::AUTHORIZATION, "Bearer alpha")]));
        assert_eq!(caller.token(), Some("alpha"));

        let caller = caller_from_headers(&headers(&[(header::AUTHORIZATION, "Basic alpha")]));
        assert_eq!(caller.token(), None);
    }

    #[test]
    fn reads_the_session_cookie() {
        let caller = caller_from_headers(&headers(&[(
            header::COOKIE,
            "theme=dark; gameforge_session=beta; other=1",
        )]));
        assert_eq!(caller.token(), Some("beta"));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let caller = caller_from_headers(&headers(&[
            (header::COOKIE, "gameforge_session=beta"),
            (header::AUTHORIZATION, "bearer alpha"),
        ]));
        assert_eq!(caller.token(), Some("alpha"));
    }

    #[test]
    fn cookie_is_secure_only_when_asked() {
        assert_eq!(
            session_cookie_header("alpha", false),
            "gameforge_session=alpha; Path=/; HttpOnly; SameSite=Lax"
        );
        assert_eq!(
            session_cookie_header("alpha", true),
            "gameforge_session=alpha; Path=/; HttpOnly; SameSite=Lax; Secure"
        );
    }

    #[test]
    fn no_credentials_is_anonymous() {
        assert_eq!(caller_from_headers(&HeaderMap::new()), Caller::anonymous());
        let caller = caller_from_headers(&headers(&[(header::COOKIE, "gameforge_session=")]));
        assert_eq!(caller, Caller::anonymous());
    }
}
