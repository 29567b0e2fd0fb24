use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use tokio_util::sync::CancellationToken;

use crate::context::{RequestCancellation, RequestCredential};

#[derive(Clone)]
pub struct RequestContextState {
    pub session_cookie: Arc<str>,
    /// Parent of every request's cancellation token.
    pub shutdown: CancellationToken,
}

/// Attach the request's credential and cancellation token as extensions.
///
/// Never rejects: whether a missing or bad credential matters depends on the
/// action, which the guard decides.
pub async fn request_context(
    State(state): State<RequestContextState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let credential = extract_credential(req.headers(), &state.session_cookie);
    let cancel = state.shutdown.child_token();

    req.extensions_mut().insert(credential);
    req.extensions_mut().insert(RequestCancellation(cancel.clone()));

    // Dropping the in-flight future (client went away) cancels the token.
    let _cancel_on_drop = cancel.drop_guard();
    next.run(req).await
}

/// Bearer header first, then the session cookie.
pub fn extract_credential(headers: &HeaderMap, cookie_name: &str) -> RequestCredential {
    if let Some(header) = headers.get(header::AUTHORIZATION) {
        return match extract_bearer(header.to_str().ok()) {
            Some(token) => RequestCredential::Token(token.to_string()),
            None => RequestCredential::Malformed,
        };
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .map_or(RequestCredential::None, |value| RequestCredential::Token(value.to_string()))
}

fn extract_bearer(header: Option<&str>) -> Option<&str> {
    let token = header?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn no_credential_is_anonymous() {
        assert_eq!(extract_credential(&HeaderMap::new(), "token"), RequestCredential::None);
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer abc"),
            (header::COOKIE, "token=def"),
        ]);
        assert_eq!(extract_credential(&h, "token"), RequestCredential::Token("abc".to_string()));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        let h = headers(&[(header::COOKIE, "theme=dark; token=def ; lang=fi")]);
        assert_eq!(extract_credential(&h, "token"), RequestCredential::Token("def".to_string()));
    }

    #[test]
    fn cleared_cookie_is_anonymous() {
        let h = headers(&[(header::COOKIE, "token=")]);
        assert_eq!(extract_credential(&h, "token"), RequestCredential::None);
    }

    #[test]
    fn non_bearer_authorization_is_malformed() {
        for value in ["Basic Zm9vOmJhcg==", "Bearer ", "bearer"] {
            let h = headers(&[(header::AUTHORIZATION, value)]);
            assert_eq!(extract_credential(&h, "token"), RequestCredential::Malformed, "{value}");
        }
    }
}
