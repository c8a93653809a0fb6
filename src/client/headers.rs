//! Request interception for outgoing GitLab CI calls

use std::fmt::Debug;

use compact_str::CompactString;
use reqwest::{header::HeaderValue, Request};
use tracing::warn;

/// Header GitLab reads personal, project and group access tokens from
pub const PRIVATE_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Hook applied to every request right before it is sent.
///
/// Implementations take the request by value and hand back the one to send,
/// so several interceptors compose by plain function chaining.
pub trait RequestInterceptor: Debug + Send + Sync {
    fn intercept(&self, request: Request) -> Request;
}

/// Adds `PRIVATE-TOKEN` when a non-empty token is configured
#[derive(Clone, Default)]
pub struct GitlabCiHeaders {
    private_token: Option<CompactString>,
}

impl GitlabCiHeaders {
    pub fn new(private_token: Option<&str>) -> Self {
        Self {
            private_token: private_token.filter(|t| !t.is_empty()).map(CompactString::from),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.private_token.is_some()
    }
}

impl Debug for GitlabCiHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitlabCiHeaders")
            .field("private_token", &self.private_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl RequestInterceptor for GitlabCiHeaders {
    fn intercept(&self, mut request: Request) -> Request {
        let Some(token) = &self.private_token else {
            return request;
        };

        match HeaderValue::from_str(token) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(PRIVATE_TOKEN_HEADER, value);
            },
            Err(_) => warn!(
                url = %request.url(),
                "Private token contains characters not allowed in a header; sending request unauthenticated"
            ),
        }

        request
    }
}
