//! Request/response interceptors.

use std::sync::Arc;

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Request, StatusCode, Url};
use tracing::{error, warn};

use crate::session::{SessionEvent, SessionEvents, SessionStore};

/// Hook run around every request sent through an [`ApiClient`](super::ApiClient).
pub trait Interceptor: Send + Sync {
    /// Inspect or mutate the outgoing request.
    fn on_request(&self, _request: &mut Request) {}

    /// Observe the response status before the result reaches the caller.
    fn on_response(&self, _status: StatusCode, _url: &Url) {}
}

/// Attaches the stored credential to outgoing requests.
///
/// A missing credential leaves the request untouched; the backend decides.
pub struct CredentialInjector {
    store: Arc<dyn SessionStore>,
    key: String,
    header: HeaderName,
}

impl CredentialInjector {
    pub fn new(store: Arc<dyn SessionStore>, key: impl Into<String>, header: HeaderName) -> Self {
        Self {
            store,
            key: key.into(),
            header,
        }
    }
}

impl Interceptor for CredentialInjector {
    fn on_request(&self, request: &mut Request) {
        let credential = match self.store.get(&self.key) {
            Ok(Some(value)) => value,
            Ok(None) => return,
            Err(e) => {
                warn!("Failed to read credential from session store: {}", e);
                return;
            }
        };

        match HeaderValue::from_str(&credential) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(self.header.clone(), value);
            }
            Err(_) => warn!("Stored credential is not a valid header value, skipping"),
        }
    }
}

/// Invalidates the session when the backend rejects the credential.
///
/// On 401/403 every persisted key is cleared (not only the credential) and a
/// [`SessionEvent::Invalidated`] is published. The rejection itself still
/// propagates to the caller.
#[derive(Clone)]
pub struct SessionGuard {
    store: Arc<dyn SessionStore>,
    events: SessionEvents,
}

impl SessionGuard {
    pub fn new(store: Arc<dyn SessionStore>, events: SessionEvents) -> Self {
        Self { store, events }
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }
}

impl Interceptor for SessionGuard {
    fn on_response(&self, status: StatusCode, url: &Url) {
        if status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
            return;
        }

        warn!("Session expired or invalid (HTTP {} from {})", status.as_u16(), url);

        if let Err(e) = self.store.clear() {
            error!("Failed to clear session store: {}", e);
        }

        self.events.publish(SessionEvent::Invalidated {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
}
