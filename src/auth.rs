use std::sync::Arc;
use std::time::Duration;

use log::{debug, error};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::types::Credentials;

/// Notifications emitted outside the request/response path.
///
/// Background refresh has no caller to return to, so its outcome is published
/// here instead of through a call result.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// The first password-grant exchange succeeded.
    Authenticated,
    /// A background refresh failed; the previously cached token is left in
    /// place until an endpoint call rejects it.
    RefreshFailed(Error),
}

/// Token grant returned by the OAuth2 token endpoint, for both the password
/// and the refresh-token grants.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

struct TokenState {
    access_token: Option<String>,
    /// Present while a password-grant exchange is in flight; late arrivals
    /// subscribe here and resolve with the exchange's single outcome.
    in_flight: Option<broadcast::Sender<Result<String>>>,
    refresh_task: Option<JoinHandle<()>>,
    stopped: bool,
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
    state: Mutex<TokenState>,
    events: broadcast::Sender<AuthEvent>,
}

/// Owns the credentials and the cached access token, and serializes token
/// acquisition so that at most one exchange is in flight at a time.
#[derive(Clone)]
pub struct TokenManager {
    inner: Arc<Inner>,
}

impl TokenManager {
    pub fn new(http: reqwest::Client, base_url: &str, credentials: Credentials) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                credentials,
                state: Mutex::new(TokenState {
                    access_token: None,
                    in_flight: None,
                    refresh_task: None,
                    stopped: false,
                }),
                events,
            }),
        }
    }

    /// Return the cached access token, or perform the password-grant exchange.
    ///
    /// A cache hit never touches the network. On a miss, exactly one exchange
    /// runs; every concurrent caller arriving while it is in flight waits for
    /// it and receives the same token or the same error. The exchange itself
    /// runs on a detached task, so a caller being cancelled mid-wait can
    /// never leave the gate held: the exchange still completes, publishes its
    /// outcome and clears the in-flight marker.
    pub async fn access_token(&self) -> Result<String> {
        loop {
            let mut rx = {
                let mut state = self.inner.state.lock().await;
                if let Some(token) = &state.access_token {
                    return Ok(token.clone());
                }
                if let Some(tx) = &state.in_flight {
                    tx.subscribe()
                } else {
                    let (tx, rx) = broadcast::channel(1);
                    state.in_flight = Some(tx);
                    tokio::spawn(exchange_and_publish(Arc::clone(&self.inner)));
                    rx
                }
            };

            match rx.recv().await {
                Ok(outcome) => return outcome,
                // The exchange task went away without publishing; start over.
                Err(_) => continue,
            }
        }
    }

    /// Subscribe to authentication lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    /// Cancel any pending refresh and prevent future ones from being
    /// scheduled. Idempotent; the cached token stays usable.
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        state.stopped = true;
        if let Some(task) = state.refresh_task.take() {
            task.abort();
        }
    }

    /// Currently cached access token, if any.
    pub async fn cached_token(&self) -> Option<String> {
        self.inner.state.lock().await.access_token.clone()
    }
}

async fn exchange_and_publish(inner: Arc<Inner>) {
    debug!("Requesting access token");

    let credentials = &inner.credentials;
    let form = vec![
        ("client_id", credentials.client_id.clone()),
        ("client_secret", credentials.client_secret.clone()),
        ("username", credentials.username.clone()),
        ("password", credentials.password.clone()),
        ("scope", credentials.scope.clone()),
        ("grant_type", "password".to_string()),
    ];

    let result = token_request(&inner, &form).await;

    let mut state = inner.state.lock().await;
    let tx = state.in_flight.take();

    let outcome = match result {
        Ok(grant) => {
            debug!("Access token acquired");
            state.access_token = Some(grant.access_token.clone());
            if !state.stopped {
                if let (Some(refresh_token), Some(expires_in)) =
                    (grant.refresh_token, grant.expires_in)
                {
                    state.refresh_task = Some(schedule_refresh(
                        Arc::clone(&inner),
                        refresh_token,
                        Duration::from_secs(expires_in),
                    ));
                }
            }
            let _ = inner.events.send(AuthEvent::Authenticated);
            Ok(grant.access_token)
        }
        Err(err) => Err(err),
    };

    // Publish before releasing the lock so no waiter can miss the outcome.
    if let Some(tx) = tx {
        let _ = tx.send(outcome);
    }
}

/// Spawn the silent-refresh task. One task carries the whole refresh chain,
/// so the handle stored in the state stays abortable across reschedules.
fn schedule_refresh(
    inner: Arc<Inner>,
    refresh_token: String,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut refresh_token = refresh_token;
        let mut delay = delay;

        loop {
            tokio::time::sleep(delay).await;
            debug!("Refreshing access token");

            let form = vec![
                ("grant_type", "refresh_token".to_string()),
                ("refresh_token", refresh_token.clone()),
                ("client_id", inner.credentials.client_id.clone()),
                ("client_secret", inner.credentials.client_secret.clone()),
            ];

            match token_request(&inner, &form).await {
                Ok(grant) => {
                    let mut state = inner.state.lock().await;
                    state.access_token = Some(grant.access_token);
                    if state.stopped {
                        break;
                    }
                    match (grant.refresh_token, grant.expires_in) {
                        (Some(next_refresh), Some(expires_in)) => {
                            refresh_token = next_refresh;
                            delay = Duration::from_secs(expires_in);
                        }
                        // No further expiry advertised; the chain ends here.
                        _ => break,
                    }
                }
                Err(err) => {
                    // No caller is waiting on a refresh; keep the stale token
                    // and report through the event channel.
                    error!("Token refresh failed: {}", err);
                    let _ = inner.events.send(AuthEvent::RefreshFailed(err));
                    break;
                }
            }
        }
    })
}

async fn token_request(inner: &Inner, form: &[(&str, String)]) -> Result<TokenGrant> {
    let url = format!("{}/oauth2/token", inner.base_url);
    let response = inner.http.post(&url).form(form).send().await?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(Error::Protocol(status.as_u16()));
    }

    let text = response.text().await?;
    let grant = serde_json::from_str::<TokenGrant>(&text)?;
    Ok(grant)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_grant_parsing() {
        let json = r#"{"access_token":"abc123","refresh_token":"def456","expires_in":10800}"#;
        let grant: TokenGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.access_token, "abc123");
        assert_eq!(grant.refresh_token, Some("def456".to_string()));
        assert_eq!(grant.expires_in, Some(10800));
    }

    #[test]
    fn test_token_grant_without_expiry() {
        let json = r#"{"access_token":"abc123"}"#;
        let grant: TokenGrant = serde_json::from_str(json).unwrap();
        assert_eq!(grant.access_token, "abc123");
        assert!(grant.refresh_token.is_none());
        assert!(grant.expires_in.is_none());
    }

    #[tokio::test]
    async fn test_manager_starts_without_token() {
        let credentials = Credentials::new("id", "secret", "user", "pass").unwrap();
        let manager = TokenManager::new(
            reqwest::Client::new(),
            "https://api.netatmo.net",
            credentials,
        );
        assert!(manager.cached_token().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let credentials = Credentials::new("id", "secret", "user", "pass").unwrap();
        let manager = TokenManager::new(
            reqwest::Client::new(),
            "https://api.netatmo.net",
            credentials,
        );
        manager.stop().await;
        manager.stop().await;
        assert!(manager.cached_token().await.is_none());
    }
}
