use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use scraper::Html;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::http::{Request, Transport};
use crate::parser::forms;

pub const LOGIN_PATH: &str = "/login";
pub const SEARCH_PATH: &str = "/search";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// Mutable per-client session state. Cookies live in the transport.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub csrf_token: Option<String>,
    pub state: AuthState,
}

/// Logs in (when credentials are configured) and captures the search form
/// token. At most one flow runs at a time: callers that arrive while a flow
/// is running wait for it and get its outcome.
pub struct SessionManager {
    transport: Arc<dyn Transport>,
    credentials: Option<Credentials>,
    session: Mutex<Session>,
    /// Outcome of the most recently completed flow; the lock is held for the
    /// whole flow.
    flight: tokio::sync::Mutex<Option<Result<()>>>,
    completed: AtomicU64,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn Transport>, credentials: Option<Credentials>) -> Self {
        Self {
            transport,
            credentials,
            session: Mutex::new(Session::default()),
            flight: tokio::sync::Mutex::new(None),
            completed: AtomicU64::new(0),
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn state(&self) -> AuthState {
        self.session().state
    }

    /// True only once a flow has completed successfully.
    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    /// Search form token captured by the last successful flow.
    pub fn csrf_token(&self) -> Option<String> {
        self.session().csrf_token.clone()
    }

    pub async fn authenticate(&self) -> Result<()> {
        if self.is_authenticated() {
            return Ok(());
        }

        let seen = self.completed.load(Ordering::SeqCst);
        let mut last = self.flight.lock().await;

        if self.completed.load(Ordering::SeqCst) != seen {
            if let Some(outcome) = last.clone() {
                debug!("Joined in-flight authentication");
                return outcome;
            }
        }
        if self.is_authenticated() {
            return Ok(());
        }

        self.session().state = AuthState::Authenticating;
        let outcome = self.run_flow().await;
        {
            let mut session = self.session();
            match &outcome {
                Ok(token) => {
                    session.csrf_token = Some(token.clone());
                    session.state = AuthState::Authenticated;
                }
                Err(e) => {
                    warn!(error = %e, "Authentication failed");
                    session.state = AuthState::Unauthenticated;
                }
            }
        }

        let outcome = outcome.map(|_| ());
        *last = Some(outcome.clone());
        self.completed.fetch_add(1, Ordering::SeqCst);
        outcome
    }

    /// Returns the search form token.
    async fn run_flow(&self) -> Result<String> {
        if let Some(creds) = &self.credentials {
            info!(username = %creds.username, "Logging in");
            let page = self.transport.send(Request::get(LOGIN_PATH)).await?;
            let login_token = token_from(&page, forms::LOGIN_TOKEN_FIELD)?;

            let form = vec![
                ("signin[username]".to_string(), creds.username.clone()),
                ("signin[password]".to_string(), creds.password.clone()),
                ("signin[remember]".to_string(), "on".to_string()),
                (forms::LOGIN_TOKEN_FIELD.to_string(), login_token),
            ];
            let result = self
                .transport
                .send(Request::post_form(LOGIN_PATH, form))
                .await?;
            if let Some(errors) = login_errors(&result) {
                return Err(Error::Auth(errors.join("; ")));
            }
            info!("Logged in");
        } else {
            debug!("No credentials configured, skipping login");
        }

        let page = self.transport.send(Request::get(SEARCH_PATH)).await?;
        let token = token_from(&page, forms::SEARCH_TOKEN_FIELD)?;
        debug!("Captured search token");
        Ok(token)
    }
}

// Parsed documents are not Send, so they never live across an await.
fn token_from(body: &str, field: &str) -> Result<String> {
    forms::csrf_token(&Html::parse_document(body), field)
}

fn login_errors(body: &str) -> Option<Vec<String>> {
    forms::error_list(&Html::parse_document(body))
}
