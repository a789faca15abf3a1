use std::sync::{Arc, LazyLock};

use chrono::Local;
use reqwest::Url;
use tracing::{debug, info};

use crate::cache::MarkerCache;
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::geo::{CountryLookup, NoCountryLookup};
use crate::http::{HttpTransport, Request, Transport};
use crate::models::{FullProfile, MarkerFeedEntry, SearchFilter, SearchResult};
use crate::parser;
use crate::parser::forms::SEARCH_TOKEN_FIELD;
use crate::session::{SessionManager, SEARCH_PATH};

static PROFILE_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("http://localhost/profile/").unwrap());

/// Entry point: search and profile pages go through the session, the marker
/// feed does not.
pub struct Client {
    transport: Arc<dyn Transport>,
    session: SessionManager,
    cache: MarkerCache,
    lookup: Arc<dyn CountryLookup>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self::with_transport(config, transport))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            session: SessionManager::new(transport.clone(), config.credentials),
            cache: MarkerCache::new(transport.clone(), config.cache_name),
            lookup: Arc::new(NoCountryLookup),
            transport,
        }
    }

    /// Use `lookup` to fill in the country of scraped markers.
    pub fn with_country_lookup(mut self, lookup: impl CountryLookup + 'static) -> Self {
        self.lookup = Arc::new(lookup);
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub async fn authenticate(&self) -> Result<()> {
        self.session.authenticate().await
    }

    pub async fn search(&self, name: &str, filter: Option<SearchFilter>) -> Result<SearchResult> {
        self.session.authenticate().await?;
        let token = search_token(&self.session)?;
        let filter = filter.unwrap_or_default();

        let form = vec![
            ("search[name]".to_string(), name.to_string()),
            ("search[filter]".to_string(), filter.as_form_value().to_string()),
            (SEARCH_TOKEN_FIELD.to_string(), token),
        ];
        let body = self
            .transport
            .send(Request::post_form(SEARCH_PATH, form))
            .await?;

        let result = parser::search_page(&body, self.lookup.as_ref())?;
        info!(
            query = name,
            filter = filter.as_form_value(),
            users = result.users.len(),
            markers = result.markers.len(),
            "Search finished"
        );
        Ok(result)
    }

    pub async fn get_profile(&self, user_name: &str) -> Result<FullProfile> {
        self.session.authenticate().await?;
        let path = profile_path(user_name);
        debug!(%path, "Fetching profile");
        let body = self.transport.send(Request::get(path)).await?;
        parser::profile_page(&body, self.lookup.as_ref(), Local::now().date_naive())
    }

    pub async fn load_markers(&self, force_refresh: bool) -> Result<Vec<MarkerFeedEntry>> {
        self.cache.load(force_refresh).await
    }
}

/// Token captured from the search page by the last successful login flow.
fn search_token(session: &SessionManager) -> Result<String> {
    session
        .csrf_token()
        .ok_or_else(|| Error::parse("no search token in session"))
}

/// `/profile/<name>` with the name percent-encoded as one path segment.
fn profile_path(user_name: &str) -> String {
    let mut url = PROFILE_BASE.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(user_name);
    }
    url.path().to_string()
}
