use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::http::{Request, Transport, USER_AGENT};
use crate::models::{avatar_url, Location, MarkerFeedEntry, MarkerId};

pub const FEED_PATH: &str = "/markers.json";

/// One positional feed row:
/// `[lon, lat, id, description, opacityFactor, userName, profileURLFragment, avatarId]`.
type FeedRow = (f64, f64, MarkerId, Option<String>, i64, String, String, u64);

/// Why the cache file could not be used. Never surfaced to callers.
#[derive(thiserror::Error, Debug)]
enum CacheMiss {
    #[error("unreadable: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The full marker feed, mirrored to a JSON file.
pub struct MarkerCache {
    transport: Arc<dyn Transport>,
    path: PathBuf,
}

impl MarkerCache {
    pub fn new(transport: Arc<dyn Transport>, path: impl Into<PathBuf>) -> Self {
        Self {
            transport,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serve from the cache file unless `force_refresh` is set or the file
    /// can't be read; otherwise download and overwrite the file.
    pub async fn load(&self, force_refresh: bool) -> Result<Vec<MarkerFeedEntry>> {
        if !force_refresh {
            if let Some(entries) = self.read().await {
                return Ok(entries);
            }
        }

        let entries = self.download().await?;
        self.write(&entries).await?;
        Ok(entries)
    }

    /// Cached entries, or `None` when the file is absent or unparseable.
    pub async fn read(&self) -> Option<Vec<MarkerFeedEntry>> {
        match self.try_read().await {
            Ok(entries) => {
                info!(count = entries.len(), path = %self.path.display(), "Loaded markers from cache");
                Some(entries)
            }
            Err(miss) => {
                debug!(path = %self.path.display(), reason = %miss, "Marker cache miss");
                None
            }
        }
    }

    async fn try_read(&self) -> std::result::Result<Vec<MarkerFeedEntry>, CacheMiss> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Overwrite the cache file with `entries`.
    pub async fn write(&self, entries: &[MarkerFeedEntry]) -> Result<()> {
        let json = serde_json::to_string(entries)?;
        tokio::fs::write(&self.path, json).await?;
        info!(count = entries.len(), path = %self.path.display(), "Wrote marker cache");
        Ok(())
    }

    /// Fetch and normalize the whole marker feed.
    pub async fn download(&self) -> Result<Vec<MarkerFeedEntry>> {
        info!("Downloading marker feed");
        let body = self
            .transport
            .send(Request::get(FEED_PATH).header("User-Agent", USER_AGENT))
            .await?;
        let entries = parse_feed(&body)?;
        info!(count = entries.len(), "Downloaded markers");
        Ok(entries)
    }
}

pub fn parse_feed(body: &str) -> Result<Vec<MarkerFeedEntry>> {
    let rows: Vec<FeedRow> = serde_json::from_str(body)?;
    Ok(rows.into_iter().map(feed_entry).collect())
}

fn feed_entry(row: FeedRow) -> MarkerFeedEntry {
    let (longitude, latitude, id, description, opacity_factor, user_name, fragment, avatar_id) = row;
    MarkerFeedEntry {
        id,
        is_home: false,
        user_name,
        description: description.unwrap_or_default(),
        location: Location {
            longitude,
            latitude,
            country: None,
            height: None,
        },
        opacity_factor,
        profile_url: format!("/profile/{}", fragment),
        // 0 means "no avatar"
        profile_image_url: (avatar_id != 0).then(|| avatar_url(avatar_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::http::mock::ScriptedTransport;

    const FEED: &str = r#"[
        [13.405, 52.52, 1001, "My den", 3, "Foxy", "Foxy", 42],
        [151.2, -33.86, "x77", null, 1, "Wolfy", "Wolfy", 0]
    ]"#;

    fn temp_path(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "furrymap-{}-{}.json",
            std::process::id(),
            name
        ));
        let _ = std::fs::remove_file(&path);
        path
    }

    fn cache(transport: &Arc<ScriptedTransport>, path: &Path) -> MarkerCache {
        MarkerCache::new(transport.clone(), path)
    }

    #[test]
    fn feed_rows() {
        let entries = parse_feed(FEED).unwrap();
        assert_eq!(entries.len(), 2);

        let den = &entries[0];
        assert_eq!(den.id, MarkerId::Int(1001));
        assert_eq!(den.location.longitude, 13.405);
        assert_eq!(den.location.latitude, 52.52);
        assert_eq!(den.description, "My den");
        assert_eq!(den.opacity_factor, 3);
        assert_eq!(den.user_name, "Foxy");
        assert_eq!(den.profile_url, "/profile/Foxy");
        assert_eq!(den.profile_image_url.as_deref(), Some("/images/avatar/42.png"));

        let beach = &entries[1];
        assert_eq!(beach.id, MarkerId::Str("x77".into()));
        assert_eq!(beach.description, "");
        assert_eq!(beach.profile_image_url, None);
    }

    #[test]
    fn malformed_feed() {
        assert!(matches!(parse_feed("<html>"), Err(Error::Json(_))));
        assert!(matches!(parse_feed("[[1, 2, 3]]"), Err(Error::Json(_))));
    }

    #[tokio::test]
    async fn valid_file_served_without_download() {
        let path = temp_path("valid");
        let entries = parse_feed(FEED).unwrap();
        std::fs::write(&path, serde_json::to_string(&entries).unwrap()).unwrap();

        let transport = Arc::new(ScriptedTransport::default());
        let loaded = cache(&transport, &path).load(false).await.unwrap();
        assert_eq!(loaded, entries);
        assert_eq!(transport.calls(), 0);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn missing_file_downloads_once() {
        let path = temp_path("missing");
        let transport = Arc::new(ScriptedTransport::new(vec![FEED]));
        let cache = cache(&transport, &path);

        let first = cache.load(false).await.unwrap();
        let second = cache.load(false).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.calls(), 1);
        assert_eq!(transport.paths(), vec![FEED_PATH]);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn invalid_json_file_is_replaced() {
        let path = temp_path("invalid");
        std::fs::write(&path, "{ not json").unwrap();
        let transport = Arc::new(ScriptedTransport::new(vec![FEED]));
        let cache = cache(&transport, &path);

        let downloaded = cache.load(false).await.unwrap();
        assert_eq!(transport.calls(), 1);
        assert_eq!(cache.read().await, Some(downloaded));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn force_refresh_always_downloads() {
        let path = temp_path("force");
        std::fs::write(&path, "[]").unwrap();
        let transport = Arc::new(ScriptedTransport::new(vec![FEED]));
        let cache = cache(&transport, &path);

        let downloaded = cache.load(true).await.unwrap();
        assert_eq!(downloaded.len(), 2);
        assert_eq!(transport.calls(), 1);
        assert_eq!(cache.read().await, Some(downloaded));
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn download_sends_client_identifier() {
        let path = temp_path("agent");
        let transport = Arc::new(ScriptedTransport::new(vec![FEED]));
        cache(&transport, &path).load(true).await.unwrap();

        let requests = transport.requests.lock().unwrap();
        assert!(requests[0]
            .headers
            .iter()
            .any(|(k, v)| k == "User-Agent" && v.starts_with("furrymap-rs/")));
        drop(requests);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn failed_download_propagates() {
        let path = temp_path("broken");
        let transport = Arc::new(ScriptedTransport::new(vec!["<html>maintenance</html>"]));
        let result = cache(&transport, &path).load(false).await;
        assert!(matches!(result, Err(Error::Json(_))));
        assert!(!path.exists());
    }
}
