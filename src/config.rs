use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://www.furrymap.net";
pub const DEFAULT_CACHE_NAME: &str = "furrymapCache.json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Login credentials. When absent the client skips the login form and only
/// picks up the search token.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Path of the marker cache file.
    pub cache_name: PathBuf,
    pub credentials: Option<Credentials>,
    pub base_url: String,
    /// Applied per request by the reqwest transport.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cache_name: PathBuf::from(DEFAULT_CACHE_NAME),
            credentials: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Build a config from `FURRYMAP_*` environment variables, falling back
    /// to defaults. Credentials are only set when both username and password
    /// are present.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(cache) = get("FURRYMAP_CACHE").filter(|s| !s.is_empty()) {
            config.cache_name = PathBuf::from(cache);
        }
        if let Some(base) = get("FURRYMAP_BASE_URL").filter(|s| !s.is_empty()) {
            config.base_url = base.trim_end_matches('/').to_string();
        }
        if let (Some(username), Some(password)) =
            (get("FURRYMAP_USERNAME"), get("FURRYMAP_PASSWORD"))
        {
            config.credentials = Some(Credentials { username, password });
        }
        config
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    pub fn with_cache_name(mut self, cache_name: impl Into<PathBuf>) -> Self {
        self.cache_name = cache_name.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let c = ClientConfig::default();
        assert_eq!(c.cache_name, PathBuf::from("furrymapCache.json"));
        assert!(c.credentials.is_none());
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn env_overrides() {
        let c = ClientConfig::from_lookup(lookup(&[
            ("FURRYMAP_CACHE", "/tmp/markers.json"),
            ("FURRYMAP_BASE_URL", "http://localhost:8080/"),
            ("FURRYMAP_USERNAME", "fox"),
            ("FURRYMAP_PASSWORD", "secret"),
        ]));
        assert_eq!(c.cache_name, PathBuf::from("/tmp/markers.json"));
        assert_eq!(c.base_url, "http://localhost:8080");
        let creds = c.credentials.unwrap();
        assert_eq!(creds.username, "fox");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn username_without_password_is_anonymous() {
        let c = ClientConfig::from_lookup(lookup(&[("FURRYMAP_USERNAME", "fox")]));
        assert!(c.credentials.is_none());
    }
}
