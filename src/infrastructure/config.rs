use std::env;
use std::path::PathBuf;

pub const DEFAULT_GOOGLE_BOOKS_API_URL: &str = "https://www.googleapis.com/books/v1/volumes";

/// How many recommendations each call site asks for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecommendationLimits {
    /// `GET /books/{id}/recommendations`
    pub more: usize,
    /// `similar_books` on `GET /books/{id}`
    pub detail: usize,
}

impl Default for RecommendationLimits {
    fn default() -> Self {
        Self {
            more: 12,
            detail: 6,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub profile: String,
    /// Root directory for stored cover images
    pub storage_dir: PathBuf,
    pub google_books_api_url: String,
    pub recommendations: RecommendationLimits,
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        let profile = env::var("PROFILE").unwrap_or_else(|_| "default".to_string());
        Self::for_profile(profile)
    }

    /// Environment configuration with an explicit profile (`--profile` flag)
    pub fn for_profile(profile: impl Into<String>) -> Self {
        let profile = profile.into();

        let database_url = env::var("DATABASE_URL").unwrap_or_else(|_| {
            if profile == "default" {
                "sqlite://bookify.db?mode=rwc".to_string()
            } else {
                format!("sqlite://bookify_{}.db?mode=rwc", profile)
            }
        });

        let defaults = RecommendationLimits::default();

        Self {
            database_url,
            port: parse_env("PORT").unwrap_or(8000),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            profile,
            storage_dir: env::var("STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("storage")),
            google_books_api_url: env::var("GOOGLE_BOOKS_API_URL")
                .unwrap_or_else(|_| DEFAULT_GOOGLE_BOOKS_API_URL.to_string()),
            recommendations: RecommendationLimits {
                more: parse_env("RECOMMENDATION_LIMIT").unwrap_or(defaults.more),
                detail: parse_env("SIMILAR_BOOKS_LIMIT").unwrap_or(defaults.detail),
            },
        }
    }

    /// Configuration for tests and embedded use: in-memory database, given storage root.
    pub fn in_memory(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 0,
            cors_allowed_origins: Vec::new(),
            profile: "test".to_string(),
            storage_dir: storage_dir.into(),
            google_books_api_url: DEFAULT_GOOGLE_BOOKS_API_URL.to_string(),
            recommendations: RecommendationLimits::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 7] = [
        "PROFILE",
        "DATABASE_URL",
        "PORT",
        "CORS_ALLOWED_ORIGINS",
        "STORAGE_DIR",
        "RECOMMENDATION_LIMIT",
        "SIMILAR_BOOKS_LIMIT",
    ];

    fn clear() {
        for key in KEYS {
            // SAFETY: env mutation is serialized across tests with #[serial]
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn defaults() {
        clear();
        let config = Config::from_env();
        assert_eq!(config.database_url, "sqlite://bookify.db?mode=rwc");
        assert_eq!(config.port, 8000);
        assert_eq!(config.recommendations, RecommendationLimits { more: 12, detail: 6 });
        assert!(config.cors_allowed_origins.is_empty());
    }

    #[test]
    #[serial]
    fn overrides_from_environment() {
        clear();
        // SAFETY: env mutation is serialized across tests with #[serial]
        unsafe {
            env::set_var("PROFILE", "staging");
            env::set_var("PORT", "9100");
            env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,");
            env::set_var("RECOMMENDATION_LIMIT", "20");
            env::set_var("SIMILAR_BOOKS_LIMIT", "not-a-number");
        }

        let config = Config::from_env();
        assert_eq!(config.database_url, "sqlite://bookify_staging.db?mode=rwc");
        assert_eq!(config.port, 9100);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert_eq!(config.recommendations.more, 20);
        assert_eq!(config.recommendations.detail, 6);
        clear();
    }

    #[test]
    #[serial]
    fn explicit_profile_selects_database() {
        clear();
        let config = Config::for_profile("demo");
        assert_eq!(config.profile, "demo");
        assert_eq!(config.database_url, "sqlite://bookify_demo.db?mode=rwc");
    }
}
