use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Base URL for the API (used for invitation links)
    pub api_base_url: String,
    /// Root directory for project and recipe images
    pub image_dir: PathBuf,
    /// Upper bound for uploaded image bodies
    pub max_image_bytes: usize,
    pub session_ttl_hours: i64,
    /// Rate limiting of the `/auth` routes; needs peer addresses, so tests turn it off
    pub rate_limit_enabled: bool,
    pub seed_demo_data: bool,
    /// Password of the seeded `demo` user
    pub demo_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://kitchenplaner.db?mode=rwc".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            image_dir: env::var("IMAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("images")),
            max_image_bytes: parse_var("MAX_IMAGE_BYTES").unwrap_or(10 * 1024 * 1024),
            session_ttl_hours: parse_var("SESSION_TTL_HOURS").unwrap_or(24 * 30),
            rate_limit_enabled: parse_var("RATE_LIMIT_ENABLED").unwrap_or(true),
            seed_demo_data: parse_var("SEED_DEMO_DATA").unwrap_or(false),
            demo_password: env::var("DEMO_PASSWORD").ok().filter(|p| !p.is_empty()),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
