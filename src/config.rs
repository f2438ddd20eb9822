use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;
use time::UtcOffset;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Local,
    Edamam,
    Vision,
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "edamam" => Ok(Self::Edamam),
            "vision" => Ok(Self::Vision),
            other => anyhow::bail!("unknown NUTRITION_PROVIDER: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdamamConfig {
    pub app_id: String,
    pub app_key: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct NutritionConfig {
    pub provider: ProviderKind,
    pub edamam: Option<EdamamConfig>,
    pub lookup_timeout: Duration,
    pub max_candidates: usize,
    pub vision_seed: u64,
}

#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Offset of the users' local calendar; day buckets and "today" use it.
    pub utc_offset: UtcOffset,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub nutrition: NutritionConfig,
    pub stats: StatsConfig,
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn parsed_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET")?,
            issuer: var_or("JWT_ISSUER", "dietlog"),
            audience: var_or("JWT_AUDIENCE", "dietlog-users"),
        };
        let storage = StorageConfig {
            endpoint: var_or("MINIO_ENDPOINT", "http://localhost:9000"),
            bucket: var_or("MINIO_BUCKET", "dietlog"),
            access_key: var_or("MINIO_ACCESS_KEY", "minioadmin"),
            secret_key: var_or("MINIO_SECRET_KEY", "minioadmin"),
            region: var_or("MINIO_REGION", "us-east-1"),
        };

        let edamam = match (std::env::var("EDAMAM_APP_ID"), std::env::var("EDAMAM_APP_KEY")) {
            (Ok(app_id), Ok(app_key)) if !app_id.is_empty() && !app_key.is_empty() => Some(EdamamConfig {
                app_id,
                app_key,
                base_url: var_or(
                    "EDAMAM_BASE_URL",
                    "https://api.edamam.com/api/food-database/v2/parser",
                ),
            }),
            _ => None,
        };
        let nutrition = NutritionConfig {
            provider: var_or("NUTRITION_PROVIDER", "local").parse()?,
            edamam,
            lookup_timeout: Duration::from_millis(parsed_or("NUTRITION_LOOKUP_TIMEOUT_MS", 5000)),
            max_candidates: parsed_or("NUTRITION_MAX_CANDIDATES", 3),
            vision_seed: parsed_or("VISION_SEED", 0),
        };

        let offset_hours: i8 = parsed_or("STATS_UTC_OFFSET_HOURS", 8);
        let stats = StatsConfig {
            utc_offset: UtcOffset::from_hms(offset_hours, 0, 0)
                .context("STATS_UTC_OFFSET_HOURS out of range")?,
        };

        Ok(Self {
            database_url,
            jwt,
            storage,
            nutrition,
            stats,
        })
    }
}
