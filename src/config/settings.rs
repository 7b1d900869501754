use anyhow::{Context, Result, bail};
use std::str::FromStr;

use crate::rating::{DEFAULT_ELO_RATING, ELO_K_FACTOR};

#[derive(Debug, Clone)]
pub struct EloSettings {
    pub default_rating: i32,
    pub k_factor: f64,
}

impl Default for EloSettings {
    fn default() -> Self {
        Self {
            default_rating: DEFAULT_ELO_RATING,
            k_factor: ELO_K_FACTOR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginationSettings {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            default_page_size: 50,
            max_page_size: 1000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TournamentSettings {
    pub max_rounds_per_matchup: i32,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            max_rounds_per_matchup: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UserSettings {
    pub username_min_length: usize,
    pub username_max_length: usize,
    pub search_limit_max: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            username_min_length: 3,
            username_max_length: 14,
            search_limit_max: 50,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub database_path: String,
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            database_path: "rivalry_tracker.db".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub elo: EloSettings,
    pub pagination: PaginationSettings,
    pub tournaments: TournamentSettings,
    pub users: UserSettings,
    pub server: ServerSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            elo: EloSettings::default(),
            pagination: PaginationSettings::default(),
            tournaments: TournamentSettings::default(),
            users: UserSettings::default(),
            server: ServerSettings::default(),
        }
    }

    /// Defaults overlaid with process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(path) = lookup("DATABASE_PATH") {
            config.server.database_path = path;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            config.server.cors_origins = parse_origins(&origins);
        }
        if let Some(value) = parse_var(&lookup, "DEFAULT_ELO_RATING")? {
            config.elo.default_rating = value;
        }
        if let Some(value) = parse_var(&lookup, "ELO_K_FACTOR")? {
            config.elo.k_factor = value;
        }
        if let Some(value) = parse_var(&lookup, "DEFAULT_PAGE_SIZE")? {
            config.pagination.default_page_size = value;
        }
        if let Some(value) = parse_var(&lookup, "MAX_PAGE_SIZE")? {
            config.pagination.max_page_size = value;
        }
        if let Some(value) = parse_var(&lookup, "MAX_ROUNDS_PER_MATCHUP")? {
            config.tournaments.max_rounds_per_matchup = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.elo.k_factor.is_finite() || self.elo.k_factor <= 0.0 {
            bail!("ELO_K_FACTOR must be a positive number, got {}", self.elo.k_factor);
        }
        if self.pagination.default_page_size == 0 || self.pagination.max_page_size == 0 {
            bail!("Page sizes must be at least 1");
        }
        if self.pagination.default_page_size > self.pagination.max_page_size {
            bail!(
                "DEFAULT_PAGE_SIZE ({}) exceeds MAX_PAGE_SIZE ({})",
                self.pagination.default_page_size,
                self.pagination.max_page_size
            );
        }
        if self.tournaments.max_rounds_per_matchup < 1 {
            bail!(
                "MAX_ROUNDS_PER_MATCHUP must be at least 1, got {}",
                self.tournaments.max_rounds_per_matchup
            );
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: {:?}", key, raw))
        })
        .transpose()
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(str::to_string)
        .collect()
}
