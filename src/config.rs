use serde::Deserialize;

use crate::services::{ModelSettings, StopWords};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum pooled database connections
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Browser origin allowed to call the API
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Requested number of latent components (clamped to the data)
    #[serde(default = "default_latent_rank")]
    pub latent_rank: usize,

    /// Number of recommendations returned when a request does not ask for a count
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Largest count a request may ask for
    #[serde(default = "default_max_recommendation_count")]
    pub max_recommendation_count: usize,

    /// Stop-word list applied by the TF-IDF vectorizers
    #[serde(default)]
    pub stop_words: StopWords,

    /// Extra random directions sampled by the randomized SVD
    #[serde(default = "default_svd_oversamples")]
    pub svd_oversamples: usize,

    /// Power iterations run by the randomized SVD
    #[serde(default = "default_svd_power_iterations")]
    pub svd_power_iterations: usize,

    /// Seed for the randomized SVD's test matrix
    #[serde(default = "default_svd_seed")]
    pub svd_seed: u64,
}

fn default_database_url() -> String {
    "sqlite://data/movie_recommendation.db".to_string()
}

fn default_database_max_connections() -> u32 {
    5
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origin() -> String {
    "http://localhost:5173".to_string()
}

fn default_latent_rank() -> usize {
    50
}

fn default_recommendation_count() -> usize {
    5
}

fn default_max_recommendation_count() -> usize {
    50
}

fn default_svd_oversamples() -> usize {
    10
}

fn default_svd_power_iterations() -> usize {
    5
}

fn default_svd_seed() -> u64 {
    42
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Settings consumed by the model builders
    pub fn model_settings(&self) -> ModelSettings {
        ModelSettings {
            latent_rank: self.latent_rank,
            oversamples: self.svd_oversamples,
            power_iterations: self.svd_power_iterations,
            seed: self.svd_seed,
            stop_words: self.stop_words,
        }
    }
}
