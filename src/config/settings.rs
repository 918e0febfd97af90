//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Image sizes accepted by the stock provider
pub const STOCK_IMAGE_SIZES: &[&str] = &[
    "square_1_1",
    "classic_4_3",
    "traditional_3_4",
    "widescreen_16_9",
    "social_story_9_16",
    "standard_3_2",
    "portrait_2_3",
    "horizontal_2_1",
    "vertical_1_2",
    "social_post_4_5",
];

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

fn default_rps() -> u32 {
    10
}

fn default_burst() -> u32 {
    20
}

/// Retry policy for outbound provider calls
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Upper bound on a provider's model-loading estimate
    #[serde(default = "default_max_loading_wait")]
    pub max_loading_wait_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            max_loading_wait_ms: default_max_loading_wait(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    10000
}

fn default_max_loading_wait() -> u64 {
    60000
}

/// Generated image cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
    /// Directory backing the persistent store; in-memory when unset
    #[serde(default)]
    pub storage_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            storage_path: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_ttl() -> u64 {
    24 * 60 * 60
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub diffusion: DiffusionConfig,
    #[serde(default)]
    pub stock: StockConfig,
}

/// Diffusion model endpoint returning raw image bytes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiffusionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_diffusion_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_negative_prompt")]
    pub negative_prompt: String,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_steps")]
    pub num_inference_steps: u32,
    #[serde(default = "default_guidance")]
    pub guidance_scale: f32,
    /// Prompt used for the cached hero image when the caller sends none
    #[serde(default = "default_hero_prompt")]
    pub default_prompt: String,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_diffusion_endpoint(),
            timeout_ms: default_timeout(),
            negative_prompt: default_negative_prompt(),
            width: default_width(),
            height: default_height(),
            num_inference_steps: default_steps(),
            guidance_scale: default_guidance(),
            default_prompt: default_hero_prompt(),
        }
    }
}

fn default_diffusion_endpoint() -> String {
    "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0"
        .to_string()
}

fn default_timeout() -> u64 {
    60000
}

fn default_negative_prompt() -> String {
    "blurry, low quality, distorted, watermark, text".to_string()
}

fn default_width() -> u32 {
    1024
}

fn default_height() -> u32 {
    768
}

fn default_steps() -> u32 {
    30
}

fn default_guidance() -> f32 {
    7.5
}

fn default_hero_prompt() -> String {
    "vintage analog synthesizer on a wooden studio desk, warm lighting, detailed knobs and keys"
        .to_string()
}

/// Stock image generation endpoint returning base64 JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StockConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_stock_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
    #[serde(default = "default_style")]
    pub default_style: String,
    #[serde(default = "default_image_size")]
    pub image_size: String,
}

impl Default for StockConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_stock_endpoint(),
            timeout_ms: default_timeout(),
            default_style: default_style(),
            image_size: default_image_size(),
        }
    }
}

fn default_stock_endpoint() -> String {
    "https://api.freepik.com/v1/ai/text-to-image".to_string()
}

fn default_style() -> String {
    "photographic".to_string()
}

fn default_image_size() -> String {
    "square_1_1".to_string()
}

fn config_error(message: String) -> AppError {
    AppError::Config(config::ConfigError::Message(message))
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path
            .as_ref()
            .to_str()
            .ok_or_else(|| config_error("Configuration path is not valid UTF-8".to_string()))?;

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("retry.max_retries", 5)?
            .add_source(File::with_name(path).required(false))
            // Override with environment variables (prefixed with SYNTH_GATEWAY)
            .add_source(
                Environment::with_prefix("SYNTH_GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0".to_string()));
        }

        if self.retry.max_retries == 0 {
            return Err(config_error("retry.max_retries must be at least 1".to_string()));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(config_error(format!(
                "retry.base_delay_ms ({}) exceeds retry.max_delay_ms ({})",
                self.retry.base_delay_ms, self.retry.max_delay_ms
            )));
        }

        let diffusion = &self.providers.diffusion;
        if diffusion.enabled && diffusion.endpoint.trim().is_empty() {
            return Err(config_error("Diffusion provider endpoint cannot be empty".to_string()));
        }

        let stock = &self.providers.stock;
        if stock.enabled {
            if stock.endpoint.trim().is_empty() {
                return Err(config_error("Stock provider endpoint cannot be empty".to_string()));
            }
            if !STOCK_IMAGE_SIZES.contains(&stock.image_size.as_str()) {
                return Err(config_error(format!(
                    "Stock provider has invalid image size '{}'",
                    stock.image_size
                )));
            }
        }

        Ok(())
    }
}
