//! Shared domain model and configuration for tiercart.
//!
//! - [`cart`]: the cart snapshot returned by the commerce backend.
//! - [`tier`]: the volume → tier policy.
//! - [`catalog`]: the validated Variant Resolution Table.
//! - [`config`]: environment-driven application configuration.

pub mod app_config;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod tier;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use cart::{
    Cart, CartCost, CartLine, Merchandise, Money, PriceAdjustment, ProductRef, PurchaseType,
    SellingPlanAllocation,
};
pub use catalog::{
    load_catalog, parse_catalog, CatalogFile, FamilyConfig, ProductConfig, VariantEntry,
    VariantTable, VariantTarget,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use tier::{Tier, TierPolicy, TierThreshold};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[source] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
