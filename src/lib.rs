//! Umrah Entitlements - subscription limits for package marketplace companies
//!
//! Decides, per company tenant, whether an action is allowed given its
//! subscription status, plan quotas and live usage. Lapsed subscriptions and
//! trials are moved to `expired` the first time they are checked.
//!
//! # Features
//!
//! - **Enforcement**: allow/deny decisions with human-readable reasons
//! - **Status**: plan, usage and proactive warnings for dashboards
//! - **Advice**: upgrade suggestions naming the cheapest covering plan
//! - **Storage**: trait-based stores, with a SeaORM implementation (`seaorm`)
//! - **HTTP**: axum response conversions (`http`, on by default)
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use umrah_entitlements::{ConfigBuilder, init_tracing_with_config};
//! use umrah_entitlements::subscription::{Action, Plans, SubscriptionEnforcer};
//!
//! let config = ConfigBuilder::new().from_env().build()?;
//! init_tracing_with_config(&config);
//!
//! let enforcer = SubscriptionEnforcer::new(tenants, usage, Plans::standard())
//!     .with_config(config.enforcement);
//!
//! let decision = enforcer.check_action_allowed(&company_id, Action::CreateBooking).await;
//! ```

#![allow(async_fn_in_trait)] // audit loggers are used through generics only

mod config;
mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod subscription;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
mod utils;

// Re-exports for public API
pub use config::{Config, ConfigBuilder, EnforcementConfig, LoggingConfig};
pub use error::{EntitlementError, Result};
pub use subscription::{Action, Decision, Plans, SubscriptionEnforcer};

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "umrah::entitlements=debug")
/// - `UMRAH_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = utils::get_env_with_prefix("LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    install_subscriber(env_filter, json_logs);
}

/// Initialize tracing from a loaded configuration
pub fn init_tracing_with_config(config: &Config) {
    install_subscriber(EnvFilter::new(&config.logging.level), config.logging.json);
}

fn install_subscriber(env_filter: EnvFilter, json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter);

    // try_init so a second call (common in tests) is a no-op
    let result = if json {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
