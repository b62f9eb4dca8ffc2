use mailroom_core::checkout::CheckoutPolicy;
use mailroom_core::rate_limit::DEFAULT_STORE_CAPACITY;

use crate::auth::jwt::JwtConfig;
use crate::billing::stripe::StripeConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`). Also bounds outbound
    /// calls made while serving a request.
    pub request_timeout_secs: u64,
    /// Public origin of the web app, used for checkout redirect URLs.
    pub app_base_url: String,
    /// Session token validation.
    pub jwt: JwtConfig,
    /// Payment processor credentials and endpoint.
    pub stripe: StripeConfig,
    /// Quantity bounds and pricing for inbox purchases.
    pub checkout: CheckoutPolicy,
    /// Maximum number of `(ip, path)` keys the rate limiter tracks.
    pub rate_limit_capacity: usize,
    /// Enables `POST /dev/simulate-order` (default: `false`).
    pub allow_order_simulation: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                    |
    /// |-----------------------------|----------------------------|
    /// | `HOST`                      | `0.0.0.0`                  |
    /// | `PORT`                      | `3000`                     |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                       |
    /// | `APP_BASE_URL`              | `http://localhost:5173`    |
    /// | `CHECKOUT_MIN_QUANTITY`     | `1`                        |
    /// | `CHECKOUT_MAX_QUANTITY`     | `100`                      |
    /// | `CHECKOUT_UNIT_PRICE_CENTS` | `300`                      |
    /// | `CHECKOUT_CURRENCY`         | `usd`                      |
    /// | `RATE_LIMIT_CAPACITY`       | `10000`                    |
    /// | `ALLOW_ORDER_SIMULATION`    | `false`                    |
    ///
    /// JWT and payment processor variables are documented on
    /// [`JwtConfig::from_env`] and [`StripeConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = env_parse("PORT", "3000");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_parse("REQUEST_TIMEOUT_SECS", "30");

        let app_base_url =
            std::env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:5173".into());

        let defaults = CheckoutPolicy::default();
        let checkout = CheckoutPolicy {
            min_quantity: env_parse("CHECKOUT_MIN_QUANTITY", &defaults.min_quantity.to_string()),
            max_quantity: env_parse("CHECKOUT_MAX_QUANTITY", &defaults.max_quantity.to_string()),
            unit_price_cents: env_parse(
                "CHECKOUT_UNIT_PRICE_CENTS",
                &defaults.unit_price_cents.to_string(),
            ),
            currency: std::env::var("CHECKOUT_CURRENCY")
                .map(|c| c.to_lowercase())
                .unwrap_or(defaults.currency),
        };
        assert!(
            checkout.min_quantity >= 1 && checkout.min_quantity <= checkout.max_quantity,
            "CHECKOUT_MIN_QUANTITY must be >= 1 and <= CHECKOUT_MAX_QUANTITY"
        );

        let rate_limit_capacity: usize =
            env_parse("RATE_LIMIT_CAPACITY", &DEFAULT_STORE_CAPACITY.to_string());

        let allow_order_simulation: bool = env_parse("ALLOW_ORDER_SIMULATION", "false");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            app_base_url,
            jwt: JwtConfig::from_env(),
            stripe: StripeConfig::from_env(),
            checkout,
            rate_limit_capacity,
            allow_order_simulation,
        }
    }
}

/// Read and parse an env var, falling back to `default`.
///
/// # Panics
///
/// Panics if the value (or the default) does not parse.
fn env_parse<T>(key: &str, default: &str) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .unwrap_or_else(|e| panic!("{key} has invalid value '{raw}': {e}"))
}
