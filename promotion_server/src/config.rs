use std::{env, net::IpAddr, time::Duration};

use log::*;
use lpg_common::{helpers::parse_boolean_flag, Secret};
use payos_tools::PayosConfig;

const DEFAULT_LPG_HOST: &str = "127.0.0.1";
const DEFAULT_LPG_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/promotions.db";
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// How often active promotions are checked for expiry.
    pub sweep_interval: Duration,
    /// If supplied, requests against the webhook endpoint must come from one of these addresses.
    pub payos_whitelist: Option<Vec<IpAddr>>,
    /// Shared secret for the internal activation endpoint.
    pub internal_hmac_secret: Secret<String>,
    pub internal_hmac_checks: bool,
    pub payos: PayosConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPG_HOST.to_string(),
            port: DEFAULT_LPG_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            payos_whitelist: None,
            internal_hmac_secret: Secret::default(),
            internal_hmac_checks: true,
            payos: PayosConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let host = env::var("LPG_HOST").ok().unwrap_or_else(|| DEFAULT_LPG_HOST.into());
        let port = env::var("LPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for LPG_PORT. {e} Using the default, {DEFAULT_LPG_PORT}, instead."
                    );
                    DEFAULT_LPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_LPG_PORT);
        let database_url = env::var("LPG_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ LPG_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("LPG_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("LPG_USE_FORWARDED").ok(), false);
        let sweep_interval = configure_sweep_interval();
        let payos_whitelist = configure_whitelist(env::var("LPG_PAYOS_IP_WHITELIST").ok());
        let internal_hmac_secret = Secret::new(env::var("LPG_INTERNAL_HMAC_SECRET").ok().unwrap_or_else(|| {
            warn!(
                "🪛️ LPG_INTERNAL_HMAC_SECRET is not set. Internal activation requests cannot be authenticated until \
                 it is."
            );
            String::default()
        }));
        let internal_hmac_checks = parse_boolean_flag(env::var("LPG_INTERNAL_HMAC_CHECKS").ok(), true);
        if !internal_hmac_checks {
            warn!("🚨️ HMAC checks on the internal activation endpoint are DISABLED.");
        }
        let payos = PayosConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            use_x_forwarded_for,
            use_forwarded,
            sweep_interval,
            payos_whitelist,
            internal_hmac_secret,
            internal_hmac_checks,
            payos,
        }
    }
}

fn configure_sweep_interval() -> Duration {
    env::var("LPG_SWEEP_INTERVAL")
        .map_err(|_| {
            info!(
                "🪛️ LPG_SWEEP_INTERVAL is not set. Using the default value of {} s.",
                DEFAULT_SWEEP_INTERVAL.as_secs()
            )
        })
        .and_then(|s| {
            s.parse::<u64>().map_err(|e| warn!("🪛️ Invalid configuration value for LPG_SWEEP_INTERVAL. {e}"))
        })
        .ok()
        .filter(|&secs| secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_SWEEP_INTERVAL)
}

/// Parses a comma-separated list of IP addresses. `none`, `false` and `0` (or no value) disable the whitelist.
pub fn configure_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
            return None;
        }
        let ip_addrs = s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .filter_map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in LPG_PAYOS_IP_WHITELIST: {e}"))
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The PayOS IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 webhook calls."
            );
        },
        None => {
            info!("🪛️ No PayOS IP whitelist is set. Webhook calls are accepted from any address.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ PayOS IP whitelist: {addrs}");
        },
    }
    whitelist
}
