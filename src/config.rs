use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;

use crate::schedule::SchedulePolicy;
use crate::schedule::policy::{DEFAULT_END_TIME, DEFAULT_GRACE_MINUTES, DEFAULT_START_TIME};

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_public_per_min: u32,
    pub rate_protected_per_min: u32,

    /// Timezone check-ins are dated and classified in
    pub timezone: Tz,
    pub schedule_policy: SchedulePolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; missing optional keys take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required =
            |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let grace_minutes = parse_or(&lookup, "GRACE_PERIOD_MINUTES", DEFAULT_GRACE_MINUTES)?;
        let default_start =
            lookup("DEFAULT_START_TIME").unwrap_or_else(|| DEFAULT_START_TIME.to_string());
        let default_end =
            lookup("DEFAULT_END_TIME").unwrap_or_else(|| DEFAULT_END_TIME.to_string());
        let schedule_policy = SchedulePolicy::new(grace_minutes, &default_start, &default_end)
            .map_err(|e| anyhow!("invalid schedule defaults: {e}"))?;

        let timezone = match lookup("APP_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow!("APP_TIMEZONE {name:?} is not an IANA timezone: {e}"))?,
            None => Tz::UTC,
        };

        let rate_public_per_min = parse_or(&lookup, "RATE_PUBLIC_PER_MIN", 60)?;
        let rate_protected_per_min = parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?;
        if rate_public_per_min == 0 || rate_protected_per_min == 0 {
            return Err(anyhow!("rate limits must be at least 1 request per minute"));
        }

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            rate_public_per_min,
            rate_protected_per_min,
            timezone,
            schedule_policy,
        })
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value {raw:?}")),
        None => Ok(default),
    }
}
