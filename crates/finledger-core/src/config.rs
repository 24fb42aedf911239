use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::notify::Permission;

/// Largest delay a single platform timer may be armed for: a signed 32-bit
/// millisecond count (~24.8 days).
pub const MAX_TIMER_DELAY_MS: u64 = 2_147_483_647;
pub const DEFAULT_NOTIFICATION_TITLE: &str = "⏰ Reminder";
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 256;
pub const DEFAULT_CURRENCY_CODE: &str = "NGN";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₦";

/// Top-level config (finledger.toml + FINLEDGER_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinledgerConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite file holding the expenses / income / reminders collections.
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Upper bound for one timer segment. Values above [`MAX_TIMER_DELAY_MS`]
    /// and zero are clamped by [`SchedulerConfig::effective_max_delay_ms`].
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl SchedulerConfig {
    pub fn effective_max_delay_ms(&self) -> u64 {
        self.max_delay_ms.clamp(1, MAX_TIMER_DELAY_MS)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_delay_ms: MAX_TIMER_DELAY_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Title used for every reminder notification.
    #[serde(default = "default_title")]
    pub title: String,
    /// Initial native-notification permission. Anything but `granted`
    /// delivers reminders as blocking alerts.
    #[serde(default)]
    pub permission: Permission,
    /// Queue depth between the scheduler and the native delivery task.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            permission: Permission::default(),
            capacity: DEFAULT_NOTIFICATION_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyConfig {
    #[serde(default = "default_currency_code")]
    pub code: String,
    #[serde(default = "default_currency_symbol")]
    pub symbol: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            code: default_currency_code(),
            symbol: default_currency_symbol(),
        }
    }
}

fn default_max_delay_ms() -> u64 {
    MAX_TIMER_DELAY_MS
}
fn default_title() -> String {
    DEFAULT_NOTIFICATION_TITLE.to_string()
}
fn default_capacity() -> usize {
    DEFAULT_NOTIFICATION_CAPACITY
}
fn default_currency_code() -> String {
    DEFAULT_CURRENCY_CODE.to_string()
}
fn default_currency_symbol() -> String {
    DEFAULT_CURRENCY_SYMBOL.to_string()
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.finledger/finledger.db", home)
}

impl FinledgerConfig {
    /// Load config from a TOML file with FINLEDGER_* env var overrides.
    ///
    /// Nested keys use a double underscore:
    /// `FINLEDGER_SCHEDULER__MAX_DELAY_MS=60000`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        Self::figment(&path)
            .extract()
            .map_err(|e| crate::error::FinledgerError::Config(e.to_string()))
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(FinledgerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("FINLEDGER_").split("__"))
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.finledger/finledger.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_platform_timer_cap() {
        let cfg = FinledgerConfig::default();
        assert_eq!(cfg.scheduler.max_delay_ms, 2_147_483_647);
        assert_eq!(cfg.notifications.title, "⏰ Reminder");
        assert_eq!(cfg.notifications.permission, Permission::Default);
        assert_eq!(cfg.currency.code, "NGN");
        assert!(cfg.storage.path.ends_with(".finledger/finledger.db"));
    }

    #[test]
    fn max_delay_is_clamped() {
        let too_big = SchedulerConfig {
            max_delay_ms: u64::MAX,
        };
        assert_eq!(too_big.effective_max_delay_ms(), MAX_TIMER_DELAY_MS);

        let zero = SchedulerConfig { max_delay_ms: 0 };
        assert_eq!(zero.effective_max_delay_ms(), 1);

        let small = SchedulerConfig { max_delay_ms: 500 };
        assert_eq!(small.effective_max_delay_ms(), 500);
    }

    #[test]
    fn toml_and_env_are_merged() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "finledger.toml",
                r#"
                [notifications]
                permission = "granted"

                [currency]
                code = "USD"
                symbol = "$"
                "#,
            )?;
            jail.set_env("FINLEDGER_SCHEDULER__MAX_DELAY_MS", "60000");

            let cfg = FinledgerConfig::load(Some("finledger.toml"))
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert_eq!(cfg.notifications.permission, Permission::Granted);
            assert_eq!(cfg.currency.symbol, "$");
            assert_eq!(cfg.scheduler.max_delay_ms, 60_000);
            // untouched sections keep their defaults
            assert_eq!(cfg.notifications.title, "⏰ Reminder");
            Ok(())
        });
    }

    #[test]
    fn missing_file_yields_defaults() {
        figment::Jail::expect_with(|_jail| {
            let cfg = FinledgerConfig::load(Some("does-not-exist.toml"))
                .map_err(|e| figment::Error::from(e.to_string()))?;
            assert_eq!(cfg.currency.code, "NGN");
            Ok(())
        });
    }
}
