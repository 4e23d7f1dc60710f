use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub api: ApiConfig,
    pub redis: RedisConfig,
    pub seating: SeatingConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

// Настройки внешнего API билетов
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Настройки Redis. Без URL используется хранилище в памяти
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: Option<String>,
    pub current_booking_ttl_seconds: u64,
}

// Правила выбора мест и цены
#[derive(Debug, Clone, Deserialize)]
pub struct SeatingConfig {
    pub refresh_interval_seconds: u64,
    pub max_seats: usize,
    pub notice_ttl_seconds: u64,
    /// Экран без обращений дольше этого закрывается фоновой очисткой
    pub session_idle_ttl_seconds: u64,
    /// Цена билета в минимальных единицах валюты (180.00 -> 18000)
    pub ticket_price_minor: i64,
    /// Сервисный сбор за место на шаге оплаты
    pub service_fee_minor: i64,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be set")]
    Missing { name: &'static str },
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Default for SeatingConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: 30,
            max_seats: 10,
            notice_ttl_seconds: 3,
            session_idle_ttl_seconds: 900,
            ticket_price_minor: 18_000,
            service_fee_minor: 150,
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout_seconds: 60,
        }
    }
}

impl SeatingConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_seconds)
    }

    pub fn session_idle_ttl(&self) -> Duration {
        Duration::from_secs(self.session_idle_ttl_seconds)
    }
}

// Читает переменную окружения, подставляя значение по умолчанию
fn var_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let seating_defaults = SeatingConfig::default();
        let breaker_defaults = CircuitBreakerConfig::default();

        let config = Config {
            app: AppConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: var_or("PORT", 8000)?,
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                rust_log: env::var("RUST_LOG")
                    .unwrap_or_else(|_| "cinema_seats=debug,tower_http=debug".to_string()),
            },
            api: ApiConfig {
                base_url: env::var("BACKEND_URL")
                    .map_err(|_| ConfigError::Missing { name: "BACKEND_URL" })?
                    .trim_end_matches('/')
                    .to_string(),
                timeout_seconds: var_or("BACKEND_TIMEOUT_SECONDS", 10)?,
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
                current_booking_ttl_seconds: var_or("CURRENT_BOOKING_TTL_SECONDS", 3600)?,
            },
            seating: SeatingConfig {
                refresh_interval_seconds: var_or(
                    "SEAT_REFRESH_INTERVAL_SECONDS",
                    seating_defaults.refresh_interval_seconds,
                )?,
                max_seats: var_or("MAX_SEATS_PER_BOOKING", seating_defaults.max_seats)?,
                notice_ttl_seconds: var_or("NOTICE_TTL_SECONDS", seating_defaults.notice_ttl_seconds)?,
                session_idle_ttl_seconds: var_or(
                    "SESSION_IDLE_TTL_SECONDS",
                    seating_defaults.session_idle_ttl_seconds,
                )?,
                ticket_price_minor: var_or("TICKET_PRICE_MINOR", seating_defaults.ticket_price_minor)?,
                service_fee_minor: var_or("SERVICE_FEE_MINOR", seating_defaults.service_fee_minor)?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: var_or(
                    "CIRCUIT_BREAKER_FAILURE_THRESHOLD",
                    breaker_defaults.failure_threshold,
                )?,
                timeout_seconds: var_or(
                    "CIRCUIT_BREAKER_TIMEOUT_SECONDS",
                    breaker_defaults.timeout_seconds,
                )?,
            },
        };

        if config.seating.refresh_interval_seconds == 0 {
            return Err(ConfigError::Invalid {
                name: "SEAT_REFRESH_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }
        if config.seating.max_seats == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_SEATS_PER_BOOKING",
                value: "0".to_string(),
            });
        }

        Ok(config)
    }
}
