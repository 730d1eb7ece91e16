use crate::config::{Config, DEFAULT_DATABASE_URL};
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const KEYS: [&str; 6] = [
    "APP_NAME",
    "CAPTURE_QUERY_LIMIT",
    "DATABASE_URL",
    "DATABASE_MAX_CONNECTIONS",
    "SEMAPHORE_RED_MAX",
    "SEMAPHORE_YELLOW_MAX",
];

fn clear_env() {
    for key in KEYS {
        unsafe { env::remove_var(key) };
    }
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    let config = Config::from_env().unwrap();

    assert_eq!(config.app_name, "Sales Funnel");
    assert_eq!(config.capture_query_limit, 5000);
    assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
    assert_eq!(config.database_max_connections, 5);
    assert!((config.thresholds.red() - 0.10).abs() < 1e-9);
    assert!((config.thresholds.yellow() - 0.25).abs() < 1e-9);
}

#[test]
fn test_config_from_overrides() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    unsafe {
        env::set_var("APP_NAME", "Funnel Norte");
        env::set_var("CAPTURE_QUERY_LIMIT", "250");
        env::set_var("DATABASE_URL", "sqlite::memory:");
        env::set_var("SEMAPHORE_RED_MAX", "0.2");
        env::set_var("SEMAPHORE_YELLOW_MAX", "0.5");
    }

    let config = Config::from_env().unwrap();

    assert_eq!(config.app_name, "Funnel Norte");
    assert_eq!(config.capture_query_limit, 250);
    assert_eq!(config.database_url, "sqlite::memory:");
    assert!((config.thresholds.red() - 0.2).abs() < 1e-9);
    assert!((config.thresholds.yellow() - 0.5).abs() < 1e-9);

    clear_env();
}

#[test]
fn test_yellow_below_red_is_raised() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    unsafe {
        env::set_var("SEMAPHORE_RED_MAX", "0.3");
        env::set_var("SEMAPHORE_YELLOW_MAX", "0.1");
    }

    let config = Config::from_env().unwrap();
    assert!((config.thresholds.red() - 0.3).abs() < 1e-9);
    assert!((config.thresholds.yellow() - 0.3).abs() < 1e-9);

    clear_env();
}

#[test]
fn test_invalid_numbers_are_rejected() {
    let _guard = get_env_lock().lock().unwrap();
    clear_env();

    unsafe { env::set_var("SEMAPHORE_RED_MAX", "ten percent") };
    let err = Config::from_env().unwrap_err();
    assert!(format!("{:#}", err).contains("SEMAPHORE_RED_MAX"));
    clear_env();

    unsafe { env::set_var("DATABASE_MAX_CONNECTIONS", "0") };
    assert!(Config::from_env().is_err());
    clear_env();

    unsafe { env::set_var("CAPTURE_QUERY_LIMIT", "-5") };
    assert!(Config::from_env().is_err());
    clear_env();
}
