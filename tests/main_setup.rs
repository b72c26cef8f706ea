use serial_test::serial;
use std::{env, panic};
use tiptop_site::{
    AppConfig,
    config::{DEFAULT_API_BASE_URL, DEFAULT_APP_BASE_URL, Env},
};

const CONFIG_VARS: [&str; 7] = [
    "APP_ENV",
    "API_BASE_URL",
    "APP_BASE_URL",
    "SESSION_SECRET",
    "SESSION_TTL_HOURS",
    "CATALOG_CACHE_SECS",
    "BIND_ADDR",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` with every config variable cleared, then restores the previous values.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();

    unsafe {
        for var in CONFIG_VARS {
            env::remove_var(var);
        }
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast_without_session_secret() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("API_BASE_URL", "https://api.example.com");
            }
            AppConfig::load()
        })
    });

    assert!(
        result.is_err(),
        "Production config loading should panic without SESSION_SECRET"
    );
}

#[test]
#[serial]
fn test_app_config_local_env_defaults() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "local");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    assert_eq!(config.app_base_url, DEFAULT_APP_BASE_URL);
    assert_eq!(config.session_ttl_hours, 168);
    assert_eq!(config.catalog_cache_secs, 60);
    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert!(!config.session_secret.is_empty());
}

#[test]
#[serial]
fn test_app_config_production_reads_overrides_and_trims_base_urls() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("SESSION_SECRET", "prod-secret");
            env::set_var("API_BASE_URL", "https://api.tiptop.test/");
            env::set_var("APP_BASE_URL", "https://tiptop.test//");
            env::set_var("SESSION_TTL_HOURS", "12");
            env::set_var("CATALOG_CACHE_SECS", "0");
            env::set_var("BIND_ADDR", "127.0.0.1:8080");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert_eq!(config.session_secret, "prod-secret");
    assert_eq!(config.api_base_url, "https://api.tiptop.test");
    assert_eq!(config.app_base_url, "https://tiptop.test");
    assert_eq!(config.session_ttl_hours, 12);
    assert_eq!(config.catalog_cache_secs, 0);
    assert_eq!(config.bind_addr, "127.0.0.1:8080");
}

#[test]
#[serial]
fn test_app_config_unknown_env_falls_back_to_local() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "staging");
        }
        AppConfig::load()
    });
    assert_eq!(config.env, Env::Local);
}

#[test]
#[serial]
fn test_app_config_rejects_non_numeric_ttl() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("SESSION_TTL_HOURS", "a week");
            }
            AppConfig::load()
        })
    });
    assert!(result.is_err());
}

#[test]
fn test_app_config_default_is_local() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.catalog_cache_secs, 60);
}
