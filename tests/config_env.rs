use serial_test::serial;
use talentpitch::config::{AppConfig, ConfigError, StorageBackend};

const VARS: &[&str] = &[
    "JWT_SECRET",
    "STORAGE_BACKEND",
    "DATABASE_URL",
    "PORT",
    "BIND_ADDR",
    "DB_MAX_CONNECTIONS",
    "FRONTEND_URL",
];

fn clear_env() {
    for v in VARS {
        std::env::remove_var(v);
    }
}

#[test]
#[serial]
fn test_from_env_reads_process_environment() {
    clear_env();
    std::env::set_var("JWT_SECRET", "test-secret-must-be-32-bytes-long!!");
    std::env::set_var("STORAGE_BACKEND", "memory");
    std::env::set_var("PORT", "9090");
    std::env::set_var("FRONTEND_URL", "https://talentpitch.example");

    let cfg = AppConfig::from_env().unwrap();
    assert_eq!(cfg.storage, StorageBackend::Memory);
    assert_eq!(cfg.port, 9090);
    assert_eq!(cfg.frontend_url.as_deref(), Some("https://talentpitch.example"));
    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_unknown_backend() {
    clear_env();
    std::env::set_var("JWT_SECRET", "test-secret-must-be-32-bytes-long!!");
    std::env::set_var("STORAGE_BACKEND", "mongo");

    let err = AppConfig::from_env().unwrap_err();
    assert_eq!(err, ConfigError::Invalid { name: "STORAGE_BACKEND", value: "mongo".into() });
    clear_env();
}
