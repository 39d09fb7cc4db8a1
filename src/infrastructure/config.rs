use crate::infrastructure::error::CoreError;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

const SERVICES_JSON: &str = "services.json";

/// Resolved service endpoints for the gateway and program client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub workout_service_url: String,
    pub auth_service_url: String,
    /// Upper bound on a credential refresh call. Absent means no bound.
    pub refresh_timeout: Option<Duration>,
}

fn default_services() -> serde_json::Value {
    serde_json::json!({
        "schema": 1,
        "workoutServiceUrl": "http://localhost:3001",
        "authServiceUrl": "http://localhost:3000",
        "refreshTimeoutMs": null
    })
}

pub fn ensure_default_config(config_dir: &Path) -> Result<(), CoreError> {
    let path = config_dir.join(SERVICES_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&default_services())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

fn read_config(path: &Path) -> Result<serde_json::Value, CoreError> {
    let raw = fs::read_to_string(path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| CoreError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != 1 {
        return Err(CoreError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }
    Ok(parsed)
}

fn read_service_url(config: &serde_json::Value, key: &str, path: &Path) -> Result<String, CoreError> {
    let value = config
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            CoreError::InvalidConfig(format!("missing {key} in {}", path.display()))
        })?;

    Url::parse(value)
        .map_err(|error| CoreError::InvalidConfig(format!("invalid {key} '{value}': {error}")))?;
    Ok(value.trim_end_matches('/').to_string())
}

pub fn load_api_config(config_dir: &Path) -> Result<ApiConfig, CoreError> {
    let path = config_dir.join(SERVICES_JSON);
    let config = read_config(&path)?;

    let refresh_timeout = match config.get("refreshTimeoutMs") {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => {
            let millis = value.as_u64().filter(|millis| *millis > 0).ok_or_else(|| {
                CoreError::InvalidConfig(format!(
                    "refreshTimeoutMs must be a positive integer in {}",
                    path.display()
                ))
            })?;
            Some(Duration::from_millis(millis))
        }
    };

    Ok(ApiConfig {
        workout_service_url: read_service_url(&config, "workoutServiceUrl", &path)?,
        auth_service_url: read_service_url(&config, "authServiceUrl", &path)?,
        refresh_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_then_load_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        ensure_default_config(dir.path()).expect("ensure defaults");

        let config = load_api_config(dir.path()).expect("load config");
        assert_eq!(config.workout_service_url, "http://localhost:3001");
        assert_eq!(config.auth_service_url, "http://localhost:3000");
        assert_eq!(config.refresh_timeout, None);
    }

    #[test]
    fn ensure_does_not_overwrite_existing_config() {
        let dir = tempfile::tempdir().expect("temp dir");
        let custom = serde_json::json!({
            "schema": 1,
            "workoutServiceUrl": "https://api.example.com/",
            "authServiceUrl": "https://auth.example.com",
            "refreshTimeoutMs": 4500
        });
        fs::write(
            dir.path().join(SERVICES_JSON),
            serde_json::to_string_pretty(&custom).expect("serialize"),
        )
        .expect("write config");

        ensure_default_config(dir.path()).expect("ensure defaults");
        let config = load_api_config(dir.path()).expect("load config");
        assert_eq!(config.workout_service_url, "https://api.example.com");
        assert_eq!(config.refresh_timeout, Some(Duration::from_millis(4500)));
    }

    #[test]
    fn load_rejects_unknown_schema() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join(SERVICES_JSON),
            r#"{"schema": 2, "workoutServiceUrl": "http://localhost:3001", "authServiceUrl": "http://localhost:3000"}"#,
        )
        .expect("write config");

        assert!(matches!(
            load_api_config(dir.path()),
            Err(CoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn load_rejects_malformed_url_and_zero_timeout() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(
            dir.path().join(SERVICES_JSON),
            r#"{"schema": 1, "workoutServiceUrl": "not a url", "authServiceUrl": "http://localhost:3000"}"#,
        )
        .expect("write config");
        assert!(load_api_config(dir.path()).is_err());

        fs::write(
            dir.path().join(SERVICES_JSON),
            r#"{"schema": 1, "workoutServiceUrl": "http://localhost:3001", "authServiceUrl": "http://localhost:3000", "refreshTimeoutMs": 0}"#,
        )
        .expect("write config");
        assert!(load_api_config(dir.path()).is_err());
    }
}
