use anyhow::{anyhow, Result};
use redmine_api::ClientConfig;
use redmine_config::{Config, Profile};

/// Values given on the command line that take precedence over the profile.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub profile: Option<String>,
    pub url: Option<String>,
    pub api_key: Option<String>,
}

/// Builds the client configuration from the profile file and overrides.
///
/// API key lookup order: `--api-key`, `REDMINE_API_KEY_<PROFILE>`,
/// `REDMINE_API_KEY`, then the profile's `api_key`.
pub fn resolve_client_config(
    config: &Config,
    overrides: &Overrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientConfig> {
    let resolved = config.resolve_profile(overrides.profile.as_deref());
    if let (Some(requested), None) = (overrides.profile.as_deref(), resolved) {
        return Err(anyhow!("Profile '{requested}' not found in config file."));
    }

    let (name, profile) = match resolved {
        Some((name, profile)) => (Some(name), profile.clone()),
        None => (None, Profile::default()),
    };

    let base_url = overrides
        .url
        .clone()
        .or_else(|| profile.base_url.clone())
        .ok_or_else(|| {
            anyhow!(
                "No Redmine URL configured. Pass --url or add a profile to {}",
                Config::default_path().display()
            )
        })?;

    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let api_key = non_empty(overrides.api_key.clone())
        .or_else(|| {
            let scoped = format!("REDMINE_API_KEY_{}", name?.to_uppercase());
            non_empty(env(&scoped))
        })
        .or_else(|| non_empty(env("REDMINE_API_KEY")))
        .or_else(|| non_empty(profile.api_key.clone()));

    Ok(ClientConfig::new(base_url, api_key)
        .with_port(profile.port)
        .with_check_ssl_certificate(profile.check_ssl_certificate)
        .with_check_ssl_host(profile.check_ssl_host)
        .with_use_http_auth(profile.use_http_auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config() -> Config {
        let mut config = Config {
            default_profile: Some("work".to_string()),
            ..Default::default()
        };
        config.profiles.insert(
            "work".to_string(),
            Profile {
                base_url: Some("https://redmine.example.com".to_string()),
                api_key: Some("file-key".to_string()),
                port: Some(8443),
                check_ssl_certificate: true,
                check_ssl_host: true,
                use_http_auth: false,
            },
        );
        config
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_profile_settings_are_carried_over() {
        let resolved = resolve_client_config(&config(), &Overrides::default(), env(&[])).unwrap();
        assert_eq!(resolved.url, "https://redmine.example.com");
        assert_eq!(resolved.api_key.as_deref(), Some("file-key"));
        assert_eq!(resolved.port, Some(8443));
        assert!(resolved.check_ssl_certificate);
        assert!(resolved.check_ssl_host);
        assert!(!resolved.use_http_auth);
    }

    #[test]
    fn test_api_key_precedence() {
        let overrides = Overrides::default();
        let vars = [("REDMINE_API_KEY", "generic"), ("REDMINE_API_KEY_WORK", "scoped")];
        let resolved = resolve_client_config(&config(), &overrides, env(&vars)).unwrap();
        assert_eq!(resolved.api_key.as_deref(), Some("scoped"));

        let resolved =
            resolve_client_config(&config(), &overrides, env(&[("REDMINE_API_KEY", "generic")]))
                .unwrap();
        assert_eq!(resolved.api_key.as_deref(), Some("generic"));

        let overrides = Overrides {
            api_key: Some("flag".to_string()),
            ..Default::default()
        };
        let resolved = resolve_client_config(&config(), &overrides, env(&vars)).unwrap();
        assert_eq!(resolved.api_key.as_deref(), Some("flag"));
    }

    #[test]
    fn test_url_override_without_profiles() {
        let overrides = Overrides {
            url: Some("http://localhost:3000".to_string()),
            ..Default::default()
        };
        let resolved = resolve_client_config(&Config::default(), &overrides, env(&[])).unwrap();
        assert_eq!(resolved.url, "http://localhost:3000");
        assert!(resolved.api_key.is_none());
        assert!(resolved.use_http_auth);
    }

    #[test]
    fn test_missing_url_is_an_error() {
        let err = resolve_client_config(&Config::default(), &Overrides::default(), env(&[]))
            .unwrap_err();
        assert!(err.to_string().contains("No Redmine URL configured"));
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let overrides = Overrides {
            profile: Some("missing".to_string()),
            ..Default::default()
        };
        let err = resolve_client_config(&config(), &overrides, env(&[])).unwrap_err();
        assert!(err.to_string().contains("Profile 'missing' not found"));
    }
}
