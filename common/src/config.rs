//! Runtime configuration.
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding the gcloud program.
pub const GCLOUD_ENV: &str = "GCP_SSH_KEYS_GCLOUD";
/// Environment variable gcloud itself reads for its default project.
pub const PROJECT_ENV: &str = "CLOUDSDK_CORE_PROJECT";
/// Program used when no override is set.
pub const DEFAULT_GCLOUD: &str = "gcloud";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The gcloud program, either a path or a name looked up in `PATH`.
    pub gcloud: PathBuf,
    /// Project to operate on. `None` leaves the choice to gcloud.
    pub project: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gcloud: PathBuf::from(DEFAULT_GCLOUD),
            project: None,
        }
    }
}

impl Config {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Self::from_vars(|name| env::var_os(name)))
    }

    /// Load the configuration from an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<OsString>) -> Self {
        let mut config = Self::default();

        if let Some(gcloud) = var(GCLOUD_ENV).filter(|v| !v.is_empty()) {
            config.gcloud = PathBuf::from(gcloud);
        }
        config.project = var(PROJECT_ENV)
            .and_then(|v| v.into_string().ok())
            .filter(|v| !v.is_empty());

        config
    }

    /// Override the project, eg. from the command line.
    pub fn with_project(mut self, project: Option<String>) -> Self {
        if project.is_some() {
            self.project = project;
        }
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(|_| None);

        assert_eq!(config.gcloud, PathBuf::from("gcloud"));
        assert_eq!(config.project, None);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_vars(|name| match name {
            GCLOUD_ENV => Some("/opt/sdk/bin/gcloud".into()),
            PROJECT_ENV => Some("acme-prod".into()),
            _ => None,
        });

        assert_eq!(config.gcloud, PathBuf::from("/opt/sdk/bin/gcloud"));
        assert_eq!(config.project.as_deref(), Some("acme-prod"));
    }

    #[test]
    fn test_empty_vars_are_ignored() {
        let config = Config::from_vars(|_| Some(OsString::new()));

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_with_project() {
        let config = Config::from_vars(|name| match name {
            PROJECT_ENV => Some("acme-prod".into()),
            _ => None,
        });

        assert_eq!(
            config.clone().with_project(Some("acme-dev".to_owned())).project.as_deref(),
            Some("acme-dev")
        );
        assert_eq!(config.with_project(None).project.as_deref(), Some("acme-prod"));
    }
}
