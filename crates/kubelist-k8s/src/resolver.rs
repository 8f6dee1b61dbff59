//! Works out how to reach the API server
//!
//! Precedence: in-cluster configuration, then an explicit kubeconfig path,
//! then `$KUBECONFIG` (merged in order), then `$HOME/.kube/config`.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use kube::Config;
use kube::config::{KubeConfigOptions, Kubeconfig};

use crate::error::ConfigError;
use crate::logging::{Field, LogPort};
use kubelist_types::ClientConfig;

const IN_CLUSTER_CONTEXT: &str = "in-cluster";

/// In-cluster configuration as seen at startup
#[derive(Clone, Debug, Default)]
pub enum InClusterConfig {
    /// Not running inside a cluster
    #[default]
    Absent,

    /// Running inside a cluster, but the service account config could not be
    /// loaded
    Unavailable(String),

    Available(Config),
}

impl InClusterConfig {
    /// Load the service account config when `KUBERNETES_SERVICE_HOST` is set
    pub fn from_process() -> Self {
        if !env::var_os("KUBERNETES_SERVICE_HOST").is_some_and(|v| !v.is_empty()) {
            return Self::Absent;
        }
        match Config::incluster() {
            Ok(config) => Self::Available(config),
            Err(e) => Self::Unavailable(e.to_string()),
        }
    }
}

/// Snapshot of the process environment relevant to discovery
#[derive(Clone, Debug, Default)]
pub struct DiscoveryEnv {
    /// Raw `KUBECONFIG` value (may hold several paths)
    pub kubeconfig: Option<OsString>,

    /// User home directory
    pub home: Option<PathBuf>,

    pub in_cluster: InClusterConfig,
}

impl DiscoveryEnv {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            kubeconfig: env::var_os("KUBECONFIG").filter(|v| !v.is_empty()),
            home: home_dir(env::var_os("HOME"), env::var_os("USERPROFILE")),
            in_cluster: InClusterConfig::from_process(),
        }
    }
}

/// `HOME`, else `USERPROFILE` (Windows usually leaves `HOME` unset)
fn home_dir(home: Option<OsString>, user_profile: Option<OsString>) -> Option<PathBuf> {
    home.filter(|v| !v.is_empty())
        .or_else(|| user_profile.filter(|v| !v.is_empty()))
        .map(PathBuf::from)
}

/// Where the resolved configuration came from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    InCluster,

    /// Path given explicitly by the caller
    Explicit(PathBuf),

    /// Paths found through `$KUBECONFIG` or the home directory
    Discovered(Vec<PathBuf>),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InCluster => f.write_str(IN_CLUSTER_CONTEXT),
            Self::Explicit(path) => write!(f, "{}", path.display()),
            Self::Discovered(paths) => {
                let joined = paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                f.write_str(&joined)
            }
        }
    }
}

/// Everything needed to open a session
#[derive(Clone, Debug)]
pub struct ConnectionParameters {
    pub config: Config,
    pub context: String,
    pub cluster: String,
    pub source: ConfigSource,
}

impl ConnectionParameters {
    pub fn new(
        config: Config,
        context: impl Into<String>,
        cluster: impl Into<String>,
        source: ConfigSource,
    ) -> Self {
        Self {
            config,
            context: context.into(),
            cluster: cluster.into(),
            source,
        }
    }

    /// API server URL
    pub fn host(&self) -> String {
        self.config.cluster_url.to_string()
    }
}

/// Kubeconfig location to use when not running in-cluster
pub fn kubeconfig_source(config: &ClientConfig, env: &DiscoveryEnv) -> ConfigSource {
    if let Some(path) = &config.kubeconfig {
        return ConfigSource::Explicit(path.clone());
    }

    if let Some(raw) = &env.kubeconfig {
        let paths: Vec<PathBuf> = env::split_paths(raw)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !paths.is_empty() {
            return ConfigSource::Discovered(paths);
        }
    }

    match &env.home {
        Some(home) => ConfigSource::Discovered(vec![home.join(".kube").join("config")]),
        None => ConfigSource::Discovered(vec![PathBuf::from("./kubeconfig")]),
    }
}

/// Resolve connection parameters for the given client configuration
pub async fn resolve(
    config: &ClientConfig,
    env: &DiscoveryEnv,
    log: &dyn LogPort,
) -> Result<ConnectionParameters, ConfigError> {
    log.debug("Loading Kubernetes configuration", &[]);

    match &env.in_cluster {
        InClusterConfig::Available(in_cluster) => {
            let cluster = in_cluster.cluster_url.host().unwrap_or_default().to_string();
            log.info(
                "Using in-cluster Kubernetes configuration",
                &[
                    Field::new("context", IN_CLUSTER_CONTEXT),
                    Field::new("cluster", &cluster),
                ],
            );
            return Ok(ConnectionParameters::new(
                in_cluster.clone(),
                IN_CLUSTER_CONTEXT,
                cluster,
                ConfigSource::InCluster,
            ));
        }
        InClusterConfig::Unavailable(reason) => log.warn(
            "In-cluster configuration unavailable, falling back to kubeconfig",
            &[Field::new("error", reason)],
        ),
        InClusterConfig::Absent => {}
    }

    let source = kubeconfig_source(config, env);
    let path = source.to_string();
    log.debug("Loading kubeconfig from file", &[Field::new("path", &path)]);

    let kubeconfig = load_kubeconfig(&source)?;

    let context = match &config.context {
        Some(context) => {
            log.debug("Using specified context", &[Field::new("context", context)]);
            context.clone()
        }
        None => kubeconfig
            .current_context
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ConfigError::NoContext { path: path.clone() })?,
    };

    let cluster = kubeconfig
        .contexts
        .iter()
        .find(|c| c.name == context)
        .ok_or_else(|| ConfigError::UnknownContext {
            context: context.clone(),
            path: path.clone(),
        })?
        .context
        .as_ref()
        .map(|c| c.cluster.clone())
        .unwrap_or_default();

    let options = KubeConfigOptions {
        context: Some(context.clone()),
        ..Default::default()
    };
    let resolved = Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|source| ConfigError::Invalid {
            path: path.clone(),
            source,
        })?;

    log.info(
        "Loaded Kubernetes configuration",
        &[
            Field::new("context", &context),
            Field::new("cluster", &cluster),
            Field::new("source", &path),
        ],
    );

    Ok(ConnectionParameters::new(resolved, context, cluster, source))
}

fn load_kubeconfig(source: &ConfigSource) -> Result<Kubeconfig, ConfigError> {
    match source {
        ConfigSource::Explicit(path) => read_file(path),
        ConfigSource::Discovered(paths) => {
            // Missing entries are skipped, as kubectl does
            let existing: Vec<&PathBuf> = paths.iter().filter(|p| p.exists()).collect();
            let Some((first, rest)) = existing.split_first() else {
                return Err(ConfigError::Missing {
                    path: source.to_string(),
                });
            };

            let mut merged = read_file(first)?;
            for path in rest {
                let next = read_file(path)?;
                merged = merged
                    .merge(next)
                    .map_err(|source| ConfigError::Unreadable {
                        path: path.display().to_string(),
                        source,
                    })?;
            }
            Ok(merged)
        }
        ConfigSource::InCluster => Err(ConfigError::Missing {
            path: IN_CLUSTER_CONTEXT.to_string(),
        }),
    }
}

fn read_file(path: &Path) -> Result<Kubeconfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::Missing {
            path: path.display().to_string(),
        });
    }
    Kubeconfig::read_from(path).map_err(|source| ConfigError::Unreadable {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{Level, MemoryLog};
    use std::fs;
    use tempfile::TempDir;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: dev-cluster
  cluster:
    server: https://127.0.0.1:6443
- name: prod-cluster
  cluster:
    server: https://10.0.0.1:6443
contexts:
- name: dev
  context:
    cluster: dev-cluster
    user: dev-user
- name: prod
  context:
    cluster: prod-cluster
    user: dev-user
current-context: dev
users:
- name: dev-user
  user:
    token: abc123
"#;

    const EXTRA_KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
- name: staging-cluster
  cluster:
    server: https://10.0.0.2:6443
contexts:
- name: staging
  context:
    cluster: staging-cluster
    user: staging-user
current-context: staging
users:
- name: staging-user
  user:
    token: def456
"#;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn no_env() -> DiscoveryEnv {
        DiscoveryEnv::default()
    }

    #[test]
    fn test_source_explicit_path_wins() {
        let env = DiscoveryEnv {
            kubeconfig: Some("/custom/kubeconfig".into()),
            home: Some("/home/user".into()),
            in_cluster: InClusterConfig::Absent,
        };
        let config = ClientConfig::new(Some("/explicit/config".into()), None);
        assert_eq!(
            kubeconfig_source(&config, &env),
            ConfigSource::Explicit("/explicit/config".into())
        );
    }

    #[test]
    fn test_source_env_then_home_then_cwd() {
        let config = ClientConfig::default();

        let env = DiscoveryEnv {
            kubeconfig: Some("/custom/kubeconfig".into()),
            home: Some("/home/user".into()),
            in_cluster: InClusterConfig::Absent,
        };
        assert_eq!(
            kubeconfig_source(&config, &env),
            ConfigSource::Discovered(vec!["/custom/kubeconfig".into()])
        );

        let env = DiscoveryEnv {
            home: Some("/home/user".into()),
            ..no_env()
        };
        assert_eq!(
            kubeconfig_source(&config, &env),
            ConfigSource::Discovered(vec!["/home/user/.kube/config".into()])
        );

        assert_eq!(
            kubeconfig_source(&config, &no_env()),
            ConfigSource::Discovered(vec!["./kubeconfig".into()])
        );
    }

    #[test]
    fn test_home_dir_falls_back_to_user_profile() {
        assert_eq!(
            home_dir(Some("/home/ops".into()), Some(r"C:\Users\ops".into())),
            Some(PathBuf::from("/home/ops"))
        );
        assert_eq!(
            home_dir(Some(OsString::new()), Some(r"C:\Users\ops".into())),
            Some(PathBuf::from(r"C:\Users\ops"))
        );
        assert_eq!(home_dir(None, None), None);
    }

    #[test]
    fn test_source_env_holds_several_paths() {
        let joined = env::join_paths(["/a/config", "/b/config"]).unwrap();
        let env = DiscoveryEnv {
            kubeconfig: Some(joined),
            ..no_env()
        };
        assert_eq!(
            kubeconfig_source(&ClientConfig::default(), &env),
            ConfigSource::Discovered(vec!["/a/config".into(), "/b/config".into()])
        );
    }

    #[tokio::test]
    async fn test_resolve_current_context() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config", KUBECONFIG);
        let log = MemoryLog::new();

        let config = ClientConfig::new(Some(path.clone()), None);
        let params = resolve(&config, &no_env(), &log).await.unwrap();

        assert_eq!(params.context, "dev");
        assert_eq!(params.cluster, "dev-cluster");
        assert_eq!(params.source, ConfigSource::Explicit(path));
        assert!(params.host().starts_with("https://127.0.0.1:6443"));

        let loaded = log.find("Loaded Kubernetes configuration").unwrap();
        assert_eq!(loaded.level, Level::Info);
        assert_eq!(loaded.field("context"), Some("dev"));
        assert_eq!(loaded.field("cluster"), Some("dev-cluster"));
    }

    #[tokio::test]
    async fn test_resolve_context_override() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config", KUBECONFIG);

        let config = ClientConfig::new(Some(path), Some("prod".to_string()));
        let params = resolve(&config, &no_env(), &MemoryLog::new()).await.unwrap();

        assert_eq!(params.context, "prod");
        assert_eq!(params.cluster, "prod-cluster");
        assert!(params.host().starts_with("https://10.0.0.1:6443"));
    }

    #[tokio::test]
    async fn test_resolve_unknown_context() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config", KUBECONFIG);

        let config = ClientConfig::new(Some(path.clone()), Some("nope".to_string()));
        let err = resolve(&config, &no_env(), &MemoryLog::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::UnknownContext { ref context, .. } if context == "nope"));
        assert_eq!(err.path(), path.display().to_string());
    }

    #[tokio::test]
    async fn test_resolve_explicit_missing_file_has_no_fallback() {
        let dir = TempDir::new().unwrap();
        let valid = write(&dir, "config", KUBECONFIG);
        let env = DiscoveryEnv {
            kubeconfig: Some(valid.into_os_string()),
            ..no_env()
        };

        let config = ClientConfig::new(Some("/nonexistent/path/config".into()), None);
        let err = resolve(&config, &env, &MemoryLog::new()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "kubeconfig file not found at /nonexistent/path/config"
        );
    }

    #[tokio::test]
    async fn test_resolve_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config", "invalid yaml content");

        let config = ClientConfig::new(Some(path), None);
        let err = resolve(&config, &no_env(), &MemoryLog::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[tokio::test]
    async fn test_resolve_merges_kubeconfig_env() {
        let dir = TempDir::new().unwrap();
        let first = write(&dir, "first", KUBECONFIG);
        let second = write(&dir, "second", EXTRA_KUBECONFIG);
        let missing = dir.path().join("missing");
        let env = DiscoveryEnv {
            kubeconfig: Some(env::join_paths([&missing, &first, &second]).unwrap()),
            home: Some(dir.path().to_path_buf()),
            in_cluster: InClusterConfig::Absent,
        };

        // current-context comes from the first file that sets it
        let params = resolve(&ClientConfig::default(), &env, &MemoryLog::new())
            .await
            .unwrap();
        assert_eq!(params.context, "dev");

        // contexts from later files are still reachable
        let config = ClientConfig::new(None, Some("staging".to_string()));
        let params = resolve(&config, &env, &MemoryLog::new()).await.unwrap();
        assert_eq!(params.cluster, "staging-cluster");
    }

    #[tokio::test]
    async fn test_resolve_discovery_with_nothing_on_disk() {
        let dir = TempDir::new().unwrap();
        let env = DiscoveryEnv {
            home: Some(dir.path().to_path_buf()),
            ..no_env()
        };

        let err = resolve(&ClientConfig::default(), &env, &MemoryLog::new())
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::Missing { .. }));
        assert!(err.path().ends_with(".kube/config"));
    }
    fn in_cluster_config() -> Config {
        Config::new("https://10.96.0.1:443".parse().unwrap())
    }

    #[tokio::test]
    async fn test_resolve_in_cluster_takes_priority() {
        let dir = TempDir::new().unwrap();
        let explicit = write(&dir, "explicit", KUBECONFIG);
        let from_env = write(&dir, "from-env", EXTRA_KUBECONFIG);
        let env = DiscoveryEnv {
            kubeconfig: Some(from_env.into_os_string()),
            home: Some(dir.path().to_path_buf()),
            in_cluster: InClusterConfig::Available(in_cluster_config()),
        };
        let log = MemoryLog::new();

        let config = ClientConfig::new(Some(explicit), Some("prod".to_string()));
        let params = resolve(&config, &env, &log).await.unwrap();

        assert_eq!(params.source, ConfigSource::InCluster);
        assert_eq!(params.context, "in-cluster");
        assert_eq!(params.cluster, "10.96.0.1");
        assert!(params.host().starts_with("https://10.96.0.1"));

        let used = log.find("Using in-cluster").unwrap();
        assert_eq!(used.level, Level::Info);
        assert_eq!(used.field("context"), Some("in-cluster"));
        assert_eq!(used.field("cluster"), Some("10.96.0.1"));
        assert!(log.find("Loaded Kubernetes configuration").is_none());
    }

    #[tokio::test]
    async fn test_resolve_unavailable_in_cluster_falls_back_to_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config", KUBECONFIG);
        let env = DiscoveryEnv {
            in_cluster: InClusterConfig::Unavailable("service account token missing".to_string()),
            ..no_env()
        };
        let log = MemoryLog::new();

        let config = ClientConfig::new(Some(path.clone()), None);
        let params = resolve(&config, &env, &log).await.unwrap();

        assert_eq!(params.source, ConfigSource::Explicit(path));
        assert_eq!(params.context, "dev");

        let fallback = log.find("In-cluster configuration unavailable").unwrap();
        assert_eq!(fallback.level, Level::Warn);
        assert_eq!(fallback.field("error"), Some("service account token missing"));
    }
}
