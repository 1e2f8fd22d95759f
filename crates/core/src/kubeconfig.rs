// Kubeconfig loading: resolves the current context into a ClientConfig

use crate::config::{Auth, ClientConfig};
use crate::error::{ClientError, ClientResult};
use base64::Engine;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

/// A parsed kubeconfig file. Only the fields needed to reach a cluster are read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Kubeconfig {
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub current_context: Option<String>,

    /// Directory relative credential paths are resolved against.
    #[serde(skip)]
    base_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: Cluster,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Cluster {
    pub server: String,
    #[serde(default)]
    pub certificate_authority: Option<PathBuf>,
    #[serde(default)]
    pub certificate_authority_data: Option<String>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct User {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "tokenFile")]
    pub token_file: Option<PathBuf>,
    #[serde(default)]
    pub client_certificate: Option<PathBuf>,
    #[serde(default)]
    pub client_certificate_data: Option<String>,
    #[serde(default)]
    pub client_key: Option<PathBuf>,
    #[serde(default)]
    pub client_key_data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: Context,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Context {
    pub cluster: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Kubeconfig {
    /// `$HOME/.kube/config`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".kube").join("config"))
    }

    /// Pick the explicit path if given, otherwise the default location.
    pub fn resolve_path(explicit: Option<&Path>) -> ClientResult<PathBuf> {
        match explicit {
            Some(path) => Ok(path.to_path_buf()),
            None => Self::default_path().ok_or_else(|| {
                ClientError::Kubeconfig("no kubeconfig given and home directory is unknown".to_string())
            }),
        }
    }

    /// Read and parse a kubeconfig file.
    pub fn read_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Kubeconfig(format!("failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::parse(&content)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn parse(content: &str) -> ClientResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// The context named by `current-context`.
    pub fn current(&self) -> ClientResult<&Context> {
        let name = self
            .current_context
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ClientError::Kubeconfig("current-context is not set".to_string()))?;

        self.contexts
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.context)
            .ok_or_else(|| ClientError::Kubeconfig(format!("context {} not found", name)))
    }

    /// Build a client configuration from the current context.
    pub fn to_client_config(&self) -> ClientResult<ClientConfig> {
        let context = self.current()?;

        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.cluster)
            .map(|c| &c.cluster)
            .ok_or_else(|| {
                ClientError::Kubeconfig(format!("cluster {} not found", context.cluster))
            })?;

        let user = match &context.user {
            Some(name) => self
                .users
                .iter()
                .find(|u| &u.name == name)
                .map(|u| u.user.clone())
                .ok_or_else(|| ClientError::Kubeconfig(format!("user {} not found", name)))?,
            None => User::default(),
        };

        let server = Url::parse(&cluster.server)?;
        let mut config = ClientConfig::new(server);
        config.insecure_skip_tls_verify = cluster.insecure_skip_tls_verify;
        config.ca_pem = self.load_pem(
            cluster.certificate_authority_data.as_deref(),
            cluster.certificate_authority.as_deref(),
        )?;
        config.auth = self.load_auth(&user)?;

        Ok(config)
    }

    fn load_auth(&self, user: &User) -> ClientResult<Auth> {
        if let Some(token) = user.token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Auth::BearerToken(token.clone()));
        }

        if let Some(token_file) = &user.token_file {
            let token = std::fs::read_to_string(self.resolve(token_file))?;
            return Ok(Auth::BearerToken(token.trim().to_string()));
        }

        let cert = self.load_pem(
            user.client_certificate_data.as_deref(),
            user.client_certificate.as_deref(),
        )?;
        let key = self.load_pem(user.client_key_data.as_deref(), user.client_key.as_deref())?;

        match (cert, key) {
            (Some(cert_pem), Some(key_pem)) => Ok(Auth::ClientCertificate { cert_pem, key_pem }),
            (None, None) => Ok(Auth::None),
            _ => Err(ClientError::Kubeconfig(
                "client certificate and key must be provided together".to_string(),
            )),
        }
    }

    /// Inline base64 data wins over a file path.
    fn load_pem(&self, data: Option<&str>, file: Option<&Path>) -> ClientResult<Option<Vec<u8>>> {
        if let Some(data) = data {
            let decoded = base64::engine::general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| ClientError::Kubeconfig(format!("invalid base64 data: {}", e)))?;
            return Ok(Some(decoded));
        }

        match file {
            Some(path) => Ok(Some(std::fs::read(self.resolve(path))?)),
            None => Ok(None),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
