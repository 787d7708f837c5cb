// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Configuration resolution and client session creation

use std::fmt;
use std::path::{Path, PathBuf};

use http::header::{HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config as KConfig};
use tracing::{debug, info, instrument};

use crate::constants::identity;
use crate::error::{Result, TourError};

/// Where the connection parameters came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    InCluster,
    Kubeconfig(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::InCluster => write!(f, "in-cluster service account"),
            ConfigSource::Kubeconfig(path) => write!(f, "kubeconfig {}", path.display()),
        }
    }
}

/// Connection parameters before the client identity is applied
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: KConfig,
    pub source: ConfigSource,
}

/// Resolve connection parameters: in-cluster first, then the kubeconfig file
pub async fn resolve_config(kubeconfig: &Path) -> Result<ResolvedConfig> {
    let ambient = match KConfig::incluster() {
        Ok(config) => Some(config),
        Err(e) => {
            debug!("In-cluster configuration unavailable: {}", e);
            None
        }
    };

    resolve_from(ambient, kubeconfig).await
}

/// Use the ambient configuration when there is one, otherwise read `kubeconfig`
pub async fn resolve_from(ambient: Option<KConfig>, kubeconfig: &Path) -> Result<ResolvedConfig> {
    if let Some(config) = ambient {
        return Ok(ResolvedConfig {
            config,
            source: ConfigSource::InCluster,
        });
    }

    let parsed = Kubeconfig::read_from(kubeconfig).map_err(|e| {
        TourError::ConfigUnavailable(format!(
            "kubeconfig {} can not be read: {}",
            kubeconfig.display(),
            e
        ))
    })?;

    let config = KConfig::from_custom_kubeconfig(parsed, &KubeConfigOptions::default())
        .await
        .map_err(|e| {
            TourError::ConfigUnavailable(format!(
                "kubeconfig {} is not usable: {}",
                kubeconfig.display(),
                e
            ))
        })?;

    Ok(ResolvedConfig {
        config,
        source: ConfigSource::Kubeconfig(kubeconfig.to_path_buf()),
    })
}

/// How the client introduces itself to the API server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub user_agent: String,
    /// Content types in order of preference. Only JSON media types are
    /// allowed since kube-rs decodes nothing else. The header is appended to
    /// each request, so requests that set their own `Accept` carry both.
    pub accept: Vec<String>,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            user_agent: format!(
                "{}/v{} ({}/{}) kube-rs",
                identity::APP_NAME,
                identity::APP_VERSION,
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            accept: identity::ACCEPT_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ClientIdentity {
    /// Headers added to every request
    pub fn headers(&self) -> Result<Vec<(HeaderName, HeaderValue)>> {
        let user_agent = HeaderValue::from_str(&self.user_agent).map_err(|e| {
            TourError::ConfigUnavailable(format!("Invalid user agent '{}': {}", self.user_agent, e))
        })?;

        if let Some(other) = self.accept.iter().find(|t| !is_json_media_type(t)) {
            return Err(TourError::ConfigUnavailable(format!(
                "Unsupported accept type '{}', only JSON can be decoded",
                other
            )));
        }

        let accept = self.accept.join(",");
        let accept_value = HeaderValue::from_str(&accept).map_err(|e| {
            TourError::ConfigUnavailable(format!("Invalid accept list '{}': {}", accept, e))
        })?;

        Ok(vec![(USER_AGENT, user_agent), (ACCEPT, accept_value)])
    }
}

fn is_json_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or_default().trim();
    essence == "*/*" || essence.ends_with("/json") || essence.ends_with("+json")
}

/// An authenticated session against one cluster
#[derive(Clone)]
pub struct ClientSession {
    client: Client,
}

impl ClientSession {
    /// Apply the client identity to `resolved` and build the client
    #[instrument(skip_all, fields(source = %resolved.source))]
    pub fn connect(resolved: ResolvedConfig, identity: &ClientIdentity) -> Result<Self> {
        let ResolvedConfig { mut config, source } = resolved;
        config.headers.extend(identity.headers()?);
        let cluster_url = config.cluster_url.to_string();

        let client = Client::try_from(config).map_err(TourError::Connection)?;
        info!("Connected to {} using {}", cluster_url, source);

        Ok(Self { client })
    }

    /// Wrap an already constructed client
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}
