use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use modelserve_ai::{ModelError, ModelHost};
use modelserve_core::Deployment;
use tracing::info;

/// Startup settings for one prediction service process.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub deployment: Deployment,
    pub model_path: PathBuf,
    pub host: IpAddr,
    pub port: u16,
}

impl ServiceConfig {
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment,
            model_path: PathBuf::from(deployment.default_model_path()),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Everything a request handler may read. Built once, never mutated.
#[derive(Debug)]
pub struct ServiceContext {
    pub deployment: Deployment,
    pub model: ModelHost,
}

impl ServiceContext {
    pub fn new(deployment: Deployment, model: ModelHost) -> Self {
        Self { deployment, model }
    }

    /// Load the configured artifact and check it matches the deployment's features.
    pub fn load(config: &ServiceConfig) -> Result<Self, ModelError> {
        let model = ModelHost::load(&config.model_path)?;
        model.check_schema(config.deployment.feature_names())?;

        let described = model.describe();
        info!(
            deployment = %config.deployment,
            model = %described.name,
            classes = ?described.classes,
            "model host ready"
        );
        Ok(Self::new(config.deployment, model))
    }

    pub fn welcome_message(&self) -> &'static str {
        self.deployment.welcome_message()
    }
}
