mod display;

use std::net::IpAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use modelserve_ai::ModelHost;
use modelserve_client::{ClientError, DEFAULT_BASE_URL, PredictionClient};
use modelserve_core::{
    Deployment, IrisMeasurements, IrisPrediction, Location, PurchasePrediction, PurchaseProfile,
    RawIrisQuery, RawPurchaseProfile,
};
use modelserve_dashboard::DashboardConfig;
use modelserve_service::ServiceConfig;
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modelserve", version, about = "Serve a pre-trained classifier over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the prediction service for one deployment
    Serve {
        /// iris or purchase
        #[arg(long, env = "MODELSERVE_APP")]
        app: Deployment,
        /// Model artifact (.json, or .onnx with the onnx feature) [default: models/<app>.json]
        #[arg(long, env = "MODELSERVE_MODEL")]
        model: Option<PathBuf>,
        #[arg(long, env = "MODELSERVE_HOST", default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, env = "MODELSERVE_PORT", default_value_t = 8000)]
        port: u16,
    },
    /// Run the dashboard in front of a prediction service
    Dashboard {
        #[arg(long, env = "MODELSERVE_APP")]
        app: Deployment,
        #[arg(long, env = "MODELSERVE_API_URL", default_value = DEFAULT_BASE_URL)]
        api_url: String,
        #[arg(long, env = "MODELSERVE_HOST", default_value = "127.0.0.1")]
        host: IpAddr,
        #[arg(long, env = "MODELSERVE_DASHBOARD_PORT", default_value_t = 8501)]
        port: u16,
    },
    /// Check that a prediction service answers its liveness endpoint
    Probe {
        #[arg(long, env = "MODELSERVE_API_URL", default_value = DEFAULT_BASE_URL)]
        api_url: String,
    },
    /// Request a single prediction
    Predict {
        #[command(subcommand)]
        request: PredictRequest,
    },
}

#[derive(Args)]
struct Target {
    #[arg(long, env = "MODELSERVE_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,
    /// Predict in-process from this artifact instead of calling a service
    #[arg(long)]
    model: Option<PathBuf>,
    /// Print the raw response record
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum PredictRequest {
    /// Classify an iris flower from its measurements (cm)
    Iris {
        #[arg(long)]
        sepal_length: f64,
        #[arg(long)]
        sepal_width: f64,
        #[arg(long)]
        petal_length: f64,
        #[arg(long)]
        petal_width: f64,
        #[command(flatten)]
        target: Target,
    },
    /// Predict whether a person will buy the product
    Purchase {
        /// 0 = male, 1 = female
        #[arg(long)]
        gender: i64,
        #[arg(long)]
        age: i64,
        #[arg(long)]
        estimated_salary: i64,
        #[command(flatten)]
        target: Target,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!("modelserve v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Serve {
            app,
            model,
            host,
            port,
        } => {
            let mut config = ServiceConfig::new(app);
            if let Some(model) = model {
                config.model_path = model;
            }
            config.host = host;
            config.port = port;
            modelserve_service::run(config)
                .await
                .with_context(|| format!("running the {app} prediction service"))?;
        }
        Command::Dashboard {
            app,
            api_url,
            host,
            port,
        } => {
            let config = DashboardConfig {
                deployment: app,
                api_url,
                host,
                port,
            };
            modelserve_dashboard::run(config)
                .await
                .with_context(|| format!("running the {app} dashboard"))?;
        }
        Command::Probe { api_url } => {
            let client = PredictionClient::new(api_url);
            let welcome = client.probe().await.with_context(|| {
                format!("prediction service at {} is not reachable", client.base_url())
            })?;
            println!("✅ {}", welcome.message);
        }
        Command::Predict { request } => predict(request).await?,
    }

    Ok(())
}

async fn predict(request: PredictRequest) -> anyhow::Result<()> {
    match request {
        PredictRequest::Iris {
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
            target,
        } => {
            let measurements = IrisMeasurements {
                sepal_length,
                sepal_width,
                petal_length,
                petal_width,
            };
            let prediction = match &target.model {
                Some(path) => predict_iris_locally(path, &measurements)?,
                None => PredictionClient::new(target.api_url.clone())
                    .predict_iris(&measurements)
                    .await
                    .map_err(remote_error)?,
            };
            if target.json {
                println!("{}", serde_json::to_string(&prediction)?);
            } else {
                println!("{}", display::iris(&prediction));
            }
        }
        PredictRequest::Purchase {
            gender,
            age,
            estimated_salary,
            target,
        } => {
            let profile = PurchaseProfile {
                gender,
                age,
                estimated_salary,
            };
            let prediction = match &target.model {
                Some(path) => predict_purchase_locally(path, &profile)?,
                None => PredictionClient::new(target.api_url.clone())
                    .predict_purchase(&profile)
                    .await
                    .map_err(remote_error)?,
            };
            if target.json {
                println!("{}", serde_json::to_string(&prediction)?);
            } else {
                println!("{}", display::purchase(&prediction));
            }
        }
    }
    Ok(())
}

fn load_model(path: &Path, deployment: Deployment) -> anyhow::Result<ModelHost> {
    let host = ModelHost::load(path).with_context(|| format!("loading {}", path.display()))?;
    host.check_schema(deployment.feature_names())?;
    Ok(host)
}

fn predict_iris_locally(
    path: &Path,
    measurements: &IrisMeasurements,
) -> anyhow::Result<IrisPrediction> {
    let measurements = RawIrisQuery::from(measurements)
        .validate(Location::Query)
        .map_err(|e| anyhow::anyhow!(display::rejection(&e)))?;
    let host = load_model(path, Deployment::Iris)?;
    let prediction = host.predict(&measurements.to_features())?;
    Ok(IrisPrediction {
        prediction: prediction.label,
    })
}

fn predict_purchase_locally(
    path: &Path,
    profile: &PurchaseProfile,
) -> anyhow::Result<PurchasePrediction> {
    let raw = RawPurchaseProfile {
        gender: Some(json!(profile.gender)),
        age: Some(json!(profile.age)),
        estimated_salary: Some(json!(profile.estimated_salary)),
    };
    let profile = raw
        .validate(Location::Body)
        .map_err(|e| anyhow::anyhow!(display::rejection(&e)))?;
    let host = load_model(path, Deployment::Purchase)?;
    let prediction = host.predict(&profile.to_features())?;
    let Some(probability) = host.probability_of(&prediction, 1) else {
        bail!("{} does not report class probabilities", path.display());
    };
    Ok(PurchasePrediction::new(prediction.label, probability))
}

fn remote_error(e: ClientError) -> anyhow::Error {
    match e.validation() {
        Some(errors) => anyhow::anyhow!(display::rejection(&errors)),
        None if e.is_unreachable() => {
            anyhow::Error::new(e).context("prediction service is not reachable")
        }
        None => e.into(),
    }
}
