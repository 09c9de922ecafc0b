//! Dashboard: a server-rendered page that collects feature values, forwards
//! them to the prediction service and shows the result.

mod error;
pub mod form;
pub mod render;
pub mod state;

use std::collections::HashMap;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::Router;
use axum::extract::{Form, State};
use axum::response::Html;
use axum::routing::{get, post};
use modelserve_client::{DEFAULT_BASE_URL, PredictionClient};
use modelserve_core::Deployment;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use error::DashboardError;
pub use form::{FormValues, Input};
pub use render::Page;
pub use state::{Outcome, Phase, Probe};

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub deployment: Deployment,
    /// Base URL of the prediction service.
    pub api_url: String,
    pub host: IpAddr,
    pub port: u16,
}

impl DashboardConfig {
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment,
            api_url: DEFAULT_BASE_URL.to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8501,
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Clone)]
struct AppState {
    deployment: Deployment,
    client: PredictionClient,
}

pub fn router(deployment: Deployment, client: PredictionClient) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .with_state(AppState { deployment, client })
}

async fn index(State(app): State<AppState>) -> Html<String> {
    let probe = Probe::run(&app.client).await;
    let values = FormValues::from(&Input::initial(app.deployment));
    Html(page(&app, &probe, &values, &Phase::Idle))
}

async fn predict(
    State(app): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Html<String>, DashboardError> {
    let probe = Probe::run(&app.client).await;
    let input = Input::from_form(app.deployment, &fields);
    let values = FormValues::submitted(app.deployment, &fields);

    let phase = state::submit(&app.client, &probe, input).await?;
    Ok(Html(page(&app, &probe, &values, &phase)))
}

fn page(app: &AppState, probe: &Probe, values: &FormValues, phase: &Phase) -> String {
    Page {
        deployment: app.deployment,
        api_url: app.client.base_url(),
        service_up: probe.up,
        checked_at: probe.checked_at,
        values,
        phase,
    }
    .render()
}

/// Serve the dashboard on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    config: &DashboardConfig,
    shutdown: F,
) -> Result<(), DashboardError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(
        deployment = %config.deployment,
        %addr,
        api_url = %config.api_url,
        "dashboard listening"
    );
    let client = PredictionClient::new(config.api_url.clone());
    axum::serve(listener, router(config.deployment, client))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("dashboard stopped");
    Ok(())
}

/// Bind the configured address and serve until Ctrl-C.
///
/// Starts even when the prediction service is down; the page reports it.
pub async fn run(config: DashboardConfig) -> Result<(), DashboardError> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| DashboardError::Bind { addr, source })?;
    serve(listener, &config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::http::StatusCode;
    use modelserve_ai::ModelHost;
    use modelserve_service::ServiceContext;

    async fn spawn(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    async fn spawn_service(deployment: Deployment) -> String {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../models")
            .join(format!("{deployment}.json"));
        let ctx = ServiceContext::new(deployment, ModelHost::load(&path).unwrap());
        spawn(modelserve_service::router(Arc::new(ctx))).await
    }

    async fn spawn_dashboard(deployment: Deployment, api_url: &str) -> String {
        spawn(router(deployment, PredictionClient::new(api_url))).await
    }

    /// A service whose liveness check fails but which counts prediction calls.
    async fn spawn_sick_service(calls: Arc<AtomicUsize>) -> String {
        let app = Router::new()
            .route("/", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route(
                "/predict",
                get(move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { "{\"prediction\":0}" }
                }),
            );
        spawn(app).await
    }

    async fn post_form(url: &str, pairs: &[(&str, &str)]) -> String {
        let resp = reqwest::Client::new()
            .post(format!("{url}/predict"))
            .form(pairs)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        resp.text().await.unwrap()
    }

    #[test]
    fn default_config() {
        let config = DashboardConfig::new(Deployment::Iris);
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8501");
        assert_eq!(config.api_url, "http://127.0.0.1:8000");
    }

    #[tokio::test]
    async fn index_reports_live_service() {
        let api = spawn_service(Deployment::Iris).await;
        let dashboard = spawn_dashboard(Deployment::Iris, &api).await;
        let html = reqwest::get(format!("{dashboard}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains("API connected"));
        assert!(html.contains("<button type=\"submit\">"));
    }

    #[tokio::test]
    async fn index_disables_submit_when_service_is_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dead = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let dashboard = spawn_dashboard(Deployment::Purchase, &dead).await;
        let html = reqwest::get(format!("{dashboard}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(html.contains("API not available"));
        assert!(html.contains("<button type=\"submit\" disabled>"));
        assert!(html.contains("name=\"estimated_salary\""));
    }

    #[tokio::test]
    async fn iris_submission_shows_versicolor() {
        let api = spawn_service(Deployment::Iris).await;
        let dashboard = spawn_dashboard(Deployment::Iris, &api).await;
        let html = post_form(
            &dashboard,
            &[
                ("sepal_length", "5.8"),
                ("sepal_width", "3.0"),
                ("petal_length", "4.0"),
                ("petal_width", "1.2"),
            ],
        )
        .await;
        assert!(html.contains("Prediction succeeded: <strong>Iris Versicolor</strong>"));
        assert!(html.contains("color:#4ECDC4"));
    }

    #[tokio::test]
    async fn purchase_submission_keeps_values_and_shows_percentage() {
        let api = spawn_service(Deployment::Purchase).await;
        let dashboard = spawn_dashboard(Deployment::Purchase, &api).await;
        let html = post_form(
            &dashboard,
            &[("gender", "1"), ("age", "47"), ("estimated_salary", "105000")],
        )
        .await;
        assert!(html.contains("Purchase probability: <strong>"));
        assert!(html.contains(" %</strong>"));
        assert!(html.contains(r#"name="age" min="18" max="60" step="1" value="47""#));
        assert!(html.contains(r#"<option value="1" selected>Female</option>"#));
    }

    #[tokio::test]
    async fn rejected_input_is_shown_not_crashed() {
        let api = spawn_service(Deployment::Purchase).await;
        let dashboard = spawn_dashboard(Deployment::Purchase, &api).await;
        let html = post_form(
            &dashboard,
            &[("gender", "0"), ("age", "17"), ("estimated_salary", "50000")],
        )
        .await;
        assert!(html.contains("class=\"error\""));
        assert!(html.contains("age: Input should be greater than or equal to 18"));
    }

    #[tokio::test]
    async fn undecodable_field_is_kept_in_the_form() {
        let api = spawn_service(Deployment::Iris).await;
        let dashboard = spawn_dashboard(Deployment::Iris, &api).await;
        let html = post_form(
            &dashboard,
            &[
                ("sepal_length", "6.1"),
                ("sepal_width", "wide"),
                ("petal_length", "4.7"),
                ("petal_width", "1.4"),
            ],
        )
        .await;
        assert!(html.contains("Invalid value for sepal_width"));
        assert!(html.contains(r#"step="0.1" value="wide""#));
        assert!(html.contains(r#"step="0.1" value="6.1""#));
        assert!(!html.contains(r#"value="5.8""#));
    }

    #[tokio::test]
    async fn failed_probe_skips_the_prediction_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let api = spawn_sick_service(Arc::clone(&calls)).await;
        let dashboard = spawn_dashboard(Deployment::Iris, &api).await;
        let html = post_form(
            &dashboard,
            &[
                ("sepal_length", "5.8"),
                ("sepal_width", "3.0"),
                ("petal_length", "4.0"),
                ("petal_width", "1.2"),
            ],
        )
        .await;
        assert!(html.contains("The prediction service is not available"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
