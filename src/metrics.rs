use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Fixes the observability switch for the process. Later calls are ignored.
pub fn set_observability_enabled(enabled: bool) {
    let _ = OBSERVABILITY_ENABLED.set(enabled);
}

/// Disabled until [`set_observability_enabled`] is called.
pub fn is_observability_enabled() -> bool {
    OBSERVABILITY_ENABLED.get().copied().unwrap_or(false)
}

/// Installs the Prometheus recorder and its upkeep task. Returns `None` when
/// observability is disabled.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0,
            ],
        )?
        .install_recorder()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    let status_category = match status {
        200..=299 => "2xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    };
    counter!("http_requests_by_status", "status_category" => status_category).increment(1);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router for the metrics server.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

// Business metrics

pub fn track_login_success(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => role.to_string(), "status" => "success").increment(1);
}

pub fn track_login_failure(reason: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("user_logins_total", "role" => "unknown", "status" => "failure", "reason" => reason)
        .increment(1);
}

pub fn track_user_created(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_created_total", "role" => role.to_string()).increment(1);
}

pub fn track_grade_recorded() {
    if !is_observability_enabled() {
        return;
    }
    counter!("grades_recorded_total").increment(1);
}

pub fn track_bulletin_confirmed() {
    if !is_observability_enabled() {
        return;
    }
    counter!("bulletins_confirmed_total").increment(1);
}

pub fn track_bulletin_rendered(scope: &'static str, format: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("bulletins_rendered_total", "scope" => scope, "format" => format).increment(1);
}

pub fn track_attendance_marked(status: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("attendance_marked_total", "status" => status).increment(1);
}

/// Counts averages recovered as zero from unusable grade data.
pub fn track_malformed_aggregates(count: usize) {
    if !is_observability_enabled() || count == 0 {
        return;
    }
    counter!("malformed_aggregates_total").increment(count as u64);
}
