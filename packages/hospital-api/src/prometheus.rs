use crate::error::{ConfigError, Error};
use crate::log::DEVELOPMENT;
use metrics::{counter, describe_counter, describe_histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{debug, info};

// See https://prometheus.io/docs/practices/naming/
pub const REQUESTS_TOTAL: &str = "hospital_api_requests_total";
pub const REQUEST_ERRORS_TOTAL: &str = "hospital_api_request_errors_total";
pub const REQUEST_DURATION_SECONDS: &str = "hospital_api_request_duration_seconds";

pub const DOCUMENTS_CREATED_TOTAL: &str = "hospital_api_documents_created_total";

pub const LOGINS_TOTAL: &str = "hospital_api_logins_total";
pub const LOGIN_FAILURES_TOTAL: &str = "hospital_api_login_failures_total";

pub fn start(host: &str, port: u16) -> Result<(), Error> {
    let address = format!("{}:{}", host, port);
    let socket_address: SocketAddr =
        address
            .parse()
            .map_err(|_| ConfigError::InvalidParameter {
                name: "prometheus.port".to_string(),
                value: address.to_owned(),
            })?;

    debug!(target: DEVELOPMENT, msg = "Starting Prometheus exporter", port);

    PrometheusBuilder::new()
        .with_http_listener(socket_address)
        .install()?;

    describe_counter!(REQUESTS_TOTAL, "Total number of API requests");
    describe_counter!(
        REQUEST_ERRORS_TOTAL,
        "Number of API requests answered with an error status"
    );
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Duration of API request handling"
    );

    describe_counter!(
        DOCUMENTS_CREATED_TOTAL,
        "Number of documents created, labelled by collection"
    );

    describe_counter!(LOGINS_TOTAL, "Number of successful logins");
    describe_counter!(LOGIN_FAILURES_TOTAL, "Number of rejected logins");

    // Prometheus endpoint is empty on startup and looks like an error
    // Explicitly set count to zero
    counter!(REQUESTS_TOTAL).absolute(0);

    info!(msg = "Prometheus exporter started", port);
    Ok(())
}
