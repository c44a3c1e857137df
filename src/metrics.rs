//! Query metrics and tracing spans.
//!
//! With the `metrics` feature, executor and connection calls are recorded
//! through an OpenTelemetry meter exported into a Prometheus registry;
//! [`LifequeryMetrics::render`] produces the text exposition for a scrape
//! endpoint. The `tracing` feature adds spans around the same calls.

#[cfg(feature = "metrics")]
pub use self::prometheus_metrics::{LifequeryMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _};
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Encoder, Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<LifequeryMetrics> = Lazy::new(LifequeryMetrics::init);

    pub struct LifequeryMetrics {
        registry: Registry,
        // keeps the reader alive for the registry collector
        _provider: SdkMeterProvider,
        queries_total: Counter<u64>,
        query_errors_total: Counter<u64>,
        query_duration: Histogram<f64>,
        connection_wait_duration: Histogram<f64>,
    }

    impl LifequeryMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let provider = match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => SdkMeterProvider::builder().with_reader(exporter).build(),
                Err(e) => {
                    log::warn!("prometheus exporter unavailable, metrics are not exported: {e}");
                    SdkMeterProvider::builder().build()
                }
            };
            let meter = provider.meter("lifequery");

            let queries_total = meter
                .u64_counter("lifequery_queries")
                .with_description("Total statements executed")
                .build();

            let query_errors_total = meter
                .u64_counter("lifequery_query_errors")
                .with_description("Statements that failed in the database")
                .build();

            let query_duration = meter
                .f64_histogram("lifequery_query_duration_seconds")
                .with_description("Duration of statements")
                .build();

            let connection_wait_duration = meter
                .f64_histogram("lifequery_connection_wait_seconds")
                .with_description("Time spent establishing connections")
                .build();

            Self {
                registry,
                _provider: provider,
                queries_total,
                query_errors_total,
                query_duration,
                connection_wait_duration,
            }
        }

        pub fn record_query_duration(&self, elapsed: Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_connection_wait(&self, elapsed: Duration) {
            self.connection_wait_duration
                .record(elapsed.as_secs_f64(), &[]);
        }

        /// Prometheus text exposition of everything recorded so far
        pub fn render(&self) -> String {
            let mut buffer = Vec::new();
            if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buffer) {
                log::warn!("failed to encode metrics: {e}");
                return String::new();
            }
            String::from_utf8(buffer).unwrap_or_default()
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_recorded_queries_are_rendered() {
            METRICS.record_query_duration(Duration::from_millis(3));
            METRICS.record_query_error();
            METRICS.record_connection_wait(Duration::from_millis(1));

            let text = METRICS.render();
            assert!(text.contains("lifequery_queries"));
            assert!(text.contains("lifequery_query_duration_seconds"));
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    /// Span around a single statement
    pub fn execute_query_span(query: &str) -> Span {
        info_span!(
            "lifequery.execute_query",
            db.system = "postgresql",
            db.statement = %query
        )
    }

    /// Span around connection establishment
    pub fn acquire_connection_span() -> Span {
        info_span!("lifequery.acquire_connection", db.system = "postgresql")
    }
}
