//! Metrics and tracing instrumentation.
//!
//! With the `metrics` feature, [`METRICS`] owns an OpenTelemetry meter backed by a
//! Prometheus registry; [`SupportMetrics::render`] returns the text exposition
//! format for scraping. With the `tracing` feature, [`tracing_helpers`] builds the
//! spans entered around query execution, relation joins and count lookups.

#[cfg(feature = "metrics")]
pub use prometheus_metrics::{SupportMetrics, METRICS};

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::metrics::{Counter, Histogram, MeterProvider as _};
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use prometheus::{Registry, TextEncoder};
    use std::time::Duration;

    pub static METRICS: Lazy<SupportMetrics> = Lazy::new(SupportMetrics::init);

    pub struct SupportMetrics {
        registry: Registry,
        // Dropping the provider stops collection
        _provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_errors_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub relation_count_cache_total: Counter<u64>,
        pub relation_joins_total: Counter<u64>,
        pub relations_hydrated_total: Counter<u64>,
    }

    impl SupportMetrics {
        pub fn init() -> Self {
            let registry = Registry::new();
            let provider = match opentelemetry_prometheus::exporter()
                .with_registry(registry.clone())
                .build()
            {
                Ok(exporter) => SdkMeterProvider::builder().with_reader(exporter).build(),
                Err(e) => {
                    log::warn!("failed to build prometheus exporter, metrics disabled: {e}");
                    SdkMeterProvider::builder().build()
                }
            };
            let meter = provider.meter("lifeguard_support");

            let queries_total = meter
                .u64_counter("lifeguard_support_queries_total")
                .with_description("Total queries executed")
                .build();

            let query_errors_total = meter
                .u64_counter("lifeguard_support_query_errors_total")
                .with_description("Queries that returned a database error")
                .build();

            let query_duration = meter
                .f64_histogram("lifeguard_support_query_duration_seconds")
                .with_description("Duration of queries")
                .build();

            let relation_count_cache_total = meter
                .u64_counter("lifeguard_support_relation_count_cache_total")
                .with_description("Relation count lookups by cache outcome")
                .build();

            let relation_joins_total = meter
                .u64_counter("lifeguard_support_relation_joins_total")
                .with_description("Relation joins added to select queries")
                .build();

            let relations_hydrated_total = meter
                .u64_counter("lifeguard_support_relations_hydrated_total")
                .with_description("Related records hydrated from joined columns")
                .build();

            Self {
                registry,
                _provider: provider,
                queries_total,
                query_errors_total,
                query_duration,
                relation_count_cache_total,
                relation_joins_total,
                relations_hydrated_total,
            }
        }

        pub fn record_query(&self, elapsed: Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_count_cache(&self, hit: bool) {
            let outcome = if hit { "hit" } else { "miss" };
            self.relation_count_cache_total
                .add(1, &[KeyValue::new("outcome", outcome)]);
        }

        pub fn record_join(&self, relation: &str) {
            self.relation_joins_total
                .add(1, &[KeyValue::new("relation", relation.to_string())]);
        }

        pub fn record_hydrated(&self) {
            self.relations_hydrated_total.add(1, &[]);
        }

        /// Render every registered metric in the Prometheus text format.
        ///
        /// # Errors
        ///
        /// Returns the encoder error if a metric family cannot be encoded.
        pub fn render(&self) -> Result<String, prometheus::Error> {
            TextEncoder::new().encode_to_string(&self.registry.gather())
        }
    }
}

/// Span builders for the `tracing` feature.
#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    pub fn execute_query_span(query: &str) -> Span {
        info_span!("lifeguard_support.execute_query", db.statement = %query)
    }

    pub fn relation_count_span(index: &str) -> Span {
        info_span!("lifeguard_support.relation_count", relation.index = %index)
    }

    pub fn relation_join_span(relation: &str, alias: &str) -> Span {
        info_span!(
            "lifeguard_support.relation_join",
            relation.name = %relation,
            relation.alias = %alias
        )
    }
}
