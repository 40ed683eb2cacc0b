//! Observability hooks.
//!
//! With the `metrics` feature, counters are recorded through the global
//! OpenTelemetry meter; install a meter provider in the application to export
//! them. With the `tracing` feature, relation set construction and binding run
//! inside spans from [`tracing_helpers`].

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{global, metrics::Counter};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<LineageMetrics> = Lazy::new(LineageMetrics::init);

#[cfg(feature = "metrics")]
pub struct LineageMetrics {
    pub relations_patched_total: Counter<u64>,
    pub relate_total: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl LineageMetrics {
    pub fn init() -> Self {
        let meter = global::meter("lineage");

        let relations_patched_total = meter
            .u64_counter("lineage_relations_patched_total")
            .with_description("Relation attributes decorated at model build time")
            .build();

        let relate_total = meter
            .u64_counter("lineage_relate_total")
            .with_description("Back-references recorded")
            .build();

        Self {
            relations_patched_total,
            relate_total,
        }
    }

    pub fn record_patch(&self) {
        self.relations_patched_total.add(1, &[]);
    }

    pub fn record_relate(&self) {
        self.relate_total.add(1, &[]);
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    /// Span around relation set construction for one model
    pub fn build_relation_set_span(model: &str) -> Span {
        tracing::debug_span!("lineage.build_relation_set", model = model)
    }

    /// Span around one `relate` call
    pub fn relate_span(relation: &str) -> Span {
        tracing::trace_span!("lineage.relate", relation = relation)
    }
}
