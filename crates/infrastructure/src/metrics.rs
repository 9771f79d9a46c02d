use dnsward_application::ports::{MetricsRecorder, QueryStatus};
use prometheus::{exponential_buckets, Counter, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Prometheus-backed metrics registry. Counters/histogram/gauge are all
/// lock-free atomics under the hood (the `prometheus` crate's own
/// `AtomicF64`/`AtomicU64`), matching the concurrency requirement that
/// metrics updates never take a lock shared with the query path.
pub struct Metrics {
    registry: Registry,
    reqs_total: Counter,
    reqs_accepted: Counter,
    reqs_rejected_by_client: Counter,
    reqs_blocklisted: Counter,
    req_duration: Histogram,
    blocklist_items: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let reqs_total = Counter::with_opts(Opts::new(
            "fn53_reqs_total",
            "Total DNS requests handled",
        ))
        .expect("valid counter opts");
        let reqs_accepted = Counter::with_opts(Opts::new(
            "fn53_reqs_accepted",
            "Requests forwarded upstream",
        ))
        .expect("valid counter opts");
        let reqs_rejected_by_client = Counter::with_opts(Opts::new(
            "fn53_reqs_rejected_by_client",
            "Requests rejected due to a client policy override",
        ))
        .expect("valid counter opts");
        let reqs_blocklisted = Counter::with_opts(Opts::new(
            "fn53_reqs_blocklisted",
            "Requests rejected because the name matched the blocklist",
        ))
        .expect("valid counter opts");

        // 0.00025s to 8s across 16 buckets.
        let buckets = exponential_buckets(0.00025, 2.0, 16).expect("valid bucket geometry");
        let req_duration = Histogram::with_opts(
            HistogramOpts::new("fn53_req_duration", "Time to handle one query, in seconds")
                .buckets(buckets),
        )
        .expect("valid histogram opts");

        let blocklist_items = Gauge::with_opts(Opts::new(
            "fn53_blocklist_items",
            "Number of entries in the currently active blocklist",
        ))
        .expect("valid gauge opts");

        for collector in [
            Box::new(reqs_total.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(reqs_accepted.clone()),
            Box::new(reqs_rejected_by_client.clone()),
            Box::new(reqs_blocklisted.clone()),
            Box::new(req_duration.clone()),
            Box::new(blocklist_items.clone()),
        ] {
            registry
                .register(collector)
                .expect("metric names must be unique");
        }

        Self {
            registry,
            reqs_total,
            reqs_accepted,
            reqs_rejected_by_client,
            reqs_blocklisted,
            req_duration,
            blocklist_items,
        }
    }

    /// Render in Prometheus text exposition format for the `/metrics` HTTP
    /// handler.
    pub fn render(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .expect("prometheus text encoding cannot fail for well-formed metrics");
        String::from_utf8(buffer).expect("prometheus output is always valid UTF-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder for Metrics {
    fn record_request(&self) {
        self.reqs_total.inc();
    }

    fn record_outcome(&self, status: QueryStatus, duration: Duration) {
        match status {
            QueryStatus::Ok => self.reqs_accepted.inc(),
            QueryStatus::Blocklisted => self.reqs_blocklisted.inc(),
            QueryStatus::RejectedByClient => self.reqs_rejected_by_client.inc(),
        }
        self.req_duration.observe(duration.as_secs_f64());
    }

    fn set_blocklist_items(&self, count: usize) {
        self.blocklist_items.set(count as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_exposes_configured_metric_names() {
        let metrics = Metrics::new();
        metrics.record_request();
        metrics.record_outcome(QueryStatus::Ok, Duration::from_millis(5));
        metrics.set_blocklist_items(42);

        let rendered = metrics.render();
        assert!(rendered.contains("fn53_reqs_total"));
        assert!(rendered.contains("fn53_reqs_accepted"));
        assert!(rendered.contains("fn53_req_duration"));
        assert!(rendered.contains("fn53_blocklist_items"));
    }
}
