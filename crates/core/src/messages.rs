// crates/core/src/messages.rs
//! Canned log messages used when the caller does not supply one.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::params::{LogSize, SizeCategory};

const SHORT: &[&str] = &[
    "Service healthy (Fake message)",
    "Cache refreshed (Fake message)",
    "Request processed (Fake message)",
    "Worker started (Fake message)",
    "Connection accepted (Fake message)",
    "Heartbeat sent (Fake message)",
    "Config reloaded (Fake message)",
    "Token rotated (Fake message)",
    "Queue drained (Fake message)",
    "Snapshot written (Fake message)",
    "Lease renewed (Fake message)",
    "Probe succeeded (Fake message)",
];

const MEDIUM: &[&str] = &[
    "Connection pool resized to 16 connections after sustained load on the primary (Fake message)",
    "Background queue processed 40 items in 120ms, 3 items remain pending (Fake message)",
    "Rate limiter threshold raised to 200 requests per minute for tenant acme (Fake message)",
    "Session store failover completed, 2 replicas promoted without data loss (Fake message)",
    "Certificate for api.internal expires in 21 days, renewal job scheduled (Fake message)",
    "Readiness probe recovered after 3 consecutive failures on node worker-7 (Fake message)",
    "Deployment rollout reached 50% of replicas, error budget unchanged (Fake message)",
    "Upstream latency p95 dropped to 140ms after enabling keep-alive (Fake message)",
    "Garbage collection reclaimed 48MB, heap usage now at 41% of limit (Fake message)",
    "Feature flag checkout-v2 enabled for 10% of traffic in eu-west (Fake message)",
];

const LONG: &[&str] = &[
    "Capacity report: average CPU utilization across the pool was 38% over the last hour with short peaks of 81% during the nightly batch window. Resident memory stayed flat at 1.9GB per replica, network egress totalled 410MB and the p99 database round trip held at 170ms. No throttling events were recorded by the orchestrator. (Fake message)",
    "Maintenance summary: the primary database was drained and failed over to the standby replica in 14 seconds. Index rebuilds finished for 18 tables, table statistics were refreshed and the connection pool was re-tuned for the new topology. Backups were verified against the off-site copy and 37GB of obsolete write-ahead log segments were pruned. (Fake message)",
    "Ingress review: the gateway served 152,000 requests in the last ten minutes with a 99.96% success rate. Circuit breakers opened twice for the recommendations service and closed again after the half-open probe succeeded. Traffic was spread evenly over six backends and TLS session reuse stayed above 92% throughout the window. (Fake message)",
    "Pipeline report: the extract stage read 2.1 million rows from three upstream systems, applied 41 validation and normalization rules, quarantined 212 rows for manual review and loaded the remainder into the warehouse. The run finished in 38 minutes, 11% faster than the previous night thanks to the partition pruning change. (Fake message)",
    "Cluster scaling event: the autoscaler added four nodes in two availability zones after pending pods exceeded the threshold for five minutes. Forty-two pods were scheduled onto the new capacity, persistent volumes were attached without errors and the cluster returned to a steady state with 63% CPU and 68% memory requested. (Fake message)",
    "Security sweep: the weekly scan covered 310 images and 58 hosts. Eleven packages were patched, two base images were rebuilt, and one medium-severity finding in a transitive dependency was suppressed pending an upstream fix. Access reviews were completed for 190 accounts and four stale service credentials were revoked. (Fake message)",
];

fn catalog(category: SizeCategory) -> &'static [&'static str] {
    match category {
        SizeCategory::Short => SHORT,
        SizeCategory::Medium => MEDIUM,
        SizeCategory::Long => LONG,
    }
}

/// Pick a canned message for the requested size. `Random` picks a category first.
pub fn generate_with<R: Rng + ?Sized>(size: LogSize, rng: &mut R) -> String {
    let pool = catalog(size.resolve_with(rng));
    pool.choose(rng).copied().unwrap_or(SHORT[0]).to_string()
}

/// The message for one log entry: the caller's (already marked) message, or a
/// freshly generated one.
pub fn resolve_message(custom: Option<&str>, size: LogSize) -> String {
    match custom {
        Some(message) => message.to_string(),
        None => generate_with(size, &mut rand::thread_rng()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::MESSAGE_MARKER;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_every_catalog_entry_is_marked() {
        for entry in SHORT.iter().chain(MEDIUM).chain(LONG) {
            assert!(entry.ends_with(MESSAGE_MARKER), "unmarked entry: {entry}");
        }
    }

    #[test]
    fn test_generated_message_comes_from_requested_size() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            assert!(SHORT.contains(&generate_with(LogSize::Short, &mut rng).as_str()));
            assert!(MEDIUM.contains(&generate_with(LogSize::Medium, &mut rng).as_str()));
            assert!(LONG.contains(&generate_with(LogSize::Long, &mut rng).as_str()));
        }
    }

    #[test]
    fn test_sizes_are_ordered_by_length() {
        let max_short = SHORT.iter().map(|s| s.len()).max().unwrap();
        let min_medium = MEDIUM.iter().map(|s| s.len()).min().unwrap();
        let max_medium = MEDIUM.iter().map(|s| s.len()).max().unwrap();
        let min_long = LONG.iter().map(|s| s.len()).min().unwrap();
        assert!(max_short < min_medium);
        assert!(max_medium < min_long);
    }

    #[test]
    fn test_custom_message_wins() {
        let msg = resolve_message(Some("hello (Fake message)"), LogSize::Long);
        assert_eq!(msg, "hello (Fake message)");
    }

    #[test]
    fn test_random_size_draws_from_all_catalogs() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut hit_short = false;
        let mut hit_long = false;
        for _ in 0..300 {
            let msg = generate_with(LogSize::Random, &mut rng);
            hit_short |= SHORT.contains(&msg.as_str());
            hit_long |= LONG.contains(&msg.as_str());
        }
        assert!(hit_short && hit_long);
    }
}
