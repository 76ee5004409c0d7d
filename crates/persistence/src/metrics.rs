//! Database metrics: per-query latency and pool gauges.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

use crate::db::PoolStats;

/// Histogram of query latency, labelled by query name.
pub const QUERY_DURATION_METRIC: &str = "database_query_duration_seconds";

/// Publish the pool's connection gauges. Called on every scrape.
pub fn record_pool_metrics(pool: &PgPool) {
    let stats = PoolStats::of(pool);

    gauge!("database_connections_active").set(stats.active() as f64);
    gauge!("database_connections_idle").set(stats.idle as f64);
    gauge!("database_connections_total").set(f64::from(stats.size));
}

/// Times one repository query.
///
/// ```ignore
/// let timer = QueryTimer::new("find_game_by_id");
/// let result = sqlx::query_as::<_, GameEntity>(...).fetch_optional(&self.pool).await;
/// timer.record();
/// result
/// ```
///
/// Queries that bail out early with `?` are not recorded.
#[derive(Debug)]
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    pub fn query(&self) -> &'static str {
        self.query
    }

    pub fn record(self) {
        histogram!(QUERY_DURATION_METRIC, "query" => self.query)
            .record(self.start.elapsed().as_secs_f64());
    }
}
