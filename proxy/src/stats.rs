use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Process-lifetime transfer counters shared by every in-flight request.
#[derive(Debug)]
pub struct ProxyStats {
    bytes_received: AtomicU64,
    start_time: Instant,
}

impl Default for ProxyStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyStats {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    pub fn started_at(start_time: Instant) -> Self {
        Self {
            bytes_received: AtomicU64::new(0),
            start_time,
        }
    }

    pub fn record_bytes(&self, n: u64) {
        self.bytes_received.fetch_add(n, Ordering::Relaxed);
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    pub fn summary(&self) -> String {
        self.summary_at(Instant::now())
    }

    pub fn summary_at(&self, now: Instant) -> String {
        let uptime = now.saturating_duration_since(self.start_time);
        format!(
            "Total bytes transferred: {} <br> Total time up: {}",
            self.bytes_received(),
            format_elapsed(uptime)
        )
    }
}

/// Renders a duration as `H:MM:SS`, prefixed by `N day(s), ` once it spans a day.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let seconds = total % 60;

    match days {
        0 => format!("{hours}:{minutes:02}:{seconds:02}"),
        1 => format!("1 day, {hours}:{minutes:02}:{seconds:02}"),
        _ => format!("{days} days, {hours}:{minutes:02}:{seconds:02}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "0:00:00");
        assert_eq!(format_elapsed(Duration::from_millis(5_999)), "0:00:05");
        assert_eq!(format_elapsed(Duration::from_secs(3_661)), "1:01:01");
        assert_eq!(format_elapsed(Duration::from_secs(90_000)), "1 day, 1:00:00");
        assert_eq!(
            format_elapsed(Duration::from_secs(2 * 86_400 + 23 * 3_600 + 59 * 60 + 59)),
            "2 days, 23:59:59"
        );
    }

    #[test]
    fn test_summary() {
        let start = Instant::now();
        let stats = ProxyStats::started_at(start);

        stats.record_bytes(1561);
        stats.record_bytes(1557);

        assert_eq!(stats.bytes_received(), 3118);
        assert_eq!(
            stats.summary_at(start + Duration::from_secs(25 * 3_600)),
            "Total bytes transferred: 3118 <br> Total time up: 1 day, 1:00:00"
        );
    }

    #[test]
    fn test_summary_before_start() {
        let start = Instant::now() + Duration::from_secs(10);
        let stats = ProxyStats::started_at(start);
        assert_eq!(
            stats.summary_at(Instant::now()),
            "Total bytes transferred: 0 <br> Total time up: 0:00:00"
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_record_bytes() {
        let stats = Arc::new(ProxyStats::new());
        let mut tasks = tokio::task::JoinSet::new();

        for _ in 0..64 {
            let stats = stats.clone();
            tasks.spawn(async move {
                for _ in 0..100 {
                    stats.record_bytes(1561);
                    tokio::task::yield_now().await;
                }
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(stats.bytes_received(), 64 * 100 * 1561);
    }
}
