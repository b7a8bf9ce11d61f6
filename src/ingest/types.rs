// src/ingest/types.rs

/// A remote source of posts. Failures never reach the caller: an unreachable or
/// misconfigured backend yields an empty vec and is reported through logs/metrics.
#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    async fn search(&self, query: &str, community: &str, limit: usize) -> Vec<String>;
    fn name(&self) -> &'static str;
}
