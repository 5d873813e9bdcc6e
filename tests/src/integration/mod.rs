//! Cross-subsystem integration scenarios.

pub mod end_to_end;
pub mod failure_paths;

#[cfg(test)]
pub(crate) mod support {
    use std::future::Future;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Poll `check` until it returns true, failing the test after 10s.
    pub async fn wait_until<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        timeout(Duration::from_secs(10), async {
            loop {
                if check().await {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached within 10s");
    }
}
