use std::time::Duration;

/// How long a transient notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(2);

/// A transient feedback message ("Copied!") with an auto-expiry.
///
/// Every notice carries the generation counter it was created under. The
/// clear scheduled for an older notice is a no-op once a newer one is shown,
/// so a stale timer can never erase the newer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    message: String,
    generation: u64,
}

impl Notice {
    pub(crate) fn new(message: String, generation: u64) -> Self {
        Self { message, generation }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Sleeps for [`NOTICE_TTL`] and hands the generation back, ready to be fed
/// to `Session::expire_notice`. Showing a newer notice supersedes the clear
/// without the timer itself needing to be cancelled.
pub async fn expiry_timer(generation: u64) -> u64 {
    tokio::time::sleep(NOTICE_TTL).await;
    generation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expiry_timer_completes_after_the_ttl() {
        let started = tokio::time::Instant::now();
        let generation = expiry_timer(7).await;
        assert_eq!(generation, 7);
        assert!(started.elapsed() >= NOTICE_TTL);
    }
}
