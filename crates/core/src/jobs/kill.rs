// crates/core/src/jobs/kill.rs
//! Delayed process termination.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::params::KillParams;

/// Terminates the process after a delay.
///
/// Kills are neither registered nor cancellable. In dry-run mode the exit is
/// recorded instead of performed, which keeps test processes alive.
#[derive(Debug, Default)]
pub struct KillSwitch {
    dry_run: bool,
    suppressed: Mutex<SuppressedKills>,
}

/// Kills swallowed in dry-run mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuppressedKills {
    pub count: u64,
    pub last_code: Option<i32>,
}

impl KillSwitch {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            suppressed: Mutex::new(SuppressedKills::default()),
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Schedule the exit on a detached task and return immediately.
    pub fn schedule(self: &Arc<Self>, params: KillParams) {
        tracing::warn!(delay = params.delay, code = params.code, dry_run = self.dry_run, "termination scheduled");
        let switch = Arc::clone(self);
        tokio::spawn(async move {
            if params.delay > 0 {
                tokio::time::sleep(Duration::from_secs(params.delay)).await;
            }
            switch.fire(params.code);
        });
    }

    /// How many exits dry-run mode suppressed, and the last code.
    pub fn suppressed(&self) -> SuppressedKills {
        match self.suppressed.lock() {
            Ok(suppressed) => *suppressed,
            Err(e) => {
                tracing::error!("Mutex poisoned reading kill history: {e}");
                SuppressedKills::default()
            }
        }
    }

    fn fire(&self, code: i32) {
        if self.dry_run {
            tracing::warn!(code, "dry run: process termination suppressed");
            match self.suppressed.lock() {
                Ok(mut suppressed) => {
                    suppressed.count += 1;
                    suppressed.last_code = Some(code);
                }
                Err(e) => tracing::error!("Mutex poisoned recording kill: {e}"),
            }
            return;
        }
        tracing::error!(code, "terminating process");
        std::process::exit(code);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dry_run_records_immediate_kill() {
        let switch = Arc::new(KillSwitch::new(true));
        switch.schedule(KillParams { delay: 0, code: 0 });
        for _ in 0..50 {
            if switch.suppressed().count > 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(switch.suppressed(), SuppressedKills { count: 1, last_code: Some(0) });
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_waits_for_delay() {
        let switch = Arc::new(KillSwitch::new(true));
        switch.schedule(KillParams { delay: 10, code: 137 });

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(switch.suppressed().count, 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(switch.suppressed(), SuppressedKills { count: 1, last_code: Some(137) });
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_run_history_stays_bounded() {
        let switch = Arc::new(KillSwitch::new(true));
        for code in 0..1000 {
            switch.schedule(KillParams { delay: 0, code: code % 256 });
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        let suppressed = switch.suppressed();
        assert_eq!(suppressed.count, 1000);
        assert!(suppressed.last_code.is_some());
    }
}
