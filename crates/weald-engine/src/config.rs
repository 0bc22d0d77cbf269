//! Scheduler configuration.

/// Configuration for [`MapUpdater`](crate::MapUpdater).
#[derive(Clone, Debug)]
pub struct UpdaterConfig {
    /// Number of worker threads. `None` = auto-detect
    /// (`available_parallelism / 2`, clamped to `[2, 16]`).
    pub worker_count: Option<usize>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self { worker_count: None }
    }
}

impl UpdaterConfig {
    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`. Zero workers would
    /// create an updater that accepts requests and never runs them.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => {
                let cpus = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4);
                (cpus / 2).clamp(2, 16)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_worker_count_clamps_zero() {
        let cfg = UpdaterConfig {
            worker_count: Some(0),
        };
        assert_eq!(cfg.resolved_worker_count(), 1);
    }

    #[test]
    fn resolved_worker_count_clamps_large() {
        let cfg = UpdaterConfig {
            worker_count: Some(500),
        };
        assert_eq!(cfg.resolved_worker_count(), 64);
    }

    #[test]
    fn resolved_worker_count_auto_is_bounded() {
        let count = UpdaterConfig::default().resolved_worker_count();
        assert!((2..=16).contains(&count), "auto count {count} out of [2,16]");
    }
}
