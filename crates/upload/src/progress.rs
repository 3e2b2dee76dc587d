//! Progress reporting.

use tokio::sync::mpsc;

use crate::types::Stage;

/// A progress event: a human-readable label and a percentage in `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    pub message: String,
    pub percentage: u8,
}

impl ProgressReport {
    /// Creates a report, clamping `percentage` to 100.
    pub fn new(message: impl Into<String>, percentage: u64) -> Self {
        Self {
            message: message.into(),
            percentage: percentage.min(100) as u8,
        }
    }
}

/// Receives progress events from the pipeline.
///
/// Called synchronously from the upload task; implementations must not
/// block.
pub trait ProgressSink: Send + Sync {
    fn report(&self, report: ProgressReport);

    /// Called whenever the pipeline, or the file being uploaded, enters a
    /// new stage.
    fn stage_entered(&self, _stage: Stage) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _report: ProgressReport) {}
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressReport) + Send + Sync,
{
    fn report(&self, report: ProgressReport) {
        self(report)
    }
}

impl ProgressSink for mpsc::UnboundedSender<ProgressReport> {
    fn report(&self, report: ProgressReport) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.send(report);
    }
}

/// Splits `points` percentage points across files proportionally to their
/// sizes.
///
/// Shares are truncated and the last file absorbs the residue, so the
/// result always sums to exactly `points`. With a zero total the last file
/// gets everything.
pub fn allocate_shares(sizes: &[u64], points: u64) -> Vec<u64> {
    let Some(last) = sizes.len().checked_sub(1) else {
        return Vec::new();
    };
    let total: u128 = sizes.iter().map(|&s| u128::from(s)).sum();

    let mut shares: Vec<u64> = sizes[..last]
        .iter()
        .map(|&size| {
            if total == 0 {
                0
            } else {
                (u128::from(points) * u128::from(size) / total) as u64
            }
        })
        .collect();
    let used: u64 = shares.iter().sum();
    shares.push(points - used);
    shares
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn shares_follow_file_sizes() {
        assert_eq!(allocate_shares(&[1_000_000, 9_000_000], 90), vec![9, 81]);
    }

    #[test]
    fn residue_goes_to_last_file() {
        let shares = allocate_shares(&[1, 1, 1], 90);
        assert_eq!(shares, vec![30, 30, 30]);

        let shares = allocate_shares(&[1, 1, 1, 1, 1, 1, 1], 90);
        assert_eq!(shares.iter().sum::<u64>(), 90);
        assert_eq!(shares[0], 12);
        assert_eq!(shares[6], 18);
    }

    #[test]
    fn shares_sum_to_points() {
        let cases: [&[u64]; 4] = [&[7], &[3, 5, 11], &[u64::MAX, u64::MAX], &[0, 0]];
        for sizes in cases {
            let shares = allocate_shares(sizes, 90);
            assert_eq!(shares.len(), sizes.len());
            assert_eq!(shares.iter().sum::<u64>(), 90, "sizes={sizes:?}");
        }
    }

    #[test]
    fn no_files_no_shares() {
        assert!(allocate_shares(&[], 90).is_empty());
    }

    #[test]
    fn percentage_is_clamped() {
        assert_eq!(ProgressReport::new("x", 250).percentage, 100);
        assert_eq!(ProgressReport::new("x", 42).percentage, 42);
    }

    #[test]
    fn closure_sink_receives_reports() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |r: ProgressReport| seen.lock().unwrap().push(r.percentage)
        };
        sink.report(ProgressReport::new("a", 5));
        sink.report(ProgressReport::new("b", 10));
        assert_eq!(*seen.lock().unwrap(), vec![5, 10]);
    }

    #[tokio::test]
    async fn channel_sink_forwards_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.report(ProgressReport::new("New token obtained", 5));
        drop(tx);
        let report = rx.recv().await.unwrap();
        assert_eq!(report.message, "New token obtained");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn channel_sink_ignores_closed_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.report(ProgressReport::new("late", 50));
    }
}
