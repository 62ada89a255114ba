//! Keeps a `StatsReport` current while expenses change.
//!
//! The loop recomputes whenever the source says the expenses table changed, and also on a fixed
//! interval so that changes the source cannot announce are still picked up. A report is only handed
//! to the caller when it differs from the previous one.

use crate::model::TimeRange;
use crate::source::{Change, ExpenseSource, Subscription, EXPENSES};
use crate::stats::StatsReport;
use crate::Result;
use chrono::{Local, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace, warn};

type Clock = Box<dyn Fn() -> NaiveDate + Send + Sync>;

pub struct RefreshLoop {
    source: Arc<dyn ExpenseSource>,
    range: TimeRange,
    poll_interval: Duration,
    clock: Clock,
    last: Option<StatsReport>,
}

impl RefreshLoop {
    pub fn new(source: Arc<dyn ExpenseSource>, range: TimeRange, poll_interval: Duration) -> Self {
        Self {
            source,
            range,
            poll_interval,
            clock: Box::new(|| Local::now().date_naive()),
            last: None,
        }
    }

    /// Replaces the source of "today", which otherwise is the local date.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Runs until `shutdown` completes. `on_report` is called with the first report and then with
    /// every report that differs from the one before it.
    ///
    /// A failed read is logged and retried at the next change or tick, it does not end the loop.
    pub async fn run<F, S>(mut self, mut on_report: F, shutdown: S) -> Result<()>
    where
        F: FnMut(&StatsReport),
        S: Future<Output = ()>,
    {
        let mut subscription = Some(self.source.subscribe());
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Refresh loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    trace!("Refresh interval elapsed");
                    self.refresh(&mut on_report).await;
                }
                change = next_change(&mut subscription) => {
                    match change {
                        Some(change) if change.table == EXPENSES => {
                            trace!("Refreshing after {} on {}", change.kind, change.table);
                            self.refresh(&mut on_report).await;
                        }
                        Some(_) => {}
                        None => {
                            debug!("Change notifications ended, refreshing on the interval only");
                            subscription = None;
                        }
                    }
                }
            }
        }

        if let Some(mut subscription) = subscription {
            subscription.unsubscribe();
        }
        Ok(())
    }

    async fn refresh<F>(&mut self, on_report: &mut F)
    where
        F: FnMut(&StatsReport),
    {
        let expenses = match self.source.fetch_expenses().await {
            Ok(expenses) => expenses,
            Err(e) => {
                warn!("Unable to read expenses, keeping the previous statistics: {e:#}");
                return;
            }
        };
        let report = StatsReport::compute(&expenses, self.range, (self.clock)());
        if self.last.as_ref() == Some(&report) {
            trace!("Statistics unchanged");
            return;
        }
        on_report(&report);
        self.last = Some(report);
    }
}

async fn next_change(subscription: &mut Option<Subscription>) -> Option<Change> {
    match subscription {
        Some(subscription) => subscription.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Expense;
    use crate::source::{ChangeKind, MemorySource};
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{mpsc, oneshot, Mutex};
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);
    const QUIET: Duration = Duration::from_millis(200);

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 20).unwrap()
    }

    #[tokio::test]
    async fn test_refreshes_on_change_only_when_different() {
        let source = Arc::new(MemorySource::new(vec![Expense::new(
            "a",
            "2025-10-01",
            "10",
            Some(String::from("Coffee")),
        )]));
        let (reports, mut received) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel::<()>();

        let refresh =
            RefreshLoop::new(source.clone(), TimeRange::SixMonths, Duration::from_secs(3600))
                .with_clock(today);
        let handle = tokio::spawn(refresh.run(
            move |report: &StatsReport| {
                let _ = reports.send(report.clone());
            },
            async move {
                let _ = stopped.await;
            },
        ));

        let first = timeout(WAIT, received.recv()).await.unwrap().unwrap();
        assert_eq!(first.summary.total, Decimal::from(10));
        assert_eq!(source.changes().subscribers(), 1);

        // A notification without a data change produces nothing new.
        source
            .changes()
            .publish(Change::new(EXPENSES, ChangeKind::Update));
        assert!(timeout(QUIET, received.recv()).await.is_err());

        source
            .insert(Expense::new("b", "2025-09-15", "5.50", None))
            .await;
        let second = timeout(WAIT, received.recv()).await.unwrap().unwrap();
        assert_eq!(second.summary.total, Decimal::new(1550, 2));
        assert_eq!(second.summary.active_months, 2);

        stop.send(()).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(source.changes().subscribers(), 0);
    }

    #[tokio::test]
    async fn test_other_tables_are_ignored() {
        let source = Arc::new(MemorySource::new(Vec::new()));
        let (reports, mut received) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel::<()>();
        let refresh = RefreshLoop::new(source.clone(), TimeRange::All, Duration::from_secs(3600))
            .with_clock(today);
        let handle = tokio::spawn(refresh.run(
            move |report: &StatsReport| {
                let _ = reports.send(report.clone());
            },
            async move {
                let _ = stopped.await;
            },
        ));

        let first = timeout(WAIT, received.recv()).await.unwrap().unwrap();
        assert!(first.is_empty());
        source.changes().publish(Change::new(
            crate::source::SAVINGS_GOALS,
            ChangeKind::Insert,
        ));
        assert!(timeout(QUIET, received.recv()).await.is_err());

        stop.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    struct Broken;

    #[async_trait::async_trait]
    impl ExpenseSource for Broken {
        async fn fetch_expenses(&self) -> Result<Vec<Expense>> {
            anyhow::bail!("the store is unavailable")
        }

        fn subscribe(&self) -> Subscription {
            crate::source::ChangeFeed::default().subscribe()
        }
    }

    #[tokio::test]
    async fn test_failed_reads_do_not_stop_the_loop() {
        let refresh = RefreshLoop::new(Arc::new(Broken), TimeRange::All, Duration::from_millis(10))
            .with_clock(today);
        let mut calls = 0;
        refresh
            .run(
                |_: &StatsReport| calls += 1,
                tokio::time::sleep(Duration::from_millis(100)),
            )
            .await
            .unwrap();
        assert_eq!(calls, 0);
    }

    /// Never announces its writes, and fails the first `failures` reads.
    struct Silent {
        expenses: Mutex<Vec<Expense>>,
        failures: AtomicUsize,
        changes: crate::source::ChangeFeed,
    }

    impl Silent {
        fn new(expenses: Vec<Expense>, failures: usize) -> Self {
            Self {
                expenses: Mutex::new(expenses),
                failures: AtomicUsize::new(failures),
                changes: crate::source::ChangeFeed::default(),
            }
        }
    }

    #[async_trait::async_trait]
    impl ExpenseSource for Silent {
        async fn fetch_expenses(&self) -> Result<Vec<Expense>> {
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                anyhow::bail!("the store is busy");
            }
            Ok(self.expenses.lock().await.clone())
        }

        fn subscribe(&self) -> Subscription {
            self.changes.subscribe()
        }
    }

    #[tokio::test]
    async fn test_unannounced_changes_are_picked_up_on_the_interval() {
        let source = Arc::new(Silent::new(
            vec![Expense::new("a", "2025-10-01", "10", None)],
            0,
        ));
        let (reports, mut received) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel::<()>();
        let refresh = RefreshLoop::new(source.clone(), TimeRange::All, Duration::from_millis(20))
            .with_clock(today);
        let handle = tokio::spawn(refresh.run(
            move |report: &StatsReport| {
                let _ = reports.send(report.clone());
            },
            async move {
                let _ = stopped.await;
            },
        ));

        let first = timeout(WAIT, received.recv()).await.unwrap().unwrap();
        assert_eq!(first.summary.total, Decimal::from(10));
        // Several ticks pass with identical data.
        assert!(timeout(QUIET, received.recv()).await.is_err());

        source
            .expenses
            .lock()
            .await
            .push(Expense::new("b", "2025-10-02", "7", None));
        let second = timeout(WAIT, received.recv()).await.unwrap().unwrap();
        assert_eq!(second.summary.total, Decimal::from(17));

        stop.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_reports_once_reads_recover() {
        let source = Arc::new(Silent::new(
            vec![Expense::new("a", "2025-10-01", "3", Some(String::from("Tea")))],
            3,
        ));
        let (reports, mut received) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel::<()>();
        let refresh = RefreshLoop::new(source.clone(), TimeRange::All, Duration::from_millis(20))
            .with_clock(today);
        let handle = tokio::spawn(refresh.run(
            move |report: &StatsReport| {
                let _ = reports.send(report.clone());
            },
            async move {
                let _ = stopped.await;
            },
        ));

        let first = timeout(WAIT, received.recv()).await.unwrap().unwrap();
        assert_eq!(first.summary.total, Decimal::from(3));
        assert_eq!(source.failures.load(Ordering::SeqCst), 0);
        assert!(timeout(QUIET, received.recv()).await.is_err());

        stop.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
