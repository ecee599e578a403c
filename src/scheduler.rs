use std::future::Future;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::Instrument;

use crate::config::Timing;
use crate::display::DisplaySink;
use crate::error::CounterError;
use crate::system::counters::{CounterSample, CounterSampler};
use crate::system::delta::compute_utilization;
use crate::system::dynamic::DynamicMetricsFetcher;
use crate::system::facts::StaticFactsCache;
use crate::system::snapshot::Snapshot;
use crate::ui::{self, RenderOptions};

/// Where a report cycle currently is. One cycle walks the states in order
/// and ends back at `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    SamplingA,
    Waiting,
    SamplingB,
    Aggregating,
    Rendering,
    Displaying,
}

#[derive(Debug, Clone)]
pub enum Presentation {
    Text(RenderOptions),
    Json,
}

pub struct ReportScheduler {
    sampler: Box<dyn CounterSampler>,
    facts: StaticFactsCache,
    fetcher: DynamicMetricsFetcher,
    sink: Box<dyn DisplaySink>,
    presentation: Presentation,
    timing: Timing,
    state: CycleState,
    cycles: u64,
}

impl ReportScheduler {
    pub fn new(
        sampler: Box<dyn CounterSampler>,
        facts: StaticFactsCache,
        fetcher: DynamicMetricsFetcher,
        sink: Box<dyn DisplaySink>,
    ) -> Self {
        ReportScheduler {
            sampler,
            facts,
            fetcher,
            sink,
            presentation: Presentation::Text(RenderOptions::default()),
            timing: Timing::default(),
            state: CycleState::Idle,
            cycles: 0,
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    fn enter(&mut self, state: CycleState) {
        tracing::trace!(from = ?self.state, to = ?state, "cycle state");
        self.state = state;
    }

    fn sample(&mut self) -> Result<CounterSample, CounterError> {
        self.sampler.sample().inspect_err(|err| {
            tracing::warn!(error = %err, code = ?err.code(), "counter read failed, skipping cycle");
            self.state = CycleState::Idle;
        })
    }

    /// Runs one full cycle and returns the snapshot it displayed.
    ///
    /// A failed counter read ends the cycle early with no output.
    pub async fn run_cycle(&mut self) -> Result<Snapshot, CounterError> {
        self.cycles += 1;
        let span = tracing::debug_span!("report_cycle", cycle = self.cycles);
        self.cycle_inner().instrument(span).await
    }

    async fn cycle_inner(&mut self) -> Result<Snapshot, CounterError> {
        self.enter(CycleState::SamplingA);
        let a = self.sample()?;

        self.enter(CycleState::Waiting);
        time::sleep(self.timing.sample_delay).await;

        self.enter(CycleState::SamplingB);
        let b = self.sample()?;

        self.enter(CycleState::Aggregating);
        let utilization = compute_utilization(&a, &b);
        let facts = self.facts.read();
        let dynamic = self.fetcher.fetch().await;
        let snapshot = Snapshot {
            utilization,
            facts,
            dynamic,
        };

        self.enter(CycleState::Rendering);
        let text = match &self.presentation {
            Presentation::Text(options) => Some(ui::render(&snapshot, options)),
            Presentation::Json => serde_json::to_string(&snapshot)
                .inspect_err(|err| tracing::warn!(error = %err, "failed to encode snapshot"))
                .ok(),
        };

        if let Some(text) = text {
            self.enter(CycleState::Displaying);
            if let Err(err) = self.sink.display(&text) {
                tracing::warn!(error = %err, "failed to write report");
            }
        }

        self.enter(CycleState::Idle);
        Ok(snapshot)
    }

    /// Runs cycles every period until `shutdown` resolves. Ticks missed while
    /// a cycle is still running collapse into one tick that fires as soon as
    /// the cycle ends, so slow cycles run back to back and never overlap.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        if self.timing.sample_delay >= self.timing.period {
            tracing::warn!(
                period_ms = self.timing.period.as_millis() as u64,
                sample_delay_ms = self.timing.sample_delay.as_millis() as u64,
                "sample delay is not shorter than the period; cycles will run back to back"
            );
        }

        let mut ticker = time::interval(self.timing.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    // a skipped cycle is already logged
                    let _ = self.run_cycle().await;
                }
            }
        }
        tracing::debug!(cycles = self.cycles, "report loop stopped");
    }
}

/// Handle to a spawned report loop. Dropping it aborts the loop.
pub struct ReportLoop {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ReportLoop {
    pub fn spawn(scheduler: ReportScheduler) -> Self {
        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(scheduler.run(async move {
            let _ = rx.await;
        }));
        ReportLoop {
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    /// Cancels the running loop, then arms `scheduler` in its place.
    pub fn restart(&mut self, scheduler: ReportScheduler) {
        self.abort();
        *self = ReportLoop::spawn(scheduler);
    }

    pub fn abort(&mut self) {
        self.shutdown = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// Asks the loop to stop and waits for the in-flight cycle to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take()
            && let Err(err) = task.await
            && !err.is_cancelled()
        {
            tracing::error!(error = %err, "report loop panicked");
        }
    }
}

impl Drop for ReportLoop {
    fn drop(&mut self) {
        self.abort();
    }
}
