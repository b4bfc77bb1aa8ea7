//! Random algorithm scenario - virtual users hammer random algorithm endpoints

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use uuid::Uuid;

use crate::cli::RunArgs;
use crate::config::get_load_profile;
use crate::corpus::AlgorithmCorpus;
use crate::driver::ScenarioDriver;
use crate::error::ConfigError;
use crate::metrics::collector::MetricsCollector;
use crate::metrics::reporter;
use crate::metrics::summary::RunSummary;

/// How many virtual users run, and when they stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub vus: usize,
    /// `None` means no time limit; the iteration budget must then be set
    pub duration: Option<Duration>,
    pub graceful_stop: Duration,
    pub iterations: Option<u64>,
    pub seed: Option<u64>,
}

impl RunPlan {
    pub fn new(
        vus: usize,
        duration: Option<Duration>,
        graceful_stop: Duration,
        iterations: Option<u64>,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if vus == 0 {
            return Err(ConfigError::NoVirtualUsers);
        }
        let duration = duration.filter(|d| !d.is_zero());
        if duration.is_none() && iterations.is_none() {
            return Err(ConfigError::NoStopCondition);
        }

        Ok(Self {
            vus,
            duration,
            graceful_stop,
            iterations,
            seed,
        })
    }

    /// Resolve CLI overrides on top of the selected load profile.
    pub fn from_args(args: &RunArgs) -> Result<Self, ConfigError> {
        let profile = get_load_profile(&args.profile);
        tracing::debug!("Using '{}' load profile", profile.name);
        let duration = args
            .duration
            .map(Duration::from_secs)
            .unwrap_or(profile.duration);
        let graceful_stop = args
            .graceful_stop
            .map(Duration::from_secs)
            .unwrap_or(profile.graceful_stop);

        Self::new(
            args.vus.unwrap_or(profile.vus),
            Some(duration),
            graceful_stop,
            args.iterations,
            args.seed,
        )
    }

    fn rng_for(&self, vu: usize) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(vu as u64)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Iterations shared by all virtual users.
#[derive(Debug)]
pub struct IterationBudget {
    remaining: AtomicU64,
}

impl IterationBudget {
    pub fn new(total: u64) -> Self {
        Self {
            remaining: AtomicU64::new(total),
        }
    }

    /// Take one iteration from the budget; false once it is exhausted.
    pub fn try_claim(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Iterations finished, including those of virtual users aborted later
    pub iterations: u64,
    /// Virtual users aborted mid-iteration
    pub interrupted_vus: usize,
    /// Stopped by the shutdown signal
    pub cancelled: bool,
}

pub async fn run(args: RunArgs) -> Result<()> {
    tracing::info!("Starting random algorithm scenario");

    let plan = RunPlan::from_args(&args)?;
    let algorithms = args.corpus.selected_algorithms();

    let corpus = AlgorithmCorpus::load(&args.corpus.requests_dir, &algorithms)
        .context("Failed to load algorithm requests")?;
    tracing::info!(
        "Loaded {} test cases for {} algorithms from {}",
        corpus.total_cases(),
        corpus.algorithm_count(),
        args.corpus.requests_dir.display()
    );

    // Setup metrics collector
    let collector = MetricsCollector::new();
    let driver = Arc::new(ScenarioDriver::new(
        Arc::new(corpus),
        &args.base_url,
        Duration::from_secs(args.timeout),
        collector.clone(),
    )?);

    let run_id = Uuid::new_v4();
    let started_at = Utc::now();

    tracing::info!("Run ID: {}", run_id);
    tracing::info!("  Base URL: {}", driver.base_url());
    tracing::info!("  Profile: {}", args.profile);
    tracing::info!("  Virtual Users: {}", plan.vus);
    match plan.duration {
        Some(duration) => tracing::info!("  Duration: {}s", duration.as_secs()),
        None => tracing::info!("  Duration: unlimited"),
    }
    if let Some(iterations) = plan.iterations {
        tracing::info!("  Iterations: {}", iterations);
    }
    tracing::info!("  Request Timeout: {}s", args.timeout);

    // Start periodic metrics reporter
    let reporter_handle = (args.report_interval > 0).then(|| {
        let collector_clone = collector.clone();
        let interval_secs = args.report_interval;
        tokio::spawn(async move {
            reporter::start_periodic_reporter(collector_clone, interval_secs).await;
        })
    });

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let outcome = run_virtual_users(driver.clone(), &plan, shutdown).await;

    if let Some(handle) = reporter_handle {
        handle.abort();
    }

    if outcome.cancelled {
        tracing::warn!("Load test cancelled");
    }
    if outcome.interrupted_vus > 0 {
        tracing::warn!(
            "{} virtual users were interrupted mid-iteration",
            outcome.interrupted_vus
        );
    }

    // Print final report
    collector.update_system_metrics();
    reporter::print_final_report(&collector);

    if let Some(path) = &args.summary_export {
        RunSummary::capture(run_id, started_at, driver.base_url(), plan.vus, &collector)
            .write_json(path)?;
        tracing::info!("Summary written to {}", path.display());
    }

    Ok(())
}

/// Run the plan's virtual users until every one stops or `shutdown` resolves.
///
/// Once the duration elapses no new iterations start; iterations still in
/// flight get `graceful_stop` to finish before their virtual user is aborted.
pub async fn run_virtual_users<F>(
    driver: Arc<ScenarioDriver>,
    plan: &RunPlan,
    shutdown: F,
) -> RunOutcome
where
    F: Future<Output = ()>,
{
    let start = Instant::now();
    let deadline = plan.duration.map(|d| start + d);
    let hard_stop = deadline.map(|d| d + plan.graceful_stop);
    let budget = plan.iterations.map(|n| Arc::new(IterationBudget::new(n)));
    let completed = Arc::new(AtomicU64::new(0));

    tracing::info!(
        "Starting {} virtual users across {} algorithms",
        plan.vus,
        driver.corpus().algorithm_count()
    );

    let mut users = JoinSet::new();
    for vu in 0..plan.vus {
        users.spawn(virtual_user(
            vu,
            driver.clone(),
            plan.rng_for(vu),
            deadline,
            budget.clone(),
            completed.clone(),
        ));
    }

    let mut outcome = RunOutcome::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            joined = users.join_next() => match joined {
                Some(Ok(())) => {}
                Some(Err(e)) => tracing::error!("Virtual user task failed: {}", e),
                None => break,
            },
            _ = wait_until(hard_stop) => {
                tracing::warn!(
                    "Graceful stop of {}s expired, interrupting {} virtual users",
                    plan.graceful_stop.as_secs(),
                    users.len()
                );
                outcome.interrupted_vus = users.len();
                break;
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, stopping {} virtual users", users.len());
                outcome.interrupted_vus = users.len();
                outcome.cancelled = true;
                break;
            }
        }
    }

    users.shutdown().await;
    outcome.iterations = completed.load(Ordering::Acquire);

    tracing::info!(
        "Virtual users finished: {} iterations in {:.1}s",
        outcome.iterations,
        start.elapsed().as_secs_f64()
    );
    outcome
}

async fn virtual_user(
    vu: usize,
    driver: Arc<ScenarioDriver>,
    mut rng: StdRng,
    deadline: Option<Instant>,
    budget: Option<Arc<IterationBudget>>,
    completed: Arc<AtomicU64>,
) {
    let mut iterations = 0u64;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if let Some(budget) = &budget {
            if !budget.try_claim() {
                break;
            }
        }

        driver.run_iteration(&mut rng).await;
        iterations += 1;
        completed.fetch_add(1, Ordering::AcqRel);
    }

    tracing::debug!("Virtual user {} finished after {} iterations", vu, iterations);
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
