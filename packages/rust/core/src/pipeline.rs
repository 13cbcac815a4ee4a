//! End-to-end `generate` pipeline: site → strategy fallback → artifacts.
//!
//! Strategies run in priority order as an explicit state machine:
//!
//! ```text
//! TryExisting ─miss─▶ TryRepo ─miss─▶ TryCrawl ─miss─▶ Failed
//!      │                 │               │  (or disabled)
//!      └─────found───────┴─────found─────┴──────▶ Done
//! ```
//!
//! A miss is either "not applicable" or a strategy-level failure; both are
//! recorded in `metadata.json` and fall through to the next strategy.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use docsift_fetch::{FetchOptions, Fetcher};
use docsift_shared::canonical::slug_for_url;
use docsift_shared::{
    AttemptOutcome, DocsiftError, Result, RunConfig, RunMetadata, Site, Strategy, StrategyAttempt,
};
use tracing::{info, instrument, warn};

use crate::assembler::{write_failure, write_outputs};
use crate::convert::ContentConverter;
use crate::strategies::{self, Generated, Outcome, StrategyContext};

/// Recorded as `generator` in run metadata.
pub const GENERATOR: &str = concat!("docsift ", env!("CARGO_PKG_VERSION"));

/// Result of one `generate` run.
///
/// A run that exhausted every strategy still returns `Ok`: its metadata has
/// been written and `failure` carries the terminal error.
#[derive(Debug)]
pub struct RunReport {
    /// `<out_dir>/<slug>`.
    pub site_dir: PathBuf,
    pub metadata: RunMetadata,
    pub failure: Option<DocsiftError>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Progress callback for the pipeline (used by the CLI spinner).
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each strategy attempt.
    fn strategy_finished(&self, attempt: &StrategyAttempt);
    /// Called when the pipeline completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn strategy_finished(&self, _attempt: &StrategyAttempt) {}
    fn done(&self, _report: &RunReport) {}
}

enum State {
    TryExisting,
    TryRepo,
    TryCrawl,
    Done(Box<Generated>),
    Failed,
}

/// Run the full pipeline for `site`.
///
/// Errors are returned only for invalid configuration or when the output
/// directory cannot be written.
#[instrument(skip_all, fields(site = %site, out = %config.out_dir.display()))]
pub async fn generate(
    site: &Site,
    config: &RunConfig,
    progress: &dyn ProgressReporter,
) -> Result<RunReport> {
    config.validate()?;
    let start = Instant::now();

    let fetcher = Fetcher::new(&FetchOptions::from(config))?;
    let ctx = StrategyContext {
        site,
        config,
        converter: ContentConverter::from_config(fetcher.clone(), config),
        fetcher,
        site_dir: config.out_dir.join(slug_for_url(&site.base_url)),
        progress,
    };
    let mut metadata = RunMetadata::new(site, GENERATOR);
    info!(run_id = %metadata.run_id, dir = %ctx.site_dir.display(), "starting generate pipeline");

    let mut state = State::TryExisting;
    let generated = loop {
        state = match state {
            State::TryExisting => {
                let outcome = strategies::from_existing(&ctx).await;
                settle(Strategy::ExistingLlms, outcome, &mut metadata, progress, State::TryRepo)
            }
            State::TryRepo => {
                let outcome = strategies::from_repo(&ctx).await;
                settle(Strategy::Repo, outcome, &mut metadata, progress, State::TryCrawl)
            }
            State::TryCrawl if config.no_crawl => {
                record(
                    &mut metadata,
                    progress,
                    StrategyAttempt {
                        strategy: Strategy::SitemapOrCrawl,
                        outcome: AttemptOutcome::Disabled,
                        detail: Some("crawling disabled".to_string()),
                    },
                );
                State::Failed
            }
            State::TryCrawl => {
                let outcome = strategies::from_sitemap_or_crawl(&ctx).await;
                settle(Strategy::SitemapOrCrawl, outcome, &mut metadata, progress, State::Failed)
            }
            State::Done(generated) => break Some(generated),
            State::Failed => break None,
        };
    };

    progress.phase("Writing artifacts");
    let failure = match generated {
        Some(generated) => {
            write_outputs(&ctx.site_dir, &generated, &mut metadata)?;
            None
        }
        None => {
            let error = exhausted(&metadata.attempts);
            warn!(error = %error, "no strategy produced artifacts");
            write_failure(&ctx.site_dir, &error, &mut metadata)?;
            Some(error)
        }
    };

    let report = RunReport {
        site_dir: ctx.site_dir,
        metadata,
        failure,
        elapsed: start.elapsed(),
    };
    info!(
        method = report.metadata.method.as_deref().unwrap_or("-"),
        ok = report.succeeded(),
        elapsed_ms = report.elapsed.as_millis() as u64,
        "generate pipeline complete"
    );
    progress.done(&report);
    Ok(report)
}

/// Record a strategy's outcome and pick the next state.
fn settle(
    strategy: Strategy,
    outcome: Outcome,
    metadata: &mut RunMetadata,
    progress: &dyn ProgressReporter,
    on_miss: State,
) -> State {
    let (attempt, next) = match outcome {
        Outcome::Found(generated) => (
            StrategyAttempt {
                strategy,
                outcome: AttemptOutcome::Found,
                detail: Some(generated.method.to_string()),
            },
            State::Done(Box::new(generated)),
        ),
        Outcome::NotApplicable(reason) => {
            info!(%strategy, %reason, "strategy not applicable");
            (
                StrategyAttempt {
                    strategy,
                    outcome: AttemptOutcome::NotApplicable,
                    detail: Some(reason),
                },
                on_miss,
            )
        }
        Outcome::Failed(e) => {
            warn!(%strategy, error = %e, "strategy failed");
            (
                StrategyAttempt {
                    strategy,
                    outcome: AttemptOutcome::Failed,
                    detail: Some(e.to_string()),
                },
                on_miss,
            )
        }
    };
    record(metadata, progress, attempt);
    next
}

fn record(metadata: &mut RunMetadata, progress: &dyn ProgressReporter, attempt: StrategyAttempt) {
    progress.strategy_finished(&attempt);
    metadata.attempts.push(attempt);
}

fn exhausted(attempts: &[StrategyAttempt]) -> DocsiftError {
    DocsiftError::AllStrategiesExhausted {
        attempts: attempts
            .iter()
            .map(|a| {
                let cause = a.detail.clone().unwrap_or_else(|| format!("{:?}", a.outcome));
                (a.strategy.name().to_string(), cause)
            })
            .collect(),
    }
}
