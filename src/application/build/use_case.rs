//! Build Use Case
//!
//! Runs rounds of (detect, compile, mirror) for every enabled pack. Packs in
//! a round run concurrently on scoped threads and fail independently. In
//! watch mode the use case owns one watcher per pack and a debounce loop
//! that triggers further rounds.

use std::collections::BTreeMap;
use std::fs;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, info_span, warn};

use crate::application::cancel::CancellationToken;
use crate::application::compile::{CycleReport, PackCompiler};
use crate::application::detect::detect_changes;
use crate::application::watch::{Debouncer, PackWatcher, DEBOUNCE_MS, POLL_INTERVAL_MS};
use crate::config::{BuildConfig, PackConfig};
use crate::domain::entities::PackCache;
use crate::domain::ports::{ArchiveSource, Archiver, ScriptBundler};
use crate::domain::value_objects::{PackFilter, PackKind};
use crate::error::{PacksmithError, PacksmithResult};
use crate::infrastructure::fs::{mirror_dir, remove_dir_if_exists};

use super::outcome::{BuildPhase, BuildSummary, PackOutcome, RoundReport};

/// A pack with its compiled filter
pub(super) struct PackUnit {
    pack: PackConfig,
    filter: PackFilter,
}

impl PackUnit {
    pub(super) fn kind(&self) -> PackKind {
        self.pack.kind()
    }
}

/// Build use case - initial compile, optional watch loop, archiving
pub struct BuildUseCase<B, A>
where
    B: ScriptBundler,
    A: Archiver,
{
    config: BuildConfig,
    bundler: B,
    archiver: A,
    token: CancellationToken,
    phase: Mutex<BuildPhase>,
    debounce: Duration,
}

impl<B, A> BuildUseCase<B, A>
where
    B: ScriptBundler,
    A: Archiver,
{
    pub fn new(config: BuildConfig, bundler: B, archiver: A, token: CancellationToken) -> Self {
        Self {
            config,
            bundler,
            archiver,
            token,
            phase: Mutex::new(BuildPhase::Idle),
            debounce: Duration::from_millis(DEBOUNCE_MS),
        }
    }

    /// Override the debounce quiet window
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    pub fn phase(&self) -> BuildPhase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    fn set_phase(&self, phase: BuildPhase) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = phase;
        debug!(?phase, "build phase");
    }

    /// Run the build.
    ///
    /// Per-pack failures are reported in the summary, not as `Err`. Only
    /// configuration errors and watcher start-up failures are returned.
    pub fn build(&self) -> PacksmithResult<BuildSummary> {
        let units = self.units()?;
        let started = Instant::now();
        let mut caches: BTreeMap<PackKind, PackCache> = BTreeMap::new();
        let mut summary = BuildSummary::default();

        self.set_phase(BuildPhase::InitialCompile);
        info!("Starting build");
        let round = self.run_round(&units, &mut caches, true);
        let cancelled = self.finish_round(&units, round, &mut summary);
        info!("Initial build finished in {:.2?}", started.elapsed());

        if cancelled {
            summary.cancelled = true;
            self.set_phase(BuildPhase::Stopped);
            return Ok(summary);
        }
        if !self.config.watch {
            self.set_phase(BuildPhase::Idle);
            return Ok(summary);
        }

        self.watch(&units, &mut caches, &mut summary)?;
        summary.cancelled = self.token.is_cancelled();
        self.set_phase(BuildPhase::Stopped);
        Ok(summary)
    }

    /// Validate the config and compile every pack's filter
    pub(super) fn units(&self) -> PacksmithResult<Vec<PackUnit>> {
        self.config.validate()?;
        self.config
            .packs()
            .into_iter()
            .map(|pack| {
                let common = pack.common();
                let filter = PackFilter::new(&common.src_dir, &common.include, &common.exclude)?;
                Ok(PackUnit { pack, filter })
            })
            .collect()
    }

    fn watch(
        &self,
        units: &[PackUnit],
        caches: &mut BTreeMap<PackKind, PackCache>,
        summary: &mut BuildSummary,
    ) -> PacksmithResult<()> {
        let (tx, rx) = mpsc::channel();
        let mut watchers = Vec::with_capacity(units.len());
        for unit in units {
            match PackWatcher::start(unit.kind(), unit.filter.clone(), tx.clone()) {
                Ok(watcher) => watchers.push(watcher),
                Err(e) => {
                    watchers.into_iter().for_each(PackWatcher::close);
                    self.set_phase(BuildPhase::Stopped);
                    return Err(e);
                }
            }
        }
        drop(tx);

        self.set_phase(BuildPhase::Watching);
        info!("Watching for changes (Ctrl+C to stop)");

        let poll = Duration::from_millis(POLL_INTERVAL_MS);
        let mut debouncer = Debouncer::with_window(self.debounce);

        while !self.token.is_cancelled() {
            match rx.recv_timeout(poll) {
                Ok(notification) => {
                    debug!(pack = %notification.pack, "changed: {}", notification.path.display());
                    debouncer.record(notification.path);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("all watchers stopped");
                    break;
                }
            }

            if !debouncer.is_ready() {
                continue;
            }

            let changed = debouncer.take();
            info!("{} path(s) changed, rebuilding", changed.len());
            self.set_phase(BuildPhase::Rebuilding);
            let round = self.run_round(units, caches, false);
            if self.finish_round(units, round, summary) {
                break;
            }
            self.set_phase(BuildPhase::Watching);

            // Notifications from during the rebuild open one fresh window
            for notification in rx.try_iter() {
                debouncer.record(notification.path);
            }
        }

        for watcher in watchers {
            watcher.close();
        }
        Ok(())
    }

    /// Record the round, archive if it wasn't cancelled. Returns whether the
    /// build should stop.
    fn finish_round(
        &self,
        units: &[PackUnit],
        round: RoundReport,
        summary: &mut BuildSummary,
    ) -> bool {
        let cancelled = round.was_cancelled() || self.token.is_cancelled();
        if !cancelled {
            self.write_archives(units);
        }
        summary.rounds += 1;
        summary.last_round = Some(round);
        cancelled
    }

    /// Run every pack once, concurrently. Caches advance only for packs that
    /// succeeded.
    pub(super) fn run_round(
        &self,
        units: &[PackUnit],
        caches: &mut BTreeMap<PackKind, PackCache>,
        clean: bool,
    ) -> RoundReport {
        let empty = PackCache::new();
        let previous_caches: &BTreeMap<PackKind, PackCache> = caches;

        let results: Vec<(PackKind, PacksmithResult<CycleReport>)> = std::thread::scope(|s| {
            let handles: Vec<_> = units
                .iter()
                .map(|unit| {
                    let previous = previous_caches.get(&unit.kind()).unwrap_or(&empty);
                    (unit.kind(), s.spawn(move || self.run_pack(unit, previous, clean)))
                })
                .collect();

            handles
                .into_iter()
                .map(|(kind, handle)| {
                    let result = handle
                        .join()
                        .unwrap_or_else(|payload| Err(PacksmithError::from_panic(payload)));
                    (kind, result)
                })
                .collect()
        });

        let mut round = RoundReport::default();
        for (kind, result) in results {
            let outcome = match result {
                Ok(report) => {
                    caches.insert(kind, report.cache);
                    PackOutcome::Succeeded(report.summary)
                }
                Err(e) if e.is_cancelled() => {
                    warn!(pack = %kind, "Build aborted");
                    PackOutcome::Cancelled
                }
                Err(e) => {
                    error!(pack = %kind, "Build failed: {e}");
                    PackOutcome::Failed(e)
                }
            };
            round.set(kind, outcome);
        }
        round
    }

    fn run_pack(
        &self,
        unit: &PackUnit,
        previous: &PackCache,
        clean: bool,
    ) -> PacksmithResult<CycleReport> {
        let span = match unit.kind() {
            PackKind::Behavior => info_span!("behavior_pack"),
            PackKind::Resource => info_span!("resource_pack"),
        };
        let _enter = span.enter();

        self.token.check()?;
        let out_dir = unit.pack.out_dir();
        if clean {
            remove_dir_if_exists(out_dir)?;
        }
        fs::create_dir_all(out_dir).map_err(|e| PacksmithError::io_at(out_dir, e))?;

        info!("Compiling...");
        let started = Instant::now();
        let detection = detect_changes(&unit.filter, previous, &self.token)?;
        let report = PackCompiler::new(&unit.pack, &self.bundler).compile(
            detection.changes,
            detection.cache,
            &self.token,
        )?;

        for target in &unit.pack.common().target_dirs {
            let stats = mirror_dir(out_dir, target, &self.token)?;
            if stats.copied + stats.removed > 0 {
                info!(
                    copied = stats.copied,
                    removed = stats.removed,
                    "Updated {}",
                    target.display()
                );
            }
        }

        info!("Compiled in {:.2?}", started.elapsed());
        Ok(report)
    }

    fn write_archives(&self, units: &[PackUnit]) {
        if self.config.archives.is_empty() {
            return;
        }

        let sources: Vec<ArchiveSource> = units
            .iter()
            .map(|unit| ArchiveSource {
                root_name: unit.kind().label().to_string(),
                dir: unit.pack.out_dir().to_path_buf(),
            })
            .collect();

        for archive in &self.config.archives {
            if self.token.is_cancelled() {
                warn!("Archiving aborted");
                return;
            }
            match self
                .archiver
                .create_archive(&sources, &archive.out_file, &self.token)
            {
                Ok(report) => {
                    for warning in &report.warnings {
                        warn!("{warning}");
                    }
                    info!(
                        entries = report.entries,
                        bytes = report.bytes,
                        "Archive written to {}",
                        archive.out_file.display()
                    );
                }
                Err(e) if e.is_cancelled() => {
                    warn!("Archiving aborted");
                    return;
                }
                Err(e) => error!("Failed to write {}: {e}", archive.out_file.display()),
            }
        }
    }
}
