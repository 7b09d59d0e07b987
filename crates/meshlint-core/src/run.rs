//! The runner: executes selected checks against an enumerated scene and
//! aggregates their results.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use meshlint_domain::{Check, CheckFn};
use meshlint_scene::{SceneEnumerator, SceneError, SceneSource};
use meshlint_types::{
    AggregateResult, Backend, CheckFailure, CheckResult, FailureKind, ProgressUpdate,
    SceneBackend, TimingMetrics,
};
use tracing::{debug, info, warn};

use crate::merge::merge_results;
use crate::receipt::SceneNames;
use crate::shape::normalise;

/// Cooperative cancellation flag, checked by the runner between checks.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("cannot enumerate the {backend} scene of '{label}'")]
    Enumeration {
        backend: SceneBackend,
        label: String,
        #[source]
        source: SceneError,
    },
}

type ProgressSink<'s> = Box<dyn FnMut(ProgressUpdate) + 's>;

/// Runs checks against the scenes of one source.
///
/// Every backend the run needs is opened before the first check; after that
/// only per-check failures are possible, and they are recorded rather than
/// returned.
pub struct Runner<'s> {
    source: &'s dyn SceneSource,
    progress: Option<ProgressSink<'s>>,
    cancel: Option<CancelToken>,
}

impl<'s> Runner<'s> {
    pub fn new(source: &'s dyn SceneSource) -> Self {
        Self {
            source,
            progress: None,
            cancel: None,
        }
    }

    /// Called after every selected check, including skipped and failed ones.
    pub fn with_progress(mut self, sink: impl FnMut(ProgressUpdate) + 's) -> Self {
        self.progress = Some(Box::new(sink));
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    fn open_scenes(
        &self,
        backend: Backend,
    ) -> Result<Vec<Box<dyn SceneEnumerator + 's>>, RunError> {
        let source = self.source;
        backend
            .scene_backends()
            .iter()
            .map(|&sb| {
                source.open(sb).map_err(|e| RunError::Enumeration {
                    backend: sb,
                    label: source.label(),
                    source: e,
                })
            })
            .collect()
    }

    /// Execute `checks` in the given order.
    ///
    /// Checks without an entry point for any of the run's backends are skipped
    /// and appear neither in `results` nor in `errors`. Under `Backend::Both`
    /// a check runs once per supported backend and the results are merged
    /// under its name.
    pub fn run(&mut self, backend: Backend, checks: &[Check]) -> Result<AggregateResult, RunError> {
        self.run_with_names(backend, checks).map(|(agg, _)| agg)
    }

    /// Like [`Runner::run`], handing back the enumerated scenes as a name
    /// lookup for reporting.
    pub fn run_with_names(
        &mut self,
        backend: Backend,
        checks: &[Check],
    ) -> Result<(AggregateResult, SceneNames<'s>), RunError> {
        let started = Instant::now();
        let scenes = self.open_scenes(backend)?;
        let enumerate_ms = started.elapsed().as_millis() as u64;

        let entity_counts: Vec<u32> = scenes
            .iter()
            .map(|s| s.entities(false).len() as u32)
            .collect();

        let mut agg = AggregateResult::empty(backend);
        agg.entities_considered = entity_counts.iter().sum();

        let checks_started = Instant::now();
        let total = checks.len() as u32;
        for (done, check) in checks.iter().enumerate() {
            if self.is_cancelled() {
                info!(remaining = checks.len() - done, "run cancelled");
                agg.cancelled = true;
                break;
            }

            let mut executed_entities: Option<u32> = None;
            let mut merged: Option<CheckResult> = None;
            let mut failure: Option<CheckFailure> = None;

            for (scene, &count) in scenes.iter().zip(&entity_counts) {
                let Some(entry) = check.entry(scene.backend()) else {
                    debug!(check = check.name, backend = %scene.backend(), "backend not supported; skipping");
                    continue;
                };
                debug!(check = check.name, backend = %scene.backend(), "dispatching");
                *executed_entities.get_or_insert(0) += count;

                match invoke(check, entry, scene.as_ref()) {
                    Ok(result) => {
                        merged = match merged.take() {
                            None => Some(result),
                            Some(prev) => match merge_results(prev, result) {
                                Some(m) => Some(m),
                                None => {
                                    failure = Some(CheckFailure {
                                        kind: FailureKind::InvalidResult,
                                        message: "backends returned different result shapes"
                                            .to_string(),
                                    });
                                    break;
                                }
                            },
                        };
                    }
                    Err(f) => {
                        failure = Some(f);
                        break;
                    }
                }
            }

            if let Some(f) = failure {
                warn!(check = check.name, kind = f.kind.as_str(), message = %f.message, "check failed");
                agg.errors.insert(check.name.to_string(), f);
            } else if let Some(result) = merged {
                agg.results.insert(check.name.to_string(), result);
            }

            agg.progress = ProgressUpdate {
                checks_total: total,
                checks_done: done as u32 + 1,
                entities_total: executed_entities,
                entities_done: executed_entities,
            };
            if let Some(sink) = self.progress.as_mut() {
                sink(agg.progress);
            }
        }

        agg.timing = Some(TimingMetrics {
            total_ms: started.elapsed().as_millis() as u64,
            enumerate_ms,
            checks_ms: checks_started.elapsed().as_millis() as u64,
        });

        info!(
            backend = backend.as_str(),
            checks = agg.progress.checks_done,
            failing = agg.failing_checks().count(),
            errors = agg.errors.len(),
            "run complete"
        );
        Ok((agg, SceneNames::from_scenes(scenes)))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "check panicked with a non-string payload".to_string()
    }
}

/// Call one entry point, containing panics and holding the result to the
/// check's declared shape.
fn invoke(check: &Check, entry: CheckFn, scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckFailure> {
    let result = match panic::catch_unwind(AssertUnwindSafe(|| entry(scene))) {
        Ok(Ok(result)) => result,
        Ok(Err(e)) => {
            return Err(CheckFailure {
                kind: FailureKind::Failed,
                message: e.to_string(),
            });
        }
        Err(payload) => {
            return Err(CheckFailure {
                kind: FailureKind::Panicked,
                message: panic_message(payload.as_ref()),
            });
        }
    };
    normalise(check.entity_kind, scene.backend(), result).map_err(|e| CheckFailure {
        kind: FailureKind::InvalidResult,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use meshlint_domain::{BackendTable, CheckError};
    use meshlint_testkit::{MeshBuilder, NodeBuilder, SceneBuilder, sample_scenes};
    use meshlint_types::{CATEGORY_GENERAL, EntityKind, ResultShape};

    fn roots(scene: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
        Ok(CheckResult::Nodes {
            entities: scene.entities(true),
        })
    }

    fn fails(_: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
        Err(CheckError::Other("backend query failed".to_string()))
    }

    fn panics(_: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
        panic!("index out of bounds")
    }

    fn nodes_for_faces(_: &dyn SceneEnumerator) -> Result<CheckResult, CheckError> {
        Ok(CheckResult::empty(ResultShape::Nodes))
    }

    fn check(name: &'static str, kind: EntityKind, backends: BackendTable) -> Check {
        Check {
            name,
            label: name,
            category: CATEGORY_GENERAL,
            entity_kind: kind,
            description: "",
            backends,
        }
    }

    fn scene() -> meshlint_scene::SceneDocument {
        SceneBuilder::new()
            .node(
                NodeBuilder::new("a")
                    .mesh("aShape", MeshBuilder::cube().build())
                    .child(NodeBuilder::new("b").build())
                    .build(),
            )
            .build()
    }

    #[test]
    fn failures_are_recorded_by_kind() {
        let doc = scene();
        let checks = [
            check("ok", EntityKind::Node, BackendTable::both(roots)),
            check("err", EntityKind::Node, BackendTable::both(fails)),
            check("boom", EntityKind::Node, BackendTable::both(panics)),
            check("shape", EntityKind::Face, BackendTable::both(nodes_for_faces)),
        ];
        let agg = Runner::new(&doc).run(Backend::Native, &checks).unwrap();

        assert_eq!(agg.results.len(), 1);
        assert!(agg.results.contains_key("ok"));
        assert_eq!(agg.errors["err"].kind, FailureKind::Failed);
        assert_eq!(agg.errors["err"].message, "backend query failed");
        assert_eq!(agg.errors["boom"].kind, FailureKind::Panicked);
        assert_eq!(agg.errors["boom"].message, "index out of bounds");
        assert_eq!(agg.errors["shape"].kind, FailureKind::InvalidResult);
        assert_eq!(agg.entities_considered, 2);
        assert!(agg.timing.is_some());
    }

    #[test]
    fn missing_section_fails_the_whole_run() {
        let doc = scene();
        let checks = [check("ok", EntityKind::Node, BackendTable::both(roots))];
        let err = Runner::new(&doc).run(Backend::Both, &checks).unwrap_err();
        let RunError::Enumeration { backend, label, .. } = err;
        assert_eq!(backend, SceneBackend::Staged);
        assert_eq!(label, "<memory>");
    }

    #[test]
    fn progress_carries_entity_counters_only_for_executed_checks() {
        let doc = scene();
        let checks = [
            check("native", EntityKind::Node, BackendTable::native_only(roots)),
            check("staged", EntityKind::Node, BackendTable::staged_only(roots)),
        ];
        let seen = RefCell::new(Vec::new());
        let agg = Runner::new(&doc)
            .with_progress(|p| seen.borrow_mut().push(p))
            .run(Backend::Native, &checks)
            .unwrap();

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].entities_total, Some(2));
        assert_eq!(seen[1].entities_total, None);
        assert_eq!(seen[1].checks_done, 2);
        assert_eq!(agg.progress, seen[1]);
        assert!(!agg.results.contains_key("staged"));
        assert!(!agg.errors.contains_key("staged"));
    }

    #[test]
    fn cancellation_stops_between_checks() {
        let doc = sample_scenes::clean();
        let checks: Vec<Check> = (0..5)
            .map(|_| check("roots", EntityKind::Node, BackendTable::both(roots)))
            .enumerate()
            .map(|(i, mut c)| {
                c.name = ["c0", "c1", "c2", "c3", "c4"][i];
                c
            })
            .collect();
        let token = CancelToken::new();
        let trigger = token.clone();
        let agg = Runner::new(&doc)
            .with_cancel(token)
            .with_progress(move |p| {
                if p.checks_done == 2 {
                    trigger.cancel();
                }
            })
            .run(Backend::Native, &checks)
            .unwrap();

        assert!(agg.cancelled);
        assert_eq!(agg.results.keys().collect::<Vec<_>>(), vec!["c0", "c1"]);
        assert_eq!(agg.progress.checks_done, 2);
        assert_eq!(agg.progress.checks_total, 5);
    }

    /// Counts how often each representation is enumerated.
    struct CountingSource {
        doc: meshlint_scene::SceneDocument,
        opened: std::cell::Cell<u32>,
    }

    impl SceneSource for CountingSource {
        fn label(&self) -> String {
            "counting".to_string()
        }

        fn open(
            &self,
            backend: SceneBackend,
        ) -> Result<Box<dyn SceneEnumerator + '_>, SceneError> {
            self.opened.set(self.opened.get() + 1);
            self.doc.open(backend)
        }
    }

    #[test]
    fn names_come_from_the_scenes_the_run_enumerated() {
        let source = CountingSource {
            doc: sample_scenes::clean(),
            opened: std::cell::Cell::new(0),
        };
        let checks = [check("roots", EntityKind::Node, BackendTable::both(roots))];
        let (agg, names) = Runner::new(&source)
            .run_with_names(Backend::Both, &checks)
            .unwrap();

        assert_eq!(source.opened.get(), 2);
        let resolved: Vec<String> = agg.results["roots"]
            .entities()
            .iter()
            .map(|id| names.resolve(id))
            .collect();
        assert_eq!(resolved, vec!["|grp_body", "/grp_body"]);
    }

    #[test]
    fn panic_payload_messages() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(
            panic_message(&42u8),
            "check panicked with a non-string payload"
        );
    }
}
