//! Multi-phase submission coordinator.
//!
//! Per batch of description sources: parse into jobs, create job records
//! remotely, stage local input files, finalize the (possibly rewritten)
//! descriptions, and convert every job to an outcome. Phase-local failures
//! are captured into the outcomes and never escape; an interrupt stops new
//! work at the next checkpoint without dropping any tracked job.

use std::fs;
use std::path::PathBuf;

use gridspool_desc::{parse, unparse, AttrValue, Description};
use gridspool_protocol::{CreateJob, FinalizeJob};

use crate::outcome::{JobOutcome, SubmissionReport};
use crate::service::{self, JobService};
use crate::signal::{Interrupted, InterruptGuard};
use crate::staging::{classify_source, FileRef, SharedStore};

/// Default number of description sources per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Phase of a job inside the submission protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobPhase {
    Pending,
    Created,
    Staged,
    Finalized,
    Failed,
}

/// One unit of submission work.
///
/// The cleanup flag is set the moment create succeeds and cleared only when
/// finalize succeeds; in between, the job has a remote footprint that must
/// be cancelled if submission does not complete.
#[derive(Debug)]
struct Job {
    source: String,
    desc: Description,
    clusterlist: Vec<String>,
    id: Option<u64>,
    name: Option<String>,
    cleanup: bool,
    message: Option<String>,
    phase: JobPhase,
}

impl Job {
    fn new(source: String, desc: Description, clusterlist: Vec<String>) -> Self {
        Self {
            source,
            desc,
            clusterlist,
            id: None,
            name: None,
            cleanup: false,
            message: None,
            phase: JobPhase::Pending,
        }
    }

    /// Still in the working set: later phases skip failed jobs.
    fn is_active(&self) -> bool {
        self.phase != JobPhase::Failed
    }

    fn created(&mut self, id: u64) {
        self.id = Some(id);
        self.cleanup = true;
        self.phase = JobPhase::Created;
    }

    fn staged(&mut self) {
        self.phase = JobPhase::Staged;
    }

    fn finalized(&mut self, name: String) {
        self.name = Some(name);
        self.cleanup = false;
        self.phase = JobPhase::Finalized;
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.phase = JobPhase::Failed;
    }

    fn into_outcome(self) -> JobOutcome {
        if self.phase == JobPhase::Finalized {
            if let (Some(id), Some(name)) = (self.id, self.name.clone()) {
                return JobOutcome::Submitted {
                    id,
                    name,
                    source: self.source,
                };
            }
        }
        // Jobs cut off between create and finalize carry no failure message
        // of their own; their cleanup flag is still set.
        let message = self
            .message
            .unwrap_or_else(|| "submission interrupted before finalization".to_string());
        JobOutcome::Failed {
            source: self.source,
            id: self.id,
            name: self.name,
            message,
            cleanup: self.cleanup,
        }
    }
}

/// Position of a batch entry in the caller-visible outcome order: either an
/// outcome recorded during the parse phase, or a job worked on by the later
/// phases.
enum Slot {
    Outcome(JobOutcome),
    Job(usize),
}

/// Drives the submission protocol against an injected service and optional
/// shared staging store.
pub struct SubmissionCoordinator<'a> {
    service: &'a dyn JobService,
    store: Option<SharedStore<'a>>,
    guard: &'a InterruptGuard,
    batch_size: usize,
}

impl<'a> SubmissionCoordinator<'a> {
    pub fn new(service: &'a dyn JobService, guard: &'a InterruptGuard) -> Self {
        Self {
            service,
            store: None,
            guard,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Stage input files through a shared store instead of the service's
    /// direct upload, rewriting descriptions to point at it.
    pub fn with_store(mut self, store: SharedStore<'a>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Submit all description sources to the given clusters.
    ///
    /// Sources are processed in fixed-size batches; a later batch never
    /// starts after a raised cancellation, but every outcome produced so far
    /// is preserved in the report.
    pub fn submit(&self, sources: &[PathBuf], clusters: &[String]) -> SubmissionReport {
        let mut report = SubmissionReport::new(ulid::Ulid::new().to_string().to_lowercase());
        for batch in sources.chunks(self.batch_size) {
            log::info!(
                "run {}: submitting batch of {} description sources",
                report.run_id,
                batch.len()
            );
            if self
                .submit_batch(batch, clusters, &mut report.outcomes)
                .is_err()
            {
                report.interrupted = true;
                break;
            }
        }
        report
    }

    fn submit_batch(
        &self,
        sources: &[PathBuf],
        clusters: &[String],
        outcomes: &mut Vec<JobOutcome>,
    ) -> Result<(), Interrupted> {
        // Parse phase. No remote calls are made yet; an interrupt replayed
        // at the end aborts the batch before anything needs cleanup.
        let section = self.guard.arm();
        let mut slots: Vec<Slot> = Vec::new();
        let mut jobs: Vec<Job> = Vec::new();
        for source in sources {
            let label = source.display().to_string();
            let text = match fs::read_to_string(source) {
                Ok(text) => text,
                Err(err) => {
                    log::warn!("cannot read description {label}: {err}");
                    slots.push(Slot::Outcome(source_failure(
                        label,
                        format!("error reading description: {err}"),
                    )));
                    continue;
                }
            };
            match parse(&text) {
                Ok(descriptions) => {
                    for desc in descriptions {
                        slots.push(Slot::Job(jobs.len()));
                        jobs.push(Job::new(label.clone(), desc, clusters.to_vec()));
                    }
                }
                Err(err) => {
                    log::warn!("cannot parse description {label}: {err}");
                    slots.push(Slot::Outcome(source_failure(label, err.to_string())));
                }
            }
        }
        let parse_interrupted = section.disarm().is_err();
        if parse_interrupted {
            for job in &mut jobs {
                job.fail("submission interrupted before job creation");
            }
            emit_outcomes(slots, jobs, outcomes);
            return Err(Interrupted);
        }

        let mut interrupted = false;
        if !jobs.is_empty() {
            // Create phase. The call and the identifier/cleanup bookkeeping
            // share one armed region and cannot be torn apart by a signal.
            let section = self.guard.arm();
            self.create_jobs(&mut jobs);
            interrupted = section.disarm().is_err();

            // Stage phase. Safe to interrupt between jobs: every created job
            // is already tracked for cleanup.
            if !interrupted {
                for job in jobs.iter_mut().filter(|job| job.is_active()) {
                    if self.guard.is_interrupted() {
                        break;
                    }
                    self.stage_job(job);
                }
                interrupted = self.guard.is_interrupted();
            }

            // Finalize phase. Skipped entirely once an interrupt is pending.
            if !interrupted {
                interrupted = self.finalize_jobs(&mut jobs).is_err();
            }
        }

        emit_outcomes(slots, jobs, outcomes);
        if interrupted {
            Err(Interrupted)
        } else {
            Ok(())
        }
    }

    fn create_jobs(&self, jobs: &mut [Job]) {
        let entries: Vec<CreateJob> = jobs
            .iter()
            .map(|job| CreateJob {
                clusterlist: job.clusterlist.clone(),
            })
            .collect();
        match service::create_jobs_chunked(self.service, &entries) {
            Ok(results) => {
                for (index, job) in jobs.iter_mut().enumerate() {
                    match results.get(index) {
                        Some(result) => {
                            if let Some(msg) = &result.msg {
                                job.fail(msg.clone());
                            } else if let Some(id) = result.id {
                                log::debug!("job from {} created with id {id}", job.source);
                                job.created(id);
                            } else {
                                job.fail("create result carried neither id nor message");
                            }
                        }
                        None => job.fail("no create result returned for job"),
                    }
                }
            }
            Err(err) => {
                log::warn!("create call failed: {err}");
                for job in jobs.iter_mut() {
                    job.fail(format!("error creating job: {err}"));
                }
            }
        }
    }

    fn stage_job(&self, job: &mut Job) {
        let Some(id) = job.id else {
            job.fail("job has no identifier for staging");
            return;
        };
        let files = match collect_input_files(&mut job.desc, self.store.as_ref(), id) {
            Ok(files) => files,
            Err(message) => {
                job.fail(message);
                return;
            }
        };
        if let Some(store) = &self.store {
            let url = store.collection_url(id);
            if let Err(err) = store.store().create_collection(&url) {
                log::warn!("cannot create staging collection {url}: {err}");
                job.fail(format!("error creating staging collection {url}: {err}"));
                return;
            }
            log::debug!("created staging collection {url}");
        }
        for (name, path) in &files {
            let result = match &self.store {
                Some(store) => store.store().upload_file(&store.file_url(id, name), path),
                None => self.service.upload_file(id, name, path),
            };
            if let Err(err) = result {
                log::warn!("upload of {} for job {id} failed: {err}", path.display());
                job.fail(format!("error uploading {} to {name}: {err}", path.display()));
                return;
            }
            log::debug!("uploaded {} as {name} for job {id}", path.display());
        }
        job.staged();
    }

    fn finalize_jobs(&self, jobs: &mut [Job]) -> Result<(), Interrupted> {
        let section = self.guard.arm();
        let mut entries: Vec<FinalizeJob> = Vec::new();
        let mut entry_jobs: Vec<usize> = Vec::new();
        for (index, job) in jobs.iter_mut().enumerate() {
            if !job.is_active() {
                continue;
            }
            let Some(id) = job.id else {
                job.fail("job has no identifier to finalize");
                continue;
            };
            let desc = unparse(&job.desc);
            if desc.is_empty() {
                job.fail("error generating job description");
                continue;
            }
            entries.push(FinalizeJob { id, desc });
            entry_jobs.push(index);
        }
        if !entries.is_empty() {
            match service::finalize_jobs_chunked(self.service, &entries) {
                Ok(results) => {
                    for (slot, &index) in entry_jobs.iter().enumerate() {
                        let job = &mut jobs[index];
                        match results.get(slot) {
                            Some(result) => {
                                if let Some(msg) = &result.msg {
                                    job.fail(msg.clone());
                                } else if let Some(name) = &result.name {
                                    log::debug!("job {:?} finalized as {name}", job.id);
                                    job.finalized(name.clone());
                                } else {
                                    job.fail("finalize result carried neither name nor message");
                                }
                            }
                            None => job.fail("no finalize result returned for job"),
                        }
                    }
                }
                Err(err) => {
                    log::warn!("finalize call failed: {err}");
                    for &index in &entry_jobs {
                        jobs[index].fail(format!("error finalizing job: {err}"));
                    }
                }
            }
        }
        section.disarm()
    }
}

fn source_failure(source: String, message: String) -> JobOutcome {
    JobOutcome::Failed {
        source,
        id: None,
        name: None,
        message,
        cleanup: false,
    }
}

/// Convert the batch back to outcomes in original source order.
fn emit_outcomes(slots: Vec<Slot>, jobs: Vec<Job>, outcomes: &mut Vec<JobOutcome>) {
    let mut job_outcomes: Vec<Option<JobOutcome>> =
        jobs.into_iter().map(|job| Some(job.into_outcome())).collect();
    for slot in slots {
        match slot {
            Slot::Outcome(outcome) => outcomes.push(outcome),
            Slot::Job(index) => {
                if let Some(outcome) = job_outcomes.get_mut(index).and_then(Option::take) {
                    outcomes.push(outcome);
                }
            }
        }
    }
}

/// Scan a description's input files. Remote references are left alone; local
/// ones are collected for upload, with the source entry rewritten in place
/// to the store URL when a shared store is in use.
fn collect_input_files(
    desc: &mut Description,
    store: Option<&SharedStore<'_>>,
    job_id: u64,
) -> Result<Vec<(String, PathBuf)>, String> {
    let mut files = Vec::new();
    let Some(value) = desc.get_mut("inputfiles") else {
        return Ok(files);
    };
    let AttrValue::Groups(groups) = value else {
        return Err("inputfiles attribute must be a list of value groups".to_string());
    };
    for group in groups.iter_mut() {
        let Some(name) = group.first().cloned() else {
            continue;
        };
        let raw = match group.get(1) {
            Some(source) if !source.is_empty() => source.clone(),
            _ => name.clone(),
        };
        let path = match classify_source(&raw) {
            FileRef::Remote => continue,
            FileRef::Local(path) => path,
        };
        if !path.is_file() {
            return Err(format!("given path {} is not a file", path.display()));
        }
        if let Some(store) = store {
            let url = store.file_url(job_id, &name);
            if group.len() >= 2 {
                group[1] = url;
            } else {
                group.push(url);
            }
        }
        files.push((name, path));
    }
    Ok(files)
}
