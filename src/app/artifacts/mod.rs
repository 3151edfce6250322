// Artifact lifecycle - Tracks every temporary file a job creates and removes them

use std::collections::HashMap;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::domain::model::JobId;

/// Outcome of cleaning up one job
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanupReport {
    pub removed: usize,
    /// Tracked paths that were never created or were already gone
    pub missing: usize,
    pub failed: Vec<(PathBuf, String)>,
}

impl CleanupReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Authoritative registry of paths to delete, keyed by job
#[derive(Debug, Clone, Default)]
pub struct ArtifactLifecycle {
    registry: Arc<Mutex<HashMap<JobId, Vec<PathBuf>>>>,
}

impl ArtifactLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<JobId, Vec<PathBuf>>> {
        // A panic while holding the lock leaves the map itself consistent
        self.registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a path for later removal
    pub fn track(&self, job_id: &JobId, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut registry = self.registry();
        let paths = registry.entry(*job_id).or_default();
        if !paths.contains(&path) {
            debug!(job_id = %job_id, path = %path.display(), "Tracking artifact");
            paths.push(path);
        }
    }

    /// Stop tracking a path, e.g. once it becomes the delivered result
    pub fn untrack(&self, job_id: &JobId, path: &Path) {
        if let Some(paths) = self.registry().get_mut(job_id) {
            paths.retain(|p| p != path);
        }
    }

    /// Paths currently tracked for a job
    pub fn tracked(&self, job_id: &JobId) -> Vec<PathBuf> {
        self.registry().get(job_id).cloned().unwrap_or_default()
    }

    /// Number of jobs with tracked artifacts
    pub fn active_jobs(&self) -> usize {
        self.registry().len()
    }

    /// Remove every tracked path for a job, tolerating files that are already gone
    pub fn cleanup(&self, job_id: &JobId) -> CleanupReport {
        let paths = self.registry().remove(job_id).unwrap_or_default();
        let mut report = CleanupReport::default();

        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => report.removed += 1,
                Err(e) if e.kind() == IoErrorKind::NotFound => report.missing += 1,
                Err(e) => {
                    warn!(job_id = %job_id, path = %path.display(), error = %e, "Failed to remove artifact");
                    report.failed.push((path, e.to_string()));
                }
            }
        }

        debug!(
            job_id = %job_id,
            removed = report.removed,
            missing = report.missing,
            failed = report.failed.len(),
            "Cleaned up job artifacts"
        );
        report
    }

    /// Scoped handle that cleans the job up when dropped
    pub fn guard(&self, job_id: JobId) -> ArtifactGuard {
        ArtifactGuard {
            lifecycle: self.clone(),
            job_id,
            released: false,
        }
    }
}

/// Guarantees cleanup on every exit path of a job, including early returns and panics
#[derive(Debug)]
pub struct ArtifactGuard {
    lifecycle: ArtifactLifecycle,
    job_id: JobId,
    released: bool,
}

impl ArtifactGuard {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    pub fn track(&self, path: impl Into<PathBuf>) {
        self.lifecycle.track(&self.job_id, path);
    }

    pub fn untrack(&self, path: &Path) {
        self.lifecycle.untrack(&self.job_id, path);
    }

    /// Clean up now and disarm the guard
    pub fn cleanup(mut self) -> CleanupReport {
        self.released = true;
        self.lifecycle.cleanup(&self.job_id)
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if !self.released {
            self.lifecycle.cleanup(&self.job_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_cleanup_removes_tracked_paths_and_tolerates_missing() {
        let dir = TempDir::new().unwrap();
        let lifecycle = ArtifactLifecycle::new();
        let job = JobId::new();

        let a = touch(&dir, "a.mp4");
        let b = touch(&dir, "b.mp4");
        lifecycle.track(&job, &a);
        lifecycle.track(&job, &b);
        lifecycle.track(&job, &a);
        lifecycle.track(&job, dir.path().join("never_created.mp4"));

        assert_eq!(lifecycle.tracked(&job).len(), 3);
        let report = lifecycle.cleanup(&job);
        assert_eq!(report.removed, 2);
        assert_eq!(report.missing, 1);
        assert!(report.is_clean());
        assert!(!a.exists() && !b.exists());
        assert_eq!(lifecycle.active_jobs(), 0);
    }

    #[test]
    fn test_cleanup_only_touches_own_job() {
        let dir = TempDir::new().unwrap();
        let lifecycle = ArtifactLifecycle::new();
        let (first, second) = (JobId::new(), JobId::new());

        let mine = touch(&dir, "mine.mp4");
        let theirs = touch(&dir, "theirs.mp4");
        lifecycle.track(&first, &mine);
        lifecycle.track(&second, &theirs);

        lifecycle.cleanup(&first);
        assert!(!mine.exists());
        assert!(theirs.exists());
        assert_eq!(lifecycle.tracked(&second), vec![theirs]);
    }

    #[test]
    fn test_untrack_keeps_file() {
        let dir = TempDir::new().unwrap();
        let lifecycle = ArtifactLifecycle::new();
        let job = JobId::new();
        let result = touch(&dir, "final.mp4");

        lifecycle.track(&job, &result);
        lifecycle.untrack(&job, &result);
        lifecycle.cleanup(&job);
        assert!(result.exists());
    }

    #[test]
    fn test_guard_cleans_up_on_drop() {
        let dir = TempDir::new().unwrap();
        let lifecycle = ArtifactLifecycle::new();
        let path = touch(&dir, "tmp.mp4");

        {
            let guard = lifecycle.guard(JobId::new());
            guard.track(&path);
        }
        assert!(!path.exists());
        assert_eq!(lifecycle.active_jobs(), 0);
    }

    #[test]
    fn test_guard_cleans_up_on_panic() {
        let dir = TempDir::new().unwrap();
        let lifecycle = ArtifactLifecycle::new();
        let path = touch(&dir, "tmp.mp4");

        let inner = lifecycle.clone();
        let tracked = path.clone();
        let outcome = std::panic::catch_unwind(move || {
            let guard = inner.guard(JobId::new());
            guard.track(tracked);
            panic!("stage blew up");
        });
        assert!(outcome.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_explicit_cleanup_disarms_guard() {
        let dir = TempDir::new().unwrap();
        let lifecycle = ArtifactLifecycle::new();
        let guard = lifecycle.guard(JobId::new());
        guard.track(touch(&dir, "one.mp4"));

        let report = guard.cleanup();
        assert_eq!(report.removed, 1);
    }
}
