//! Per-call operation context.
//!
//! Every engine entry point takes an [`OpContext`]. It names the project the
//! call is scoped to and carries a deadline plus an optional cancellation
//! flag. Mutating operations call [`OpContext::check`] before each
//! sub-step; once it fails the surrounding transaction is dropped and
//! rolled back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{LanesError, Result};
use crate::model::ProjectId;

/// Deadline applied when the caller does not configure one.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// Project scope, deadline and cancellation for one engine call.
#[derive(Debug, Clone)]
pub struct OpContext {
    project: ProjectId,
    deadline: Instant,
    cancel: Option<Arc<AtomicBool>>,
}

impl OpContext {
    /// Context for `project` with the default 30 s deadline.
    #[must_use]
    pub fn new(project: ProjectId) -> Self {
        Self::with_timeout(project, DEFAULT_OP_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(project: ProjectId, timeout: Duration) -> Self {
        Self {
            project,
            deadline: Instant::now() + timeout,
            cancel: None,
        }
    }

    /// Attach a cancellation flag. Setting it to `true` makes the next
    /// [`OpContext::check`] fail.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Same deadline and cancellation, different project.
    #[must_use]
    pub fn for_project(&self, project: ProjectId) -> Self {
        Self {
            project,
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn project(&self) -> ProjectId {
        self.project
    }

    /// Time left before the deadline (zero once passed).
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Fail if the call was cancelled or its deadline has passed.
    ///
    /// # Errors
    ///
    /// [`LanesError::Cancelled`] or [`LanesError::DeadlineExceeded`], naming
    /// `step`.
    pub fn check(&self, step: &'static str) -> Result<()> {
        if self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            tracing::debug!(step, project = %self.project, "operation cancelled");
            return Err(LanesError::Cancelled { step });
        }
        if Instant::now() >= self.deadline {
            tracing::debug!(step, project = %self.project, "operation deadline exceeded");
            return Err(LanesError::DeadlineExceeded { step });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_passes() {
        let ctx = OpContext::new(ProjectId(1));
        assert!(ctx.check("anything").is_ok());
        assert!(ctx.remaining() > Duration::from_secs(29));
    }

    #[test]
    fn zero_timeout_fails_with_step_name() {
        let ctx = OpContext::with_timeout(ProjectId(1), Duration::ZERO);
        let err = ctx.check("splice column").expect_err("expired");
        assert!(matches!(err, LanesError::DeadlineExceeded { step: "splice column" }));
    }

    #[test]
    fn cancel_flag_wins_over_deadline() {
        let flag = Arc::new(AtomicBool::new(false));
        let ctx = OpContext::with_timeout(ProjectId(1), Duration::ZERO)
            .with_cancel_flag(Arc::clone(&flag));
        assert!(matches!(
            ctx.check("a"),
            Err(LanesError::DeadlineExceeded { .. })
        ));

        flag.store(true, Ordering::Relaxed);
        assert!(matches!(ctx.check("a"), Err(LanesError::Cancelled { .. })));
    }

    #[test]
    fn for_project_keeps_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(true));
        let ctx = OpContext::new(ProjectId(1)).with_cancel_flag(flag);
        let other = ctx.for_project(ProjectId(2));
        assert_eq!(other.project(), ProjectId(2));
        assert!(other.check("x").is_err());
    }
}
