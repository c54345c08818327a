//! Environment guard rules.
//!
//! Translates browser-level tamper signals (tab hide, blocked keyboard
//! shortcuts, context menu) into guard-origin red flags, tells the host
//! to suppress the default action, and answers the navigation
//! confirmation prompt while a session is live.

use vigil_core::types::{FlagOrigin, IntegrityState, RedFlag, SessionStatus, Severity};

use crate::signals::{EnvironmentEvent, EventDisposition};

pub const TAB_HIDDEN: &str = "Tab switching detected - left assessment window";
pub const CONTEXT_MENU: &str = "Right-click context menu attempted";
pub const LEAVE_PROMPT: &str = "Are you sure you want to leave the assessment?";

/// Rule engine for browser tamper signals.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentGuard {
    penalty: u32,
}

impl EnvironmentGuard {
    pub fn new(penalty: u32) -> Self {
        Self { penalty }
    }

    /// Record one observed event as a guard-origin red flag. Every
    /// intercepted event suppresses the default browser action.
    pub fn observe(
        &self,
        state: &mut IntegrityState,
        event: &EnvironmentEvent,
    ) -> (RedFlag, EventDisposition) {
        let description = match event {
            EnvironmentEvent::VisibilityHidden => TAB_HIDDEN.to_string(),
            EnvironmentEvent::BlockedShortcut(shortcut) => shortcut.flag_description(),
            EnvironmentEvent::ContextMenu => CONTEXT_MENU.to_string(),
        };

        let flag = RedFlag::new(description, Severity::Warning, FlagOrigin::Guard);
        state.record_flag(flag.clone(), self.penalty);

        tracing::debug!(
            description = %flag.description,
            guard_flags = state.guard_flag_count,
            score = state.authenticity_score,
            "Environment tamper signal recorded"
        );

        (flag, EventDisposition::Suppress)
    }

    /// Confirmation message shown before leave/reload while the session
    /// is in progress; None once it is over (or not yet started).
    pub fn navigation_prompt(status: SessionStatus) -> Option<&'static str> {
        if status == SessionStatus::InProgress {
            Some(LEAVE_PROMPT)
        } else {
            None
        }
    }
}
