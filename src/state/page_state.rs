/// Per-URL lifecycle during a crawl
///
/// ```text
/// Pending ──> Rendering ──> Extracting ──> Recorded
///    │            │
///    │            └──> Failed
///    └──> Skipped
/// ```
///
/// No URL ever returns to `Pending`.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a URL in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageState {
    // ===== Active States =====
    /// Queued and waiting to be rendered
    Pending,

    /// The renderer is working on it (retries included)
    Rendering,

    /// Rendered; links and content are being extracted
    Extracting,

    // ===== Terminal States =====
    /// A page record was produced
    Recorded,

    /// Rendering failed after all retries
    Failed,

    /// Dequeued but not rendered (visited in an earlier run, or too deep)
    Skipped,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (page may still be processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Rendering | Self::Extracting)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Recorded)
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Rendering)
                | (Self::Pending, Self::Skipped)
                | (Self::Rendering, Self::Extracting)
                | (Self::Rendering, Self::Failed)
                | (Self::Extracting, Self::Recorded)
        )
    }

    /// Stable string form used in logs and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Rendering => "rendering",
            Self::Extracting => "extracting",
            Self::Recorded => "recorded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Parses the string form produced by [`PageState::as_str`]
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "rendering" => Some(Self::Rendering),
            "extracting" => Some(Self::Extracting),
            "recorded" => Some(Self::Recorded),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Rendering,
            Self::Extracting,
            Self::Recorded,
            Self::Failed,
            Self::Skipped,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
