//! Live element state.
//!
//! An [`ElementSnapshot`] is what one probe of the page observed for a locator. It is
//! never cached: every wait iteration takes a fresh one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Element state predicates (Playwright parity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    /// At least one element matches and the first one renders with a non-empty box
    Visible,
    /// No element matches, or the first match does not render
    Hidden,
    /// At least one element matches
    Attached,
    /// No element matches
    Detached,
}

impl ElementState {
    /// Get the state name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Attached => "attached",
            Self::Detached => "detached",
        }
    }

    /// Whether an observed snapshot satisfies this state
    #[must_use]
    pub const fn is_satisfied_by(&self, snapshot: &ElementSnapshot) -> bool {
        match self {
            Self::Visible => snapshot.is_visible(),
            Self::Hidden => !snapshot.is_visible(),
            Self::Attached => snapshot.is_attached(),
            Self::Detached => !snapshot.is_attached(),
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation of a locator in the live DOM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Number of matching elements
    pub count: usize,
    /// Whether the first match renders
    pub visible: bool,
    /// Raw `textContent` of the first match
    #[serde(default)]
    pub text: Option<String>,
}

impl ElementSnapshot {
    /// Nothing matched
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            count: 0,
            visible: false,
            text: None,
        }
    }

    /// A single rendered element with the given text
    #[must_use]
    pub fn visible(text: impl Into<String>) -> Self {
        Self {
            count: 1,
            visible: true,
            text: Some(text.into()),
        }
    }

    /// A single element in the DOM that does not render
    #[must_use]
    pub const fn hidden() -> Self {
        Self {
            count: 1,
            visible: false,
            text: None,
        }
    }

    /// Whether at least one element matched
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.count > 0
    }

    /// Whether the first match renders
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.count > 0 && self.visible
    }

    /// Text of the first match, empty when nothing matched
    #[must_use]
    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}
