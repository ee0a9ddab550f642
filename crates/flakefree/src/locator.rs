//! Locator abstraction for element selection.
//!
//! A [`Locator`] never holds an element handle. Every probe, click or keystroke
//! re-resolves it from its [`Selector`] inside the page, so a DOM that replaced the
//! node between two calls is picked up transparently.
//!
//! Multiple matches resolve to the first one in document order. Callers are
//! expected to use selectors that identify a single element.

use std::fmt;
use std::time::Duration;

/// Selector type for locating elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector (e.g., "#email", ".success-message.show")
    Css(String),
    /// XPath selector (e.g., "//*[@href='/challenge1.html']")
    XPath(String),
    /// ARIA role with an optional accessible name
    Role {
        /// Role name (button, heading, link, textbox, ...)
        role: String,
        /// Accessible name filter
        name: Option<String>,
        /// Match the accessible name exactly instead of by substring
        exact: bool,
    },
    /// Form control by its label text
    Label(String),
    /// Innermost element containing the given text
    Text(String),
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::XPath(selector.into())
    }

    /// Parse a selector string, recognising XPath by its `//`, `(//` or `xpath=` prefix
    #[must_use]
    pub fn parse(selector: &str) -> Self {
        if let Some(rest) = selector.strip_prefix("xpath=") {
            Self::XPath(rest.to_string())
        } else if selector.starts_with("//") || selector.starts_with("(//") {
            Self::XPath(selector.to_string())
        } else {
            Self::Css(selector.to_string())
        }
    }

    /// JavaScript expression evaluating to an array of every match in document order
    #[must_use]
    pub fn to_query_all(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_string(s)),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()",
                js_string(s)
            ),
            Self::Role { role, name, exact } => format!(
                "({ROLE_QUERY_JS})({}, {}, {exact})",
                js_string(role),
                name.as_deref().map_or_else(|| "null".to_string(), js_string),
            ),
            Self::Label(text) => format!("({LABEL_QUERY_JS})({})", js_string(text)),
            Self::Text(text) => format!("({TEXT_QUERY_JS})({})", js_string(text)),
        }
    }

    /// JavaScript expression evaluating to the first match or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("(({})[0] ?? null)", self.to_query_all())
    }

    /// Script reporting match count, visibility and text of the first match
    #[must_use]
    pub fn to_probe_script(&self) -> String {
        format!(
            "(() => {{ const els = {}; const el = els[0]; \
             if (!el) return {{ count: 0, visible: false, text: null }}; \
             const r = el.getBoundingClientRect(); const s = window.getComputedStyle(el); \
             return {{ count: els.length, \
             visible: r.width > 0 && r.height > 0 && s.visibility !== 'hidden', \
             text: el.textContent }}; }})()",
            self.to_query_all()
        )
    }

    /// Script that scrolls the first match into view and returns its centre point
    #[must_use]
    pub fn to_center_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return null; \
             el.scrollIntoView({{ block: 'center', inline: 'center' }}); \
             const r = el.getBoundingClientRect(); \
             return {{ x: r.left + r.width / 2, y: r.top + r.height / 2 }}; }})()",
            self.to_query()
        )
    }

    /// Script that focuses the first match, returning whether it was found
    #[must_use]
    pub fn to_focus_script(&self) -> String {
        format!(
            "(() => {{ const el = {}; if (!el) return false; \
             el.scrollIntoView({{ block: 'center', inline: 'center' }}); \
             el.focus(); return document.activeElement === el; }})()",
            self.to_query()
        )
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "{s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::Role { role, name, exact } => {
                write!(f, "role={role}")?;
                if let Some(name) = name {
                    let suffix = if *exact { "s" } else { "i" };
                    write!(f, "[name={name:?}{suffix}]")?;
                }
                Ok(())
            }
            Self::Label(text) => write!(f, "label={text:?}"),
            Self::Text(text) => write!(f, "text={text:?}"),
        }
    }
}

/// Encode a Rust string as a JavaScript string literal
#[must_use]
pub fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// Implicit ARIA roles for the elements a login form uses, plus accessible names.
/// Elements hidden from the accessibility tree are skipped.
const ROLE_QUERY_JS: &str = "(role, name, exact) => { \
    const norm = (s) => (s || '').replace(/\\s+/g, ' ').trim(); \
    const roleOf = (el) => { \
        const explicit = el.getAttribute('role'); \
        if (explicit) return explicit.trim().split(/\\s+/)[0]; \
        const tag = el.tagName.toLowerCase(); \
        if (tag === 'button') return 'button'; \
        if (tag === 'input') { \
            const type = (el.getAttribute('type') || 'text').toLowerCase(); \
            if (['button', 'submit', 'reset', 'image'].includes(type)) return 'button'; \
            if (type === 'checkbox' || type === 'radio') return type; \
            if (['text', 'email', 'password', 'search', 'tel', 'url'].includes(type)) return 'textbox'; \
            return null; \
        } \
        if (/^h[1-6]$/.test(tag)) return 'heading'; \
        if (tag === 'a' && el.hasAttribute('href')) return 'link'; \
        if (tag === 'textarea') return 'textbox'; \
        if (tag === 'form') return 'form'; \
        return null; \
    }; \
    const accName = (el) => { \
        const aria = el.getAttribute('aria-label'); \
        if (aria) return norm(aria); \
        const by = el.getAttribute('aria-labelledby'); \
        if (by) return norm(by.split(/\\s+/).map((id) => { \
            const n = document.getElementById(id); return n ? n.textContent : ''; }).join(' ')); \
        if (el.tagName === 'INPUT' && ['button', 'submit', 'reset'].includes((el.type || '').toLowerCase())) \
            return norm(el.value); \
        if (el.labels && el.labels.length) \
            return norm(Array.from(el.labels).map((l) => l.textContent).join(' ')); \
        return norm(el.textContent); \
    }; \
    const exposed = (el) => { \
        if (el.closest('[aria-hidden=\"true\"]')) return false; \
        if (window.getComputedStyle(el).visibility === 'hidden') return false; \
        return el.getClientRects().length > 0; \
    }; \
    const named = (el) => { \
        if (name === null) return true; \
        const n = accName(el); \
        return exact ? n === name : n.toLowerCase().includes(name.toLowerCase()); \
    }; \
    return Array.from(document.querySelectorAll('*')) \
        .filter((el) => roleOf(el) === role && exposed(el) && named(el)); \
}";

/// Form controls whose `<label>` or `aria-label` contains the text (case-insensitive)
const LABEL_QUERY_JS: &str = "(text) => { \
    const norm = (s) => (s || '').replace(/\\s+/g, ' ').trim(); \
    const want = norm(text).toLowerCase(); \
    return Array.from(document.querySelectorAll('input, textarea, select, button, [aria-label]')) \
        .filter((el) => { \
            const aria = el.getAttribute('aria-label'); \
            if (aria && norm(aria).toLowerCase().includes(want)) return true; \
            return Array.from(el.labels || []) \
                .some((l) => norm(l.textContent).toLowerCase().includes(want)); \
        }); \
}";

/// Innermost elements whose normalised text contains the needle (case-insensitive)
const TEXT_QUERY_JS: &str = "(text) => { \
    const norm = (s) => (s || '').replace(/\\s+/g, ' ').trim(); \
    const want = norm(text).toLowerCase(); \
    const hit = (el) => !['SCRIPT', 'STYLE', 'TEMPLATE'].includes(el.tagName) \
        && norm(el.textContent).toLowerCase().includes(want); \
    return Array.from(document.body ? document.body.querySelectorAll('*') : []) \
        .filter((el) => hit(el) && !Array.from(el.children).some(hit)); \
}";

/// A re-resolvable reference to an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    /// The selector for finding elements
    selector: Selector,
    /// Per-locator override of the wait timeout
    timeout: Option<Duration>,
}

impl Locator {
    /// Create a locator from a selector string (CSS, or XPath when prefixed)
    #[must_use]
    pub fn new(selector: impl AsRef<str>) -> Self {
        Self::from_selector(Selector::parse(selector.as_ref()))
    }

    /// Create a locator from a selector
    #[must_use]
    pub const fn from_selector(selector: Selector) -> Self {
        Self {
            selector,
            timeout: None,
        }
    }

    /// Locate by ARIA role
    #[must_use]
    pub fn role(role: impl Into<String>) -> Self {
        Self::from_selector(Selector::Role {
            role: role.into(),
            name: None,
            exact: false,
        })
    }

    /// Locate a form control by its label
    #[must_use]
    pub fn label(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::Label(text.into()))
    }

    /// Locate the innermost element containing text
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::from_selector(Selector::Text(text.into()))
    }

    /// Filter a role locator by accessible name. No effect on other selector kinds.
    #[must_use]
    pub fn with_name(mut self, accessible_name: impl Into<String>) -> Self {
        if let Selector::Role { ref mut name, .. } = self.selector {
            *name = Some(accessible_name.into());
        }
        self
    }

    /// Require an exact accessible-name match on a role locator
    #[must_use]
    pub fn with_exact(mut self, value: bool) -> Self {
        if let Selector::Role { ref mut exact, .. } = self.selector {
            *exact = value;
        }
        self
    }

    /// Set a custom timeout for waits on this locator
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the selector
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Per-locator timeout override
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.selector.fmt(f)
    }
}

impl From<&str> for Locator {
    fn from(selector: &str) -> Self {
        Self::new(selector)
    }
}

/// Whitespace normalisation applied to element text before comparison
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
