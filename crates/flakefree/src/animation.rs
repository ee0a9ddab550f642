//! Animation completion.
//!
//! Waits on the browser's own completion signal instead of guessing a duration:
//! the page collects `element.getAnimations()` at call time and awaits every
//! `animation.finished` promise in one `Promise.all`.

use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::{FlakeError, FlakeResult};
use crate::state::ElementState;
use crate::wait::{duration_ms, wait_for_state, WaitOptions};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Outcome of [`wait_for_animations_to_finish`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationReport {
    /// Animations that were running when the wait started
    pub count: usize,
    /// Time until all of them settled
    pub elapsed: Duration,
}

/// In-page script resolving to the number of animations awaited, or `null` when
/// the element is gone. Cancelled animations reject `finished`; they count as settled.
#[must_use]
pub fn finish_script(locator: &Locator) -> String {
    format!(
        "(() => {{ const el = {}; if (!el) return null; \
         const anims = el.getAnimations(); \
         return Promise.all(anims.map((a) => a.finished.catch(() => null))) \
         .then(() => anims.length); }})()",
        locator.selector().to_query()
    )
}

/// Wait until every animation running on `locator` has finished.
///
/// The element must be attached first. The whole call, including the attach
/// wait, is bounded by `options.timeout`.
pub async fn wait_for_animations_to_finish<D: PageDriver + ?Sized>(
    page: &D,
    locator: &Locator,
    options: &WaitOptions,
) -> FlakeResult<AnimationReport> {
    let options = options.for_locator(locator);
    let start = Instant::now();
    wait_for_state(page, locator, ElementState::Attached, &options).await?;

    let remaining = options.timeout().saturating_sub(start.elapsed());
    let script = finish_script(locator);
    let value = tokio::time::timeout(remaining, page.evaluate(&script))
        .await
        .map_err(|_| FlakeError::Timeout {
            waited_for: format!("animations on {locator} to finish"),
            timeout_ms: options.timeout_ms,
            elapsed_ms: duration_ms(start.elapsed()),
        })??;

    let count = match value {
        serde_json::Value::Null => {
            return Err(FlakeError::driver(format!(
                "{locator} was detached before its animations could be awaited"
            )))
        }
        other => serde_json::from_value::<usize>(other)?,
    };

    let elapsed = start.elapsed();
    tracing::debug!(
        locator = %locator,
        count,
        elapsed_ms = duration_ms(elapsed),
        "animations finished"
    );
    Ok(AnimationReport { count, elapsed })
}
