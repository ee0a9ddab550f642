//! Browser control over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature, [`Browser`] launches Chromium through chromiumoxide
//! and hands out one [`ChromiumPage`] per scenario, each in its own browser context
//! so cookies and storage never leak between scenarios. Without the feature only
//! [`BrowserConfig`] is available; tests drive [`crate::MockDriver`] instead.

use crate::config::SuiteConfig;

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self::from(&SuiteConfig::default())
    }
}

impl From<&SuiteConfig> for BrowserConfig {
    fn from(config: &SuiteConfig) -> Self {
        Self {
            headless: config.headless,
            viewport_width: config.viewport.width,
            viewport_height: config.viewport.height,
            chromium_path: config.chromium_path.clone(),
            sandbox: config.sandbox,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Whether a protocol error means the page's execution context went away
/// mid-call, as happens while a navigation is committing.
#[must_use]
pub fn is_context_lost_message(message: &str) -> bool {
    const MARKERS: [&str; 4] = [
        "Execution context was destroyed",
        "Cannot find context with specified id",
        "Inspected target navigated or closed",
        "Cannot find default execution context",
    ];
    MARKERS.iter().any(|m| message.contains(m))
}

// ============================================================================
// Real CDP Implementation (when `browser` feature is enabled)
// ============================================================================

#[cfg(feature = "browser")]
#[allow(clippy::significant_drop_tightening, clippy::missing_errors_doc)]
mod cdp {
    use super::{is_context_lost_message, BrowserConfig};
    use crate::driver::{PageDriver, PageFactory};
    use crate::locator::Locator;
    use crate::result::{FlakeError, FlakeResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
        DispatchMouseEventType, MouseButton,
    };
    use chromiumoxide::cdp::browser_protocol::target::{
        CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
    };
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::error::CdpError;
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde::Deserialize;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    fn protocol_error(e: CdpError) -> FlakeError {
        let message = e.to_string();
        if is_context_lost_message(&message) {
            FlakeError::ContextLost { message }
        } else {
            FlakeError::Driver { message }
        }
    }

    fn input_error(e: impl ToString) -> FlakeError {
        FlakeError::input(e.to_string())
    }

    #[derive(Debug, Deserialize)]
    struct Point {
        x: f64,
        y: f64,
    }

    /// Browser instance with real CDP connection
    #[derive(Debug)]
    pub struct Browser {
        config: BrowserConfig,
        inner: Arc<Mutex<CdpBrowser>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl Browser {
        /// Launch a new browser instance with real CDP
        pub async fn launch(config: BrowserConfig) -> FlakeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(config.viewport_width, config.viewport_height)
                .viewport(Viewport {
                    width: config.viewport_width,
                    height: config.viewport_height,
                    ..Viewport::default()
                });

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| FlakeError::BrowserLaunch { message })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| FlakeError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!(error = %e, "CDP handler error");
                    }
                }
            });

            tracing::info!(headless = config.headless, "browser launched");
            Ok(Self {
                config,
                inner: Arc::new(Mutex::new(browser)),
                handle,
            })
        }

        /// Get the browser configuration
        #[must_use]
        pub const fn config(&self) -> &BrowserConfig {
            &self.config
        }

        /// Close the browser
        pub async fn close(self) -> FlakeResult<()> {
            {
                let mut browser = self.inner.lock().await;
                browser.close().await.map_err(protocol_error)?;
                let _ = browser.wait().await;
            }
            self.handle.abort();
            Ok(())
        }
    }

    #[async_trait]
    impl PageFactory for Browser {
        type Page = ChromiumPage;

        async fn new_page(&self) -> FlakeResult<ChromiumPage> {
            let browser = self.inner.lock().await;
            let context_id = browser
                .execute(CreateBrowserContextParams::builder().build())
                .await
                .map_err(protocol_error)?
                .result
                .browser_context_id;

            let target = CreateTargetParams::builder()
                .url("about:blank")
                .browser_context_id(context_id.clone())
                .build()
                .map_err(FlakeError::driver)?;
            let page = browser.new_page(target).await.map_err(protocol_error)?;

            Ok(ChromiumPage {
                page,
                browser: Arc::clone(&self.inner),
                context_id,
            })
        }
    }

    /// A page in its own browser context
    #[derive(Debug)]
    pub struct ChromiumPage {
        page: CdpPage,
        browser: Arc<Mutex<CdpBrowser>>,
        context_id: BrowserContextId,
    }

    impl ChromiumPage {
        async fn mouse(&self, kind: DispatchMouseEventType, at: &Point) -> FlakeResult<()> {
            let mut builder = DispatchMouseEventParams::builder()
                .r#type(kind.clone())
                .x(at.x)
                .y(at.y);
            if kind != DispatchMouseEventType::MouseMoved {
                builder = builder.button(MouseButton::Left).click_count(1);
            }
            let params = builder.build().map_err(input_error)?;
            self.page.execute(params).await.map_err(input_error)?;
            Ok(())
        }

        async fn key(&self, kind: DispatchKeyEventType, ch: &str) -> FlakeResult<()> {
            let mut builder = DispatchKeyEventParams::builder().r#type(kind.clone()).key(ch);
            if kind == DispatchKeyEventType::KeyDown {
                builder = builder.text(ch);
            }
            let params = builder.build().map_err(input_error)?;
            self.page.execute(params).await.map_err(input_error)?;
            Ok(())
        }
    }

    #[async_trait]
    impl PageDriver for ChromiumPage {
        async fn goto(&self, url: &str) -> FlakeResult<()> {
            self.page
                .goto(url)
                .await
                .map_err(|e| FlakeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn evaluate(&self, expression: &str) -> FlakeResult<serde_json::Value> {
            let params = EvaluateParams::builder()
                .expression(expression)
                .await_promise(true)
                .return_by_value(true)
                .build()
                .map_err(FlakeError::driver)?;
            let result = self.page.evaluate_expression(params).await.map_err(|e| {
                let message = e.to_string();
                if is_context_lost_message(&message) {
                    FlakeError::ContextLost { message }
                } else {
                    FlakeError::Evaluation {
                        expression: expression.chars().take(120).collect(),
                        message,
                    }
                }
            })?;
            Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
        }

        async fn type_text(&self, locator: &Locator, text: &str) -> FlakeResult<()> {
            let focused = self.evaluate(&locator.selector().to_focus_script()).await?;
            if focused != serde_json::Value::Bool(true) {
                return Err(FlakeError::driver(format!("could not focus {locator}")));
            }
            let mut buf = [0u8; 4];
            for ch in text.chars() {
                let ch = ch.encode_utf8(&mut buf);
                self.key(DispatchKeyEventType::KeyDown, ch).await?;
                self.key(DispatchKeyEventType::KeyUp, ch).await?;
            }
            Ok(())
        }

        async fn click(&self, locator: &Locator) -> FlakeResult<()> {
            let value = self
                .evaluate(&locator.selector().to_center_script())
                .await?;
            if value.is_null() {
                return Err(FlakeError::driver(format!("no element matches {locator}")));
            }
            let at: Point = serde_json::from_value(value)?;
            self.mouse(DispatchMouseEventType::MouseMoved, &at).await?;
            self.mouse(DispatchMouseEventType::MousePressed, &at).await?;
            self.mouse(DispatchMouseEventType::MouseReleased, &at)
                .await
        }

        async fn close(&self) -> FlakeResult<()> {
            self.page.clone().close().await.map_err(protocol_error)?;
            let browser = self.browser.lock().await;
            browser
                .execute(DisposeBrowserContextParams::new(self.context_id.clone()))
                .await
                .map_err(protocol_error)?;
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::{Browser, ChromiumPage};
