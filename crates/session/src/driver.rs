//! Live session implementation on top of chromiumoxide.

use std::path::Path;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::cdp::browser_protocol::page::{
    AddScriptToEvaluateOnNewDocumentParams, CaptureScreenshotFormat,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use semantic_locator::SurfaceSnapshot;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{detect_chrome_executable, SessionConfig};
use crate::error::SessionError;
use crate::surface::{
    click_script, harvest_script, set_range_script, Surface, STEALTH_SCRIPT,
};

/// One browser instance plus one live page, bound to a persistent
/// profile directory. Exclusively owned by the runner for the duration
/// of a run.
pub struct EnhanceSession {
    config: SessionConfig,
    browser: Option<Browser>,
    page: Page,
    handler_task: Option<JoinHandle<()>>,
}

impl EnhanceSession {
    /// Launch Chrome with the persistent profile, register the stealth
    /// script, and point download interception at the download
    /// directory. Both directories are created if missing.
    pub async fn launch(config: SessionConfig) -> Result<Self, SessionError> {
        std::fs::create_dir_all(&config.download_dir)?;
        std::fs::create_dir_all(&config.profile_dir)?;

        let chrome = config
            .chrome_executable
            .clone()
            .or_else(detect_chrome_executable);
        match &chrome {
            Some(path) => info!(chrome = %path.display(), "launching installed Chrome"),
            None => warn!("no Chrome binary found; falling back to chromiumoxide discovery"),
        }

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&config.profile_dir)
            .args(vec![
                "--start-maximized",
                "--no-sandbox",
                "--disable-setuid-sandbox",
                "--disable-dev-shm-usage",
                "--disable-blink-features=AutomationControlled",
            ]);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = chrome {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // The handler stream must be polled for the browser to make
        // progress; it ends when the browser goes away.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let stealth = AddScriptToEvaluateOnNewDocumentParams::builder()
            .source(STEALTH_SCRIPT)
            .build()
            .map_err(SessionError::Protocol)?;
        page.execute(stealth).await?;

        let downloads = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(config.download_dir.to_string_lossy().to_string())
            .build()
            .map_err(SessionError::Protocol)?;
        browser.execute(downloads).await?;

        info!(
            profile = %config.profile_dir.display(),
            downloads = %config.download_dir.display(),
            "browser session ready"
        );

        Ok(Self {
            config,
            browser: Some(browser),
            page,
            handler_task: Some(handler_task),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Tear the session down. Idempotent; never raises, since it runs
    /// on the guaranteed-cleanup path regardless of how the run ended.
    pub async fn close(&mut self) {
        if let Some(mut browser) = self.browser.take() {
            info!("closing browser session");
            if let Err(err) = browser.close().await {
                debug!(error = %err, "browser close reported an error");
            }
            let _ = browser.wait().await;
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }

    /// Evaluate an expression and deserialize its by-value result.
    async fn eval_value<T: DeserializeOwned>(&self, expression: String) -> Result<T, SessionError> {
        let params = EvaluateParams::builder()
            .expression(expression)
            .return_by_value(true)
            .build()
            .map_err(SessionError::Protocol)?;
        let result = self.page.evaluate(params).await?;
        result
            .into_value()
            .map_err(|e| SessionError::Protocol(e.to_string()))
    }
}

#[async_trait]
impl Surface for EnhanceSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        debug!(url, "navigating");
        let nav = async {
            self.page
                .goto(url)
                .await
                .map_err(|e| SessionError::Navigation(e.to_string()))?;
            self.page
                .wait_for_navigation()
                .await
                .map_err(|e| SessionError::Navigation(e.to_string()))?;
            Ok(())
        };
        match tokio::time::timeout(self.config.nav_timeout, nav).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::NavigationTimeout(
                self.config.nav_timeout.as_secs(),
            )),
        }
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    async fn snapshot(&self) -> Result<SurfaceSnapshot, SessionError> {
        let records = self.eval_value(harvest_script()).await?;
        Ok(SurfaceSnapshot::new(records))
    }

    async fn click(&self, index: usize) -> Result<(), SessionError> {
        let clicked: bool = self.eval_value(click_script(index)).await?;
        if clicked {
            Ok(())
        } else {
            Err(SessionError::StaleElement(index))
        }
    }

    async fn has_element(&self, css: &str) -> Result<bool, SessionError> {
        let expr = format!(
            "!!document.querySelector({})",
            serde_json::to_string(css).unwrap_or_default()
        );
        self.eval_value(expr).await
    }

    async fn type_into(&self, css: &str, text: &str, clear: bool) -> Result<(), SessionError> {
        let element = self
            .page
            .find_element(css)
            .await
            .map_err(|_| SessionError::ElementNotFound(css.to_string()))?;
        element.click().await?;
        if clear {
            let expr = format!(
                r#"(() => {{
  const el = document.querySelector({css});
  if (!el) return false;
  el.focus();
  el.value = '';
  el.dispatchEvent(new Event('input', {{ bubbles: true }}));
  return true;
}})()"#,
                css = serde_json::to_string(css).unwrap_or_default()
            );
            let _: bool = self.eval_value(expr).await?;
        }
        element.type_str(text).await?;
        Ok(())
    }

    async fn press_enter(&self, css: &str) -> Result<(), SessionError> {
        let element = self
            .page
            .find_element(css)
            .await
            .map_err(|_| SessionError::ElementNotFound(css.to_string()))?;
        element.press_key("Enter").await?;
        Ok(())
    }

    async fn attach_file(&self, css: &str, path: &Path) -> Result<(), SessionError> {
        let element = self
            .page
            .find_element(css)
            .await
            .map_err(|_| SessionError::ElementNotFound(css.to_string()))?;
        let params = SetFileInputFilesParams::builder()
            .file(path.to_string_lossy().to_string())
            .node_id(element.node_id.clone())
            .build()
            .map_err(SessionError::Protocol)?;
        self.page.execute(params).await?;
        Ok(())
    }

    async fn set_range_value(&self, index: usize, value: u8) -> Result<(), SessionError> {
        let applied: bool = self.eval_value(set_range_script(index, value)).await?;
        if applied {
            Ok(())
        } else {
            Err(SessionError::StaleElement(index))
        }
    }

    async fn page_text(&self) -> Result<String, SessionError> {
        self.eval_value("document.body ? document.body.innerText : ''".to_string())
            .await
    }

    async fn screenshot(&self, path: &Path) -> Result<(), SessionError> {
        let bytes = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}
