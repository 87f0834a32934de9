#![allow(dead_code)]

use async_trait::async_trait;
use clearpage::{AppState, StrategyId, StrategyResult, StrategyRunner};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// Scripted stand-in for the live strategy dispatch: each strategy gets a
/// fixed delay and result, invocations are logged in call order, and probes
/// observe whether a strategy finished or was cancelled mid-flight.
pub struct MockRunner {
    scripts: HashMap<StrategyId, Script>,
    calls: Arc<Mutex<Vec<StrategyId>>>,
    probes: HashMap<StrategyId, Probe>,
}

#[derive(Clone)]
struct Script {
    delay_ms: u64,
    result: StrategyResult,
}

#[derive(Clone)]
pub struct Probe {
    pub completed: Arc<AtomicBool>,
    pub cancelled: Arc<AtomicBool>,
}

/// Flags cancellation when the in-flight future is dropped before finishing.
struct CancelGuard {
    probe: Probe,
    done: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.done {
            self.probe.cancelled.store(true, Ordering::SeqCst);
        }
    }
}

impl MockRunner {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            probes: HashMap::new(),
        }
    }

    pub fn script(&mut self, strategy: StrategyId, delay_ms: u64, result: StrategyResult) {
        self.scripts.insert(strategy, Script { delay_ms, result });
    }

    pub fn probe(&mut self, strategy: StrategyId) -> Probe {
        let probe = Probe {
            completed: Arc::new(AtomicBool::new(false)),
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        self.probes.insert(strategy, probe.clone());
        probe
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<StrategyId>>> {
        Arc::clone(&self.calls)
    }

    pub fn into_state(self) -> Arc<AppState> {
        Arc::new(AppState::default().with_strategy_runner(Arc::new(self)))
    }
}

#[async_trait]
impl StrategyRunner for MockRunner {
    async fn run(
        &self,
        _state: &Arc<AppState>,
        strategy: StrategyId,
        _url: &Url,
    ) -> StrategyResult {
        self.calls.lock().expect("call log poisoned").push(strategy);

        let script = self.scripts.get(&strategy).cloned().unwrap_or_else(|| Script {
            delay_ms: 0,
            result: StrategyResult::failure(strategy, "unscripted strategy"),
        });
        let mut guard = self.probes.get(&strategy).cloned().map(|probe| CancelGuard {
            probe,
            done: false,
        });

        tokio::time::sleep(Duration::from_millis(script.delay_ms)).await;

        if let Some(guard) = guard.as_mut() {
            guard.done = true;
            guard.probe.completed.store(true, Ordering::SeqCst);
        }
        script.result
    }
}

/// Clean article HTML padded to the requested size.
pub fn clean_html(strategy: StrategyId, len: usize) -> StrategyResult {
    let mut html = String::from(
        "<html><head><title>Field Notes</title></head><body><article><h1>Field Notes</h1>",
    );
    while html.len() < len.saturating_sub(30) {
        html.push_str("<p>The survey team crossed the ridge before noon and set up camp.</p>");
    }
    html.push_str("</article></body></html>");
    StrategyResult::html(strategy, html, None)
}

/// Cloudflare-style interstitial padded to the requested size.
pub fn blocked_html(strategy: StrategyId, len: usize) -> StrategyResult {
    let mut html =
        String::from("<html><head><title>Just a moment...</title></head><body>Checking your browser before accessing the site.");
    while html.len() < len.saturating_sub(20) {
        html.push_str("<div>please wait</div>");
    }
    html.push_str("</body></html>");
    StrategyResult::html(strategy, html, None)
}

/// Thin SPA bootstrap shell.
pub fn shell_html(strategy: StrategyId, len: usize) -> StrategyResult {
    let mut html = String::from("<html><body><div id=\"root\"></div><script src=\"/app.js\"></script>");
    while html.len() < len.saturating_sub(20) {
        html.push_str("<link rel=\"preload\" href=\"/chunk.js\">");
    }
    html.push_str("</body></html>");
    StrategyResult::html(strategy, html, None)
}

pub fn markdown_result(strategy: StrategyId, len: usize) -> StrategyResult {
    let mut md = String::from("# Recovered Article\n\n");
    while md.len() < len {
        md.push_str("A paragraph of recovered text that reads like an article. ");
    }
    StrategyResult::markdown(strategy, md, Some("Recovered Article".to_string()))
}
