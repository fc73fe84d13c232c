use crate::browser::{Browser, BrowserCookie, BrowserLauncher, RawCard};
use crate::transport::{GraphQlTransport, PageRequest};
use async_trait::async_trait;
use friendnet_core::{FriendNetError, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays canned response bodies in order and records every request.
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<PageRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub fn with_results(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GraphQlTransport for ScriptedTransport {
    async fn post(&self, request: &PageRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FriendNetError::Network("no scripted response left".to_string())))
    }
}

#[derive(Default)]
pub struct FakeBrowserState {
    pub visited: Vec<String>,
    pub clicked: Vec<String>,
    pub filled: Vec<(String, String)>,
    /// Selectors `wait_for` finds
    pub present: HashSet<String>,
    pub loading_selector: String,
    /// Loading checks that still report the indicator
    pub loading_rounds: usize,
    pub scrolls: usize,
    /// Cards shown per visited URL
    pub cards: HashMap<String, Vec<RawCard>>,
    pub source: String,
    pub cookies: Vec<BrowserCookie>,
    pub close_calls: usize,
}

/// In-memory [`Browser`]; clones share state so tests can inspect it after
/// the scanner has taken ownership.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    pub state: Arc<Mutex<FakeBrowserState>>,
}

impl FakeBrowser {
    pub fn new(state: FakeBrowserState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, FakeBrowserState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.state().visited.push(url.to_string());
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool> {
        Ok(self.state().present.contains(selector))
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.state().clicked.push(selector.to_string());
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        self.state()
            .filled
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn count(&mut self, selector: &str) -> Result<usize> {
        let state = self.state();
        if selector == state.loading_selector {
            Ok(usize::from(state.loading_rounds > 0))
        } else {
            Ok(usize::from(state.present.contains(selector)))
        }
    }

    async fn scroll_to_end(&mut self) -> Result<()> {
        let mut state = self.state();
        state.scrolls += 1;
        state.loading_rounds = state.loading_rounds.saturating_sub(1);
        Ok(())
    }

    async fn cards(&mut self, _panel: &str, _card: &str) -> Result<Vec<RawCard>> {
        let state = self.state();
        let current = state.visited.last().cloned().unwrap_or_default();
        Ok(state.cards.get(&current).cloned().unwrap_or_default())
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.state().source.clone())
    }

    async fn cookies(&mut self) -> Result<Vec<BrowserCookie>> {
        Ok(self.state().cookies.clone())
    }

    async fn close(&mut self) -> Result<()> {
        self.state().close_calls += 1;
        Ok(())
    }
}

pub struct FakeLauncher {
    pub browser: FakeBrowser,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>> {
        Ok(Box::new(self.browser.clone()))
    }
}

pub fn card(text: &str, href: &str) -> RawCard {
    RawCard {
        text: text.to_string(),
        href: Some(href.to_string()),
    }
}

pub fn token_page(token: &str) -> String {
    format!(
        r#"<html><script>require([["DTSGInitData",[],{{"token":"{token}","async_get_token":"Ab1:Cd2"}},258]])</script></html>"#
    )
}
