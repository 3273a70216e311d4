//! Live backend over the Chrome DevTools Protocol.
//!
//! Element handles live page-side: every query stores its matches in a
//! `window.__rosterScrape` registry and hands back the registry index, so
//! later `text`/`attr`/`click` calls address the same element without
//! re-querying. Mutation observation installs a `MutationObserver` that bumps
//! a page-global counter, which a background task polls into a `watch`
//! channel.

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const REGISTRY_BOOT: &str =
    "window.__rosterScrape = window.__rosterScrape || { seq: 0, nodes: {}, watchers: {} };";

/// Owns the browser process and its CDP event loop.
pub struct CdpBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl CdpBrowser {
    /// Launch a Chrome instance. `headed` shows the window, which the
    /// operator needs in order to log in and scroll the member list.
    pub async fn launch(headed: bool) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if headed {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(Error::Backend)?;
        let (browser, mut handler) = Browser::launch(config).await.map_err(Error::backend)?;

        let task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("cdp handler stopped: {e}");
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            handler: task,
        })
    }

    /// Open `url` in a new tab and wrap it as a [`Dom`].
    pub async fn open(&self, url: &str, mutation_poll: Duration) -> Result<CdpDom> {
        let page = self.browser.new_page(url).await.map_err(Error::backend)?;
        Ok(CdpDom {
            page,
            mutation_poll,
        })
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await.map_err(Error::backend)?;
        self.handler.abort();
        Ok(())
    }
}

/// One live page, addressed through the page-side element registry.
pub struct CdpDom {
    page: Page,
    mutation_poll: Duration,
}

#[derive(Deserialize)]
struct Slot<T> {
    ok: bool,
    value: Option<T>,
}

async fn eval_on<T: DeserializeOwned>(page: &Page, js: String) -> Result<T> {
    let res = page.evaluate(js).await.map_err(Error::backend)?;
    let value = res.value().cloned().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value).map_err(Error::backend)
}

/// JS expression addressing the query root: the document or a registered node.
fn root_expr(scope: Option<&NodeId>) -> String {
    match scope {
        None => "document".to_string(),
        Some(id) => format!("reg.nodes[{}]", id.0),
    }
}

/// Encode a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

impl CdpDom {
    async fn eval<T: DeserializeOwned>(&self, js: String) -> Result<T> {
        eval_on(&self.page, js).await
    }

    async fn slot<T: DeserializeOwned>(&self, js: String) -> Result<Slot<T>> {
        self.eval(js).await
    }
}

#[async_trait]
impl Dom for CdpDom {
    async fn query(&self, scope: Option<&NodeId>, selector: &str) -> Result<Option<NodeId>> {
        let js = format!(
            r#"(() => {{
                {REGISTRY_BOOT}
                const reg = window.__rosterScrape;
                const root = {root};
                if (!root) return null;
                const el = root.querySelector({sel});
                if (!el) return null;
                reg.seq += 1;
                reg.nodes[reg.seq] = el;
                return reg.seq;
            }})()"#,
            root = root_expr(scope),
            sel = js_str(selector),
        );
        Ok(self.eval::<Option<u64>>(js).await?.map(NodeId))
    }

    async fn query_all(&self, scope: Option<&NodeId>, selector: &str) -> Result<Vec<NodeId>> {
        let js = format!(
            r#"(() => {{
                {REGISTRY_BOOT}
                const reg = window.__rosterScrape;
                const root = {root};
                if (!root) return [];
                const ids = [];
                for (const el of root.querySelectorAll({sel})) {{
                    reg.seq += 1;
                    reg.nodes[reg.seq] = el;
                    ids.push(reg.seq);
                }}
                return ids;
            }})()"#,
            root = root_expr(scope),
            sel = js_str(selector),
        );
        Ok(self.eval::<Vec<u64>>(js).await?.into_iter().map(NodeId).collect())
    }

    async fn text(&self, node: &NodeId) -> Result<String> {
        let js = format!(
            r#"(() => {{
                {REGISTRY_BOOT}
                const el = window.__rosterScrape.nodes[{id}];
                if (!el) return {{ ok: false, value: null }};
                return {{ ok: true, value: (el.textContent || '').trim() }};
            }})()"#,
            id = node.0,
        );
        let slot = self.slot::<String>(js).await?;
        if !slot.ok {
            return Err(Error::StaleNode);
        }
        Ok(slot.value.unwrap_or_default())
    }

    async fn attr(&self, node: &NodeId, name: &str) -> Result<Option<String>> {
        let js = format!(
            r#"(() => {{
                {REGISTRY_BOOT}
                const el = window.__rosterScrape.nodes[{id}];
                if (!el) return {{ ok: false, value: null }};
                return {{ ok: true, value: el.getAttribute({name}) }};
            }})()"#,
            id = node.0,
            name = js_str(name),
        );
        let slot = self.slot::<String>(js).await?;
        if !slot.ok {
            return Err(Error::StaleNode);
        }
        Ok(slot.value)
    }

    async fn click(&self, node: &NodeId) -> Result<()> {
        let js = format!(
            r#"(() => {{
                {REGISTRY_BOOT}
                const el = window.__rosterScrape.nodes[{id}];
                if (!el) return false;
                el.click();
                return true;
            }})()"#,
            id = node.0,
        );
        if !self.eval::<bool>(js).await? {
            return Err(Error::StaleNode);
        }
        Ok(())
    }

    async fn observe(&self, scope: Option<&NodeId>) -> Result<watch::Receiver<u64>> {
        let key = scope.map(|id| id.0).unwrap_or(0);
        let js = format!(
            r#"(() => {{
                {REGISTRY_BOOT}
                const reg = window.__rosterScrape;
                const root = {root};
                if (!root) return false;
                if (!reg.watchers[{key}]) {{
                    const w = {{ n: 0 }};
                    reg.watchers[{key}] = w;
                    const target = root === document
                        ? (document.body || document.documentElement)
                        : root;
                    new MutationObserver(() => {{ w.n += 1; }})
                        .observe(target, {{ childList: true, subtree: true }});
                }}
                return true;
            }})()"#,
            root = root_expr(scope),
        );
        if !self.eval::<bool>(js).await? {
            return Err(Error::StaleNode);
        }

        let (tx, rx) = watch::channel(0u64);
        let page = self.page.clone();
        let poll = self.mutation_poll;
        tokio::spawn(async move {
            let mut last = 0u64;
            while !tx.is_closed() {
                tokio::time::sleep(poll).await;
                let js = format!(
                    r#"(() => {{
                        const reg = window.__rosterScrape;
                        const w = reg && reg.watchers[{key}];
                        return w ? w.n : 0;
                    }})()"#
                );
                match eval_on::<u64>(&page, js).await {
                    Ok(n) if n != last => {
                        last = n;
                        if tx.send(n).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        debug!("mutation poll stopped: {e}");
                        break;
                    }
                }
            }
        });
        Ok(rx)
    }

    async fn notify_operator(&self, message: &str) -> Result<()> {
        // alert() blocks the page's JS thread until dismissed; fire it from a
        // timeout so the evaluate call itself returns immediately.
        let js = format!(
            r#"(() => {{ setTimeout(() => window.alert({msg}), 0); return true; }})()"#,
            msg = js_str(message),
        );
        self.eval::<bool>(js).await?;
        Ok(())
    }
}
