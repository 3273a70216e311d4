//! Deterministic in-memory DOM backend.
//!
//! Holds the page as an HTML snapshot parsed with `scraper`. Tests script
//! the page by swapping snapshots: either directly ([`FakeDom::set_html`]),
//! on a click ([`FakeDom::on_click`]), or at a virtual-time offset
//! ([`FakeDom::schedule_html`], instant under `start_paused` tests). Every
//! swap bumps the mutation counter, mirroring how a real page notifies a
//! `MutationObserver`.
//!
//! Node handles are element-index paths into the snapshot and stay valid as
//! long as scripted swaps keep the element at the same position (append-only
//! fixtures do).

use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

struct ClickRule {
    selector: String,
    next_html: String,
}

#[derive(Default)]
struct State {
    html: String,
    paths: HashMap<u64, Vec<usize>>,
    next_id: u64,
    click_rules: Vec<ClickRule>,
    clicked_texts: Vec<String>,
    notices: Vec<String>,
}

struct Inner {
    state: Mutex<State>,
    mutations: watch::Sender<u64>,
}

/// Scripted fake page. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct FakeDom {
    inner: Arc<Inner>,
}

impl FakeDom {
    pub fn new(html: &str) -> Self {
        let (mutations, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    html: html.to_string(),
                    ..State::default()
                }),
                mutations,
            }),
        }
    }

    /// Replace the document and fire a mutation.
    pub fn set_html(&self, html: &str) {
        let mut state = self.inner.state.lock().unwrap();
        state.html = html.to_string();
        drop(state);
        self.inner.mutations.send_modify(|g| *g += 1);
    }

    /// When an element matching `selector` is clicked, swap in `next_html`.
    /// Rules are consulted in registration order; the first hit wins.
    pub fn on_click(&self, selector: &str, next_html: &str) {
        self.inner.state.lock().unwrap().click_rules.push(ClickRule {
            selector: selector.to_string(),
            next_html: next_html.to_string(),
        });
    }

    /// Swap in `html` after `delay` of (virtual) time.
    pub fn schedule_html(&self, delay: Duration, html: &str) {
        let this = self.clone();
        let html = html.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.set_html(&html);
        });
    }

    /// Texts of elements clicked so far, in click order.
    pub fn clicked_texts(&self) -> Vec<String> {
        self.inner.state.lock().unwrap().clicked_texts.clone()
    }

    /// Operator notices shown so far.
    pub fn notices(&self) -> Vec<String> {
        self.inner.state.lock().unwrap().notices.clone()
    }

    fn register(state: &mut State, path: Vec<usize>) -> NodeId {
        state.next_id += 1;
        let id = state.next_id;
        state.paths.insert(id, path);
        NodeId(id)
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|_| Error::Selector(selector.to_string()))
}

/// Element-index path from the tree root down to `el`.
fn path_of(el: ElementRef<'_>) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = *el;
    while let Some(parent) = node.parent() {
        let idx = node
            .prev_siblings()
            .filter(|s| s.value().is_element())
            .count();
        path.push(idx);
        node = parent;
    }
    path.reverse();
    path
}

fn resolve<'a>(doc: &'a Html, path: &[usize]) -> Option<ElementRef<'a>> {
    let mut node = doc.tree.root();
    for &idx in path {
        node = node
            .children()
            .filter(|c| c.value().is_element())
            .nth(idx)?;
    }
    ElementRef::wrap(node)
}

#[async_trait]
impl Dom for FakeDom {
    async fn query(&self, scope: Option<&NodeId>, selector: &str) -> Result<Option<NodeId>> {
        let sel = compile(selector)?;
        let mut state = self.inner.state.lock().unwrap();
        let doc = Html::parse_document(&state.html);
        let found = match scope {
            None => doc.select(&sel).next(),
            Some(id) => {
                let path = state.paths.get(&id.0).ok_or(Error::StaleNode)?.clone();
                let root = resolve(&doc, &path).ok_or(Error::StaleNode)?;
                root.select(&sel).next()
            }
        };
        Ok(found.map(|el| Self::register(&mut state, path_of(el))))
    }

    async fn query_all(&self, scope: Option<&NodeId>, selector: &str) -> Result<Vec<NodeId>> {
        let sel = compile(selector)?;
        let mut state = self.inner.state.lock().unwrap();
        let doc = Html::parse_document(&state.html);
        let paths: Vec<Vec<usize>> = match scope {
            None => doc.select(&sel).map(path_of).collect(),
            Some(id) => {
                let path = state.paths.get(&id.0).ok_or(Error::StaleNode)?.clone();
                let root = resolve(&doc, &path).ok_or(Error::StaleNode)?;
                root.select(&sel).map(path_of).collect()
            }
        };
        Ok(paths
            .into_iter()
            .map(|p| Self::register(&mut state, p))
            .collect())
    }

    async fn text(&self, node: &NodeId) -> Result<String> {
        let state = self.inner.state.lock().unwrap();
        let doc = Html::parse_document(&state.html);
        let path = state.paths.get(&node.0).ok_or(Error::StaleNode)?;
        let el = resolve(&doc, path).ok_or(Error::StaleNode)?;
        Ok(el.text().collect::<String>().trim().to_string())
    }

    async fn attr(&self, node: &NodeId, name: &str) -> Result<Option<String>> {
        let state = self.inner.state.lock().unwrap();
        let doc = Html::parse_document(&state.html);
        let path = state.paths.get(&node.0).ok_or(Error::StaleNode)?;
        let el = resolve(&doc, path).ok_or(Error::StaleNode)?;
        Ok(el.value().attr(name).map(str::to_string))
    }

    async fn click(&self, node: &NodeId) -> Result<()> {
        let next = {
            let mut state = self.inner.state.lock().unwrap();
            let doc = Html::parse_document(&state.html);
            let path = state.paths.get(&node.0).ok_or(Error::StaleNode)?.clone();
            let el = resolve(&doc, &path).ok_or(Error::StaleNode)?;
            let text = el.text().collect::<String>().trim().to_string();
            state.clicked_texts.push(text);

            let mut next = None;
            for rule in &state.click_rules {
                let sel = compile(&rule.selector)?;
                if doc.select(&sel).any(|m| path_of(m) == path) {
                    next = Some(rule.next_html.clone());
                    break;
                }
            }
            next
        };
        if let Some(html) = next {
            self.set_html(&html);
        }
        Ok(())
    }

    async fn observe(&self, _scope: Option<&NodeId>) -> Result<watch::Receiver<u64>> {
        Ok(self.inner.mutations.subscribe())
    }

    async fn notify_operator(&self, message: &str) -> Result<()> {
        self.inner
            .state
            .lock()
            .unwrap()
            .notices
            .push(message.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn query_scoped_to_descendants() {
        let dom = FakeDom::new(
            r#"<div id="outer"><span class="a">1</span></div><span class="a">2</span>"#,
        );
        let outer = dom.query(None, "#outer").await.unwrap().unwrap();
        let hits = dom.query_all(Some(&outer), "span.a").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(dom.text(&hits[0]).await.unwrap(), "1");
    }

    #[tokio::test]
    async fn union_selectors_come_back_in_document_order() {
        let dom = FakeDom::new(r#"<div title="t">d</div><span>s</span><button>b</button>"#);
        let hits = dom.query_all(None, "span, div[title], button").await.unwrap();
        let mut texts = Vec::new();
        for h in &hits {
            texts.push(dom.text(h).await.unwrap());
        }
        assert_eq!(texts, vec!["d", "s", "b"]);
    }

    #[tokio::test]
    async fn attr_and_case_insensitive_match() {
        let dom = FakeDom::new(r#"<div title="Group Admin">x</div>"#);
        let hit = dom.query(None, r#"div[title*="admin" i]"#).await.unwrap();
        assert!(hit.is_some());
        let node = hit.unwrap();
        assert_eq!(
            dom.attr(&node, "title").await.unwrap().as_deref(),
            Some("Group Admin")
        );
        assert_eq!(dom.attr(&node, "missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn click_rule_swaps_snapshot_and_bumps_counter() {
        let dom = FakeDom::new(r#"<button id="go">View all</button>"#);
        dom.on_click("#go", r#"<div role="dialog">open</div>"#);
        let mut rx = dom.observe(None).await.unwrap();
        let before = *rx.borrow_and_update();

        let btn = dom.query(None, "#go").await.unwrap().unwrap();
        dom.click(&btn).await.unwrap();

        assert!(dom.query(None, r#"div[role="dialog"]"#).await.unwrap().is_some());
        assert_eq!(dom.clicked_texts(), vec!["View all".to_string()]);
        assert!(*rx.borrow_and_update() > before);
    }

    #[tokio::test]
    async fn stale_handle_is_reported() {
        let dom = FakeDom::new("<div><p>x</p></div>");
        let p = dom.query(None, "p").await.unwrap().unwrap();
        dom.set_html("<div></div>");
        assert!(matches!(dom.text(&p).await, Err(Error::StaleNode)));
    }
}
