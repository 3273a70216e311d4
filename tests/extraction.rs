//! End-to-end extraction scenarios against the scripted fake page.
//!
//! All tests run under paused tokio time, so the 30-second observation
//! window and the wait timeouts elapse instantly.

use roster_scrape::dom::fake::FakeDom;
use roster_scrape::{export, extract_group_members, Config, MemberRecord};
use std::time::Duration;

/// Page before the roster dialog is open: group-info panel plus the
/// disclosure control.
const CHAT_PAGE: &str = r#"
    <div id="panel" aria-label='Group info for "Weekend Hikers"'>
        <span dir="auto">Weekend Hikers</span>
    </div>
    <span id="viewall">View all</span>
"#;

/// Same page with the roster dialog open and an empty member container.
const DIALOG_EMPTY: &str = r#"
    <div id="panel" aria-label='Group info for "Weekend Hikers"'>
        <span dir="auto">Weekend Hikers</span>
    </div>
    <span id="viewall">View all</span>
    <div role="dialog"><div role="list"></div></div>
"#;

const DIALOG_WITH_ALICE: &str = r#"
    <div id="panel" aria-label='Group info for "Weekend Hikers"'>
        <span dir="auto">Weekend Hikers</span>
    </div>
    <span id="viewall">View all</span>
    <div role="dialog"><div role="list">
        <div role="listitem">
            <span dir="auto">Alice</span>
            <span>+15550001111</span>
            <span data-icon="admin"></span>
        </div>
    </div></div>
"#;

const DIALOG_WITH_ALICE_AND_BOB: &str = r#"
    <div id="panel" aria-label='Group info for "Weekend Hikers"'>
        <span dir="auto">Weekend Hikers</span>
    </div>
    <span id="viewall">View all</span>
    <div role="dialog"><div role="list">
        <div role="listitem">
            <span dir="auto">Alice</span>
            <span>+15550001111</span>
            <span data-icon="admin"></span>
        </div>
        <div role="listitem">
            <span dir="auto">Bob Smith</span>
        </div>
    </div></div>
"#;

fn scripted_chat() -> FakeDom {
    let dom = FakeDom::new(CHAT_PAGE);
    dom.on_click("#viewall", DIALOG_EMPTY);
    dom
}

#[tokio::test(start_paused = true)]
async fn alice_and_bob_scenario() {
    let dom = scripted_chat();
    dom.schedule_html(Duration::from_secs(1), DIALOG_WITH_ALICE);
    dom.schedule_html(Duration::from_secs(2), DIALOG_WITH_ALICE_AND_BOB);

    let result = extract_group_members(&dom, &Config::default()).await;

    assert_eq!(result.group_name, "Weekend Hikers");
    assert_eq!(
        result.members,
        vec![
            MemberRecord {
                name: "Alice".into(),
                phone: "+15550001111".into(),
                is_admin: true,
            },
            MemberRecord {
                name: "Bob Smith".into(),
                phone: "".into(),
                is_admin: false,
            },
        ]
    );
    assert_eq!(dom.clicked_texts(), vec!["View all".to_string()]);
    assert_eq!(dom.notices().len(), 1);

    let csv = export::to_csv(&result);
    assert!(csv.starts_with("Group Name,Member Name,Phone Number,Is Admin\n"));
    let parsed = export::parse_csv(&csv).unwrap();
    assert_eq!(parsed, result);
}

#[tokio::test(start_paused = true)]
async fn duplicate_rows_collapse_to_first_seen() {
    let dom = scripted_chat();
    // The page re-renders Alice twice; the second copy re-announces the
    // admin badge differently but shares the identity key.
    dom.schedule_html(Duration::from_secs(1), DIALOG_WITH_ALICE);
    dom.schedule_html(
        Duration::from_secs(2),
        r#"
        <div id="panel" aria-label='Group info for "Weekend Hikers"'></div>
        <span id="viewall">View all</span>
        <div role="dialog"><div role="list">
            <div role="listitem">
                <span dir="auto">Alice</span>
                <span>+15550001111</span>
                <span data-icon="admin"></span>
            </div>
            <div role="listitem">
                <span dir="auto">Alice</span>
                <span>+15550001111</span>
            </div>
        </div></div>
        "#,
    );

    let result = extract_group_members(&dom, &Config::default()).await;
    assert_eq!(result.members.len(), 1);
    // First-seen copy wins, badge included.
    assert!(result.members[0].is_admin);
}

#[tokio::test(start_paused = true)]
async fn zero_rows_yield_empty_result_and_no_file() {
    let dom = scripted_chat();
    // Dialog opens but nothing ever renders inside the container.
    let result = extract_group_members(&dom, &Config::default()).await;

    assert_eq!(result.group_name, "Weekend Hikers");
    assert!(result.members.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let written = export::write_csv_if_any(dir.path(), &result).unwrap();
    assert!(written.is_none());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_disclosure_control_is_a_soft_failure() {
    let dom = FakeDom::new(
        r#"<div id="panel" aria-label='Group info for "Quiet Group"'></div>
           <span>Settings</span>"#,
    );
    let result = extract_group_members(&dom, &Config::default()).await;
    assert_eq!(result.group_name, "Quiet Group");
    assert!(result.members.is_empty());
    assert!(dom.clicked_texts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn panel_timeout_degrades_to_error_result() {
    let dom = FakeDom::new("<div><p>not a chat app</p></div>");
    let result = extract_group_members(&dom, &Config::default()).await;
    assert_eq!(result.group_name, "Error");
    assert!(result.members.is_empty());
}

#[tokio::test(start_paused = true)]
async fn observation_never_outlives_the_window() {
    let dom = scripted_chat();

    // Keep the page mutating well past the deadline.
    let mutator = dom.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(100)).await;
            mutator.set_html(DIALOG_WITH_ALICE);
        }
    });

    let config = Config::default();
    let start = tokio::time::Instant::now();
    let result = extract_group_members(&dom, &config).await;
    let elapsed = start.elapsed();

    assert_eq!(result.members.len(), 1);
    assert!(elapsed >= config.observe_window);
    assert!(elapsed < config.observe_window + Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn lazily_rendered_rows_keep_discovery_order() {
    let dom = scripted_chat();
    // Bob appears before Alice this time.
    dom.schedule_html(
        Duration::from_secs(1),
        r#"
        <div id="panel" aria-label='Group info for "Weekend Hikers"'></div>
        <span id="viewall">View all</span>
        <div role="dialog"><div role="list">
            <div role="listitem"><span dir="auto">Bob Smith</span></div>
        </div></div>
        "#,
    );
    dom.schedule_html(Duration::from_secs(2), DIALOG_WITH_ALICE_AND_BOB);

    let result = extract_group_members(&dom, &Config::default()).await;
    let names: Vec<&str> = result.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Bob Smith", "Alice"]);
}
