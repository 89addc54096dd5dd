use pagescribe_core::{parse_url_list, ArtifactKind, RunState, StatusMsg, WorkItem, WorkList};
use pretty_assertions::assert_eq;

fn chapters(n: usize) -> WorkList {
    (0..n)
        .map(|i| WorkItem::new(format!("https://novel.test/c/{i}"), format!("Chapter {i}")))
        .collect()
}

#[test]
fn fresh_state_resumes_at_zero() {
    let state = RunState::new("abc", "Title", "Title\n\n", 1);
    assert_eq!(state.resume_cursor(), 0);
    assert!(state.is_prefix_of(&chapters(3)));
    assert_eq!(state.accumulated_content(), "Title\n\n");
}

#[test]
fn concluded_items_advance_cursor_and_content() {
    let list = chapters(3);
    let mut state = RunState::new("abc", "Title", "Title\n\n", 1);
    state.push_concluded(list.get(0).unwrap().identity(), "\n\nChapter 0\n\nbody", 2);
    state.push_excluded(list.get(1).unwrap().identity(), 3);

    assert_eq!(state.resume_cursor(), 2);
    assert!(state.is_prefix_of(&list));
    assert_eq!(state.excluded_identities(), &["https://novel.test/c/1".to_string()]);
    assert_eq!(state.accumulated_content(), "Title\n\n\n\nChapter 0\n\nbody");
    assert_eq!(state.last_update(), 3);
}

#[test]
fn checkpoint_of_another_list_is_not_a_prefix() {
    let mut state = RunState::new("abc", "Title", "", 1);
    state.push_concluded("https://elsewhere.test/", "x", 2);
    assert!(!state.is_prefix_of(&chapters(3)));

    let mut long = RunState::new("abc", "Title", "", 1);
    for item in &chapters(3) {
        long.push_concluded(item.identity(), "", 2);
    }
    assert!(!long.is_prefix_of(&chapters(2)));
}

#[test]
fn checkpoint_round_trips_with_external_field_names() {
    let mut state = RunState::new("abc", "Title", "Title\n\n", 10);
    state.push_concluded("https://novel.test/c/0", "text & more", 11);

    let json = state.to_json().unwrap();
    assert!(json.contains("\"downloadedIdentities\""));
    assert!(json.contains("\"lastUpdate\":11"));
    assert!(json.contains("\"content\""));

    let restored = RunState::from_json(&json).unwrap();
    assert_eq!(restored, state);
}

#[test]
fn checkpoint_without_excluded_field_still_loads() {
    let raw = r#"{"runId":"r","title":"T","downloadedIdentities":["u"],"content":"c","lastUpdate":5}"#;
    let state = RunState::from_json(raw).unwrap();
    assert_eq!(state.resume_cursor(), 1);
    assert!(state.excluded_identities().is_empty());
    assert_eq!(state.kind(), ArtifactKind::Text);
}

#[test]
fn checkpoint_remembers_the_artifact_kind() {
    let state = RunState::new("urls-1", "urls-1", "", 1).with_kind(ArtifactKind::XmlCollection);
    let json = state.to_json().unwrap();
    assert!(json.contains(r#""artifactKind":"xml_collection""#));
    assert_eq!(
        RunState::from_json(&json).unwrap().kind(),
        ArtifactKind::XmlCollection
    );
}

#[test]
fn progress_uses_floor_percentage_and_one_based_current() {
    assert_eq!(
        StatusMsg::progress("r", 1, 3),
        StatusMsg::Progress {
            value: 33,
            current: 2,
            total: 3,
            run_id: "r".to_string(),
        }
    );
    match StatusMsg::progress("r", 0, 7) {
        StatusMsg::Progress { value, current, .. } => {
            assert_eq!(value, 0);
            assert_eq!(current, 1);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn status_messages_serialize_with_type_tag() {
    let json = serde_json::to_string(&StatusMsg::PartialComplete {
        run_id: "r".to_string(),
    })
    .unwrap();
    assert_eq!(json, r#"{"type":"partialComplete","runId":"r"}"#);

    let list = parse_url_list("https://a.test/");
    assert_eq!(list.len(), 1);
}
