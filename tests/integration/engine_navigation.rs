use portal_archive::fetch::FetchOrigin;
use portal_archive::model::Document;
use portal_archive::types::ROOT_ANCHOR;
use portal_archive::{ApiError, PrimeOutcome};

use crate::integration::support::{fixture, fixture_with, ids};

#[test]
fn roots_are_ordered_by_creation() {
    let f = fixture_with(
        vec![
            Document::root("F2", "Second").with_created_at(2),
            Document::root("F1", "First").with_created_at(1),
        ],
        Vec::new(),
    );
    f.engine.open_roots();
    f.engine.pump();
    assert_eq!(ids(&f.engine.root_categories()), vec!["F1", "F2"]);
}

#[test]
fn folders_precede_files_and_listing_is_stable() {
    let f = fixture();
    f.engine.open_roots();
    f.engine.pump();
    f.engine.open_category("dersler").unwrap();
    f.engine.pump();

    let first = f.engine.children("dersler", "dersler").unwrap();
    assert_eq!(ids(&first), vec!["y2023", "syllabus"]);
    let second = f.engine.children("dersler", "dersler").unwrap();
    assert_eq!(first, second);
}

#[test]
fn descend_and_ascend_round_trip() {
    let f = fixture();
    f.engine.open_roots();
    f.engine.pump();
    let fresh = f.engine.open_category("dersler").unwrap();
    f.engine.pump();

    f.engine.descend("dersler", "y2023").unwrap();
    f.engine.pump();
    f.engine.descend("dersler", "vize").unwrap();
    f.engine.pump();

    let trail = f.engine.breadcrumb("dersler").unwrap();
    let labels: Vec<&str> = trail.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, vec!["Dersler", "2023", "Vize"]);
    assert_eq!(ids(&f.engine.current_children("dersler").unwrap()), vec!["vize1"]);

    f.engine.ascend("dersler").unwrap();
    f.engine.ascend("dersler").unwrap();
    f.engine.ascend("dersler").unwrap();
    assert!(f.engine.is_at_root("dersler").unwrap());
    assert_eq!(f.engine.current_path("dersler").unwrap(), "dersler");
    assert_eq!(f.engine.breadcrumb("dersler").unwrap(), fresh.breadcrumb());
}

#[test]
fn invalid_moves_are_rejected() {
    let f = fixture();
    f.engine.open_roots();
    f.engine.pump();
    f.engine.open_category("dersler").unwrap();
    f.engine.pump();

    assert!(matches!(
        f.engine.descend("dersler", "syllabus"),
        Err(ApiError::NotAFolder { .. })
    ));
    assert!(matches!(
        f.engine.jump_to("dersler", 1),
        Err(ApiError::BreadcrumbOutOfRange { index: 1, len: 1 })
    ));
    assert!(matches!(
        f.engine.descend("dersler", "missing"),
        Err(ApiError::NodeNotFound(_))
    ));
    assert!(f.engine.is_at_root("dersler").unwrap());
}

#[test]
fn descend_only_enters_children_of_the_current_folder() {
    let f = fixture();
    f.engine.open_roots();
    f.engine.pump();
    f.engine.open_category("dersler").unwrap();
    f.engine.open_category("komiteler").unwrap();
    f.engine.pump();

    // A folder of another category
    assert!(matches!(
        f.engine.descend("dersler", "toplanti"),
        Err(ApiError::NotInCurrentFolder { ref id, ref path })
            if id == "toplanti" && path == "dersler"
    ));
    assert_eq!(f.engine.current_path("dersler").unwrap(), "dersler");
    assert_eq!(ids(&f.engine.current_children("dersler").unwrap()), vec!["y2023", "syllabus"]);

    // A grandchild, mirrored after visiting its parent
    f.engine.descend("dersler", "y2023").unwrap();
    f.engine.pump();
    f.engine.ascend("dersler").unwrap();
    assert!(matches!(
        f.engine.descend("dersler", "vize"),
        Err(ApiError::NotInCurrentFolder { .. })
    ));
    let labels: Vec<String> = f
        .engine
        .breadcrumb("dersler")
        .unwrap()
        .into_iter()
        .map(|c| c.label)
        .collect();
    assert_eq!(labels, vec!["Dersler"]);
}

#[test]
fn category_cursors_are_independent() {
    let f = fixture();
    f.engine.open_roots();
    f.engine.pump();
    f.engine.open_category("dersler").unwrap();
    f.engine.open_category("komiteler").unwrap();
    f.engine.pump();

    f.engine.descend("dersler", "y2023").unwrap();
    assert!(!f.engine.is_at_root("dersler").unwrap());
    assert!(f.engine.is_at_root("komiteler").unwrap());

    // Reopening returns the existing cursor rather than a fresh one
    let reopened = f.engine.open_category("dersler").unwrap();
    assert_eq!(reopened.depth(), 1);
}

#[test]
fn snapshot_replaces_listing_wholesale() {
    let f = fixture();
    f.engine.open_roots();
    f.engine.pump();
    f.engine.open_category("dersler").unwrap();
    f.engine.pump();

    f.documents.remove("syllabus");
    f.engine.pump();
    assert_eq!(ids(&f.engine.children("dersler", "dersler").unwrap()), vec!["y2023"]);
}

#[test]
fn empty_folder_is_not_loading() {
    let mut docs = vec![Document::root("bos", "Boş").with_created_at(1)];
    docs.push(Document::folder("inner", "İç", "bos"));
    let f = fixture_with(docs, Vec::new());
    f.engine.open_roots();
    f.engine.pump();
    f.engine.open_category("bos").unwrap();
    f.engine.pump();
    f.engine.descend("bos", "inner").unwrap();

    assert!(f.engine.is_loading("inner"));
    f.engine.pump();
    assert!(!f.engine.is_loading("inner"));
    assert!(f.engine.current_children("bos").unwrap().is_empty());
}

#[test]
fn closing_a_category_detaches_its_listings() {
    let f = fixture();
    f.engine.open_roots();
    f.engine.pump();
    f.engine.open_category("dersler").unwrap();
    f.engine.pump();
    f.engine.descend("dersler", "y2023").unwrap();
    f.engine.pump();
    assert_eq!(f.documents.listener_count(), 3);

    f.engine.close_category("dersler");
    assert_eq!(f.documents.listener_count(), 1);
    assert!(matches!(
        f.engine.breadcrumb("dersler"),
        Err(ApiError::UnknownCategory(_))
    ));
    assert!(f.engine.is_loading("y2023"));
    assert_eq!(f.engine.root_categories().len(), 2);
}

#[test]
fn deep_link_rebuilds_breadcrumb() {
    let f = fixture_with(
        vec![
            Document::root("dersler", "Dersler").with_created_at(1),
            Document::folder("y2023", "2023", "dersler").with_tag("cmpe"),
            Document::folder("vize", "Vize", "y2023").with_tag("cmpe"),
            Document::file("vize1", "Vize 1.pdf", "vize", "https://files/vize1.pdf"),
        ],
        Vec::new(),
    );
    f.engine.open_roots();
    f.engine.watch_tag("cmpe");
    f.engine.pump();

    let cursor = f.engine.open_deep_link("dersler", "vize").unwrap();
    assert_eq!(cursor.depth(), 2);
    f.engine.pump();
    assert_eq!(ids(&f.engine.current_children("dersler").unwrap()), vec!["vize1"]);

    f.engine.jump_to("dersler", 0).unwrap();
    assert!(f.engine.is_at_root("dersler").unwrap());
}

#[test]
fn cyclic_documents_are_omitted_not_fatal() {
    let f = fixture_with(
        vec![
            Document::root("dersler", "Dersler").with_created_at(1),
            Document::folder("a", "A", "b").with_tag("loop"),
            Document::folder("b", "B", "a").with_tag("loop"),
            Document::folder("lost", "Lost", "ghost").with_tag("loop"),
        ],
        Vec::new(),
    );
    f.engine.open_roots();
    f.engine.watch_tag("loop");
    f.engine.pump();

    assert_eq!(ids(&f.engine.root_categories()), vec!["dersler"]);
    assert!(f.engine.open_deep_link("dersler", "a").is_err());
    assert!(f.engine.open_deep_link("dersler", "lost").is_err());
    assert!(f.engine.children("dersler", "ghost").unwrap().is_empty());
}

#[test]
fn tag_listing_follows_its_subscription() {
    let f = fixture();
    f.engine.watch_tag("ieee");
    f.engine.pump();
    assert_eq!(ids(&f.engine.by_tag("ieee")), vec!["toplanti"]);

    f.engine.unwatch_tag("ieee");
    assert!(f.engine.by_tag("ieee").is_empty());
}

#[test]
fn refused_listing_reports_once() {
    let f = fixture();
    f.documents.reject_next_listen("permission denied");
    f.engine.open_roots();
    f.engine.pump();
    f.engine.pump();

    let errors = f.engine.drain_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("permission denied"));
    assert!(f.engine.drain_errors().is_empty());
}

#[test]
fn transient_failure_keeps_rendered_state() {
    let f = fixture();
    f.engine.open_roots();
    f.engine.pump();

    f.documents.fail_listeners("network unreachable");
    f.engine.pump();
    assert_eq!(f.engine.root_categories().len(), 2);
    assert_eq!(f.engine.drain_errors().len(), 1);
}

#[tokio::test]
async fn primed_roots_render_before_live_data() {
    let f = fixture();
    assert!(f.engine.is_loading(ROOT_ANCHOR));

    let outcome = f.engine.prime_roots().await.unwrap();
    assert_eq!(outcome, PrimeOutcome::Applied(FetchOrigin::Remote));
    assert!(!f.engine.is_loading(ROOT_ANCHOR));
    assert_eq!(f.engine.root_categories().len(), 2);

    f.engine.open_roots();
    f.engine.pump();
    assert_eq!(f.engine.prime_roots().await.unwrap(), PrimeOutcome::Discarded);

    // Live data supersedes the primed copy completely
    f.documents.remove("komiteler");
    f.engine.pump();
    assert_eq!(ids(&f.engine.root_categories()), vec!["dersler"]);
}
