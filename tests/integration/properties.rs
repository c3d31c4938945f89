use portal_archive::catalog::filter::{FilterPipeline, SavedSet};
use portal_archive::catalog::{group_courses, FilterConfig, Selection};
use portal_archive::model::{Document, Resource};
use portal_archive::navigation::NavigationCursor;
use portal_archive::tree::TreeStore;
use proptest::prelude::*;
use proptest::sample::select;
use std::collections::HashSet;

const CODES: &[&str] = &["CMPE150", "cmpe150", "MATH101", "ÇEV201", "EE 212"];
const TYPES: &[&str] = &["Ders Notu", "Final Soruları", "Proje", "Syllabus"];
const TERMS: &[&str] = &["2023 Güz", "2024 Bahar", "2022 Yaz", ""];
const SEARCHES: &[&str] = &["", "cmpe", "MATH", "çev", "intro", "212"];

fn resource() -> impl Strategy<Value = Resource> {
    (
        0u32..50,
        select(CODES),
        select(TYPES),
        select(TERMS),
        any::<bool>(),
    )
        .prop_map(|(id, code, kind, term, named)| {
            let resource = Resource::new(format!("r{}", id), code, kind, term);
            if named {
                resource.with_course_name("Introduction")
            } else {
                resource
            }
        })
}

fn selection(values: &'static [&'static str]) -> impl Strategy<Value = Selection> {
    prop_oneof![Just(Selection::All), select(values).prop_map(|v| Selection::only(v))]
}

fn filter_config() -> impl Strategy<Value = FilterConfig> {
    (any::<bool>(), select(SEARCHES), selection(TYPES), selection(TERMS)).prop_map(
        |(saved_only, search, kind, term)| {
            FilterConfig::default()
                .saved_only(saved_only)
                .search(search)
                .resource_type(kind)
                .term(term)
        },
    )
}

/// Saved set holding every id with an even number
fn even_ids(resources: &[Resource]) -> HashSet<String> {
    resources
        .iter()
        .map(|r| r.id.clone())
        .filter(|id| {
            id.trim_start_matches('r')
                .parse::<u32>()
                .map(|n| n % 2 == 0)
                .unwrap_or(false)
        })
        .collect()
}

fn folder_chain(depth: usize) -> Vec<Document> {
    (0..depth)
        .map(|i| {
            let parent = if i == 0 {
                "cat".to_string()
            } else {
                format!("f{}", i - 1)
            };
            Document::folder(format!("f{}", i), format!("Folder {}", i), parent)
        })
        .collect()
}

proptest! {
    #[test]
    fn descend_then_ascend_returns_to_root(depth in 0usize..24) {
        let fresh = NavigationCursor::new("cat", "Category");
        let mut cursor = fresh.clone();
        for folder in folder_chain(depth) {
            cursor.descend(&folder).unwrap();
        }
        prop_assert_eq!(cursor.breadcrumb().len(), depth + 1);

        for _ in 0..depth {
            cursor.ascend();
        }
        prop_assert_eq!(cursor.current_path(), "cat");
        prop_assert_eq!(cursor, fresh);
    }

    #[test]
    fn jump_to_zero_resets_cursor(depth in 0usize..24) {
        let fresh = NavigationCursor::new("cat", "Category");
        let mut cursor = fresh.clone();
        for folder in folder_chain(depth) {
            cursor.descend(&folder).unwrap();
        }
        cursor.jump_to(0).unwrap();
        prop_assert!(cursor.is_at_root());
        prop_assert_eq!(cursor, fresh);
    }

    #[test]
    fn group_totals_match_admitted_count(
        resources in prop::collection::vec(resource(), 0..40),
        config in filter_config(),
    ) {
        let saved = even_ids(&resources);
        let admitted = FilterPipeline::from_config(&config, &saved).apply(&resources);
        let groups = group_courses(admitted.iter().copied());
        let total: usize = groups.iter().map(|g| g.total_count).sum();
        prop_assert_eq!(total, admitted.len());
        for group in &groups {
            let bucketed: usize = group.by_type.values().map(Vec::len).sum();
            prop_assert_eq!(bucketed, group.total_count);
        }
    }

    #[test]
    fn predicate_order_does_not_matter(
        resources in prop::collection::vec(resource(), 0..40),
        config in filter_config(),
        rotation in 0usize..4,
    ) {
        let saved = even_ids(&resources);
        let saved_ref: &dyn SavedSet = &saved;
        let baseline: Vec<String> = FilterPipeline::from_config(&config, saved_ref)
            .apply(&resources)
            .into_iter()
            .map(|r| r.id.clone())
            .collect();

        let mut predicates = FilterPipeline::from_config(&config, saved_ref).into_predicates();
        if !predicates.is_empty() {
            let shift = rotation % predicates.len();
            predicates.rotate_left(shift);
        }
        predicates.reverse();
        let reordered: Vec<String> = FilterPipeline::with_predicates(predicates)
            .apply(&resources)
            .into_iter()
            .map(|r| r.id.clone())
            .collect();
        prop_assert_eq!(baseline, reordered);
    }

    #[test]
    fn containers_precede_files(kinds in prop::collection::vec(any::<bool>(), 0..30)) {
        let mut documents = vec![Document::root("cat", "Category")];
        for (i, is_file) in kinds.iter().enumerate() {
            let id = format!("d{}", i);
            documents.push(if *is_file {
                Document::file(id, "file", "cat", "https://files/x")
            } else {
                Document::folder(id, "folder", "cat")
            });
        }
        let tree = TreeStore::from_documents(documents);
        let children = tree.children("cat");

        prop_assert_eq!(children.len(), kinds.len());
        prop_assert!(children.iter().all(|d| d.parent_path == "cat"));
        let first_file = children.iter().position(|d| d.is_file()).unwrap_or(children.len());
        prop_assert!(children[first_file..].iter().all(|d| d.is_file()));

        // Each partition keeps arrival order
        let folder_ids: Vec<usize> = children[..first_file]
            .iter()
            .map(|d| d.id[1..].parse().unwrap())
            .collect();
        prop_assert!(folder_ids.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(tree.children("cat"), children);
    }
}
