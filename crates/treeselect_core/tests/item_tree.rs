use treeselect_core::{ItemId, ItemTree, TreeError};
use uuid::Uuid;

struct Fixture {
    tree: ItemTree,
    home: ItemId,
    docs: ItemId,
    report: ItemId,
    photos: ItemId,
    var: ItemId,
}

fn setup() -> Fixture {
    let mut tree = ItemTree::new();
    let home = tree.insert(None, "home").unwrap();
    let docs = tree.insert(Some(home), "docs").unwrap();
    let report = tree.insert(Some(docs), "report.txt").unwrap();
    let photos = tree.insert(Some(home), "photos").unwrap();
    let var = tree.insert(None, "var").unwrap();
    Fixture {
        tree,
        home,
        docs,
        report,
        photos,
        var,
    }
}

#[test]
fn preorder_follows_sibling_order() {
    let fx = setup();
    assert_eq!(
        fx.tree.preorder(),
        vec![fx.home, fx.docs, fx.report, fx.photos, fx.var]
    );
    assert_eq!(fx.tree.children(None), &[fx.home, fx.var]);
    assert_eq!(fx.tree.children(Some(fx.home)), &[fx.docs, fx.photos]);
    assert!(fx.tree.children(Some(Uuid::new_v4())).is_empty());
}

#[test]
fn remove_takes_the_whole_subtree() {
    let mut fx = setup();

    let removed = fx.tree.remove(fx.docs).unwrap();

    assert_eq!(removed, vec![fx.docs, fx.report]);
    assert!(!fx.tree.contains(fx.docs));
    assert!(!fx.tree.contains(fx.report));
    assert_eq!(fx.tree.len(), 3);
    assert_eq!(fx.tree.children(Some(fx.home)), &[fx.photos]);
    assert_eq!(
        fx.tree.remove(fx.docs).unwrap_err(),
        TreeError::ItemNotFound(fx.docs)
    );
}

#[test]
fn move_rejects_cycles_and_keeps_the_tree_intact() {
    let mut fx = setup();

    let err = fx.tree.move_item(fx.home, Some(fx.report)).unwrap_err();
    assert_eq!(
        err,
        TreeError::CycleDetected {
            item: fx.home,
            parent: fx.report,
        }
    );
    let err = fx.tree.move_item(fx.docs, Some(fx.docs)).unwrap_err();
    assert!(matches!(err, TreeError::CycleDetected { .. }));
    assert_eq!(fx.tree.get(fx.home).unwrap().parent, None);

    fx.tree.move_item(fx.docs, Some(fx.var)).unwrap();
    assert_eq!(fx.tree.path_of(fx.report).as_deref(), Some("/var/docs/report.txt"));
    assert_eq!(fx.tree.children(Some(fx.home)), &[fx.photos]);

    fx.tree.move_item(fx.docs, None).unwrap();
    assert_eq!(fx.tree.children(None), &[fx.home, fx.var, fx.docs]);
}

#[test]
fn insert_validates_ids_and_parents() {
    let mut fx = setup();
    let missing = Uuid::new_v4();

    assert_eq!(
        fx.tree.insert(Some(missing), "orphan").unwrap_err(),
        TreeError::ParentNotFound(missing)
    );
    assert_eq!(
        fx.tree
            .insert_with_id(fx.report, Some(fx.photos), "copy.txt")
            .unwrap_err(),
        TreeError::DuplicateId(fx.report)
    );

    let fixed = Uuid::new_v4();
    let id = fx
        .tree
        .insert_with_id(fixed, Some(fx.photos), "  img.jpg  ")
        .unwrap();
    assert_eq!(id, fixed);
    assert_eq!(fx.tree.get(fixed).unwrap().name, "img.jpg");
}

#[test]
fn find_prefers_paths_then_first_name_match() {
    let mut fx = setup();
    let second_report = fx.tree.insert(Some(fx.var), "report.txt").unwrap();

    assert_eq!(fx.tree.find("report.txt"), Some(fx.report));
    assert_eq!(fx.tree.find("/var/report.txt"), Some(second_report));
    assert_eq!(fx.tree.find("/home/missing"), None);
    assert_eq!(fx.tree.find("nothing"), None);
}
