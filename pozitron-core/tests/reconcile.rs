//! Integration Tests for List Reconcilers
//!
//! Lists are rendered into `MemoryNode` trees and checked by shape and by
//! node identity.

use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use pozitron_core::list::{For, HostNode, Index, KeyField, KeyFn, MemoryNode};
use pozitron_core::reactive::{memo, signal, Store};
use pozitron_core::Error;

/// Renders labelled elements and counts how many were created.
fn renderer() -> (Rc<Cell<usize>>, impl Fn(&&'static str) -> MemoryNode + 'static) {
    let count = Rc::new(Cell::new(0));
    let render = {
        let count = count.clone();
        move |item: &&'static str| {
            count.set(count.get() + 1);
            MemoryNode::element(*item)
        }
    };
    (count, render)
}

fn labels(nodes: &[MemoryNode]) -> Vec<String> {
    nodes.iter().map(MemoryNode::label).collect()
}

/// Test that reversing a keyed list moves every node and renders none.
#[test]
fn reverse_recycles_every_node() {
    let root = MemoryNode::element("ul");
    let (items, set_items) = signal(vec!["a", "b", "c", "d"]);
    let (rendered, render) = renderer();

    let list = For::new(items, render).mount(&root).unwrap();
    let before = list.nodes();
    assert_eq!(rendered.get(), 4);

    set_items.set(vec!["d", "c", "b", "a"]);

    assert_eq!(rendered.get(), 4);
    assert_eq!(root.child_labels(), ["d", "c", "b", "a"]);
    let after = list.nodes();
    for (index, node) in before.iter().enumerate() {
        assert_eq!(&after[3 - index], node);
    }
}

/// Test that replacing the middle item keeps its neighbours.
#[test]
fn mixed_edit_touches_only_the_middle() {
    let root = MemoryNode::element("ul");
    let (items, set_items) = signal(vec!["a", "b", "c"]);
    let (rendered, render) = renderer();

    let list = For::new(items, render).mount(&root).unwrap();
    let a = list.node_for(&"a").unwrap();
    let c = list.node_for(&"c").unwrap();

    set_items.set(vec!["a", "x", "c"]);

    assert_eq!(rendered.get(), 4);
    assert_eq!(root.child_labels(), ["a", "x", "c"]);
    assert_eq!(list.node_for(&"a").unwrap(), a);
    assert_eq!(list.node_for(&"c").unwrap(), c);
    assert_eq!(list.node_for(&"b"), Err(Error::StaleKey));
}

/// Test that the list always owns one host node, and `on_ref` sees `[]`
/// exactly when the collection is empty.
#[test]
fn empty_transitions_keep_a_placeholder() {
    let root = MemoryNode::element("ul");
    let (items, set_items) = signal(Vec::<&'static str>::new());
    let (_, render) = renderer();
    let refs = Rc::new(RefCell::new(Vec::new()));

    let list = For::new(items, render)
        .on_ref({
            let refs = refs.clone();
            move |nodes: &[MemoryNode]| refs.borrow_mut().push(labels(nodes))
        })
        .mount(&root)
        .unwrap();

    assert_eq!(root.child_labels(), ["#placeholder"]);
    assert!(list.is_empty());

    set_items.set(vec!["a"]);
    assert_eq!(root.child_labels(), ["a"]);
    assert_eq!(list.len(), 1);

    set_items.set(Vec::new());
    assert_eq!(root.child_labels(), ["#placeholder"]);
    assert_eq!(list.host_nodes().len(), 1);
    assert!(list.nodes().is_empty());

    let expected: Vec<Vec<String>> = vec![vec![], vec!["a".into()], vec![]];
    assert_eq!(*refs.borrow(), expected);
}

/// Test that a list between siblings grows and shrinks in place.
#[test]
fn list_between_siblings() {
    let root = MemoryNode::element("ul");
    root.append_child(&MemoryNode::element("header"));
    let (items, set_items) = signal(vec!["a", "b", "c", "d"]);
    let (rendered, render) = renderer();

    let list = For::new(items, render).mount(&root).unwrap();
    root.append_child(&MemoryNode::element("footer"));

    set_items.set(vec!["b"]);
    assert_eq!(root.child_labels(), ["header", "b", "footer"]);

    set_items.set(Vec::new());
    assert_eq!(root.child_labels(), ["header", "#placeholder", "footer"]);

    set_items.set(vec!["e", "b"]);
    assert_eq!(root.child_labels(), ["header", "e", "b", "footer"]);
    assert_eq!(list.keys(), ["e", "b"]);
    // Only "e" and the second "b" were new renders.
    assert_eq!(rendered.get(), 6);
}

/// Test that a sole-content list shrinking to one item reuses only its
/// first node.
#[test]
fn sole_content_shrink_reuses_first_node_only() {
    let root = MemoryNode::element("ul");
    let (items, set_items) = signal(vec!["a", "x", "y"]);
    let (rendered, render) = renderer();

    let list = For::new(items, render).mount(&root).unwrap();
    let a = list.node_for(&"a").unwrap();

    set_items.set(vec!["a"]);
    assert_eq!(root.child_labels(), ["a"]);
    assert_eq!(list.node_for(&"a").unwrap(), a);
    assert_eq!(rendered.get(), 3);

    set_items.set(vec!["a", "x"]);
    assert_eq!(rendered.get(), 4);
    let x = list.node_for(&"x").unwrap();

    set_items.set(vec!["x"]);
    assert_eq!(root.child_labels(), ["x"]);
    assert_ne!(list.node_for(&"x").unwrap(), x);
    assert_eq!(rendered.get(), 5);
}

/// Test that duplicate keys are refused when mounting.
#[test]
fn duplicate_keys_fail_at_mount() {
    let root = MemoryNode::element("ul");
    let (items, _) = signal(vec!["a", "b", "a"]);
    let (rendered, render) = renderer();

    let result = For::new(items, render).mount(&root);

    assert_eq!(result.err(), Some(Error::DuplicateKey { index: 2 }));
    assert!(root.children().is_empty());
    assert_eq!(rendered.get(), 0);
}

/// Test that a duplicate arriving later fails fast and leaves the list usable.
#[test]
fn duplicate_keys_fail_on_update() {
    let root = MemoryNode::element("ul");
    let (items, set_items) = signal(vec!["a", "b"]);
    let (_, render) = renderer();
    let list = For::new(items, render).mount(&root).unwrap();

    let result = panic::catch_unwind(AssertUnwindSafe(|| set_items.set(vec!["b", "b"])));
    assert!(result.is_err());
    assert_eq!(root.child_labels(), ["a", "b"]);

    set_items.set(vec!["b", "c"]);
    assert_eq!(root.child_labels(), ["b", "c"]);
    assert!(list.is_active());
}

/// Test that updating a list that was taken out of the tree fails fast.
#[test]
#[should_panic(expected = "list is not mounted under a parent host node")]
fn detached_list_fails_on_update() {
    let root = MemoryNode::element("ul");
    let (items, set_items) = signal(vec!["a"]);
    let (_, render) = renderer();
    let _list = For::new(items, render).mount(&root).unwrap();

    root.clear_children();
    set_items.set(vec!["a", "b"]);
}

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    id: u32,
    title: &'static str,
}

impl KeyField<u32> for Todo {
    fn key_field(&self, name: &str) -> Option<u32> {
        match name {
            "id" => Some(self.id),
            _ => None,
        }
    }
}

fn todo(id: u32, title: &'static str) -> Todo {
    Todo { id, title }
}

/// Test that a field key ignores content changes on the same key.
#[test]
fn field_key_tracks_identity_not_content() {
    let root = MemoryNode::element("ul");
    let (todos, set_todos) = signal(vec![todo(1, "milk"), todo(2, "eggs")]);
    let renders = Rc::new(Cell::new(0));

    let list = For::keyed(todos, KeyFn::<Todo, u32>::field("id"), {
        let renders = renders.clone();
        move |todo: &Todo| {
            renders.set(renders.get() + 1);
            MemoryNode::element(todo.title)
        }
    })
    .mount(&root)
    .unwrap();

    set_todos.set(vec![todo(2, "more eggs"), todo(1, "milk")]);

    assert_eq!(renders.get(), 2);
    // Content changes are invisible to the reconciler.
    assert_eq!(root.child_labels(), ["eggs", "milk"]);
    assert_eq!(list.keys(), [2, 1]);
}

/// Test that a function key can be set on the builder.
#[test]
fn builder_key_switches_key_type() {
    let root = MemoryNode::element("ul");
    let (todos, set_todos) = signal(vec![todo(1, "a"), todo(2, "b")]);

    let list = For::keyed(todos, KeyFn::new(|todo: &Todo| todo.title), |todo: &Todo| {
        MemoryNode::element(todo.title)
    })
    .key(KeyFn::new(|todo: &Todo| todo.id))
    .name("todos")
    .mount(&root)
    .unwrap();

    let first = list.node_for(&1).unwrap();
    set_todos.set(vec![todo(3, "c"), todo(1, "a")]);

    assert_eq!(root.child_labels(), ["c", "a"]);
    assert_eq!(list.node_for(&1).unwrap(), first);
    assert_eq!(list.node_for(&2).err(), Some(Error::StaleKey));
}

/// Test that a store mutated in place drives the list.
#[test]
fn store_mutation_updates_list() {
    let root = MemoryNode::element("ul");
    let store = Store::new(vec!["a"]);
    let (_, render) = renderer();

    let _list = For::new(store.clone(), render).mount(&root).unwrap();

    store.update(|items| items.push("b"));
    store.update(|items| items.insert(0, "z"));

    assert_eq!(root.child_labels(), ["z", "a", "b"]);
}

/// Test that a list can follow a derived collection.
#[test]
fn list_over_memo() {
    let root = MemoryNode::element("ul");
    let (words, set_words) = signal(vec!["apple", "kiwi", "banana"]);
    let long = memo(move || {
        words
            .get()
            .into_iter()
            .filter(|word| word.len() > 4)
            .collect::<Vec<_>>()
    });
    let (_, render) = renderer();

    let _list = For::new(long, render).mount(&root).unwrap();
    assert_eq!(root.child_labels(), ["apple", "banana"]);

    set_words.set(vec!["fig", "cherry", "apple"]);
    assert_eq!(root.child_labels(), ["cherry", "apple"]);
}

/// Test that a disposed list stops following its collection.
#[test]
fn disposed_list_stops_updating() {
    let root = MemoryNode::element("ul");
    let (items, set_items) = signal(vec!["a"]);
    let (_, render) = renderer();
    let list = For::new(items.clone(), render).mount(&root).unwrap();

    list.dispose();
    set_items.set(vec!["b", "c"]);

    assert!(!list.is_active());
    assert_eq!(items.observer_count(), 0);
    assert_eq!(root.child_labels(), ["a"]);
}

/// Test that the positional list re-renders changed positions only.
#[test]
fn index_rerenders_changed_positions() {
    let root = MemoryNode::element("ol");
    let (items, set_items) = signal(vec!["a", "b", "c"]);
    let calls = Rc::new(RefCell::new(Vec::new()));

    let list = Index::new(items, {
        let calls = calls.clone();
        move |item: &&'static str, index| {
            calls.borrow_mut().push(index);
            MemoryNode::element(format!("{index}:{item}"))
        }
    })
    .mount(&root)
    .unwrap();
    let first = list.nodes()[0].clone();

    // A move is a content change at both positions.
    set_items.set(vec!["a", "c", "b"]);
    assert_eq!(root.child_labels(), ["0:a", "1:c", "2:b"]);
    assert_eq!(list.nodes()[0], first);
    assert_eq!(*calls.borrow(), vec![0, 1, 2, 1, 2]);

    set_items.set(vec!["a", "c", "b", "d"]);
    assert_eq!(root.child_labels(), ["0:a", "1:c", "2:b", "3:d"]);

    set_items.set(vec!["a"]);
    assert_eq!(root.child_labels(), ["0:a"]);
    assert_eq!(list.nodes(), vec![first]);
}

/// Test the positional list through the empty state and back.
#[test]
fn index_empty_transitions() {
    let root = MemoryNode::element("ol");
    root.append_child(&MemoryNode::element("caption"));
    let (items, set_items) = signal(vec![1, 2]);
    let refs = Rc::new(Cell::new(0));

    let list = Index::new(items, |item: &i32, _| MemoryNode::element(item.to_string()))
        .on_ref({
            let refs = refs.clone();
            move |nodes: &[MemoryNode]| refs.set(nodes.len())
        })
        .mount(&root)
        .unwrap();

    set_items.set(Vec::new());
    assert_eq!(root.child_labels(), ["caption", "#placeholder"]);
    assert_eq!(refs.get(), 0);
    assert!(list.is_empty());

    set_items.set(vec![3, 4, 5]);
    assert_eq!(root.child_labels(), ["caption", "3", "4", "5"]);
    assert_eq!(refs.get(), 3);
    assert!(root.last_child().is_some_and(|node| !node.is_placeholder()));
}
