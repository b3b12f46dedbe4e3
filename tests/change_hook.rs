// Change-hook behavior through the public API.
//
// The contract under test:
// - The hook fires exactly once per logical mutation, before it applies,
//   with Some(key) for keyed operations and None for clear.
// - A rejecting hook aborts the mutation with MapError::Rejected and the
//   map is left bit-for-bit unchanged: len, values, entry identities.
// - A remove that finds no bucket performs no mutation and stays silent.
use retained_map::{ChangeHook, MapError, RejectedChange, RetainedMap};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Records every notification; rejects while `frozen` is set.
struct Recorder {
    seen: Rc<RefCell<Vec<Option<String>>>>,
    frozen: Rc<Cell<bool>>,
}

impl ChangeHook<String> for Recorder {
    fn before_change(&mut self, key: Option<&String>) -> Result<(), RejectedChange> {
        self.seen.borrow_mut().push(key.cloned());
        if self.frozen.get() {
            Err(RejectedChange)
        } else {
            Ok(())
        }
    }
}

fn recorded_map() -> (
    RetainedMap<String, i32>,
    Rc<RefCell<Vec<Option<String>>>>,
    Rc<Cell<bool>>,
) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let frozen = Rc::new(Cell::new(false));
    let map = RetainedMap::with_capacity(8).with_hook(Recorder {
        seen: seen.clone(),
        frozen: frozen.clone(),
    });
    (map, seen, frozen)
}

// Test: one notification per logical mutation, in order, with the right key.
#[test]
fn hook_fires_once_per_mutation() {
    let (mut m, seen, _) = recorded_map();

    m.insert("a".to_string(), 1).unwrap();
    m.insert("a".to_string(), 2).unwrap(); // update in place: still one call
    m.remove("a").unwrap();
    m.remove("missing").unwrap(); // no bucket, no mutation, no call
    m.clear().unwrap();

    let seen = seen.borrow();
    assert_eq!(
        *seen,
        vec![
            Some("a".to_string()),
            Some("a".to_string()),
            Some("a".to_string()),
            None,
        ]
    );
}

// Test: handle writes and cursor writes notify with the stored key.
#[test]
fn handle_and_cursor_paths_notify() {
    let (mut m, seen, _) = recorded_map();
    m.insert("k".to_string(), 1).unwrap();
    seen.borrow_mut().clear();

    let h = m.entry("k").unwrap();
    h.set(&mut m, Some(2)).unwrap();
    h.set(&mut m, None).unwrap();
    h.set(&mut m, Some(3)).unwrap();

    let mut cursor = m.entries_mut();
    cursor.next().expect("entry present");
    cursor.set_current(Some(4)).unwrap();
    cursor.remove_current().unwrap();
    drop(cursor);

    assert_eq!(
        *seen.borrow(),
        vec![Some("k".to_string()); 5],
        "each write is exactly one notification"
    );
}

// Test: rejection leaves the map unchanged on every mutation path.
#[test]
fn rejection_leaves_map_unchanged() {
    let (mut m, seen, frozen) = recorded_map();
    m.insert("a".to_string(), 1).unwrap();
    m.insert("b".to_string(), 2).unwrap();
    let ha = m.entry("a").unwrap();
    let hb = m.entry("b").unwrap();

    frozen.set(true);
    seen.borrow_mut().clear();

    assert_eq!(m.insert("a".to_string(), 9), Err(MapError::Rejected));
    assert_eq!(m.insert("c".to_string(), 9), Err(MapError::Rejected));
    assert_eq!(m.remove("a"), Err(MapError::Rejected));
    assert_eq!(m.clear(), Err(MapError::Rejected));
    assert_eq!(ha.set(&mut m, None), Err(MapError::Rejected));
    assert_eq!(m.get_mut("a"), Err(MapError::Rejected));

    // Untouched: size, values, identities.
    assert_eq!(m.len(), 2);
    assert_eq!(m.get("a"), Some(&1));
    assert_eq!(m.get("b"), Some(&2));
    assert_eq!(m.entry("a"), Some(ha));
    assert_eq!(m.entry("b"), Some(hb));
    assert!(m.entry("c").is_none(), "rejected insert must not create a bucket");
    assert_eq!(seen.borrow().len(), 6, "every attempt notified exactly once");
}

// Test: a rejected cursor removal keeps the cursor position for retry.
#[test]
fn rejected_cursor_removal_can_be_retried() {
    let (mut m, _, frozen) = recorded_map();
    m.insert("k".to_string(), 1).unwrap();

    let mut cursor = m.entries_mut();
    cursor.next().expect("entry present");

    frozen.set(true);
    assert_eq!(cursor.remove_current(), Err(MapError::Rejected));

    frozen.set(false);
    assert_eq!(cursor.remove_current().unwrap(), Some(1));
    drop(cursor);
    assert_eq!(m.len(), 0);
}

// Test: closures work as hooks through the blanket impl.
#[test]
fn closure_hook_counts_mutations() {
    let calls = Rc::new(Cell::new(0u32));
    let counter = calls.clone();
    let mut m: RetainedMap<String, i32> =
        RetainedMap::with_capacity(4).with_hook(move |_key: Option<&String>| {
            counter.set(counter.get() + 1);
            Ok(())
        });

    m.insert("x".to_string(), 1).unwrap();
    m.remove("x").unwrap();
    m.clear().unwrap();
    assert_eq!(calls.get(), 3);
}
