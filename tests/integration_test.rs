//! Integration tests for document replication.
//!
//! These tests exchange changes between document replicas the way a server
//! would and check that every replica converges to the same content.

use crdt_sync::operation::MoveOperation;
use crdt_sync::{
    ActorId, Change, ChangeId, ChangePack, Checkpoint, Document, ElementValue, TimeTicket,
};
use serde_json::json;

fn replica(key: &str, actor: u8) -> Document {
    let mut doc = Document::new(key);
    doc.set_actor(ActorId::from_bytes([actor; 12]));
    doc
}

/// Delivers every pending change of `from` to `to`.
fn deliver(from: &Document, to: &mut Document) {
    let changes = from.create_change_pack().changes;
    let key = to.key().to_owned();
    to.apply_change_pack(ChangePack::new(key, Checkpoint::INITIAL, changes));
}

/// A seeded list `[1, 2, 3]` shared by two fresh replicas.
fn shared_list() -> (Document, Document, TimeTicket, Vec<TimeTicket>) {
    let mut seed = replica("doc", 1);
    let mut list = TimeTicket::INITIAL;
    let mut items = Vec::new();
    seed.update(|ctx| {
        let root = ctx.root_created_at();
        list = ctx.set(root, "list", ElementValue::Array)?;
        for value in 1..=3i64 {
            items.push(ctx.push(list, value)?);
        }
        Ok(())
    })
    .unwrap();

    let mut a = replica("doc", 0xaa);
    let mut b = replica("doc", 0xbb);
    deliver(&seed, &mut a);
    deliver(&seed, &mut b);
    (a, b, list, items)
}

#[test]
fn test_seeded_replicas_match() {
    let (a, b, _, _) = shared_list();
    assert_eq!(a.to_json(), json!({ "list": [1, 2, 3] }));
    assert_eq!(a.to_json(), b.to_json());
    assert!(!a.has_local_changes());
}

#[test]
fn test_concurrent_moves_converge() {
    let (mut a, mut b, list, items) = shared_list();

    a.update(|ctx| ctx.move_front(list, items[2])).unwrap();
    b.update(|ctx| ctx.move_after(list, items[0], items[2])).unwrap();
    assert_ne!(a.to_json(), b.to_json());

    let a_before = a.clone();
    deliver(&b, &mut a);
    deliver(&a_before, &mut b);

    assert_eq!(a.to_json(), b.to_json());
}

#[test]
fn test_move_tickets_decide_regardless_of_delivery_order() {
    let (mut a, mut b, list, items) = shared_list();
    let x = ActorId::from_bytes([10; 12]);
    let y = ActorId::from_bytes([20; 12]);

    let front = Change::new(
        ChangeId::new(1, 5, x),
        None,
        vec![MoveOperation::new(list, TimeTicket::INITIAL, items[2], TimeTicket::new(5, 0, x)).into()],
    );
    let after_first = Change::new(
        ChangeId::new(1, 7, y),
        None,
        vec![MoveOperation::new(list, items[0], items[2], TimeTicket::new(7, 0, y)).into()],
    );

    assert!(a.apply_change(&front));
    assert!(a.apply_change(&after_first));
    assert!(b.apply_change(&after_first));
    // Stale by the time it reaches b
    assert!(b.apply_change(&front));

    assert_eq!(a.to_json(), json!({ "list": [1, 3, 2] }));
    assert_eq!(a.to_json(), b.to_json());
}

#[test]
fn test_concurrent_inserts_and_removals_converge() {
    let (mut a, mut b, list, items) = shared_list();

    a.update(|ctx| {
        ctx.insert_after(list, items[0], "a")?;
        ctx.remove(list, items[1])
    })
    .unwrap();
    b.update(|ctx| {
        ctx.insert_after(list, items[0], "b")?;
        ctx.move_front(list, items[1])
    })
    .unwrap();

    let a_before = a.clone();
    deliver(&b, &mut a);
    deliver(&a_before, &mut b);

    assert_eq!(a.to_json(), b.to_json());
    // The removed element stays removed even though it was moved concurrently
    let rendered = a.to_json();
    assert!(!rendered["list"].as_array().unwrap().contains(&json!(2)));
}

#[test]
fn test_object_last_writer_wins_across_replicas() {
    let (mut a, mut b, _, _) = shared_list();

    a.update(|ctx| {
        let root = ctx.root_created_at();
        ctx.set(root, "title", "from a")?;
        Ok(())
    })
    .unwrap();
    b.update(|ctx| {
        let root = ctx.root_created_at();
        ctx.set(root, "title", "from b")?;
        Ok(())
    })
    .unwrap();

    let a_before = a.clone();
    deliver(&b, &mut a);
    deliver(&a_before, &mut b);

    assert_eq!(a.to_json(), b.to_json());
    // Same lamport on both sides, the larger actor id wins
    assert_eq!(a.to_json()["title"], json!("from b"));
}

#[test]
fn test_text_and_counter_replicate() {
    let mut a = replica("doc", 1);
    let mut b = replica("doc", 2);

    let mut text = TimeTicket::INITIAL;
    let mut counter = TimeTicket::INITIAL;
    a.update(|ctx| {
        let root = ctx.root_created_at();
        text = ctx.set(root, "note", ElementValue::Text("draft".into()))?;
        counter = ctx.set(root, "likes", ElementValue::Counter(0))?;
        Ok(())
    })
    .unwrap();
    deliver(&a, &mut b);

    let a_before = a.clone();
    a.update(|ctx| ctx.increment(counter, 2)).unwrap();
    b.update(|ctx| {
        ctx.increment(counter, 3)?;
        ctx.edit(text, "final")
    })
    .unwrap();

    let a_pending = a.clone();
    deliver(&b, &mut a);
    deliver(&a_pending, &mut b);

    assert_eq!(a.to_json(), json!({ "likes": 5, "note": "final" }));
    assert_eq!(a.to_json(), b.to_json());
    assert_eq!(a_before.to_json()["likes"], json!(0));
}

#[test]
fn test_redelivered_pack_is_harmless() {
    let (mut a, mut b, list, items) = shared_list();
    a.update(|ctx| ctx.move_front(list, items[1])).unwrap();

    deliver(&a, &mut b);
    let once = b.to_json();
    deliver(&a, &mut b);

    assert_eq!(b.to_json(), once);
    assert_eq!(b.to_json(), json!({ "list": [2, 1, 3] }));
}

#[test]
fn test_change_pack_serializes_for_the_wire() {
    let (mut a, _, list, items) = shared_list();
    a.update_with_message(Some("reorder"), |ctx| ctx.move_front(list, items[2]))
        .unwrap();

    let pack = a.create_change_pack();
    let encoded = serde_json::to_string(&pack).unwrap();
    let decoded: ChangePack = serde_json::from_str(&encoded).unwrap();

    assert_eq!(decoded, pack);
    assert_eq!(decoded.changes[0].message.as_deref(), Some("reorder"));
}

#[test]
fn test_edits_made_before_attach_converge() {
    let mut a = Document::new("doc");
    let mut b = Document::new("doc");
    a.update(|ctx| {
        let root = ctx.root_created_at();
        ctx.set(root, "from_a", 1i64)?;
        Ok(())
    })
    .unwrap();
    b.update(|ctx| {
        let root = ctx.root_created_at();
        ctx.set(root, "from_b", 2i64)?;
        Ok(())
    })
    .unwrap();

    // Both replicas issued the same ticket before learning their actor
    a.set_actor(ActorId::from_bytes([0xaa; 12]));
    b.set_actor(ActorId::from_bytes([0xbb; 12]));

    let a_before = a.clone();
    deliver(&b, &mut a);
    deliver(&a_before, &mut b);

    assert_eq!(a.to_json(), json!({ "from_a": 1, "from_b": 2 }));
    assert_eq!(a.to_json(), b.to_json());
}

#[test]
fn test_redelivered_increment_counts_once() {
    let (mut a, mut b, _, _) = shared_list();
    let mut likes = TimeTicket::INITIAL;
    a.update(|ctx| {
        let root = ctx.root_created_at();
        likes = ctx.set(root, "likes", ElementValue::Counter(0))?;
        ctx.increment(likes, 5)?;
        Ok(())
    })
    .unwrap();

    deliver(&a, &mut b);
    deliver(&a, &mut b);

    assert_eq!(b.to_json()["likes"], json!(5));
    assert_eq!(a.to_json(), b.to_json());
}
