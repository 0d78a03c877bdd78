//! Demo binary: two replicas of one document move the same array element
//! concurrently, exchange their changes and converge.
//!
//! Set `RUST_LOG=debug` to see the individual changes being applied.

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crdt_sync::{ActorId, ChangePack, Checkpoint, Document, ElementValue, Result, TimeTicket};

/// Hands every pending change of `from` to `to`, as a server would.
fn deliver(from: &Document, to: &mut Document) {
    let pending = from.create_change_pack();
    info!(
        "delivering {} change(s) from {} to {}",
        pending.change_size(),
        from.actor(),
        to.actor()
    );
    let key = to.key().to_owned();
    to.apply_change_pack(ChangePack::new(key, Checkpoint::INITIAL, pending.changes));
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut alice = Document::new("demo");
    alice.set_actor(ActorId::from_bytes([0xa1; 12]));
    let mut bob = Document::new("demo");
    bob.set_actor(ActorId::from_bytes([0xb2; 12]));

    let mut list = TimeTicket::INITIAL;
    let mut items = Vec::new();
    alice.update(|ctx| {
        let root = ctx.root_created_at();
        list = ctx.set(root, "list", ElementValue::Array)?;
        for value in 1..=3i64 {
            items.push(ctx.push(list, value)?);
        }
        Ok(())
    })?;
    deliver(&alice, &mut bob);
    info!("shared start: {}", bob.marshal()?);

    // Concurrent moves of the same element
    alice.update(|ctx| ctx.move_front(list, items[2]))?;
    bob.update(|ctx| ctx.move_after(list, items[0], items[2]))?;
    info!("alice before exchange: {}", alice.marshal()?);
    info!("bob before exchange: {}", bob.marshal()?);

    let alice_pending = alice.clone();
    deliver(&bob, &mut alice);
    deliver(&alice_pending, &mut bob);

    info!("alice: {}", alice.marshal()?);
    info!("bob: {}", bob.marshal()?);
    if alice.to_json() == bob.to_json() {
        info!("replicas converged");
    } else {
        warn!("replicas diverged");
    }
    Ok(())
}
