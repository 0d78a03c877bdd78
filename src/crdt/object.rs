//! Keyed members of the `Object` element.
//!
//! An object remembers every value ever set under each key. The value with the
//! greatest creation ticket owns the key; earlier ones are tombstoned by the
//! root when they lose.

use std::collections::BTreeMap;

use crate::crdt::types::{ActorId, TimeTicket};

/// A value stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMember {
    pub key: String,
    pub created_at: TimeTicket,
}

/// Keyed children of an object element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectElement {
    members: Vec<ObjectMember>,
}

impl ObjectElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every member, losers and tombstones included.
    pub fn tickets(&self) -> impl Iterator<Item = TimeTicket> + '_ {
        self.members.iter().map(|m| m.created_at)
    }

    /// The value currently owning `key`, removed or not.
    pub fn winner(&self, key: &str) -> Option<TimeTicket> {
        self.members
            .iter()
            .filter(|m| m.key == key)
            .map(|m| m.created_at)
            .max()
    }

    /// Winning value per key, sorted by key.
    pub fn winners(&self) -> BTreeMap<&str, TimeTicket> {
        let mut winners: BTreeMap<&str, TimeTicket> = BTreeMap::new();
        for member in &self.members {
            winners
                .entry(member.key.as_str())
                .and_modify(|t| {
                    if member.created_at.after(t) {
                        *t = member.created_at;
                    }
                })
                .or_insert(member.created_at);
        }
        winners
    }

    /// Key under which `created_at` was set.
    pub fn key_of(&self, created_at: &TimeTicket) -> Option<&str> {
        self.members
            .iter()
            .find(|m| m.created_at == *created_at)
            .map(|m| m.key.as_str())
    }

    /// Records a value under `key` and returns the winner before the insert.
    pub fn insert(&mut self, key: impl Into<String>, created_at: TimeTicket) -> Option<TimeTicket> {
        let key = key.into();
        let previous = self.winner(&key);
        self.members.push(ObjectMember { key, created_at });
        previous
    }

    pub(crate) fn set_actor(&mut self, actor: ActorId) {
        for member in &mut self.members {
            member.created_at = member.created_at.claimed_by(actor);
        }
    }

    pub(crate) fn purge(&mut self, created_at: &TimeTicket) {
        self.members.retain(|m| m.created_at != *created_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(lamport: u64) -> TimeTicket {
        TimeTicket::new(lamport, 1, ActorId::from_bytes([3; 12]))
    }

    #[test]
    fn test_latest_member_wins_key() {
        let mut object = ObjectElement::new();
        assert_eq!(object.insert("k", ticket(5)), None);
        assert_eq!(object.insert("k", ticket(3)), Some(ticket(5)));
        assert_eq!(object.winner("k"), Some(ticket(5)));

        assert_eq!(object.insert("k", ticket(8)), Some(ticket(5)));
        assert_eq!(object.winner("k"), Some(ticket(8)));
        assert_eq!(object.tickets().count(), 3);
    }

    #[test]
    fn test_winners_sorted_by_key() {
        let mut object = ObjectElement::new();
        object.insert("b", ticket(1));
        object.insert("a", ticket(2));
        object.insert("b", ticket(4));

        let winners: Vec<_> = object.winners().into_iter().collect();
        assert_eq!(winners, vec![("a", ticket(2)), ("b", ticket(4))]);
        assert_eq!(object.key_of(&ticket(1)), Some("b"));
    }
}
