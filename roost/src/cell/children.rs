//! Child table of a cell.
//!
//! Names are claimed with an atomic insert-if-absent of a `Reserved` entry,
//! promoted to `Live` once the child has started, and released again if the
//! start fails or unwinds.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use roost_api::actor_ref::ActorRef;
use roost_api::errors::ActorError;
use roost_api::path::ActorPath;
use roost_api::types::ActorResult;

const NAME_ALPHABET: &[u8; 64] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+~";

#[derive(Debug, Clone)]
pub(crate) enum ChildEntry {
    Reserved,
    Live(ActorRef),
}

#[derive(Debug, Default)]
pub(crate) struct Children {
    table: DashMap<String, ChildEntry>,
    uid: AtomicU64,
}

impl Children {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Next child uid. Starts at 1; 0 means "unspecified".
    pub(crate) fn next_uid(&self) -> u64 {
        self.uid.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Chooses the child's name: a validated user name, or one synthesized
    /// from the uid.
    pub(crate) fn child_name(name: Option<&str>, uid: u64) -> ActorResult<String> {
        match name {
            Some(name) => {
                ActorPath::validate_element(name)?;
                if name.starts_with('$') {
                    return Err(ActorError::InvalidActorName(name.to_string()));
                }
                Ok(name.to_string())
            }
            None => Ok(synthesize_name(uid)),
        }
    }

    pub(crate) fn reserve(&self, name: &str) -> ActorResult<Reservation<'_>> {
        match self.table.entry(name.to_string()) {
            Entry::Occupied(_) => Err(ActorError::DuplicateName(name.to_string())),
            Entry::Vacant(vacant) => {
                vacant.insert(ChildEntry::Reserved);
                Ok(Reservation {
                    children: self,
                    name: name.to_string(),
                    committed: false,
                })
            }
        }
    }

    /// Live child; reserved and missing names are `Nobody`.
    pub(crate) fn get(&self, name: &str) -> ActorRef {
        match self.table.get(name).map(|entry| entry.value().clone()) {
            Some(ChildEntry::Live(child)) => child,
            _ => ActorRef::Nobody,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_reserved(&self, name: &str) -> bool {
        matches!(
            self.table.get(name).as_deref(),
            Some(ChildEntry::Reserved)
        )
    }

    pub(crate) fn snapshot(&self) -> Vec<ActorRef> {
        self.table
            .iter()
            .filter_map(|entry| match entry.value() {
                ChildEntry::Live(child) => Some(child.clone()),
                ChildEntry::Reserved => None,
            })
            .collect()
    }

    /// Removes `name` only if it is still bound to `child`.
    pub(crate) fn remove(&self, name: &str, child: &ActorRef) -> bool {
        self.table
            .remove_if(name, |_, entry| matches!(entry, ChildEntry::Live(live) if live == child))
            .is_some()
    }
}

/// Claim on a child name. Dropping it without `commit` releases the name.
pub(crate) struct Reservation<'a> {
    children: &'a Children,
    name: String,
    committed: bool,
}

impl Reservation<'_> {
    /// Promotes the reservation to a live child.
    ///
    /// # Panics
    /// If the entry is no longer `Reserved`; only the reservation holder may
    /// touch it, so this is a broken invariant.
    pub(crate) fn commit(mut self, child: ActorRef) {
        let promoted = match self.children.table.get_mut(&self.name) {
            Some(mut entry) if matches!(*entry, ChildEntry::Reserved) => {
                *entry = ChildEntry::Live(child);
                true
            }
            _ => false,
        };
        assert!(promoted, "reservation for child [{}] lost before promotion", self.name);
        self.committed = true;
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.children
                .table
                .remove_if(&self.name, |_, entry| matches!(entry, ChildEntry::Reserved));
        }
    }
}

/// `$` followed by the uid in little-endian 6-bit groups.
pub(crate) fn synthesize_name(uid: u64) -> String {
    let mut name = String::from("$");
    let mut rest = uid;
    loop {
        name.push(NAME_ALPHABET[(rest & 63) as usize] as char);
        rest >>= 6;
        if rest == 0 {
            break;
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use roost_api::actor_ref::DeadLetterActorRef;
    use roost_api::path::Address;

    fn some_ref(name: &str) -> ActorRef {
        ActorRef::DeadLetters(DeadLetterActorRef::new(
            ActorPath::root(Address::new("roost", "children")) / name,
        ))
    }

    #[test]
    fn test_synthesized_names() {
        assert_eq!(synthesize_name(0), "$a");
        assert_eq!(synthesize_name(1), "$b");
        assert_eq!(synthesize_name(63), "$~");
        assert_eq!(synthesize_name(64), "$ab");
        assert_eq!(synthesize_name(65), "$bb");
    }

    #[test]
    fn test_uids_start_at_one() {
        let children = Children::new();
        assert_eq!(children.next_uid(), 1);
        assert_eq!(children.next_uid(), 2);
    }

    #[test]
    fn test_user_names_cannot_look_synthesized() {
        assert!(matches!(
            Children::child_name(Some("$a"), 1),
            Err(ActorError::InvalidActorName(_))
        ));
        assert!(matches!(
            Children::child_name(Some("a/b"), 1),
            Err(ActorError::InvalidActorName(_))
        ));
        assert_eq!(Children::child_name(None, 2).unwrap(), "$c");
    }

    #[test]
    fn test_reservation_blocks_duplicates_and_hides_child() {
        let children = Children::new();
        let reservation = children.reserve("a").unwrap();

        assert!(matches!(children.reserve("a"), Err(ActorError::DuplicateName(_))));
        assert!(children.get("a").is_nobody());
        assert!(children.snapshot().is_empty());

        let child = some_ref("a");
        reservation.commit(child.clone());
        assert_eq!(children.get("a"), child);
        assert_eq!(children.snapshot(), vec![child]);
    }

    #[test]
    fn test_dropped_reservation_releases_name() {
        let children = Children::new();
        {
            let _reservation = children.reserve("a").unwrap();
            assert!(children.is_reserved("a"));
        }
        assert!(!children.is_reserved("a"));
        assert!(children.reserve("a").is_ok());
    }

    #[test]
    fn test_remove_only_matching_child() {
        let children = Children::new();
        let child = some_ref("a");
        children.reserve("a").unwrap().commit(child.clone());

        assert!(!children.remove("a", &some_ref("a")));
        assert!(children.remove("a", &child));
        assert!(children.get("a").is_nobody());
    }
}
