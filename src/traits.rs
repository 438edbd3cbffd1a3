use std::collections::HashSet;

use crate::types::{Entity, EntityUid};

/// Read-only lookup of entities and their ancestry.
///
/// The evaluator only reads through this trait and never holds on to what it
/// returns past a single evaluation call. Implementations shared between
/// threads must be safe for concurrent reads.
pub trait EntitySource {
    /// The entity with this uid, `None` if the store does not know it.
    fn entity(&self, uid: &EntityUid) -> Option<&Entity>;

    /// The ancestor closure of `uid`: every entity it is transitively in.
    fn ancestors(&self, uid: &EntityUid) -> Option<&HashSet<EntityUid>> {
        self.entity(uid).map(Entity::ancestors)
    }

    /// True if `uid` is `parent` or has `parent` in its ancestor closure.
    ///
    /// A uid the store does not know is only ever "in" itself.
    fn is_descendant_of(&self, uid: &EntityUid, parent: &EntityUid) -> bool {
        uid == parent
            || self
                .ancestors(uid)
                .is_some_and(|ancestors| ancestors.contains(parent))
    }
}
