//! Entities and the in-memory entity store.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::PolicyError;
use crate::traits::EntitySource;

use super::{EntityUid, Record, Value};

/// A node in the authorization graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    uid: EntityUid,
    #[serde(default)]
    attrs: Record,
    /// Direct parents as given, widened to the full ancestor closure once the
    /// entity is placed in an [`Entities`] store.
    #[serde(default, rename = "parents")]
    ancestors: HashSet<EntityUid>,
}

impl Entity {
    pub fn new(
        uid: EntityUid,
        attrs: Record,
        parents: impl IntoIterator<Item = EntityUid>,
    ) -> Self {
        Entity {
            uid,
            attrs,
            ancestors: parents.into_iter().collect(),
        }
    }

    /// An entity with no attributes and no parents.
    pub fn with_uid(uid: EntityUid) -> Self {
        Self::new(uid, Record::new(), [])
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    pub fn with_parent(mut self, parent: EntityUid) -> Self {
        self.ancestors.insert(parent);
        self
    }

    pub fn uid(&self) -> &EntityUid {
        &self.uid
    }

    pub fn attrs(&self) -> &Record {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    pub fn ancestors(&self) -> &HashSet<EntityUid> {
        &self.ancestors
    }
}

/// Hash-map backed [`EntitySource`].
///
/// Construction computes every entity's ancestor closure, so lookups during
/// evaluation are a flat membership test.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities {
    entities: HashMap<EntityUid, Entity>,
}

impl Entities {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from entities carrying their direct parent edges.
    ///
    /// Parent edges may form cycles and may name entities that are not part
    /// of the store. A uid given twice is an error.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self, PolicyError> {
        let mut map: HashMap<EntityUid, Entity> = HashMap::new();
        for entity in entities {
            if map.contains_key(entity.uid()) {
                return Err(PolicyError::EntityError(format!(
                    "duplicate entity uid: {}",
                    entity.uid()
                )));
            }
            map.insert(entity.uid().clone(), entity);
        }

        compute_closure(&mut map);
        debug!(event = "Entities", phase = "Closure", entities = map.len());

        Ok(Entities { entities: map })
    }

    pub fn get(&self, uid: &EntityUid) -> Option<&Entity> {
        self.entities.get(uid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntitySource for Entities {
    fn entity(&self, uid: &EntityUid) -> Option<&Entity> {
        self.entities.get(uid)
    }
}

/// Replace direct parents with the transitive closure. An entity never lists
/// itself as an ancestor, even when it sits on a cycle.
fn compute_closure(entities: &mut HashMap<EntityUid, Entity>) {
    let parents: HashMap<EntityUid, Vec<EntityUid>> = entities
        .iter()
        .map(|(uid, entity)| (uid.clone(), entity.ancestors.iter().cloned().collect()))
        .collect();

    for (uid, entity) in entities.iter_mut() {
        let mut closure: HashSet<EntityUid> = HashSet::new();
        let mut stack: Vec<&EntityUid> = parents.get(uid).into_iter().flatten().collect();

        while let Some(next) = stack.pop() {
            if next == uid || !closure.insert(next.clone()) {
                continue;
            }
            if let Some(grandparents) = parents.get(next) {
                stack.extend(grandparents.iter());
            }
        }

        entity.ancestors = closure;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(ty: &str, id: &str) -> EntityUid {
        EntityUid::new(ty, id)
    }

    #[test]
    fn test_transitive_closure() {
        let entities = Entities::from_entities([
            Entity::with_uid(uid("User", "alice")).with_parent(uid("Group", "devs")),
            Entity::with_uid(uid("Group", "devs")).with_parent(uid("Group", "staff")),
            Entity::with_uid(uid("Group", "staff")).with_parent(uid("Org", "acme")),
        ])
        .unwrap();

        let alice = entities.ancestors(&uid("User", "alice")).unwrap();
        assert_eq!(alice.len(), 3);
        assert!(alice.contains(&uid("Org", "acme")));
        assert!(entities.is_descendant_of(&uid("User", "alice"), &uid("Group", "staff")));
        assert!(!entities.is_descendant_of(&uid("Group", "staff"), &uid("User", "alice")));
    }

    #[test]
    fn test_cycle_terminates() {
        let entities = Entities::from_entities([
            Entity::with_uid(uid("Group", "a")).with_parent(uid("Group", "b")),
            Entity::with_uid(uid("Group", "b")).with_parent(uid("Group", "c")),
            Entity::with_uid(uid("Group", "c")).with_parent(uid("Group", "a")),
        ])
        .unwrap();

        let a = entities.ancestors(&uid("Group", "a")).unwrap();
        assert_eq!(a.len(), 2);
        assert!(!a.contains(&uid("Group", "a")));
        assert!(entities.is_descendant_of(&uid("Group", "c"), &uid("Group", "b")));
    }

    #[test]
    fn test_parent_outside_store() {
        let entities = Entities::from_entities([
            Entity::with_uid(uid("User", "bob")).with_parent(uid("Group", "ghosts"))
        ])
        .unwrap();
        assert!(entities.is_descendant_of(&uid("User", "bob"), &uid("Group", "ghosts")));
        assert!(entities.get(&uid("Group", "ghosts")).is_none());
    }

    #[test]
    fn test_unknown_uid_is_only_in_itself() {
        let entities = Entities::empty();
        let carol = uid("User", "carol");
        assert!(entities.is_descendant_of(&carol, &carol));
        assert!(!entities.is_descendant_of(&carol, &uid("Group", "devs")));
        assert!(entities.ancestors(&carol).is_none());
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let result = Entities::from_entities([
            Entity::with_uid(uid("User", "alice")),
            Entity::with_uid(uid("User", "alice")).with_attr("age", 3i64),
        ]);
        assert!(matches!(result, Err(PolicyError::EntityError(msg)) if msg.contains("alice")));
    }

    #[test]
    fn test_entity_deserialization() {
        let entity: Entity = serde_json::from_value(serde_json::json!({
            "uid": {"type": "User", "id": "alice"},
            "attrs": {"age": {"Long": 30}},
            "parents": [{"type": "Group", "id": "devs"}]
        }))
        .unwrap();
        assert_eq!(entity.attr("age"), Some(&Value::Long(30)));
        assert!(entity.ancestors().contains(&uid("Group", "devs")));
    }
}
