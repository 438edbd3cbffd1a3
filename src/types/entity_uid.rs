//! Entity type names and entity identifiers.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PolicyError;

/// A possibly namespaced entity type name, e.g. `User` or `Infra::Host`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        EntityType(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The last path segment, `Host` for `Infra::Host`.
    pub fn basename(&self) -> &str {
        self.0.rsplit("::").next().unwrap_or(&self.0)
    }

    /// Everything before the basename, empty when not namespaced.
    pub fn namespace(&self) -> &str {
        match self.0.rfind("::") {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(value: &str) -> Self {
        EntityType::new(value)
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        EntityType(value)
    }
}

/// A unique entity reference: a type name plus an opaque identifier.
///
/// Two uids are equal only if both parts are equal; nothing else about the
/// identifier is interpreted.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub struct EntityUid {
    #[serde(rename = "type")]
    ty: EntityType,
    id: String,
}

impl EntityUid {
    pub fn new(ty: impl Into<EntityType>, id: impl Into<String>) -> Self {
        EntityUid {
            ty: ty.into(),
            id: id.into(),
        }
    }

    pub fn entity_type(&self) -> &EntityType {
        &self.ty
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Display for EntityUid {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}::{:?}", self.ty, self.id)
    }
}

impl FromStr for EntityUid {
    type Err = PolicyError;

    /// Accepts:
    /// - User::"alice"
    /// - User::alice
    /// - Infra::Host::"web-01.example.com"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // A quoted id may itself contain `::`, so split at the opening quote first.
        let (type_part, id) = match s.find("::\"") {
            Some(idx) if s.ends_with('"') && s.len() > idx + 3 => {
                (&s[..idx], &s[idx + 3..s.len() - 1])
            }
            Some(_) => {
                return Err(PolicyError::InvalidFormat(format!(
                    "Failed to parse entity uid: unterminated quoted id in '{s}'"
                )));
            }
            None => s.rsplit_once("::").ok_or_else(|| {
                PolicyError::InvalidFormat(format!(
                    "Failed to parse entity uid: missing type in '{s}' (expected format: [Namespace::]*Type::\"id\")"
                ))
            })?,
        };

        if type_part.is_empty() || type_part.split("::").any(str::is_empty) {
            return Err(PolicyError::InvalidFormat(format!(
                "Failed to parse entity uid: empty type segment in '{s}'"
            )));
        }

        Ok(EntityUid::new(type_part, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        quoted = { r#"User::"alice""#, "User", "alice" },
        unquoted = { "User::alice", "User", "alice" },
        namespaced = { r#"Infra::Host::"web-01""#, "Infra::Host", "web-01" },
        colons_in_id = { r#"Path::"a::b""#, "Path", "a::b" },
        empty_id = { r#"User::"""#, "User", "" },
    )]
    fn test_parse_entity_uid(input: &str, ty: &str, id: &str) {
        let uid: EntityUid = input.parse().unwrap();
        assert_eq!(uid.entity_type().as_str(), ty);
        assert_eq!(uid.id(), id);
    }

    #[parameterized(
        no_type = { "alice" },
        empty_type = { r#"::"alice""# },
        empty_segment = { r#"Infra::::Host::"x""# },
        unterminated_quote = { r#"User::"alice"# },
        lone_quote = { r#"User::""# },
    )]
    fn test_parse_entity_uid_rejects(input: &str) {
        assert!(matches!(
            input.parse::<EntityUid>(),
            Err(PolicyError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_entity_uid_display() {
        let uid = EntityUid::new("Infra::Host", "web-01");
        assert_eq!(uid.to_string(), r#"Infra::Host::"web-01""#);
    }

    #[test]
    fn test_entity_type_parts() {
        let ty = EntityType::new("App::Infra::Host");
        assert_eq!(ty.basename(), "Host");
        assert_eq!(ty.namespace(), "App::Infra");

        let plain = EntityType::new("User");
        assert_eq!(plain.basename(), "User");
        assert_eq!(plain.namespace(), "");
    }

    #[test]
    fn test_entity_uid_serialization() {
        let uid = EntityUid::new("User", "alice");
        let json = serde_json::to_value(&uid).unwrap();
        assert_eq!(json, serde_json::json!({"type": "User", "id": "alice"}));
    }
}
