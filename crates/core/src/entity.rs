//! Catalog entities: the two managed resource kinds and their fields.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::EntityId;

/// The two managed resource kinds.
///
/// The whole pipeline (store binding, topic name, payload shape) is
/// parameterized over this enum rather than duplicated per kind.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Supplier,
    Product,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Supplier, EntityKind::Product];

    /// Stable lowercase name, used in wire payloads and storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Supplier => "supplier",
            EntityKind::Product => "product",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "supplier" => Ok(EntityKind::Supplier),
            "product" => Ok(EntityKind::Product),
            other => Err(DomainError::validation(format!(
                "unknown entity kind: {other}"
            ))),
        }
    }
}

/// A stored catalog entity.
///
/// The entity store owns canonical state; every other component holds
/// copies of this struct, never references into the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub description: String,
}

/// Validated `(name, description)` pair for a create/update mutation.
///
/// Construction fails before any store access when a required field is
/// empty or whitespace-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDraft {
    name: String,
    description: String,
}

impl EntityDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> DomainResult<Self> {
        let name = name.into();
        let description = description.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        if description.trim().is_empty() {
            return Err(DomainError::validation("description must not be empty"));
        }

        Ok(Self { name, description })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Materialize the draft into an entity with the given identity.
    pub fn into_entity(self, id: EntityId, kind: EntityKind) -> Entity {
        Entity {
            id,
            kind,
            name: self.name,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_accepts_non_empty_fields() {
        let draft = EntityDraft::new("Acme", "bolts").unwrap();
        assert_eq!(draft.name(), "Acme");
        assert_eq!(draft.description(), "bolts");
    }

    #[test]
    fn draft_rejects_empty_name() {
        let err = EntityDraft::new("", "bolts").unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn draft_rejects_whitespace_description() {
        let err = EntityDraft::new("Acme", "   ").unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for blank description"),
        }
    }

    #[test]
    fn draft_materializes_into_entity() {
        let id = EntityId::new();
        let entity = EntityDraft::new("Acme", "bolts")
            .unwrap()
            .into_entity(id, EntityKind::Supplier);

        assert_eq!(entity.id, id);
        assert_eq!(entity.kind, EntityKind::Supplier);
        assert_eq!(entity.name, "Acme");
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.as_str().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("warehouse".parse::<EntityKind>().is_err());
    }
}
