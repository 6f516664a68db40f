//! Kind → topic/group routing. Pure mapping, no I/O.

use tradepost_core::EntityKind;

/// Fixed topic per entity kind.
pub fn topic_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Supplier => "supplier-events",
        EntityKind::Product => "product-events",
    }
}

/// Reverse lookup, used by consumers that log per-topic context.
pub fn kind_for_topic(topic: &str) -> Option<EntityKind> {
    match topic {
        "supplier-events" => Some(EntityKind::Supplier),
        "product-events" => Some(EntityKind::Product),
        _ => None,
    }
}

/// A consumer group's attachment to one topic.
///
/// One binding per (entity kind, consumer role) pair; created at process
/// start and held for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicBinding {
    pub topic: String,
    pub group_id: String,
}

impl TopicBinding {
    /// Binding for a named consumer role on one entity kind, e.g.
    /// role `"mirror"` on suppliers → group `supplier-mirror-group`
    /// reading `supplier-events`.
    pub fn for_kind(kind: EntityKind, role: &str) -> Self {
        Self {
            topic: topic_for(kind).to_string(),
            group_id: format!("{}-{role}-group", kind.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_kind_has_its_own_topic() {
        assert_eq!(topic_for(EntityKind::Supplier), "supplier-events");
        assert_eq!(topic_for(EntityKind::Product), "product-events");
    }

    #[test]
    fn topics_map_back_to_kinds() {
        for kind in EntityKind::ALL {
            assert_eq!(kind_for_topic(topic_for(kind)), Some(kind));
        }
        assert_eq!(kind_for_topic("order-events"), None);
    }

    #[test]
    fn binding_names_group_after_kind_and_role() {
        let binding = TopicBinding::for_kind(EntityKind::Supplier, "mirror");
        assert_eq!(binding.topic, "supplier-events");
        assert_eq!(binding.group_id, "supplier-mirror-group");
    }
}
