//! Graph nodes with per-field last-writer-wins registers.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserved field carrying the tombstone marker.
///
/// Deletion is replicated like any other field write; replicas keep the
/// node so the tombstone can still propagate to peers that missed it.
pub const DELETED_FIELD: &str = "deleted";

/// A single replicated field value.
///
/// The winning register for a field is the one with the greater
/// `(timestamp, origin)` pair. The origin peer id breaks timestamp ties,
/// making the order total: all replicas pick the same winner no matter the
/// order updates arrive in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LwwRegister {
    /// Field value.
    pub value: serde_json::Value,

    /// Writer's wall-clock time in milliseconds.
    pub timestamp: i64,

    /// Writing peer's id.
    pub origin: String,
}

impl LwwRegister {
    /// Create a register stamped by `origin` at `timestamp`.
    pub fn new(value: serde_json::Value, timestamp: i64, origin: impl Into<String>) -> Self {
        Self {
            value,
            timestamp,
            origin: origin.into(),
        }
    }

    /// Whether this register beats `other` under the total LWW order.
    pub fn wins_over(&self, other: &LwwRegister) -> bool {
        (self.timestamp, self.origin.as_str()) > (other.timestamp, other.origin.as_str())
    }
}

/// A replicated record: item, recognition event, or settings entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node id.
    pub id: String,

    /// Pseudonymous identity of the peer that created the local replica.
    pub owner_key: String,

    /// Field registers.
    pub fields: HashMap<String, LwwRegister>,

    /// Greatest field timestamp seen on this replica.
    pub updated_at: i64,
}

impl GraphNode {
    /// Create an empty node owned by `owner_key`.
    pub fn new(id: impl Into<String>, owner_key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_key: owner_key.into(),
            fields: HashMap::new(),
            updated_at: 0,
        }
    }

    /// Merge an incoming register for `field`.
    ///
    /// Returns true when the incoming register won and the node changed.
    /// Applying the same register twice, or applying a loser, is a no-op,
    /// so merges are idempotent and order-independent.
    pub fn merge_field(&mut self, field: &str, incoming: LwwRegister) -> bool {
        if let Some(existing) = self.fields.get(field) {
            if !incoming.wins_over(existing) {
                return false;
            }
        }

        self.updated_at = self.updated_at.max(incoming.timestamp);
        self.fields.insert(field.to_string(), incoming);
        true
    }

    /// Current value of a field, if present.
    pub fn value(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field).map(|register| &register.value)
    }

    /// Whether this node carries a tombstone.
    pub fn is_deleted(&self) -> bool {
        matches!(self.value(DELETED_FIELD), Some(serde_json::Value::Bool(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_greater_timestamp_wins() {
        let old = LwwRegister::new(json!("a"), 100, "p1");
        let new = LwwRegister::new(json!("b"), 200, "p1");
        assert!(new.wins_over(&old));
        assert!(!old.wins_over(&new));
    }

    #[test]
    fn test_timestamp_tie_broken_by_origin() {
        let a = LwwRegister::new(json!("a"), 100, "peer-a");
        let b = LwwRegister::new(json!("b"), 100, "peer-b");
        assert!(b.wins_over(&a));
        assert!(!a.wins_over(&b));
    }

    #[test]
    fn test_equal_register_never_wins() {
        let a = LwwRegister::new(json!("a"), 100, "p1");
        assert!(!a.clone().wins_over(&a));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut node = GraphNode::new("n1", "p1");
        let register = LwwRegister::new(json!("hello"), 50, "p1");

        assert!(node.merge_field("greeting", register.clone()));
        assert!(!node.merge_field("greeting", register));
        assert_eq!(node.value("greeting"), Some(&json!("hello")));
        assert_eq!(node.updated_at, 50);
    }

    #[test]
    fn test_merge_order_independent() {
        let updates = vec![
            ("name", LwwRegister::new(json!("first"), 10, "pa")),
            ("name", LwwRegister::new(json!("second"), 20, "pb")),
            ("price", LwwRegister::new(json!("$5"), 15, "pb")),
            ("price", LwwRegister::new(json!("$6"), 15, "pa")),
        ];

        let mut forward = GraphNode::new("n", "pa");
        for (field, register) in &updates {
            forward.merge_field(field, register.clone());
        }

        let mut reverse = GraphNode::new("n", "pa");
        for (field, register) in updates.iter().rev() {
            reverse.merge_field(field, register.clone());
        }

        assert_eq!(forward.fields, reverse.fields);
        assert_eq!(forward.value("name"), Some(&json!("second")));
        // Equal timestamps: "pb" > "pa" lexicographically.
        assert_eq!(forward.value("price"), Some(&json!("$5")));
    }

    #[test]
    fn test_tombstone() {
        let mut node = GraphNode::new("n", "p1");
        assert!(!node.is_deleted());

        node.merge_field(DELETED_FIELD, LwwRegister::new(json!(true), 99, "p1"));
        assert!(node.is_deleted());
    }
}
