//! Who performed a write

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity stamped into `created_by` / `modified_by`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub name: String,
}

impl Actor {
    pub const SYSTEM_ID: i64 = 0;
    pub const SYSTEM_NAME: &'static str = "system";

    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Used when a request names no actor
    pub fn system() -> Self {
        Self::new(Self::SYSTEM_ID, Self::SYSTEM_NAME)
    }

    /// The JSON blob stored in audit columns
    pub fn to_json(&self) -> Value {
        serde_json::json!({ "id": self.id, "name": self.name })
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_actor() {
        assert_eq!(Actor::default(), Actor::new(0, "system"));
    }

    #[test]
    fn test_audit_json() {
        let actor = Actor::new(7, "Siti Aminah");
        assert_eq!(actor.to_json(), json!({"id": 7, "name": "Siti Aminah"}));
    }
}
