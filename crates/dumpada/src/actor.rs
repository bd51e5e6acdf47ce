//! Identity of the caller, as supplied by an external auth layer.
//!
//! Nothing here authenticates. The actor is only used to attribute writes.

use serde::{Deserialize, Serialize};

/// Name recorded when the caller supplied none.
pub const DEFAULT_ACTOR: &str = "Sistema";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub name: String,
    #[serde(default)]
    pub site_id: Option<i64>,
}

impl Actor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            site_id: None,
        }
    }

    pub fn with_site(mut self, site_id: i64) -> Self {
        self.site_id = Some(site_id);
        self
    }

    /// Builds an actor from an optional auth-context name, falling back to
    /// `default_name` when it is absent or blank.
    pub fn resolve(name: Option<&str>, site_id: Option<i64>, default_name: &str) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(default_name);
        Self {
            name: name.to_string(),
            site_id,
        }
    }

    /// The fallback actor for unattributed writes.
    pub fn system() -> Self {
        Self::new(DEFAULT_ACTOR)
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

    #[test]
    fn test_resolve_falls_back_on_blank() {
        assert_eq!(Actor::resolve(None, None, DEFAULT_ACTOR).name, "Sistema");
        assert_eq!(Actor::resolve(Some("  "), Some(4), "Bot").name, "Bot");
        let actor = Actor::resolve(Some(" Ana Rojas "), Some(4), DEFAULT_ACTOR);
        assert_eq!(actor.name, "Ana Rojas");
        assert_eq!(actor.site_id, Some(4));
    }

    #[test]
    fn test_with_site() {
        let actor = Actor::new("Operador").with_site(2);
        assert_eq!(actor.site_id, Some(2));
        assert_eq!(Actor::default(), Actor::system());
    }
}
