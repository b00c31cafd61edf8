use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaveTypeId(pub String);

/// Administrator-maintained leave category. The `name` doubles as the key
/// requests reference, so it must stay unique among active types. Inactive
/// types are hidden from new submissions but remain valid on history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTypeConfig {
    pub id: LeaveTypeId,
    pub name: String,
    pub annual_allowance_days: u32,
    pub description: String,
    pub is_active: bool,
}

/// Read-only lookup over the configured leave types. Built fresh from the
/// store on each operation; carries no mutation logic of its own.
#[derive(Clone, Debug, Default)]
pub struct PolicyRegistry {
    types: Vec<LeaveTypeConfig>,
}

impl PolicyRegistry {
    pub fn new(types: Vec<LeaveTypeConfig>) -> Self {
        Self { types }
    }

    pub fn active_types(&self) -> Vec<&LeaveTypeConfig> {
        self.types.iter().filter(|config| config.is_active).collect()
    }

    /// Lookup ignoring the active flag, for historical records that keep a
    /// frozen type name.
    pub fn find(&self, name: &str) -> Option<&LeaveTypeConfig> {
        let key = normalize_key(name);
        self.types.iter().find(|config| normalize_key(&config.name) == key)
    }

    pub fn find_active(&self, name: &str) -> Option<&LeaveTypeConfig> {
        self.find(name).filter(|config| config.is_active)
    }
}

fn normalize_key(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{LeaveTypeConfig, LeaveTypeId, PolicyRegistry};

    fn leave_type(name: &str, is_active: bool) -> LeaveTypeConfig {
        LeaveTypeConfig {
            id: LeaveTypeId(format!("lt-{}", name.to_ascii_lowercase())),
            name: name.to_string(),
            annual_allowance_days: 20,
            description: String::new(),
            is_active,
        }
    }

    #[test]
    fn find_is_case_and_whitespace_insensitive() {
        let registry = PolicyRegistry::new(vec![leave_type("Annual Leave", true)]);
        let found = registry.find(" annual leave ").expect("lookup should match");
        assert_eq!(found.name, "Annual Leave");
    }

    #[test]
    fn inactive_types_are_hidden_from_active_lookup_but_still_resolvable() {
        let registry =
            PolicyRegistry::new(vec![leave_type("Annual Leave", true), leave_type("Study", false)]);

        assert!(registry.find_active("Study").is_none());
        assert!(registry.find("Study").is_some());
        assert_eq!(registry.active_types().len(), 1);
    }
}
