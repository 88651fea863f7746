// Team dimension

use serde::{Deserialize, Serialize};

/// A team, identified by its exact name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

impl Team {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Team {
            id,
            name: name.into(),
        }
    }
}
