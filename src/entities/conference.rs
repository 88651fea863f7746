// Conference dimension

use serde::{Deserialize, Serialize};

/// A conference, identified by its code as it appears in file names ("PH", "GOV")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conference {
    pub id: i64,
    pub label: String,
}

impl Conference {
    pub fn new(id: i64, label: impl Into<String>) -> Self {
        Conference {
            id,
            label: label.into(),
        }
    }
}
