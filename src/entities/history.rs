// History dimension: one (year, conference) season instance

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub id: i64,
    pub year: i32,
    /// References `Conference::id`
    pub conference_id: i64,
}

impl History {
    pub fn new(id: i64, year: i32, conference_id: i64) -> Self {
        History {
            id,
            year,
            conference_id,
        }
    }

    /// Composite natural key
    pub fn key(&self) -> (i32, i64) {
        (self.year, self.conference_id)
    }
}
