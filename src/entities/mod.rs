// Dimension entities
//
// Every entity carries a dense, zero-based surrogate id assigned by the
// registry in first-seen order. Ids are never reused or compacted.

pub mod conference;
pub mod history;
pub mod player;
pub mod team;

pub use conference::Conference;
pub use history::History;
pub use player::{Player, PlayerDescription, PlayerDirectory};
pub use team::Team;
