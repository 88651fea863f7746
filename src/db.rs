// 💾 SQLite persistence
// A run replaces the whole store: all eight tables are dropped, recreated and
// refilled inside one transaction, so readers never see a half-written run.

use crate::consolidator::ConsolidatedTables;
use crate::entities::{Conference, History, Player, Team};
use crate::error::Result;
use crate::facts::{FactTables, PlayerStatRow, TeamStatRow};
use crate::registry::DimensionTables;
use crate::schema::{
    dimension_ddl, fact_ddl, fact_key_columns, quote_ident, StatFamily, StatKind, ALL_TABLES,
    CONFERENCE_TABLE, HISTORY_TABLE, PLAYER_TABLE, TEAM_TABLE,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::path::Path;
use tracing::info;

/// Destination of a finished run
pub trait TableStore {
    /// Replace everything previously stored with `tables`
    fn replace_all(&mut self, tables: &ConsolidatedTables) -> Result<()>;

    /// Read back all eight tables
    fn load_all(&self) -> Result<ConsolidatedTables>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(())
}

// ============================================================================
// WRITE
// ============================================================================

impl TableStore for SqliteStore {
    fn replace_all(&mut self, tables: &ConsolidatedTables) -> Result<()> {
        let tx = self.conn.transaction()?;

        for table in ALL_TABLES {
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))?;
        }
        for ddl in dimension_ddl() {
            tx.execute_batch(&ddl)?;
        }
        for kind in [StatKind::Player, StatKind::Team] {
            for family in [StatFamily::Total, StatFamily::Average] {
                tx.execute_batch(&fact_ddl(kind, family))?;
            }
        }

        insert_dimensions(&tx, &tables.dimensions)?;
        insert_facts(&tx, &tables.facts)?;
        tx.commit()?;

        info!(tables = ALL_TABLES.len(), "Stored consolidated tables");
        Ok(())
    }

    fn load_all(&self) -> Result<ConsolidatedTables> {
        Ok(ConsolidatedTables {
            dimensions: load_dimensions(&self.conn)?,
            facts: load_facts(&self.conn)?,
        })
    }
}

fn insert_dimensions(conn: &Connection, dims: &DimensionTables) -> Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {TEAM_TABLE} (id, team_name) VALUES (?1, ?2)"
    ))?;
    for team in &dims.teams {
        stmt.execute(params![team.id, team.name])?;
    }

    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {PLAYER_TABLE} (id, player_name, jersey_number, height, position)
         VALUES (?1, ?2, ?3, ?4, ?5)"
    ))?;
    for player in &dims.players {
        stmt.execute(params![
            player.id,
            player.name,
            player.jersey_number,
            player.height,
            player.position,
        ])?;
    }

    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {CONFERENCE_TABLE} (id, conference) VALUES (?1, ?2)"
    ))?;
    for conference in &dims.conferences {
        stmt.execute(params![conference.id, conference.label])?;
    }

    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {HISTORY_TABLE} (id, year, conference_id) VALUES (?1, ?2, ?3)"
    ))?;
    for history in &dims.histories {
        stmt.execute(params![history.id, history.year, history.conference_id])?;
    }

    Ok(())
}

fn insert_statement(kind: StatKind, family: StatFamily) -> String {
    let columns: Vec<String> = fact_key_columns(kind)
        .iter()
        .map(|c| c.to_string())
        .chain(kind.stat_columns().iter().map(|c| quote_ident(c)))
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        kind.table_name(family),
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn stat_values(stats: &[Option<f64>]) -> impl Iterator<Item = Value> + '_ {
    stats.iter().map(|s| match s {
        Some(v) => Value::Real(*v),
        None => Value::Null,
    })
}

fn insert_facts(conn: &Connection, facts: &FactTables) -> Result<()> {
    for family in [StatFamily::Total, StatFamily::Average] {
        let mut stmt = conn.prepare(&insert_statement(StatKind::Player, family))?;
        for row in facts.player(family) {
            let values: Vec<Value> = [row.team_id, row.hist_id, row.player_id]
                .into_iter()
                .map(Value::Integer)
                .chain(stat_values(&row.stats))
                .collect();
            stmt.execute(params_from_iter(values.iter()))?;
        }

        let mut stmt = conn.prepare(&insert_statement(StatKind::Team, family))?;
        for row in facts.team(family) {
            let values: Vec<Value> = [row.team_id, row.hist_id]
                .into_iter()
                .map(Value::Integer)
                .chain(stat_values(&row.stats))
                .collect();
            stmt.execute(params_from_iter(values.iter()))?;
        }
    }
    Ok(())
}

// ============================================================================
// READ
// ============================================================================

fn load_dimensions(conn: &Connection) -> Result<DimensionTables> {
    let mut stmt = conn.prepare(&format!("SELECT id, team_name FROM {TEAM_TABLE} ORDER BY id"))?;
    let teams = stmt
        .query_map([], |row| Ok(Team::new(row.get(0)?, row.get::<_, String>(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT id, player_name, jersey_number, height, position FROM {PLAYER_TABLE} ORDER BY id"
    ))?;
    let players = stmt
        .query_map([], |row| {
            Ok(Player {
                id: row.get(0)?,
                name: row.get(1)?,
                jersey_number: row.get(2)?,
                height: row.get(3)?,
                position: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT id, conference FROM {CONFERENCE_TABLE} ORDER BY id"
    ))?;
    let conferences = stmt
        .query_map([], |row| {
            Ok(Conference::new(row.get(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(&format!(
        "SELECT id, year, conference_id FROM {HISTORY_TABLE} ORDER BY id"
    ))?;
    let histories = stmt
        .query_map([], |row| Ok(History::new(row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(DimensionTables {
        teams,
        players,
        conferences,
        histories,
    })
}

fn select_statement(kind: StatKind, family: StatFamily) -> String {
    let columns: Vec<String> = fact_key_columns(kind)
        .iter()
        .map(|c| c.to_string())
        .chain(kind.stat_columns().iter().map(|c| quote_ident(c)))
        .collect();

    format!(
        "SELECT {} FROM {} ORDER BY rowid",
        columns.join(", "),
        kind.table_name(family)
    )
}

fn read_stats(row: &Row<'_>, offset: usize, count: usize) -> rusqlite::Result<Vec<Option<f64>>> {
    (offset..offset + count).map(|i| row.get(i)).collect()
}

fn load_facts(conn: &Connection) -> Result<FactTables> {
    let mut facts = FactTables::default();

    for family in [StatFamily::Total, StatFamily::Average] {
        let width = StatKind::Player.stat_columns().len();
        let mut stmt = conn.prepare(&select_statement(StatKind::Player, family))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PlayerStatRow {
                    team_id: row.get(0)?,
                    hist_id: row.get(1)?,
                    player_id: row.get(2)?,
                    stats: read_stats(row, 3, width)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        *facts.player_mut(family) = rows;

        let width = StatKind::Team.stat_columns().len();
        let mut stmt = conn.prepare(&select_statement(StatKind::Team, family))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TeamStatRow {
                    team_id: row.get(0)?,
                    hist_id: row.get(1)?,
                    stats: read_stats(row, 2, width)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        *facts.team_mut(family) = rows;
    }

    Ok(facts)
}

// ============================================================================
// TESTS
// ============================================================================
