//! End-to-end consolidation tests.
//!
//! Each test writes raw CSVs into a fresh `TempDir`, runs the whole pipeline
//! and checks the resulting tables, the SQLite store and the labeled views.

use pba_stats::{
    consolidate_into, Cell, ConsolidatorConfig, Consolidator, Error, HistoryLookup,
    Reconstructor, SqliteStore, StatFamily, TableStore,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// =============================================================================
// Fixtures
// =============================================================================

const PLAYER_HEADER: &str = "PLAYERS,Team,GP,MIN,FGm,FGa,FG%,3Pm,3Pa,3P%,FTm,FTa,FT%,APG,STL,BLK,oREB,dREB,REB,PF,TOV,+/-,PTS";

const TEAM_HEADER: &str = "Team,GP,3Pm,3Pa,3P%,2Pm,2Pa,2P%,FGm,FGa,FG%,FTm,FTa,FT%,dREB,oREB,REB,AST,STL,BLK,TO,PTO,PF,FBm,FBa,FBm%,bPTS,PTS,W,L";

fn player_line(name: &str, minutes: &str, plus_minus: &str, fg_pct: &str) -> String {
    format!("{name},AA,1,{minutes},5,10,{fg_pct},1,3,33%,2,2,100%,1,0,0,1,2,3,1,0,{plus_minus},13")
}

fn team_line(team: &str) -> String {
    format!("{team},10,5,15,33%,20,40,50%,25,55,45%,10,12,83%,30,10,40,15,5,3,12,14,18,4,6,67%,8,70,7,3")
}

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("players")).unwrap();
        fs::create_dir(root.path().join("teams")).unwrap();
        Workspace { root }
    }

    fn write(&self, dir: &str, name: &str, header: &str, lines: &[String]) {
        let mut text = format!("{header}\n");
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        fs::write(self.root.path().join(dir).join(name), text).unwrap();
    }

    fn player_file(&self, name: &str, lines: &[String]) {
        self.write("players", name, PLAYER_HEADER, lines);
    }

    fn team_file(&self, name: &str, lines: &[String]) {
        self.write("teams", name, TEAM_HEADER, lines);
    }

    fn descriptions(&self, text: &str) {
        fs::write(self.root.path().join("player_desc.csv"), text).unwrap();
    }

    fn config(&self) -> ConsolidatorConfig {
        ConsolidatorConfig {
            player_stat_dir: self.root.path().join("players"),
            team_stat_dir: self.root.path().join("teams"),
            player_desc_path: Some(self.root.path().join("player_desc.csv")),
            database_path: self.database(),
            history_lookup: HistoryLookup::CreateOnMiss,
        }
    }

    fn database(&self) -> PathBuf {
        self.root.path().join("pba.db")
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_total_and_average_files_share_dimension_ids() {
    let ws = Workspace::new();
    let smith = vec![player_line("Smith", "10", "2", "50%")];
    ws.player_file("2021_PH_AA_TOT.csv", &smith);
    ws.player_file("2021_PH_AA_AVG.csv", &smith);

    let (tables, report) = Consolidator::new(ws.config()).run().unwrap();
    let dims = &tables.dimensions;

    assert_eq!(dims.teams.len(), 1);
    assert_eq!((dims.teams[0].id, dims.teams[0].name.as_str()), (0, "AA"));
    assert_eq!((dims.conferences[0].id, dims.conferences[0].label.as_str()), (0, "PH"));
    assert_eq!(dims.histories.len(), 1);
    assert_eq!(
        (dims.histories[0].id, dims.histories[0].year, dims.histories[0].conference_id),
        (0, 2021, 0)
    );
    assert_eq!((dims.players[0].id, dims.players[0].name.as_str()), (0, "Smith"));

    let total = &tables.facts.total_player;
    let avg = &tables.facts.avg_player;
    assert_eq!(total.len(), 1);
    assert_eq!(avg.len(), 1);
    assert_eq!(total[0].key(), (0, 0, 0));
    assert_eq!(avg[0].key(), total[0].key());
    assert_eq!(total[0].stat("FG%"), Some(0.5));
    assert_eq!(total[0].stat("MIN"), Some(10.0));
    assert_eq!(total[0].stat("+/-"), Some(2.0));

    assert_eq!(report.player_stat_files, 2);
    assert_eq!(report.zero_records, 0);
}

#[test]
fn test_zero_minute_zero_plus_minus_row_produces_no_facts() {
    let ws = Workspace::new();
    ws.player_file(
        "2021_PH_AA_TOT.csv",
        &[
            player_line("Smith", "10", "2", "50%"),
            player_line("Bench", "0", "0", "0%"),
            player_line("Late", "0", "-5", "0%"),
        ],
    );

    let (tables, report) = Consolidator::new(ws.config()).run().unwrap();
    let bench_id = tables
        .dimensions
        .players
        .iter()
        .find(|p| p.name == "Bench")
        .map(|p| p.id)
        .unwrap();

    assert!(tables.facts.total_player.iter().all(|r| r.player_id != bench_id));
    assert_eq!(tables.facts.total_player.len(), 2);
    assert_eq!(report.zero_records, 1);
}

#[test]
fn test_team_stat_reuses_history_from_player_stat() {
    let ws = Workspace::new();
    ws.player_file("2021_PH_AA_TOT.csv", &[player_line("Smith", "10", "2", "50%")]);
    ws.team_file("2021_PH_TOT.csv", &[team_line("AA"), team_line("BB")]);

    let mut config = ws.config();
    config.history_lookup = HistoryLookup::Strict;
    let (tables, _) = Consolidator::new(config).run().unwrap();

    assert_eq!(tables.dimensions.histories.len(), 1);
    assert_eq!(tables.dimensions.teams.len(), 2);
    let keys: Vec<(i64, i64)> = tables.facts.total_team.iter().map(|r| r.key()).collect();
    assert_eq!(keys, vec![(0, 0), (1, 0)]);
    assert_eq!(tables.facts.total_team[0].stat("FG%"), Some(0.45));
}

#[test]
fn test_strict_history_rejects_unseen_season() {
    let ws = Workspace::new();
    ws.player_file("2021_PH_AA_TOT.csv", &[player_line("Smith", "10", "2", "50%")]);
    ws.team_file("2022_PH_TOT.csv", &[team_line("AA")]);

    let mut config = ws.config();
    config.history_lookup = HistoryLookup::Strict;
    let err = Consolidator::new(config).run().unwrap_err();

    assert!(matches!(err, Error::UnknownHistory { year: 2022, .. }));

    // Default policy creates the missing season instead
    let (tables, _) = Consolidator::new(ws.config()).run().unwrap();
    assert_eq!(tables.dimensions.histories.len(), 2);
}

#[test]
fn test_unrecognized_file_name_aborts_without_writing() {
    let ws = Workspace::new();
    ws.player_file("2021_PH_AA_TOT.csv", &[player_line("Smith", "10", "2", "50%")]);
    ws.player_file("season_totals.csv", &[player_line("Cruz", "10", "2", "50%")]);

    let mut store = SqliteStore::open(&ws.database()).unwrap();
    let err = consolidate_into(ws.config(), &mut store).unwrap_err();

    assert!(err.is_input_format());
    let tables = store.connection().query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
        [],
        |row| row.get::<_, i64>(0),
    );
    assert_eq!(tables.unwrap(), 0);
}

#[test]
fn test_descriptions_fill_player_attributes() {
    let ws = Workspace::new();
    ws.descriptions("Name,j_number,height,pos\nSmith,7,6-2,G\n");
    ws.player_file(
        "2021_PH_AA_TOT.csv",
        &[
            player_line("Smith", "10", "2", "50%"),
            player_line("Unknown", "12", "1", "40%"),
        ],
    );

    let (tables, _) = Consolidator::new(ws.config()).run().unwrap();
    let players = &tables.dimensions.players;

    assert_eq!(players[0].jersey_number.as_deref(), Some("7"));
    assert_eq!(players[0].position.as_deref(), Some("G"));
    assert_eq!(players[1].name, "Unknown");
    assert_eq!(players[1].height, None);
}

#[test]
fn test_persisted_run_reconstructs_labeled_views() {
    let ws = Workspace::new();
    ws.descriptions("Name,j_number,height,pos\nSmith,7,6-2,G\n");
    let smith = vec![player_line("Smith", "10", "2", "50%")];
    ws.player_file("2021_PH_AA_TOT.csv", &smith);
    ws.player_file("2021_PH_AA_AVG.csv", &smith);
    ws.team_file("2021_PH_TOT.csv", &[team_line("AA")]);
    ws.team_file("2021_PH_AVG.csv", &[team_line("AA")]);

    let mut store = SqliteStore::open(&ws.database()).unwrap();
    let report = consolidate_into(ws.config(), &mut store).unwrap();
    assert_eq!(report.team_stat_files, 2);

    // Reopen to read from disk, not from the writer's connection
    drop(store);
    let store = SqliteStore::open(&ws.database()).unwrap();
    let tables = store.load_all().unwrap();
    let views = Reconstructor::new(&tables);

    let total = views.total_player();
    assert_eq!(total.len(), 1);
    assert_eq!(total.get(0, "year"), Some(&Cell::Integer(2021)));
    assert_eq!(total.get(0, "conference").and_then(Cell::as_str), Some("PH"));
    assert_eq!(total.get(0, "team_name").and_then(Cell::as_str), Some("AA"));
    assert_eq!(total.get(0, "jersey_number").and_then(Cell::as_str), Some("7"));
    assert_eq!(total.get(0, "FG%").and_then(Cell::as_f64), Some(0.5));

    let team = views.player_team(StatFamily::Average);
    assert_eq!(team.get(0, "tm_W").and_then(Cell::as_f64), Some(7.0));

    let all = views.full_join();
    assert_eq!(all.len(), 1);
    assert_eq!(all.get(0, "ply_MIN_avg").and_then(Cell::as_f64), Some(10.0));
    assert_eq!(all.get(0, "tm_PTS_total").and_then(Cell::as_f64), Some(70.0));
}

#[test]
fn test_second_run_replaces_first() {
    let ws = Workspace::new();
    ws.player_file(
        "2021_PH_AA_TOT.csv",
        &[
            player_line("Smith", "10", "2", "50%"),
            player_line("Cruz", "8", "1", "40%"),
        ],
    );
    let mut store = SqliteStore::open(&ws.database()).unwrap();
    consolidate_into(ws.config(), &mut store).unwrap();

    ws.player_file("2021_PH_AA_TOT.csv", &[player_line("Smith", "10", "2", "50%")]);
    consolidate_into(ws.config(), &mut store).unwrap();

    let tables = store.load_all().unwrap();
    assert_eq!(tables.dimensions.players.len(), 1);
    assert_eq!(tables.facts.total_player.len(), 1);
}

#[test]
fn test_non_csv_files_are_ignored() {
    let ws = Workspace::new();
    ws.player_file("2021_PH_AA_TOT.csv", &[player_line("Smith", "10", "2", "50%")]);
    fs::write(ws.root.path().join("players").join("README.txt"), "notes").unwrap();

    let (tables, report) = Consolidator::new(ws.config()).run().unwrap();

    assert_eq!(report.player_stat_files, 1);
    assert_eq!(tables.facts.total_player.len(), 1);
}

#[test]
fn test_family_key_repeated_across_files_kept_once() {
    let ws = Workspace::new();
    ws.player_file("2021_PH_AA_TOT.csv", &[player_line("Smith", "10", "2", "50%")]);
    ws.player_file("2021_PH_AA_TOT_v2.csv", &[player_line("Smith", "12", "3", "40%")]);
    ws.team_file("2021_PH_TOT.csv", &[team_line("AA")]);
    ws.team_file("2021_PH_TOT_v2.csv", &[team_line("AA")]);

    let (tables, report) = Consolidator::new(ws.config()).run().unwrap();

    assert_eq!(tables.facts.total_player.len(), 1);
    assert_eq!(tables.facts.total_player[0].stat("MIN"), Some(10.0));
    assert_eq!(tables.facts.total_team.len(), 1);
    assert_eq!(report.key_duplicates, 2);

    let views = Reconstructor::new(&tables);
    assert_eq!(views.player_team(StatFamily::Total).len(), 1);
}
