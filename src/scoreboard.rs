//! Owner of all scoreboard state and the event router between its parts.

use crate::bus::{self, Subscribers, SyncBus};
use crate::custom::CustomPanel;
use crate::live::LiveManager;
use crate::maps::MapManager;
use crate::output::OutputWriter;
use crate::teams::TeamManager;
use crate::types::*;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Scoreboard {
    pub(crate) out: OutputWriter,
    pub(crate) bus: SyncBus<Source, Listener>,
    pub(crate) teams: TeamManager,
    pub(crate) maps: MapManager,
    pub(crate) live: LiveManager,
    pub(crate) custom: CustomPanel,
}

impl Subscribers<Source, Listener> for Scoreboard {
    fn bus(&self) -> &SyncBus<Source, Listener> {
        &self.bus
    }
}

impl Scoreboard {
    pub fn new(out: OutputWriter) -> Self {
        Self::from_saved(out, SavedState::default())
    }

    /// Rebuilds everything from a saved document and redraws every output.
    /// Teams exist before the live view resolves its selections, and maps
    /// exist before the live view starts announcing team changes.
    pub fn from_saved(out: OutputWriter, state: SavedState) -> Self {
        out.ensure_dirs();
        let mut board = Scoreboard {
            out,
            bus: SyncBus::new(),
            teams: TeamManager::new(),
            maps: MapManager::from_state(state.mapmanager),
            live: LiveManager::new(),
            custom: CustomPanel::from_state(state.customdatamanager),
        };
        for team in state.teammanager.teams {
            board.teams.add(team);
        }
        board.bus.sync(Source::TeamManager, Listener::LiveManager);
        board.bus.sync(Source::Live, Listener::MapManager);
        board.restore_live(state.livemanager);
        info!(
            teams = board.teams.teams().len(),
            maps = board.maps.len(),
            custom = board.custom.entries().len(),
            "scoreboard loaded"
        );
        board.draw_all();
        board
    }

    pub fn export(&self) -> SavedState {
        SavedState {
            teammanager: self.teams.export(),
            mapmanager: self.maps.export(),
            livemanager: self.live.export(),
            customdatamanager: self.custom.export(),
        }
    }

    pub fn draw_all(&self) {
        self.draw_custom();
        self.clean_custom();
        self.draw_live();
        self.draw_maps();
    }

    pub fn output(&self) -> &OutputWriter {
        &self.out
    }

    pub fn teams(&self) -> &TeamManager {
        &self.teams
    }

    pub fn maps(&self) -> &MapManager {
        &self.maps
    }

    pub fn live(&self) -> &LiveManager {
        &self.live
    }

    pub fn custom(&self) -> &CustomPanel {
        &self.custom
    }

    /// Delivers `kind` to every listener of `source`, in registration
    /// order, before returning. Handlers may publish further events.
    /// A listener unsubscribed by an earlier handler in the same delivery
    /// is skipped.
    pub(crate) fn notify(&mut self, source: Source, kind: EventKind) {
        debug!(?source, %kind, "notify");
        bus::deliver(self, source, |board, listener| board.dispatch(listener, kind));
    }

    fn dispatch(&mut self, listener: Listener, kind: EventKind) {
        match listener {
            Listener::LiveManager => self.live_manager_event(kind),
            Listener::LiveTeam(slot) => self.live_team_event(slot, kind),
            Listener::LivePlayer(slot, position) => self.live_player_event(slot, position, kind),
            Listener::MapManager => self.map_manager_event(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScratchDir;
    use pretty_assertions::assert_eq;

    fn board(dir: &ScratchDir) -> Scoreboard {
        Scoreboard::new(writer(dir))
    }

    fn writer(dir: &ScratchDir) -> OutputWriter {
        OutputWriter::new(dir.path().join("output"), dir.path().join("assets"))
    }

    fn team(name: &str, players: &[(&str, &str)]) -> TeamState {
        TeamState {
            name: name.to_string(),
            roster: players
                .iter()
                .map(|(user, sr)| PlayerState {
                    username: user.to_string(),
                    sr: sr.to_string(),
                    ..PlayerState::default()
                })
                .collect(),
            ..TeamState::default()
        }
    }

    fn out(dir: &ScratchDir, file: &str) -> Option<String> {
        dir.read(&format!("output/{file}"))
    }

    #[test]
    fn test_rename_keeps_live_binding() {
        let dir = ScratchDir::new("board-rename");
        let mut board = board(&dir);
        let id = board.add_team(team("Alpha", &[]));
        board.select_live_team(TeamSlot::One, "Alpha");
        assert_eq!(out(&dir, "team1.txt").as_deref(), Some("Alpha"));

        board.rename_team(id, "Omega").unwrap();
        let slot = board.live().slot(TeamSlot::One);
        assert_eq!(slot.team, Some(id));
        assert_eq!(slot.selection, "Omega");
        assert_eq!(out(&dir, "team1.txt").as_deref(), Some("Omega"));
    }

    #[test]
    fn test_unnamed_team_is_not_selectable() {
        let dir = ScratchDir::new("board-unnamed");
        let mut board = board(&dir);
        board.add_team(team("", &[]));
        assert_eq!(board.live().choices(), vec![String::new()]);
        board.select_live_team(TeamSlot::One, "");
        assert_eq!(board.live().slot(TeamSlot::One).team, None);
    }

    #[test]
    fn test_renaming_bound_team_to_blank_unbinds() {
        let dir = ScratchDir::new("board-blank");
        let mut board = board(&dir);
        let id = board.add_team(team("Alpha", &[]));
        board.select_live_team(TeamSlot::One, "Alpha");
        board.rename_team(id, "").unwrap();
        assert_eq!(board.live().slot(TeamSlot::One).team, None);
        assert!(!dir.exists("output/team1.txt"));
    }

    #[test]
    fn test_duplicate_names_bind_latest_team() {
        let dir = ScratchDir::new("board-duplicates");
        let mut board = board(&dir);
        board.add_team(team("Alpha", &[]));
        let second = board.add_team(team("Alpha", &[]));
        board.select_live_team(TeamSlot::Two, "Alpha");
        assert_eq!(board.live().slot(TeamSlot::Two).team, Some(second));
        assert_eq!(board.live().choices().len(), 2);
    }

    #[test]
    fn test_deleting_bound_team_clears_slot_files() {
        let dir = ScratchDir::new("board-delete");
        let mut board = board(&dir);
        let id = board.add_team(team("Alpha", &[("one", "10")]));
        board.select_live_team(TeamSlot::One, "Alpha");
        assert_eq!(out(&dir, "team1user1.txt").as_deref(), Some("one"));

        board.delete_team(id).unwrap();
        let slot = board.live().slot(TeamSlot::One);
        assert_eq!(slot.team, None);
        assert_eq!(slot.selection, "");
        assert!(!dir.exists("output/team1.txt"));
        assert!(!dir.exists("output/team1logo.png"));
        assert!(!dir.exists("output/team1user1.txt"));
        let shell = out(&dir, "team1color.html").unwrap();
        assert!(!shell.contains("<body"));
        assert!(!board.bus.is_synced(Source::Team(id), Listener::LiveTeam(TeamSlot::One)));
    }

    #[test]
    fn test_player_edits_reach_live_files() {
        let dir = ScratchDir::new("board-players");
        let mut board = board(&dir);
        let id = board.add_team(team("Alpha", &[("one#1234", "10"), ("two", "20")]));
        board.select_live_team(TeamSlot::One, "Alpha");
        assert_eq!(out(&dir, "team1user1.txt").as_deref(), Some("one"));
        assert_eq!(out(&dir, "team1sr.txt").as_deref(), Some("15"));
        assert!(dir.exists("output/team1role2.png"));
        assert!(!dir.exists("output/team1user3.txt"));

        let first = board.teams().get(id).unwrap().roster[0].id;
        board.set_player_sr(first, "30").unwrap();
        assert_eq!(out(&dir, "team1sr1.txt").as_deref(), Some("30"));
        assert_eq!(out(&dir, "team1sr.txt").as_deref(), Some("25"));

        board.set_player_user(first, "renamed").unwrap();
        assert_eq!(out(&dir, "team1user1.txt").as_deref(), Some("renamed"));

        let added = board.add_player(id, PlayerState::default()).unwrap();
        assert!(dir.exists("output/team1user3.txt"));
        board.remove_player(first).unwrap();
        // Remaining players shift up one position.
        assert_eq!(out(&dir, "team1user1.txt").as_deref(), Some("two"));
        assert_eq!(board.live().slot(TeamSlot::One).players[1], Some(added));
        assert!(!dir.exists("output/team1user3.txt"));
    }

    #[test]
    fn test_live_hero_edit_goes_to_player() {
        let dir = ScratchDir::new("board-hero");
        let mut board = board(&dir);
        let id = board.add_team(team("Alpha", &[("one", "1")]));
        board.select_live_team(TeamSlot::One, "Alpha");
        board.set_live_hero(TeamSlot::One, 0, "Mercy").unwrap();
        assert_eq!(board.teams().get(id).unwrap().roster[0].hero, "Mercy");
        assert!(dir.exists("output/team1hero1.png"));
        assert!(board.set_live_hero(TeamSlot::One, 3, "Mercy").is_err());
        assert!(board.hero_choices(TeamSlot::One, 0).contains(&"Mercy"));
        assert!(board.hero_choices(TeamSlot::One, 3).is_empty());
    }

    #[test]
    fn test_role_change_keeps_hero_outside_new_pool() {
        let dir = ScratchDir::new("board-role");
        let mut board = board(&dir);
        let id = board.add_team(team("Alpha", &[("one", "1")]));
        board.select_live_team(TeamSlot::One, "Alpha");
        let player = board.teams().get(id).unwrap().roster[0].id;
        board.set_player_role(player, "Support").unwrap();
        board.set_live_hero(TeamSlot::One, 0, "Mercy").unwrap();

        board.set_player_role(player, "Tank").unwrap();
        assert_eq!(board.teams().get(id).unwrap().roster[0].hero, "Mercy");
        assert!(dir.exists("output/team1hero1.png"));
        let choices = board.hero_choices(TeamSlot::One, 0);
        assert!(choices.contains(&"Reinhardt"));
        assert!(!choices.contains(&"Mercy"));
    }

    #[test]
    fn test_finalising_current_map() {
        let dir = ScratchDir::new("board-final");
        let mut board = board(&dir);
        board.add_team(team("Alpha", &[]));
        board.select_live_team(TeamSlot::One, "Alpha");
        let id = board.add_map(MapEntryState {
            pool: "Escort".to_string(),
            map: "Rialto".to_string(),
            ..MapEntryState::default()
        });
        assert_eq!(board.maps().current(), Some(id));
        assert_eq!(out(&dir, "livemap.txt").as_deref(), Some("RIALTO"));
        assert_eq!(out(&dir, "map1pool.txt").as_deref(), Some("ESCORT"));
        assert_eq!(out(&dir, "map1result.txt").as_deref(), Some(""));

        board.set_map_score(id, TeamSlot::One, "3").unwrap();
        assert_eq!(out(&dir, "livemapscore1.txt").as_deref(), Some("3"));
        board.set_map_final(id, true).unwrap();

        assert_eq!(board.maps().current(), None);
        assert!(!dir.exists("output/livemap.txt"));
        assert!(!dir.exists("output/livemapscore1.txt"));
        assert_eq!(out(&dir, "map1result.txt").as_deref(), Some("TEAM 1"));
        assert_eq!(out(&dir, "map1winnername.txt").as_deref(), Some("Alpha"));
        assert_eq!(out(&dir, "matchtotalscore1.txt").as_deref(), Some("1"));
        assert_eq!(out(&dir, "matchtotalscore2.txt").as_deref(), Some("0"));
        assert_eq!(out(&dir, "matchwinnername.txt").as_deref(), Some("Alpha"));

        board.set_map_final(id, false).unwrap();
        assert_eq!(board.maps().current(), Some(id));
        assert_eq!(out(&dir, "map1result.txt").as_deref(), Some(""));
        assert!(!dir.exists("output/map1winnername.txt"));
        assert!(!dir.exists("output/matchwinnername.txt"));
    }

    #[test]
    fn test_winner_without_bound_team_blanks_branding() {
        let dir = ScratchDir::new("board-unbound-winner");
        let mut board = board(&dir);
        let id = board.add_map(MapEntryState {
            score2: "2".to_string(),
            ..MapEntryState::default()
        });
        board.set_map_final(id, true).unwrap();
        assert_eq!(out(&dir, "map1result.txt").as_deref(), Some("TEAM 2"));
        assert!(!dir.exists("output/map1winnername.txt"));
        assert!(!out(&dir, "map1winnercolor.html").unwrap().contains("<body"));
    }

    #[test]
    fn test_delete_map_purges_stale_numbers() {
        let dir = ScratchDir::new("board-purge");
        let mut board = board(&dir);
        let first = board.add_map(MapEntryState::default());
        board.add_map(MapEntryState::default());
        board.add_map(MapEntryState::default());
        assert!(dir.exists("output/map3.txt"));
        assert!(dir.exists("output/map3winnercolor.html"));

        board.delete_map(first).unwrap();
        assert_eq!(board.maps().len(), 2);
        assert!(dir.exists("output/map2.txt"));
        assert!(!dir.exists("output/map3.txt"));
        assert!(!dir.exists("output/map3score1.txt"));
        assert!(!dir.exists("output/map3winnercolor.html"));
    }

    #[test]
    fn test_deleting_current_map_moves_current() {
        let dir = ScratchDir::new("board-delete-current");
        let mut board = board(&dir);
        let older = board.add_map(MapEntryState::default());
        let newer = board.add_map(MapEntryState::default());
        assert_eq!(board.maps().current(), Some(newer));
        board.delete_map(newer).unwrap();
        assert_eq!(board.maps().current(), Some(older));
        assert!(dir.exists("output/livemap.txt"));
    }

    #[test]
    fn test_swap_flips_slots_and_scores() {
        let dir = ScratchDir::new("board-swap");
        let mut board = board(&dir);
        let alpha = board.add_team(team("Alpha", &[]));
        let beta = board.add_team(team("Beta", &[]));
        board.select_live_team(TeamSlot::One, "Alpha");
        board.select_live_team(TeamSlot::Two, "Beta");
        board.set_attackers(Attackers::Team1);
        let id = board.add_map(MapEntryState {
            score1: "3".to_string(),
            score2: "1".to_string(),
            ..MapEntryState::default()
        });
        board.set_map_final(id, true).unwrap();
        assert_eq!(out(&dir, "map1winnername.txt").as_deref(), Some("Alpha"));

        board.swap_live_teams();
        assert_eq!(board.live().slot(TeamSlot::One).team, Some(beta));
        assert_eq!(board.live().slot(TeamSlot::Two).team, Some(alpha));
        let entry = board.maps().get(id).unwrap();
        assert_eq!((entry.score1.as_str(), entry.score2.as_str()), ("1", "3"));
        assert_eq!(board.maps().attackers, Attackers::Team2);
        assert_eq!(out(&dir, "team1.txt").as_deref(), Some("Beta"));
        assert_eq!(out(&dir, "map1result.txt").as_deref(), Some("TEAM 2"));
        assert_eq!(out(&dir, "map1winnername.txt").as_deref(), Some("Alpha"));
        assert_eq!(out(&dir, "matchtotalscore2.txt").as_deref(), Some("1"));
    }

    #[test]
    fn test_attackers_select_position_art() {
        let dir = ScratchDir::new("board-positions");
        dir.write("assets/positions/attack.png", b"attack");
        dir.write("assets/positions/defense.png", b"defense");
        let mut board = board(&dir);
        board.set_attackers(Attackers::Team2);
        assert_eq!(out(&dir, "liveposition1.png").as_deref(), Some("defense"));
        assert_eq!(out(&dir, "liveposition2.png").as_deref(), Some("attack"));
        board.set_attackers(Attackers::None);
        assert!(!dir.exists("output/liveposition1.png"));
    }

    #[test]
    fn test_map_art_desaturated_unless_current() {
        let dir = ScratchDir::new("board-desat");
        dir.write("assets/maps/strips/rialto.png", b"color");
        dir.write("assets/maps/strips desat/rialto.png", b"grey");
        let mut board = board(&dir);
        let older = board.add_map(MapEntryState {
            map: "Rialto".to_string(),
            ..MapEntryState::default()
        });
        board.add_map(MapEntryState::default());
        assert_eq!(out(&dir, "map2.png").as_deref(), Some("grey"));
        board.set_map_current(older, true).unwrap();
        assert_eq!(out(&dir, "map2.png").as_deref(), Some("color"));
        assert_eq!(out(&dir, "livemap.png").as_deref(), Some("color"));
    }

    #[test]
    fn test_custom_files_and_cleanup() {
        let dir = ScratchDir::new("board-custom");
        dir.write("output/custom/stray.txt", b"old");
        let mut board = board(&dir);
        assert!(!dir.exists("output/custom/stray.txt"));
        assert!(dir.exists("output/custom/caster1.txt"));

        let file = board.add_custom_entry("Notes", "hello");
        assert_eq!(file, "notes.txt");
        assert_eq!(out(&dir, "custom/notes.txt").as_deref(), Some("HELLO"));
        board.set_custom_data(&file, "bye").unwrap();
        assert_eq!(out(&dir, "custom/notes.txt").as_deref(), Some("BYE"));
        board.delete_custom_entry(&file).unwrap();
        assert!(!dir.exists("output/custom/notes.txt"));
        assert!(board.delete_custom_entry(&file).is_err());
    }

    #[test]
    fn test_title_is_written_raw() {
        let dir = ScratchDir::new("board-title");
        let mut board = board(&dir);
        board.set_live_title("Grand Finals");
        assert_eq!(out(&dir, "livetitle.txt").as_deref(), Some("Grand Finals"));
    }

    #[test]
    fn test_export_round_trip() {
        let dir = ScratchDir::new("board-export");
        let mut board = board(&dir);
        board.add_team(team("Alpha", &[("one", "10")]));
        board.add_team(team("Beta", &[]));
        board.select_live_team(TeamSlot::One, "Beta");
        board.select_live_team(TeamSlot::Two, "Alpha");
        board.set_hero_style(TeamSlot::Two, "Icons");
        board.set_hero_filter(TeamSlot::One, false);
        board.set_live_title("Week 3");
        let first = board.add_map(MapEntryState::default());
        board.add_map(MapEntryState::default());
        board.set_map_current(first, true).unwrap();
        board.set_map_style("Flat");
        board.add_custom_entry("notes", "x");
        let saved = board.export();

        let other = ScratchDir::new("board-export-reload");
        let reloaded = Scoreboard::from_saved(writer(&other), saved.clone());
        assert_eq!(reloaded.export(), saved);
        assert_eq!(saved.mapmanager.current, Some(0));
        assert_eq!(saved.livemanager.team1.teamname, "Beta");
        assert_eq!(out(&other, "team2user1.txt").as_deref(), Some("one"));
        assert_eq!(out(&other, "livetitle.txt").as_deref(), Some("Week 3"));
    }

    #[test]
    fn test_saved_selection_of_missing_team_is_cleared() {
        let dir = ScratchDir::new("board-missing-selection");
        let mut state = SavedState::default();
        state.livemanager.team1.teamname = "Ghost".to_string();
        let board = Scoreboard::from_saved(writer(&dir), state);
        assert_eq!(board.live().slot(TeamSlot::One).selection, "");
        assert_eq!(board.export().livemanager.team1.teamname, "");
    }
}
