//! Teams and their rosters.
//!
//! Teams know how to render their own branding into a target file; where
//! those files go is decided by whoever is displaying the team (a live
//! broadcast slot, or a map/match winner).

use crate::catalog::catalog;
use crate::error::{Result, ScoreboardError};
use crate::format::{filename_fmt, parse_lenient_int, strip_discriminator};
use crate::output::OutputWriter;
use crate::scoreboard::Scoreboard;
use crate::types::*;
use std::path::Path;
use tracing::info;

// ── Properties ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamProperty {
    Name,
    Logo,
    Color,
    Sr,
}

impl TeamProperty {
    pub const ALL: [TeamProperty; 4] = [
        TeamProperty::Name,
        TeamProperty::Logo,
        TeamProperty::Color,
        TeamProperty::Sr,
    ];

    /// `team1.txt`, `team1logo.png`, `team1color.html`, `team1sr.txt`.
    pub fn file_name(self, prefix: &str) -> String {
        match self {
            TeamProperty::Name => format!("{prefix}.txt"),
            TeamProperty::Logo => format!("{prefix}logo.png"),
            TeamProperty::Color => format!("{prefix}color.html"),
            TeamProperty::Sr => format!("{prefix}sr.txt"),
        }
    }

    pub fn from_event(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::Name => Some(TeamProperty::Name),
            EventKind::Logo => Some(TeamProperty::Logo),
            EventKind::Color => Some(TeamProperty::Color),
            EventKind::Sr => Some(TeamProperty::Sr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerProperty {
    User,
    Role,
    Sr,
    Hero,
}

impl PlayerProperty {
    pub const ALL: [PlayerProperty; 4] = [
        PlayerProperty::User,
        PlayerProperty::Role,
        PlayerProperty::Sr,
        PlayerProperty::Hero,
    ];

    /// e.g. `team1user3.txt`, `team2hero1.png`.
    pub fn file_name(self, team: usize, position: usize) -> String {
        match self {
            PlayerProperty::User => format!("team{team}user{position}.txt"),
            PlayerProperty::Role => format!("team{team}role{position}.png"),
            PlayerProperty::Sr => format!("team{team}sr{position}.txt"),
            PlayerProperty::Hero => format!("team{team}hero{position}.png"),
        }
    }

    pub fn from_event(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::User => Some(PlayerProperty::User),
            EventKind::Role => Some(PlayerProperty::Role),
            EventKind::Sr => Some(PlayerProperty::Sr),
            EventKind::Hero => Some(PlayerProperty::Hero),
            _ => None,
        }
    }
}

// ── Model ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub role: String,
    pub sr: String,
    pub hero: String,
}

impl Player {
    fn from_state(id: PlayerId, state: PlayerState) -> Self {
        Player {
            id,
            username: state.username,
            role: state.role,
            sr: state.sr,
            hero: state.hero,
        }
    }

    pub fn export(&self) -> PlayerState {
        PlayerState {
            username: self.username.clone(),
            role: self.role.clone(),
            sr: self.sr.clone(),
            hero: self.hero.clone(),
        }
    }

    pub fn display_name(&self) -> String {
        strip_discriminator(&self.username)
    }

    pub fn draw_property(&self, out: &OutputWriter, property: PlayerProperty, target: &str, hero_style: &str) {
        match property {
            PlayerProperty::User => out.write_text(target, &self.display_name()),
            PlayerProperty::Role => {
                let file = format!("{}.png", filename_fmt(&self.role));
                out.copy_asset(&out.asset(&["roles", file.as_str()]), target);
            }
            PlayerProperty::Sr => out.write_text(target, &self.sr),
            PlayerProperty::Hero => {
                // Unknown heroes go straight to the placeholder.
                let src = if catalog().is_known_hero(&self.hero) {
                    let style = filename_fmt(hero_style);
                    let file = format!("{}.png", filename_fmt(&self.hero));
                    out.asset(&["heroes", style.as_str(), file.as_str()])
                } else {
                    out.asset(&[PLACEHOLDER_ASSET])
                };
                out.copy_asset(&src, target);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub logo: String,
    pub color: String,
    /// Manual override; empty means "average of the roster".
    pub sr: String,
    pub roster: Vec<Player>,
}

impl Team {
    /// Integer-truncated mean of the roster ratings; unparseable ratings
    /// count as zero and an empty roster averages to zero.
    pub fn average_sr(&self) -> i128 {
        let total: i128 = self
            .roster
            .iter()
            .map(|p| i128::from(parse_lenient_int(&p.sr)))
            .sum();
        total / (self.roster.len().max(1) as i128)
    }

    pub fn effective_sr(&self) -> String {
        if self.sr.trim().is_empty() {
            self.average_sr().to_string()
        } else {
            self.sr.clone()
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| p.id == id)
    }

    pub fn export(&self) -> TeamState {
        TeamState {
            name: self.name.clone(),
            logo: self.logo.clone(),
            teamcolor: self.color.clone(),
            sr: self.sr.clone(),
            roster: self.roster.iter().map(Player::export).collect(),
        }
    }

    pub fn draw_property(&self, out: &OutputWriter, property: TeamProperty, target: &str) {
        match property {
            TeamProperty::Name => out.write_text(target, &self.name),
            TeamProperty::Logo => out.copy_asset(Path::new(&self.logo), target),
            // Colour text is passed through unvalidated.
            TeamProperty::Color => {
                let color = self.color.trim();
                out.write_color(target, (!color.is_empty()).then_some(color));
            }
            TeamProperty::Sr => out.write_text(target, &self.effective_sr()),
        }
    }
}

/// Teams in registration order. Ids are handed out monotonically and never
/// reused, so a stale id simply stops resolving once its team is deleted.
#[derive(Debug, Default)]
pub struct TeamManager {
    teams: Vec<Team>,
    next_team: u64,
    next_player: u64,
}

impl TeamManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn get(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: TeamId) -> Result<&mut Team> {
        self.teams
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ScoreboardError::UnknownEntity { kind: TeamId::KIND, id: id.0 })
    }

    pub fn add(&mut self, state: TeamState) -> TeamId {
        self.next_team += 1;
        let id = TeamId(self.next_team);
        let roster = state
            .roster
            .into_iter()
            .map(|player| self.new_player(player))
            .collect();
        self.teams.push(Team {
            id,
            name: state.name,
            logo: state.logo,
            color: state.teamcolor,
            sr: state.sr,
            roster,
        });
        id
    }

    fn new_player(&mut self, state: PlayerState) -> Player {
        self.next_player += 1;
        Player::from_state(PlayerId(self.next_player), state)
    }

    pub fn remove(&mut self, id: TeamId) -> Option<Team> {
        let pos = self.teams.iter().position(|t| t.id == id)?;
        Some(self.teams.remove(pos))
    }

    pub fn add_player(&mut self, team: TeamId, state: PlayerState) -> Result<PlayerId> {
        let player = self.new_player(state);
        let id = player.id;
        self.get_mut(team)?.roster.push(player);
        Ok(id)
    }

    pub fn remove_player(&mut self, player: PlayerId) -> Result<(TeamId, Player)> {
        for team in &mut self.teams {
            if let Some(pos) = team.roster.iter().position(|p| p.id == player) {
                return Ok((team.id, team.roster.remove(pos)));
            }
        }
        Err(unknown_player(player))
    }

    pub fn team_of(&self, player: PlayerId) -> Option<TeamId> {
        self.teams
            .iter()
            .find(|t| t.player(player).is_some())
            .map(|t| t.id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.teams.iter().find_map(|t| t.player(id))
    }

    fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.teams
            .iter_mut()
            .flat_map(|t| t.roster.iter_mut())
            .find(|p| p.id == id)
            .ok_or(unknown_player(id))
    }

    /// Non-empty names mapped to teams. A later team with the same name
    /// replaces the earlier one; first-seen name order is kept.
    pub fn team_list(&self) -> Vec<(String, TeamId)> {
        let mut list: Vec<(String, TeamId)> = Vec::new();
        for team in &self.teams {
            if team.name.is_empty() {
                continue;
            }
            match list.iter_mut().find(|(name, _)| *name == team.name) {
                Some(entry) => entry.1 = team.id,
                None => list.push((team.name.clone(), team.id)),
            }
        }
        list
    }

    pub fn export(&self) -> TeamManagerState {
        TeamManagerState {
            teams: self.teams.iter().map(Team::export).collect(),
        }
    }
}

fn unknown_player(id: PlayerId) -> ScoreboardError {
    ScoreboardError::UnknownEntity { kind: PlayerId::KIND, id: id.0 }
}

// ── Operations ─────────────────────────────────────────────────────────

impl Scoreboard {
    pub fn add_team(&mut self, state: TeamState) -> TeamId {
        let id = self.teams.add(state);
        info!(team = %id, "team added");
        self.notify(Source::TeamManager, EventKind::TeamSet);
        id
    }

    pub fn rename_team(&mut self, id: TeamId, name: &str) -> Result<()> {
        self.teams.get_mut(id)?.name = name.to_string();
        info!(team = %id, name, "team renamed");
        self.notify(Source::Team(id), EventKind::Name);
        self.notify(Source::TeamManager, EventKind::TeamSet);
        Ok(())
    }

    pub fn set_team_logo(&mut self, id: TeamId, logo: &str) -> Result<()> {
        self.teams.get_mut(id)?.logo = logo.to_string();
        self.notify(Source::Team(id), EventKind::Logo);
        Ok(())
    }

    pub fn set_team_color(&mut self, id: TeamId, color: &str) -> Result<()> {
        self.teams.get_mut(id)?.color = color.to_string();
        self.notify(Source::Team(id), EventKind::Color);
        Ok(())
    }

    pub fn set_team_sr(&mut self, id: TeamId, sr: &str) -> Result<()> {
        self.teams.get_mut(id)?.sr = sr.to_string();
        self.notify(Source::Team(id), EventKind::Sr);
        Ok(())
    }

    /// Dependents are told before the team's own registrations are dropped
    /// so they can unsubscribe and clear what they drew for it.
    pub fn delete_team(&mut self, id: TeamId) -> Result<()> {
        let team = self
            .teams
            .remove(id)
            .ok_or(ScoreboardError::UnknownEntity { kind: TeamId::KIND, id: id.0 })?;
        info!(team = %id, name = %team.name, "team deleted");
        self.notify(Source::TeamManager, EventKind::TeamSet);
        self.bus.drop_source(Source::Team(id));
        for player in &team.roster {
            self.bus.drop_source(Source::Player(player.id));
        }
        Ok(())
    }

    pub fn add_player(&mut self, team: TeamId, state: PlayerState) -> Result<PlayerId> {
        let id = self.teams.add_player(team, state)?;
        info!(team = %team, player = %id, "player added");
        self.notify(Source::Team(team), EventKind::Roster);
        Ok(id)
    }

    pub fn remove_player(&mut self, player: PlayerId) -> Result<()> {
        let (team, _) = self.teams.remove_player(player)?;
        info!(team = %team, player = %player, "player removed");
        self.notify(Source::Team(team), EventKind::Roster);
        self.bus.drop_source(Source::Player(player));
        Ok(())
    }

    pub fn set_player_user(&mut self, player: PlayerId, username: &str) -> Result<()> {
        self.teams.player_mut(player)?.username = username.to_string();
        self.player_changed(player, EventKind::User);
        Ok(())
    }

    /// Changing the role narrows the selectable heroes but keeps the chosen one.
    pub fn set_player_role(&mut self, player: PlayerId, role: &str) -> Result<()> {
        self.teams.player_mut(player)?.role = role.to_string();
        self.player_changed(player, EventKind::Role);
        Ok(())
    }

    pub fn set_player_sr(&mut self, player: PlayerId, sr: &str) -> Result<()> {
        self.teams.player_mut(player)?.sr = sr.to_string();
        self.player_changed(player, EventKind::Sr);
        Ok(())
    }

    pub fn set_player_hero(&mut self, player: PlayerId, hero: &str) -> Result<()> {
        self.teams.player_mut(player)?.hero = hero.to_string();
        self.player_changed(player, EventKind::Hero);
        Ok(())
    }

    fn player_changed(&mut self, player: PlayerId, kind: EventKind) {
        self.notify(Source::Player(player), kind);
        if let Some(team) = self.teams.team_of(player) {
            self.notify(Source::Team(team), EventKind::Roster);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScratchDir;
    use pretty_assertions::assert_eq;

    fn player(name: &str, sr: &str) -> PlayerState {
        PlayerState {
            username: name.to_string(),
            sr: sr.to_string(),
            ..PlayerState::default()
        }
    }

    fn team(name: &str, roster: Vec<PlayerState>) -> TeamState {
        TeamState {
            name: name.to_string(),
            roster,
            ..TeamState::default()
        }
    }

    #[test]
    fn test_average_sr_truncates_and_ignores_garbage() {
        let mut manager = TeamManager::new();
        let id = manager.add(team(
            "Alpha",
            vec![player("a", "10"), player("b", "x"), player("c", "20")],
        ));
        let t = manager.get(id).unwrap();
        assert_eq!(t.average_sr(), 10);
        assert_eq!(t.effective_sr(), "10");
    }

    #[test]
    fn test_average_sr_does_not_overflow() {
        let mut manager = TeamManager::new();
        let max = i64::MAX.to_string();
        let id = manager.add(team("Alpha", vec![player("a", &max), player("b", &max)]));
        let t = manager.get(id).unwrap();
        assert_eq!(t.average_sr(), i128::from(i64::MAX));
        assert_eq!(t.effective_sr(), max);
    }

    #[test]
    fn test_average_sr_empty_roster_is_zero() {
        let mut manager = TeamManager::new();
        let id = manager.add(team("Alpha", vec![]));
        assert_eq!(manager.get(id).unwrap().average_sr(), 0);
    }

    #[test]
    fn test_manual_sr_overrides_average() {
        let mut manager = TeamManager::new();
        let id = manager.add(TeamState {
            sr: "4000".to_string(),
            ..team("Alpha", vec![player("a", "10")])
        });
        assert_eq!(manager.get(id).unwrap().effective_sr(), "4000");
    }

    #[test]
    fn test_team_list_skips_empty_and_last_wins() {
        let mut manager = TeamManager::new();
        let first = manager.add(team("Alpha", vec![]));
        let _blank = manager.add(team("", vec![]));
        let beta = manager.add(team("Beta", vec![]));
        let second = manager.add(team("Alpha", vec![]));
        let list = manager.team_list();
        assert_eq!(
            list,
            vec![("Alpha".to_string(), second), ("Beta".to_string(), beta)]
        );
        assert!(!list.iter().any(|(_, id)| *id == first));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut manager = TeamManager::new();
        let a = manager.add(team("A", vec![]));
        manager.remove(a);
        let b = manager.add(team("B", vec![]));
        assert_ne!(a, b);
        assert!(manager.get(a).is_none());
    }

    #[test]
    fn test_player_lookup_and_removal() {
        let mut manager = TeamManager::new();
        let t = manager.add(team("A", vec![player("one#1234", "1")]));
        let p = manager.add_player(t, player("two", "2")).unwrap();
        assert_eq!(manager.team_of(p), Some(t));
        assert_eq!(manager.get(t).unwrap().roster[0].display_name(), "one");
        let (owner, removed) = manager.remove_player(p).unwrap();
        assert_eq!(owner, t);
        assert_eq!(removed.username, "two");
        assert!(manager.remove_player(p).is_err());
    }

    #[test]
    fn test_export_keeps_roster_order() {
        let mut manager = TeamManager::new();
        let state = team("A", vec![player("one", "1"), player("two", "2")]);
        manager.add(state.clone());
        assert_eq!(manager.export().teams, vec![state]);
    }

    #[test]
    fn test_draw_team_properties() {
        let dir = ScratchDir::new("teams-draw");
        let out = OutputWriter::new(dir.path(), dir.path().join("assets"));
        let mut manager = TeamManager::new();
        let id = manager.add(TeamState {
            teamcolor: "#123456".to_string(),
            logo: dir.path().join("logo-src.png").to_string_lossy().to_string(),
            ..team("Alpha", vec![player("a", "30"), player("b", "10")])
        });
        dir.write("logo-src.png", b"logo");
        let t = manager.get(id).unwrap();
        for property in TeamProperty::ALL {
            t.draw_property(&out, property, &property.file_name("team1"));
        }
        assert_eq!(dir.read("team1.txt").as_deref(), Some("Alpha"));
        assert_eq!(dir.read("team1logo.png").as_deref(), Some("logo"));
        assert!(dir.read("team1color.html").unwrap().contains("#123456"));
        assert_eq!(dir.read("team1sr.txt").as_deref(), Some("20"));
    }
}
