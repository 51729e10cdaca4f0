//! The on-air view: a title and two team slots, each mirroring a team's
//! branding and the first six players of its roster.
//!
//! Slots refer to teams and players by id and subscribe to them on the
//! bus, so renames and roster edits flow through without re-selection.

use crate::catalog::catalog;
use crate::error::{Result, ScoreboardError};
use crate::scoreboard::Scoreboard;
use crate::teams::{PlayerProperty, TeamProperty};
use crate::types::*;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq)]
pub struct LiveTeam {
    /// Name shown in the selector; empty when nothing is selected.
    pub selection: String,
    pub team: Option<TeamId>,
    pub hero_style: String,
    pub hero_filter: bool,
    pub players: [Option<PlayerId>; ROSTER_SLOTS],
}

impl Default for LiveTeam {
    fn default() -> Self {
        LiveTeam {
            selection: String::new(),
            team: None,
            hero_style: DEFAULT_HERO_STYLE.to_string(),
            hero_filter: true,
            players: [None; ROSTER_SLOTS],
        }
    }
}

impl LiveTeam {
    fn export(&self) -> LiveTeamState {
        LiveTeamState {
            teamname: self.selection.clone(),
            herostyle: self.hero_style.clone(),
            herofilter: self.hero_filter,
        }
    }
}

#[derive(Debug, Default)]
pub struct LiveManager {
    pub title: String,
    team_list: Vec<(String, TeamId)>,
    slots: [LiveTeam; 2],
}

impl LiveManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(&self, slot: TeamSlot) -> &LiveTeam {
        &self.slots[slot.index0()]
    }

    fn slot_mut(&mut self, slot: TeamSlot) -> &mut LiveTeam {
        &mut self.slots[slot.index0()]
    }

    /// Names offered by the selectors, blank option first.
    pub fn choices(&self) -> Vec<String> {
        std::iter::once(String::new())
            .chain(self.team_list.iter().map(|(name, _)| name.clone()))
            .collect()
    }

    fn lookup(&self, name: &str) -> Option<TeamId> {
        self.team_list
            .iter()
            .find(|(listed, _)| listed == name)
            .map(|(_, id)| *id)
    }

    fn listed_name(&self, id: TeamId) -> Option<&str> {
        self.team_list
            .iter()
            .find(|(_, listed)| *listed == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn export(&self) -> LiveManagerState {
        LiveManagerState {
            title: self.title.clone(),
            team1: self.slot(TeamSlot::One).export(),
            team2: self.slot(TeamSlot::Two).export(),
        }
    }
}

impl Scoreboard {
    /// Applies saved slot settings and selections. Expects the team list
    /// subscription to be in place so later renames keep flowing in.
    pub(crate) fn restore_live(&mut self, state: LiveManagerState) {
        self.live.title = state.title;
        self.live.team_list = self.teams.team_list();
        for (slot, saved) in [(TeamSlot::One, state.team1), (TeamSlot::Two, state.team2)] {
            let live = self.live.slot_mut(slot);
            live.hero_style = saved.herostyle;
            live.hero_filter = saved.herofilter;
            self.select_live_team(slot, &saved.teamname);
        }
    }

    pub fn set_live_title(&mut self, title: &str) {
        self.live.title = title.to_string();
        self.out.write_text("livetitle.txt", &self.live.title);
    }

    /// Selects a team by its listed name. Unknown names clear the slot.
    pub fn select_live_team(&mut self, slot: TeamSlot, name: &str) {
        let team = self.live.lookup(name);
        let live = self.live.slot_mut(slot);
        live.selection = if team.is_some() { name.to_string() } else { String::new() };
        if live.team != team {
            self.bind_live_team(slot, team);
        }
    }

    fn bind_live_team(&mut self, slot: TeamSlot, team: Option<TeamId>) {
        let listener = Listener::LiveTeam(slot);
        let previous = std::mem::replace(&mut self.live.slot_mut(slot).team, team);
        if let Some(old) = previous {
            self.bus.desync(Source::Team(old), listener);
        }
        if let Some(new) = team {
            self.bus.sync(Source::Team(new), listener);
        }
        info!(slot = slot.index1(), ?team, "live team bound");
        self.notify(Source::Live, EventKind::TeamChange);
        self.draw_live_team(slot);
    }

    /// Exchanges the two selections; maps follow through the swap event.
    pub fn swap_live_teams(&mut self) {
        let first = self.live.slot(TeamSlot::One).selection.clone();
        let second = self.live.slot(TeamSlot::Two).selection.clone();
        self.select_live_team(TeamSlot::One, &second);
        self.select_live_team(TeamSlot::Two, &first);
        info!("live teams swapped");
        self.notify(Source::Live, EventKind::Swap);
    }

    pub fn set_hero_style(&mut self, slot: TeamSlot, style: &str) {
        self.live.slot_mut(slot).hero_style = style.to_string();
        for position in 0..ROSTER_SLOTS {
            self.draw_live_player_property(slot, position, PlayerProperty::Hero);
        }
    }

    /// Only narrows the selectable heroes; chosen heroes stay.
    pub fn set_hero_filter(&mut self, slot: TeamSlot, filter: bool) {
        self.live.slot_mut(slot).hero_filter = filter;
        debug!(slot = slot.index1(), filter, "hero filter set");
    }

    /// Heroes selectable for the player shown at `position` (0-based).
    pub fn hero_choices(&self, slot: TeamSlot, position: usize) -> Vec<&'static str> {
        let live = self.live.slot(slot);
        let Some(player) = live
            .players
            .get(position)
            .copied()
            .flatten()
            .and_then(|id| self.teams.player(id))
        else {
            return Vec::new();
        };
        catalog().heroes_for(&player.role, live.hero_filter).to_vec()
    }

    /// Sets the hero of the player shown at `position` (0-based); the edit
    /// goes to the player itself so every view of it updates.
    pub fn set_live_hero(&mut self, slot: TeamSlot, position: usize, hero: &str) -> Result<()> {
        let player = self
            .live
            .slot(slot)
            .players
            .get(position)
            .copied()
            .flatten()
            .ok_or_else(|| {
                ScoreboardError::InvalidArgument(format!(
                    "no player at position {} of team {}",
                    position + 1,
                    slot.index1()
                ))
            })?;
        let unchanged = self.teams.player(player).is_some_and(|p| p.hero == hero);
        if unchanged {
            return Ok(());
        }
        self.set_player_hero(player, hero)
    }

    // ── Event handlers ─────────────────────────────────────────────────

    pub(crate) fn live_manager_event(&mut self, kind: EventKind) {
        if kind != EventKind::TeamSet {
            return;
        }
        self.live.team_list = self.teams.team_list();
        for slot in TeamSlot::ALL {
            self.refresh_selection(slot);
        }
    }

    /// Keeps the slot on its team under the team's current listed name,
    /// or clears it when the team is no longer listed.
    fn refresh_selection(&mut self, slot: TeamSlot) {
        let name = self
            .live
            .slot(slot)
            .team
            .and_then(|id| self.live.listed_name(id))
            .map(str::to_string)
            .unwrap_or_default();
        self.select_live_team(slot, &name);
    }

    pub(crate) fn live_team_event(&mut self, slot: TeamSlot, kind: EventKind) {
        if let Some(property) = TeamProperty::from_event(kind) {
            self.notify(Source::Live, EventKind::TeamChange);
            self.draw_live_team_property(slot, property);
        } else if kind == EventKind::Roster {
            self.bind_live_roster(slot);
            self.draw_live_team_property(slot, TeamProperty::Sr);
        }
    }

    pub(crate) fn live_player_event(&mut self, slot: TeamSlot, position: usize, kind: EventKind) {
        if let Some(property) = PlayerProperty::from_event(kind) {
            self.draw_live_player_property(slot, position, property);
        }
    }

    fn bind_live_roster(&mut self, slot: TeamSlot) {
        let roster: Vec<PlayerId> = self
            .live
            .slot(slot)
            .team
            .and_then(|id| self.teams.get(id))
            .map(|team| team.roster.iter().take(ROSTER_SLOTS).map(|p| p.id).collect())
            .unwrap_or_default();
        for position in 0..ROSTER_SLOTS {
            self.bind_live_player(slot, position, roster.get(position).copied());
        }
    }

    fn bind_live_player(&mut self, slot: TeamSlot, position: usize, player: Option<PlayerId>) {
        let current = &mut self.live.slot_mut(slot).players[position];
        if *current == player {
            return;
        }
        let previous = std::mem::replace(current, player);
        let listener = Listener::LivePlayer(slot, position);
        if let Some(old) = previous {
            self.bus.desync(Source::Player(old), listener);
        }
        if let Some(new) = player {
            self.bus.sync(Source::Player(new), listener);
        }
        for property in PlayerProperty::ALL {
            self.draw_live_player_property(slot, position, property);
        }
    }

    // ── Drawing ────────────────────────────────────────────────────────

    pub(crate) fn draw_live(&self) {
        self.out.write_text("livetitle.txt", &self.live.title);
        for slot in TeamSlot::ALL {
            for property in TeamProperty::ALL {
                self.draw_live_team_property(slot, property);
            }
            for position in 0..ROSTER_SLOTS {
                for property in PlayerProperty::ALL {
                    self.draw_live_player_property(slot, position, property);
                }
            }
        }
    }

    fn draw_live_team(&mut self, slot: TeamSlot) {
        for property in TeamProperty::ALL {
            self.draw_live_team_property(slot, property);
        }
        self.bind_live_roster(slot);
    }

    /// An empty slot leaves no files behind except a blank colour page.
    fn draw_live_team_property(&self, slot: TeamSlot, property: TeamProperty) {
        let target = property.file_name(&format!("team{}", slot.index1()));
        match self.live.slot(slot).team.and_then(|id| self.teams.get(id)) {
            Some(team) => team.draw_property(&self.out, property, &target),
            None if property == TeamProperty::Color => self.out.write_color(&target, None),
            None => self.out.remove(&target),
        }
    }

    fn draw_live_player_property(&self, slot: TeamSlot, position: usize, property: PlayerProperty) {
        let live = self.live.slot(slot);
        let target = property.file_name(slot.index1(), position + 1);
        match live.players[position].and_then(|id| self.teams.player(id)) {
            Some(player) => player.draw_property(&self.out, property, &target, &live.hero_style),
            None => self.out.remove(&target),
        }
    }
}
