//! Map entries of the match and their current/final state machine.
//!
//! Entries keep insertion order; their display number counts from the
//! newest one (`map1` is always the latest added), and that number is
//! what ends up in file names. Numbers shift whenever entries are added
//! or removed, so those operations redraw the whole set.

use crate::error::{Result, ScoreboardError};
use crate::format::{cmp_lenient_int, filename_fmt, text_fmt};
use crate::scoreboard::Scoreboard;
use crate::teams::TeamProperty;
use crate::types::*;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, info};

pub const LIVE_PREFIX: &str = "livemap";
const DESATURATED_STYLE: &str = "strips";

fn numbered_map_file() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^map(\d+)\D").expect("static map file pattern"))
}

/// 0 while the entry is not final, else 1 or 2 for the higher score and
/// 0 for a draw. Scores that do not parse count as zero.
pub fn winner(is_final: bool, score1: &str, score2: &str) -> u8 {
    if !is_final {
        return 0;
    }
    match cmp_lenient_int(score1, score2) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => 2,
        std::cmp::Ordering::Equal => 0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub id: EntryId,
    pub pool: String,
    pub map: String,
    pub score1: String,
    pub score2: String,
    is_final: bool,
}

impl MapEntry {
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn winner(&self) -> u8 {
        winner(self.is_final, &self.score1, &self.score2)
    }

    pub fn score(&self, slot: TeamSlot) -> &str {
        match slot {
            TeamSlot::One => &self.score1,
            TeamSlot::Two => &self.score2,
        }
    }

    pub fn result_text(&self) -> &'static str {
        if !self.is_final {
            return "";
        }
        match self.winner() {
            1 => "TEAM 1",
            2 => "TEAM 2",
            _ => "DRAW!",
        }
    }

    fn export(&self) -> MapEntryState {
        MapEntryState {
            pool: self.pool.clone(),
            map: self.map.clone(),
            score1: self.score1.clone(),
            score2: self.score2.clone(),
            is_final: self.is_final,
        }
    }
}

#[derive(Debug)]
pub struct MapManager {
    pub attackers: Attackers,
    pub style: String,
    entries: Vec<MapEntry>,
    current: Option<EntryId>,
    next_id: u64,
}

impl Default for MapManager {
    fn default() -> Self {
        MapManager {
            attackers: Attackers::None,
            style: DEFAULT_MAP_STYLE.to_string(),
            entries: Vec::new(),
            current: None,
            next_id: 0,
        }
    }
}

impl MapManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the manager without drawing. The saved current index is
    /// applied last so it wins over the automatic choice made while adding;
    /// an index that is out of range or points at a final entry is ignored.
    pub fn from_state(state: MapManagerState) -> Self {
        let mut manager = MapManager {
            attackers: Attackers::from_label(&state.attackers),
            style: state.mapstyle,
            ..MapManager::default()
        };
        for entry in state.mapset {
            manager.add(entry);
        }
        match state.current {
            None => manager.current = None,
            Some(index) => {
                if let Some(entry) = manager.entries.get(index).filter(|e| !e.is_final) {
                    manager.current = Some(entry.id);
                }
            }
        }
        manager
    }

    pub fn export(&self) -> MapManagerState {
        MapManagerState {
            attackers: self.attackers.label().to_string(),
            mapstyle: self.style.clone(),
            current: self
                .current
                .and_then(|id| self.entries.iter().position(|e| e.id == id)),
            mapset: self.entries.iter().map(MapEntry::export).collect(),
        }
    }

    pub fn entries(&self) -> &[MapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<EntryId> {
        self.current
    }

    pub fn current_entry(&self) -> Option<&MapEntry> {
        self.current.and_then(|id| self.get(id))
    }

    pub fn get(&self, id: EntryId) -> Option<&MapEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: EntryId) -> Result<&mut MapEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(unknown_entry(id))
    }

    /// 1 for the newest entry, `len()` for the oldest.
    pub fn display_position(&self, id: EntryId) -> Option<usize> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.len() - index)
    }

    pub fn id_at_position(&self, position: usize) -> Option<EntryId> {
        let index = self.entries.len().checked_sub(position)?;
        (position > 0).then(|| self.entries[index].id)
    }

    pub fn status(&self, id: EntryId) -> Option<EntryStatus> {
        let entry = self.get(id)?;
        Some(if entry.is_final {
            EntryStatus::Final
        } else if self.current == Some(id) {
            EntryStatus::Current
        } else {
            EntryStatus::Pending
        })
    }

    pub fn add(&mut self, state: MapEntryState) -> EntryId {
        self.next_id += 1;
        let id = EntryId(self.next_id);
        self.entries.push(MapEntry {
            id,
            pool: state.pool,
            map: state.map,
            score1: state.score1,
            score2: state.score2,
            is_final: state.is_final,
        });
        self.autocurrent();
        id
    }

    /// Removes an entry; if it was current another one is picked.
    pub fn remove(&mut self, id: EntryId) -> Result<MapEntry> {
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(unknown_entry(id))?;
        let entry = self.entries.remove(index);
        if self.current == Some(id) {
            self.current = None;
            self.autocurrent();
        }
        Ok(entry)
    }

    /// Newest non-final entry becomes current, or nothing if all are final.
    pub fn autocurrent(&mut self) {
        self.current = self.entries.iter().rev().find(|e| !e.is_final).map(|e| e.id);
    }

    /// Single entry point for status changes. Current and final exclude
    /// each other; any change of the final flag re-runs `autocurrent`,
    /// while making an entry current explicitly does not.
    pub fn set_status(&mut self, id: EntryId, status: EntryStatus) -> Result<()> {
        let entry = self.get_mut(id)?;
        let was_final = entry.is_final;
        match status {
            EntryStatus::Current => {
                entry.is_final = false;
                self.current = Some(id);
            }
            EntryStatus::Final => {
                if !was_final {
                    entry.is_final = true;
                    self.autocurrent();
                }
            }
            EntryStatus::Pending => {
                if was_final {
                    entry.is_final = false;
                    self.autocurrent();
                } else if self.current == Some(id) {
                    self.current = None;
                }
            }
        }
        Ok(())
    }

    /// `[draws, team 1 wins, team 2 wins]` over final entries.
    pub fn tally(&self) -> [u32; 3] {
        let mut counts = [0u32; 3];
        for entry in self.entries.iter().filter(|e| e.is_final) {
            counts[entry.winner() as usize] += 1;
        }
        counts
    }

    /// Team with strictly more map wins than the other, if any.
    pub fn match_winner(&self) -> u8 {
        let [_, one, two] = self.tally();
        match one.cmp(&two) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => 2,
            std::cmp::Ordering::Equal => 0,
        }
    }

    fn swap_sides(&mut self) {
        for entry in &mut self.entries {
            std::mem::swap(&mut entry.score1, &mut entry.score2);
        }
        self.attackers = self.attackers.swapped();
    }
}

fn unknown_entry(id: EntryId) -> ScoreboardError {
    ScoreboardError::UnknownEntity { kind: EntryId::KIND, id: id.0 }
}

// ── Operations ─────────────────────────────────────────────────────────

impl Scoreboard {
    pub fn add_map(&mut self, state: MapEntryState) -> EntryId {
        let id = self.maps.add(state);
        info!(entry = %id, "map entry added");
        self.draw_maps();
        id
    }

    pub fn delete_map(&mut self, id: EntryId) -> Result<()> {
        self.maps.remove(id)?;
        info!(entry = %id, "map entry deleted");
        self.draw_maps();
        Ok(())
    }

    /// A new pool invalidates the chosen map.
    pub fn set_map_pool(&mut self, id: EntryId, pool: &str) -> Result<()> {
        let entry = self.maps.get_mut(id)?;
        entry.pool = pool.to_string();
        entry.map.clear();
        self.redraw_entry(id, |board, entry, prefix, current| {
            board.draw_entry_pool(entry, prefix);
            board.draw_entry_map(entry, prefix, current);
        });
        Ok(())
    }

    pub fn set_map_name(&mut self, id: EntryId, map: &str) -> Result<()> {
        self.maps.get_mut(id)?.map = map.to_string();
        self.redraw_entry(id, |board, entry, prefix, current| {
            board.draw_entry_map(entry, prefix, current);
        });
        Ok(())
    }

    pub fn set_map_score(&mut self, id: EntryId, slot: TeamSlot, score: &str) -> Result<()> {
        let entry = self.maps.get_mut(id)?;
        match slot {
            TeamSlot::One => entry.score1 = score.to_string(),
            TeamSlot::Two => entry.score2 = score.to_string(),
        }
        let is_final = entry.is_final;
        self.redraw_entry(id, |board, entry, prefix, _| {
            board.draw_entry_score(entry, prefix, slot);
        });
        if is_final {
            self.draw_entry_result(id);
            self.draw_match_totals();
        }
        Ok(())
    }

    pub fn set_map_status(&mut self, id: EntryId, status: EntryStatus) -> Result<()> {
        let previous_current = self.maps.current();
        let was_final = self.maps.get(id).map(|e| e.is_final);
        self.maps.set_status(id, status)?;
        debug!(entry = %id, ?status, "map status set");

        if self.maps.get(id).map(|e| e.is_final) != was_final {
            self.draw_entry_result(id);
            self.draw_match_totals();
        }
        let current = self.maps.current();
        if current != previous_current {
            // Desaturated art depends on which entry is current.
            for changed in [previous_current, current].into_iter().flatten() {
                self.draw_numbered_map_art(changed);
            }
            self.draw_live_map();
        }
        Ok(())
    }

    /// Toggle-style helper: turning current off only affects the entry
    /// that is actually current.
    pub fn set_map_current(&mut self, id: EntryId, on: bool) -> Result<()> {
        match (on, self.maps.status(id)) {
            (_, None) => Err(unknown_entry(id)),
            (true, _) => self.set_map_status(id, EntryStatus::Current),
            (false, Some(EntryStatus::Current)) => self.set_map_status(id, EntryStatus::Pending),
            (false, _) => Ok(()),
        }
    }

    pub fn set_map_final(&mut self, id: EntryId, on: bool) -> Result<()> {
        match (on, self.maps.status(id)) {
            (_, None) => Err(unknown_entry(id)),
            (true, _) => self.set_map_status(id, EntryStatus::Final),
            (false, Some(EntryStatus::Final)) => self.set_map_status(id, EntryStatus::Pending),
            (false, _) => Ok(()),
        }
    }

    pub fn set_map_style(&mut self, style: &str) {
        self.maps.style = style.to_string();
        let ids: Vec<EntryId> = self.maps.entries().iter().map(|e| e.id).collect();
        for id in ids {
            self.draw_numbered_map_art(id);
        }
        self.draw_live_map();
    }

    pub fn set_attackers(&mut self, attackers: Attackers) {
        self.maps.attackers = attackers;
        self.draw_positions();
    }

    pub(crate) fn map_manager_event(&mut self, kind: EventKind) {
        match kind {
            EventKind::TeamChange => {
                let ids: Vec<EntryId> = self.maps.entries().iter().map(|e| e.id).collect();
                for id in ids {
                    self.draw_entry_result(id);
                }
                self.draw_match_totals();
            }
            EventKind::Swap => {
                self.maps.swap_sides();
                info!("map scores swapped with the teams");
                self.draw_maps();
            }
            _ => {}
        }
    }

    // ── Drawing ────────────────────────────────────────────────────────

    /// Every entry, the live view, positions, and the stale-file purge.
    pub fn draw_maps(&self) {
        for entry in self.maps.entries() {
            self.draw_entry(entry);
        }
        self.draw_live_map();
        self.draw_positions();
        self.purge_stale_maps();
    }

    fn draw_entry(&self, entry: &MapEntry) {
        let Some(position) = self.maps.display_position(entry.id) else {
            return;
        };
        let prefix = format!("map{position}");
        let current = self.maps.current() == Some(entry.id);
        self.draw_entry_pool(entry, &prefix);
        self.draw_entry_map(entry, &prefix, current);
        for slot in TeamSlot::ALL {
            self.draw_entry_score(entry, &prefix, slot);
        }
        self.draw_entry_result(entry.id);
    }

    /// Runs `draw` for the numbered files and, when the entry is current,
    /// for the live counterpart.
    fn redraw_entry(&self, id: EntryId, draw: impl Fn(&Self, &MapEntry, &str, bool)) {
        let (Some(entry), Some(position)) = (self.maps.get(id), self.maps.display_position(id))
        else {
            return;
        };
        let current = self.maps.current() == Some(id);
        draw(self, entry, &format!("map{position}"), current);
        if current {
            draw(self, entry, LIVE_PREFIX, true);
        }
    }

    fn draw_numbered_map_art(&self, id: EntryId) {
        self.redraw_entry(id, |board, entry, prefix, current| {
            if prefix != LIVE_PREFIX {
                board.draw_entry_map(entry, prefix, current);
            }
        });
    }

    fn draw_entry_pool(&self, entry: &MapEntry, prefix: &str) {
        let out = &self.out;
        let file = format!("{}.png", filename_fmt(&entry.pool));
        out.copy_asset(&out.asset(&["game", "modes", file.as_str()]), &format!("{prefix}pool.png"));
        out.write_text(&format!("{prefix}pool.txt"), &text_fmt(&entry.pool));
    }

    /// Map art, or the pool's generic art while no map is chosen. Entries
    /// other than the current one get the desaturated variant when the
    /// style has one.
    fn draw_entry_map(&self, entry: &MapEntry, prefix: &str, current: bool) {
        let out = &self.out;
        let mut style = filename_fmt(&self.maps.style);
        if !current && style == DESATURATED_STYLE {
            style.push_str(" desat");
        }
        let art = if entry.map.is_empty() {
            filename_fmt(&format!("_pool {}", entry.pool))
        } else {
            filename_fmt(&entry.map)
        };
        let file = format!("{art}.png");
        out.copy_asset(&out.asset(&["maps", style.as_str(), file.as_str()]), &format!("{prefix}.png"));
        out.write_text(&format!("{prefix}.txt"), &text_fmt(&entry.map));
    }

    fn draw_entry_score(&self, entry: &MapEntry, prefix: &str, slot: TeamSlot) {
        self.out.write_text(
            &format!("{prefix}score{}.txt", slot.index1()),
            &text_fmt(entry.score(slot)),
        );
    }

    /// Result text and winner branding of a numbered entry; the live copy
    /// only carries the result text since a current entry is never final.
    fn draw_entry_result(&self, id: EntryId) {
        let (Some(entry), Some(position)) = (self.maps.get(id), self.maps.display_position(id))
        else {
            return;
        };
        let prefix = format!("map{position}");
        self.out.write_text(&format!("{prefix}result.txt"), entry.result_text());
        self.draw_winner_branding(&format!("{prefix}winner"), entry.winner());
        if self.maps.current() == Some(id) {
            self.out
                .write_text(&format!("{LIVE_PREFIX}result.txt"), entry.result_text());
        }
    }

    /// `<prefix>name.txt`, `<prefix>logo.png` and `<prefix>color.html` for
    /// the team in the winning slot. Without a winner (or without a team in
    /// that slot) name and logo are removed and the colour page is blank.
    fn draw_winner_branding(&self, prefix: &str, winner: u8) {
        let team = TeamSlot::from_index1(winner as usize)
            .and_then(|slot| self.live.slot(slot).team)
            .and_then(|id| self.teams.get(id));
        let name = format!("{prefix}name.txt");
        let logo = format!("{prefix}logo.png");
        let color = format!("{prefix}color.html");
        match team {
            Some(team) => {
                team.draw_property(&self.out, TeamProperty::Name, &name);
                team.draw_property(&self.out, TeamProperty::Logo, &logo);
                team.draw_property(&self.out, TeamProperty::Color, &color);
            }
            None => {
                self.out.remove(&name);
                self.out.remove(&logo);
                self.out.write_color(&color, None);
            }
        }
    }

    pub(crate) fn draw_live_map(&self) {
        match self.maps.current_entry() {
            Some(entry) => {
                self.draw_entry_pool(entry, LIVE_PREFIX);
                self.draw_entry_map(entry, LIVE_PREFIX, true);
                for slot in TeamSlot::ALL {
                    self.draw_entry_score(entry, LIVE_PREFIX, slot);
                }
                self.out
                    .write_text(&format!("{LIVE_PREFIX}result.txt"), entry.result_text());
            }
            None => {
                for suffix in [
                    "pool.png", "pool.txt", ".png", ".txt", "score1.txt", "score2.txt",
                    "result.txt",
                ] {
                    self.out.remove(&format!("{LIVE_PREFIX}{suffix}"));
                }
            }
        }
        self.draw_match_totals();
    }

    fn draw_match_totals(&self) {
        let [_, one, two] = self.maps.tally();
        self.out.write_text("matchtotalscore1.txt", &one.to_string());
        self.out.write_text("matchtotalscore2.txt", &two.to_string());
        self.draw_winner_branding("matchwinner", self.maps.match_winner());
    }

    fn draw_positions(&self) {
        let out = &self.out;
        let (first, second) = match self.maps.attackers {
            Attackers::None => {
                out.remove("liveposition1.png");
                out.remove("liveposition2.png");
                return;
            }
            Attackers::Team1 => ("attack", "defense"),
            Attackers::Team2 => ("defense", "attack"),
        };
        for (side, target) in [(first, "liveposition1.png"), (second, "liveposition2.png")] {
            let file = format!("{side}.png");
            out.copy_asset(&out.asset(&["positions", file.as_str()]), target);
        }
    }

    /// Numbered files left over from entries that no longer exist.
    fn purge_stale_maps(&self) {
        let count = self.maps.len();
        for file in self.out.list(None) {
            let Some(number) = numbered_map_file()
                .captures(&file)
                .and_then(|caps| caps[1].parse::<usize>().ok())
            else {
                continue;
            };
            if number > count {
                debug!(file = %file, "removing stale map output");
                self.out.remove(&file);
            }
        }
    }
}
