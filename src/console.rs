//! Line-oriented operator console.
//!
//! One command per line; arguments are separated by whitespace and may be
//! double-quoted. Teams and players are addressed by their 1-based position
//! in the team list / roster, map entries by their display number (the `N`
//! of `map<N>` files).

use crate::catalog::{catalog, ROLES};
use crate::config::save_state;
use crate::scoreboard::Scoreboard;
use crate::types::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{info, warn};

const HELP: &str = "\
team add [name] | rename <t> <name> | logo <t> <path> | color <t> <color> | sr <t> <sr> | delete <t>
player add <t> [user] [role] [sr] | user <t> <p> <tag> | role <t> <p> <role> | sr <t> <p> <sr> | hero <t> <p> <hero> | delete <t> <p>
map add [pool] [map] | pools | choices <n> | pool <n> <pool> | name <n> <map> | score <n> <1|2> <score> | current <n> <on|off> | final <n> <on|off> | delete <n> | style <style> | attackers <None|Team 1|Team 2>
live title <text> | select <1|2> <team name> | swap | herostyle <1|2> <style> | herofilter <1|2> <on|off> | hero <1|2> <p> <hero> | heroes <1|2> <p>
custom add [file] [text] | set <file> <text> | delete <file> | clean
save | show | help | quit";

#[derive(Debug, PartialEq)]
pub enum Outcome {
    Continue(String),
    Quit,
}

/// Splits on whitespace; `"..."` groups words and `\"` inside quotes is a
/// literal quote.
pub fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };
        let mut token = String::new();
        if first == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' if chars.peek() == Some(&'"') => {
                        token.push('"');
                        chars.next();
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    other => token.push(other),
                }
            }
            if !closed {
                return Err("unterminated quote".to_string());
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}

pub fn run_console<R: BufRead, W: Write>(
    board: &mut Scoreboard,
    save_path: &Path,
    input: R,
    mut output: W,
) -> io::Result<()> {
    writeln!(output, "type 'help' for commands")?;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if !handle_line(board, save_path, &line, &mut output)? {
            break;
        }
    }
    Ok(())
}

/// Runs one command and prints its reply. Returns false once the operator
/// asked to quit.
fn handle_line<W: Write>(
    board: &mut Scoreboard,
    save_path: &Path,
    line: &str,
    output: &mut W,
) -> io::Result<bool> {
    match execute(board, save_path, line) {
        Ok(Outcome::Continue(message)) => {
            if !message.is_empty() {
                writeln!(output, "{message}")?;
            }
        }
        Ok(Outcome::Quit) => return Ok(false),
        Err(e) => {
            warn!(command = %line, error = %e, "console command failed");
            writeln!(output, "error: {e}")?;
        }
    }
    output.flush()?;
    Ok(true)
}

fn done(message: &str) -> Result<Outcome, String> {
    Ok(Outcome::Continue(message.to_string()))
}

pub fn execute(board: &mut Scoreboard, save_path: &Path, line: &str) -> Result<Outcome, String> {
    let tokens = tokenize(line)?;
    let args: Vec<&str> = tokens.iter().map(String::as_str).collect();
    match args.as_slice() {
        [] => done(""),
        ["quit"] | ["exit"] => Ok(Outcome::Quit),
        ["help"] => done(HELP),
        ["show"] => Ok(Outcome::Continue(show(board))),
        ["save"] => {
            save_state(save_path, &board.export()).map_err(|e| e.to_string())?;
            done("saved")
        }
        ["team", rest @ ..] => team_command(board, rest).map(Outcome::Continue),
        ["player", rest @ ..] => player_command(board, rest).map(Outcome::Continue),
        ["map", rest @ ..] => map_command(board, rest).map(Outcome::Continue),
        ["live", rest @ ..] => live_command(board, rest).map(Outcome::Continue),
        ["custom", rest @ ..] => custom_command(board, rest).map(Outcome::Continue),
        [other, ..] => Err(format!("unknown command '{other}', try 'help'")),
    }
}

fn team_command(board: &mut Scoreboard, args: &[&str]) -> Result<String, String> {
    match args {
        ["add"] | ["add", _] => {
            let name = args.get(1).copied().unwrap_or_default();
            board.add_team(TeamState {
                name: name.to_string(),
                ..TeamState::default()
            });
            Ok(format!("team {} added", board.teams().teams().len()))
        }
        ["rename", t, name] => {
            let id = team_at(board, t)?;
            board.rename_team(id, name).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["logo", t, path] => {
            let id = team_at(board, t)?;
            board.set_team_logo(id, path).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["color", t, color] => {
            let id = team_at(board, t)?;
            board.set_team_color(id, color).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["sr", t, sr] => {
            let id = team_at(board, t)?;
            board.set_team_sr(id, sr).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["delete", t] => {
            let id = team_at(board, t)?;
            board.delete_team(id).map_err(|e| e.to_string())?;
            Ok("team deleted".to_string())
        }
        _ => Err(usage("team")),
    }
}

fn player_command(board: &mut Scoreboard, args: &[&str]) -> Result<String, String> {
    match args {
        ["add", t, rest @ ..] if rest.len() <= 3 => {
            let team = team_at(board, t)?;
            let mut state = PlayerState::default();
            if let Some(user) = rest.first() {
                state.username = user.to_string();
            }
            if let Some(role) = rest.get(1) {
                state.role = role_arg(role)?;
            }
            if let Some(sr) = rest.get(2) {
                state.sr = sr.to_string();
            }
            board.add_player(team, state).map_err(|e| e.to_string())?;
            Ok("player added".to_string())
        }
        ["user", t, p, value] => {
            let id = player_at(board, t, p)?;
            board.set_player_user(id, value).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["role", t, p, value] => {
            let id = player_at(board, t, p)?;
            board.set_player_role(id, &role_arg(value)?).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["sr", t, p, value] => {
            let id = player_at(board, t, p)?;
            board.set_player_sr(id, value).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["hero", t, p, value] => {
            let id = player_at(board, t, p)?;
            board.set_player_hero(id, value).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["delete", t, p] => {
            let id = player_at(board, t, p)?;
            board.remove_player(id).map_err(|e| e.to_string())?;
            Ok("player deleted".to_string())
        }
        _ => Err(usage("player")),
    }
}

fn map_command(board: &mut Scoreboard, args: &[&str]) -> Result<String, String> {
    match args {
        ["add", rest @ ..] if rest.len() <= 2 => {
            board.add_map(MapEntryState {
                pool: rest.first().map(|s| s.to_string()).unwrap_or_default(),
                map: rest.get(1).map(|s| s.to_string()).unwrap_or_default(),
                ..MapEntryState::default()
            });
            Ok(format!("{} map entries", board.maps().len()))
        }
        ["pools"] => Ok(catalog().modes().join(", ")),
        ["choices", n] => {
            let id = entry_at(board, n)?;
            let pool = board.maps().get(id).map(|e| e.pool.as_str()).unwrap_or_default();
            Ok(catalog().maps_for(pool)[1..].join(", "))
        }
        ["pool", n, pool] => {
            let id = entry_at(board, n)?;
            board.set_map_pool(id, pool).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["name", n, map] => {
            let id = entry_at(board, n)?;
            board.set_map_name(id, map).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["score", n, side, score] => {
            let id = entry_at(board, n)?;
            let slot = slot_arg(side)?;
            board.set_map_score(id, slot, score).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["current", n, flag] => {
            let id = entry_at(board, n)?;
            board.set_map_current(id, on_off(flag)?).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["final", n, flag] => {
            let id = entry_at(board, n)?;
            board.set_map_final(id, on_off(flag)?).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["delete", n] => {
            let id = entry_at(board, n)?;
            board.delete_map(id).map_err(|e| e.to_string())?;
            Ok(format!("{} map entries", board.maps().len()))
        }
        ["style", style] => {
            board.set_map_style(style);
            Ok(String::new())
        }
        ["attackers", label @ ..] if !label.is_empty() => {
            board.set_attackers(Attackers::from_label(&label.join(" ")));
            Ok(format!("attackers: {}", board.maps().attackers.label()))
        }
        _ => Err(usage("map")),
    }
}

fn live_command(board: &mut Scoreboard, args: &[&str]) -> Result<String, String> {
    match args {
        ["title", title] => {
            board.set_live_title(title);
            Ok(String::new())
        }
        ["select", side, name] => {
            let slot = slot_arg(side)?;
            board.select_live_team(slot, name);
            let selection = &board.live().slot(slot).selection;
            if selection.is_empty() && !name.is_empty() {
                return Err(format!("no team named '{name}'"));
            }
            Ok(String::new())
        }
        ["swap"] => {
            board.swap_live_teams();
            Ok("teams swapped".to_string())
        }
        ["herostyle", side, style] => {
            board.set_hero_style(slot_arg(side)?, style);
            Ok(String::new())
        }
        ["herofilter", side, flag] => {
            board.set_hero_filter(slot_arg(side)?, on_off(flag)?);
            Ok(String::new())
        }
        ["hero", side, p, hero] => {
            let slot = slot_arg(side)?;
            let position = position_arg(p, ROSTER_SLOTS)?;
            board
                .set_live_hero(slot, position, hero)
                .map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["heroes", side, p] => {
            let heroes = board.hero_choices(slot_arg(side)?, position_arg(p, ROSTER_SLOTS)?);
            Ok(heroes.into_iter().filter(|h| !h.is_empty()).collect::<Vec<_>>().join(", "))
        }
        _ => Err(usage("live")),
    }
}

fn custom_command(board: &mut Scoreboard, args: &[&str]) -> Result<String, String> {
    match args {
        ["add", rest @ ..] if rest.len() <= 2 => {
            let file = board.add_custom_entry(
                rest.first().copied().unwrap_or_default(),
                rest.get(1).copied().unwrap_or_default(),
            );
            Ok(format!("created {CUSTOM_DIR}/{file}"))
        }
        ["set", file, text] => {
            board.set_custom_data(file, text).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["delete", file] => {
            board.delete_custom_entry(file).map_err(|e| e.to_string())?;
            Ok(String::new())
        }
        ["clean"] => {
            board.clean_custom();
            Ok(String::new())
        }
        _ => Err(usage("custom")),
    }
}

fn show(board: &Scoreboard) -> String {
    let mut text = String::new();
    let live = board.live();
    let _ = writeln!(text, "title: {}", live.title);
    let _ = writeln!(text, "teams:");
    for (i, team) in board.teams().teams().iter().enumerate() {
        let _ = writeln!(
            text,
            "  {}. {:?} sr {} color {}",
            i + 1,
            team.name,
            team.effective_sr(),
            team.color
        );
        for (j, player) in team.roster.iter().enumerate() {
            let _ = writeln!(
                text,
                "     {}. {} [{}] sr {} hero {:?}",
                j + 1,
                player.username,
                player.role,
                player.sr,
                player.hero
            );
        }
    }
    let maps = board.maps();
    let _ = writeln!(
        text,
        "maps (style {}, attackers {}):",
        maps.style,
        maps.attackers.label()
    );
    for entry in maps.entries().iter().rev() {
        let position = maps.display_position(entry.id).unwrap_or_default();
        let status = match maps.status(entry.id) {
            Some(EntryStatus::Current) => "current",
            Some(EntryStatus::Final) => "final",
            _ => "",
        };
        let _ = writeln!(
            text,
            "  map{position}: {:?} / {:?} {}-{} {status}",
            entry.pool, entry.map, entry.score1, entry.score2
        );
    }
    for slot in TeamSlot::ALL {
        let side = live.slot(slot);
        let _ = writeln!(
            text,
            "live team {}: {:?} (heroes {}, filter {})",
            slot.index1(),
            side.selection,
            side.hero_style,
            if side.hero_filter { "on" } else { "off" }
        );
    }
    let files: Vec<&str> = board.custom().entries().iter().map(|e| e.file.as_str()).collect();
    let _ = write!(text, "custom: {}", files.join(", "));
    text
}

// ── Argument parsing ───────────────────────────────────────────────────

fn usage(group: &str) -> String {
    let line = HELP
        .lines()
        .find(|line| line.starts_with(group))
        .unwrap_or(HELP);
    format!("usage: {line}")
}

/// 1-based position into a list of `len` items, returned 0-based.
fn position_arg(raw: &str, len: usize) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Ok(n - 1),
        _ => Err(format!("'{raw}' is not a position between 1 and {len}")),
    }
}

fn team_at(board: &Scoreboard, raw: &str) -> Result<TeamId, String> {
    let teams = board.teams().teams();
    let index = position_arg(raw, teams.len())?;
    Ok(teams[index].id)
}

fn player_at(board: &Scoreboard, team: &str, player: &str) -> Result<PlayerId, String> {
    let teams = board.teams().teams();
    let team = &teams[position_arg(team, teams.len())?];
    let index = position_arg(player, team.roster.len())?;
    Ok(team.roster[index].id)
}

fn entry_at(board: &Scoreboard, raw: &str) -> Result<EntryId, String> {
    let position = position_arg(raw, board.maps().len())? + 1;
    board
        .maps()
        .id_at_position(position)
        .ok_or_else(|| format!("no map{position}"))
}

/// Case-insensitive match against the known roles.
fn role_arg(raw: &str) -> Result<String, String> {
    ROLES
        .iter()
        .find(|role| role.eq_ignore_ascii_case(raw))
        .map(|role| role.to_string())
        .ok_or_else(|| format!("'{raw}' is not a role ({})", ROLES.join(", ")))
}

fn slot_arg(raw: &str) -> Result<TeamSlot, String> {
    raw.parse::<usize>()
        .ok()
        .and_then(TeamSlot::from_index1)
        .ok_or_else(|| format!("'{raw}' is not a team slot (1 or 2)"))
}

fn on_off(raw: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        _ => Err(format!("'{raw}' is not on/off")),
    }
}

/// Interactive console with line editing and history. Ctrl-C or Ctrl-D
/// leaves it like `quit`.
pub fn run_stdio(board: &mut Scoreboard, save_path: &Path) {
    if let Err(e) = run_editor(board, save_path) {
        warn!(error = %e, "console stopped");
    }
    info!("console closed");
}

fn run_editor(board: &mut Scoreboard, save_path: &Path) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut stdout = io::stdout();
    writeln!(stdout, "type 'help' for commands")?;
    loop {
        match rl.readline("scoreboard> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                if !handle_line(board, save_path, line, &mut stdout)? {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
