use serde::{Deserialize, Serialize};
use std::fmt;

// ── Constants ──────────────────────────────────────────────────────────

pub const ROSTER_SLOTS: usize = 6;
pub const DEFAULT_ROLE: &str = "Flex";
pub const DEFAULT_TEAM_COLOR: &str = "#ffffff";
pub const DEFAULT_MAP_STYLE: &str = "Strips";
pub const DEFAULT_HERO_STYLE: &str = "Portraits";
pub const DEFAULT_CUSTOM_FILE: &str = "untitled.txt";
pub const DEFAULT_CUSTOM_FILES: [&str; 4] = [
    "caster1.txt",
    "caster2.txt",
    "analyst1.txt",
    "analyst2.txt",
];
pub const CUSTOM_DIR: &str = "custom";
pub const PLACEHOLDER_ASSET: &str = "missing.png";

/// 1x1 transparent PNG, written when even the placeholder asset is absent.
pub const EMBEDDED_PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

// ── Identifiers ────────────────────────────────────────────────────────

macro_rules! entity_id {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub const KIND: &'static str = $kind;
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.0)
            }
        }
    };
}

entity_id!(TeamId, "team");
entity_id!(PlayerId, "player");
entity_id!(EntryId, "map");

/// One of the two fixed broadcast slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamSlot {
    One,
    Two,
}

impl TeamSlot {
    pub const ALL: [TeamSlot; 2] = [TeamSlot::One, TeamSlot::Two];

    pub fn index1(self) -> usize {
        match self {
            TeamSlot::One => 1,
            TeamSlot::Two => 2,
        }
    }

    pub fn index0(self) -> usize {
        self.index1() - 1
    }

    pub fn from_index1(index: usize) -> Option<Self> {
        match index {
            1 => Some(TeamSlot::One),
            2 => Some(TeamSlot::Two),
            _ => None,
        }
    }
}

// ── Synchronisation ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Name,
    Logo,
    Color,
    Sr,
    Roster,
    TeamSet,
    TeamChange,
    Swap,
    User,
    Role,
    Hero,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Name => "name",
            EventKind::Logo => "logo",
            EventKind::Color => "color",
            EventKind::Sr => "sr",
            EventKind::Roster => "roster",
            EventKind::TeamSet => "teamset",
            EventKind::TeamChange => "teamchange",
            EventKind::Swap => "swap",
            EventKind::User => "user",
            EventKind::Role => "role",
            EventKind::Hero => "hero",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that publishes change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    TeamManager,
    Team(TeamId),
    Player(PlayerId),
    Live,
}

/// Something that reacts to change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    LiveManager,
    LiveTeam(TeamSlot),
    LivePlayer(TeamSlot, usize),
    MapManager,
}

// ── Map state machine ──────────────────────────────────────────────────

/// Per-entry state. `current` and `final` are mutually exclusive, so the
/// pair collapses to three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Pending,
    Current,
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attackers {
    #[default]
    None,
    Team1,
    Team2,
}

impl Attackers {
    pub fn label(self) -> &'static str {
        match self {
            Attackers::None => "None",
            Attackers::Team1 => "Team 1",
            Attackers::Team2 => "Team 2",
        }
    }

    /// Unknown labels fall back to no attacker.
    pub fn from_label(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "team 1" | "team1" | "1" => Attackers::Team1,
            "team 2" | "team2" | "2" => Attackers::Team2,
            _ => Attackers::None,
        }
    }

    pub fn swapped(self) -> Self {
        match self {
            Attackers::None => Attackers::None,
            Attackers::Team1 => Attackers::Team2,
            Attackers::Team2 => Attackers::Team1,
        }
    }
}

// ── Persisted document ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedState {
    pub teammanager: TeamManagerState,
    pub mapmanager: MapManagerState,
    pub livemanager: LiveManagerState,
    pub customdatamanager: CustomPanelState,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamManagerState {
    pub teams: Vec<TeamState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamState {
    pub name: String,
    pub logo: String,
    pub teamcolor: String,
    pub sr: String,
    pub roster: Vec<PlayerState>,
}

impl Default for TeamState {
    fn default() -> Self {
        Self {
            name: String::new(),
            logo: String::new(),
            teamcolor: DEFAULT_TEAM_COLOR.to_string(),
            sr: String::new(),
            roster: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerState {
    pub username: String,
    pub role: String,
    pub sr: String,
    pub hero: String,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            username: String::new(),
            role: DEFAULT_ROLE.to_string(),
            sr: String::new(),
            hero: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapManagerState {
    pub attackers: String,
    pub mapstyle: String,
    pub current: Option<usize>,
    pub mapset: Vec<MapEntryState>,
}

impl Default for MapManagerState {
    fn default() -> Self {
        Self {
            attackers: Attackers::None.label().to_string(),
            mapstyle: DEFAULT_MAP_STYLE.to_string(),
            current: None,
            mapset: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapEntryState {
    pub pool: String,
    pub map: String,
    pub score1: String,
    pub score2: String,
    #[serde(rename = "final")]
    pub is_final: bool,
}

impl Default for MapEntryState {
    fn default() -> Self {
        Self {
            pool: String::new(),
            map: String::new(),
            score1: "0".to_string(),
            score2: "0".to_string(),
            is_final: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveManagerState {
    pub title: String,
    pub team1: LiveTeamState,
    pub team2: LiveTeamState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveTeamState {
    pub teamname: String,
    pub herostyle: String,
    pub herofilter: bool,
}

impl Default for LiveTeamState {
    fn default() -> Self {
        Self {
            teamname: String::new(),
            herostyle: DEFAULT_HERO_STYLE.to_string(),
            herofilter: true,
        }
    }
}

/// `entries: None` marks a first run, which seeds the default files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomPanelState {
    pub entries: Option<Vec<CustomEntryState>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomEntryState {
    pub file: String,
    pub data: String,
}

// ── Config types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub output_dir: String,
    pub asset_dir: String,
    pub save_file: String,
    pub log_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            asset_dir: "assets".to_string(),
            save_file: "save.json".to_string(),
            log_dir: "logs".to_string(),
        }
    }
}
