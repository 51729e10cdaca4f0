//! Hero and map catalogs, built once at first use and immutable after.

use std::sync::OnceLock;

pub const ROLES: [&str; 4] = ["Flex", "Damage", "Tank", "Support"];

const BLANK_ONLY: &[&str] = &[""];

const DAMAGE: &[&str] = &[
    "Ashe", "Bastion", "Doomfist", "Genji", "Hanzo", "Junkrat", "McCree", "Mei", "Pharah",
    "Reaper", "Soldier: 76", "Sombra", "Symmetra", "Torbjörn", "Tracer", "Widowmaker",
];
const TANK: &[&str] = &[
    "D.Va", "Orisa", "Reinhardt", "Roadhog", "Winston", "Wrecking Ball", "Zarya",
];
const SUPPORT: &[&str] = &["Ana", "Brigitte", "Lúcio", "Mercy", "Moira", "Zenyatta"];

// Control sub-maps; not a selectable mode on its own.
const EXTENDED_CONTROL: &[&str] = &[
    "Busan Downtown", "Busan Sanctuary", "Busan MEKA Base", "Ilios Lighthouse", "Ilios Ruins",
    "Ilios Well", "Lijiang Control Center", "Lijiang Garden", "Lijiang Night Market",
    "Nepal Sanctum", "Nepal Shrine", "Nepal Village", "Oasis City Center", "Oasis Gardens",
    "Oasis University",
];
const ASSAULT: &[&str] = &[
    "Hanamura", "Horizon Lunar Colony", "Paris", "Temple of Anubis", "Volskaya Industries",
];
const ESCORT: &[&str] = &["Dorado", "Junkertown", "Rialto", "Route 66", "Watchpoint: Gibraltar"];
const HYBRID: &[&str] = &["Blizzard World", "Eichenwalde", "Hollywood", "King's Row", "Numbani"];
const CONTROL: &[&str] = &["Busan", "Ilios", "Lijiang Tower", "Nepal", "Oasis"];
const CAPTURE_THE_FLAG: &[&str] = &["Ayutthaya"];
const ELIMINATION: &[&str] = &["Black Forest", "Castillo", "Ecopoint: Antarctica", "Necropolis"];
const DEATHMATCH: &[&str] = &[
    "Dorado", "Eichenwalde", "Hollywood", "King's Row", "Château Guillard", "Petra",
];

#[derive(Debug)]
pub struct Catalog {
    heroes: Vec<(&'static str, Vec<&'static str>)>,
    all_heroes: Vec<&'static str>,
    modes: Vec<(&'static str, Vec<&'static str>)>,
}

/// Sorted, de-duplicated, with the blank option first.
fn selection(groups: &[&[&'static str]]) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = groups.iter().flat_map(|g| g.iter().copied()).collect();
    out.sort_unstable();
    out.dedup();
    out.insert(0, "");
    out
}

impl Catalog {
    fn build() -> Self {
        let heroes = vec![
            ("Damage", selection(&[DAMAGE])),
            ("Tank", selection(&[TANK])),
            ("Support", selection(&[SUPPORT])),
        ];
        let all_heroes = selection(&[DAMAGE, TANK, SUPPORT]);

        // Capture the Flag = own + extended control.
        // Elimination      = own + Capture the Flag (composed).
        // Deathmatch       = own + extended control + Assault + Elimination's own.
        // Team Deathmatch  = Deathmatch.
        let deathmatch = selection(&[DEATHMATCH, EXTENDED_CONTROL, ASSAULT, ELIMINATION]);
        let modes = vec![
            ("Assault", selection(&[ASSAULT])),
            ("Escort", selection(&[ESCORT])),
            ("Hybrid", selection(&[HYBRID])),
            ("Control", selection(&[CONTROL])),
            ("Capture the Flag", selection(&[CAPTURE_THE_FLAG, EXTENDED_CONTROL])),
            ("Elimination", selection(&[ELIMINATION, CAPTURE_THE_FLAG, EXTENDED_CONTROL])),
            ("Deathmatch", deathmatch.clone()),
            ("Team Deathmatch", deathmatch),
        ];

        Catalog {
            heroes,
            all_heroes,
            modes,
        }
    }

    pub fn modes(&self) -> Vec<&'static str> {
        self.modes.iter().map(|(mode, _)| *mode).collect()
    }

    /// Maps selectable for a mode; unknown modes only offer the blank option.
    pub fn maps_for(&self, mode: &str) -> &[&'static str] {
        self.modes
            .iter()
            .find(|(name, _)| *name == mode)
            .map(|(_, maps)| maps.as_slice())
            .unwrap_or(BLANK_ONLY)
    }

    /// Heroes selectable for a role. Flex, unknown roles and a disabled
    /// filter all see every hero.
    pub fn heroes_for(&self, role: &str, filter: bool) -> &[&'static str] {
        if !filter {
            return self.all_heroes.as_slice();
        }
        self.heroes
            .iter()
            .find(|(name, _)| *name == role)
            .map(|(_, heroes)| heroes.as_slice())
            .unwrap_or(self.all_heroes.as_slice())
    }

    pub fn is_known_hero(&self, hero: &str) -> bool {
        !hero.is_empty() && self.all_heroes.iter().any(|known| *known == hero)
    }
}

pub fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(Catalog::build)
}
