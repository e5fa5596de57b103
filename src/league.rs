use std::fmt;
use std::str::FromStr;

pub const FBREF_ROOT: &str = "https://fbref.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum League {
    PremierLeague,
    LaLiga,
    SerieA,
    Bundesliga,
    Ligue1,
    Championship,
    Mls,
    Eredivisie,
    Brasileiro,
    Primeira,
    LigaMx,
    Segunda,
    BelgianProLeague,
    Bundesliga2,
    Ligue2,
    Argentina,
    SerieB,
    Wsl,
    Nwsl,
    LigaF,
    ALeague,
    PremiereLigue,
    FrauenBundesliga,
}

struct LeagueEntry {
    league: League,
    name: &'static str,
    comp_id: u32,
    slug: &'static str,
    // Single-calendar-year competitions use "2023" instead of "2023-2024".
    bare_year: bool,
}

const fn entry(
    league: League,
    name: &'static str,
    comp_id: u32,
    slug: &'static str,
    bare_year: bool,
) -> LeagueEntry {
    LeagueEntry {
        league,
        name,
        comp_id,
        slug,
        bare_year,
    }
}

static LEAGUES: &[LeagueEntry] = &[
    entry(League::PremierLeague, "Premier League", 9, "Premier-League", false),
    entry(League::LaLiga, "La Liga", 12, "La-Liga", false),
    entry(League::SerieA, "Serie A", 11, "Serie-A", false),
    entry(League::Bundesliga, "Bundesliga", 20, "Bundesliga", false),
    entry(League::Ligue1, "Ligue 1", 13, "Ligue-1", false),
    entry(League::Championship, "Championship", 10, "Championship", false),
    entry(League::Mls, "MLS", 22, "Major-League-Soccer", true),
    entry(League::Eredivisie, "Eredivisie", 23, "Eredivisie", false),
    entry(League::Brasileiro, "Brasileiro", 24, "Serie-A", true),
    entry(League::Primeira, "Primeira", 32, "Primeira-Liga", false),
    entry(League::LigaMx, "Liga MX", 31, "Liga-MX", false),
    entry(League::Segunda, "Segunda", 17, "Segunda-Division", false),
    entry(League::BelgianProLeague, "Belgian Pro League", 37, "Belgian-Pro-League", false),
    entry(League::Bundesliga2, "2 Bundesliga", 33, "2-Bundesliga", false),
    entry(League::Ligue2, "Ligue 2", 60, "Ligue-2", false),
    entry(League::Argentina, "Argentina", 21, "Liga-Profesional-Argentina", true),
    entry(League::SerieB, "Serie B", 18, "Serie-B", false),
    entry(League::Wsl, "WSL", 189, "Womens-Super-League", false),
    entry(League::Nwsl, "NWSL", 182, "NWSL", true),
    entry(League::LigaF, "Liga F", 230, "Liga-F", false),
    entry(League::ALeague, "A League", 196, "A-League-Women", false),
    entry(League::PremiereLigue, "Premiere Ligue", 193, "Premiere-Ligue", false),
    entry(League::FrauenBundesliga, "Frauen Bundesliga", 183, "Frauen-Bundesliga", false),
];

impl League {
    pub fn all() -> impl Iterator<Item = League> {
        LEAGUES.iter().map(|e| e.league)
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn uses_bare_year(self) -> bool {
        self.entry().bare_year
    }

    /// `2023` -> `2023-2024`, or `2023` for calendar-year leagues.
    pub fn season_label(self, year: i32) -> String {
        if self.uses_bare_year() {
            year.to_string()
        } else {
            format!("{year}-{}", year.saturating_add(1))
        }
    }

    pub fn listing_url(self, year: i32) -> String {
        let entry = self.entry();
        let season = self.season_label(year);
        format!(
            "{FBREF_ROOT}/en/comps/{}/{season}/schedule/{season}-{}-Scores-and-Fixtures",
            entry.comp_id, entry.slug
        )
    }

    fn entry(self) -> &'static LeagueEntry {
        // Rows are laid out in variant order.
        &LEAGUES[self as usize]
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown league {0:?}")]
pub struct UnknownLeague(pub String);

impl FromStr for League {
    type Err = UnknownLeague;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        LEAGUES
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(wanted))
            .map(|e| e.league)
            .ok_or_else(|| UnknownLeague(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonRequest {
    pub league: League,
    pub season_year: i32,
}

impl SeasonRequest {
    pub fn new(league: League, season_year: i32) -> Self {
        Self {
            league,
            season_year,
        }
    }

    pub fn season_label(&self) -> String {
        self.league.season_label(self.season_year)
    }

    pub fn listing_url(&self) -> String {
        self.league.listing_url(self.season_year)
    }
}
