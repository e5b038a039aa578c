/// ESPN fantasy football v3 raw wire types: serde shapes for deserializing
/// league responses. These map to the clean domain types in client.rs.
use serde::Deserialize;
use std::collections::BTreeMap;

/// One league document. Which fields are filled depends on the `view`
/// parameters sent with the request.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LeagueResponse {
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    pub settings: Option<SettingsBlock>,
    pub status: Option<StatusBlock>,
    #[serde(default)]
    pub teams: Vec<EspnTeam>,
    #[serde(default)]
    pub members: Vec<EspnMember>,
}

// ---------------------------------------------------------------------------
// Schedule  (view=mMatchup, view=mMatchupScore)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Option<u32>,
    pub matchup_period_id: Option<u32>,
    pub home: Option<MatchupSide>,
    pub away: Option<MatchupSide>,
    /// "HOME", "AWAY", "TIE" or "UNDECIDED" for games not yet played
    pub winner: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MatchupSide {
    pub team_id: Option<i32>,
    pub total_points: Option<f64>,
}

// ---------------------------------------------------------------------------
// Settings  (view=mSettings)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SettingsBlock {
    pub schedule_settings: Option<ScheduleSettings>,
    pub scoring_settings: Option<ScoringSettings>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleSettings {
    pub playoff_seeding_rule: Option<String>,
    pub playoff_seeding_rule_by: Option<i64>,
    pub playoff_team_count: Option<u32>,
    pub matchup_period_count: Option<u32>,
    /// Matchup period id (as a string key) → scoring periods it spans.
    #[serde(default)]
    pub matchup_periods: BTreeMap<String, Vec<u32>>,
    #[serde(default)]
    pub divisions: Vec<EspnDivision>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EspnDivision {
    pub id: u32,
    pub name: Option<String>,
    pub size: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ScoringSettings {
    pub scoring_type: Option<String>,
    pub matchup_tie_rule: Option<String>,
    pub playoff_matchup_tie_rule: Option<String>,
    pub home_team_bonus: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StatusBlock {
    pub first_scoring_period: Option<u32>,
    pub final_scoring_period: Option<u32>,
}

// ---------------------------------------------------------------------------
// Teams + members  (view=mTeam, view=mTeams)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EspnTeam {
    pub id: i32,
    /// Newer seasons carry a single display name; older ones split it.
    pub name: Option<String>,
    pub location: Option<String>,
    pub nickname: Option<String>,
    #[serde(default)]
    pub owners: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EspnMember {
    pub id: String,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
