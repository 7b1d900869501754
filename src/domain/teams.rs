pub const RECENT_TEAMS_LIMIT: usize = 5;

/// Moves `team` to the front of the most-recently-used list, keeping it unique and bounded
pub fn push_recent_team(teams: &mut Vec<String>, team: &str) {
    if team.trim().is_empty() {
        return;
    }

    teams.retain(|existing| existing != team);
    teams.insert(0, team.to_string());
    teams.truncate(RECENT_TEAMS_LIMIT);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teams(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_newest_team_goes_first() {
        let mut recent = teams(&["Milan"]);
        push_recent_team(&mut recent, "Celtic");
        assert_eq!(recent, teams(&["Celtic", "Milan"]));
    }

    #[test]
    fn test_duplicate_moves_to_front() {
        let mut recent = teams(&["Celtic", "Milan", "Benfica"]);
        push_recent_team(&mut recent, "Benfica");
        assert_eq!(recent, teams(&["Benfica", "Celtic", "Milan"]));
    }

    #[test]
    fn test_list_is_capped() {
        let mut recent = Vec::new();
        for team in ["A", "B", "C", "D", "E", "F"] {
            push_recent_team(&mut recent, team);
        }
        assert_eq!(recent, teams(&["F", "E", "D", "C", "B"]));
    }

    #[test]
    fn test_blank_team_is_ignored() {
        let mut recent = teams(&["Milan"]);
        push_recent_team(&mut recent, "  ");
        assert_eq!(recent, teams(&["Milan"]));
    }
}
