use crate::database::models::{Match, UserId};

pub const FORM_LENGTH: usize = 5;
pub const NO_RESULT: &str = "-";

/// Last results of `user_id` as W/L/D letters, newest first, padded with "-".
/// `matches` must already be ordered newest first.
pub fn recent_form(matches: &[Match], user_id: UserId) -> Vec<String> {
    let mut form: Vec<String> = matches
        .iter()
        .filter(|m| m.completed && m.involves(user_id))
        .take(FORM_LENGTH)
        .map(|m| m.outcome_for(user_id).as_letter().to_string())
        .collect();

    form.resize(FORM_LENGTH, NO_RESULT.to_string());
    form
}
