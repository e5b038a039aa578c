//! Win/loss/tie classification of each team-week row.

use crate::{ByePolicy, TeamWeekRow};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutcomeFields {
    pub win_ind: u8,
    pub loss_ind: u8,
    pub tie_ind: u8,
    pub bye_ind: u8,
    /// 1 for a win, 0.5 for a tie.
    pub total_wins: f64,
}

impl OutcomeFields {
    pub fn classify(row: &TeamWeekRow, bye_policy: ByePolicy) -> Self {
        if row.is_bye() && bye_policy == ByePolicy::Exclude {
            return Self { bye_ind: 1, ..Self::default() };
        }

        let (win_ind, loss_ind, tie_ind) = match row.score.cmp(&row.opponent_score) {
            Ordering::Greater => (1, 0, 0),
            Ordering::Less => (0, 1, 0),
            Ordering::Equal => (0, 0, 1),
        };

        Self {
            win_ind,
            loss_ind,
            tie_ind,
            bye_ind: u8::from(row.is_bye()),
            total_wins: f64::from(win_ind) + 0.5 * f64::from(tie_ind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRow {
    pub week: TeamWeekRow,
    pub outcome: OutcomeFields,
}

pub fn classify(rows: &[TeamWeekRow], bye_policy: ByePolicy) -> Vec<ClassifiedRow> {
    rows.iter()
        .map(|row| ClassifiedRow {
            week: row.clone(),
            outcome: OutcomeFields::classify(row, bye_policy),
        })
        .collect()
}
