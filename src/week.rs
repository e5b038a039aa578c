use chrono::NaiveDate;

/// Week number on `today` for a season whose week 1 starts on `first_week`,
/// clamped to `[1, last_ranked_week]`. Without an anchor date (or before
/// it), the answer is the last ranked week or week 1.
pub fn current_week(first_week: Option<NaiveDate>, today: NaiveDate, last_ranked_week: u32) -> u32 {
    let last = last_ranked_week.max(1);
    let Some(first_week) = first_week else {
        return last;
    };
    let days = (today - first_week).num_days();
    if days < 0 {
        return 1;
    }
    let week = u32::try_from(days / 7 + 1).unwrap_or(u32::MAX);
    week.clamp(1, last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn counts_whole_weeks_from_anchor() {
        let anchor = Some(date(2021, 9, 14));
        assert_eq!(current_week(anchor, date(2021, 9, 14), 13), 1);
        assert_eq!(current_week(anchor, date(2021, 9, 20), 13), 1);
        assert_eq!(current_week(anchor, date(2021, 9, 21), 13), 2);
        assert_eq!(current_week(anchor, date(2021, 10, 12), 13), 5);
    }

    #[test]
    fn clamps_to_ranked_weeks() {
        let anchor = Some(date(2021, 9, 14));
        assert_eq!(current_week(anchor, date(2022, 1, 30), 13), 13);
        assert_eq!(current_week(anchor, date(2021, 10, 12), 3), 3);
        assert_eq!(current_week(anchor, date(2021, 8, 1), 13), 1);
    }

    #[test]
    fn no_anchor_means_latest_week() {
        assert_eq!(current_week(None, date(2021, 10, 1), 9), 9);
        assert_eq!(current_week(None, date(2021, 10, 1), 0), 1);
    }
}
