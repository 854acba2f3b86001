use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::DateInterval;
use crate::model::{Property, Reservation};

// ── Availability queries ──────────────────────────────────────────

pub fn is_reserved(property: &Property, date: NaiveDate) -> bool {
    reservation_covering(property, date).is_some()
}

pub fn reservation_covering(property: &Property, date: NaiveDate) -> Option<&Reservation> {
    property.overlapping(&DateInterval::single(date)).next()
}

/// True iff no date of `[start, end]` is reserved, including reservations
/// that begin and end strictly inside the range. Cost is a binary search
/// plus the reservations starting before `end`, independent of range length.
/// An inverted range is never available.
pub fn is_range_available(property: &Property, start: NaiveDate, end: NaiveDate) -> bool {
    match DateInterval::new(start, end) {
        Ok(range) => property.overlapping(&range).next().is_none(),
        Err(_) => false,
    }
}

// ── Render hints ─────────────────────────────────────────────────

/// How a calendar cell should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayHint {
    Reserved,
    RangeStart,
    RangeEnd,
    InRange,
    Available,
}

/// What the user has picked so far: a lone start, or a full range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Selection {
    pub fn range(&self) -> Option<DateInterval> {
        DateInterval::new(self.start?, self.end?).ok()
    }
}

/// Per-day hints for `window`. Selection markers win over `Reserved` so a
/// clicked reservation shows as selected.
pub fn day_hints(property: &Property, selection: &Selection, window: &DateInterval) -> Vec<(NaiveDate, DayHint)> {
    window
        .days()
        .map(|day| (day, hint_for(property, selection, day)))
        .collect()
}

fn hint_for(property: &Property, selection: &Selection, day: NaiveDate) -> DayHint {
    if selection.start == Some(day) {
        return DayHint::RangeStart;
    }
    if selection.end == Some(day) {
        return DayHint::RangeEnd;
    }
    if let Some(range) = selection.range()
        && range.contains(day)
    {
        return DayHint::InRange;
    }
    if is_reserved(property, day) {
        DayHint::Reserved
    } else {
        DayHint::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GuestContact;
    use crate::dates::{days_between, is_within};
    use proptest::prelude::*;
    use ulid::Ulid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn property_with(spans: &[(NaiveDate, NaiveDate)]) -> Property {
        let mut p = Property::new("p1", "Casa", "Maldonado", 4);
        for &(start, end) in spans {
            p.insert_reservation(Reservation {
                id: Ulid::new(),
                span: DateInterval::new(start, end).unwrap(),
                guest: GuestContact::new("Ana", "ana@x.com"),
            });
        }
        p
    }

    #[test]
    fn empty_calendar_is_free() {
        let p = property_with(&[]);
        assert!(!is_reserved(&p, d(2024, 6, 10)));
        assert!(reservation_covering(&p, d(2024, 6, 10)).is_none());
        assert!(is_range_available(&p, d(2024, 6, 1), d(2024, 6, 30)));
    }

    #[test]
    fn reserved_includes_both_ends() {
        let p = property_with(&[(d(2024, 6, 10), d(2024, 6, 15))]);
        assert!(is_reserved(&p, d(2024, 6, 10)));
        assert!(is_reserved(&p, d(2024, 6, 15)));
        assert!(!is_reserved(&p, d(2024, 6, 9)));
        assert!(!is_reserved(&p, d(2024, 6, 16)));
    }

    #[test]
    fn covering_returns_the_matching_reservation() {
        let p = property_with(&[(d(2024, 6, 1), d(2024, 6, 3)), (d(2024, 6, 10), d(2024, 6, 15))]);
        let r = reservation_covering(&p, d(2024, 6, 12)).unwrap();
        assert_eq!(r.start(), d(2024, 6, 10));
        assert_eq!(r.end(), d(2024, 6, 15));
    }

    #[test]
    fn partial_overlap_is_unavailable() {
        let p = property_with(&[(d(2024, 6, 10), d(2024, 6, 15))]);
        assert!(!is_range_available(&p, d(2024, 6, 12), d(2024, 6, 20)));
    }

    #[test]
    fn adjacent_range_is_available() {
        let p = property_with(&[(d(2024, 6, 10), d(2024, 6, 15))]);
        assert!(is_range_available(&p, d(2024, 6, 16), d(2024, 6, 20)));
    }

    #[test]
    fn reservation_strictly_inside_range_is_detected() {
        let p = property_with(&[(d(2024, 6, 12), d(2024, 6, 13))]);
        assert!(!is_range_available(&p, d(2024, 6, 10), d(2024, 6, 20)));
    }

    #[test]
    fn millennia_long_range_checks_reservations_not_days() {
        let spans: Vec<_> = (0..200)
            .map(|i| {
                let day = d(3000, 1, 1) + chrono::Duration::days(i * 3);
                (day, day)
            })
            .collect();
        let p = property_with(&spans);
        assert!(!is_range_available(&p, d(3000, 1, 1), d(9000, 1, 1)));
        assert!(is_range_available(&p, d(4000, 1, 1), d(9000, 1, 1)));
    }

    #[test]
    fn inverted_range_is_never_available() {
        let p = property_with(&[]);
        assert!(!is_range_available(&p, d(2024, 6, 20), d(2024, 6, 10)));
    }

    #[test]
    fn hints_mark_selection_and_reservations() {
        let p = property_with(&[(d(2024, 6, 3), d(2024, 6, 4))]);
        let selection = Selection {
            start: Some(d(2024, 6, 6)),
            end: Some(d(2024, 6, 8)),
        };
        let window = DateInterval::new(d(2024, 6, 2), d(2024, 6, 9)).unwrap();
        let hints: Vec<_> = day_hints(&p, &selection, &window).into_iter().map(|(_, h)| h).collect();
        assert_eq!(
            hints,
            vec![
                DayHint::Available,
                DayHint::Reserved,
                DayHint::Reserved,
                DayHint::Available,
                DayHint::RangeStart,
                DayHint::InRange,
                DayHint::RangeEnd,
                DayHint::Available,
            ]
        );
    }

    #[test]
    fn hints_with_lone_start() {
        let p = property_with(&[]);
        let selection = Selection {
            start: Some(d(2024, 6, 2)),
            end: None,
        };
        let window = DateInterval::new(d(2024, 6, 1), d(2024, 6, 3)).unwrap();
        let hints: Vec<_> = day_hints(&p, &selection, &window).into_iter().map(|(_, h)| h).collect();
        assert_eq!(hints, vec![DayHint::Available, DayHint::RangeStart, DayHint::Available]);
    }

    #[test]
    fn selected_reservation_shows_as_selection() {
        let p = property_with(&[(d(2024, 6, 3), d(2024, 6, 5))]);
        let selection = Selection {
            start: Some(d(2024, 6, 3)),
            end: Some(d(2024, 6, 5)),
        };
        let window = DateInterval::new(d(2024, 6, 3), d(2024, 6, 5)).unwrap();
        let hints: Vec<_> = day_hints(&p, &selection, &window).into_iter().map(|(_, h)| h).collect();
        assert_eq!(hints, vec![DayHint::RangeStart, DayHint::InRange, DayHint::RangeEnd]);
    }

    /// Non-overlapping reservation sets: gaps of at least one day between
    /// consecutive stays, laid out from a fixed origin.
    fn disjoint_spans() -> impl Strategy<Value = Vec<(NaiveDate, NaiveDate)>> {
        prop::collection::vec((1i64..10, 0i64..6), 0..8).prop_map(|steps| {
            let mut cursor = d(2024, 1, 1);
            let mut spans = Vec::new();
            for (gap, len) in steps {
                let start = cursor + chrono::Duration::days(gap);
                let end = start + chrono::Duration::days(len);
                spans.push((start, end));
                cursor = end;
            }
            spans
        })
    }

    proptest! {
        #[test]
        fn range_available_iff_no_reservation_intersects(
            spans in disjoint_spans(),
            offset in 0i64..120,
            len in 0i64..15,
        ) {
            let p = property_with(&spans);
            let start = d(2024, 1, 1) + chrono::Duration::days(offset);
            let end = start + chrono::Duration::days(len);
            let any_day_reserved = days_between(start, end)
                .unwrap()
                .any(|day| spans.iter().any(|&(s, e)| is_within(day, &DateInterval::new(s, e).unwrap())));
            prop_assert_eq!(is_range_available(&p, start, end), !any_day_reserved);
        }

        #[test]
        fn covering_agrees_with_linear_scan(spans in disjoint_spans(), offset in 0i64..120) {
            let p = property_with(&spans);
            let day = d(2024, 1, 1) + chrono::Duration::days(offset);
            let expected = spans.iter().find(|&&(s, e)| s <= day && day <= e).copied();
            let found = reservation_covering(&p, day).map(|r| (r.start(), r.end()));
            prop_assert_eq!(found, expected);
        }
    }
}
