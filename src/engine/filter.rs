use crate::model::{FilterCriteria, Property};

/// Conjunction of every populated criterion. Empty criteria match everything.
pub fn matches(property: &Property, criteria: &FilterCriteria) -> bool {
    city_matches(property, &criteria.city)
        && criteria.min_capacity.is_none_or(|min| property.capacity >= min)
        && criteria.price_range.contains(property.price.per_night)
        && criteria.required_services.is_subset(&property.services)
        && criteria.status.is_none_or(|status| property.status == status)
        && criteria
            .date_range
            .is_none_or(|range| property.overlapping(&range).next().is_none())
}

fn city_matches(property: &Property, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return true;
    }
    property
        .location
        .city
        .to_lowercase()
        .contains(&needle.to_lowercase())
}

/// Stable filter: keeps the input's relative order, no dedup.
pub fn filter_all<'a, I>(properties: I, criteria: &FilterCriteria) -> Vec<&'a Property>
where
    I: IntoIterator<Item = &'a Property>,
{
    properties
        .into_iter()
        .filter(|p| matches(p, criteria))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateInterval;
    use crate::model::{CriteriaUpdate, GuestContact, ListingStatus, Price, Reservation};
    use chrono::{Duration, NaiveDate};
    use proptest::prelude::*;
    use ulid::Ulid;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn listing(id: &str, city: &str, capacity: u32, per_night: f64, services: &[&str]) -> Property {
        let mut p = Property::new(id, format!("Listing {id}"), city, capacity);
        p.price = Price {
            per_night,
            per_week: per_night * 6.0,
            per_month: per_night * 25.0,
        };
        p.services = services.iter().map(|s| s.to_string()).collect();
        p
    }

    fn criteria(updates: Vec<CriteriaUpdate>) -> FilterCriteria {
        let mut c = FilterCriteria::default();
        for u in updates {
            c.apply(u);
        }
        c
    }

    #[test]
    fn empty_criteria_match_everything() {
        let p = listing("a", "Montevideo", 1, 0.0, &[]);
        assert!(matches(&p, &FilterCriteria::default()));
    }

    #[test]
    fn city_and_capacity() {
        let c = criteria(vec![
            CriteriaUpdate::City("Maldonado".into()),
            CriteriaUpdate::MinCapacity(Some(4)),
        ]);
        assert!(!matches(&listing("small", "Maldonado", 3, 80.0, &[]), &c));
        assert!(matches(&listing("fits", "Maldonado", 4, 80.0, &[]), &c));
        assert!(!matches(&listing("elsewhere", "Rocha", 6, 80.0, &[]), &c));
    }

    #[test]
    fn city_is_case_insensitive_substring() {
        let c = criteria(vec![CriteriaUpdate::City("punta".into())]);
        assert!(matches(&listing("a", "Punta del Este", 2, 10.0, &[]), &c));
        assert!(!matches(&listing("b", "Piriápolis", 2, 10.0, &[]), &c));
    }

    #[test]
    fn price_bounds_are_inclusive() {
        let c = criteria(vec![
            CriteriaUpdate::MinPrice(Some(50.0)),
            CriteriaUpdate::MaxPrice(Some(100.0)),
        ]);
        assert!(matches(&listing("lo", "X", 1, 50.0, &[]), &c));
        assert!(matches(&listing("hi", "X", 1, 100.0, &[]), &c));
        assert!(!matches(&listing("cheap", "X", 1, 49.0, &[]), &c));
        assert!(!matches(&listing("pricey", "X", 1, 101.0, &[]), &c));
    }

    #[test]
    fn services_must_all_be_present() {
        let c = criteria(vec![
            CriteriaUpdate::RequireService("wifi".into()),
            CriteriaUpdate::RequireService("parking".into()),
        ]);
        assert!(matches(&listing("a", "X", 1, 1.0, &["wifi", "parking", "pool"]), &c));
        assert!(!matches(&listing("b", "X", 1, 1.0, &["wifi"]), &c));
    }

    #[test]
    fn status_filter() {
        let c = criteria(vec![CriteriaUpdate::Status(Some(ListingStatus::Active))]);
        let mut paused = listing("p", "X", 1, 1.0, &[]);
        paused.status = ListingStatus::Paused;
        assert!(!matches(&paused, &c));
        assert!(matches(&listing("a", "X", 1, 1.0, &[]), &c));
    }

    #[test]
    fn date_range_excludes_booked_properties() {
        let mut booked = listing("booked", "X", 2, 1.0, &[]);
        booked.insert_reservation(Reservation {
            id: Ulid::new(),
            span: DateInterval::new(d(2024, 6, 10), d(2024, 6, 15)).unwrap(),
            guest: GuestContact::new("Ana", "ana@x.com"),
        });
        let free = listing("free", "X", 2, 1.0, &[]);

        let overlapping = criteria(vec![CriteriaUpdate::DateRange(Some(
            DateInterval::new(d(2024, 6, 14), d(2024, 6, 18)).unwrap(),
        ))]);
        let ids: Vec<_> = filter_all([&booked, &free], &overlapping)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["free"]);

        let after = criteria(vec![CriteriaUpdate::DateRange(Some(
            DateInterval::new(d(2024, 6, 16), d(2024, 6, 18)).unwrap(),
        ))]);
        assert_eq!(filter_all([&booked, &free], &after).len(), 2);
    }

    #[test]
    fn filter_all_is_stable_and_idempotent() {
        let ps = vec![
            listing("1", "Maldonado", 4, 90.0, &[]),
            listing("2", "Rocha", 4, 90.0, &[]),
            listing("3", "Maldonado", 6, 90.0, &[]),
            listing("4", "maldonado", 5, 90.0, &[]),
        ];
        let c = criteria(vec![CriteriaUpdate::City("Maldonado".into())]);
        let once = filter_all(&ps, &c);
        let ids: Vec<_> = once.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "4"]);

        let twice = filter_all(once.iter().copied(), &c);
        assert_eq!(once, twice);
    }

    const CITIES: [&str; 3] = ["Maldonado", "Rocha", "Montevideo"];
    const SERVICES: [&str; 3] = ["wifi", "pool", "grill"];

    fn arb_listing() -> impl Strategy<Value = Property> {
        (
            0usize..3,
            1u32..8,
            0u32..300,
            prop::collection::vec(0usize..3, 0..3),
            prop::option::of((0i64..60, 0i64..7)),
        )
            .prop_map(|(city, capacity, price, services, booked)| {
                let names: Vec<&str> = services.into_iter().map(|i| SERVICES[i]).collect();
                let mut p = listing("p", CITIES[city], capacity, price as f64, &names);
                if let Some((offset, len)) = booked {
                    let start = d(2024, 6, 1) + Duration::days(offset);
                    p.insert_reservation(Reservation {
                        id: Ulid::new(),
                        span: DateInterval::new(start, start + Duration::days(len)).unwrap(),
                        guest: GuestContact::new("Ana", "ana@x.com"),
                    });
                }
                p
            })
    }

    fn arb_listings() -> impl Strategy<Value = Vec<Property>> {
        prop::collection::vec(arb_listing(), 0..12).prop_map(|mut ps| {
            for (i, p) in ps.iter_mut().enumerate() {
                p.id = i.to_string();
            }
            ps
        })
    }

    fn arb_criteria() -> impl Strategy<Value = FilterCriteria> {
        (
            prop::option::of(0usize..3),
            prop::option::of(1u32..8),
            prop::option::of(0u32..300),
            prop::option::of(0u32..300),
            prop::option::of(0usize..3),
            prop::option::of((0i64..60, 0i64..10)),
        )
            .prop_map(|(city, min_capacity, min_price, max_price, service, range)| {
                let mut updates = vec![
                    CriteriaUpdate::MinCapacity(min_capacity),
                    CriteriaUpdate::MinPrice(min_price.map(f64::from)),
                    CriteriaUpdate::MaxPrice(max_price.map(f64::from)),
                    CriteriaUpdate::DateRange(range.map(|(offset, len)| {
                        let start = d(2024, 6, 1) + Duration::days(offset);
                        DateInterval::new(start, start + Duration::days(len)).unwrap()
                    })),
                ];
                if let Some(i) = city {
                    updates.push(CriteriaUpdate::City(CITIES[i].to_lowercase()));
                }
                if let Some(i) = service {
                    updates.push(CriteriaUpdate::RequireService(SERVICES[i].into()));
                }
                criteria(updates)
            })
    }

    proptest! {
        #[test]
        fn filter_all_keeps_exactly_the_matches_in_order(ps in arb_listings(), c in arb_criteria()) {
            let once = filter_all(&ps, &c);
            let expected: Vec<&str> = ps
                .iter()
                .filter(|p| matches(p, &c))
                .map(|p| p.id.as_str())
                .collect();
            let got: Vec<&str> = once.iter().map(|p| p.id.as_str()).collect();
            prop_assert_eq!(got, expected);

            let twice = filter_all(once.iter().copied(), &c);
            prop_assert_eq!(once, twice);
        }
    }
}
