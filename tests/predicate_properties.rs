//! Property tests for the local predicate pipeline
//!
//! Random listings are run through random criteria and checked against the
//! predicate list and against a direct reading of the filter fields.

use chrono::{DateTime, Duration, TimeZone, Utc};
use market::core::filter::{
    CategorySelector, FilterState, Interpretation, MarketTab, RecencyWindow, SearchCriteria,
    SortKey,
};
use market::core::listing::{Category, Condition, Listing, ListingStatus};
use market::core::predicate::{apply_local_predicates, predicates_for};
use proptest::prelude::*;
use uuid::Uuid;

const WORDS: [&str; 6] = ["casio", "lamp", "desk", "calculator", "bike", "Casio"];

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
}

fn category() -> impl Strategy<Value = Category> {
    prop::sample::select(Category::ALL.to_vec())
}

fn condition() -> impl Strategy<Value = Condition> {
    prop::sample::select(vec![
        Condition::New,
        Condition::LikeNew,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ])
}

fn words(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), len)
}

fn text() -> impl Strategy<Value = String> {
    words(0..3).prop_map(|w| w.join(" "))
}

prop_compose! {
    fn listing()(
        title in text(),
        description in text(),
        price in 0u64..2_000,
        category in category(),
        condition in condition(),
        status in prop::sample::select(vec![
            ListingStatus::Available,
            ListingStatus::Pending,
            ListingStatus::Sold,
        ]),
        wanted in any::<bool>(),
        hours_ago in 0i64..24 * 45
    ) -> Listing {
        let mut listing = Listing::new(
            Uuid::new_v4(),
            title,
            description,
            price,
            category,
            condition,
        );
        listing.status = status;
        listing.wanted = wanted;
        listing.posted_at = anchor() - Duration::hours(hours_ago);
        listing
    }
}

prop_compose! {
    fn filter()(
        wanted_tab in any::<bool>(),
        category in prop::option::of(category()),
        search in text(),
        min_price in prop::option::of(0u64..2_000),
        max_price in prop::option::of(0u64..2_000),
        condition in prop::option::of(condition()),
        recency in prop::sample::select(vec![
            RecencyWindow::Day,
            RecencyWindow::Week,
            RecencyWindow::Month,
            RecencyWindow::All,
        ]),
        hide_sold in any::<bool>()
    ) -> FilterState {
        FilterState {
            tab: if wanted_tab { MarketTab::Wanted } else { MarketTab::Selling },
            category: category.map_or(CategorySelector::All, CategorySelector::Only),
            search,
            sort: SortKey::Newest,
            min_price,
            max_price,
            condition,
            recency,
            hide_sold,
        }
    }
}

prop_compose! {
    fn criteria()(
        filter in filter(),
        keywords in prop::option::of(words(1..3))
    ) -> SearchCriteria {
        let interpretation = keywords.and_then(|keywords| {
            Interpretation {
                category: None,
                keywords: keywords.into_iter().map(String::from).collect(),
            }
            .normalized()
        });
        SearchCriteria {
            filter,
            interpretation,
        }
    }
}

/// The filter read field by field, without going through `Predicate`
fn satisfies(listing: &Listing, criteria: &SearchCriteria, now: DateTime<Utc>) -> bool {
    let filter = &criteria.filter;
    let mentions = |needle: &str| {
        let needle = needle.to_lowercase();
        listing.title.to_lowercase().contains(&needle)
            || listing.description.to_lowercase().contains(&needle)
    };

    let text_ok = match &criteria.interpretation {
        Some(interpretation) => interpretation.keywords.iter().any(|k| mentions(k)),
        None => {
            let search = filter.search.trim();
            search.is_empty() || mentions(search)
        }
    };

    listing.wanted == (filter.tab == MarketTab::Wanted)
        && !(filter.hide_sold && listing.status == ListingStatus::Sold)
        && filter.category.category().is_none_or(|c| listing.category == c)
        && text_ok
        && filter.min_price.is_none_or(|min| listing.price >= min)
        && filter.max_price.is_none_or(|max| listing.price <= max)
        && filter.condition.is_none_or(|c| listing.condition == c)
        && filter
            .recency
            .duration()
            .is_none_or(|window| listing.posted_at >= now - window)
}

proptest! {
    #[test]
    fn test_kept_rows_pass_every_predicate_and_dropped_rows_fail_one(
        rows in prop::collection::vec(listing(), 0..24),
        criteria in criteria()
    ) {
        let now = anchor();
        let predicates = predicates_for(&criteria, now);
        let kept = apply_local_predicates(&rows, &criteria, now);

        for row in &rows {
            let is_kept = kept.iter().any(|k| k.id == row.id);
            if is_kept {
                prop_assert!(predicates.iter().all(|p| p.matches(row)));
            } else {
                prop_assert!(predicates.iter().any(|p| !p.matches(row)));
            }
            prop_assert_eq!(is_kept, satisfies(row, &criteria, now));
        }

        let expected: Vec<Uuid> = rows
            .iter()
            .filter(|row| satisfies(row, &criteria, now))
            .map(|row| row.id)
            .collect();
        let kept_ids: Vec<Uuid> = kept.iter().map(|row| row.id).collect();
        prop_assert_eq!(kept_ids, expected);
    }

    #[test]
    fn test_hiding_sold_never_adds_rows(
        rows in prop::collection::vec(listing(), 0..24),
        criteria in criteria()
    ) {
        let now = anchor();
        let mut stricter = criteria.clone();
        stricter.filter.hide_sold = true;

        let loose = apply_local_predicates(&rows, &criteria, now);
        let strict = apply_local_predicates(&rows, &stricter, now);

        prop_assert!(strict.len() <= loose.len());
        prop_assert!(strict.iter().all(|row| loose.iter().any(|l| l.id == row.id)));
        prop_assert!(strict.iter().all(|row| row.status != ListingStatus::Sold));
    }
}
