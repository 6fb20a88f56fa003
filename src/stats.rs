//! Cross-entity statistics over a loaded dataset.

use crate::records::{Event, Sale};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};

pub fn total_revenue(sales: &[Sale]) -> Decimal {
    sales.iter().map(Sale::total).sum()
}

/// Summed sale totals keyed by event id. Events without sales have no entry.
pub fn revenue_per_event(sales: &[Sale]) -> BTreeMap<u32, Decimal> {
    let mut totals = BTreeMap::new();
    for sale in sales {
        *totals.entry(sale.event_id).or_insert(Decimal::ZERO) += sale.total();
    }
    totals
}

pub fn categories(events: &[Event]) -> BTreeSet<String> {
    events.iter().map(|e| e.category.clone()).collect()
}

/// Days until the closest event happening today or later, `None` if there is none.
pub fn days_to_nearest_event(events: &[Event], today: NaiveDate) -> Option<i64> {
    events
        .iter()
        .map(|e| e.days_until(today))
        .filter(|days| *days >= 0)
        .min()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSummary {
    pub min: Decimal,
    pub max: Decimal,
    pub mean: Decimal,
}

/// Min, max and mean event price; all zero when there are no events.
pub fn price_summary(events: &[Event]) -> PriceSummary {
    let mut prices = events.iter().map(|e| e.price);
    let Some(first) = prices.next() else {
        return PriceSummary {
            min: Decimal::ZERO,
            max: Decimal::ZERO,
            mean: Decimal::ZERO,
        };
    };
    let (min, max, sum) = prices.fold((first, first, first), |(min, max, sum), price| {
        (min.min(price), max.max(price), sum + price)
    });
    PriceSummary {
        min,
        max,
        mean: sum / Decimal::from(events.len()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total_revenue: Decimal,
    pub revenue_per_event: BTreeMap<u32, Decimal>,
    pub categories: BTreeSet<String>,
    pub days_to_nearest_event: Option<i64>,
    pub prices: PriceSummary,
}

impl Statistics {
    pub fn compute(events: &[Event], sales: &[Sale], today: NaiveDate) -> Self {
        Statistics {
            total_revenue: total_revenue(sales),
            revenue_per_event: revenue_per_event(sales),
            categories: categories(events),
            days_to_nearest_event: days_to_nearest_event(events, today),
            prices: price_summary(events),
        }
    }
}

#[cfg(test)]
use chrono::Days;
#[cfg(test)]
use rust_decimal_macros::dec;

#[cfg(test)]
fn event(id: u32, category: &str, event_date: NaiveDate, price: Decimal) -> Event {
    Event {
        id,
        name: format!("Event {id}"),
        category: category.to_string(),
        event_date,
        price,
    }
}

#[cfg(test)]
fn sale(id: u32, event_id: u32, sale_date: NaiveDate, quantity: u32, unit_price: Decimal) -> Sale {
    Sale {
        id,
        client_id: 1,
        event_id,
        sale_date,
        quantity,
        unit_price,
    }
}

#[cfg(test)]
fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

#[test]
fn concert_example() {
    let events = vec![event(1, "Music", today() + Days::new(5), dec!(50.0))];
    let sales = vec![sale(1, 1, today(), 2, dec!(50.0))];

    let stats = Statistics::compute(&events, &sales, today());
    assert_eq!(stats.total_revenue, dec!(100.0));
    assert_eq!(stats.revenue_per_event, BTreeMap::from([(1, dec!(100.0))]));
    assert_eq!(stats.days_to_nearest_event, Some(5));
    assert_eq!(stats.categories, BTreeSet::from(["Music".to_string()]));
}

#[test]
fn per_event_revenue_adds_up_to_total() {
    let sales = vec![
        sale(1, 1, today(), 2, dec!(10.25)),
        sale(2, 2, today(), 1, dec!(99.99)),
        sale(3, 1, today(), 3, dec!(7)),
        sale(4, 9, today(), 1, dec!(0)),
    ];
    let per_event = revenue_per_event(&sales);
    assert_eq!(per_event.len(), 3);
    assert_eq!(per_event[&1], dec!(41.50));
    assert_eq!(per_event.values().copied().sum::<Decimal>(), total_revenue(&sales));
}

#[test]
fn nearest_event_ignores_past_and_counts_today() {
    let past = event(1, "A", today() - Days::new(3), dec!(1));
    let later = event(2, "A", today() + Days::new(10), dec!(1));
    let same_day = event(3, "B", today(), dec!(1));

    assert_eq!(days_to_nearest_event(&[past.clone()], today()), None);
    assert_eq!(days_to_nearest_event(&[past.clone(), later.clone()], today()), Some(10));
    assert_eq!(days_to_nearest_event(&[past, later, same_day], today()), Some(0));
}

#[test]
fn price_summary_bounds_and_mean() {
    let events = vec![
        event(1, "A", today(), dec!(10)),
        event(2, "A", today(), dec!(30)),
        event(3, "B", today(), dec!(20)),
    ];
    let summary = price_summary(&events);
    assert_eq!(summary.min, dec!(10));
    assert_eq!(summary.max, dec!(30));
    assert_eq!(summary.mean, dec!(20));
}

#[test]
fn price_summary_without_events_is_zero() {
    let summary = price_summary(&[]);
    assert_eq!(summary.min, Decimal::ZERO);
    assert_eq!(summary.max, Decimal::ZERO);
    assert_eq!(summary.mean, Decimal::ZERO);
}
