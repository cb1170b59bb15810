//! The weighted average ("moyenne générale").
//!
//! `Σ(value × weight) / Σ(weight)`, clamped to [0, 20], then rounded to two
//! decimals with ties to even. Every consumer (average, ranking, reports,
//! bulletins) goes through [`weighted_average`].

use serde::Serialize;
use utoipa::ToSchema;

use gradebook_models::UserId;

use crate::model::GradeEntry;

pub const MIN_AVERAGE: f64 = 0.0;
pub const MAX_AVERAGE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MalformedAggregate {
    /// Grade entries exist but every weight is zero.
    ZeroWeight,
    /// The weighted sum is NaN or infinite.
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    /// No grade entries.
    Empty,
    /// Unusable input, reported as 0.
    Malformed(MalformedAggregate),
    /// Clamped and rounded average.
    Weighted(f64),
}

impl Aggregate {
    /// The reported value: 0 unless a weighted average was computed.
    pub fn value(&self) -> f64 {
        match self {
            Aggregate::Weighted(v) => *v,
            Aggregate::Empty | Aggregate::Malformed(_) => 0.0,
        }
    }

    pub fn malformed(&self) -> Option<MalformedAggregate> {
        match self {
            Aggregate::Malformed(kind) => Some(*kind),
            _ => None,
        }
    }
}

/// Rounds to two decimals, ties to even.
pub fn round_to_cents(x: f64) -> f64 {
    (x * 100.0).round_ties_even() / 100.0
}

pub fn weighted_average<'a, I>(entries: I) -> Aggregate
where
    I: IntoIterator<Item = &'a GradeEntry>,
{
    let mut weighted_sum = 0.0_f64;
    let mut weighted_denom = 0_u64;
    let mut count = 0_usize;

    for entry in entries {
        count += 1;
        weighted_sum += entry.value * f64::from(entry.subject_weight);
        weighted_denom += u64::from(entry.subject_weight);
    }

    if count == 0 {
        return Aggregate::Empty;
    }
    if weighted_denom == 0 {
        return Aggregate::Malformed(MalformedAggregate::ZeroWeight);
    }

    let raw = weighted_sum / weighted_denom as f64;
    if !raw.is_finite() {
        return Aggregate::Malformed(MalformedAggregate::NonFinite);
    }

    Aggregate::Weighted(round_to_cents(raw.clamp(MIN_AVERAGE, MAX_AVERAGE)))
}

/// A student's weighted average. Derived on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AverageResult {
    pub student_id: UserId,
    pub username: String,
    pub weighted_average: f64,
    #[serde(skip)]
    pub malformed: Option<MalformedAggregate>,
}

impl AverageResult {
    pub fn new(student_id: UserId, username: impl Into<String>, aggregate: Aggregate) -> Self {
        Self {
            student_id,
            username: username.into(),
            weighted_average: aggregate.value(),
            malformed: aggregate.malformed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::entry;

    fn average(pairs: &[(f64, u32)]) -> Aggregate {
        let entries: Vec<GradeEntry> = pairs.iter().map(|&(v, w)| entry(v, w)).collect();
        weighted_average(&entries)
    }

    #[test]
    fn test_empty_is_zero() {
        let aggregate = average(&[]);
        assert_eq!(aggregate, Aggregate::Empty);
        assert_eq!(aggregate.value(), 0.0);
        assert_eq!(aggregate.malformed(), None);
    }

    #[test]
    fn test_weighted_example() {
        assert_eq!(average(&[(18.0, 2), (12.0, 1)]), Aggregate::Weighted(16.0));
    }

    #[test]
    fn test_weights_matter() {
        assert_eq!(average(&[(10.0, 1), (20.0, 3)]), Aggregate::Weighted(17.5));
    }

    #[test]
    fn test_rounds_to_two_decimals() {
        // 40 / 3 = 13.333...
        assert_eq!(average(&[(15.0, 1), (10.0, 1), (15.0, 1)]).value(), 13.33);
    }

    #[test]
    fn test_round_half_to_even() {
        assert_eq!(round_to_cents(0.125), 0.12);
        assert_eq!(round_to_cents(0.375), 0.38);
        assert_eq!(round_to_cents(2.5), 2.5);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        assert_eq!(average(&[(25.0, 2), (21.0, 1)]).value(), 20.0);
        assert_eq!(average(&[(-4.0, 1)]).value(), 0.0);
    }

    #[test]
    fn test_clamp_precedes_rounding() {
        // Raw average 20.004 would round to 20.0 either way; 20.006 must not
        // round up to 20.01.
        let aggregate = average(&[(20.006, 1)]);
        assert_eq!(aggregate.value(), 20.0);
        assert!(aggregate.value() <= MAX_AVERAGE);
    }

    #[test]
    fn test_zero_weight_is_malformed_zero() {
        let aggregate = average(&[(15.0, 0), (12.0, 0)]);
        assert_eq!(
            aggregate,
            Aggregate::Malformed(MalformedAggregate::ZeroWeight)
        );
        assert_eq!(aggregate.value(), 0.0);
    }

    #[test]
    fn test_zero_weight_entries_are_ignored() {
        assert_eq!(average(&[(2.0, 0), (14.0, 2)]).value(), 14.0);
    }

    #[test]
    fn test_non_finite_is_malformed_zero() {
        let aggregate = average(&[(f64::NAN, 1), (12.0, 1)]);
        assert_eq!(aggregate, Aggregate::Malformed(MalformedAggregate::NonFinite));
        assert_eq!(aggregate.value(), 0.0);

        let aggregate = average(&[(f64::INFINITY, 1)]);
        assert_eq!(aggregate.malformed(), Some(MalformedAggregate::NonFinite));
    }

    #[test]
    fn test_always_within_bounds() {
        let samples: &[&[(f64, u32)]] = &[
            &[(0.0, 1)],
            &[(20.0, 7)],
            &[(19.999, 3), (20.0, 1)],
            &[(1e9, 1)],
            &[(-1e9, 4), (3.0, 1)],
            &[(7.25, 2), (13.5, 5), (18.75, 1)],
        ];
        for pairs in samples {
            let value = average(pairs).value();
            assert!((MIN_AVERAGE..=MAX_AVERAGE).contains(&value), "{value}");
        }
    }

    #[test]
    fn test_average_result_carries_malformed_flag() {
        let result = AverageResult::new(
            UserId::new(),
            "eleve",
            Aggregate::Malformed(MalformedAggregate::ZeroWeight),
        );
        assert_eq!(result.weighted_average, 0.0);
        assert_eq!(result.malformed, Some(MalformedAggregate::ZeroWeight));

        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("malformed").is_none());
    }
}
