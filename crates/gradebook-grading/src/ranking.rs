//! Class ranking by descending weighted average.

use serde::Serialize;
use utoipa::ToSchema;

use gradebook_models::ClassId;

use crate::average::{Aggregate, MalformedAggregate};
use crate::model::Student;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RankedStudent {
    pub student: Student,
    pub weighted_average: f64,
    /// 1-based. Tied students get consecutive ranks.
    pub rank: u32,
    #[serde(skip)]
    pub malformed: Option<MalformedAggregate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ClassRanking {
    pub class_id: ClassId,
    pub class_name: String,
    pub ranking: Vec<RankedStudent>,
}

/// Orders items by descending average and numbers them from 1.
///
/// The sort is stable, so tied items keep the order they were listed in.
pub fn rank_by<T, F>(items: Vec<T>, average: F) -> Vec<(T, u32)>
where
    F: Fn(&T) -> f64,
{
    let mut items = items;
    items.sort_by(|a, b| average(b).total_cmp(&average(a)));
    items.into_iter().zip(1_u32..).collect()
}

pub fn rank(averages: Vec<(Student, Aggregate)>) -> Vec<RankedStudent> {
    rank_by(averages, |(_, aggregate)| aggregate.value())
        .into_iter()
        .map(|((student, aggregate), rank)| RankedStudent {
            student,
            weighted_average: aggregate.value(),
            rank,
            malformed: aggregate.malformed(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::student;

    fn ranked_names(ranking: &[RankedStudent]) -> Vec<(&str, u32)> {
        ranking
            .iter()
            .map(|r| (r.student.username.as_str(), r.rank))
            .collect()
    }

    #[test]
    fn test_empty_class_ranks_nothing() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn test_descending_order() {
        let ranking = rank(vec![
            (student("awa"), Aggregate::Weighted(12.0)),
            (student("binta"), Aggregate::Weighted(17.5)),
            (student("cheikh"), Aggregate::Empty),
        ]);
        assert_eq!(
            ranked_names(&ranking),
            vec![("binta", 1), ("awa", 2), ("cheikh", 3)]
        );
        assert_eq!(ranking[0].weighted_average, 17.5);
        assert_eq!(ranking[2].weighted_average, 0.0);
    }

    #[test]
    fn test_ties_get_sequential_ranks_in_listing_order() {
        let ranking = rank(vec![
            (student("awa"), Aggregate::Weighted(14.0)),
            (student("binta"), Aggregate::Weighted(16.0)),
            (student("cheikh"), Aggregate::Weighted(14.0)),
            (student("dieynaba"), Aggregate::Weighted(14.0)),
        ]);
        assert_eq!(
            ranked_names(&ranking),
            vec![("binta", 1), ("awa", 2), ("cheikh", 3), ("dieynaba", 4)]
        );
    }

    #[test]
    fn test_ranks_have_no_gaps() {
        let input: Vec<_> = (0..7)
            .map(|i| {
                (
                    student(&format!("s{i}")),
                    Aggregate::Weighted(f64::from(i % 3)),
                )
            })
            .collect();
        let ranks: Vec<u32> = rank(input).iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=7).collect::<Vec<u32>>());
    }

    #[test]
    fn test_idempotent() {
        let input = vec![
            (student("awa"), Aggregate::Weighted(9.0)),
            (student("binta"), Aggregate::Weighted(9.0)),
            (student("cheikh"), Aggregate::Weighted(11.25)),
        ];
        assert_eq!(rank(input.clone()), rank(input));
    }

    #[test]
    fn test_malformed_ranks_as_zero() {
        let ranking = rank(vec![
            (
                student("awa"),
                Aggregate::Malformed(MalformedAggregate::ZeroWeight),
            ),
            (student("binta"), Aggregate::Weighted(3.0)),
        ]);
        assert_eq!(ranked_names(&ranking), vec![("binta", 1), ("awa", 2)]);
        assert_eq!(ranking[1].malformed, Some(MalformedAggregate::ZeroWeight));
    }
}
