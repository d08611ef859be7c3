//! Spreading of precinct results over census blocks.
//!
//! Results are reported per precinct, but precincts are large and the dots look better when they are drawn inside
//! census blocks. Every block is assigned to the precinct it overlaps the most. The votes of a precinct are split
//! between its blocks proportionally to their voting age population.

use geo::{Area, BooleanOps, BoundingRect, Intersects};
use geo_types::MultiPolygon;
use rand::Rng;

use crate::ingest::{stochastic_round, VotingArea};

/// Census block with its voting age population.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block identifier (`GEOID20`).
    pub id: String,
    /// Block geometry.
    pub area: MultiPolygon<f64>,
    /// Voting age population. Non-finite values count as zero.
    pub population: f64,
}

/// Precinct with its unrounded vote counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Precinct {
    /// Precinct geometry.
    pub area: MultiPolygon<f64>,
    /// Votes per category.
    pub votes: Vec<f64>,
}

/// Blocks with their share of the precinct votes.
#[derive(Debug, Clone, PartialEq)]
pub struct Disaggregation {
    /// Voting areas of the matched blocks, in the order of the input blocks.
    pub areas: Vec<VotingArea>,
    /// Ids of the blocks that do not overlap any precinct.
    pub unmatched: Vec<String>,
    /// Total population of the unmatched blocks.
    pub unmatched_population: f64,
}

fn population(block: &Block) -> f64 {
    if block.population.is_finite() {
        block.population
    } else {
        0.0
    }
}

/// Index of the precinct with the largest intersection area for every block.
///
/// Blocks that only touch precincts along the border or lie outside of all of them get `None`.
pub fn assign_blocks(blocks: &[Block], precincts: &[Precinct]) -> Vec<Option<usize>> {
    let bounds: Vec<_> = precincts
        .iter()
        .map(|precinct| precinct.area.bounding_rect())
        .collect();

    blocks
        .iter()
        .map(|block| {
            let block_bounds = block.area.bounding_rect()?;
            let mut best: Option<(usize, f64)> = None;
            for (index, precinct) in precincts.iter().enumerate() {
                match bounds[index] {
                    Some(rect) if rect.intersects(&block_bounds) => {}
                    _ => continue,
                }

                let overlap = block.area.intersection(&precinct.area).unsigned_area();
                if overlap > 0.0 && best.map_or(true, |(_, area)| overlap > area) {
                    best = Some((index, overlap));
                }
            }

            best.map(|(index, _)| index)
        })
        .collect()
}

/// Share of the precinct population living in each block.
///
/// Blocks without a precinct and blocks of a precinct without population get zero.
pub fn population_shares(
    blocks: &[Block],
    assignment: &[Option<usize>],
    precinct_count: usize,
) -> Vec<f64> {
    let mut totals = vec![0.0; precinct_count];
    for (block, precinct) in blocks.iter().zip(assignment) {
        if let Some(total) = precinct.and_then(|index| totals.get_mut(index)) {
            *total += population(block);
        }
    }

    blocks
        .iter()
        .zip(assignment)
        .map(|(block, precinct)| {
            let share = precinct
                .and_then(|index| totals.get(index))
                .map_or(0.0, |total| population(block) / total);
            if share.is_finite() {
                share
            } else {
                0.0
            }
        })
        .collect()
}

/// Splits precinct votes between the blocks. Vote counts of the blocks are stochastically rounded.
pub fn disaggregate(
    blocks: Vec<Block>,
    precincts: &[Precinct],
    rng: &mut impl Rng,
) -> Disaggregation {
    let assignment = assign_blocks(&blocks, precincts);
    let shares = population_shares(&blocks, &assignment, precincts.len());

    let mut result = Disaggregation {
        areas: Vec::with_capacity(blocks.len()),
        unmatched: Vec::new(),
        unmatched_population: 0.0,
    };

    for ((block, precinct), share) in blocks.into_iter().zip(assignment).zip(shares) {
        let Some(precinct) = precinct.and_then(|index| precincts.get(index)) else {
            result.unmatched_population += population(&block);
            result.unmatched.push(block.id);
            continue;
        };

        let votes = precinct
            .votes
            .iter()
            .map(|count| stochastic_round(count * share, rng))
            .collect();
        result.areas.push(VotingArea {
            area: block.area,
            votes,
        });
    }

    if !result.unmatched.is_empty() {
        log::warn!(
            "{} blocks with population {} are not inside any precinct",
            result.unmatched.len(),
            result.unmatched_population
        );
    }

    result
}
