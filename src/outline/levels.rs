//! Font-size clustering into heading levels.
//!
//! Stateless and recomputed per document: six equally spaced edges over the
//! observed size range, a size's bin is the count of edges at or below it,
//! and the highest populated bin becomes H1.

use serde::Serialize;

pub const BIN_COUNT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
    H5,
}

impl HeadingLevel {
    const LADDER: [HeadingLevel; BIN_COUNT] = [
        HeadingLevel::H1,
        HeadingLevel::H2,
        HeadingLevel::H3,
        HeadingLevel::H4,
        HeadingLevel::H5,
    ];

    /// Level for a bin `offset` steps below the top populated bin.
    /// Anything past the ladder collapses into the lowest tier.
    pub fn from_offset(offset: usize) -> Self {
        Self::LADDER
            .get(offset)
            .copied()
            .unwrap_or(HeadingLevel::H5)
    }
}

pub fn bin_edges(sizes: &[f32]) -> Option<[f64; BIN_COUNT + 1]> {
    if sizes.is_empty() {
        return None;
    }
    let mut lo = sizes.iter().copied().fold(f32::INFINITY, f32::min) as f64;
    let mut hi = sizes.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    if !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let step = (hi - lo) / BIN_COUNT as f64;
    let mut edges = [0.0; BIN_COUNT + 1];
    for (i, edge) in edges.iter_mut().enumerate() {
        *edge = lo + step * i as f64;
    }
    edges[BIN_COUNT] = hi;
    Some(edges)
}

/// Number of edges `<= size`; the maximum observed size lands one past the last bin.
pub fn digitize(size: f32, edges: &[f64]) -> usize {
    let size = size as f64;
    edges.iter().filter(|&&edge| edge <= size).count()
}

pub fn assign_levels(sizes: &[f32]) -> Vec<HeadingLevel> {
    let Some(edges) = bin_edges(sizes) else {
        return vec![HeadingLevel::H5; sizes.len()];
    };
    let bins: Vec<usize> = sizes.iter().map(|&s| digitize(s, &edges)).collect();
    let top = bins.iter().copied().max().unwrap_or(0);
    bins.iter()
        .map(|&bin| HeadingLevel::from_offset(top - bin))
        .collect()
}
