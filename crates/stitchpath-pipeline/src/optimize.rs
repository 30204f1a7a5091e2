//! Segment tour ordering: chain disjoint stitch segments into one traversal
//! with as little jump travel as the heuristic can find.
//!
//! Every segment starts as its own chain. Each round, every chain finds
//! its nearest other chain over the four endpoint pairings (front-front,
//! front-back, back-front, back-back). The chain whose nearest neighbour
//! is *farthest away* (the most isolated one) is merged with that
//! neighbour. Attaching outliers while many candidates remain keeps them
//! from being stranded until the end with only a poor option left.
//!
//! When one chain remains, it is rotated so that its largest gap
//! (counting the wrap from last back to first) becomes the leading jump
//! instead of dead travel in the middle of the path.
//!
//! Chains reference segments by index with a per-entry `reversed` flag;
//! point data is only reversed once, when the final order is flattened.
//!
//! Each round scans all pairs, so ordering is O(N³) in the number of
//! segments.
//!
//! Ties are broken by pool position: the lowest position wins both the
//! nearest-neighbour and the most-isolated selections.

use serde::{Deserialize, Serialize};

use crate::types::{Point, StitchSegment};

/// One end of a segment or chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The first point.
    Front,
    /// The last point.
    Back,
}

/// One segment in a [`MergedChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntry {
    /// Index of the segment in the ordering arena.
    pub segment: usize,
    /// Traverse the segment back to front.
    pub reversed: bool,
}

/// Front and back points of a segment or chain.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ends {
    front: Point,
    back: Point,
}

impl Ends {
    fn of(segment: &StitchSegment) -> Option<Self> {
        Some(Self {
            front: *segment.first()?,
            back: *segment.last()?,
        })
    }

    const fn oriented(self, reversed: bool) -> Self {
        if reversed {
            Self {
                front: self.back,
                back: self.front,
            }
        } else {
            self
        }
    }

    const fn get(self, side: Side) -> Point {
        match side {
            Side::Front => self.front,
            Side::Back => self.back,
        }
    }
}

/// Cheapest way to join two chains.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Link {
    distance_squared: f64,
    node_side: Side,
    neighbour_side: Side,
}

/// Shortest of the four endpoint pairings between `a` and `b`.
///
/// Pairings are tried front-front, front-back, back-front, back-back; the
/// first strictly smaller one wins.
fn closest_link(a: Ends, b: Ends) -> Link {
    const PAIRINGS: [(Side, Side); 4] = [
        (Side::Front, Side::Front),
        (Side::Front, Side::Back),
        (Side::Back, Side::Front),
        (Side::Back, Side::Back),
    ];

    let mut best: Option<Link> = None;
    for (node_side, neighbour_side) in PAIRINGS {
        let distance_squared = a.get(node_side).distance_squared(b.get(neighbour_side));
        if best.is_none_or(|l| distance_squared < l.distance_squared) {
            best = Some(Link {
                distance_squared,
                node_side,
                neighbour_side,
            });
        }
    }
    best.unwrap_or(Link {
        distance_squared: f64::INFINITY,
        node_side: Side::Back,
        neighbour_side: Side::Front,
    })
}

/// An ordered concatenation of segments, some traversed in reverse.
///
/// Never empty: a chain starts from one segment and only grows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedChain {
    /// The segment this chain was started from; stable across merges.
    id: usize,
    entries: Vec<ChainEntry>,
}

impl MergedChain {
    /// A chain holding only `segment`, forward.
    #[must_use]
    pub fn new(segment: usize) -> Self {
        Self {
            id: segment,
            entries: vec![ChainEntry {
                segment,
                reversed: false,
            }],
        }
    }

    /// Segment index the chain was started from.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// The chain's segments in traversal order.
    #[must_use]
    pub fn entries(&self) -> &[ChainEntry] {
        &self.entries
    }

    fn ends(&self, arena: &[Ends]) -> Ends {
        let head = self.entries[0];
        let tail = self.entries[self.entries.len() - 1];
        Ends {
            front: arena[head.segment].oriented(head.reversed).front,
            back: arena[tail.segment].oriented(tail.reversed).back,
        }
    }

    /// The same chain traversed back to front.
    fn into_reversed(mut self) -> Self {
        self.entries.reverse();
        for entry in &mut self.entries {
            entry.reversed = !entry.reversed;
        }
        self
    }

    /// Attach `other` so that `self`'s `self_side` end meets `other`'s
    /// `other_side` end.
    ///
    /// `self` keeps its traversal direction; `other` is flipped when the
    /// touching ends would otherwise not be adjacent.
    pub fn merge(&mut self, other: Self, self_side: Side, other_side: Side) {
        match (self_side, other_side) {
            (Side::Back, Side::Front) => self.entries.extend(other.entries),
            (Side::Back, Side::Back) => self.entries.extend(other.into_reversed().entries),
            (Side::Front, Side::Back) => {
                self.entries.splice(0..0, other.entries);
            }
            (Side::Front, Side::Front) => {
                self.entries.splice(0..0, other.into_reversed().entries);
            }
        }
    }

    /// Rotate so the entry after the largest gap comes first.
    ///
    /// Gap `k` is the jump into entry `k`; gap 0 wraps from the last
    /// entry. On ties the earliest gap wins, so a chain whose wrap gap is
    /// largest is left as-is.
    fn start_at_largest_gap(&mut self, arena: &[Ends]) {
        let n = self.entries.len();
        if n < 2 {
            return;
        }

        let oriented = |e: ChainEntry| arena[e.segment].oriented(e.reversed);
        let mut start = 0;
        let mut largest: Option<f64> = None;
        for k in 0..n {
            let prev = self.entries[(k + n - 1) % n];
            let gap = oriented(prev)
                .back
                .distance_squared(oriented(self.entries[k]).front);
            if largest.is_none_or(|g| gap > g) {
                largest = Some(gap);
                start = k;
            }
        }
        self.entries.rotate_left(start);
    }
}

/// One merge performed by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeStep {
    /// Chain (by id) that was most isolated and absorbed its neighbour.
    pub node: usize,
    /// Chain (by id) that was absorbed.
    pub neighbour: usize,
    /// Squared jump distance between the joined ends.
    pub distance_squared: f64,
    /// End of the node that was joined.
    pub node_side: Side,
    /// End of the neighbour that was joined.
    pub neighbour_side: Side,
}

/// Record of every merge, in order.
///
/// Chain ids are indices into the non-empty input segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeTrace {
    /// Merges in the order they were performed.
    pub steps: Vec<MergeStep>,
}

/// Reorder and orient `segments` into one low-jump traversal.
///
/// Empty segments are dropped. With one segment or none the input is
/// returned as-is.
#[must_use = "returns the reordered segments"]
pub fn optimize_stitch_order(segments: Vec<StitchSegment>) -> Vec<StitchSegment> {
    optimize_with_trace(segments).0
}

/// [`optimize_stitch_order`] that also reports each merge it made.
#[must_use = "returns the reordered segments"]
pub fn optimize_with_trace(segments: Vec<StitchSegment>) -> (Vec<StitchSegment>, MergeTrace) {
    let segments: Vec<StitchSegment> = segments.into_iter().filter(|s| !s.is_empty()).collect();
    let mut trace = MergeTrace::default();
    if segments.len() <= 1 {
        return (segments, trace);
    }

    let arena: Vec<Ends> = segments.iter().filter_map(Ends::of).collect();
    let mut pool: Vec<MergedChain> = (0..arena.len()).map(MergedChain::new).collect();

    tracing::debug!(segments = arena.len(), "ordering stitch segments");

    while pool.len() > 1 {
        // Read-only scan of the pool, finished before any merge.
        let ends: Vec<Ends> = pool.iter().map(|c| c.ends(&arena)).collect();

        let mut most_isolated: Option<(usize, usize, Link)> = None;
        for (i, &node) in ends.iter().enumerate() {
            let mut nearest: Option<(usize, Link)> = None;
            for (j, &other) in ends.iter().enumerate() {
                if i == j {
                    continue;
                }
                let link = closest_link(node, other);
                if nearest.is_none_or(|(_, l)| link.distance_squared < l.distance_squared) {
                    nearest = Some((j, link));
                }
            }

            let Some((j, link)) = nearest else {
                continue;
            };
            if most_isolated.is_none_or(|(_, _, l)| link.distance_squared > l.distance_squared) {
                most_isolated = Some((i, j, link));
            }
        }

        // A pool of two or more always yields a candidate.
        let Some((i, j, link)) = most_isolated else {
            break;
        };

        let neighbour = pool.remove(j);
        let i = if j < i { i - 1 } else { i };
        let node = &mut pool[i];

        tracing::trace!(
            node = node.id(),
            neighbour = neighbour.id(),
            distance = link.distance_squared.sqrt(),
            "merge"
        );
        trace.steps.push(MergeStep {
            node: node.id(),
            neighbour: neighbour.id(),
            distance_squared: link.distance_squared,
            node_side: link.node_side,
            neighbour_side: link.neighbour_side,
        });

        node.merge(neighbour, link.node_side, link.neighbour_side);
    }

    let Some(mut chain) = pool.pop() else {
        return (segments, trace);
    };
    chain.start_at_largest_gap(&arena);

    (flatten(segments, &chain), trace)
}

/// Materialize a chain, reversing the point order of flagged segments.
fn flatten(segments: Vec<StitchSegment>, chain: &MergedChain) -> Vec<StitchSegment> {
    let mut slots: Vec<Option<StitchSegment>> = segments.into_iter().map(Some).collect();
    chain
        .entries()
        .iter()
        .filter_map(|entry| {
            let segment = slots.get_mut(entry.segment)?.take()?;
            Some(if entry.reversed {
                segment.reversed()
            } else {
                segment
            })
        })
        .collect()
}

/// Total jump distance between consecutive segments.
#[must_use]
pub fn total_jump_distance(segments: &[StitchSegment]) -> f64 {
    segments
        .windows(2)
        .filter_map(|pair| Some(pair[0].last()?.distance(*pair[1].first()?)))
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn seg(points: &[(f64, f64)]) -> StitchSegment {
        StitchSegment::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn arena(segments: &[StitchSegment]) -> Vec<Ends> {
        segments.iter().filter_map(Ends::of).collect()
    }

    fn entry(segment: usize, reversed: bool) -> ChainEntry {
        ChainEntry { segment, reversed }
    }

    // --- closest_link ---

    #[test]
    fn closest_link_picks_each_pairing() {
        let a = Ends {
            front: Point::new(0.0, 0.0),
            back: Point::new(10.0, 0.0),
        };
        let cases = [
            ((-1.0, 0.0), (-50.0, 0.0), Side::Front, Side::Front),
            ((-50.0, 0.0), (-1.0, 0.0), Side::Front, Side::Back),
            ((11.0, 0.0), (50.0, 0.0), Side::Back, Side::Front),
            ((50.0, 0.0), (11.0, 0.0), Side::Back, Side::Back),
        ];
        for (front, back, node_side, neighbour_side) in cases {
            let b = Ends {
                front: Point::new(front.0, front.1),
                back: Point::new(back.0, back.1),
            };
            let link = closest_link(a, b);
            assert_eq!((link.node_side, link.neighbour_side), (node_side, neighbour_side));
            assert!((link.distance_squared - 1.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn closest_link_tie_prefers_first_pairing() {
        let p = Point::new(1.0, 1.0);
        let ends = Ends { front: p, back: p };
        let link = closest_link(ends, ends);
        assert_eq!((link.node_side, link.neighbour_side), (Side::Front, Side::Front));
    }

    // --- MergedChain::merge ---

    #[test]
    fn merge_back_to_front_appends() {
        let mut a = MergedChain::new(0);
        a.merge(MergedChain::new(1), Side::Back, Side::Front);
        assert_eq!(a.entries(), &[entry(0, false), entry(1, false)]);
    }

    #[test]
    fn merge_back_to_back_appends_reversed() {
        let mut a = MergedChain::new(0);
        a.merge(MergedChain::new(1), Side::Back, Side::Back);
        assert_eq!(a.entries(), &[entry(0, false), entry(1, true)]);
    }

    #[test]
    fn merge_front_to_back_prepends() {
        let mut a = MergedChain::new(0);
        a.merge(MergedChain::new(1), Side::Front, Side::Back);
        assert_eq!(a.entries(), &[entry(1, false), entry(0, false)]);
    }

    #[test]
    fn merge_front_to_front_prepends_reversed() {
        let mut a = MergedChain::new(0);
        a.merge(MergedChain::new(1), Side::Front, Side::Front);
        assert_eq!(a.entries(), &[entry(1, true), entry(0, false)]);
    }

    #[test]
    fn repeated_reversal_composes() {
        // Chain [2, 3r] reversed twice as part of two merges ends up forward again.
        let mut inner = MergedChain::new(2);
        inner.merge(MergedChain::new(3), Side::Back, Side::Back);
        assert_eq!(inner.entries(), &[entry(2, false), entry(3, true)]);

        let mut outer = MergedChain::new(0);
        outer.merge(inner, Side::Back, Side::Back);
        assert_eq!(outer.entries(), &[entry(0, false), entry(3, false), entry(2, true)]);

        let mut top = MergedChain::new(9);
        top.merge(outer, Side::Front, Side::Front);
        assert_eq!(
            top.entries(),
            &[entry(2, false), entry(3, true), entry(0, true), entry(9, false)]
        );
        assert_eq!(top.id(), 9);
    }

    #[test]
    fn merged_ends_follow_orientation() {
        let segments = vec![seg(&[(0.0, 0.0), (1.0, 0.0)]), seg(&[(5.0, 0.0), (2.0, 0.0)])];
        let arena = arena(&segments);
        let mut chain = MergedChain::new(0);
        chain.merge(MergedChain::new(1), Side::Back, Side::Back);
        let ends = chain.ends(&arena);
        assert_eq!(ends.front, Point::new(0.0, 0.0));
        assert_eq!(ends.back, Point::new(5.0, 0.0));
    }

    // --- start selection ---

    #[test]
    fn start_moves_to_largest_internal_gap() {
        // 0: (0..1), 1: (50..51), 2: (2..3). Chain [0, 2, 1]:
        // gaps: wrap 51->0 = 51, 1->2 = 1, 3->50 = 47. Wrap is largest.
        // Chain [2, 1, 0]: wrap 1->2 = 1, 3->50 = 47, 51->0 = 51.
        let segments = vec![
            seg(&[(0.0, 0.0), (1.0, 0.0)]),
            seg(&[(50.0, 0.0), (51.0, 0.0)]),
            seg(&[(2.0, 0.0), (3.0, 0.0)]),
        ];
        let arena = arena(&segments);

        let mut chain = MergedChain {
            id: 2,
            entries: vec![entry(2, false), entry(1, false), entry(0, false)],
        };
        chain.start_at_largest_gap(&arena);
        assert_eq!(
            chain.entries(),
            &[entry(0, false), entry(2, false), entry(1, false)]
        );

        let mut chain = MergedChain {
            id: 0,
            entries: vec![entry(0, false), entry(2, false), entry(1, false)],
        };
        chain.start_at_largest_gap(&arena);
        assert_eq!(
            chain.entries(),
            &[entry(0, false), entry(2, false), entry(1, false)]
        );
    }

    // --- optimize ---

    #[test]
    fn empty_input_returns_empty() {
        let (result, trace) = optimize_with_trace(Vec::new());
        assert!(result.is_empty());
        assert!(trace.steps.is_empty());
    }

    #[test]
    fn single_segment_returned_unchanged() {
        let s = seg(&[(3.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        let (result, trace) = optimize_with_trace(vec![s.clone()]);
        assert_eq!(result, vec![s]);
        assert!(trace.steps.is_empty(), "no merge should run");
    }

    #[test]
    fn empty_segments_dropped() {
        let s = seg(&[(0.0, 0.0), (1.0, 0.0)]);
        let result = optimize_stitch_order(vec![
            StitchSegment::new(vec![]),
            s.clone(),
            StitchSegment::new(vec![]),
        ]);
        assert_eq!(result, vec![s]);
    }

    #[test]
    fn outlier_is_merged_first() {
        // A and B nearly touch; C is far away.
        let a = seg(&[(0.0, 0.0), (1.0, 0.0)]);
        let b = seg(&[(1.5, 0.0), (2.5, 0.0)]);
        let c = seg(&[(100.0, 0.0), (101.0, 0.0)]);

        let (result, trace) = optimize_with_trace(vec![a.clone(), b.clone(), c.clone()]);

        assert_eq!(trace.steps.len(), 2);
        let first = trace.steps[0];
        assert_eq!((first.node, first.neighbour), (2, 1));
        assert_eq!((first.node_side, first.neighbour_side), (Side::Front, Side::Back));
        assert!((first.distance_squared - 97.5 * 97.5).abs() < 1e-9);

        // The remaining pair ties; the lower pool position (A) absorbs.
        let second = trace.steps[1];
        assert_eq!((second.node, second.neighbour), (0, 2));

        // The largest gap (101 -> 0, the wrap) becomes the start jump.
        assert_eq!(result, vec![a, b, c]);
    }

    #[test]
    fn segments_are_reversed_to_meet() {
        // B is stored pointing away from A.
        let a = seg(&[(0.0, 0.0), (10.0, 0.0)]);
        let b = seg(&[(20.0, 0.0), (11.0, 0.0)]);

        let result = optimize_stitch_order(vec![a, b]);
        assert_eq!(result.len(), 2);
        let jump = total_jump_distance(&result);
        assert!((jump - 1.0).abs() < 1e-12, "jump {jump}");
        // Every segment keeps its points, possibly reversed.
        assert!(result.iter().all(|s| s.len() == 2));
    }

    #[test]
    fn preserves_all_segments() {
        let segments: Vec<StitchSegment> = (0..12)
            .map(|i| {
                let x = f64::from(i) * 7.0;
                let y = f64::from(i % 3) * 5.0;
                seg(&[(x, y), (x + 1.0, y + 2.0), (x + 2.0, y)])
            })
            .collect();
        let result = optimize_stitch_order(segments.clone());
        assert_eq!(result.len(), segments.len());

        for original in &segments {
            let found = result
                .iter()
                .filter(|s| *s == original || (*s).clone().reversed() == *original)
                .count();
            assert_eq!(found, 1);
        }
    }

    #[test]
    fn jump_distance_reduced_vs_input_order() {
        // Interleaved far/near segments.
        let segments = vec![
            seg(&[(0.0, 0.0), (1.0, 0.0)]),
            seg(&[(50.0, 0.0), (51.0, 0.0)]),
            seg(&[(2.0, 0.0), (3.0, 0.0)]),
            seg(&[(52.0, 0.0), (53.0, 0.0)]),
            seg(&[(4.0, 0.0), (5.0, 0.0)]),
        ];
        let before = total_jump_distance(&segments);
        let after = total_jump_distance(&optimize_stitch_order(segments));
        assert!(after < before, "after {after} >= before {before}");
        // Near-optimal here: 1 + 1 + 45 + 1.
        assert!((after - 48.0).abs() < 1e-9, "after {after}");
    }

    #[test]
    fn coincident_segments_do_not_merge_with_themselves() {
        let s = seg(&[(0.0, 0.0), (0.0, 0.0)]);
        let (result, trace) = optimize_with_trace(vec![s.clone(), s.clone(), s]);
        assert_eq!(result.len(), 3);
        assert_eq!(trace.steps.len(), 2);
        for step in &trace.steps {
            assert_ne!(step.node, step.neighbour);
        }
    }

    #[test]
    fn total_jump_distance_sums_gaps() {
        let segments = vec![
            seg(&[(0.0, 0.0), (1.0, 0.0)]),
            seg(&[(4.0, 4.0), (5.0, 0.0)]),
            seg(&[(5.0, 2.0)]),
        ];
        assert!((total_jump_distance(&segments) - 7.0).abs() < 1e-12);
        assert!(total_jump_distance(&[]).abs() < f64::EPSILON);
    }
}
