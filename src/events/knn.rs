// Indexed k-nearest-neighbor model
// kiddo k-d tree over the subsampled training rows, majority vote over K neighbors

use kiddo::{ImmutableKdTree, SquaredEuclidean};

use crate::events::types::{FeatureVector, GestureClass, TrainingSet, CHANNELS, NUM_CLASSES};

type Tree = ImmutableKdTree<f64, CHANNELS>;

/// u16 coordinates and their squared distances are exact in f64
fn to_point(vector: &FeatureVector) -> [f64; CHANNELS] {
    vector.map(f64::from)
}

/// k-NN majority-vote model over a fixed point set
pub struct KnnIndex {
    tree: Tree,
    labels: Vec<GestureClass>,
    k: usize,
}

impl std::fmt::Debug for KnnIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnnIndex")
            .field("points", &self.labels.len())
            .field("k", &self.k)
            .finish()
    }
}

impl KnnIndex {
    pub fn fit(training: TrainingSet, k: usize) -> Self {
        let points: Vec<[f64; CHANNELS]> = training.rows().iter().map(to_point).collect();
        KnnIndex {
            tree: Tree::new_from_slice(&points),
            labels: training.labels().to_vec(),
            k,
        }
    }

    /// The k nearest points as `(squared_distance, position)`, closest first
    pub fn nearest(&self, query: &FeatureVector) -> Vec<(u64, usize)> {
        let mut hits: Vec<(u64, usize)> = self
            .tree
            .nearest_n::<SquaredEuclidean>(&to_point(query), self.k)
            .into_iter()
            .map(|n| (n.distance as u64, n.item as usize))
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Majority label among the k nearest points; vote ties go to the lowest class
    pub fn predict(&self, query: &FeatureVector) -> Option<GestureClass> {
        let neighbors = self.nearest(query);
        if neighbors.is_empty() {
            return None;
        }

        let mut votes = [0usize; NUM_CLASSES];
        for &(_, position) in &neighbors {
            votes[self.labels[position].index()] += 1;
        }

        let mut best = GestureClass::COLD_START;
        let mut best_votes = 0;
        for class in GestureClass::all() {
            if votes[class.index()] > best_votes {
                best = class;
                best_votes = votes[class.index()];
            }
        }
        Some(best)
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of indexed (subsampled) points
    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::squared_distance;

    fn class(i: u8) -> GestureClass {
        GestureClass::new(i).unwrap()
    }

    /// Small deterministic generator so the test needs no extra crates
    fn pseudo_points(n: usize, seed: u64) -> Vec<FeatureVector> {
        let mut state = seed;
        (0..n)
            .map(|_| {
                let mut v = [0u16; CHANNELS];
                for value in v.iter_mut() {
                    state = state
                        .wrapping_mul(6364136223846793005)
                        .wrapping_add(1442695040888963407);
                    *value = ((state >> 33) % 1024) as u16;
                }
                v
            })
            .collect()
    }

    #[test]
    fn test_nearest_distances_match_brute_force() {
        let points = pseudo_points(300, 7);
        let index = KnnIndex::fit(TrainingSet::for_class(class(1), points.clone()), 15);
        assert_eq!(index.len(), 300);

        for query in pseudo_points(25, 99) {
            let mut expected: Vec<u64> = points.iter().map(|p| squared_distance(&query, p)).collect();
            expected.sort_unstable();
            expected.truncate(15);

            let found: Vec<u64> = index.nearest(&query).iter().map(|&(d, _)| d).collect();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_knn_majority_vote() {
        let mut set = TrainingSet::new();
        for c in [1u8, 4] {
            let base = c as u16 * 1000;
            for i in 0..30u16 {
                set.push([base + i; CHANNELS], class(c));
            }
        }

        let index = KnnIndex::fit(set, 15);
        assert_eq!(index.predict(&[1005; CHANNELS]), Some(class(1)));
        assert_eq!(index.predict(&[4010; CHANNELS]), Some(class(4)));
    }

    #[test]
    fn test_knn_vote_tie_goes_to_lowest_class() {
        // k covers every point, so the vote is an exact 8 / 8 split
        let mut set = TrainingSet::new();
        for i in 0..8u16 {
            set.push([i * 10; CHANNELS], class(7));
            set.push([i * 10 + 5; CHANNELS], class(2));
        }

        let index = KnnIndex::fit(set, 16);
        assert_eq!(index.predict(&[40; CHANNELS]), Some(class(2)));
    }
}
