// file: src/cluster/agglomerative.rs
// description: single-link agglomerative clustering over cosine distance
// reference: https://docs.rs/rayon

use rayon::prelude::*;

/// Distance of a point to itself and to retired clusters.
pub const NO_DISTANCE: f32 = f32::INFINITY;

/// Scales a vector to unit length. Zero vectors are returned unchanged.
pub fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|v| v / norm).collect()
}

fn unit_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    1.0 - dot
}

/// `1 - cos(a, b)`, computed exactly as the clustering does.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    unit_distance(&normalize(a), &normalize(b))
}

/// Dense symmetric matrix, row-major. The diagonal holds `NO_DISTANCE`.
struct DistanceMatrix {
    size: usize,
    cells: Vec<f32>,
}

impl DistanceMatrix {
    fn build(points: &[Vec<f32>]) -> Self {
        let size = points.len();
        let cells = (0..size * size)
            .into_par_iter()
            .map(|cell| {
                let (i, j) = (cell / size, cell % size);
                if i == j {
                    NO_DISTANCE
                } else {
                    unit_distance(&points[i], &points[j])
                }
            })
            .collect();
        Self { size, cells }
    }

    fn get(&self, i: usize, j: usize) -> f32 {
        self.cells[i * self.size + j]
    }

    fn set(&mut self, i: usize, j: usize, value: f32) {
        self.cells[i * self.size + j] = value;
        self.cells[j * self.size + i] = value;
    }

    fn nearest(&self, i: usize) -> (usize, f32) {
        let mut best = (i, NO_DISTANCE);
        for k in 0..self.size {
            let d = self.get(i, k);
            if d < best.1 {
                best = (k, d);
            }
        }
        best
    }
}

/// Assigns each point a cluster label. Points share a label iff they are
/// connected by a chain of merges whose distances are all `<= threshold`.
///
/// Labels are point indices of the surviving representative.
pub fn single_link_labels(points: &[Vec<f32>], threshold: f32) -> Vec<usize> {
    let size = points.len();
    let mut labels: Vec<usize> = (0..size).collect();
    if size < 2 {
        return labels;
    }

    let normalized: Vec<Vec<f32>> = points.iter().map(|p| normalize(p)).collect();
    let mut matrix = DistanceMatrix::build(&normalized);

    let (mut nearest, mut nearest_distance): (Vec<usize>, Vec<f32>) =
        (0..size).map(|i| matrix.nearest(i)).unzip();

    for _ in 1..size {
        let Some(i) = (0..size).min_by(|a, b| nearest_distance[*a].total_cmp(&nearest_distance[*b]))
        else {
            break;
        };
        let distance = nearest_distance[i];
        if distance.is_nan() || distance > threshold {
            break;
        }

        let j = nearest[i];
        for label in labels.iter_mut().filter(|label| **label == j) {
            *label = i;
        }

        for k in 0..size {
            if k == i || k == j {
                continue;
            }
            let merged = matrix.get(i, k).min(matrix.get(j, k));
            matrix.set(i, k, merged);
        }
        for k in 0..size {
            matrix.set(j, k, NO_DISTANCE);
        }
        nearest_distance[j] = NO_DISTANCE;

        // Single linkage keeps every distance to the merged cluster equal to
        // the old minimum, so neighbours of j only need redirecting.
        for k in 0..size {
            if nearest[k] == j && nearest_distance[k] < NO_DISTANCE {
                nearest[k] = i;
            }
        }

        let (next, next_distance) = matrix.nearest(i);
        nearest[i] = next;
        nearest_distance[i] = next_distance;
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_angle(cos: f32) -> Vec<f32> {
        vec![cos, (1.0 - cos * cos).sqrt()]
    }

    fn groups(labels: &[usize]) -> usize {
        let mut distinct = labels.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        distinct.len()
    }

    #[test]
    fn test_near_pair_merges_far_point_stays() {
        let points = vec![vec![1.0, 0.0], at_angle(0.99), vec![0.5, -0.866]];
        let labels = single_link_labels(&points, 0.02);

        assert_eq!(labels[0], labels[1]);
        assert_ne!(labels[0], labels[2]);
        assert_eq!(groups(&labels), 2);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let points = vec![vec![1.0, 0.0], at_angle(0.9)];
        let distance = cosine_distance(&points[0], &points[1]);

        let merged = single_link_labels(&points, distance);
        assert_eq!(merged[0], merged[1]);

        let split = single_link_labels(&points, distance - 1e-4);
        assert_ne!(split[0], split[1]);
    }

    #[test]
    fn test_chaining() {
        // a-b and b-c are close, a-c is not: single linkage joins all three.
        let points = vec![vec![1.0, 0.0], at_angle(0.995), at_angle(0.98)];
        assert!(cosine_distance(&points[0], &points[2]) > 0.015);

        let labels = single_link_labels(&points, 0.015);
        assert_eq!(groups(&labels), 1);
    }

    #[test]
    fn test_scale_does_not_matter() {
        let points = vec![vec![3.0, 0.0], vec![0.5, 0.0], vec![0.0, 2.0]];
        let labels = single_link_labels(&points, 0.01);
        assert_eq!(labels[0], labels[1]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_trivial_inputs() {
        assert!(single_link_labels(&[], 0.5).is_empty());
        assert_eq!(single_link_labels(&[vec![1.0, 0.0]], 0.5), vec![0]);
    }
}
