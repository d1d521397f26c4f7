use std::collections::{BTreeSet, HashMap};

use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::models::{Movie, MovieId, Rating, UserId};

use super::context::ModelSettings;

const ZERO_NORM: f64 = 1e-10;
const JACOBI_MAX_SWEEPS: usize = 100;

/// Dense rating matrix with its row and column keys
///
/// Users × movies, zero where unrated, rows sorted by user id and columns sorted
/// by movie id.
#[derive(Debug, Clone)]
pub struct RatingMatrix {
    user_ids: Vec<UserId>,
    movie_ids: Vec<MovieId>,
    column_of: HashMap<MovieId, usize>,
    values: Array2<f64>,
    rating_count: usize,
}

impl RatingMatrix {
    /// Builds the matrix from every rating and catalog movie
    ///
    /// Every rating-bearing user gets a row and every catalog movie a column.
    /// Ratings for movies outside the catalog are ignored; when a (user, movie)
    /// pair repeats, the last rating wins.
    pub fn build(ratings: &[Rating], movies: &[Movie]) -> Self {
        let user_ids: Vec<UserId> = ratings
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let movie_ids: Vec<MovieId> = movies
            .iter()
            .map(|m| m.id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let row_of: HashMap<UserId, usize> =
            user_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let column_of: HashMap<MovieId, usize> =
            movie_ids.iter().enumerate().map(|(j, &id)| (id, j)).collect();

        let mut values = Array2::<f64>::zeros((user_ids.len(), movie_ids.len()));
        let mut orphaned = 0usize;
        for rating in ratings {
            let (Some(&row), Some(&column)) =
                (row_of.get(&rating.user_id), column_of.get(&rating.movie_id))
            else {
                orphaned += 1;
                continue;
            };
            values[[row, column]] = rating.rating;
        }

        if orphaned > 0 {
            tracing::debug!(orphaned, "Ignored ratings for movies outside the catalog");
        }

        tracing::info!(
            users = user_ids.len(),
            movies = movie_ids.len(),
            "Built rating matrix"
        );

        Self {
            user_ids,
            movie_ids,
            column_of,
            values,
            rating_count: ratings.len() - orphaned,
        }
    }

    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of ratings that landed in the matrix
    pub fn rating_count(&self) -> usize {
        self.rating_count
    }

    pub fn column_of(&self, movie_id: MovieId) -> Option<usize> {
        self.column_of.get(&movie_id).copied()
    }

    pub fn movie_id(&self, column: usize) -> Option<MovieId> {
        self.movie_ids.get(column).copied()
    }

    /// Zero mean and unit (population) variance per column; constant columns become 0
    pub fn standardized(&self) -> Array2<f64> {
        let mut standardized = self.values.clone();
        for mut column in standardized.columns_mut() {
            let mean = column.mean().unwrap_or(0.0);
            let variance = column.mapv(|v| (v - mean).powi(2)).mean().unwrap_or(0.0);
            let std_dev = variance.sqrt();
            if std_dev < ZERO_NORM {
                column.fill(0.0);
            } else {
                column.mapv_inplace(|v| (v - mean) / std_dev);
            }
        }
        standardized
    }
}

/// Truncated SVD factors of a standardized rating matrix
///
/// Computed with a seeded randomized range finder, so the same data and seed
/// always give the same factors. Row `j` of `item_factors` is the movie in
/// rating-matrix column `j`.
#[derive(Debug, Clone)]
pub struct LatentFactors {
    /// `U·Σ`, one row per rating-matrix row
    pub user_latent: Array2<f64>,
    /// `V·Σ`, one row per rating-matrix column
    pub item_factors: Array2<f64>,
    /// Descending
    pub singular_values: Array1<f64>,
}

impl LatentFactors {
    /// Factorizes `matrix` keeping `min(latent_rank, rows, columns)` components
    pub fn fit(matrix: &Array2<f64>, settings: &ModelSettings) -> Self {
        let (n_rows, n_cols) = matrix.dim();
        let rank = settings.latent_rank.min(n_rows).min(n_cols);
        if rank < settings.latent_rank {
            tracing::warn!(
                requested = settings.latent_rank,
                effective = rank,
                "Latent rank clamped to matrix dimensions"
            );
        }

        if rank == 0 {
            return Self {
                user_latent: Array2::zeros((n_rows, 0)),
                item_factors: Array2::zeros((n_cols, 0)),
                singular_values: Array1::zeros(0),
            };
        }

        let sketch = (rank + settings.oversamples).min(n_rows.min(n_cols));
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let omega = Array2::from_shape_fn((n_cols, sketch), |_| rng.gen_range(-1.0..1.0));

        let mut q = orthonormalize(matrix.dot(&omega));
        for _ in 0..settings.power_iterations {
            let z = orthonormalize(matrix.t().dot(&q));
            q = orthonormalize(matrix.dot(&z));
        }

        // B = QᵀA is small (sketch × columns); its left singular vectors come from
        // the eigen-decomposition of BBᵀ.
        let b = q.t().dot(matrix);
        let (eigenvalues, eigenvectors) = symmetric_eigen(b.dot(&b.t()));

        let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
        order.sort_by(|&x, &y| eigenvalues[y].total_cmp(&eigenvalues[x]).then(x.cmp(&y)));
        order.truncate(rank);

        let w = eigenvectors.select(Axis(1), &order);
        let singular_values: Array1<f64> =
            order.iter().map(|&i| eigenvalues[i].max(0.0).sqrt()).collect();

        let user_latent = q.dot(&w).dot(&Array2::from_diag(&singular_values));
        let item_factors = b.t().dot(&w);

        tracing::info!(
            rank,
            sketch,
            top_singular_value = singular_values[0],
            "Factorized rating matrix"
        );

        Self {
            user_latent,
            item_factors,
            singular_values,
        }
    }

    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }

    /// Latent vector of the movie in rating-matrix column `column`
    ///
    /// `None` when the column is out of range or its vector is all zeros (a
    /// movie nobody rated), since such a vector scores every movie alike.
    pub fn item_vector(&self, column: usize) -> Option<ArrayView1<'_, f64>> {
        if column >= self.item_factors.nrows() {
            return None;
        }
        let vector = self.item_factors.row(column);
        (vector.dot(&vector).sqrt() >= ZERO_NORM).then_some(vector)
    }

    /// Columns ranked by dot product against `column`'s vector, excluding `column` itself
    ///
    /// Ties break by ascending column index.
    pub fn similar_items(&self, column: usize, n: usize) -> Vec<(usize, f64)> {
        let Some(query) = self.item_vector(column) else {
            return Vec::new();
        };

        let scores = self.item_factors.dot(&query);
        let mut ranked: Vec<(usize, f64)> = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|&(index, _)| index != column)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }
}

/// Modified Gram-Schmidt over columns; dependent columns are zeroed
fn orthonormalize(mut m: Array2<f64>) -> Array2<f64> {
    for j in 0..m.ncols() {
        for i in 0..j {
            let basis = m.column(i).to_owned();
            let projection = basis.dot(&m.column(j));
            m.column_mut(j).scaled_add(-projection, &basis);
        }

        let norm = m.column(j).dot(&m.column(j)).sqrt();
        if norm < ZERO_NORM {
            m.column_mut(j).fill(0.0);
        } else {
            m.column_mut(j).mapv_inplace(|v| v / norm);
        }
    }
    m
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix
///
/// Returns the eigenvalues (unsorted) and the eigenvectors as columns.
fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let scale = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let off_diagonal: f64 = (0..n)
            .flat_map(|p| (0..n).filter(move |&q| q != p).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off_diagonal <= 1e-24 * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() < f64::MIN_POSITIVE {
                    continue;
                }

                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StopWords;
    use ndarray::array;

    fn settings(latent_rank: usize) -> ModelSettings {
        ModelSettings {
            latent_rank,
            oversamples: 10,
            power_iterations: 5,
            seed: 42,
            stop_words: StopWords::English,
        }
    }

    fn movie(id: MovieId) -> Movie {
        Movie {
            id,
            title: format!("Movie {} (2000)", id),
            genres: String::new(),
            tags: String::new(),
        }
    }

    fn rating(user_id: UserId, movie_id: MovieId, value: f64) -> Rating {
        Rating {
            user_id,
            movie_id,
            rating: value,
            timestamp: 0,
        }
    }

    #[test]
    fn test_matrix_has_row_per_user_and_column_per_movie() {
        let movies = vec![movie(30), movie(10), movie(20), movie(40)];
        let ratings = vec![
            rating(2, 10, 4.0),
            rating(1, 20, 3.0),
            rating(2, 20, 5.0),
            rating(9, 99, 1.0),
        ];

        let matrix = RatingMatrix::build(&ratings, &movies);

        assert_eq!(matrix.user_ids(), &[1, 2, 9]);
        assert_eq!(matrix.movie_ids(), &[10, 20, 30, 40]);
        assert_eq!(matrix.values().dim(), (3, 4));
        assert_eq!(matrix.column_of(30), Some(2));
        assert_eq!(matrix.column_of(99), None);
        assert_eq!(matrix.values()[[1, 0]], 4.0);
        assert_eq!(matrix.values().row(2).sum(), 0.0);
        assert_eq!(matrix.rating_count(), 3);
    }

    #[test]
    fn test_duplicate_rating_last_write_wins() {
        let ratings = vec![rating(1, 10, 2.0), rating(1, 10, 4.5)];
        let matrix = RatingMatrix::build(&ratings, &[movie(10)]);
        assert_eq!(matrix.values()[[0, 0]], 4.5);
    }

    #[test]
    fn test_standardized_columns() {
        let movies = vec![movie(1), movie(2), movie(3)];
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(2, 1, 3.0),
            rating(3, 1, 1.0),
            rating(1, 2, 4.0),
            rating(2, 2, 4.0),
            rating(3, 2, 4.0),
            rating(4, 3, 2.0),
        ];
        let standardized = RatingMatrix::build(&ratings, &movies).standardized();

        for (j, column) in standardized.columns().into_iter().enumerate() {
            let mean = column.mean().unwrap();
            let variance = column.mapv(|v| (v - mean).powi(2)).mean().unwrap();
            assert!(mean.abs() < 1e-9, "column {} mean {}", j, mean);
            if j == 1 {
                // 4.0 for three users, 0 for the fourth, so not constant
                assert!((variance - 1.0).abs() < 1e-9);
            }
        }

        let constant = RatingMatrix::build(&[rating(1, 1, 3.0), rating(2, 1, 3.0)], &[movie(1)]);
        assert!(constant.standardized().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_singular_values_of_diagonal_matrix() {
        let matrix = array![[5.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 1.0]];
        let factors = LatentFactors::fit(&matrix, &settings(3));

        let expected = [5.0, 3.0, 1.0];
        for (actual, expected) in factors.singular_values.iter().zip(expected) {
            assert!((actual - expected).abs() < 1e-8);
        }

        // U·Σ·Vᵀ = U·Σ·Σ⁻¹·(V·Σ)ᵀ reproduces the input
        let inverse = Array2::from_diag(&factors.singular_values.mapv(|s| 1.0 / s));
        let rebuilt = factors
            .user_latent
            .dot(&inverse)
            .dot(&factors.item_factors.t());
        for (a, b) in rebuilt.iter().zip(matrix.iter()) {
            assert!((a - b).abs() < 1e-8);
        }
    }

    #[test]
    fn test_rank_is_clamped() {
        let matrix = Array2::from_shape_fn((6, 3), |(i, j)| ((i * 3 + j) % 5) as f64);
        let factors = LatentFactors::fit(&matrix, &settings(50));

        assert_eq!(factors.rank(), 3);
        assert_eq!(factors.user_latent.dim(), (6, 3));
        assert_eq!(factors.item_factors.dim(), (3, 3));
    }

    #[test]
    fn test_empty_matrix_yields_rank_zero() {
        let matrix = RatingMatrix::build(&[], &[movie(1), movie(2)]);
        let factors = LatentFactors::fit(&matrix.standardized(), &settings(50));

        assert_eq!(factors.rank(), 0);
        assert_eq!(factors.item_factors.nrows(), 2);
        assert!(factors.item_vector(0).is_none());
        assert!(factors.similar_items(0, 5).is_empty());
    }

    #[test]
    fn test_similar_items_ranks_identical_column_first() {
        let movies: Vec<Movie> = (1..=4).map(movie).collect();
        let mut ratings = Vec::new();
        let table = [
            [5.0, 1.0, 5.0, 2.0],
            [4.0, 2.0, 4.0, 5.0],
            [1.0, 5.0, 1.0, 3.0],
            [2.0, 4.0, 2.0, 1.0],
            [3.0, 3.0, 3.0, 4.0],
            [5.0, 2.0, 5.0, 2.0],
        ];
        for (user, row) in table.iter().enumerate() {
            for (column, &value) in row.iter().enumerate() {
                ratings.push(rating(user as UserId + 1, column as MovieId + 1, value));
            }
        }

        let matrix = RatingMatrix::build(&ratings, &movies);
        let factors = LatentFactors::fit(&matrix.standardized(), &settings(50));

        // Item rows line up with rating-matrix columns
        assert_eq!(factors.item_factors.nrows(), matrix.movie_ids().len());

        let similar = factors.similar_items(0, 2);
        assert_eq!(similar.len(), 2);
        assert_eq!(similar[0].0, 2);
        assert!(similar.iter().all(|&(column, _)| column != 0));
        assert!(factors.similar_items(7, 2).is_empty());
    }

    #[test]
    fn test_unrated_movie_has_no_neighbours() {
        let movies: Vec<Movie> = (1..=4).map(movie).collect();
        let ratings = vec![
            rating(1, 1, 5.0),
            rating(1, 2, 1.0),
            rating(2, 1, 2.0),
            rating(2, 2, 4.0),
            rating(3, 1, 3.0),
            rating(3, 3, 5.0),
        ];

        let matrix = RatingMatrix::build(&ratings, &movies);
        let factors = LatentFactors::fit(&matrix.standardized(), &settings(3));
        let unrated = matrix.column_of(4).unwrap();

        assert!(factors.item_vector(unrated).is_none());
        assert!(factors.similar_items(unrated, 2).is_empty());
        assert_eq!(factors.similar_items(0, 2).len(), 2);
    }

    #[test]
    fn test_factorization_is_reproducible() {
        let matrix = Array2::from_shape_fn((8, 5), |(i, j)| ((i * 7 + j * 3) % 6) as f64);
        let first = LatentFactors::fit(&matrix, &settings(2));
        let second = LatentFactors::fit(&matrix, &settings(2));
        assert_eq!(first.item_factors, second.item_factors);
    }
}
