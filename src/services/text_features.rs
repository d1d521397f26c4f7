use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::models::{Movie, MovieId};

use super::stop_words::StopWords;

/// A sparse row: `indices` ascending, `values` aligned with them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl SparseVector {
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Appends `other` with every index shifted by `offset`
    fn extend_shifted(&mut self, other: SparseVector, offset: usize) {
        self.indices
            .extend(other.indices.into_iter().map(|index| index + offset));
        self.values.extend(other.values);
    }
}

/// Cosine similarity, 0 when either side has no features
pub fn cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let denominator = a.norm() * b.norm();
    if denominator == 0.0 {
        return 0.0;
    }
    a.dot(b) / denominator
}

/// Smoothed TF-IDF fitted over one text column
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: BTreeMap<String, usize>,
    idf: Vec<f64>,
    stop_words: StopWords,
}

impl TfidfVectorizer {
    /// Learns the vocabulary and inverse document frequencies of `documents`
    pub fn fit<S: AsRef<str>>(documents: &[S], stop_words: StopWords) -> Self {
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();
        for document in documents {
            let distinct: BTreeSet<String> = tokenize(document.as_ref(), stop_words).collect();
            for term in distinct {
                *document_frequency.entry(term).or_default() += 1;
            }
        }

        let n_documents = documents.len() as f64;
        let mut vocabulary = BTreeMap::new();
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (index, (term, df)) in document_frequency.into_iter().enumerate() {
            idf.push(((1.0 + n_documents) / (1.0 + df as f64)).ln() + 1.0);
            vocabulary.insert(term, index);
        }

        Self {
            vocabulary,
            idf,
            stop_words,
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalized TF-IDF row for one document; terms outside the vocabulary are ignored
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in tokenize(document, self.stop_words) {
            if let Some(&index) = self.vocabulary.get(&term) {
                *counts.entry(index).or_default() += 1.0;
            }
        }

        let mut row = SparseVector {
            indices: Vec::with_capacity(counts.len()),
            values: Vec::with_capacity(counts.len()),
        };
        for (index, count) in counts {
            row.indices.push(index);
            row.values.push(count * self.idf[index]);
        }

        let norm = row.norm();
        if norm > 0.0 {
            row.values.iter_mut().for_each(|v| *v /= norm);
        }
        row
    }
}

/// Lowercased word tokens of at least two characters, minus stop words
fn tokenize(text: &str, stop_words: StopWords) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(move |token| !stop_words.contains(token))
}

/// Concatenated genre and tag features, one row per catalog movie
///
/// Genres and tags are vectorized independently and joined genre block first.
/// Row `i` always belongs to catalog movie `i`.
#[derive(Debug, Clone)]
pub struct TextFeatures {
    rows: Vec<SparseVector>,
    genre_vocabulary: usize,
    tag_vocabulary: usize,
}

impl TextFeatures {
    pub fn build(movies: &[Movie], stop_words: StopWords) -> Self {
        let genres: Vec<&str> = movies.iter().map(|m| m.genres.as_str()).collect();
        let tags: Vec<&str> = movies.iter().map(|m| m.tags.as_str()).collect();

        let genre_vectorizer = TfidfVectorizer::fit(&genres, stop_words);
        let tag_vectorizer = TfidfVectorizer::fit(&tags, stop_words);
        let offset = genre_vectorizer.vocabulary_len();

        let rows = movies
            .iter()
            .map(|movie| {
                let mut row = genre_vectorizer.transform(&movie.genres);
                row.extend_shifted(tag_vectorizer.transform(&movie.tags), offset);
                row
            })
            .collect();

        tracing::info!(
            movies = movies.len(),
            genre_vocabulary = genre_vectorizer.vocabulary_len(),
            tag_vocabulary = tag_vectorizer.vocabulary_len(),
            "Built text feature matrix"
        );

        Self {
            rows,
            genre_vocabulary: genre_vectorizer.vocabulary_len(),
            tag_vocabulary: tag_vectorizer.vocabulary_len(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&SparseVector> {
        self.rows.get(index)
    }

    pub fn genre_vocabulary(&self) -> usize {
        self.genre_vocabulary
    }

    pub fn tag_vocabulary(&self) -> usize {
        self.tag_vocabulary
    }

    pub fn width(&self) -> usize {
        self.genre_vocabulary + self.tag_vocabulary
    }

    /// Mean cosine similarity of every row against the rows at `queries`
    ///
    /// Query positions outside the matrix are ignored. Returns all zeros when no
    /// query position is valid.
    pub fn mean_similarity(&self, queries: &[usize]) -> Vec<f64> {
        let query_rows: Vec<&SparseVector> =
            queries.iter().filter_map(|&q| self.rows.get(q)).collect();
        let mut scores = vec![0.0; self.rows.len()];
        if query_rows.is_empty() {
            return scores;
        }

        for (score, row) in scores.iter_mut().zip(&self.rows) {
            let total: f64 = query_rows.iter().map(|query| cosine(query, row)).sum();
            *score = total / query_rows.len() as f64;
        }
        scores
    }
}

/// Lookup from catalog position to the feature row
pub fn positions_by_id(movies: &[Movie]) -> HashMap<MovieId, usize> {
    movies
        .iter()
        .enumerate()
        .map(|(position, movie)| (movie.id, position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, genres: &str, tags: &str) -> Movie {
        Movie {
            id,
            title: format!("Movie {} (2000)", id),
            genres: genres.to_string(),
            tags: tags.to_string(),
        }
    }

    #[test]
    fn test_one_row_per_movie() {
        let movies = vec![
            movie(1, "Adventure|Animation|Children", "pixar fun"),
            movie(2, "Action|Crime|Thriller", ""),
            movie(3, "", ""),
        ];
        let features = TextFeatures::build(&movies, StopWords::English);

        assert_eq!(features.len(), 3);
        assert_eq!(features.genre_vocabulary(), 6);
        assert_eq!(features.tag_vocabulary(), 2);
        assert!(features.row(2).unwrap().indices.is_empty());
    }

    #[test]
    fn test_rows_follow_catalog_permutation() {
        let movies = vec![
            movie(1, "Comedy|Romance", "quirky"),
            movie(2, "Horror", "gore"),
            movie(3, "Comedy", "quirky dark"),
        ];
        let permuted = vec![movies[2].clone(), movies[0].clone(), movies[1].clone()];

        let original = TextFeatures::build(&movies, StopWords::English);
        let shuffled = TextFeatures::build(&permuted, StopWords::English);

        // Vocabulary is sorted, so fitted columns do not depend on row order.
        assert_eq!(original.row(0), shuffled.row(1));
        assert_eq!(original.row(1), shuffled.row(2));
        assert_eq!(original.row(2), shuffled.row(0));
    }

    #[test]
    fn test_stop_words_are_dropped() {
        let docs = ["the matrix", "into the wild"];
        let english = TfidfVectorizer::fit(&docs, StopWords::English);
        let none = TfidfVectorizer::fit(&docs, StopWords::Disabled);

        assert_eq!(english.vocabulary_len(), 2);
        assert_eq!(none.vocabulary_len(), 4);
    }

    #[test]
    fn test_rare_terms_weigh_more() {
        let docs = ["drama war", "drama", "drama"];
        let vectorizer = TfidfVectorizer::fit(&docs, StopWords::English);
        let row = vectorizer.transform("drama war");

        // "drama" sorts before "war"
        assert_eq!(row.indices, vec![0, 1]);
        assert!(row.values[1] > row.values[0]);
        assert!((row.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_vocabulary_does_not_fail() {
        let movies = vec![movie(1, "", ""), movie(2, "", "")];
        let features = TextFeatures::build(&movies, StopWords::English);

        assert_eq!(features.width(), 0);
        assert_eq!(features.mean_similarity(&[0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_mean_similarity_prefers_shared_genres() {
        let movies = vec![
            movie(1, "Animation|Children", "pixar"),
            movie(2, "Animation|Children", "pixar"),
            movie(3, "Horror", "gore"),
        ];
        let features = TextFeatures::build(&movies, StopWords::English);
        let scores = features.mean_similarity(&[0]);

        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert!((scores[1] - 1.0).abs() < 1e-9);
        assert_eq!(scores[2], 0.0);
    }
}
