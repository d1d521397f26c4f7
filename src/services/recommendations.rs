use std::collections::HashSet;

use crate::models::MovieId;

use super::context::ModelContext;

/// Recommends up to `n` catalog titles for a list of liked movies
///
/// Each input is resolved through the title index; all matches count as input
/// movies. Candidates come from two sources:
///
/// - content: mean cosine similarity of genre/tag features against the inputs,
///   ranked over the top `n + inputs` window
/// - collaborative: the `n` movies whose item latent vectors score highest
///   against each input's vector
///
/// Content candidates come first, then collaborative ones. Duplicates and the
/// input movies themselves are dropped and the list is cut to `n`. Inputs that
/// resolve to nothing produce an empty list rather than an error.
pub fn get_movie_recommendations(
    context: &ModelContext,
    input_movies: &[String],
    n: usize,
) -> Vec<String> {
    tracing::info!(?input_movies, n, "Received input movies");
    if n == 0 {
        return Vec::new();
    }

    let input_ids = resolve_inputs(context, input_movies);
    if input_ids.is_empty() {
        tracing::warn!("No matching movies found in the catalog");
        return Vec::new();
    }

    let content = content_candidates(context, &input_ids, n);
    tracing::info!(?content, "Content-based candidates");

    let collaborative = collaborative_candidates(context, &input_ids, n);
    tracing::info!(?collaborative, "Collaborative filtering candidates");

    merge(context, &input_ids, content, collaborative, n)
}

/// Ids of every catalog movie matched by any input title, in catalog order
fn resolve_inputs(context: &ModelContext, input_movies: &[String]) -> Vec<MovieId> {
    let mut matched: HashSet<MovieId> = HashSet::new();

    for query in input_movies {
        if query.trim().is_empty() {
            continue;
        }
        let matches = context.titles.resolve(query);
        if matches.is_empty() {
            tracing::warn!(query = %query, "Title did not match any movie");
            continue;
        }
        tracing::info!(
            query = %query,
            titles = ?matches.iter().map(|m| m.title.as_str()).collect::<Vec<_>>(),
            "Resolved title"
        );
        matched.extend(matches.into_iter().map(|m| m.id));
    }

    context
        .movies
        .iter()
        .map(|movie| movie.id)
        .filter(|id| matched.contains(id))
        .collect()
}

fn content_candidates(context: &ModelContext, input_ids: &[MovieId], n: usize) -> Vec<MovieId> {
    let positions: Vec<usize> = input_ids
        .iter()
        .filter_map(|&id| context.position_of(id))
        .collect();

    let scores = context.text.mean_similarity(&positions);
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    ranked
        .into_iter()
        .take(n + positions.len())
        .filter_map(|position| context.movies.get(position).map(|movie| movie.id))
        .filter(|id| !input_ids.contains(id))
        .collect()
}

fn collaborative_candidates(
    context: &ModelContext,
    input_ids: &[MovieId],
    n: usize,
) -> Vec<MovieId> {
    if context.latent.rank() == 0 {
        tracing::warn!("Latent factors are empty; skipping collaborative filtering");
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for &movie_id in input_ids {
        let Some(column) = context.rating_matrix.column_of(movie_id) else {
            tracing::warn!(movie_id, "Movie not found in rating matrix");
            continue;
        };
        if context.latent.item_vector(column).is_none() {
            tracing::warn!(movie_id, column, "Movie has no usable latent vector");
            continue;
        }

        candidates.extend(
            context
                .latent
                .similar_items(column, n)
                .into_iter()
                .filter_map(|(similar, _)| context.rating_matrix.movie_id(similar)),
        );
    }
    candidates
}

/// Content candidates first, then collaborative, deduplicated by title
fn merge(
    context: &ModelContext,
    input_ids: &[MovieId],
    content: Vec<MovieId>,
    collaborative: Vec<MovieId>,
    n: usize,
) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged = Vec::with_capacity(n);

    for movie_id in content.into_iter().chain(collaborative) {
        if merged.len() == n {
            break;
        }
        if input_ids.contains(&movie_id) {
            continue;
        }
        let Some(movie) = context.movie(movie_id) else {
            continue;
        };
        if seen.insert(movie.title.as_str()) {
            merged.push(movie.title.clone());
        }
    }

    tracing::info!(recommendations = ?merged, "Combined recommendations");
    merged
}
