use crate::models::{Movie, TitleMatch};

/// Catalog titles prepared for case- and year-insensitive substring search
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    entries: Vec<(String, TitleMatch)>,
}

impl TitleIndex {
    pub fn build(movies: &[Movie]) -> Self {
        let entries = movies
            .iter()
            .map(|movie| {
                (
                    normalize_title(&movie.title),
                    TitleMatch {
                        id: movie.id,
                        title: movie.title.clone(),
                    },
                )
            })
            .collect();

        Self { entries }
    }

    /// Every catalog entry whose normalized title contains the lowercased query
    ///
    /// Matches come back in catalog order. Short queries may match many movies;
    /// all of them are returned.
    pub fn resolve(&self, query: &str) -> Vec<TitleMatch> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|(normalized, _)| normalized.contains(&needle))
            .map(|(_, entry)| entry.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drops the trailing whitespace-delimited token (the "(YYYY)" suffix) and lowercases
fn normalize_title(title: &str) -> String {
    let tokens: Vec<&str> = title.split_whitespace().collect();
    let kept = tokens.len().saturating_sub(1);
    tokens[..kept].join(" ").to_lowercase()
}
