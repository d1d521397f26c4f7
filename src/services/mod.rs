pub mod context;
pub mod latent;
pub mod loader;
pub mod recommendations;
pub mod stop_words;
pub mod text_features;
pub mod title_search;

#[cfg(test)]
pub(crate) mod fixtures;

pub use context::{ModelCache, ModelContext, ModelSettings, ModelStats};
pub use recommendations::get_movie_recommendations;
pub use stop_words::StopWords;
pub use title_search::TitleIndex;
