use crate::models::{Dataset, Movie, MovieRecord, Rating, RatingRecord, TagRecord};

// Small catalog shared by the model and engine tests
const MOVIES: &[(i64, &str, &str)] = &[
    (1, "Toy Story (1995)", "Adventure|Animation|Children|Comedy|Fantasy"),
    (2, "Jumanji (1995)", "Adventure|Children|Fantasy"),
    (3, "Grumpier Old Men (1995)", "Comedy|Romance"),
    (4, "Waiting to Exhale (1995)", "Comedy|Drama|Romance"),
    (5, "Father of the Bride Part II (1995)", "Comedy"),
    (6, "Heat (1995)", "Action|Crime|Thriller"),
    (7, "Sabrina (1995)", "Comedy|Romance"),
    (8, "Tom and Huck (1995)", "Adventure|Children"),
    (9, "Sudden Death (1995)", "Action"),
    (10, "GoldenEye (1995)", "Action|Adventure|Thriller"),
    (11, "Toy Story 2 (1999)", "Adventure|Animation|Children|Comedy|Fantasy"),
    (12, "Balto (1995)", "Adventure|Animation|Children"),
];

const TAGS: &[(i64, &str)] = &[
    (1, "pixar"),
    (1, "fun"),
    (2, "board game"),
    (6, "pacino"),
    (6, "heist"),
    (10, "bond"),
    (11, "pixar"),
    (11, "sequel"),
];

pub fn movie_records() -> Vec<MovieRecord> {
    MOVIES
        .iter()
        .map(|&(id, title, genres)| MovieRecord {
            movie_id: id,
            title: Some(title.to_string()),
            genres: Some(genres.to_string()),
        })
        .collect()
}

/// Six users with a deterministic spread of ratings, plus one rating for a movie outside the catalog
pub fn ratings() -> Vec<Rating> {
    let mut ratings = Vec::new();
    for user_id in 1..=6i64 {
        for movie_id in 1..=12i64 {
            if (user_id * movie_id) % 3 != 0 {
                ratings.push(Rating {
                    user_id,
                    movie_id,
                    rating: ((user_id + movie_id) % 5 + 1) as f64,
                    timestamp: 964_982_703,
                });
            }
        }
    }
    ratings.push(Rating {
        user_id: 7,
        movie_id: 999,
        rating: 4.0,
        timestamp: 964_982_703,
    });
    ratings
}

pub fn rating_records() -> Vec<RatingRecord> {
    ratings()
        .into_iter()
        .map(|r| RatingRecord {
            user_id: Some(r.user_id.to_string()),
            movie_id: Some(r.movie_id.to_string()),
            rating: Some(r.rating),
            timestamp: Some(r.timestamp),
        })
        .collect()
}

pub fn tag_records() -> Vec<TagRecord> {
    TAGS.iter()
        .map(|&(movie_id, tag)| TagRecord {
            user_id: Some(2),
            movie_id: Some(movie_id),
            tag: Some(tag.to_string()),
            timestamp: Some(1_445_714_994),
        })
        .collect()
}

/// The catalog as the loader would produce it
pub fn sample_dataset() -> Dataset {
    let movies = MOVIES
        .iter()
        .map(|&(id, title, genres)| Movie {
            id,
            title: title.to_string(),
            genres: genres.to_string(),
            tags: TAGS
                .iter()
                .filter(|(movie_id, _)| *movie_id == id)
                .map(|(_, tag)| *tag)
                .collect::<Vec<_>>()
                .join(" "),
        })
        .collect();

    Dataset {
        movies,
        ratings: ratings(),
    }
}
