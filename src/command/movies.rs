// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{builder::NonEmptyStringValueParser, Args, Parser, Subcommand};
use log::error;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use crate::{
    client::Client,
    error::{self, Result},
    model::{Movie, MovieDraft, Rate},
    sync::{Movies, Synchronizer},
    transport::Backend,
};

/// List and edit the movie inventory.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, Subcommand)]
enum Action {
    /// Show every movie with its genre.
    List,
    /// Add a movie.
    Add(Add),
    /// Change a movie. Anything not given keeps its current value.
    Update(Update),
    /// Remove a movie.
    Delete {
        /// The identifier of the movie.
        id: String,
    },
}

#[derive(Debug, Args)]
struct Add {
    #[arg(long)]
    title: String,

    /// The identifier of the movie's genre.
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    genre: String,

    /// How many copies are available, from 0 to 255.
    #[arg(long)]
    stock: u8,

    /// The daily rental rate, from 0 to 255.
    #[arg(long)]
    rate: Rate,
}

#[derive(Debug, Args)]
struct Update {
    /// The identifier of the movie.
    id: String,

    #[arg(long)]
    title: Option<String>,

    /// The identifier of the movie's genre. Required when the movie has
    /// none yet.
    #[arg(long, value_parser = NonEmptyStringValueParser::new())]
    genre: Option<String>,

    #[arg(long)]
    stock: Option<u8>,

    #[arg(long)]
    rate: Option<Rate>,
}

impl Update {
    /// Builds the draft to send, keeping the current value of every field
    /// not given. Without a genre to keep or set there is no draft.
    fn apply(self, current: &Movie) -> Option<MovieDraft> {
        let mut draft = match self.genre {
            Some(genre) => current.to_draft_with_genre(genre),
            None => current.to_draft()?,
        };
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(stock) = self.stock {
            draft.number_in_stock = stock;
        }
        if let Some(rate) = self.rate {
            draft.daily_rental_rate = rate;
        }
        Some(draft)
    }
}

#[derive(Debug, PartialEq, Tabled)]
struct Row {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Genre")]
    genre: String,
    #[tabled(rename = "Stock")]
    stock: u8,
    #[tabled(rename = "Rate")]
    rate: Rate,
}

impl Row {
    async fn new<B: Backend>(movies: &Synchronizer<Movies, B>, movie: Movie) -> Self {
        let genre = match movies.resolve(&movie).await {
            Some(name) => name,
            None => movie
                .genre
                .as_ref()
                .map(|g| format!("? ({})", g.id()))
                .unwrap_or_default(),
        };

        Self {
            id: movie.id,
            title: movie.title,
            genre,
            stock: movie.number_in_stock,
            rate: movie.daily_rental_rate,
        }
    }
}

async fn print<B: Backend>(movies: &Synchronizer<Movies, B>, items: Vec<Movie>) {
    let mut rows = Vec::with_capacity(items.len());
    for movie in items {
        rows.push(Row::new(movies, movie).await);
    }

    println!(
        "{}",
        Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
    );
}

#[async_trait]
impl super::Command for Command {
    async fn execute<B: Backend>(self, client: &Client<B>) -> Result<()> {
        let _ = client.user()?;
        let movies = &client.movies;
        let _ = movies.load().await?;

        match self.action {
            Action::List => {
                let items = movies.items().await;
                if items.is_empty() {
                    println!("There are no movies in the database.");
                } else {
                    println!("Showing {} movies in the database.", items.len());
                    print(movies, items).await;
                }
            }
            Action::Add(add) => {
                let movie = movies
                    .create(&MovieDraft {
                        title: add.title,
                        genre: add.genre,
                        number_in_stock: add.stock,
                        daily_rental_rate: add.rate,
                    })
                    .await?;
                print(movies, vec![movie]).await;
            }
            Action::Update(update) => {
                let Some(current) = movies.get(&update.id).await else {
                    error!(r#"There is no movie with ID "{}""#, update.id.escape_default());
                    return Err(error::Error::Command);
                };
                let id = update.id.clone();
                let Some(draft) = update.apply(&current) else {
                    error!(
                        r#"The movie "{}" has no genre yet, so one must be given with --genre"#,
                        id.escape_default()
                    );
                    return Err(error::Error::Command);
                };
                let movie = movies.update(&id, &draft).await?;
                print(movies, vec![movie]).await;
            }
            Action::Delete { id } => {
                movies.delete(&id).await?;
                println!("Deleted movie {id}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::{
        client::testing::client, command::Command as _, model::GenreField,
        transport::testing::Scripted,
    };

    #[test]
    fn update_keeps_unspecified_fields() -> Result<()> {
        let current: Movie = serde_json::from_value(json!({
            "_id": "m1",
            "title": "Alien",
            "genre": { "_id": "g1", "name": "Horror" },
            "numberInStock": 5,
            "dailyRentalRate": 2.5,
        }))?;

        let draft = Update {
            id: "m1".to_owned(),
            title: None,
            genre: None,
            stock: Some(7),
            rate: None,
        }
        .apply(&current)
        .ok_or(error::Error::Command)?;

        assert_eq!(draft.title, "Alien");
        assert_eq!(draft.genre, "g1");
        assert_eq!(draft.number_in_stock, 7);
        assert_eq!(draft.daily_rental_rate, current.daily_rental_rate);
        Ok(())
    }

    async fn logged_in(backend: &Arc<Scripted>) -> Result<Client<Arc<Scripted>>> {
        backend.reply(Method::POST, "/api/auth/login", 200, json!("eyJ.token"));
        backend.reply(
            Method::GET,
            "/api/auth/me",
            200,
            json!({ "_id": "u1", "name": "Ada", "email": "ada@example.com" }),
        );
        let client = client(Arc::clone(backend), &[])?;
        let _ = client
            .session
            .login("ada@example.com", secrecy::SecretString::new("hunter22".to_owned()))
            .await?;
        Ok(client)
    }

    fn genreless() -> serde_json::Value {
        json!([{ "_id": "m1", "title": "Alien", "numberInStock": 5, "dailyRentalRate": 2.5 }])
    }

    #[tokio::test]
    async fn update_without_any_genre_is_refused() -> Result<()> {
        let backend = Scripted::new();
        let client = logged_in(&backend).await?;
        backend.reply(Method::GET, "/api/movies", 200, genreless());
        backend.reply(Method::GET, "/api/genres", 200, json!([]));

        let result = Command {
            action: Action::Update(Update {
                id: "m1".to_owned(),
                title: None,
                genre: None,
                stock: Some(7),
                rate: None,
            }),
        }
        .execute(&client)
        .await;

        assert!(matches!(result, Err(error::Error::Command)));
        assert_eq!(backend.requests_to(&Method::PUT, "/api/movies/m1"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn update_can_give_a_genreless_movie_a_genre() -> Result<()> {
        let backend = Scripted::new();
        let client = logged_in(&backend).await?;
        backend.reply(Method::GET, "/api/movies", 200, genreless());
        backend.reply(Method::GET, "/api/genres", 200, json!([{ "_id": "g1", "name": "Horror" }]));
        backend.reply(
            Method::PUT,
            "/api/movies/m1",
            200,
            json!({ "_id": "m1", "title": "Alien", "genre": "g1", "numberInStock": 7, "dailyRentalRate": 2.5 }),
        );

        Command {
            action: Action::Update(Update {
                id: "m1".to_owned(),
                title: None,
                genre: Some("g1".to_owned()),
                stock: Some(7),
                rate: None,
            }),
        }
        .execute(&client)
        .await?;

        let sent = backend.requests();
        assert_eq!(
            sent.last().and_then(|r| r.body.clone()),
            Some(json!({ "title": "Alien", "genre": "g1", "numberInStock": 7, "dailyRentalRate": 2.5 }))
        );
        Ok(())
    }

    #[tokio::test]
    async fn unresolved_genres_show_their_identifier() -> Result<()> {
        let backend = Scripted::new();
        backend.reply(Method::GET, "/api/movies", 200, json!([]));
        backend.reply(Method::GET, "/api/genres", 200, json!([]));
        let client = client(Arc::clone(&backend), &[])?;
        let _ = client.movies.load().await?;

        let movie: Movie = serde_json::from_value(json!({
            "_id": "m1",
            "title": "Alien",
            "genre": "g1",
            "numberInStock": 5,
            "dailyRentalRate": 2.5,
        }))?;
        assert_eq!(movie.genre, Some(GenreField::Reference("g1".to_owned())));

        let row = Row::new(&client.movies, movie).await;
        assert_eq!(row.genre, "? (g1)");
        Ok(())
    }

    #[tokio::test]
    async fn requires_login() -> Result<()> {
        let backend = Scripted::new();
        let client = client(Arc::clone(&backend), &[])?;

        let result = Command {
            action: Action::List,
        }
        .execute(&client)
        .await;

        assert!(matches!(
            result,
            Err(error::Error::Session(error::Session::NotAuthenticated))
        ));
        assert!(backend.requests().is_empty());
        Ok(())
    }
}
