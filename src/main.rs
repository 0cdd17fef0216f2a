// src/main.rs
//
// moviehub command line: list, show, add, edit and delete catalog entries.
// Output is pretty JSON on stdout; logs go to stderr (RUST_LOG, default info).

use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use moviehub::application::commands;
use moviehub::application::dto::{EditMovieDto, PosterInputDto, SaveMovieDto};
use moviehub::{AppConfig, AppError, AppState, Backend, ErrorResponse, MovieForm};

#[derive(Debug, Parser)]
#[command(name = "moviehub", version, about = "Personal movie catalog")]
struct Cli {
    /// Override MOVIEHUB_BACKEND (local, memory, firebase)
    #[arg(long, global = true)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every movie
    List,
    /// Show one movie
    Show { id: String },
    /// Add a movie
    Add(AddArgs),
    /// Edit a movie; omitted fields keep their current value
    Edit(EditArgs),
    /// Delete a movie (its poster is kept)
    Delete { id: String },
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    director: String,
    #[arg(long)]
    year: String,
    #[arg(long)]
    rating: String,
    #[arg(long, default_value = "")]
    genre: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Local image to upload as the poster
    #[arg(long, conflicts_with = "image_url")]
    poster: Option<String>,
    /// File name for the uploaded poster
    #[arg(long, requires = "poster")]
    poster_name: Option<String>,
    /// Use an already uploaded poster
    #[arg(long)]
    image_url: Option<String>,
}

#[derive(Debug, Args)]
struct EditArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    director: Option<String>,
    #[arg(long)]
    year: Option<String>,
    #[arg(long)]
    rating: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, conflicts_with = "clear_poster")]
    poster: Option<String>,
    #[arg(long, requires = "poster")]
    poster_name: Option<String>,
    /// Remove the poster reference
    #[arg(long)]
    clear_poster: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            let response = match err.downcast::<ErrorResponse>() {
                Ok(response) => response,
                Err(err) => match err.downcast::<AppError>() {
                    Ok(app_error) => ErrorResponse::from_app_error(app_error),
                    Err(other) => ErrorResponse::from_app_error(AppError::Other(format!("{:#}", other))),
                },
            };
            println!("{}", response.to_json());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<String> {
    let mut config = AppConfig::load()?;
    if let Some(backend) = cli.backend {
        if backend != config.backend {
            // Re-read so backend-specific settings are validated
            config = AppConfig::from_lookup(|name| match name {
                "MOVIEHUB_BACKEND" => Some(backend.as_str().to_string()),
                other => std::env::var(other).ok(),
            })?;
        }
    }

    // 1. INFRASTRUCTURE + SERVICES
    let state = AppState::from_config(&config)?;

    // 2. DISPATCH
    let output = match cli.command {
        Command::List => render(&commands::list_movies(&state).await?),
        Command::Show { id } => render(&commands::get_movie(id, &state).await?),
        Command::Add(args) => {
            let dto = SaveMovieDto {
                form: MovieForm {
                    title: args.title,
                    director: args.director,
                    year: args.year,
                    genre: args.genre,
                    rating: args.rating,
                    description: args.description,
                },
                poster: PosterInputDto {
                    path: args.poster,
                    file_name: args.poster_name,
                    existing_url: args.image_url,
                },
            };
            render(&commands::create_movie(dto, &state).await?)
        }
        Command::Edit(args) => {
            let dto = EditMovieDto {
                title: args.title,
                director: args.director,
                year: args.year,
                genre: args.genre,
                rating: args.rating,
                description: args.description,
                poster_path: args.poster,
                poster_file_name: args.poster_name,
                clear_poster: args.clear_poster,
            };
            render(&commands::edit_movie(args.id, dto, &state).await?)
        }
        Command::Delete { id } => render(&commands::delete_movie(id, &state).await?),
    };

    // 3. TRACE what the command emitted
    for entry in state.event_bus.get_event_log() {
        log::debug!(
            "emitted {} {} at {} ({} handlers)",
            entry.event_type,
            entry.event_id,
            entry.occurred_at,
            entry.handler_count
        );
    }

    output
}

fn render<T: Serialize>(value: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(value).context("failed to render output")
}
