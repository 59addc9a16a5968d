//! CLI Command Handlers
//!
//! Each handler builds the matching view-model from the catalog, waits for
//! it to settle and prints the result. Handlers take CLI args and Output,
//! return ExitCode.

use crate::catalog::Catalog;
use crate::cli::{
    EpisodesCmd, ExitCode, GenresCmd, IdCmd, Output, PageCmd, SearchCmd, SearchSort, TopCmd,
};
use crate::models::SHOW_GENRES;
use crate::net::NetworkError;
use crate::reactive::Signal;
use crate::views::{GenreBucketOptions, TopRatedOptions};

/// Report a failed request and map it to an exit code
fn request_failed(what: &str, err: &NetworkError, output: &Output) -> ExitCode {
    output.error(format!("{} failed: {}", what, err), ExitCode::for_error(err))
}

fn printed(result: anyhow::Result<()>, output: &Output) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("Failed to serialize: {}", e), ExitCode::Error),
    }
}

fn truncated<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

// =============================================================================
// Search Command
// =============================================================================

pub async fn search_cmd(cmd: SearchCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    if cmd.query.trim().is_empty() {
        return output.error("Search query is empty", ExitCode::InvalidArgs);
    }
    output.info(format!("Searching for: {}", cmd.query));

    let view = catalog.search(cmd.query.as_str());
    view.run(None).await;

    if let Some(err) = view.error().get() {
        return request_failed("Search", &err, output);
    }

    let hits = match cmd.sort {
        SearchSort::Score => view.sorted_by_score(),
        SearchSort::Rating => {
            let mut hits = view.results();
            hits.sort_by(|a, b| b.show.score().total_cmp(&a.show.score()));
            hits
        }
        SearchSort::Api => view.results(),
    };
    printed(output.print_list(&truncated(hits, Some(cmd.limit))), output)
}

// =============================================================================
// Show / Cast / Crew / Seasons
// =============================================================================

pub async fn show_cmd(cmd: IdCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    let view = catalog.show(Signal::new(Some(cmd.id)));
    view.settled().await;

    if let Some(err) = view.error().get() {
        return request_failed("Show lookup", &err, output);
    }
    match view.show() {
        Some(show) if output.json => printed(output.print(&show), output),
        Some(show) => {
            println!("{}", show);
            if let Some(channel) = show.channel_name() {
                println!("Network: {}", channel);
            }
            if !show.genres.is_empty() {
                println!("Genres: {}", show.genres.join(", "));
            }
            println!("Status: {}", show.status);
            ExitCode::Success
        }
        None => output.error(format!("Show {} not found", cmd.id), ExitCode::NotFound),
    }
}

pub async fn cast_cmd(cmd: IdCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    let view = catalog.cast(Signal::new(Some(cmd.id)));
    view.settled().await;

    if let Some(err) = view.error().get() {
        return request_failed("Cast lookup", &err, output);
    }
    printed(output.print_list(&truncated(view.items(), cmd.limit)), output)
}

pub async fn crew_cmd(cmd: IdCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    let view = catalog.crew(Signal::new(Some(cmd.id)));
    view.settled().await;

    if let Some(err) = view.error().get() {
        return request_failed("Crew lookup", &err, output);
    }
    printed(output.print_list(&truncated(view.items(), cmd.limit)), output)
}

pub async fn seasons_cmd(cmd: IdCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    let view = catalog.seasons(Signal::new(Some(cmd.id)));
    view.settled().await;

    if let Some(err) = view.error().get() {
        return request_failed("Seasons lookup", &err, output);
    }
    printed(output.print_list(&truncated(view.items(), cmd.limit)), output)
}

// =============================================================================
// Episodes Command
// =============================================================================

pub async fn episodes_cmd(cmd: EpisodesCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    let view = match (cmd.season_id, cmd.id) {
        (Some(season_id), _) => catalog.season_episodes(Signal::new(Some(season_id))),
        (None, Some(id)) => catalog.episodes(Signal::new(Some(id))),
        (None, None) => {
            return output.error("A show id or --season-id is required", ExitCode::InvalidArgs)
        }
    };
    view.settled().await;

    if let Some(err) = view.error().get() {
        return request_failed("Episodes lookup", &err, output);
    }

    let mut episodes = view.items();
    if let Some(season) = cmd.season {
        episodes.retain(|e| e.season == season);
    }
    printed(output.print_list(&episodes), output)
}

// =============================================================================
// Index Commands
// =============================================================================

pub async fn page_cmd(cmd: PageCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    output.info(format!("Fetching index page {}...", cmd.page));

    let page = catalog.shows_page(cmd.page);
    page.settled().await;

    if let Some(err) = page.error().get() {
        return request_failed("Index page", &err, output);
    }
    let shows = truncated(page.shows().to_vec(), cmd.limit);
    printed(output.print_list(&shows), output)
}

/// Canonical spelling of a known genre, matched case-insensitively
fn known_genre(name: &str) -> Option<&'static str> {
    SHOW_GENRES
        .iter()
        .copied()
        .find(|g| g.eq_ignore_ascii_case(name))
}

pub async fn genres_cmd(cmd: GenresCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    let genres: Vec<String> = if cmd.genres.is_empty() {
        SHOW_GENRES.iter().map(|g| g.to_string()).collect()
    } else {
        let mut genres = Vec::with_capacity(cmd.genres.len());
        for name in &cmd.genres {
            match known_genre(name) {
                Some(genre) => genres.push(genre.to_string()),
                None => {
                    return output.error(
                        format!("Unknown genre: {} (see `showdeck genre-list`)", name),
                        ExitCode::InvalidArgs,
                    )
                }
            }
        }
        genres
    };

    let defaults = catalog.settings().genres;
    let options = GenreBucketOptions {
        pages_to_scan: cmd.pages.unwrap_or(defaults.pages_to_scan),
        per_genre_limit: cmd.limit.unwrap_or(defaults.per_genre_limit),
        min_rating: cmd.min_rating.unwrap_or(defaults.min_rating),
    };
    output.info(format!("Scanning {} index pages...", options.pages_to_scan));

    let view = catalog.genre_buckets_with(genres, options);
    view.settled().await;

    if let Some(err) = view.error().get() {
        return request_failed("Index scan", &err, output);
    }

    let buckets = view.buckets().get();
    if output.json {
        return printed(output.print(&buckets), output);
    }
    for (genre, shows) in buckets.iter() {
        if shows.is_empty() && output.quiet {
            continue;
        }
        println!("{}:", genre);
        for show in shows {
            println!("  {}", show);
        }
    }
    ExitCode::Success
}

pub async fn top_cmd(cmd: TopCmd, catalog: &Catalog, output: &Output) -> ExitCode {
    output.info(format!("Scanning {} index pages...", cmd.pages));

    let view = catalog.top_rated(TopRatedOptions {
        limit: cmd.limit,
        pages_to_scan: cmd.pages,
    });
    view.settled().await;

    if let Some(err) = view.error().get() {
        return request_failed("Index scan", &err, output);
    }
    printed(output.print_list(&view.items().get()), output)
}

pub fn genre_list_cmd(output: &Output) -> ExitCode {
    printed(output.print_list(SHOW_GENRES), output)
}
