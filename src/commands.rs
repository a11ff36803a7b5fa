//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the catalog client and the
//! collection store. Each handler takes CLI args, the shared context and
//! Output, and returns an ExitCode.

use anyhow::Result;
use chrono::Local;
use tracing::error;

use crate::api::{CatalogOp, TmdbClient, TmdbError};
use crate::cli::{
    ConfigAction, ExitCode, GenresCmd, InfoCmd, MediaTypeFilter, MutationResult, Output,
    PopularCmd, SavedAction, SavedAddCmd, SearchCmd, StatusOk, TitleRef, TopRatedCmd,
    WatchedAction, WatchedAddCmd, WatchedEditCmd, WatchedListCmd,
};
use crate::config::Config;
use crate::models::{
    sort_watched, Identity, MediaType, SavedItem, TopRatedQuery, WatchedItem, WatchedSort,
};
use crate::store::{CollectionStore, KeyValueStore, StoreError};

/// Everything a command may need, built once at startup
pub struct Context<S> {
    pub config: Config,
    pub config_path: Option<std::path::PathBuf>,
    pub store: CollectionStore<S>,
}

impl<S: KeyValueStore> Context<S> {
    pub fn new(config: Config, store: CollectionStore<S>) -> Self {
        Self {
            config,
            config_path: None,
            store,
        }
    }

    /// Catalog client from the configured credentials
    pub fn catalog(&self) -> Result<TmdbClient> {
        let credentials = self.config.credentials()?;
        Ok(TmdbClient::with_base_url(credentials, self.config.base_url())
            .with_language(self.config.language()))
    }
}

/// Report a catalog failure: details to the log, generic message to the user
fn catalog_error(output: &Output, op: CatalogOp, err: TmdbError) -> ExitCode {
    error!(?op, error = %err, "catalog request failed");
    let code = match err {
        TmdbError::NotFound => ExitCode::NotFound,
        TmdbError::InvalidQuery(_) => ExitCode::InvalidArgs,
        _ => ExitCode::NetworkError,
    };
    output.error(err.user_message(op), code)
}

/// User-facing message for any failed store mutation
pub const STORAGE_ERROR_MESSAGE: &str = "No se pudo guardar el cambio";

/// Report a failed store write: details to the log, generic message to the user
fn storage_error(output: &Output, err: StoreError) -> ExitCode {
    error!(error = %err, "collection write failed");
    output.error(STORAGE_ERROR_MESSAGE, ExitCode::StorageError)
}

fn not_watched(output: &Output, identity: Identity) -> ExitCode {
    output.error(
        format!("{} no está en la lista de vistas", identity),
        ExitCode::NotFound,
    )
}

fn print_or_fail(output: &Output, result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Success,
        Err(e) => output.error(format!("No se pudo generar la salida: {}", e), ExitCode::Error),
    }
}

/// Build the catalog client or bail out with InvalidArgs
macro_rules! catalog_or_return {
    ($ctx:expr, $output:expr) => {
        match $ctx.catalog() {
            Ok(client) => client,
            Err(e) => return $output.error(e.to_string(), ExitCode::InvalidArgs),
        }
    };
}

// =============================================================================
// Catalog Commands
// =============================================================================

pub async fn search_cmd<S: KeyValueStore>(
    cmd: SearchCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let client = catalog_or_return!(ctx, output);
    output.info(format!("Buscando: {}", cmd.query));

    match cmd.media_type {
        MediaTypeFilter::Movie => match client.search_movies(&cmd.query, cmd.page).await {
            Ok(mut page) => {
                page.results.truncate(cmd.limit);
                print_or_fail(output, output.print_list(&page.results))
            }
            Err(e) => catalog_error(output, CatalogOp::SearchMovies, e),
        },
        MediaTypeFilter::Tv => match client.search_tv(&cmd.query, cmd.page).await {
            Ok(mut page) => {
                page.results.truncate(cmd.limit);
                print_or_fail(output, output.print_list(&page.results))
            }
            Err(e) => catalog_error(output, CatalogOp::SearchTv, e),
        },
    }
}

pub async fn popular_cmd<S: KeyValueStore>(
    cmd: PopularCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let client = catalog_or_return!(ctx, output);

    match cmd.media_type {
        MediaTypeFilter::Movie => match client.popular_movies(cmd.page).await {
            Ok(page) => print_or_fail(output, output.print_list(&page.results)),
            Err(e) => catalog_error(output, CatalogOp::PopularMovies, e),
        },
        MediaTypeFilter::Tv => match client.popular_tv(cmd.page).await {
            Ok(page) => print_or_fail(output, output.print_list(&page.results)),
            Err(e) => catalog_error(output, CatalogOp::PopularTv, e),
        },
    }
}

pub async fn info_cmd<S: KeyValueStore>(
    cmd: InfoCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let client = catalog_or_return!(ctx, output);
    let id = cmd.title.id;
    output.info(format!("Cargando detalles de {}", cmd.title.identity()));

    match cmd.title.media_type {
        MediaTypeFilter::Movie => match client.movie_details(id).await {
            Ok(detail) => print_or_fail(output, output.print_item(&detail)),
            Err(e) => catalog_error(output, CatalogOp::MovieDetails, e),
        },
        MediaTypeFilter::Tv => match client.tv_details(id).await {
            Ok(detail) => print_or_fail(output, output.print_item(&detail)),
            Err(e) => catalog_error(output, CatalogOp::TvDetails, e),
        },
    }
}

pub async fn top_rated_cmd<S: KeyValueStore>(
    cmd: TopRatedCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let mut query = TopRatedQuery::new(cmd.year, cmd.count);
    if let Some(country) = cmd.country {
        query = query.with_country(country.to_uppercase());
    }
    if let Err(e) = query.validate() {
        return output.error(e.to_string(), ExitCode::InvalidArgs);
    }

    let client = catalog_or_return!(ctx, output);
    output.info(format!("Calculando las {} mejores de {}...", query.count, query.year));

    match cmd.media_type {
        MediaTypeFilter::Movie => match client.top_rated_movies(&query).await {
            Ok(movies) => print_or_fail(output, output.print_list(&movies)),
            Err(e) => catalog_error(output, CatalogOp::TopRated, e),
        },
        MediaTypeFilter::Tv => match client.top_rated_tv(&query).await {
            Ok(shows) => print_or_fail(output, output.print_list(&shows)),
            Err(e) => catalog_error(output, CatalogOp::TopRated, e),
        },
    }
}

pub async fn countries_cmd<S: KeyValueStore>(ctx: &Context<S>, output: &Output) -> ExitCode {
    let client = catalog_or_return!(ctx, output);
    match client.countries().await {
        Ok(countries) => print_or_fail(output, output.print_list(&countries)),
        Err(e) => catalog_error(output, CatalogOp::Countries, e),
    }
}

pub async fn genres_cmd<S: KeyValueStore>(
    cmd: GenresCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let client = catalog_or_return!(ctx, output);
    let result = match cmd.media_type {
        MediaTypeFilter::Movie => client.movie_genres().await,
        MediaTypeFilter::Tv => client.tv_genres().await,
    };
    match result {
        Ok(genres) => print_or_fail(output, output.print_list(&genres)),
        Err(e) => catalog_error(output, CatalogOp::Genres, e),
    }
}

/// Title and poster of a catalog entry
async fn fetch_title(
    client: &TmdbClient,
    identity: Identity,
) -> Result<(String, Option<String>), (CatalogOp, TmdbError)> {
    match identity.media_type {
        MediaType::Movie => client
            .movie_details(identity.id)
            .await
            .map(|d| (d.title, d.poster_path))
            .map_err(|e| (CatalogOp::MovieDetails, e)),
        MediaType::Tv => client
            .tv_details(identity.id)
            .await
            .map(|d| (d.name, d.poster_path))
            .map_err(|e| (CatalogOp::TvDetails, e)),
    }
}

/// Use the given title, or look it up in the catalog
macro_rules! resolve_title_or_return {
    ($ctx:expr, $output:expr, $identity:expr, $title:expr, $poster:expr) => {
        match $title {
            Some(title) => (title, $poster),
            None => {
                let client = catalog_or_return!($ctx, $output);
                match fetch_title(&client, $identity).await {
                    Ok(found) => found,
                    Err((op, e)) => return catalog_error($output, op, e),
                }
            }
        }
    };
}

// =============================================================================
// Watched Commands
// =============================================================================

pub async fn watched_cmd<S: KeyValueStore>(
    action: WatchedAction,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    match action {
        WatchedAction::List(cmd) => watched_list(cmd, ctx, output).await,
        WatchedAction::Get(title_ref) => watched_get(title_ref, ctx, output).await,
        WatchedAction::Add(cmd) => watched_add(cmd, ctx, output).await,
        WatchedAction::Edit(cmd) => watched_edit(cmd, ctx, output).await,
        WatchedAction::Remove(title_ref) => {
            let identity = title_ref.identity();
            match ctx.store.remove_watched(identity).await {
                Ok(()) => print_or_fail(output, output.print(MutationResult::new(identity, true))),
                Err(e) => storage_error(output, e),
            }
        }
        WatchedAction::Stats => {
            let stats = ctx.store.watched_stats().await;
            print_or_fail(output, output.print(stats))
        }
    }
}

async fn watched_list<S: KeyValueStore>(
    cmd: WatchedListCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let mut items = ctx.store.list_watched().await;
    if let Some(filter) = cmd.media_type {
        let media_type = MediaType::from(filter);
        items.retain(|i| i.media_type == media_type);
    }
    sort_watched(&mut items, WatchedSort::from(cmd.sort));
    print_or_fail(output, output.print_list(&items))
}

async fn watched_get<S: KeyValueStore>(
    title_ref: TitleRef,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let identity = title_ref.identity();
    match ctx.store.get_watched(identity).await {
        Some(item) => print_or_fail(output, output.print_item(&item)),
        None => not_watched(output, identity),
    }
}

async fn watched_add<S: KeyValueStore>(
    cmd: WatchedAddCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let identity = cmd.title_ref.identity();
    let (title, poster_path) =
        resolve_title_or_return!(ctx, output, identity, cmd.title, cmd.poster);

    let item = WatchedItem {
        id: identity.id,
        media_type: identity.media_type,
        title,
        poster_path,
        rating: cmd.rating,
        review: cmd.review.filter(|r| !r.trim().is_empty()),
        watched_date: cmd.date.unwrap_or_else(|| Local::now().date_naive()),
    };

    match ctx.store.mark_watched(item).await {
        Ok(identity) => {
            output.info(format!("{} marcada como vista", identity));
            print_or_fail(output, output.print(MutationResult::new(identity, true)))
        }
        Err(e) => storage_error(output, e),
    }
}

async fn watched_edit<S: KeyValueStore>(
    cmd: WatchedEditCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    if !cmd.has_changes() {
        return output.error(
            "Nada que cambiar: usa --rating, --review, --clear-review o --date",
            ExitCode::InvalidArgs,
        );
    }

    let identity = cmd.title_ref.identity();
    let Some(mut item) = ctx.store.get_watched(identity).await else {
        return not_watched(output, identity);
    };

    if let Some(rating) = cmd.rating {
        item.rating = rating;
    }
    if cmd.clear_review {
        item.review = None;
    } else if let Some(review) = cmd.review {
        item.review = Some(review);
    }
    if let Some(date) = cmd.date {
        item.watched_date = date;
    }

    match ctx.store.update_watched(item).await {
        Ok(true) => print_or_fail(output, output.print(MutationResult::new(identity, true))),
        // Removed between the read and the write
        Ok(false) => not_watched(output, identity),
        Err(e) => storage_error(output, e),
    }
}

// =============================================================================
// Saved Commands
// =============================================================================

pub async fn saved_cmd<S: KeyValueStore>(
    action: SavedAction,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    match action {
        SavedAction::List => {
            let items = ctx.store.list_saved().await;
            print_or_fail(output, output.print_list(&items))
        }
        SavedAction::Add(cmd) => saved_add(cmd, ctx, output).await,
        SavedAction::Remove(title_ref) => {
            let identity = title_ref.identity();
            match ctx.store.remove_saved(identity).await {
                Ok(()) => print_or_fail(output, output.print(MutationResult::new(identity, true))),
                Err(e) => storage_error(output, e),
            }
        }
        SavedAction::Clear => match ctx.store.clear_saved().await {
            Ok(()) => print_or_fail(output, output.print(StatusOk::default())),
            Err(e) => storage_error(output, e),
        },
    }
}

async fn saved_add<S: KeyValueStore>(
    cmd: SavedAddCmd,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    let identity = cmd.title_ref.identity();
    let (title, poster_path) =
        resolve_title_or_return!(ctx, output, identity, cmd.title, cmd.poster);

    let item = SavedItem {
        id: identity.id,
        media_type: identity.media_type,
        title,
        poster_path,
    };

    match ctx.store.add_saved(item).await {
        Ok(added) => {
            if !added {
                output.info(format!("{} ya estaba guardada", identity));
            }
            print_or_fail(output, output.print(MutationResult::new(identity, added)))
        }
        Err(e) => storage_error(output, e),
    }
}

// =============================================================================
// Config Commands
// =============================================================================

pub async fn config_cmd<S: KeyValueStore>(
    action: ConfigAction,
    ctx: &Context<S>,
    output: &Output,
) -> ExitCode {
    match action {
        ConfigAction::Show => print_or_fail(output, output.print(ctx.config.masked())),
        ConfigAction::SetKey { key } => {
            let mut config = match Config::load(ctx.config_path.as_deref()) {
                Ok(c) => c,
                Err(e) => return output.error(e.to_string(), ExitCode::Error),
            };
            config.tmdb_api_key = Some(key);
            save_config(&config, ctx, output)
        }
        ConfigAction::SetToken { token } => {
            let mut config = match Config::load(ctx.config_path.as_deref()) {
                Ok(c) => c,
                Err(e) => return output.error(e.to_string(), ExitCode::Error),
            };
            config.tmdb_access_token = Some(token);
            save_config(&config, ctx, output)
        }
    }
}

fn save_config<S>(config: &Config, ctx: &Context<S>, output: &Output) -> ExitCode {
    match config.save(ctx.config_path.as_deref()) {
        Ok(path) => {
            output.info(format!("Configuración guardada en {}", path.display()));
            print_or_fail(output, output.print(StatusOk::default()))
        }
        Err(e) => output.error(format!("No se pudo guardar la configuración: {}", e), ExitCode::Error),
    }
}
