use anyhow::Result;
use clap::{Parser, Subcommand};
use relkit::form::MemoryFormStore;
use relkit::notify::LogNotifier;
use relkit::relations::{
    ComboboxController, PublicationState, RelationSearchService, RelationTarget,
    RelationsField, RelationsInput,
};
use relkit::schema::{relation_link, ContentType, RelationKind};
use relkit::{Config, HttpRelationService};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "relkit")]
#[command(about = "Search, list and inspect relation fields of a headless CMS admin")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search candidates for a relation field
    Search {
        /// Content type uid, e.g. api::article.article
        model: String,
        /// Relation attribute name
        field: String,
        /// Id of the record being edited
        #[arg(long)]
        id: String,
        #[arg(short, long, default_value = "")]
        query: String,
        /// Number of result pages to accumulate
        #[arg(long, default_value_t = 1)]
        pages: u32,
        /// Attribute of the related record used as its label
        #[arg(long)]
        main_field: Option<String>,
        #[arg(long, default_value = "manyToMany")]
        kind: RelationKind,
    },
    /// List relations already attached to a record
    List {
        model: String,
        field: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        main_field: Option<String>,
        #[arg(long, default_value = "manyToMany")]
        kind: RelationKind,
        /// Target content type uid; prints an edit link per row
        #[arg(long)]
        target: Option<String>,
    },
    /// Print the value shape of every attribute in a content-type schema file
    Schema { path: PathBuf },
}

fn build_target(model: String, field: String, id: String, main_field: Option<String>) -> RelationTarget {
    let target = RelationTarget::new(model, field, Some(id));
    match main_field {
        Some(main_field) => target.with_main_field(main_field),
        None => target,
    }
}

fn build_service(config: &Config) -> Result<Arc<dyn RelationSearchService>> {
    if config.api_token().is_none() {
        log::warn!(
            "Environment variable {} not set, requests are sent without a token",
            config.api.api_token_env
        );
    }
    Ok(Arc::new(HttpRelationService::from_config(config)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info")).init();

    let args = Args::parse();

    match args.command {
        Command::Search {
            model,
            field,
            id,
            query,
            pages,
            main_field,
            kind,
        } => run_search(build_target(model, field, id, main_field), kind, &query, pages).await?,
        Command::List {
            model,
            field,
            id,
            main_field,
            kind,
            target,
        } => run_list(build_target(model, field, id, main_field), kind, target.as_deref()).await?,
        Command::Schema { path } => run_schema(&path)?,
    }

    Ok(())
}

async fn run_search(target: RelationTarget, kind: RelationKind, query: &str, pages: u32) -> Result<()> {
    let config = Config::load()?;
    let service = build_service(&config)?;

    let controller = ComboboxController::new(
        target,
        kind,
        config.relations.search_page_size,
        config.features,
        Arc::new(LogNotifier),
    );
    // one-shot search, nothing to debounce
    let mut input = RelationsInput::new(controller, service, Duration::ZERO);

    input.search_now(query);
    input.settle().await;
    for _ in 1..pages {
        if !input.load_more() {
            break;
        }
        input.settle().await;
    }

    let controller = input.controller();
    if let Some(err) = controller.error() {
        anyhow::bail!("Search failed: {}", err);
    }

    for view in controller.option_views() {
        let status = view
            .status
            .map(|s: PublicationState| format!("  [{}]", s.label()))
            .unwrap_or_default();
        println!("{:>10}  {}{}", view.id, view.label, status);
    }
    if let Some(pagination) = controller.pagination() {
        log::info!(
            "{} results, page {} of {}",
            controller.options().len(),
            pagination.page,
            pagination.page_count
        );
    }

    Ok(())
}

async fn run_list(target: RelationTarget, kind: RelationKind, target_model: Option<&str>) -> Result<()> {
    let config = Config::load()?;
    let service = build_service(&config)?;

    let mut field = RelationsField::new(target, kind, &config, service, Arc::new(LogNotifier));
    let mut store = MemoryFormStore::new();

    field.load_attached(&mut store).await?;
    while field.has_more_attached() {
        // a server repeating the same page would never run out
        if field.load_more_attached(&mut store).await? == 0 {
            break;
        }
    }

    let list = field.list();
    let rows = list.rows(&store);
    for row in rows {
        let link = target_model
            .map(|model| format!("  {}", relation_link(model, Some(&row.id))))
            .unwrap_or_default();
        println!("{:>3}  {:>10}  {}{}", row.position, row.id, row.display_label, link);
    }

    if let Some(hint) = list.instructions() {
        log::info!("{}", hint);
    }

    let viewport = field.viewport();
    log::info!(
        "{} attached, reorderable: {}, list height: {}px{}",
        rows.len(),
        list.can_reorder(),
        viewport.list_height(rows.len()),
        match viewport.overflow(rows.len(), 0) {
            Some(overflow) => format!(", overflow: {:?}", overflow),
            None => String::new(),
        }
    );

    Ok(())
}

fn run_schema(path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(path)?;
    let content_type = ContentType::from_json(&raw)?;

    println!("{}", content_type.uid);
    for (name, shape) in content_type.value_shapes() {
        let marker = if content_type.attributes[name].is_displayable() {
            ""
        } else {
            "  (hidden in list view)"
        };
        println!("  {:<24} {}{}", name, shape, marker);
    }
    for (name, kind) in content_type.relation_fields() {
        log::info!(
            "{}: {} ({:?}, reorderable: {})",
            name,
            kind,
            kind.cardinality(),
            kind.can_reorder()
        );
    }

    Ok(())
}
