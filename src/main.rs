use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use notehub::app::AppContext;
use notehub::cli::{commands, Cli, Commands};
use notehub::config::Config;
use notehub::domain::{ActorId, InteractionKind, NoteQuery};
use notehub::upload::UploadRequest;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let actor = match cli.user.as_deref() {
        Some(user) => ActorId::new(user),
        None => config.session.actor(),
    };
    let db_path = cli.db.clone().or_else(|| config.storage.database.clone());
    let ctx = AppContext::new(db_path, config.storage.bucket_dir.clone(), actor)?;

    match cli.command {
        Commands::Browse {
            search,
            subject,
            level,
            sort,
            limit,
            page,
            json,
        } => {
            let query = NoteQuery {
                search: search.unwrap_or_default(),
                subject: subject.unwrap_or_default(),
                level: level.unwrap_or_default(),
                sort: sort.unwrap_or(config.browse.sort),
                limit: limit.unwrap_or(config.browse.page_size),
                page,
            };
            commands::browse(&ctx, &query, json)?;
        }
        Commands::Show { id, json } => {
            commands::show(&ctx, &id, json)?;
        }
        Commands::Upload {
            pdf,
            title,
            description,
            subject,
            tags,
            level,
            thumb,
        } => {
            let request = UploadRequest {
                title,
                description,
                subject,
                tags,
                level,
                pdf,
                thumb,
            };
            commands::upload(&ctx, &request).await?;
        }
        Commands::Like { id } => {
            commands::toggle(&ctx, InteractionKind::Like, &id).await?;
        }
        Commands::Bookmark { id } => {
            commands::toggle(&ctx, InteractionKind::Bookmark, &id).await?;
        }
        Commands::Download { id, out } => {
            commands::download(&ctx, &id, out.as_deref()).await?;
        }
        Commands::Preview { id } => {
            commands::preview(&ctx, &id).await?;
        }
        Commands::Profile { limit, json } => {
            commands::profile(&ctx, limit, json)?;
        }
        Commands::Tui => {
            let query = NoteQuery {
                sort: config.browse.sort,
                limit: config.browse.page_size,
                ..Default::default()
            };
            notehub::tui::run(Arc::new(ctx), Arc::new(config), query).await?;
        }
    }

    Ok(())
}
