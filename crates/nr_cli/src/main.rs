use clap::Parser;
use nr_app::prelude::*;
use nr_auth::{AuthConfig, IdentityKind, SessionConfig};
use nr_core::{ArticleStore, InferenceModel};
use nr_storage::{clear_articles, seed_articles, StorageConfig, StorageKind};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod duration;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "News reader operator tool", long_about = None)]
pub struct Cli {
    #[arg(long, value_enum, env = "NR_STORAGE", default_value = "memory")]
    storage: StorageKind,
    #[arg(long, env = "NR_AUTH", default_value = "memory")]
    auth: IdentityKind,
    #[arg(long, env = "NR_MODEL", default_value = "remote", help = "Model to use: remote (default) or dummy")]
    model: String,
    #[arg(long, env = "NR_MODEL_URL")]
    model_url: Option<String>,
    #[arg(long, env = "FIREBASE_PROJECT_ID")]
    project_id: Option<String>,
    #[arg(long, env = "FIREBASE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Model request timeout (e.g. 30s, 2m)
    #[arg(long, default_value = "60s")]
    timeout: HumanDuration,
    /// How often live queries poll the hosted store
    #[arg(long, default_value = "5s")]
    poll_interval: HumanDuration,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Insert the sample articles into an empty store
    Seed {
        /// Delete every article first
        #[arg(long)]
        clear: bool,
    },
    /// List articles, newest first
    List {
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
    },
    /// Search titles, subtitles and tags
    Search {
        query: String,
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
    },
    /// Ask the model for recommendations
    Recommend {
        #[arg(long, default_value = "all")]
        category: CategoryFilter,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// Show the summary of an article
    Summarize {
        article_id: String,
        /// Ask the model even when a stored summary exists
        #[arg(long)]
        fresh: bool,
    },
    /// Show the comments of an article
    Comments { article_id: String },
    /// Check that the model endpoint answers
    Health,
}

fn print_article(article: &Article) {
    println!(
        "{:<28} [{:<10}] {} ({}, {}, {} min)",
        article.id,
        article.category.display_name(),
        article.title,
        article.author,
        article.published_at.format("%Y-%m-%d %H:%M"),
        article.read_time
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let storage = StorageConfig {
        kind: cli.storage,
        project_id: cli.project_id.clone(),
        api_key: cli.api_key.clone(),
        poll_interval: cli.poll_interval.0,
    };
    let auth = AuthConfig {
        kind: cli.auth,
        api_key: cli.api_key.clone(),
        session: SessionConfig::default(),
    };
    let inference = nr_inference::Config {
        model_name: Some(cli.model.clone()),
        inference_config: nr_inference::InferenceConfig {
            model_url: cli.model_url.clone(),
            timeout: cli.timeout.0,
        },
    };
    let ctx = AppContext::bootstrap(&storage, &auth, inference).await?;

    if cli.storage == StorageKind::Memory && !matches!(cli.command, Commands::Seed { .. }) {
        // An empty in-process store is of little use to any other command
        seed_articles(ctx.store.as_ref()).await?;
    }

    match cli.command {
        Commands::Seed { clear } => {
            if clear {
                clear_articles(ctx.store.as_ref()).await?;
            }
            let added = seed_articles(ctx.store.as_ref()).await?;
            println!("Seeded {} articles", added);
        }
        Commands::List { category } => {
            let mut home = HomeFeed::new(ctx.clone());
            for article in home.load_articles(category).await? {
                print_article(article);
            }
        }
        Commands::Search { query, category } => {
            let mut view = SearchView::new(ctx.clone());
            view.load().await?;
            let results = view.search(&query, category);
            info!("🔎 {} results for {:?}", results.len(), query);
            for article in results {
                print_article(article);
            }
        }
        Commands::Recommend { category, top_k } => {
            let home_config = HomeConfig {
                recommendation_count: top_k,
                ..HomeConfig::default()
            };
            let mut home = HomeFeed::new(ctx.clone().with_home_config(home_config));
            home.load_articles(category).await?;
            info!("✨ Query: {:?}", home.recommendation_query());
            for article in home.load_recommendations().await? {
                print_article(article);
            }
        }
        Commands::Summarize { article_id, fresh } => {
            let summary = if fresh {
                let article = ctx
                    .store
                    .get_article(&article_id)
                    .await?
                    .ok_or_else(|| Error::not_found(nr_core::storage::ARTICLES, &article_id))?;
                ctx.model
                    .summarize(&article.content, nr_core::SummaryLength::default())
                    .await?
            } else {
                let mut detail = ArticleDetail::open_by_id(ctx.clone(), &article_id).await?;
                detail.summary().await?
            };
            println!("{}", summary);
        }
        Commands::Comments { article_id } => {
            let mut detail = ArticleDetail::open_by_id(ctx.clone(), &article_id).await?;
            let comments = detail.load_comments().await?;
            if comments.is_empty() {
                println!("No comments yet");
            }
            for comment in comments {
                println!(
                    "{} - {}: {}",
                    comment.created_at.format("%Y-%m-%d %H:%M"),
                    comment.user_name,
                    comment.content
                );
            }
        }
        Commands::Health => {
            if ctx.model.health().await? {
                println!("✅ {} model is healthy", ctx.model.name());
            } else {
                println!("❌ {} model is not reachable", ctx.model.name());
            }
        }
    }

    ctx.session.shutdown().await;
    Ok(())
}
