use chrono::{TimeZone, Utc};
use nr_core::{ArticleStore, Category, NewArticle, Result};
use tracing::{info, warn};

#[allow(clippy::too_many_arguments)]
fn sample(
    title: &str,
    subtitle: &str,
    paragraphs: &[&str],
    summary: &str,
    author: &str,
    category: Category,
    image: &str,
    published: (u32, u32, u32),
    read_time: u32,
    tags: &[&str],
    views: u64,
) -> NewArticle {
    let (day, hour, minute) = published;
    NewArticle {
        title: title.to_string(),
        subtitle: subtitle.to_string(),
        content: paragraphs
            .iter()
            .map(|p| format!("<p>{}</p>", p))
            .collect::<Vec<_>>()
            .join("\n\n"),
        ai_summary: Some(summary.to_string()),
        author: author.to_string(),
        author_avatar: None,
        category,
        image_url: format!("https://images.unsplash.com/{}?w=800&q=80", image),
        published_at: Utc.with_ymd_and_hms(2024, 1, day, hour, minute, 0).single(),
        read_time,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        views: Some(views),
    }
}

/// The demo catalogue inserted into an empty store.
pub fn sample_articles() -> Vec<NewArticle> {
    vec![
        sample(
            "New breakthrough in artificial intelligence",
            "Researchers unveil a model that understands complex context",
            &[
                "Scientists at a leading institute of technology have announced a new artificial intelligence model able to process and understand complex context with unprecedented accuracy.",
                "The model, named ContextAI, combines an advanced transformer architecture with deep learning techniques to analyse not only text but its social, cultural and historical setting.",
                "Applications range from better virtual assistants and machine translation to medical diagnosis support and complex data analysis.",
            ],
            "Scientists unveiled ContextAI, a model that understands complex context with high accuracy, with uses from virtual assistants to healthcare.",
            "Mai Tran",
            Category::Technology,
            "photo-1677442136019-21780ecad995",
            (20, 10, 0),
            5,
            &["AI", "Technology", "Research"],
            15420,
        ),
        sample(
            "Stock market reaches a record high",
            "The index crosses 1,300 points for the first time",
            &[
                "The stock market reached a historic milestone this morning as the main index crossed 1,300 points, driven by strong foreign inflows and a positive economic outlook.",
                "Banking, real estate and technology led the gains, with more than 25 trillion in turnover.",
                "Analysts expect the momentum to continue in the short term but advise investors to stay cautious and diversify.",
            ],
            "The index crossed 1,300 points for the first time on strong foreign inflows, with broad gains across sectors.",
            "Anh Pham",
            Category::Business,
            "photo-1611974789855-9c2a0a7236a3",
            (20, 9, 30),
            4,
            &["Stocks", "Economy", "Investment"],
            23150,
        ),
        sample(
            "National team wins an impressive friendly",
            "A 3-0 victory over a higher-ranked opponent",
            &[
                "The national football team delivered an impressive 3-0 win over a higher-ranked side in last night's international friendly.",
                "Young players shone, with two goals from the striker and one from midfield.",
                "The result lifts the team five places in the world rankings ahead of the qualifiers.",
            ],
            "The national team won 3-0 in an international friendly thanks to its young players and climbed five places in the rankings.",
            "Tuan Hoang",
            Category::Sports,
            "photo-1579952363873-27f3bade9f55",
            (19, 22, 0),
            3,
            &["Football", "National team", "Sports"],
            45230,
        ),
        sample(
            "New discoveries about the universe from the James Webb telescope",
            "Galaxies formed 200 million years earlier than expected",
            &[
                "The James Webb Space Telescope has returned data showing that galaxies formed much earlier than scientists believed.",
                "According to a study published in Nature, these galaxies existed only 200 million years after the Big Bang.",
                "Their structure is more complex than expected, raising new questions about how quickly the early universe evolved.",
            ],
            "James Webb observed galaxies that formed only 200 million years after the Big Bang, reshaping models of galaxy formation.",
            "Lan Do",
            Category::Science,
            "photo-1614728894747-a83421e2b9c9",
            (19, 15, 0),
            6,
            &["Universe", "Science", "Astronomy"],
            18750,
        ),
        sample(
            "Promising results for a new cancer vaccine",
            "Clinical trials show a 72% response rate",
            &[
                "A therapeutic cancer vaccine has shown promising results in clinical trials, with 72% of patients responding positively.",
                "The vaccine uses mRNA technology and is personalised to the genetic profile of each patient's tumour.",
                "The trial focused on skin, lung and colorectal cancers and reported fewer side effects than chemotherapy.",
            ],
            "An mRNA cancer vaccine personalised to each tumour produced a 72% response rate in clinical trials.",
            "Khoa Le",
            Category::Health,
            "photo-1576091160399-112ba8d25d1d",
            (19, 11, 0),
            5,
            &["Health", "Cancer", "Vaccine"],
            31200,
        ),
    ]
}

/// Inserts the sample catalogue when the store holds no articles yet.
/// Returns how many articles were added.
pub async fn seed_articles<S: ArticleStore + ?Sized>(store: &S) -> Result<usize> {
    info!("🌱 Seeding articles");
    if !store.list_articles().await?.is_empty() {
        warn!("⚠️ Articles already exist, skipping seed");
        return Ok(0);
    }

    let articles = sample_articles();
    let total = articles.len();
    for (i, article) in articles.into_iter().enumerate() {
        let title = article.title.clone();
        store.create_article(article).await?;
        info!("✅ Added article {}/{}: {}", i + 1, total, title);
    }
    info!("🎉 Seeded {} articles", total);
    Ok(total)
}

/// Removes every article. Returns how many were deleted.
pub async fn clear_articles<S: ArticleStore + ?Sized>(store: &S) -> Result<usize> {
    let articles = store.list_articles().await?;
    for article in &articles {
        store.delete_article(&article.id).await?;
    }
    info!("🗑️ Cleared {} articles", articles.len());
    Ok(articles.len())
}
