use std::sync::Arc;

use nr_app::prelude::*;
use nr_auth::backends::memory::MemoryIdentity;
use nr_auth::{Session, SessionConfig};
use nr_core::{ArticleStore, AuthError, DocumentStore};
use nr_inference::models::DummyModel;
use nr_storage::backends::memory::MemoryStorage;
use nr_storage::seed_articles;

async fn app() -> (AppContext, Arc<MemoryIdentity>) {
    let store = Arc::new(MemoryStorage::new());
    seed_articles(store.as_ref()).await.unwrap();
    let identity = Arc::new(MemoryIdentity::new());
    let store: Arc<dyn DocumentStore> = store;
    let session = Session::start(identity.clone(), store, SessionConfig::default());
    session.ready().await.unwrap();
    let model = Arc::new(DummyModel::new(None).await.unwrap());
    (AppContext::new(Arc::new(session), model), identity)
}

#[tokio::test]
async fn test_register_browse_save_and_change_password() {
    let (ctx, identity) = app().await;

    let form = RegistrationForm {
        name: "Ann".to_string(),
        email: "ann@example.com".to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
    };
    let user = form.submit(&ctx.session).await.unwrap();
    assert_eq!(identity.account_count().await, 1);
    assert_eq!(user.name, "Ann");

    // The dummy model recommends nothing, so the feed falls back to recent articles
    let mut home = HomeFeed::new(ctx.clone());
    home.load_articles(CategoryFilter::All).await.unwrap();
    let recommended = home.load_recommendations().await.unwrap().to_vec();
    assert_eq!(recommended.len(), 5);

    let mut detail = ArticleDetail::open(ctx.clone(), recommended[2].clone())
        .await
        .unwrap();
    assert!(detail.toggle_save().await.unwrap());

    let mut saved = SavedArticles::new(ctx.clone());
    let ids: Vec<String> = saved.load().await.unwrap().iter().map(|a| a.id.clone()).collect();
    assert_eq!(ids, vec![recommended[2].id.clone()]);

    let change = PasswordChangeForm {
        current_password: "secret1".to_string(),
        new_password: "secret2".to_string(),
        confirm_password: "secret2".to_string(),
    };
    change.submit(&ctx.session).await.unwrap();

    ctx.session.logout().await.unwrap();
    let login = LoginForm {
        email: "ann@example.com".to_string(),
        password: "secret2".to_string(),
    };
    let again = login.submit(&ctx.session).await.unwrap();
    assert_eq!(again.id, user.id);
    assert_eq!(again.saved_articles, ids);
}

#[tokio::test]
async fn test_invalid_forms_never_reach_the_provider() {
    let (ctx, identity) = app().await;
    let form = RegistrationForm {
        name: "Ann".to_string(),
        email: "ann@example.com".to_string(),
        password: "123".to_string(),
        confirm_password: "123".to_string(),
    };
    assert!(matches!(form.submit(&ctx.session).await, Err(Error::Validation(_))));
    assert_eq!(identity.account_count().await, 0);
}

#[tokio::test]
async fn test_google_account_cannot_change_password() {
    let (ctx, identity) = app().await;
    identity
        .register_google_token("google-token", "g@mail.com", Some("Gina"))
        .await;
    let user = ctx.session.login_with_google("google-token").await.unwrap();
    assert_eq!(user.name, "Gina");

    let change = PasswordChangeForm {
        current_password: "whatever".to_string(),
        new_password: "secret2".to_string(),
        confirm_password: "secret2".to_string(),
    };
    assert!(matches!(
        change.submit(&ctx.session).await,
        Err(Error::Auth(AuthError::NoPasswordProvider))
    ));
}

#[tokio::test]
async fn test_summary_on_demand_with_offline_model() {
    let (ctx, _) = app().await;
    let mut article = ctx.store.list_articles().await.unwrap().remove(0);
    article.ai_summary = None;
    let mut detail = ArticleDetail::open(ctx, article).await.unwrap();
    let summary = detail.summary().await.unwrap();
    assert!(!summary.is_empty());
    assert!(!summary.contains("<p>"));
}
