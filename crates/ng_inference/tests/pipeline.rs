use std::sync::Arc;
use std::time::Duration;

use ng_core::{
    Category, Error, FieldKind, GenerationError, LastFailure, RawArticle, RecordStorage,
};
use ng_inference::models::ScriptedClient;
use ng_inference::{ArticlePipeline, PipelineConfig, RetryPolicy};
use ng_storage::InMemoryStorage;

const BATTERY: &str = "Researchers announce a breakthrough battery chemistry that could triple \
    the range of electric vehicles while cutting charging times to minutes.";

fn config() -> PipelineConfig {
    PipelineConfig {
        retry: RetryPolicy {
            backoff: Duration::ZERO,
            ..RetryPolicy::default()
        },
        ..PipelineConfig::default()
    }
}

fn summary_380() -> String {
    let sentence = "The new cells use a sodium-sulfur design that avoids scarce metals. ";
    let mut summary = sentence.repeat(6);
    summary.truncate(380);
    summary.trim_end().to_string()
}

fn happy_client() -> ScriptedClient {
    ScriptedClient::new()
        .respond(FieldKind::Title, "New Battery Breakthrough Announced")
        .respond(FieldKind::Headline, "Scientists Unveil Next-Gen Battery Chemistry")
        .respond(FieldKind::Summary, summary_380())
        .respond(FieldKind::Category, "TECHNOLOGY")
}

fn pipeline(client: &Arc<ScriptedClient>) -> ArticlePipeline {
    ArticlePipeline::new(client.clone(), config())
}

#[tokio::test]
async fn test_battery_article_first_attempt() {
    let client = Arc::new(happy_client());
    let article = RawArticle::new(BATTERY);

    let record = pipeline(&client).process_article(&article).await.unwrap();

    assert_eq!(record.title, "New Battery Breakthrough Announced");
    assert_eq!(record.headline, "Scientists Unveil Next-Gen Battery Chemistry");
    assert_eq!(record.summary, summary_380());
    assert_eq!(record.category, Category::Technology);
    assert_eq!(record.id, article.fingerprint());
    for kind in FieldKind::ALL {
        assert_eq!(client.calls(kind), 1, "{kind} should not be retried");
    }
}

#[tokio::test]
async fn test_same_body_same_id_even_with_different_text() {
    let article = RawArticle::new(BATTERY);

    let first = pipeline(&Arc::new(happy_client()))
        .process_article(&article)
        .await
        .unwrap();

    let other = Arc::new(
        ScriptedClient::new()
            .respond(FieldKind::Title, "Battery Chemistry Leaps Ahead")
            .respond(FieldKind::Headline, "Charging in minutes")
            .respond(FieldKind::Summary, "Shorter summary.")
            .respond(FieldKind::Category, "SCIENCE"),
    );
    let second = pipeline(&other).process_article(&article).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_ne!(first.title, second.title);
}

#[tokio::test]
async fn test_category_recovers_on_third_attempt() {
    let client = Arc::new(
        ScriptedClient::new()
            .respond(FieldKind::Title, "New Battery Breakthrough Announced")
            .respond(FieldKind::Headline, "Scientists Unveil Next-Gen Battery Chemistry")
            .respond(FieldKind::Summary, summary_380())
            .respond(FieldKind::Category, "SCI-FI")
            .respond(FieldKind::Category, "SCI-FI")
            .respond(FieldKind::Category, "SCIENCE"),
    );

    let record = pipeline(&client)
        .process_article(&RawArticle::new(BATTERY))
        .await
        .unwrap();

    assert_eq!(record.category, Category::Science);
    assert_eq!(client.calls(FieldKind::Category), 3);
    assert_eq!(client.calls(FieldKind::Title), 1);
}

#[tokio::test]
async fn test_over_long_title_never_reaches_record() {
    let long_title = "T".repeat(200);
    let client = Arc::new(
        ScriptedClient::new()
            .respond(FieldKind::Title, long_title.clone())
            .respond(FieldKind::Title, "Fits Now")
            .respond(FieldKind::Headline, "Headline")
            .respond(FieldKind::Summary, "Summary.")
            .respond(FieldKind::Category, "TECHNOLOGY"),
    );

    let record = pipeline(&client)
        .process_article(&RawArticle::new(BATTERY))
        .await
        .unwrap();

    assert_eq!(record.title, "Fits Now");
    assert_ne!(record.title, long_title);
    assert_eq!(client.calls(FieldKind::Title), 2);
}

#[tokio::test]
async fn test_always_over_long_title_exhausts() {
    let client = Arc::new(
        ScriptedClient::new()
            .respond(FieldKind::Title, "T".repeat(200))
            .respond(FieldKind::Headline, "Headline")
            .respond(FieldKind::Summary, "Summary.")
            .respond(FieldKind::Category, "TECHNOLOGY"),
    );

    let err = pipeline(&client)
        .process_article(&RawArticle::new(BATTERY))
        .await
        .unwrap_err();

    let pipeline_error = match err {
        Error::Pipeline(e) => e,
        other => panic!("expected a pipeline error, got {other:?}"),
    };
    assert_eq!(pipeline_error.failed_kinds(), vec![FieldKind::Title]);
    assert_eq!(pipeline_error.failures[0].attempts, 3);
    assert!(pipeline_error.is_retryable());
    assert_eq!(client.calls(FieldKind::Title), 3);
}

#[tokio::test]
async fn test_retry_bound_follows_config() {
    let client = Arc::new(
        ScriptedClient::new()
            .respond(FieldKind::Title, "Title")
            .respond(FieldKind::Headline, "Headline")
            .fail(FieldKind::Summary, GenerationError::Transient("503".into()))
            .respond(FieldKind::Category, "WORLD"),
    );

    let config = PipelineConfig {
        retry: RetryPolicy {
            max_attempts: 5,
            backoff: Duration::ZERO,
            ..RetryPolicy::default()
        },
        ..PipelineConfig::default()
    };
    let err = ArticlePipeline::new(client.clone(), config)
        .process_article(&RawArticle::new(BATTERY))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Pipeline(_)));
    assert_eq!(client.calls(FieldKind::Summary), 5);
}

#[tokio::test]
async fn test_fatal_error_single_call() {
    let client = Arc::new(
        ScriptedClient::new()
            .respond(FieldKind::Title, "Title")
            .respond(FieldKind::Headline, "Headline")
            .respond(FieldKind::Summary, "Summary.")
            .fail(FieldKind::Category, GenerationError::Fatal("quota exhausted".into())),
    );

    let err = pipeline(&client)
        .process_article(&RawArticle::new(BATTERY))
        .await
        .unwrap_err();

    let pipeline_error = match err {
        Error::Pipeline(e) => e,
        other => panic!("expected a pipeline error, got {other:?}"),
    };
    let failure = &pipeline_error.failures[0];
    assert_eq!(failure.kind, FieldKind::Category);
    assert_eq!(failure.attempts, 1);
    assert!(matches!(
        failure.last_failure,
        LastFailure::Generation(GenerationError::Fatal(_))
    ));
    assert!(!pipeline_error.is_retryable());
    assert_eq!(client.calls(FieldKind::Category), 1);
}

#[tokio::test]
async fn test_exhaustion_abandons_slow_fields() {
    let client = Arc::new(
        ScriptedClient::new()
            .respond(FieldKind::Title, "Title")
            .with_latency(FieldKind::Title, Duration::from_secs(5))
            .respond(FieldKind::Headline, "Headline")
            .respond(FieldKind::Summary, "Summary.")
            .fail(FieldKind::Category, GenerationError::Fatal("unauthorized".into())),
    );

    let started = std::time::Instant::now();
    let err = pipeline(&client)
        .process_article(&RawArticle::new(BATTERY))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Pipeline(_)));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_empty_body_makes_no_calls() {
    let client = Arc::new(happy_client());
    let err = pipeline(&client)
        .process_article(&RawArticle::new("   \n"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(client.total_calls(), 0);
}

#[tokio::test]
async fn test_optional_metadata_is_copied() {
    let client = Arc::new(happy_client());
    let article = RawArticle::new(BATTERY)
        .with_photo_credit("Photo: Lab Archive")
        .with_image("https://cdn.example/battery.png");

    let record = pipeline(&client).process_article(&article).await.unwrap();

    assert_eq!(record.photo_credit.as_deref(), Some("Photo: Lab Archive"));
    assert_eq!(record.image.as_deref(), Some("https://cdn.example/battery.png"));
    assert_eq!(record.slug(), "new-battery-breakthrough-announced");
}

#[tokio::test]
async fn test_process_and_store_is_idempotent() {
    let storage = InMemoryStorage::new();
    let article = RawArticle::new(BATTERY);

    let first = pipeline(&Arc::new(happy_client()))
        .process_and_store(&article, &storage)
        .await
        .unwrap();
    let second = pipeline(&Arc::new(happy_client()))
        .process_and_store(&article, &storage)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(storage.list_recent(10).await.unwrap().len(), 1);
    let stored = storage.get(&first).await.unwrap().unwrap();
    assert_eq!(stored.category, Category::Technology);
}

#[tokio::test]
async fn test_batch_keeps_input_order() {
    let client = Arc::new(happy_client());
    let articles = vec![
        RawArticle::new("First article body."),
        RawArticle::new(""),
        RawArticle::new("Third article body."),
    ];

    let results = pipeline(&client).process_batch(&articles, 2).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().id, articles[0].fingerprint());
    assert!(matches!(results[1], Err(Error::InvalidInput(_))));
    assert_eq!(results[2].as_ref().unwrap().id, articles[2].fingerprint());
}
