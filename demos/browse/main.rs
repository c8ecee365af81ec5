//! Browse a seeded in-memory marketplace
//!
//! Run with: `cargo run --example browse`
//! Set `RUST_LOG=market=debug` to watch the engine's transitions.

use market::prelude::*;
use market::telemetry::init_tracing;

fn seed(store: &InMemoryListingStore, seller: UserId) -> Result<Vec<Listing>> {
    let rows = [
        (
            "Calculus: Early Transcendentals",
            "8th edition, some highlighting",
            150_000,
            Category::Textbook,
            Condition::Good,
        ),
        (
            "Organic Chemistry",
            "Clayden, like new",
            500_000,
            Category::Textbook,
            Condition::LikeNew,
        ),
        (
            "Linear Algebra Done Right",
            "",
            90_000,
            Category::Textbook,
            Condition::Fair,
        ),
        (
            "Casio FX-570 calculator",
            "Casio scientific calculator",
            120_000,
            Category::Electronics,
            Condition::Good,
        ),
        (
            "IKEA desk",
            "Pick up at dorm B",
            300_000,
            Category::Furniture,
            Condition::Good,
        ),
        (
            "Rice cooker",
            "",
            200_000,
            Category::Household,
            Condition::New,
        ),
    ];

    let mut created = Vec::new();
    for (title, description, price, category, condition) in rows {
        created.push(store.insert(Listing::new(
            seller,
            title,
            description,
            price,
            category,
            condition,
        ))?);
    }
    Ok(created)
}

fn print_snapshot(label: &str, engine: &ListingQueryEngine) {
    let snapshot = engine.snapshot();
    println!(
        "\n== {} (page {}, more: {}) ==",
        label, snapshot.page, snapshot.has_more
    );
    for listing in &snapshot.listings {
        let heart = if engine.liked().contains(&listing.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{} {:>9}  {:<12} {}",
            heart,
            listing.price,
            listing.category.as_str(),
            listing.title
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("market=info");

    let config = MarketConfig {
        page_size: 4,
        ..Default::default()
    };
    let bus = EventBus::new(config.event_capacity);
    let store = Arc::new(InMemoryListingStore::new().with_event_bus(bus.clone()));
    let likes = Arc::new(InMemoryLikedSet::new());

    let seller = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let rows = seed(&store, seller)?;
    likes.like(viewer, rows[1].id)?;

    let interpreter = FixedInterpreter::new().with_answer(
        "casio calculator",
        Interpretation {
            category: Some(Category::Electronics),
            keywords: vec!["casio".into(), "fx-570".into()],
        },
    );

    let engine = Arc::new(
        EngineBuilder::new()
            .with_listing_source(store.clone())
            .with_liked_source(likes)
            .with_interpreter(Arc::new(interpreter))
            .with_viewer(viewer)
            .with_config(config)
            .build()?,
    );
    let listener = tokio::spawn(pump(bus.subscribe(), engine.clone()));

    engine.prime().await?;
    print_snapshot("newest first", &engine);

    engine.load_more().await?;
    print_snapshot("after load more", &engine);

    engine
        .set_filter(
            FilterPatch::default()
                .category(Category::Textbook)
                .sort(SortKey::PriceAsc)
                .hide_sold(true),
        )
        .await?;
    print_snapshot("textbooks, cheapest first", &engine);

    store.insert(Listing::new(
        seller,
        "Physics for Scientists",
        "",
        80_000,
        Category::Textbook,
        Condition::Good,
    ))?;
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    print_snapshot("after a new textbook was posted", &engine);

    engine
        .set_filter(FilterPatch::default().all_categories())
        .await?;
    engine.search("casio calculator").await?;
    print_snapshot("search: casio calculator", &engine);

    record_view(store.clone(), rows[3].id).await?;

    listener.abort();
    Ok(())
}
