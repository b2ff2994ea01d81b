use bookstore_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::books::{BookFields, BookPayload},
    entity::books::{Column, Entity as Books},
    middleware::auth::AuthUser,
    services::book_service,
    state::AppState,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let state = AppState::new(orm, config);
    let seeder = AuthUser::admin("seed");
    seed_books(&state, &seeder).await?;

    println!("Seed completed");
    Ok(())
}

async fn seed_books(state: &AppState, seeder: &AuthUser) -> anyhow::Result<()> {
    let books = vec![
        ("The Lean Startup", "Eric Ries", "How constant innovation creates radically successful businesses.", "business", Some(29.99), 19.99, true),
        ("Clean Code", "Robert C. Martin", "A handbook of agile software craftsmanship.", "technology", Some(44.99), 34.99, true),
        ("Dune", "Frank Herbert", "A desert planet, a noble family and the spice that binds the universe.", "sci-fi", None, 12.5, false),
        ("The Shining", "Stephen King", "A winter caretaker and a hotel with a long memory.", "horror", Some(18.0), 9.99, false),
        ("Sapiens", "Yuval Noah Harari", "A brief history of humankind.", "history", Some(24.0), 16.75, true),
    ];

    for (title, author, description, category, old_price, new_price, trending) in books {
        let existing = Books::find()
            .filter(Column::Title.eq(title))
            .one(&state.orm)
            .await?;
        if existing.is_some() {
            println!("Skipped {title} (already present)");
            continue;
        }

        let fields = BookFields {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            description: Some(description.to_string()),
            category: Some(category.to_string()),
            old_price: Some(old_price),
            new_price: Some(new_price),
            trending: Some(trending),
        };
        book_service::create_book(state, seeder, BookPayload::json(fields))
            .await
            .map_err(|err| anyhow::anyhow!("seeding {title}: {err}"))?;
        println!("Seeded {title}");
    }

    Ok(())
}
