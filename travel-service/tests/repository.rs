//! Generic repository against a real PostgreSQL database
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use rust_decimal::Decimal;
use sqlx::PgPool;
use travel_service::domain::product::{Product, ProductFilter};
use travel_service::repository::{PageRequest, PgRepository, RepositoryErrorKind, Sort};
use uuid::Uuid;

fn product(name: &str, price: i64) -> Product {
    Product {
        uid: Uuid::new_v4(),
        name: name.to_string(),
        price: Decimal::new(price, 0),
        ..Product::default()
    }
}

async fn seed(repo: &PgRepository<Product>, products: &[Product]) -> Vec<Product> {
    let mut saved = Vec::new();
    for product in products {
        saved.push(repo.save(product).await.unwrap());
    }
    saved
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn save_assigns_id_and_returns_row(pool: PgPool) {
    let repo = PgRepository::<Product>::new(pool);
    let saved = repo.save(&product("Umrah Reguler", 28_500_000)).await.unwrap();

    assert!(saved.id > 0);
    assert_eq!(saved.name, "Umrah Reguler");
    assert_eq!(saved.created_by["name"], "system");

    let found = repo.find_by_id(saved.id).await.unwrap();
    assert_eq!(found, saved);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn soft_delete_is_idempotent(pool: PgPool) {
    let repo = PgRepository::<Product>::new(pool.clone());
    let saved = repo.save(&product("Haji Furoda", 250_000_000)).await.unwrap();

    assert_eq!(repo.delete(saved.id).await.unwrap(), 1);
    assert_eq!(repo.delete(saved.id).await.unwrap(), 0);
    assert_eq!(repo.delete(9_999_999).await.unwrap(), 0);

    let err = repo.find_by_id(saved.id).await.unwrap_err();
    assert_eq!(err.kind, RepositoryErrorKind::NotFound);
    assert_eq!(repo.count(None).await.unwrap(), 0);

    let deleted_on: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT deleted_on FROM core.products WHERE id = $1")
            .bind(saved.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(deleted_on.is_some());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn filter_and_search(pool: PgPool) {
    let repo = PgRepository::<Product>::new(pool);
    let mut inactive = product("Umrah Ramadhan", 40_000_000);
    inactive.is_active = false;
    let mut described = product("Tour Turki", 30_000_000);
    described.description = Some("Istanbul, Cappadocia dan umrah".to_string());
    seed(
        &repo,
        &[product("Umrah Reguler", 28_000_000), inactive, described],
    )
    .await;

    let active = ProductFilter {
        is_active: Some(true),
        ..ProductFilter::default()
    };
    assert_eq!(repo.count(Some(&active)).await.unwrap(), 2);

    let search = ProductFilter {
        search: Some("UMRAH".to_string()),
        ..ProductFilter::default()
    };
    assert_eq!(repo.count(Some(&search)).await.unwrap(), 3);

    let both = ProductFilter {
        is_active: Some(true),
        search: Some("umrah".to_string()),
    };
    let rows = repo.find_all(Some(&both), None, None).await.unwrap();
    let names: Vec<_> = rows.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Umrah Reguler", "Tour Turki"]);

    let blank = ProductFilter {
        search: Some("   ".to_string()),
        ..ProductFilter::default()
    };
    assert_eq!(repo.count(Some(&blank)).await.unwrap(), 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn search_term_is_bound_not_spliced(pool: PgPool) {
    let repo = PgRepository::<Product>::new(pool);
    seed(&repo, &[product("Umrah Reguler", 28_000_000)]).await;

    let hostile = ProductFilter {
        search: Some("x' OR '1'='1".to_string()),
        ..ProductFilter::default()
    };
    assert_eq!(repo.count(Some(&hostile)).await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn pagination_and_ordering(pool: PgPool) {
    let repo = PgRepository::<Product>::new(pool);
    seed(
        &repo,
        &[
            product("A", 10),
            product("B", 50),
            product("C", 30),
            product("D", 20),
            product("E", 40),
        ],
    )
    .await;

    let page = repo
        .find_all(None, Some(PageRequest::new(2, 2)), Some(&Sort::desc("price")))
        .await
        .unwrap();
    let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["C", "D"]);

    let last = repo
        .find_all(None, Some(PageRequest::new(3, 2)), Some(&Sort::desc("price")))
        .await
        .unwrap();
    assert_eq!(last.len(), 1);

    let default_order = repo.find_all(None, None, None).await.unwrap();
    let ids: Vec<_> = default_order.iter().map(|p| p.id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn unsortable_column_is_rejected(pool: PgPool) {
    let repo = PgRepository::<Product>::new(pool);
    let err = repo
        .find_all(None, None, Some(&Sort::asc("created_by")))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RepositoryErrorKind::Configuration);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_name_is_a_unique_violation(pool: PgPool) {
    let repo = PgRepository::<Product>::new(pool);
    let first = repo.save(&product("Umrah Plus Thaif", 32_000_000)).await.unwrap();

    let err = repo
        .save(&product("Umrah Plus Thaif", 33_000_000))
        .await
        .unwrap_err();
    assert_eq!(err.kind, RepositoryErrorKind::UniqueViolation);
    assert_eq!(err.constraint(), Some("products_name_unique"));
    let details = err.unique.unwrap().details();
    assert_eq!(details["name"], "Umrah Plus Thaif");

    // the index only covers live rows
    repo.delete(first.id).await.unwrap();
    repo.save(&product("Umrah Plus Thaif", 33_000_000)).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn update_overwrites_the_row(pool: PgPool) {
    let repo = PgRepository::<Product>::new(pool);
    let mut saved = repo.save(&product("Umrah Hemat", 25_000_000)).await.unwrap();

    saved.price = Decimal::new(2_450_000_000, 2);
    saved.description = Some("Hotel bintang 3".to_string());
    let updated = repo.update(&saved).await.unwrap();

    assert_eq!(updated.id, saved.id);
    assert_eq!(updated.price, Decimal::new(24_500_000, 0));
    assert_eq!(updated.description.as_deref(), Some("Hotel bintang 3"));
    assert_eq!(repo.count(None).await.unwrap(), 1);
}
