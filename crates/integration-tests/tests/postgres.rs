//! `PostgreSQL` repositories against a real database.
//!
//! Each test gets a fresh database with the shop migrations applied. They
//! need a running server, so they are ignored by default:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/shop cargo test -p shopapp-integration-tests \
//!     --test postgres -- --ignored
//! ```

use sqlx::PgPool;

use shopapp::db::RepositoryError;
use shopapp::models::{NewOrder, ProductInput, ProductScope};
use shopapp::ports::Repositories;
use shopapp::seed::{SEED_PRODUCT_NAMES, seed_products};
use shopapp::services::AuthService;
use shopapp_core::{Price, PermissionCode, ProductId, UserId};

async fn add_product(repos: &Repositories, name: &str, price: &str) -> ProductId {
    let input = ProductInput {
        price: price.parse::<Price>().unwrap(),
        ..ProductInput::named(name)
    };
    repos.products.create(&input).await.unwrap().id
}

async fn add_user(repos: &Repositories, username: &str) -> UserId {
    AuthService::new(repos.users.as_ref())
        .register(username, "password123", false)
        .await
        .unwrap()
        .id
}

#[sqlx::test(migrations = "../shopapp/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_archive_keeps_row(pool: PgPool) {
    let repos = Repositories::postgres(&pool);
    let laptop = add_product(&repos, "Laptop", "999.99").await;
    add_product(&repos, "Desktop", "1299.00").await;

    let archived = repos.products.archive(laptop).await.unwrap();
    assert!(archived.archived);

    let live = repos.products.list(ProductScope::Live).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].name, "Desktop");
    assert_eq!(repos.products.list(ProductScope::All).await.unwrap().len(), 2);
    assert!(repos.products.get(laptop).await.unwrap().unwrap().archived);
}

#[sqlx::test(migrations = "../shopapp/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_seed_is_idempotent(pool: PgPool) {
    let repos = Repositories::postgres(&pool);

    let first = seed_products(repos.products.as_ref()).await.unwrap();
    let second = seed_products(repos.products.as_ref()).await.unwrap();

    let all = repos.products.list(ProductScope::All).await.unwrap();
    assert_eq!(all.len(), SEED_PRODUCT_NAMES.len());
    assert_eq!(
        first.iter().map(|p| p.id).collect::<Vec<_>>(),
        second.iter().map(|p| p.id).collect::<Vec<_>>()
    );
}

#[sqlx::test(migrations = "../shopapp/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_order_links_every_product(pool: PgPool) {
    let repos = Repositories::postgres(&pool);
    let owner = add_user(&repos, "owner").await;
    let laptop = add_product(&repos, "Laptop", "999.99").await;
    let mouse = add_product(&repos, "Mouse", "19.99").await;

    let order = repos
        .orders
        .create(&NewOrder {
            user_id: owner,
            product_ids: vec![laptop, mouse],
            delivery_address: Some("1 Main St".to_owned()),
            promocode: "SALE".to_owned(),
        })
        .await
        .unwrap();

    let loaded = repos
        .orders
        .get_with_relations(order.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.owner.id, owner);
    let mut ids: Vec<_> = loaded.products.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, [laptop, mouse]);
    assert_eq!(loaded.total(), "1019.98".parse::<Price>().unwrap().amount());

    let listed = repos.orders.list_with_relations().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].products.len(), 2);
}

#[sqlx::test(migrations = "../shopapp/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_order_with_missing_rows_conflicts(pool: PgPool) {
    let repos = Repositories::postgres(&pool);
    let owner = add_user(&repos, "owner").await;
    let laptop = add_product(&repos, "Laptop", "999.99").await;

    let missing_product = repos
        .orders
        .create(&NewOrder {
            user_id: owner,
            product_ids: vec![laptop, ProductId::new(9999)],
            delivery_address: None,
            promocode: String::new(),
        })
        .await;
    assert!(matches!(missing_product, Err(RepositoryError::Conflict(_))));

    let missing_owner = repos
        .orders
        .create(&NewOrder {
            user_id: UserId::new(9999),
            product_ids: vec![laptop],
            delivery_address: None,
            promocode: String::new(),
        })
        .await;
    assert!(matches!(missing_owner, Err(RepositoryError::Conflict(_))));

    // Both inserts rolled back.
    assert!(repos.orders.list_with_relations().await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../shopapp/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_group_grants_are_inherited(pool: PgPool) {
    let repos = Repositories::postgres(&pool);
    let jane = add_user(&repos, "jane").await;
    let view_order = PermissionCode::parse("shopapp.view_order").unwrap();

    let group = repos.groups.create("clerks").await.unwrap();
    assert!(matches!(
        repos.groups.create("clerks").await,
        Err(RepositoryError::Conflict(_))
    ));

    repos
        .groups
        .grant_permission(group.id, &view_order)
        .await
        .unwrap();
    assert!(!repos.users.granted_permissions(jane).await.unwrap().contains(&view_order));

    repos.users.add_to_group(jane, group.id).await.unwrap();
    assert!(repos.users.granted_permissions(jane).await.unwrap().contains(&view_order));

    let groups = repos.groups.list_with_permissions().await.unwrap();
    assert_eq!(groups.len(), 1);
}
