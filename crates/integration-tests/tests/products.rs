//! Catalog pages: listing, detail, superuser-only creation, update, archive.

use shopapp::models::{ProductInput, ProductScope};
use shopapp::ports::ProductRepository;
use shopapp_core::ProductId;
use shopapp_integration_tests::{TestApp, location};

async fn add_product(app: &TestApp, name: &str) -> ProductId {
    ProductRepository::create(app.db.as_ref(), &ProductInput::named(name))
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_archive_keeps_row_and_hides_from_list() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let laptop = add_product(&app, "Laptop").await;
    add_product(&app, "Desktop").await;

    let response = app
        .post_form(&client, &format!("/shop/products/{laptop}/archive/"), &[])
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/shop/products/");

    let stored = app.db.get(laptop).await.unwrap().unwrap();
    assert!(stored.archived);

    let list = app.get(&client, "/shop/products/").await.text().await.unwrap();
    assert!(!list.contains("Laptop"));
    assert!(list.contains("Desktop"));

    let detail = app.get(&client, &format!("/shop/products/{laptop}/")).await;
    assert_eq!(detail.status(), 200);
    assert!(detail.text().await.unwrap().contains("Laptop"));
}

#[tokio::test]
async fn test_archive_confirmation_page() {
    let app = TestApp::spawn().await;
    let id = add_product(&app, "Laptop").await;

    let response = app
        .get(&app.client(), &format!("/shop/products/{id}/archive/"))
        .await;

    assert_eq!(response.status(), 200);
    assert!(!app.db.get(id).await.unwrap().unwrap().archived);
}

#[tokio::test]
async fn test_unknown_product_is_404() {
    let app = TestApp::spawn().await;
    let client = app.client();

    assert_eq!(app.get(&client, "/shop/products/999/").await.status(), 404);
    assert_eq!(
        app.post_form(&client, "/shop/products/999/archive/", &[])
            .await
            .status(),
        404
    );
}

#[tokio::test]
async fn test_malformed_product_id_is_404() {
    let app = TestApp::spawn().await;
    let (client, _) = app.logged_in_client("admin", true).await;

    for path in [
        "/shop/products/abc/",
        "/shop/products/abc/update/",
        "/shop/products/abc/archive/",
        "/shop/products/99999999999/",
        "/shop/products/-/update/",
    ] {
        assert_eq!(app.get(&client, path).await.status(), 404, "{path}");
    }
    assert_eq!(
        app.post_form(&client, "/shop/products/abc/archive/", &[])
            .await
            .status(),
        404
    );
    assert_eq!(
        app.post_form(
            &client,
            "/shop/products/99999999999/update/",
            &[("name", "Laptop"), ("price", "10"), ("discount", "0")],
        )
        .await
        .status(),
        404
    );
}

#[tokio::test]
async fn test_create_redirects_anonymous_to_login() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let page = app.get(&client, "/shop/products/create/").await;
    assert_eq!(page.status(), 303);
    assert_eq!(
        location(&page),
        "/accounts/login/?next=%2Fshop%2Fproducts%2Fcreate%2F"
    );

    let submit = app
        .post_form(
            &client,
            "/shop/products/create/",
            &[("name", "Tablet"), ("price", "10"), ("discount", "0")],
        )
        .await;
    assert_eq!(submit.status(), 303);
    assert!(app.db.list(ProductScope::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_forbidden_for_regular_user() {
    let app = TestApp::spawn().await;
    let (client, _) = app.logged_in_client("jane", false).await;

    assert_eq!(app.get(&client, "/shop/products/create/").await.status(), 403);

    let submit = app
        .post_form(
            &client,
            "/shop/products/create/",
            &[("name", "Tablet"), ("price", "10"), ("discount", "0")],
        )
        .await;
    assert_eq!(submit.status(), 403);
    assert!(app.db.list(ProductScope::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_superuser_creates_product() {
    let app = TestApp::spawn().await;
    let (client, _) = app.logged_in_client("admin", true).await;

    assert_eq!(app.get(&client, "/shop/products/create/").await.status(), 200);

    let response = app
        .post_form(
            &client,
            "/shop/products/create/",
            &[
                ("name", "Tablet"),
                ("price", "249.90"),
                ("description", "10 inch"),
                ("discount", "15"),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/shop/products/");

    let products = app.db.list(ProductScope::All).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Tablet");
    assert_eq!(products[0].description, "10 inch");
    assert_eq!(products[0].discount.percent(), 15);
    assert!(!products[0].archived);
}

#[tokio::test]
async fn test_invalid_create_rerenders_form() {
    let app = TestApp::spawn().await;
    let (client, _) = app.logged_in_client("admin", true).await;

    let response = app
        .post_form(
            &client,
            "/shop/products/create/",
            &[("name", ""), ("price", "10"), ("discount", "0")],
        )
        .await;

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("This field is required."));
    assert!(app.db.list(ProductScope::All).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_redirects_to_detail() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let id = add_product(&app, "Laptop").await;

    let form = app.get(&client, &format!("/shop/products/{id}/update/")).await;
    assert_eq!(form.status(), 200);
    assert!(form.text().await.unwrap().contains("Laptop"));

    let response = app
        .post_form(
            &client,
            &format!("/shop/products/{id}/update/"),
            &[
                ("name", "Gaming Laptop"),
                ("price", "1999.00"),
                ("description", ""),
                ("discount", "5"),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), format!("/shop/products/{id}/"));

    let stored = app.db.get(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Gaming Laptop");
    assert_eq!(stored.discount.percent(), 5);
}

#[tokio::test]
async fn test_update_rejects_out_of_range_discount() {
    let app = TestApp::spawn().await;
    let id = add_product(&app, "Laptop").await;

    let response = app
        .post_form(
            &app.client(),
            &format!("/shop/products/{id}/update/"),
            &[("name", "Laptop"), ("price", "10"), ("discount", "150")],
        )
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(app.db.get(id).await.unwrap().unwrap().discount.percent(), 0);
}
