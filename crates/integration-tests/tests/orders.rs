//! Order pages: login-guarded listing, permission-guarded detail, creation.

use shopapp::models::ProductInput;
use shopapp::ports::{OrderRepository, ProductRepository};
use shopapp_core::{Price, ProductId};
use shopapp_integration_tests::{TestApp, location};

async fn add_product(app: &TestApp, name: &str, price: &str) -> ProductId {
    let input = ProductInput {
        price: price.parse::<Price>().unwrap(),
        ..ProductInput::named(name)
    };
    ProductRepository::create(app.db.as_ref(), &input)
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_list_redirects_anonymous_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get(&app.client(), "/shop/orders/").await;

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/accounts/login/?next=%2Fshop%2Forders%2F");
}

#[tokio::test]
async fn test_list_shows_orders_to_any_logged_in_user() {
    let app = TestApp::spawn().await;
    let (client, user) = app.logged_in_client("jane", false).await;
    let keyboard = add_product(&app, "Keyboard", "49.50").await;
    let order = shopapp::models::NewOrder {
        user_id: user.id,
        product_ids: vec![keyboard],
        delivery_address: Some("1 Main St".to_string()),
        promocode: "SPRING".to_string(),
    };
    OrderRepository::create(app.db.as_ref(), &order).await.unwrap();

    let response = app.get(&client, "/shop/orders/").await;

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Keyboard"));
    assert!(body.contains("SPRING"));
    assert!(body.contains("1 Main St"));
}

#[tokio::test]
async fn test_detail_requires_view_order() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("owner", false).await;
    let product = add_product(&app, "Mouse", "15").await;
    let order = OrderRepository::create(
        app.db.as_ref(),
        &shopapp::models::NewOrder {
            user_id: owner.id,
            product_ids: vec![product],
            delivery_address: None,
            promocode: String::new(),
        },
    )
    .await
    .unwrap();
    let path = format!("/shop/orders/{}/", order.id);

    let anonymous = app.get(&app.client(), &path).await;
    assert_eq!(anonymous.status(), 303);

    let (client, _) = app.logged_in_client("jane", false).await;
    assert_eq!(app.get(&client, &path).await.status(), 403);
}

#[tokio::test]
async fn test_detail_allowed_through_group() {
    let app = TestApp::spawn().await;
    let (client, user) = app.logged_in_client("jane", false).await;
    let group = app.create_group("managers", &["shopapp.view_order"]).await;
    shopapp::ports::UserRepository::add_to_group(app.db.as_ref(), user.id, group.id)
        .await
        .unwrap();
    let product = add_product(&app, "Monitor", "120.00").await;
    let order = OrderRepository::create(
        app.db.as_ref(),
        &shopapp::models::NewOrder {
            user_id: user.id,
            product_ids: vec![product],
            delivery_address: None,
            promocode: String::new(),
        },
    )
    .await
    .unwrap();

    let response = app.get(&client, &format!("/shop/orders/{}/", order.id)).await;

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("Monitor"));
    assert!(body.contains("120.00"));
}

#[tokio::test]
async fn test_unknown_order_is_404_for_superuser() {
    let app = TestApp::spawn().await;
    let (client, _) = app.logged_in_client("admin", true).await;

    assert_eq!(app.get(&client, "/shop/orders/42/").await.status(), 404);
}

#[tokio::test]
async fn test_malformed_order_id_is_404_for_superuser() {
    let app = TestApp::spawn().await;
    let (client, _) = app.logged_in_client("admin", true).await;

    assert_eq!(app.get(&client, "/shop/orders/abc/").await.status(), 404);
    assert_eq!(app.get(&client, "/shop/orders/99999999999/").await.status(), 404);
}

#[tokio::test]
async fn test_malformed_order_id_still_redirects_anonymous() {
    let app = TestApp::spawn().await;

    let response = app.get(&app.client(), "/shop/orders/abc/").await;
    assert_eq!(response.status(), 303);
    assert!(location(&response).starts_with("/accounts/login/"));
}

#[tokio::test]
async fn test_create_persists_order_and_redirects() {
    let app = TestApp::spawn().await;
    let client = app.client();
    let owner = app.create_user("owner", false).await;
    let laptop = add_product(&app, "Laptop", "999.99").await;
    let mouse = add_product(&app, "Mouse", "19.99").await;

    let form = app.get(&client, "/shop/orders/create/").await;
    assert_eq!(form.status(), 200);
    assert!(form.text().await.unwrap().contains("owner"));

    let owner_id = owner.id.to_string();
    let laptop_id = laptop.to_string();
    let mouse_id = mouse.to_string();
    let response = app
        .post_form(
            &client,
            "/shop/orders/create/",
            &[
                ("user", owner_id.as_str()),
                ("products", laptop_id.as_str()),
                ("products", mouse_id.as_str()),
                ("delivery_address", "221B Baker Street"),
                ("promocode", "WELCOME"),
            ],
        )
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/shop/orders/");

    let orders = app.db.list_with_relations().await.unwrap();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.owner.id, owner.id);
    let mut product_ids: Vec<_> = order.products.iter().map(|p| p.id).collect();
    product_ids.sort();
    assert_eq!(product_ids, vec![laptop, mouse]);
    assert_eq!(order.order.delivery_address.as_deref(), Some("221B Baker Street"));
    assert_eq!(order.order.promocode, "WELCOME");
}

#[tokio::test]
async fn test_create_without_products_rerenders() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("owner", false).await;
    add_product(&app, "Laptop", "999.99").await;

    let owner_id = owner.id.to_string();
    let response = app
        .post_form(
            &app.client(),
            "/shop/orders/create/",
            &[("user", owner_id.as_str()), ("promocode", "")],
        )
        .await;

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("This field is required."));
    assert!(app.db.list_with_relations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_rejects_archived_product() {
    let app = TestApp::spawn().await;
    let owner = app.create_user("owner", false).await;
    let laptop = add_product(&app, "Laptop", "999.99").await;
    app.db.archive(laptop).await.unwrap();

    let owner_id = owner.id.to_string();
    let laptop_id = laptop.to_string();
    let response = app
        .post_form(
            &app.client(),
            "/shop/orders/create/",
            &[("user", owner_id.as_str()), ("products", laptop_id.as_str())],
        )
        .await;

    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("Select a valid choice."));
    assert!(app.db.list_with_relations().await.unwrap().is_empty());
}
