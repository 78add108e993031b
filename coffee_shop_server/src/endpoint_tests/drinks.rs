use actix_web::{http::StatusCode, test::TestRequest};
use coffee_shop_engine::{
    db_types::{Drink, Ingredient},
    DrinkApiError,
};
use serde_json::{json, Value};

use super::{
    helpers::{bearer, latte, send_request, water},
    mocks::MockDrinkManager,
};
use crate::routes::MAX_PAYLOAD_SIZE;

const MENU_SHORT_JSON: &str = r#"{"success":true,"drinks":[{"id":1,"title":"water","recipe":[{"color":"blue","parts":1}]},{"id":2,"title":"Latte","recipe":[{"color":"grey","parts":3},{"color":"brown","parts":1}]}]}"#;
const MENU_LONG_JSON: &str = r#"{"success":true,"drinks":[{"id":1,"title":"water","recipe":[{"name":"water","color":"blue","parts":1}]},{"id":2,"title":"Latte","recipe":[{"name":"milk","color":"grey","parts":3},{"name":"coffee","color":"brown","parts":1}]}]}"#;
const LATTE_JSON: &str = r#"{"success":true,"drinks":[{"id":2,"title":"Latte","recipe":[{"name":"milk","color":"grey","parts":3},{"name":"coffee","color":"brown","parts":1}]}]}"#;

fn menu() -> MockDrinkManager {
    let mut db = MockDrinkManager::new();
    db.expect_fetch_drinks().returning(|| Ok(vec![water(), latte()]));
    db
}

fn json_body(body: &str) -> Value {
    serde_json::from_str(body).expect("Response was not JSON")
}

#[actix_web::test]
async fn public_menu_hides_ingredient_names() {
    let _ = env_logger::try_init().ok();
    let (status, _, body) = send_request(TestRequest::get().uri("/drinks"), menu()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, MENU_SHORT_JSON);
}

#[actix_web::test]
async fn public_menu_ignores_tokens() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/drinks").insert_header(("Authorization", "Bearer not.a.token"));
    let (status, _, body) = send_request(req, menu()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, MENU_SHORT_JSON);
}

#[actix_web::test]
async fn empty_menu_is_not_found() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_fetch_drinks().times(1).returning(|| Ok(vec![]));
    let (status, _, body) = send_request(TestRequest::get().uri("/drinks"), db).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let body = json_body(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], 404);

    let mut db = MockDrinkManager::new();
    db.expect_fetch_drinks().returning(|| Ok(vec![]));
    let req = TestRequest::get().uri("/drinks-detail").insert_header(("Authorization", bearer(&["get:drinks-detail"])));
    let (status, _, _) = send_request(req, db).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn store_failure_is_unprocessable() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_fetch_drinks().returning(|| Err(DrinkApiError::DatabaseError("database is locked".into())));
    let (status, _, body) = send_request(TestRequest::get().uri("/drinks"), db).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(!body.contains("locked"));
}

#[actix_web::test]
async fn detailed_menu() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::get().uri("/drinks-detail").insert_header(("Authorization", bearer(&["get:drinks-detail"])));
    let (status, _, body) = send_request(req, menu()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, MENU_LONG_JSON);
}

#[actix_web::test]
async fn create_latte() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_insert_drink()
        .withf(|d| d.title == "Latte" && d.recipe.ingredients().len() == 2)
        .times(1)
        .returning(|d| Ok(Drink { id: 2, title: d.title, recipe: d.recipe }));
    let payload = json!({
        "title": "Latte",
        "recipe": [
            { "name": "milk", "color": "grey", "parts": 3 },
            { "name": "coffee", "color": "brown", "parts": 1 }
        ]
    });
    let req = TestRequest::post()
        .uri("/drinks")
        .insert_header(("Authorization", bearer(&["post:drinks"])))
        .set_payload(payload.to_string());
    let (status, _, body) = send_request(req, db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, LATTE_JSON);
}

#[actix_web::test]
async fn create_with_single_ingredient() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_insert_drink()
        .withf(|d| d.recipe.ingredients() == [Ingredient::new("espresso", "black", 1)])
        .returning(|d| Ok(Drink { id: 7, title: d.title, recipe: d.recipe }));
    let payload = json!({ "title": "Espresso", "recipe": { "name": "espresso", "color": "black", "parts": 1 } });
    let req = TestRequest::post()
        .uri("/drinks")
        .insert_header(("Authorization", bearer(&["post:drinks"])))
        .set_payload(payload.to_string());
    let (status, _, body) = send_request(req, db).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["drinks"][0]["recipe"], json!([{ "name": "espresso", "color": "black", "parts": 1 }]));
}

#[actix_web::test]
async fn create_rejects_bad_payloads() {
    let _ = env_logger::try_init().ok();
    let payloads = [
        "not json at all".to_string(),
        json!({ "title": "Latte" }).to_string(),
        json!({ "recipe": [{ "name": "milk", "color": "grey", "parts": 1 }] }).to_string(),
        json!({ "title": "Latte", "recipe": [{ "color": "grey", "parts": 1 }] }).to_string(),
        json!({ "title": "Latte", "recipe": [] }).to_string(),
        json!({ "title": "", "recipe": [{ "name": "milk", "color": "grey", "parts": 1 }] }).to_string(),
        json!({ "title": "Latte", "recipe": [{ "name": "milk", "color": "grey", "parts": 0 }] }).to_string(),
    ];
    for payload in payloads {
        // The store must never be reached
        let db = MockDrinkManager::new();
        let req = TestRequest::post()
            .uri("/drinks")
            .insert_header(("Authorization", bearer(&["post:drinks"])))
            .set_payload(payload.clone());
        let (status, _, body) = send_request(req, db).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{payload} gave {body}");
        let body = json_body(&body);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 422);
    }
}

#[actix_web::test]
async fn create_duplicate_title() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_insert_drink().returning(|d| Err(DrinkApiError::DuplicateTitle(d.title)));
    let payload = json!({ "title": "water", "recipe": [{ "name": "water", "color": "blue", "parts": 1 }] });
    let req = TestRequest::post()
        .uri("/drinks")
        .insert_header(("Authorization", bearer(&["post:drinks"])))
        .set_payload(payload.to_string());
    let (status, _, body) = send_request(req, db).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(&body)["error"], 422);
}

#[actix_web::test]
async fn update_title_only() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_fetch_drink().withf(|id| *id == 2).returning(|_| Ok(Some(latte())));
    db.expect_update_drink()
        .withf(|id, u| *id == 2 && u.title.as_deref() == Some("Flat White") && u.recipe.is_none())
        .times(1)
        .returning(|_, u| Ok(Some(Drink { title: u.title.unwrap_or_default(), ..latte() })));
    let req = TestRequest::patch()
        .uri("/drinks/2")
        .insert_header(("Authorization", bearer(&["patch:drinks"])))
        .set_payload(json!({ "title": "Flat White" }).to_string());
    let (status, _, body) = send_request(req, db).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["drinks"][0]["title"], "Flat White");
    assert_eq!(body["drinks"][0]["recipe"][0]["name"], "milk");
}

#[actix_web::test]
async fn update_recipe_only() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_fetch_drink().returning(|_| Ok(Some(latte())));
    db.expect_update_drink()
        .withf(|_, u| u.title.is_none() && u.recipe.as_ref().is_some_and(|r| r.ingredients().len() == 1))
        .returning(|_, u| Ok(Some(Drink { recipe: u.recipe.unwrap_or_default(), ..latte() })));
    let payload = json!({ "recipe": { "name": "oat milk", "color": "white", "parts": 2 } });
    let req = TestRequest::patch()
        .uri("/drinks/2")
        .insert_header(("Authorization", bearer(&["patch:drinks"])))
        .set_payload(payload.to_string());
    let (status, _, body) = send_request(req, db).await;
    assert_eq!(status, StatusCode::OK);
    let body = json_body(&body);
    assert_eq!(body["drinks"][0]["title"], "Latte");
    assert_eq!(body["drinks"][0]["recipe"], json!([{ "name": "oat milk", "color": "white", "parts": 2 }]));
}

#[actix_web::test]
async fn update_missing_drink() {
    let _ = env_logger::try_init().ok();
    for payload in [json!({ "title": "Mocha" }).to_string(), "{ broken".to_string()] {
        let mut db = MockDrinkManager::new();
        db.expect_fetch_drink().withf(|id| *id == 9999).returning(|_| Ok(None));
        let req = TestRequest::patch()
            .uri("/drinks/9999")
            .insert_header(("Authorization", bearer(&["patch:drinks"])))
            .set_payload(payload);
        let (status, _, body) = send_request(req, db).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body = json_body(&body);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], 404);
    }
}

#[actix_web::test]
async fn update_with_invalid_payload() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_fetch_drink().returning(|_| Ok(Some(latte())));
    let req = TestRequest::patch()
        .uri("/drinks/2")
        .insert_header(("Authorization", bearer(&["patch:drinks"])))
        .set_payload(json!({ "title": 42 }).to_string());
    let (status, _, _) = send_request(req, db).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn delete_drink() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_delete_drink().withf(|id| *id == 2).times(1).returning(|_| Ok(true));
    let req = TestRequest::delete().uri("/drinks/2").insert_header(("Authorization", bearer(&["delete:drinks"])));
    let (status, _, body) = send_request(req, db).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"delete":2}"#);
}

#[actix_web::test]
async fn delete_missing_drink() {
    let _ = env_logger::try_init().ok();
    let mut db = MockDrinkManager::new();
    db.expect_delete_drink().returning(|_| Ok(false));
    let req = TestRequest::delete().uri("/drinks/2").insert_header(("Authorization", bearer(&["delete:drinks"])));
    let (status, _, body) = send_request(req, db).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["error"], 404);
}

#[actix_web::test]
async fn non_numeric_id_is_not_found() {
    let _ = env_logger::try_init().ok();
    let req = TestRequest::delete().uri("/drinks/latte").insert_header(("Authorization", bearer(&["delete:drinks"])));
    let (status, _, body) = send_request(req, MockDrinkManager::new()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body)["error"], 404);
}

#[actix_web::test]
async fn oversized_body_gets_the_error_envelope() {
    let _ = env_logger::try_init().ok();
    let title = "a".repeat(MAX_PAYLOAD_SIZE + 1024);
    let payload = json!({ "title": title, "recipe": [{ "name": "milk", "color": "grey", "parts": 1 }] }).to_string();

    let req = TestRequest::post()
        .uri("/drinks")
        .insert_header(("Authorization", bearer(&["post:drinks"])))
        .set_payload(payload.clone());
    let (status, headers, body) = send_request(req, MockDrinkManager::new()).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "*");
    let body = json_body(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], 413);

    let mut db = MockDrinkManager::new();
    db.expect_fetch_drink().returning(|_| Ok(Some(latte())));
    let req = TestRequest::patch()
        .uri("/drinks/2")
        .insert_header(("Authorization", bearer(&["patch:drinks"])))
        .set_payload(payload);
    let (status, _, body) = send_request(req, db).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(json_body(&body)["error"], 413);
}
