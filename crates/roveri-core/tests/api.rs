mod common;

use reqwest::Method;
use roveri_core::transport::RequestBody;
use roveri_core::{AdminUser, NewPet, Pet, RegisterForm, SessionHandle, UserAction};

use common::{client_with, json, user_json, ScriptedTransport};

#[tokio::test]
async fn pet_list_hides_unpublished_and_accepts_pages() {
    let transport = ScriptedTransport::new(|_| {
        json(
            200,
            serde_json::json!({
                "count": 3,
                "results": [
                    {"id": 1, "name": "Rex", "is_published": true},
                    {"id": 2, "name": "Draft", "is_published": false},
                    {"id": 3, "name": "Mimi"},
                ]
            }),
        )
    });
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());

    let ids: Vec<i64> = client
        .list_pets()
        .await
        .unwrap()
        .iter()
        .map(|pet| pet.id)
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn admin_listing_keeps_hidden_pets() {
    let transport = ScriptedTransport::new(|_| {
        json(
            200,
            serde_json::json!([
                {"id": 1, "name": "Rex", "is_published": true, "status": "available", "views": 4},
                {"id": 2, "name": "Draft", "is_published": false, "status": "available", "views": 3},
            ]),
        )
    });
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());

    let pets = client.list_all_pets().await.unwrap();
    assert_eq!(pets.iter().map(|pet| pet.id).collect::<Vec<_>>(), vec![1, 2]);

    let stats = roveri_core::DashboardStats::compute(&[], &pets);
    assert_eq!(stats.total_pets, 2);
    assert_eq!(stats.available_pets, 2);
    assert_eq!(stats.total_views, 7);

    // The public listing still hides the draft.
    assert_eq!(client.list_pets().await.unwrap().len(), 1);
}

#[tokio::test]
async fn contacting_an_owner_opens_a_room() {
    let transport = ScriptedTransport::new(|request| {
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "chat/rooms/");
        json(
            201,
            serde_json::json!({"id": 11, "pet": 4, "pet_name": "Rex", "user1": 1, "user2": 9}),
        )
    });
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());

    let room = client.open_room(4, 9).await.unwrap();
    assert_eq!(room.id, 11);
    assert_eq!(room.title(), "Rex");
    assert_eq!(
        transport.requests()[0].body,
        RequestBody::Json(serde_json::json!({"pet_id": 4, "receiver_id": 9}))
    );
}

#[tokio::test]
async fn register_posts_backend_shape_then_loads_user() {
    let transport = ScriptedTransport::new(|request| match request.path.as_str() {
        "accounts/register/" => json(201, serde_json::json!({"user": user_json(5, "caio")})),
        _ => json(200, user_json(5, "caio")),
    });
    let session = SessionHandle::in_memory();
    let (client, _events) = client_with(&transport, session.clone());

    let form = RegisterForm {
        name: "Caio".to_string(),
        email: "caio@example.com".to_string(),
        phone: "4199".to_string(),
        city: "Curitiba".to_string(),
        password: "pw".to_string(),
        confirm_password: "pw".to_string(),
    };
    let user = client.register(&form).await.unwrap();
    assert_eq!(session.user(), Some(user));

    match &transport.requests()[0].body {
        RequestBody::Json(body) => {
            assert_eq!(body["username"], "caio@example.com");
            assert_eq!(body["password2"], "pw");
            assert_eq!(body["city"], "Curitiba");
        }
        other => panic!("unexpected body {other:?}"),
    }
}

#[tokio::test]
async fn mismatched_passwords_never_reach_the_backend() {
    let transport = ScriptedTransport::new(|_| json(201, serde_json::json!({})));
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let form = RegisterForm {
        email: "caio@example.com".to_string(),
        password: "a".to_string(),
        confirm_password: "b".to_string(),
        ..Default::default()
    };
    assert!(client.register(&form).await.is_err());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn favorites_toggle_both_ways() {
    let transport = ScriptedTransport::new(|request| match request.method {
        Method::POST => json(201, serde_json::json!({"pet": 2})),
        _ => json(204, serde_json::json!(null)),
    });
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let pet: Pet = serde_json::from_value(serde_json::json!({"id": 2, "name": "Mimi"})).unwrap();
    let mut favorites = Vec::new();

    assert!(client.toggle_favorite(&pet, &mut favorites).await.unwrap());
    assert_eq!(favorites.len(), 1);
    assert!(!client.toggle_favorite(&pet, &mut favorites).await.unwrap());
    assert!(favorites.is_empty());

    assert_eq!(transport.count(Method::POST, "favorites/"), 1);
    assert_eq!(transport.count(Method::DELETE, "favorites/2/"), 1);
}

#[tokio::test]
async fn moderation_updates_local_status_only_on_success() {
    let transport = ScriptedTransport::new(|request| match request.path.as_str() {
        "users/1/block/" => json(200, serde_json::json!({"detail": "ok"})),
        _ => json(403, serde_json::json!({"detail": "Not allowed"})),
    });
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    let mut users: Vec<AdminUser> = serde_json::from_value(serde_json::json!([
        {"id": 1, "username": "a", "status": "active"},
        {"id": 2, "username": "b", "status": "blocked"},
    ]))
    .unwrap();

    client
        .moderate_user(1, UserAction::Block, &mut users)
        .await
        .unwrap();
    assert_eq!(users[0].status.as_deref(), Some("blocked"));

    let error = client
        .moderate_user(2, UserAction::Unblock, &mut users)
        .await
        .unwrap_err();
    assert_eq!(error.user_message(), "Not allowed");
    assert_eq!(users[1].status.as_deref(), Some("blocked"));
}

#[tokio::test]
async fn new_pet_goes_out_as_multipart() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("rex.png");
    std::fs::write(&image, b"png").unwrap();

    let transport = ScriptedTransport::new(|_| {
        json(201, serde_json::json!({"id": 42, "name": "Rex", "species": "dog"}))
    });
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());

    let new_pet = NewPet {
        name: " Rex ".to_string(),
        species: "dog".to_string(),
        city: "Curitiba".to_string(),
        image: Some(image),
        ..Default::default()
    };
    let created = client.create_pet(&new_pet).await.unwrap();
    assert_eq!(created.id, 42);

    match &transport.requests()[0].body {
        RequestBody::Multipart(form) => {
            assert!(form.fields.contains(&("name".to_string(), "Rex".to_string())));
            let file = form.file.as_ref().unwrap();
            assert_eq!(file.file_name, "rex.png");
            assert_eq!(file.bytes, b"png".to_vec());
        }
        other => panic!("unexpected body {other:?}"),
    }

    let nameless = NewPet::default();
    assert!(client.create_pet(&nameless).await.is_err());
    assert_eq!(transport.requests().len(), 1);
}

#[tokio::test]
async fn deleting_a_pet_hits_its_detail_path() {
    let transport = ScriptedTransport::new(|_| json(204, serde_json::json!(null)));
    let (client, _events) = client_with(&transport, SessionHandle::in_memory());
    client.delete_pet(8).await.unwrap();
    assert_eq!(transport.count(Method::DELETE, "pets/8/"), 1);
}
