use serde_json::json;

use crate::common::{MAX_IMAGE_SIZE, TestApp, TestImage, routes};

mod listing {
    use super::*;

    #[tokio::test]
    async fn empty_list_has_zero_count() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::VENUES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["success"], true);
        assert_eq!(res.body["count"], 0);
        assert_eq!(res.body["data"], json!([]));
    }

    #[tokio::test]
    async fn lists_created_venues_by_name() {
        let app = TestApp::spawn().await;
        app.create_venue("Stade Mohammed V", None).await;
        app.create_venue("Grand Stade de Tanger", None).await;

        let res = app.get(routes::VENUES).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["count"], 2);
        assert_eq!(res.body["data"][0]["name"], "Grand Stade de Tanger");
        assert_eq!(res.body["data"][1]["name"], "Stade Mohammed V");
    }

    #[tokio::test]
    async fn unknown_venue_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::venue(999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn creates_venue_with_image_served_under_public() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(
                routes::VENUES,
                &[
                    ("nom", "Stade Adrar"),
                    ("ville", "Agadir"),
                    ("capacite", "45480"),
                    ("latitude", "30.42"),
                    ("annee_construction", "2013"),
                ],
                Some(TestImage::png()),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let data = res.data();
        assert_eq!(data["name"], "Stade Adrar");
        assert_eq!(data["city"], "Agadir");
        assert_eq!(data["capacity"], 45480);
        assert_eq!(data["latitude"], 30.42);
        assert_eq!(data["year_built"], 2013);

        let image = data["image"].as_str().unwrap();
        assert!(image.starts_with("/uploads/stades/"));
        assert!(image.ends_with(".png"));
        assert!(app.file_exists(image));

        let served = app
            .client
            .get(app.url(&format!("/public{image}")))
            .send()
            .await
            .unwrap();
        assert_eq!(served.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn creates_venue_from_json() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::VENUES,
                &json!({"name": "Stade de Fès", "city": "Fès", "capacity": 45000}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["image"], json!(null));
    }

    #[tokio::test]
    async fn missing_required_fields_is_bad_request() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(routes::VENUES, &[("name", "Stade Adrar")], Some(TestImage::png()))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("city"));
        assert_eq!(app.stored_files("stades"), 0);
    }

    #[tokio::test]
    async fn invalid_values_are_unprocessable_and_store_nothing() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(
                routes::VENUES,
                &[("name", "Stade Adrar"), ("city", "Agadir"), ("capacity", "-5")],
                Some(TestImage::png()),
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["code"], "UNPROCESSABLE");
        assert_eq!(
            res.body["errors"]["capacity"],
            "Capacity must be an integer greater than 0"
        );
        assert_eq!(app.stored_files("stades"), 0);
    }

    #[tokio::test]
    async fn duplicate_name_is_unprocessable() {
        let app = TestApp::spawn().await;
        app.create_venue("Stade Mohammed V", None).await;

        let res = app
            .post_form(
                routes::VENUES,
                &[("name", "Stade Mohammed V"), ("city", "Rabat"), ("capacity", "100")],
                None,
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["errors"]["name"], "This name is already taken");
    }

    #[tokio::test]
    async fn non_image_upload_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(
                routes::VENUES,
                &[("name", "Stade Adrar"), ("city", "Agadir"), ("capacity", "100")],
                Some(TestImage {
                    file_name: "notes.txt",
                    mime: "text/plain",
                    bytes: b"hello".to_vec(),
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().starts_with("Only images are allowed"));
        assert_eq!(app.stored_files("stades"), 0);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn renaming_keeps_the_image() {
        let app = TestApp::spawn().await;
        let id = app.create_venue("Stade Mohammed V", Some(TestImage::png())).await;
        let before = app.get(&routes::venue(id)).await;
        let image = before.data()["image"].as_str().unwrap().to_string();

        let res = app
            .put_form(&routes::venue(id), &[("name", "Stadium X")], None)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Venue updated successfully");
        assert_eq!(res.data()["name"], "Stadium X");
        assert_eq!(res.data()["image"], image.as_str());
        assert_eq!(res.data()["capacity"], before.data()["capacity"]);
        assert!(app.file_exists(&image));
        assert_eq!(app.stored_files("stades"), 1);
    }

    #[tokio::test]
    async fn unparseable_capacity_is_rejected_and_upload_discarded() {
        let app = TestApp::spawn().await;
        let id = app.create_venue("Stade Mohammed V", None).await;

        let res = app
            .put_form(&routes::venue(id), &[("capacite", "abc")], Some(TestImage::png()))
            .await;

        assert_eq!(res.status, 422);
        assert!(res.body["errors"]["capacity"].is_string());
        assert_eq!(app.stored_files("stades"), 0);

        let current = app.get(&routes::venue(id)).await;
        assert_eq!(current.data()["capacity"], 45000);
        assert_eq!(current.data()["image"], json!(null));
    }

    #[tokio::test]
    async fn new_image_replaces_old_file() {
        let app = TestApp::spawn().await;
        let id = app.create_venue("Stade Mohammed V", Some(TestImage::png())).await;
        let old = app.get(&routes::venue(id)).await.data()["image"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app
            .put_form(&routes::venue(id), &[], Some(TestImage::png()))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let new = res.data()["image"].as_str().unwrap();
        assert_ne!(new, old);
        assert!(app.file_exists(new));
        assert!(!app.file_exists(&old));
        assert_eq!(app.stored_files("stades"), 1);
    }

    #[tokio::test]
    async fn remove_image_clears_reference_and_file() {
        let app = TestApp::spawn().await;
        let id = app.create_venue("Stade Mohammed V", Some(TestImage::png())).await;
        let old = app.get(&routes::venue(id)).await.data()["image"]
            .as_str()
            .unwrap()
            .to_string();

        let res = app.put_json(&routes::venue(id), &json!({"image": null})).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["image"], json!(null));
        assert!(!app.file_exists(&old));
    }

    #[tokio::test]
    async fn empty_body_is_bad_request() {
        let app = TestApp::spawn().await;
        let id = app.create_venue("Stade Mohammed V", None).await;

        let res = app.put_json(&routes::venue(id), &json!({})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "No valid fields provided for update");
    }

    #[tokio::test]
    async fn unknown_venue_discards_upload() {
        let app = TestApp::spawn().await;

        let res = app
            .put_form(&routes::venue(404), &[("name", "Ghost")], Some(TestImage::png()))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Venue not found");
        assert_eq!(app.stored_files("stades"), 0);
    }

    #[tokio::test]
    async fn oversized_image_is_payload_too_large() {
        let app = TestApp::spawn().await;
        let id = app.create_venue("Stade Mohammed V", None).await;

        let res = app
            .put_form(
                &routes::venue(id),
                &[("name", "Stadium X")],
                Some(TestImage {
                    file_name: "huge.jpg",
                    mime: "image/jpeg",
                    bytes: vec![0u8; MAX_IMAGE_SIZE as usize + 1],
                }),
            )
            .await;

        assert_eq!(res.status, 413);
        assert_eq!(res.body["code"], "PAYLOAD_TOO_LARGE");
        assert_eq!(app.get(&routes::venue(id)).await.data()["name"], "Stade Mohammed V");
    }

    #[tokio::test]
    async fn repeating_an_update_gives_the_same_record() {
        let app = TestApp::spawn().await;
        let id = app.create_venue("Stade Mohammed V", None).await;
        let body = json!({"capacity": "67000", "longitude": -7.65, "description": "Home of Wydad"});

        let first = app.put_json(&routes::venue(id), &body).await;
        let second = app.put_json(&routes::venue(id), &body).await;

        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(second.status, 200);
        for field in ["name", "city", "capacity", "longitude", "description", "image"] {
            assert_eq!(first.data()[field], second.data()[field], "{field}");
        }
        assert_eq!(second.data()["capacity"], 67000);
    }
}
