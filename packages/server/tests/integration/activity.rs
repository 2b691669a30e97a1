use serde_json::json;

use crate::common::{TestApp, TestImage, routes};

mod reads {
    use super::*;

    #[tokio::test]
    async fn activities_carry_their_venue() {
        let app = TestApp::spawn().await;
        let venue = app.create_venue("Stade Mohammed V", None).await;
        let id = app.create_activity(venue, None).await;

        let one = app.get(&routes::activity(id)).await;
        assert_eq!(one.status, 200, "{}", one.text);
        assert_eq!(one.data()["venue_id"], venue);
        assert_eq!(one.data()["venue_name"], "Stade Mohammed V");
        assert_eq!(one.data()["venue_city"], "Casablanca");

        let all = app.get(routes::ACTIVITIES).await;
        assert_eq!(all.status, 200);
        assert_eq!(all.body["count"], 1);
        assert_eq!(all.body["data"][0]["venue_name"], "Stade Mohammed V");
    }

    #[tokio::test]
    async fn newest_activity_is_listed_first() {
        let app = TestApp::spawn().await;
        let venue = app.create_venue("Stade Mohammed V", None).await;
        let first = app.create_activity(venue, None).await;
        let second = app.create_activity(venue, None).await;

        let all = app.get(routes::ACTIVITIES).await;

        assert_eq!(all.body["data"][0]["id"], second);
        assert_eq!(all.body["data"][1]["id"], first);
    }

    #[tokio::test]
    async fn unknown_activity_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::activity(77)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Activity not found");
    }
}

mod creation {
    use super::*;

    #[tokio::test]
    async fn creates_activity_with_image() {
        let app = TestApp::spawn().await;
        let venue = app.create_venue("Stade Mohammed V", None).await;
        let venue_id = venue.to_string();

        let res = app
            .post_form(
                routes::ACTIVITIES,
                &[
                    ("nom", "Museum night"),
                    ("stade_id", &venue_id),
                    ("category", "culture"),
                    ("price", "25.5"),
                    ("address", "Bd Ghandi"),
                    ("rating", "4.5"),
                ],
                Some(TestImage::png()),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"], "Activity created successfully");
        let data = res.data();
        assert_eq!(data["name"], "Museum night");
        assert_eq!(data["price"], 25.5);
        assert_eq!(data["rating"], 4.5);
        assert_eq!(data["venue_name"], "Stade Mohammed V");
        let image = data["image"].as_str().unwrap();
        assert!(image.starts_with("/uploads/activities/"));
        assert!(app.file_exists(image));
    }

    #[tokio::test]
    async fn unknown_venue_is_unprocessable() {
        let app = TestApp::spawn().await;

        let res = app
            .post_form(
                routes::ACTIVITIES,
                &[
                    ("name", "Stadium tour"),
                    ("venue_id", "999"),
                    ("category", "tour"),
                    ("price", "10"),
                    ("address", "Bd Ghandi"),
                ],
                Some(TestImage::png()),
            )
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["message"], "Referenced record does not exist");
        assert_eq!(res.body["errors"]["venue_id"], "Venue does not exist");
        assert_eq!(app.stored_files("activities"), 0);
    }

    #[tokio::test]
    async fn missing_fields_are_listed() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::ACTIVITIES, &json!({"name": "Stadium tour"}))
            .await;

        assert_eq!(res.status, 400);
        let message = res.body["message"].as_str().unwrap();
        assert!(message.starts_with("Missing required fields"));
        assert!(message.contains("price"));
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn unknown_venue_writes_nothing_and_discards_upload() {
        let app = TestApp::spawn().await;
        let venue = app.create_venue("Stade Mohammed V", None).await;
        let id = app.create_activity(venue, None).await;

        let res = app
            .put_form(&routes::activity(id), &[("venueId", "999")], Some(TestImage::png()))
            .await;

        assert_eq!(res.status, 422);
        assert_eq!(res.body["errors"]["venue_id"], "Venue does not exist");
        assert_eq!(app.stored_files("activities"), 0);

        let current = app.get(&routes::activity(id)).await;
        assert_eq!(current.data()["venue_id"], venue);
        assert_eq!(current.data()["image"], json!(null));
    }

    #[tokio::test]
    async fn moving_to_another_venue_returns_enriched_record() {
        let app = TestApp::spawn().await;
        let first = app.create_venue("Stade Mohammed V", None).await;
        let second = app.create_venue("Stade Adrar", None).await;
        let id = app.create_activity(first, None).await;

        let res = app
            .put_json(&routes::activity(id), &json!({"venueId": second, "rating": null}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["venue_id"], second);
        assert_eq!(res.data()["venue_name"], "Stade Adrar");
        assert_eq!(res.data()["rating"], json!(null));
        assert_eq!(res.data()["name"], "Stadium tour");
    }

    #[tokio::test]
    async fn negative_price_is_unprocessable() {
        let app = TestApp::spawn().await;
        let venue = app.create_venue("Stade Mohammed V", None).await;
        let id = app.create_activity(venue, None).await;

        let res = app.put_json(&routes::activity(id), &json!({"price": -1})).await;

        assert_eq!(res.status, 422);
        assert_eq!(
            res.body["errors"]["price"],
            "Price must be greater than or equal to 0"
        );
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_removes_row_and_image() {
        let app = TestApp::spawn().await;
        let venue = app.create_venue("Stade Mohammed V", None).await;
        let id = app.create_activity(venue, Some(TestImage::png())).await;
        let image = app.get(&routes::activity(id)).await.data()["image"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(app.file_exists(&image));

        let res = app.delete(&routes::activity(id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"], "Activity deleted successfully");
        assert_eq!(res.data()["id"], id);
        assert_eq!(res.data()["image"], image.as_str());
        assert!(!app.file_exists(&image));
        assert_eq!(app.get(&routes::activity(id)).await.status, 404);
    }

    #[tokio::test]
    async fn deleting_unknown_activity_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.delete(&routes::activity(12)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
