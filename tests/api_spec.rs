use axum::http::StatusCode;
use axum_test::TestServer;
use liftlog::api::{create_router, NextWeightResponse};
use liftlog::db::Database;
use liftlog::models::*;
use serde_json::json;
use uuid::Uuid;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let app = create_router(db);
    TestServer::new(app).expect("Failed to create test server")
}

async fn create_bench(server: &TestServer) -> Lift {
    server
        .post("/api/lifts")
        .json(&json!({
            "name": "Bench Press",
            "equipment": "barbell",
            "top_set_progression": {
                "num_sets": 3,
                "top_weight": 250.0,
                "percent_up": 5.0,
                "percent_down": 10.0
            },
            "sets": [
                { "target_weight": 250.0, "target_min_reps": 8, "target_max_reps": 12 },
                { "target_weight": 225.0 },
                { "target_weight": 200.0 }
            ]
        }))
        .await
        .json::<Lift>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod lifts {
    use super::*;

    #[tokio::test]
    async fn list_returns_json_array() {
        let server = setup();
        let response = server.get("/api/lifts").await;

        response.assert_status_ok();
        let lifts: Vec<Lift> = response.json();
        assert!(lifts.is_empty());
    }

    #[tokio::test]
    async fn create_returns_created_lift_with_normalized_name() {
        let server = setup();
        let response = server
            .post("/api/lifts")
            .json(&json!({ "name": "bench press" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let lift: Lift = response.json();
        assert_eq!(lift.name, "bench_press");
        assert!(lift.sets.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let server = setup();
        create_bench(&server).await;

        let response = server
            .post("/api/lifts")
            .json(&json!({ "name": "bench press" }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_rejects_invalid_step() {
        let server = setup();
        let response = server
            .post("/api/lifts")
            .json(&json!({ "name": "row", "weight_step": 0.0 }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn create_rejects_oversized_progression() {
        let server = setup();
        let response = server
            .post("/api/lifts")
            .json(&json!({
                "name": "press",
                "weight_step": 5.0,
                "top_set_progression": {
                    "num_sets": 2_000_000,
                    "top_weight": 100.0,
                    "percent_up": 5.0,
                    "percent_down": 0.0
                }
            }))
            .await;

        response.assert_status_bad_request();
        let lifts: Vec<Lift> = server.get("/api/lifts").await.json();
        assert!(lifts.is_empty());
    }

    #[tokio::test]
    async fn get_returns_lift_with_sets() {
        let server = setup();
        let created = create_bench(&server).await;

        let response = server.get(&format!("/api/lifts/{}", created.id)).await;

        response.assert_status_ok();
        let lift: Lift = response.json();
        assert_eq!(lift.sets.len(), 3);
        assert_eq!(lift.sets[0].target_min_reps, Some(8));
        assert_eq!(lift.weight_step, Some(5.0));
    }

    #[tokio::test]
    async fn get_returns_404_for_missing_lift() {
        let server = setup();
        let response = server.get(&format!("/api/lifts/{}", Uuid::new_v4())).await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn update_merges_fields() {
        let server = setup();
        let created = create_bench(&server).await;

        let response = server
            .put(&format!("/api/lifts/{}", created.id))
            .json(&json!({ "name": "Paused Bench" }))
            .await;

        response.assert_status_ok();
        let lift: Lift = response.json();
        assert_eq!(lift.name, "paused_bench");
        assert_eq!(lift.sets.len(), 3);
        assert_eq!(lift.top_set_progression, created.top_set_progression);
    }

    #[tokio::test]
    async fn update_returns_404_for_missing_lift() {
        let server = setup();
        let response = server
            .put(&format!("/api/lifts/{}", Uuid::new_v4()))
            .json(&json!({ "name": "anything" }))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_returns_204_then_404() {
        let server = setup();
        let created = create_bench(&server).await;
        let path = format!("/api/lifts/{}", created.id);

        server.delete(&path).await.assert_status(StatusCode::NO_CONTENT);
        server.get(&path).await.assert_status_not_found();
        server.delete(&path).await.assert_status_not_found();
    }
}

mod sets {
    use super::*;

    #[tokio::test]
    async fn add_appends_with_next_index() {
        let server = setup();
        let created = create_bench(&server).await;

        let response = server
            .post(&format!("/api/lifts/{}/sets", created.id))
            .json(&json!({ "target_weight": 180.0, "reps": 12 }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let set: LiftSet = response.json();
        assert_eq!(set.set_index, 3);
        assert_eq!(set.lift_id, created.id);
        assert_eq!(set.reps, Some(12));
    }

    #[tokio::test]
    async fn add_returns_404_for_missing_lift() {
        let server = setup();
        let response = server
            .post(&format!("/api/lifts/{}/sets", Uuid::new_v4()))
            .json(&json!({ "target_weight": 100.0 }))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn record_updates_actual_performance() {
        let server = setup();
        let created = create_bench(&server).await;

        let response = server
            .put(&format!("/api/lifts/{}/sets/0", created.id))
            .json(&json!({ "reps": 10, "weight": 250.0 }))
            .await;

        response.assert_status_ok();
        let set: LiftSet = response.json();
        assert_eq!(set.reps, Some(10));
        assert!(set.in_rep_range());
    }

    #[tokio::test]
    async fn record_returns_404_for_missing_set() {
        let server = setup();
        let created = create_bench(&server).await;

        let response = server
            .put(&format!("/api/lifts/{}/sets/9", created.id))
            .json(&json!({ "reps": 10 }))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn next_weight_uses_default_percentage() {
        let server = setup();
        let created = create_bench(&server).await;

        let response = server
            .get(&format!("/api/lifts/{}/sets/0/next-weight", created.id))
            .await;

        response.assert_status_ok();
        let suggestion: NextWeightResponse = response.json();
        assert_eq!(suggestion.current_weight, 250.0);
        assert_eq!(suggestion.percent, 2.5);
        assert_eq!(suggestion.next_weight, 255.0);
    }

    #[tokio::test]
    async fn next_weight_accepts_a_percentage() {
        let server = setup();
        let created = create_bench(&server).await;

        let response = server
            .get(&format!("/api/lifts/{}/sets/0/next-weight", created.id))
            .add_query_param("percent", 10)
            .await;

        response.assert_status_ok();
        let suggestion: NextWeightResponse = response.json();
        assert_eq!(suggestion.next_weight, 275.0);
    }

    #[tokio::test]
    async fn next_weight_requires_a_step() {
        let server = setup();
        let lift: Lift = server
            .post("/api/lifts")
            .json(&json!({ "name": "plank", "sets": [{ "target_weight": 0.0 }] }))
            .await
            .json();

        let response = server
            .get(&format!("/api/lifts/{}/sets/0/next-weight", lift.id))
            .await;
        response.assert_status_bad_request();
    }
}

mod progression {
    use super::*;

    #[tokio::test]
    async fn next_creates_progressed_lift() {
        let server = setup();
        let created = create_bench(&server).await;

        let response = server
            .post(&format!("/api/lifts/{}/next", created.id))
            .await;

        response.assert_status(StatusCode::CREATED);
        let next: Lift = response.json();
        let targets: Vec<_> = next.sets.iter().map(|s| s.target_weight).collect();
        assert_eq!(targets, vec![Some(265.0), Some(240.0), Some(215.0)]);
        assert_eq!(next.previous_lift_id, Some(created.id));
        assert_eq!(next.name, "bench_press");

        let lifts: Vec<Lift> = server.get("/api/lifts").await.json();
        assert_eq!(lifts.len(), 2);
    }

    #[tokio::test]
    async fn next_rejects_lift_without_progression() {
        let server = setup();
        let lift: Lift = server
            .post("/api/lifts")
            .json(&json!({
                "name": "squat",
                "equipment": "barbell",
                "sets": [{ "target_weight": 315.0 }]
            }))
            .await
            .json();

        let response = server.post(&format!("/api/lifts/{}/next", lift.id)).await;
        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn next_returns_404_for_missing_lift() {
        let server = setup();
        let response = server
            .post(&format!("/api/lifts/{}/next", Uuid::new_v4()))
            .await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn history_lists_the_chain_oldest_first() {
        let server = setup();
        let first = create_bench(&server).await;
        let second: Lift = server
            .post(&format!("/api/lifts/{}/next", first.id))
            .await
            .json();

        let response = server
            .get(&format!("/api/lifts/{}/history", second.id))
            .await;

        response.assert_status_ok();
        let history: Vec<Lift> = response.json();
        let ids: Vec<Uuid> = history.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }
}
