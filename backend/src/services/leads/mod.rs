//! # Lead Service Module
//!
//! Routes every `/leads` request to its handler. Plain lead management and the
//! three-step spreadsheet import share the scope:
//!
//! - `GET /leads`: list leads, filtered by status, enquiry, agent name and
//!   creation date range, most recently updated first.
//! - `PUT /leads/{id}`: edit some fields of a lead.
//! - `DELETE /leads/{id}`: remove a lead.
//! - `POST /leads/upload-headers`: store a CSV/XLSX upload and return its
//!   column names with a `fileToken`.
//! - `POST /leads/preview`: map the stored file's columns onto lead fields and
//!   validate every row.
//! - `POST /leads/upload-final`: upsert the rows the user selected.

mod delete;
mod list;
mod preview;
mod update;
mod upload_final;
mod upload_headers;

use crate::error::{json_config, path_config, query_config};
use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/leads";

/// Configures the `/leads` scope. `json_limit` caps JSON request bodies.
pub fn configure_routes(json_limit: usize) -> Scope {
    scope(API_PATH)
        .app_data(json_config(json_limit))
        .app_data(path_config())
        .app_data(query_config())
        .route("", get().to(list::process))
        .route("/upload-headers", post().to(upload_headers::process))
        .route("/preview", post().to(preview::process))
        .route("/upload-final", post().to(upload_final::process))
        .route("/{id}", put().to(update::process))
        .route("/{id}", delete().to(delete::process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::uploads::UploadDir;
    use crate::state::AppState;
    use crate::store::tests::fields;
    use crate::store::LeadStore;
    use actix_web::http::{header, StatusCode};
    use actix_web::test::{self, TestRequest};
    use actix_web::{web, App};
    use common::model::field::{LeadStatus, SystemField};
    use common::responses::{
        LeadListResponse, LeadResponse, MessageResponse, PreviewResponse, UploadFinalResponse,
        UploadHeadersResponse,
    };
    use serde_json::json;
    use tempfile::TempDir;

    const BOUNDARY: &str = "lead-import-boundary";

    fn test_state() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let state = AppState {
            store: LeadStore::open(dir.path().join("leads.sqlite")).unwrap(),
            uploads: UploadDir::open(dir.path().join("uploads")).unwrap(),
            max_upload_bytes: 64 * 1024,
        };
        (dir, state)
    }

    macro_rules! leads_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .service(configure_routes(64 * 1024)),
            )
            .await
        };
    }

    fn upload_request(filename: &str, contents: &[u8]) -> TestRequest {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        TestRequest::post()
            .uri("/leads/upload-headers")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(body)
    }

    #[actix_web::test]
    async fn import_flow_uploads_previews_and_commits() {
        let (_dir, state) = test_state();
        state.store.insert("LD20240101-100", &fields("Old Bob", "5552222")).unwrap();
        let app = leads_app!(state);

        let csv = b"FullName,Mob,Product,State,Why\n\
                    Alice,5551111,Loan,APPROVED,\n\
                    Bob,5552222,Card,pending,\n\
                    ,5553333,Loan,,\n\
                    Dave,5554444,Loan,Rejected,\n";
        let resp = test::call_service(&app, upload_request("march.csv", csv).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let upload: UploadHeadersResponse = test::read_body_json(resp).await;
        assert!(upload.success);
        assert_eq!(upload.file_columns, vec!["FullName", "Mob", "Product", "State", "Why"]);
        assert_eq!(upload.system_fields, SystemField::ALL.to_vec());
        assert!(upload.file_token.ends_with(".csv"));

        let req = TestRequest::post()
            .uri("/leads/preview")
            .set_json(json!({
                "fileToken": upload.file_token,
                "mapping": {
                    "customer_name": "FullName",
                    "mobile_number": "Mob",
                    "enquiry_for": "Product",
                    "status": "State",
                    "rejection_reason": "Why"
                }
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let preview: PreviewResponse = test::read_body_json(resp).await;
        assert_eq!(preview.preview.len(), 4);
        assert_eq!(preview.preview[0].status.as_deref(), Some("approved"));
        assert!(preview.preview[1].duplicate);
        assert_eq!(preview.errors[&4], vec!["customer_name missing"]);
        assert_eq!(
            preview.errors[&5],
            vec!["rejection_reason required when status is rejected"]
        );
        assert_eq!(preview.default_selection(), vec![2, 3]);

        let selected: Vec<_> = preview
            .preview
            .iter()
            .filter(|row| preview.default_selection().contains(&row.row_index))
            .cloned()
            .collect();
        let req = TestRequest::post()
            .uri("/leads/upload-final")
            .set_json(json!({ "rows": selected }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let committed: UploadFinalResponse = test::read_body_json(resp).await;
        assert_eq!(committed.summary.total, 2);
        assert_eq!(committed.summary.inserted, 1);
        assert_eq!(committed.summary.updated, 1);
        assert_eq!(committed.summary.errors, 0);

        let resp = test::call_service(&app, TestRequest::get().uri("/leads").to_request()).await;
        let listed: LeadListResponse = test::read_body_json(resp).await;
        assert_eq!(listed.data.len(), 2);
        let bob = listed.data.iter().find(|l| l.mobile_number == "5552222").unwrap();
        assert_eq!(bob.customer_name, "Bob");
        assert_eq!(bob.lead_id, "LD20240101-100");
    }

    #[actix_web::test]
    async fn unsupported_and_missing_uploads_are_refused() {
        let (dir, state) = test_state();
        let app = leads_app!(state);

        let resp = test::call_service(&app, upload_request("notes.pdf", b"%PDF").to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert!(!body.success);

        let resp = test::call_service(
            &app,
            upload_request("broken.xlsx", b"not a workbook").to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            std::fs::read_dir(dir.path().join("uploads")).unwrap().count(),
            0
        );

        let req = TestRequest::post()
            .uri("/leads/upload-headers")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(format!("--{BOUNDARY}--\r\n"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn preview_reports_bad_and_unknown_tokens() {
        let (_dir, state) = test_state();
        let app = leads_app!(state);

        let preview = |token: &str| {
            TestRequest::post()
                .uri("/leads/preview")
                .set_json(json!({ "fileToken": token, "mapping": {} }))
                .to_request()
        };
        let resp = test::call_service(&app, preview("0123456789abcdef0123456789abcdef.csv")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = test::call_service(&app, preview("../leads.sqlite")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = TestRequest::post()
            .uri("/leads/preview")
            .set_json(json!({ "mapping": {} }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert!(!body.success);
    }

    #[actix_web::test]
    async fn updating_to_a_taken_mobile_number_conflicts() {
        let (_dir, state) = test_state();
        let alice = state.store.insert("LD20240101-111", &fields("Alice", "5551111")).unwrap();
        let bob = state.store.insert("LD20240101-222", &fields("Bob", "5552222")).unwrap();
        let app = leads_app!(state);

        let req = TestRequest::put()
            .uri(&format!("/leads/{}", bob.id))
            .set_json(json!({ "mobile_number": "5551111" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(state.store.get(bob.id).unwrap(), Some(bob.clone()));
        assert_eq!(state.store.get(alice.id).unwrap(), Some(alice.clone()));

        let req = TestRequest::put()
            .uri(&format!("/leads/{}", bob.id))
            .set_json(json!({ "status": "rejected", "rejection_reason": "No budget", "ignored": 1 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated: LeadResponse = test::read_body_json(resp).await;
        assert_eq!(updated.data.status, LeadStatus::Rejected);
        assert_eq!(updated.data.rejection_reason.as_deref(), Some("No budget"));
        assert_eq!(updated.data.mobile_number, "5552222");
    }

    #[actix_web::test]
    async fn update_refuses_empty_bodies_and_unknown_ids() {
        let (_dir, state) = test_state();
        let lead = state.store.insert("LD20240101-111", &fields("Alice", "5551111")).unwrap();
        let app = leads_app!(state);

        let req = TestRequest::put()
            .uri(&format!("/leads/{}", lead.id))
            .set_json(json!({ "leadId": "LD-hijack" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = TestRequest::put()
            .uri(&format!("/leads/{}", lead.id + 100))
            .set_json(json!({ "customer_name": "Nobody" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn deleting_unknown_or_malformed_ids_changes_nothing() {
        let (_dir, state) = test_state();
        let lead = state.store.insert("LD20240101-111", &fields("Alice", "5551111")).unwrap();
        let app = leads_app!(state);

        let req = TestRequest::delete()
            .uri(&format!("/leads/{}", lead.id + 1))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(state.store.count().unwrap(), 1);

        let req = TestRequest::delete().uri("/leads/abc").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: MessageResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "Invalid lead ID");

        let req = TestRequest::delete()
            .uri(&format!("/leads/{}", lead.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.store.count().unwrap(), 0);
    }

    #[actix_web::test]
    async fn listing_filters_by_status_and_creation_window() {
        let (_dir, state) = test_state();
        let mut approved = fields("Alice", "5550001");
        approved.status = LeadStatus::Approved;
        let january = state.store.insert("LD20240101-101", &approved).unwrap();
        approved.mobile_number = "5550002".into();
        let february = state.store.insert("LD20240101-102", &approved).unwrap();
        let pending = state.store.insert("LD20240101-103", &fields("Bob", "5550003")).unwrap();
        state.store.set_timestamps(january.id, "2024-01-20 08:00:00", "2024-01-20 08:00:00").unwrap();
        state.store.set_timestamps(february.id, "2024-02-01 00:00:00", "2024-02-01 00:00:00").unwrap();
        state.store.set_timestamps(pending.id, "2024-01-10 08:00:00", "2024-01-10 08:00:00").unwrap();
        let app = leads_app!(state);

        let req = TestRequest::get()
            .uri("/leads?status=approved&date_from=2024-01-01&date_to=2024-01-31&agent_name=")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let listed: LeadListResponse = test::read_body_json(resp).await;
        let ids: Vec<i64> = listed.data.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![january.id]);

        let req = TestRequest::get().uri("/leads?date_from=01/02/2024").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
