use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;
use farm_association_site::{
    domain::resource::{FileType, Resource},
    services::resource_fetcher::ErrorBody,
};

fn resource(filename: Option<&str>, cloudinary_url: Option<String>) -> Resource {
    Resource {
        id: Uuid::new_v4(),
        title: String::from("Soil health guide"),
        filename: filename.map(String::from),
        cloudinary_url,
        mime_type: None,
        file_type: Some(FileType::Pdf),
        download_count: 0,
    }
}

#[tokio::test]
async fn download_serves_the_local_copy_without_calling_storage() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.storage_server)
        .await;

    test_app.write_media_file("r.pdf", b"%PDF-local");
    let resource = resource(
        Some("r.pdf"),
        Some(format!("{}/r.pdf", test_app.storage_server.uri())),
    );
    test_app.add_resource(resource.clone()).await;

    let response = test_app
        .get_download(&resource.id.to_string(), Some("Report 2024!@#.pdf"))
        .await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"Report 2024.pdf\""
    );
    assert_eq!(response.content_length(), Some(10));
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"%PDF-local");
}

#[tokio::test]
async fn download_falls_back_to_remote_storage() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(method("GET"))
        .and(path("/uploads/guide.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-remote".to_vec()))
        .expect(1)
        .mount(&test_app.storage_server)
        .await;

    let resource = resource(
        Some("guide.pdf"),
        Some(format!("{}/uploads/guide.pdf", test_app.storage_server.uri())),
    );
    test_app.add_resource(resource.clone()).await;

    let response = test_app
        .get_download(&resource.id.to_string(), None)
        .await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"download.pdf\""
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"%PDF-remote");
}

#[tokio::test]
async fn download_reports_upstream_failures_with_502() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&test_app.storage_server)
        .await;

    let resource = resource(None, Some(format!("{}/gone.pdf", test_app.storage_server.uri())));
    test_app.add_resource(resource.clone()).await;

    let response = test_app
        .get_download(&resource.id.to_string(), None)
        .await;

    assert_eq!(502, response.status().as_u16());
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Failed to fetch file from storage");
    assert_eq!(body.details.unwrap(), "Storage responded with status 503");
}

#[tokio::test]
async fn download_of_an_unknown_resource_returns_404() {
    let test_app = TestApp::spawn_app().await;

    for resource_id in [Uuid::new_v4().to_string(), String::from("not-a-uuid")] {
        let response = test_app.get_download(&resource_id, None).await;

        assert_eq!(404, response.status().as_u16());
        let body: ErrorBody = response.json().await.unwrap();
        assert_eq!(body.error, "Resource not found");
    }
}

#[tokio::test]
async fn download_of_a_resource_without_file_returns_404() {
    let test_app = TestApp::spawn_app().await;
    let resource = resource(Some("never-uploaded.pdf"), None);
    test_app.add_resource(resource.clone()).await;

    let response = test_app
        .get_download(&resource.id.to_string(), None)
        .await;

    assert_eq!(404, response.status().as_u16());
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "File not available");
}

#[tokio::test]
async fn download_increments_the_download_count() {
    let test_app = TestApp::spawn_app().await;
    test_app.write_media_file("r.pdf", b"%PDF");
    let resource = resource(Some("r.pdf"), None);
    test_app.add_resource(resource.clone()).await;

    test_app
        .get_download(&resource.id.to_string(), None)
        .await
        .error_for_status()
        .unwrap();

    let mut download_count = None;
    for _ in 0..50 {
        download_count = test_app.resources.download_count(resource.id).await;
        if download_count == Some(1) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(download_count, Some(1));
}

#[tokio::test]
async fn download_succeeds_when_the_counter_update_fails() {
    let test_app = TestApp::spawn_app().await;
    test_app.resources.set_failing_increments(true);
    test_app.write_media_file("r.pdf", b"%PDF");
    let resource = resource(Some("r.pdf"), None);
    test_app.add_resource(resource.clone()).await;

    let response = test_app
        .get_download(&resource.id.to_string(), Some("Guide"))
        .await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"%PDF");
}

#[tokio::test]
async fn download_uses_the_generic_content_type_for_unknown_files() {
    let test_app = TestApp::spawn_app().await;
    test_app.write_media_file("data.bin", b"\x00\x01");
    let mut resource = resource(Some("data.bin"), None);
    resource.file_type = None;
    test_app.add_resource(resource.clone()).await;

    let response = test_app
        .get_download(&resource.id.to_string(), None)
        .await;

    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
}
