//! End-to-end tests against a mock gateway
//!
//! Requests go through the real HTTP transport, so they are presigned and
//! encoded exactly as a RADOS gateway would see them.

use rgw_client::{Config, GatewayClient, HeaderOverlay, UploadOptions, UploadStage, UploadTarget};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const MIB: usize = 1024 * 1024;
const UPLOAD_ID: &str = "2~Zx3p9KfYwQe7";

fn client(server: &MockServer) -> GatewayClient {
    let config = Config::new(server.uri()).with_credentials("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG");
    GatewayClient::new(config).unwrap()
}

fn source(len: usize) -> std::io::Cursor<Vec<u8>> {
    std::io::Cursor::new((0..len).map(|i| (i % 251) as u8).collect())
}

async fn mount_initiate(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/media/video.bin"))
        .and(query_param("uploads", ""))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <InitiateMultipartUploadResult xmlns=\"http://s3.amazonaws.com/doc/2006-03-01/\">\
             <Bucket>media</Bucket><Key>video.bin</Key><UploadId>{}</UploadId>\
             </InitiateMultipartUploadResult>",
            UPLOAD_ID
        )))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_part(server: &MockServer, part_number: u32, response: ResponseTemplate, expect: u64) {
    Mock::given(method("PUT"))
        .and(path("/media/video.bin"))
        .and(query_param("partNumber", part_number.to_string()))
        .and(query_param("uploadId", UPLOAD_ID))
        .respond_with(response)
        .expect(expect)
        .mount(server)
        .await;
}

fn stored(part_number: u32) -> ResponseTemplate {
    ResponseTemplate::new(200).insert_header("ETag", format!("\"etag-{}\"", part_number))
}

async fn mount_complete(server: &MockServer, expect: u64) {
    Mock::given(method("POST"))
        .and(path("/media/video.bin"))
        .and(query_param("uploadId", UPLOAD_ID))
        .and(query_param_is_missing("uploads"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<CompleteMultipartUploadResult><Bucket>media</Bucket><Key>video.bin</Key>\
             <ETag>\"3858f62230ac3c915f300c664312c11f-3\"</ETag></CompleteMultipartUploadResult>",
        ))
        .expect(expect)
        .mount(server)
        .await;
}

async fn part_sizes(server: &MockServer) -> Vec<(String, usize)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "PUT")
        .map(|r| {
            let number = r
                .url
                .query_pairs()
                .find(|(k, _)| k == "partNumber")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            (number, r.body.len())
        })
        .collect()
}

async fn manifest(server: &MockServer) -> String {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .find(|r| r.method.as_str() == "POST" && r.url.query().is_some_and(|q| q.contains("uploadId=")))
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .unwrap_or_default()
}

fn target() -> UploadTarget {
    UploadTarget::new("media", "video.bin")
}

#[test_log::test(tokio::test)]
async fn test_twelve_mib_in_three_parts() {
    let server = MockServer::start().await;
    mount_initiate(&server).await;
    for n in 1..=3 {
        mount_part(&server, n, stored(n), 1).await;
    }
    mount_complete(&server, 1).await;

    let client = client(&server);
    let completed = client
        .put_object_multipart(target(), source(12 * MIB), UploadOptions::new(5 * MIB))
        .await
        .unwrap();

    assert_eq!(completed.upload_id, UPLOAD_ID);
    assert_eq!(completed.parts.len(), 3);
    assert_eq!(completed.parts[2].etag, "etag-3");
    assert_eq!(completed.bytes_uploaded, (12 * MIB) as u64);
    assert_eq!(completed.status, 200);

    assert_eq!(
        part_sizes(&server).await,
        vec![("1".to_string(), 5 * MIB), ("2".to_string(), 5 * MIB), ("3".to_string(), 2 * MIB)]
    );
    let manifest = manifest(&server).await;
    assert!(manifest.contains("<Part><PartNumber>1</PartNumber><ETag>etag-1</ETag></Part>"));
    assert!(manifest.contains("<Part><PartNumber>3</PartNumber><ETag>etag-3</ETag></Part>"));
    assert_eq!(manifest.matches("<Part>").count(), 3);
}

#[test_log::test(tokio::test)]
async fn test_initiate_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("uploads", ""))
        .respond_with(ResponseTemplate::new(403).set_body_string(
            "<Error><Code>AccessDenied</Code><Message>Access Denied</Message><RequestId>tx1</RequestId></Error>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT")).respond_with(stored(1)).expect(0).mount(&server).await;

    let err = client(&server)
        .put_object_multipart(target(), source(MIB), UploadOptions::new(5 * MIB))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), UploadStage::Initiate);
    assert!(err.upload_id().is_none());
    match err {
        rgw_client::UploadError::Initiate { source, .. } => assert!(source.is_access_denied()),
        other => panic!("unexpected error: {other}"),
    }
}

#[test_log::test(tokio::test)]
async fn test_second_part_fails() {
    let server = MockServer::start().await;
    mount_initiate(&server).await;
    mount_part(&server, 1, stored(1), 1).await;
    mount_part(
        &server,
        2,
        ResponseTemplate::new(500).set_body_string("<Error><Code>InternalError</Code></Error>"),
        1,
    )
    .await;
    mount_part(&server, 3, stored(3), 0).await;
    mount_complete(&server, 0).await;

    let err = client(&server)
        .put_object_multipart(target(), source(12 * MIB), UploadOptions::new(5 * MIB))
        .await
        .unwrap_err();

    assert_eq!(err.stage(), UploadStage::UploadPart);
    assert_eq!(err.part_number(), Some(2));
    assert_eq!(err.upload_id(), Some(UPLOAD_ID));
    assert_eq!(err.completed_parts().len(), 1);
    assert_eq!(err.completed_parts()[0].etag, "etag-1");
}

#[test_log::test(tokio::test)]
async fn test_exact_part_size_is_one_part() {
    let server = MockServer::start().await;
    mount_initiate(&server).await;
    mount_part(&server, 1, stored(1), 1).await;
    mount_part(&server, 2, stored(2), 0).await;
    mount_complete(&server, 1).await;

    let completed = client(&server)
        .put_object_multipart(target(), source(5 * MIB), UploadOptions::new(5 * MIB))
        .await
        .unwrap();

    assert_eq!(completed.parts.len(), 1);
    assert_eq!(part_sizes(&server).await, vec![("1".to_string(), 5 * MIB)]);
    assert_eq!(manifest(&server).await.matches("<Part>").count(), 1);
}

#[test_log::test(tokio::test)]
async fn test_requests_are_presigned_with_overlay() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("uploads", ""))
        .and(query_param("X-Amz-Algorithm", "AWS4-HMAC-SHA256"))
        .and(query_param("X-Amz-Expires", "60"))
        .and(query_param("X-Amz-SignedHeaders", "host"))
        .and(header("x-amz-meta-origin", "camera-7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<InitiateMultipartUploadResult><UploadId>{}</UploadId></InitiateMultipartUploadResult>",
            UPLOAD_ID
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_part(&server, 1, stored(1), 1).await;
    mount_complete(&server, 1).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let progress = {
        let seen = Arc::clone(&seen);
        Box::new(move |p: rgw_client::UploadProgress| seen.lock().unwrap().push((p.current_part, p.bytes_uploaded)))
    };
    let options = UploadOptions::new(MIB)
        .with_headers(HeaderOverlay::new().with("X-Amz-Meta-Origin", "camera-7").unwrap())
        .with_progress(progress);

    let client = client(&server);
    client.put_object_multipart(target(), source(1000), options).await.unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![(1, 1000)]);

    // The overlay belonged to that upload only
    client.list_buckets(&HeaderOverlay::new()).await.unwrap();
    let requests = server.received_requests().await.unwrap();
    let last: &Request = requests.last().unwrap();
    assert_eq!(last.url.path(), "/");
    assert!(last.headers.get("x-amz-meta-origin").is_none());
    assert!(last.url.query_pairs().any(|(k, _)| k == "X-Amz-Signature"));
}

#[test_log::test(tokio::test)]
async fn test_empty_source_sends_one_empty_part() {
    let server = MockServer::start().await;
    mount_initiate(&server).await;
    mount_part(&server, 1, stored(1), 1).await;
    mount_complete(&server, 1).await;

    let completed = client(&server)
        .put_object_multipart(target(), source(0), UploadOptions::new(5 * MIB))
        .await
        .unwrap();

    assert_eq!(completed.parts.len(), 1);
    assert_eq!(completed.bytes_uploaded, 0);
    assert_eq!(part_sizes(&server).await, vec![("1".to_string(), 0)]);
}

#[test_log::test(tokio::test)]
async fn test_bucket_and_user_calls_return_refusals() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/media"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin/user"))
        .and(query_param("uid", "alice"))
        .respond_with(ResponseTemplate::new(404).set_body_string(
            "<Error><Code>NoSuchUser</Code><Message>user not found</Message></Error>",
        ))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/media"))
        .respond_with(ResponseTemplate::new(409).set_body_string("<Error><Code>BucketNotEmpty</Code></Error>"))
        .mount(&server)
        .await;

    let client = client(&server);
    let none = HeaderOverlay::new();

    assert!(client.create_bucket("media", &none).await.unwrap().is_success());

    let user = client.get_user("alice", &none).await.unwrap();
    assert_eq!(user.status.as_u16(), 404);
    let err = user.error_for_status().unwrap_err();
    assert!(err.is_not_found());

    let deleted = client.delete_bucket("media", &none).await.unwrap();
    assert_eq!(deleted.status.as_u16(), 409);
    assert!(deleted.text().contains("BucketNotEmpty"));
}

#[test_log::test(tokio::test)]
async fn test_harness_runs_case_file() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/media"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/media/note.txt"))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(200).insert_header("ETag", "\"n1\""))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let note = dir.path().join("note.txt");
    std::fs::write(&note, b"remember the milk").unwrap();
    let ini = dir.path().join("radosgw.ini");
    std::fs::write(
        &ini,
        format!("[server]\nhost = {}\n\n[user]\naccessKeyID = AK\nsecretAccessKey = SK\n", server.uri()),
    )
    .unwrap();
    let cases = dir.path().join("radosgw_testcase.json");
    std::fs::write(
        &cases,
        serde_json::json!([
            {"func_name": "CreateBucket", "para_type": "string", "para": "media"},
            {"func_name": "PutObject", "para_type": "ObjectConfig",
             "para": {"Bucket": "media", "Key": "note.txt", "ObjectPath": note},
             "add_customHeader": {"Content-Type": "text/plain"}},
            {"func_name": "ListAllTheThings", "para_type": "string", "para": ""}
        ])
        .to_string(),
    )
    .unwrap();

    let config = rgw_cli::HarnessConfig::load(&ini).unwrap();
    let client = GatewayClient::new(config.client_config()).unwrap();
    let reports = rgw_cli::run_cases(&client, &rgw_cli::load_cases(&cases).unwrap()).await;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[1].result.as_ref().unwrap().status, 200);
    assert!(reports[2].is_failure());
    assert_eq!(reports.iter().filter(|r| r.is_failure()).count(), 1);
}
