//! 探测测试：HEAD 成功路径、GET 降级、文件名三级回退、错误分类。

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::internal::net::{build_download_client, BuildClientParams};
use crate::internal::probe::functions::filename::{
    default_filename, extension_from_content_type, filename_from_content_disposition,
    filename_from_url,
};
use crate::internal::probe::{fetch_server_metadata, ProbeError};
use crate::tests::{mount_file, test_body};

fn plain_client() -> reqwest::Client {
    build_download_client(BuildClientParams {
        headers: &Default::default(),
        cookie: None,
    })
    .expect("构造客户端失败")
}

#[tokio::test]
async fn head_success_extracts_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Accept-Ranges", "bytes")
                .insert_header("Content-Type", "application/pdf")
                .insert_header("Content-Disposition", "attachment; filename=\"report.pdf\""),
        )
        .mount(&server)
        .await;

    let url = format!("{}/files/any", server.uri());
    let metadata = fetch_server_metadata(&plain_client(), &url)
        .await
        .expect("探测应成功");

    assert_eq!(metadata.filename, "report.pdf");
    assert_eq!(metadata.content_type, "application/pdf");
    assert!(metadata.accepts_ranges);
    assert_eq!(metadata.final_url, url);
}

#[tokio::test]
async fn head_rejected_falls_back_to_get() {
    let server = MockServer::start().await;
    let body = test_body(4096);
    mount_file(&server, body, true).await;

    let url = format!("{}/data/archive.zip", server.uri());
    let metadata = fetch_server_metadata(&plain_client(), &url)
        .await
        .expect("GET 降级应成功");

    // 文件名来自 URL 路径末段，大小来自 GET 的 Content-Length
    assert_eq!(metadata.filename, "archive.zip");
    assert_eq!(metadata.size, 4096);
    assert!(metadata.accepts_ranges);
}

#[tokio::test]
async fn http_error_status_is_terminal_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1) // 状态错误不应触发整体重试
        .mount(&server)
        .await;

    let url = format!("{}/missing", server.uri());
    let err = fetch_server_metadata(&plain_client(), &url)
        .await
        .expect_err("404 应失败");

    assert!(matches!(err, ProbeError::HttpStatus(s) if s.as_u16() == 404));
}

#[tokio::test]
async fn transport_error_exhausts_attempts() {
    // 指向无人监听的端口，三次尝试全部连接失败
    let err = fetch_server_metadata(&plain_client(), "http://127.0.0.1:9/none")
        .await
        .expect_err("连接失败应耗尽重试");

    match err {
        ProbeError::Exhausted { attempts, .. } => assert_eq!(attempts, 3),
        other => panic!("预期 Exhausted，得到: {}", other),
    }
}

#[test]
fn content_disposition_prefers_plain_filename() {
    assert_eq!(
        filename_from_content_disposition("attachment; filename=\"a.zip\""),
        Some("a.zip".to_string())
    );
    assert_eq!(
        filename_from_content_disposition("attachment; filename=b.pdf"),
        Some("b.pdf".to_string())
    );
    // filename* 只在 filename 缺席时生效，并做百分号解码
    assert_eq!(
        filename_from_content_disposition("attachment; filename*=UTF-8''%E6%96%87%E6%A1%A3.pdf"),
        Some("文档.pdf".to_string())
    );
    assert_eq!(
        filename_from_content_disposition(
            "attachment; filename=x.bin; filename*=UTF-8''y.bin"
        ),
        Some("x.bin".to_string())
    );
    assert_eq!(filename_from_content_disposition("inline"), None);
}

#[test]
fn url_filename_requires_a_dot() {
    assert_eq!(
        filename_from_url("https://example.com/pub/video.mp4?sig=1"),
        Some("video.mp4".to_string())
    );
    assert_eq!(filename_from_url("https://example.com/pub/latest"), None);
    assert_eq!(
        filename_from_url("https://example.com/%E8%B5%84%E6%96%99.zip"),
        Some("资料.zip".to_string())
    );
}

#[test]
fn default_name_appends_mime_extension() {
    assert_eq!(extension_from_content_type("application/pdf"), ".pdf");
    assert_eq!(extension_from_content_type("image/png; charset=binary"), ".png");
    assert_eq!(extension_from_content_type("application/x-unknown"), "");
    assert_eq!(default_filename("text/html"), "downloaded_file.html");
    assert_eq!(default_filename(""), "downloaded_file");
}
