//! 单线程下载测试：小文件整流、与多线程结果等价、断流后的整文件重试。

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::internal::download::structs::download_job::DownloadJob;
use crate::internal::download::structs::download_status::DownloadStatus;
use crate::tests::{mount_file, test_body, CountingObserver, EventCounts};

/// 1 MiB、服务器不支持 Range：走单线程，一次 on_start / on_finish，
/// 零分片事件，输出与源字节一致。
#[tokio::test]
async fn small_file_without_ranges_downloads_single_stream() {
    let server = MockServer::start().await;
    let body = test_body(1_048_576);
    mount_file(&server, body.clone(), false).await;

    let dir = tempfile::tempdir().unwrap();
    let counts = EventCounts::new();
    let job = DownloadJob::builder(format!("{}/files/s1.bin", server.uri()))
        .output_dir(dir.path())
        .filename("s1.bin")
        .with_observer(CountingObserver {
            counts: counts.clone(),
        })
        .build();
    let controller = job.controller();

    job.start().await.expect("下载应成功");

    assert_eq!(controller.status(), DownloadStatus::Completed);
    assert!(!controller.is_multi_stream());
    assert_eq!(controller.bytes_done(), 1_048_576);

    let saved = std::fs::read(dir.path().join("s1.bin")).unwrap();
    assert_eq!(saved, body);

    assert_eq!(EventCounts::get(&counts.start), 1);
    assert_eq!(EventCounts::get(&counts.finish), 1);
    assert_eq!(EventCounts::get(&counts.chunk_start), 0);
    assert_eq!(EventCounts::get(&counts.chunk_finish), 0);
    assert_eq!(EventCounts::get(&counts.error), 0);
    assert_eq!(EventCounts::get(&counts.stop), 0);
}

/// 强制单线程与多线程分片在同一来源上产出完全相同的字节。
#[tokio::test]
async fn forced_single_stream_matches_multi_stream_output() {
    let server = MockServer::start().await;
    let body = test_body(12 * 1024 * 1024);
    mount_file(&server, body.clone(), true).await;

    let dir = tempfile::tempdir().unwrap();
    let url = format!("{}/files/same.bin", server.uri());

    let single = DownloadJob::builder(&url)
        .output_dir(dir.path())
        .filename("single.bin")
        .worker_count(1)
        .build();
    single.start().await.expect("单线程应成功");
    assert!(!single.controller().is_multi_stream());

    let multi = DownloadJob::builder(&url)
        .output_dir(dir.path())
        .filename("multi.bin")
        .worker_count(4)
        .build();
    multi.start().await.expect("多线程应成功");
    assert!(multi.controller().is_multi_stream());

    let single_bytes = std::fs::read(dir.path().join("single.bin")).unwrap();
    let multi_bytes = std::fs::read(dir.path().join("multi.bin")).unwrap();
    assert_eq!(single_bytes, body);
    assert_eq!(single_bytes, multi_bytes);
}

/// 响应体提前断流一次：按瞬时故障整文件重试，进度计数清零重计
/// 且不重置本次运行的计时，最终字节与源一致。
#[tokio::test]
async fn premature_eof_retries_single_stream_from_scratch() {
    let server = MockServer::start().await;
    let body = test_body(256 * 1024);

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    // 第一个 GET 归探测降级（完整 Content-Length），第二个 GET
    // 只送出前 64 KiB 便断流，之后恢复正常
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body[..64 * 1024].to_vec()))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let job = DownloadJob::builder(format!("{}/files/flaky.bin", server.uri()))
        .output_dir(dir.path())
        .filename("flaky.bin")
        .max_retries(3)
        .build();
    let controller = job.controller();

    job.start().await.expect("断流重试后应完成");

    assert_eq!(controller.status(), DownloadStatus::Completed);
    // 从头重试清零重计：计数恰等于文件大小，而不是两次尝试之和
    assert_eq!(controller.bytes_done(), 256 * 1024);
    assert_eq!(controller.percentage(), 100.0);
    // 开始时间跨重试保持不变，时长可读
    assert!(controller.elapsed().is_some());
    let snapshot = controller.snapshot();
    assert!(snapshot.started_at.is_some());

    let saved = std::fs::read(dir.path().join("flaky.bin")).unwrap();
    assert_eq!(saved, body);
}

/// 输出文件已存在时，新任务规划出带序号的新路径，不覆盖旧文件。
#[tokio::test]
async fn existing_file_gets_numbered_sibling() {
    let server = MockServer::start().await;
    let body = test_body(64 * 1024);
    mount_file(&server, body.clone(), false).await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dup.bin"), b"old").unwrap();

    let job = DownloadJob::builder(format!("{}/files/dup.bin", server.uri()))
        .output_dir(dir.path())
        .filename("dup.bin")
        .build();
    job.start().await.expect("下载应成功");

    assert_eq!(
        job.controller().output_path().unwrap(),
        dir.path().join("dup (1).bin")
    );
    assert_eq!(std::fs::read(dir.path().join("dup.bin")).unwrap(), b"old");
    assert_eq!(
        std::fs::read(dir.path().join("dup (1).bin")).unwrap(),
        body
    );
}
