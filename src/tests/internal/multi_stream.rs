//! 多线程分片下载测试：分片事件、奇数大小、断点续传、暂停/取消、
//! 瞬时故障重试与终态失败清理。

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::download_job::DownloadJob;
use crate::internal::download::structs::download_status::DownloadStatus;
use crate::tests::{
    mount_file, mount_file_with, test_body, wait_for_status, CountingObserver, EventCounts,
    RangedFileResponder,
};

const MIB: usize = 1024 * 1024;

/// 10 MiB、4 线程：四等分，四次 chunk_start/chunk_finish，合并后字节一致。
#[tokio::test]
async fn four_workers_split_evenly_and_merge() {
    let server = MockServer::start().await;
    let body = test_body(10 * MIB);
    mount_file(&server, body.clone(), true).await;

    let dir = tempfile::tempdir().unwrap();
    let counts = EventCounts::new();
    let job = DownloadJob::builder(format!("{}/files/s2.bin", server.uri()))
        .output_dir(dir.path())
        .filename("s2.bin")
        .worker_count(4)
        .with_observer(CountingObserver {
            counts: counts.clone(),
        })
        .build();
    let controller = job.controller();

    job.start().await.expect("下载应成功");

    assert_eq!(controller.status(), DownloadStatus::Completed);
    let chunk_views = controller.chunk_progress();
    assert_eq!(chunk_views.len(), 4);
    for view in &chunk_views {
        assert_eq!(view.expected_total, 2_621_440);
        assert!(view.is_complete);
    }

    assert_eq!(EventCounts::get(&counts.chunk_start), 4);
    assert_eq!(EventCounts::get(&counts.chunk_finish), 4);
    assert_eq!(EventCounts::get(&counts.assemble_start), 1);
    assert_eq!(EventCounts::get(&counts.assemble_finish), 1);
    assert_eq!(EventCounts::get(&counts.finish), 1);

    let saved = std::fs::read(dir.path().join("s2.bin")).unwrap();
    assert_eq!(saved, body);
    // 合并后分片临时文件应消失
    for i in 0..4 {
        assert!(!dir.path().join(format!("s2 ({}).udtemp", i)).exists());
    }
}

/// 奇数大小：余数进倒数第二个分片（下标 2）。
#[tokio::test]
async fn odd_size_puts_remainder_in_second_to_last_chunk() {
    let server = MockServer::start().await;
    let body = test_body(10 * MIB + 1);
    mount_file(&server, body.clone(), true).await;

    let dir = tempfile::tempdir().unwrap();
    let job = DownloadJob::builder(format!("{}/files/s3.bin", server.uri()))
        .output_dir(dir.path())
        .filename("s3.bin")
        .worker_count(4)
        .build();
    let controller = job.controller();

    job.start().await.expect("下载应成功");

    let sizes: Vec<u64> = controller
        .chunk_progress()
        .iter()
        .map(|c| c.expected_total)
        .collect();
    assert_eq!(sizes, vec![2_621_440, 2_621_440, 2_621_441, 2_621_440]);

    let saved = std::fs::read(dir.path().join("s3.bin")).unwrap();
    assert_eq!(saved, body);
}

/// 预置分片临时文件：完整分片被跳过，半截分片从其长度处续传。
#[tokio::test]
async fn workers_resume_from_partial_chunk_files() {
    let server = MockServer::start().await;
    let body = test_body(12 * MIB);
    mount_file(&server, body.clone(), true).await;

    let dir = tempfile::tempdir().unwrap();
    // 12 MiB / 3 线程 = 每片 4 MiB 整
    let chunk_size = 4 * MIB;
    // 分片 0 已完整，分片 1 已有前 1000 字节
    std::fs::write(dir.path().join("seeded (0).udtemp"), &body[..chunk_size]).unwrap();
    std::fs::write(
        dir.path().join("seeded (1).udtemp"),
        &body[chunk_size..chunk_size + 1000],
    )
    .unwrap();

    let counts = EventCounts::new();
    let job = DownloadJob::builder(format!("{}/files/seeded.bin", server.uri()))
        .output_dir(dir.path())
        .filename("seeded.bin")
        .worker_count(3)
        .with_observer(CountingObserver {
            counts: counts.clone(),
        })
        .build();

    job.start().await.expect("续传下载应成功");

    let saved = std::fs::read(dir.path().join("seeded.bin")).unwrap();
    assert_eq!(saved, body);

    // 跳过的分片不触发 chunk_start，但计入 chunk_finish
    assert_eq!(EventCounts::get(&counts.chunk_start), 2);
    assert_eq!(EventCounts::get(&counts.chunk_finish), 3);

    let requests = server.received_requests().await.unwrap();
    let ranges: Vec<String> = requests
        .iter()
        .filter_map(|r| r.headers.get("range"))
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();
    // 分片 0 完整：不应再有从 0 开始的整片请求
    assert!(!ranges.iter().any(|r| r == "bytes=0-4194303"));
    // 分片 1 从 4194304 + 1000 处续传
    assert!(ranges.iter().any(|r| r == "bytes=4195304-8388607"));
}

/// 取消后分片临时文件保留；同一任务再次 start 续传完成，字节与源一致。
#[tokio::test]
async fn cancel_keeps_partials_and_restart_completes() {
    let server = MockServer::start().await;
    let body = test_body(10 * MIB);
    mount_file_with(
        &server,
        RangedFileResponder::new(body.clone(), true)
            .with_range_delay(Duration::from_millis(400)),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let counts = EventCounts::new();
    let job = Arc::new(
        DownloadJob::builder(format!("{}/files/s5.bin", server.uri()))
            .output_dir(dir.path())
            .filename("s5.bin")
            .worker_count(4)
            .with_observer(CountingObserver {
                counts: counts.clone(),
            })
            .build(),
    );
    let controller = job.controller();

    let run = {
        let job = Arc::clone(&job);
        tokio::spawn(async move { job.start().await })
    };

    wait_for_status(&controller, DownloadStatus::InProgress).await;
    controller.cancel();

    let result = run.await.unwrap();
    assert!(matches!(result, Err(DownloadError::Cancelled)));
    assert_eq!(controller.status(), DownloadStatus::Stopped);
    assert_eq!(EventCounts::get(&counts.stop), 1);
    assert_eq!(EventCounts::get(&counts.error), 0);

    // 取消保留分片临时文件，最终文件不存在
    for i in 0..4 {
        assert!(dir.path().join(format!("s5 ({}).udtemp", i)).exists());
    }
    assert!(!dir.path().join("s5.bin").exists());

    // 同一任务再次启动：按临时文件长度续传并完成
    job.start().await.expect("重启后应完成");
    assert_eq!(controller.status(), DownloadStatus::Completed);
    let saved = std::fs::read(dir.path().join("s5.bin")).unwrap();
    assert_eq!(saved, body);
    for i in 0..4 {
        assert!(!dir.path().join(format!("s5 ({}).udtemp", i)).exists());
    }
}

/// 暂停后全部 worker 停止产出字节，恢复后完成且字节一致。
#[tokio::test]
async fn pause_freezes_all_workers_until_resume() {
    let server = MockServer::start().await;
    let body = test_body(10 * MIB);
    mount_file_with(
        &server,
        RangedFileResponder::new(body.clone(), true)
            .with_range_delay(Duration::from_millis(500)),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let counts = EventCounts::new();
    let job = Arc::new(
        DownloadJob::builder(format!("{}/files/s4.bin", server.uri()))
            .output_dir(dir.path())
            .filename("s4.bin")
            .worker_count(4)
            .with_observer(CountingObserver {
                counts: counts.clone(),
            })
            .build(),
    );
    let controller = job.controller();

    let run = {
        let job = Arc::clone(&job);
        tokio::spawn(async move { job.start().await })
    };

    wait_for_status(&controller, DownloadStatus::InProgress).await;
    controller.pause().await;
    assert_eq!(controller.status(), DownloadStatus::Paused);
    assert_eq!(EventCounts::get(&counts.pause), 1);

    // 响应到达后 worker 应阻塞在暂停门上，字节数不再增长
    tokio::time::sleep(Duration::from_millis(700)).await;
    let frozen = controller.bytes_done();
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(controller.bytes_done(), frozen, "暂停期间不应产出字节");

    controller.resume().await;
    assert_eq!(EventCounts::get(&counts.resume), 1);

    run.await.unwrap().expect("恢复后应完成");
    let saved = std::fs::read(dir.path().join("s4.bin")).unwrap();
    assert_eq!(saved, body);
}

/// 某分片首次请求 503：按瞬时故障重试后任务整体成功。
#[tokio::test]
async fn transient_chunk_failure_is_retried() {
    let server = MockServer::start().await;
    let body = test_body(10 * MIB);

    // 第一个分片的首个请求返回 503，之后恢复正常
    Mock::given(method("GET"))
        .and(header("Range", "bytes=0-2621439"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_file(&server, body.clone(), true).await;

    let dir = tempfile::tempdir().unwrap();
    let counts = EventCounts::new();
    let job = DownloadJob::builder(format!("{}/files/s6.bin", server.uri()))
        .output_dir(dir.path())
        .filename("s6.bin")
        .worker_count(4)
        .max_retries(3)
        .with_observer(CountingObserver {
            counts: counts.clone(),
        })
        .build();

    job.start().await.expect("重试后应成功");

    assert_eq!(EventCounts::get(&counts.chunk_error), 0);
    assert_eq!(EventCounts::get(&counts.finish), 1);
    let saved = std::fs::read(dir.path().join("s6.bin")).unwrap();
    assert_eq!(saved, body);
}

/// 某分片持续 404：任务失败，分片临时文件被清理，错误事件各一次。
#[tokio::test]
async fn terminal_chunk_failure_cleans_up_partials() {
    let server = MockServer::start().await;
    let body = test_body(10 * MIB);

    Mock::given(method("GET"))
        .and(header("Range", "bytes=0-2621439"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_file(&server, body.clone(), true).await;

    let dir = tempfile::tempdir().unwrap();
    let counts = EventCounts::new();
    let job = DownloadJob::builder(format!("{}/files/bad.bin", server.uri()))
        .output_dir(dir.path())
        .filename("bad.bin")
        .worker_count(4)
        .with_observer(CountingObserver {
            counts: counts.clone(),
        })
        .build();
    let controller = job.controller();

    let result = job.start().await;
    assert!(matches!(result, Err(DownloadError::ChunkFailed { .. })));
    assert_eq!(controller.status(), DownloadStatus::Failed);
    assert!(controller.last_error().is_some());

    assert_eq!(EventCounts::get(&counts.chunk_error), 1);
    assert_eq!(EventCounts::get(&counts.error), 1);
    assert_eq!(EventCounts::get(&counts.finish), 0);

    // 真实失败删除全部分片临时文件，最终文件不产生
    for i in 0..4 {
        assert!(!dir.path().join(format!("bad ({}).udtemp", i)).exists());
    }
    assert!(!dir.path().join("bad.bin").exists());
}
