//! 响应式属性测试：基础读写、watch 监听、多监听者广播、销毁语义。

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::internal::states::{ReactiveProperty, ReactivePropertyError};

// ═══════════════════════════ 基础读写 ═══════════════════════════

#[tokio::test]
async fn basic_update_and_read() {
    let prop = ReactiveProperty::new(0u64);
    assert_eq!(prop.get_current(), Some(0));

    prop.update(42).unwrap();
    assert_eq!(prop.get_current(), Some(42));
}

#[tokio::test]
async fn clone_shares_state() {
    let prop = ReactiveProperty::new(String::from("a"));
    let other = prop.clone();

    prop.update(String::from("b")).unwrap();
    assert_eq!(other.get_current().as_deref(), Some("b"));
}

// ═══════════════════════════ watch 监听 ═══════════════════════════

#[tokio::test]
async fn watcher_receives_updates_in_order() {
    let prop = ReactiveProperty::new(0i32);
    let mut watcher = prop.watch();

    prop.update(1).unwrap();
    assert_eq!(watcher.changed().await.unwrap(), 1);

    prop.update(2).unwrap();
    assert_eq!(watcher.changed().await.unwrap(), 2);
}

#[tokio::test]
async fn watcher_blocks_until_change() {
    let prop = ReactiveProperty::new(0i32);
    let mut watcher = prop.watch();

    // 无更新时 changed 应持续挂起
    let result = timeout(Duration::from_millis(100), watcher.changed()).await;
    assert!(result.is_err(), "无更新时 changed 应超时");

    prop.update(7).unwrap();
    let value = timeout(Duration::from_secs(1), watcher.changed())
        .await
        .expect("更新后应被唤醒")
        .unwrap();
    assert_eq!(value, 7);
}

#[tokio::test]
async fn multiple_watchers_all_notified() {
    let prop = Arc::new(ReactiveProperty::new(0i32));
    let woken = Arc::new(AtomicU32::new(0));

    let mut handles = Vec::new();
    for _ in 0..10 {
        let mut watcher = prop.watch();
        let woken = Arc::clone(&woken);
        handles.push(tokio::spawn(async move {
            let value = watcher.changed().await.unwrap();
            assert_eq!(value, 42);
            woken.fetch_add(1, Ordering::Relaxed);
        }));
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    prop.update(42).unwrap();

    for handle in handles {
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("广播应唤醒全部监听者")
            .unwrap();
    }
    assert_eq!(woken.load(Ordering::Relaxed), 10);
}

#[tokio::test]
async fn watcher_borrow_reads_latest_without_consuming() {
    let prop = ReactiveProperty::new(5u8);
    let watcher = prop.watch();

    assert_eq!(watcher.borrow(), Some(5));
    prop.update(6).unwrap();
    assert_eq!(watcher.borrow(), Some(6));
}

// ═══════════════════════════ 销毁语义 ═══════════════════════════

#[tokio::test]
async fn dropping_property_closes_watchers() {
    let prop = ReactiveProperty::new(1u8);
    let mut watcher = prop.watch();
    drop(prop);

    match watcher.changed().await {
        Err(ReactivePropertyError::WatcherClosed) => {}
        Err(ReactivePropertyError::RecvError(_)) => {}
        Ok(v) => panic!("属性销毁后不应再收到值: {:?}", v),
    }
}
