//! 观察者容器：多个观察者按注册顺序依次触发。

use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::progress_tracker::ProgressSnapshot;
use crate::internal::download::traits::observer::DownloadObserver;

/// 观察者集合；由任务持有，事件发生时逐个触发。
#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn DownloadObserver>>,
}

impl ObserverSet {
    /// 添加一个观察者；支持多次调用注册多个，按添加顺序依次执行。
    pub fn add(&mut self, observer: impl DownloadObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// 清空全部观察者（释放任务时用）。
    pub fn clear(&mut self) {
        self.observers.clear();
    }

    pub async fn run_on_start(&mut self) {
        for o in self.observers.iter_mut() {
            o.on_start().await;
        }
    }

    pub async fn run_on_progress(&mut self, snapshot: &ProgressSnapshot) {
        for o in self.observers.iter_mut() {
            o.on_progress(snapshot).await;
        }
    }

    pub async fn run_on_pause(&mut self) {
        for o in self.observers.iter_mut() {
            o.on_pause().await;
        }
    }

    pub async fn run_on_resume(&mut self) {
        for o in self.observers.iter_mut() {
            o.on_resume().await;
        }
    }

    pub async fn run_on_finish(&mut self) {
        for o in self.observers.iter_mut() {
            o.on_finish().await;
        }
    }

    pub async fn run_on_error(&mut self, error: &DownloadError) {
        for o in self.observers.iter_mut() {
            o.on_error(error).await;
        }
    }

    pub async fn run_on_stop(&mut self) {
        for o in self.observers.iter_mut() {
            o.on_stop().await;
        }
    }

    pub async fn run_on_chunk_start(&mut self, index: usize, start: u64, end: u64) {
        for o in self.observers.iter_mut() {
            o.on_chunk_start(index, start, end).await;
        }
    }

    pub async fn run_on_chunk_finish(
        &mut self,
        index: usize,
        start: u64,
        end: u64,
        bytes_written: u64,
    ) {
        for o in self.observers.iter_mut() {
            o.on_chunk_finish(index, start, end, bytes_written).await;
        }
    }

    pub async fn run_on_chunk_error(
        &mut self,
        index: usize,
        start: u64,
        end: u64,
        error: &DownloadError,
    ) {
        for o in self.observers.iter_mut() {
            o.on_chunk_error(index, start, end, error).await;
        }
    }

    pub async fn run_on_assemble_start(&mut self) {
        for o in self.observers.iter_mut() {
            o.on_assemble_start().await;
        }
    }

    pub async fn run_on_assemble_finish(&mut self) {
        for o in self.observers.iter_mut() {
            o.on_assemble_finish().await;
        }
    }

    pub async fn run_on_assemble_error(&mut self, error: &DownloadError) {
        for o in self.observers.iter_mut() {
            o.on_assemble_error(error).await;
        }
    }

    pub async fn run_on_dispose(&mut self) {
        for o in self.observers.iter_mut() {
            o.on_dispose().await;
        }
    }
}
