//! 单事件观察者适配器：把闭包包装成 [`DownloadObserver`]，供 `with_xx` 使用。

use async_trait::async_trait;

use crate::internal::download::structs::download_error::DownloadError;
use crate::internal::download::structs::progress_tracker::ProgressSnapshot;
use crate::internal::download::traits::observer::DownloadObserver;

/// 仅关心「进度」的适配器。
pub(crate) struct OnProgressAdapter<F>(pub(crate) F);

#[async_trait]
impl<F> DownloadObserver for OnProgressAdapter<F>
where
    F: FnMut(&ProgressSnapshot) + Send + Sync + 'static,
{
    async fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        (self.0)(snapshot);
    }
}

/// 仅关心「完成」的适配器。
pub(crate) struct OnFinishAdapter<F>(pub(crate) F);

#[async_trait]
impl<F> DownloadObserver for OnFinishAdapter<F>
where
    F: FnMut() + Send + Sync + 'static,
{
    async fn on_finish(&mut self) {
        (self.0)();
    }
}

/// 仅关心「失败」的适配器。
pub(crate) struct OnErrorAdapter<F>(pub(crate) F);

#[async_trait]
impl<F> DownloadObserver for OnErrorAdapter<F>
where
    F: FnMut(&DownloadError) + Send + Sync + 'static,
{
    async fn on_error(&mut self, error: &DownloadError) {
        (self.0)(error);
    }
}

/// 仅关心「取消」的适配器。
pub(crate) struct OnStopAdapter<F>(pub(crate) F);

#[async_trait]
impl<F> DownloadObserver for OnStopAdapter<F>
where
    F: FnMut() + Send + Sync + 'static,
{
    async fn on_stop(&mut self) {
        (self.0)();
    }
}
