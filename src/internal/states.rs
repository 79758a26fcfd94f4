//! 响应式状态模块：下载状态与进度快照的可监听容器。

pub mod reactive_core;

pub use reactive_core::{PropertyWatcher, ReactiveProperty, ReactivePropertyError};
