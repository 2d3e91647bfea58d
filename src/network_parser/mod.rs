//! 网络接口层。

pub mod network;
