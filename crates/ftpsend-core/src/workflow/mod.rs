//! 工作流模块
//!
//! 提供高层 API 封装完整的上传流程

pub mod uploader;

pub use uploader::{
    LogCallback, SimpleUploadCallback, UploadOutcome, UploadProgressCallback, Uploader,
};
