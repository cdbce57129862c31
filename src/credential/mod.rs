//! 凭证令牌模块
//!
//! 将刷新接口返回的不同命名格式统一为 `CredentialToken`。
//! 本模块不发起任何网络请求，刷新流程由调用方负责。

mod token;

pub use token::{CredentialToken, RefreshResponse};
