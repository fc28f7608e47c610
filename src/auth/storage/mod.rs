//! 存储抽象层
//!
//! Account storage is an external collaborator; the in-memory backend serves
//! development and tests.

pub mod r#trait;
pub mod memory;

// 重新导出
pub use r#trait::CredentialStore;
pub use memory::MemoryStorage;
