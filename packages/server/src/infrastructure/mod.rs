//! Infrastructure layer
//!
//! ドメイン層が定義する trait の具体的な実装（インメモリのストア、WebSocket 送信、
//! 外部コラボレーターのインメモリ実装）と DTO。

pub mod collaborator;
pub mod dto;
pub mod message_pusher;
pub mod repository;
