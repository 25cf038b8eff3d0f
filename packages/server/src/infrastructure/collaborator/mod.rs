//! In-memory implementations of the external persistence collaborators
//!
//! サーバーを単体で動かすための実装です。永続ストレージに置き換える場合も
//! Domain 層の trait を実装するだけで差し替えられます。

pub mod result_store;
pub mod text_pool;
pub mod user_stats;

pub use result_store::InMemoryGameResultStore;
pub use text_pool::RandomTextPool;
pub use user_stats::{InMemoryUserStatsStore, UserStats};
