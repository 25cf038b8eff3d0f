//! Per-room sequencing gates.
//!
//! A gate is held from the start of a mutation until its notices have been
//! handed to the pusher, so the members of a room see notices in mutation
//! order. Different rooms have different gates.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomId;

#[derive(Default)]
pub struct RoomGates {
    gates: Mutex<HashMap<RoomId, Arc<Mutex<()>>>>,
}

impl RoomGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of a room's gate
    pub async fn acquire(&self, room_id: &RoomId) -> OwnedMutexGuard<()> {
        let gate = {
            let mut gates = self.gates.lock().await;
            Arc::clone(gates.entry(room_id.clone()).or_default())
        };
        gate.lock_owned().await
    }

    /// Forget a room's gate. Holders and waiters of the old gate are unaffected.
    pub async fn release(&self, room_id: &RoomId) {
        self.gates.lock().await.remove(room_id);
    }

    /// Number of rooms that currently have a gate
    pub async fn len(&self) -> usize {
        self.gates.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_same_room_is_exclusive() {
        // テスト項目: 同じ部屋のゲートは同時に 1 つしか取得できない
        // given (前提条件):
        let gates = RoomGates::new();
        let _held = gates.acquire(&room("r1")).await;

        // when (操作):
        let second =
            tokio::time::timeout(Duration::from_millis(50), gates.acquire(&room("r1"))).await;

        // then (期待する結果):
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_different_rooms_do_not_contend() {
        // テスト項目: 別の部屋のゲートは待たずに取得できる
        // given (前提条件):
        let gates = RoomGates::new();
        let _held = gates.acquire(&room("r1")).await;

        // when (操作):
        let other =
            tokio::time::timeout(Duration::from_millis(50), gates.acquire(&room("r2"))).await;

        // then (期待する結果):
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_gate_released_on_drop() {
        // テスト項目: ガードを破棄するとゲートが再取得できる
        // given (前提条件):
        let gates = RoomGates::new();
        drop(gates.acquire(&room("r1")).await);

        // when (操作):
        let again =
            tokio::time::timeout(Duration::from_millis(50), gates.acquire(&room("r1"))).await;

        // then (期待する結果):
        assert!(again.is_ok());
    }

    #[tokio::test]
    async fn test_release_forgets_gate() {
        // テスト項目: release した部屋のゲートは一覧から消え、再取得で作り直される
        // given (前提条件):
        let gates = RoomGates::new();
        drop(gates.acquire(&room("r1")).await);
        drop(gates.acquire(&room("r2")).await);

        // when (操作):
        let held = gates.acquire(&room("r1")).await;
        gates.release(&room("r1")).await;
        drop(held);

        // then (期待する結果):
        assert_eq!(gates.len().await, 1);
        let again =
            tokio::time::timeout(Duration::from_millis(50), gates.acquire(&room("r1"))).await;
        assert!(again.is_ok());
        assert_eq!(gates.len().await, 2);
    }
}
