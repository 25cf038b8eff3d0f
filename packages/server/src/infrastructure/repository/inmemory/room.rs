//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//!
//! ## ロックの構成
//!
//! - ディレクトリ全体: `RwLock`（部屋の登録・検索のみ、短時間）
//! - 部屋ごと: `Mutex<Room>`（mutate はこのロック内で実行）
//!
//! 異なる部屋の mutate は互いに待たされません。
//! ディレクトリのロックを保持したまま部屋のロックを待つことはありません。

use std::{
    any::Any,
    collections::{BTreeMap, HashMap},
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{
    MutationOutcome, ReferenceText, RepositoryError, Room, RoomId, RoomIdFactory, RoomMutation,
    RoomRepository, Timestamp,
};

struct RoomSlot {
    /// Creation order; doubles as the key of the open-room index
    seq: u64,
    room: Mutex<Room>,
}

#[derive(Default)]
struct Directory {
    rooms: HashMap<RoomId, Arc<RoomSlot>>,
    /// Rooms that are `Waiting` with a free seat, oldest first
    open: BTreeMap<u64, RoomId>,
    next_seq: u64,
}

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    directory: RwLock<Directory>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, room_id: &RoomId) -> Result<Arc<RoomSlot>, RepositoryError> {
        let directory = self.directory.read().await;
        directory
            .rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create(
        &self,
        reference_text: ReferenceText,
        capacity: usize,
        created_at: Timestamp,
    ) -> Result<Room, RepositoryError> {
        let room = Room::new(RoomIdFactory::generate()?, reference_text, capacity, created_at);

        let mut directory = self.directory.write().await;
        let seq = directory.next_seq;
        directory.next_seq += 1;
        if room.is_open() {
            directory.open.insert(seq, room.id().clone());
        }
        directory.rooms.insert(
            room.id().clone(),
            Arc::new(RoomSlot {
                seq,
                room: Mutex::new(room.clone()),
            }),
        );
        tracing::debug!("Room '{}' created (capacity {})", room.id(), room.capacity());
        Ok(room)
    }

    async fn get(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let slot = self.slot(room_id).await?;
        let room = slot.room.lock().await;
        Ok(room.clone())
    }

    async fn find_open_waiting_room(&self) -> Option<Room> {
        let candidates: Vec<Arc<RoomSlot>> = {
            let directory = self.directory.read().await;
            directory
                .open
                .values()
                .filter_map(|id| directory.rooms.get(id).cloned())
                .collect()
        };

        // The index may lag behind a mutation in flight; re-check under the room lock.
        for slot in candidates {
            let room = slot.room.lock().await;
            if room.is_open() {
                return Some(room.clone());
            }
        }
        None
    }

    async fn mutate(
        &self,
        room_id: &RoomId,
        mutation: RoomMutation,
    ) -> Result<MutationOutcome, RepositoryError> {
        let slot = self.slot(room_id).await?;
        let mut room = slot.room.lock().await;

        // Work on a draft so a rejected or panicking mutation leaves no trace.
        let mut draft = room.clone();
        let applied = panic::catch_unwind(AssertUnwindSafe(move || {
            mutation(&mut draft).map(|events| (draft, events))
        }));
        let (draft, events) = match applied {
            Ok(Ok(applied)) => applied,
            Ok(Err(rejection)) => return Err(RepositoryError::Rejected(rejection)),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("Mutation of room '{}' panicked: {}", room_id, message);
                return Err(RepositoryError::MutationPanicked(message));
            }
        };

        *room = draft.clone();

        // Still under the room lock, so index updates follow mutation order.
        {
            let mut directory = self.directory.write().await;
            if room.is_open() {
                directory.open.insert(slot.seq, room_id.clone());
            } else {
                directory.open.remove(&slot.seq);
            }
        }

        Ok(MutationOutcome {
            room: draft,
            events,
        })
    }

    async fn list(&self) -> Vec<Room> {
        let mut slots: Vec<Arc<RoomSlot>> = {
            let directory = self.directory.read().await;
            directory.rooms.values().cloned().collect()
        };
        slots.sort_by_key(|slot| slot.seq);

        let mut rooms = Vec::with_capacity(slots.len());
        for slot in slots {
            rooms.push(slot.room.lock().await.clone());
        }
        rooms
    }

    async fn remove(&self, room_id: &RoomId) -> Result<Room, RepositoryError> {
        let slot = {
            let mut directory = self.directory.write().await;
            let slot = directory
                .rooms
                .remove(room_id)
                .ok_or_else(|| RepositoryError::RoomNotFound(room_id.as_str().to_string()))?;
            directory.open.remove(&slot.seq);
            slot
        };
        let room = slot.room.lock().await.clone();
        tracing::debug!("Room '{}' removed", room_id);
        Ok(room)
    }
}
