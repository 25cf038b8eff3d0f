//! UseCase: タイピング進捗の報告
//!
//! 進捗の計算・順位の再計算・完走判定・レース終了判定は、部屋への 1 回の変更の中で
//! 行われます。経過時間は変更の中で時計を読むため、ゲート待ちの時間も含めた
//! 「適用時点」の値になります。

use std::sync::Arc;

use crate::{
    domain::{ConnectionId, RoomId, SessionRepository, Timestamp, UserId},
    usecase::{error::ProgressError, race_coordinator::RaceCoordinator},
};

/// One `typing_progress` message
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub submitted_text: String,
    pub char_index: i64,
}

/// 進捗報告のユースケース
pub struct ReportProgressUseCase {
    sessions: Arc<dyn SessionRepository>,
    coordinator: Arc<RaceCoordinator>,
}

impl ReportProgressUseCase {
    /// 新しい ReportProgressUseCase を作成
    pub fn new(sessions: Arc<dyn SessionRepository>, coordinator: Arc<RaceCoordinator>) -> Self {
        Self {
            sessions,
            coordinator,
        }
    }

    /// Apply a report sent over `connection_id`.
    ///
    /// The connection must be bound to the reported room as the reported user.
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 報告を送った接続
    /// * `report` - 受信した `typing_progress` の内容
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 部屋に反映され、メンバーに通知された
    /// * `Err(ProgressError::Stale)` - レース外の報告で、何も変わっていない
    /// * `Err(ProgressError)` - それ以外の拒否理由
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        report: ProgressReport,
    ) -> Result<(), ProgressError> {
        let bound = self
            .sessions
            .find_by_connection(connection_id)
            .await
            .filter(|s| s.room_id == report.room_id && s.user_id == report.user_id);
        if bound.is_none() {
            return Err(ProgressError::NotInRoom(report.user_id.to_string()));
        }

        let ProgressReport {
            room_id,
            user_id,
            submitted_text,
            char_index,
        } = report;
        let clock = self.coordinator.clock();
        let result = self
            .coordinator
            .apply(
                &room_id,
                Box::new(move |room| {
                    let now = Timestamp::new(clock.now_millis());
                    room.record_progress(&user_id, &submitted_text, char_index, now)
                }),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let error = ProgressError::from(e);
                match &error {
                    ProgressError::Stale => {
                        tracing::debug!("Dropped stale progress report for room '{}'", room_id)
                    }
                    ProgressError::Internal(reason) => {
                        tracing::error!("Progress report in room '{}' failed: {}", room_id, reason)
                    }
                    other => {
                        tracing::warn!("Rejected progress report in room '{}': {}", room_id, other)
                    }
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{RoomRepository, RoomStatus},
        usecase::test_support::Harness,
    };
    use typerace_shared::time::Clock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - シナリオ A: 2 人が "cat dog" を 6 秒・12 秒で完走し、X が勝者になる
    // - シナリオ B: 待機中の部屋への範囲外の報告は捨てられ、状態も通知も変わらない
    // - 不正な報告（負の char_index、長すぎる文字列）は送信者へのエラーになる
    // - 別ユーザーとしての報告は NotInRoom で拒否される
    // - 進捗・完走・終了の通知が変更の順に届く
    // ========================================

    fn usecase(harness: &Harness) -> ReportProgressUseCase {
        ReportProgressUseCase::new(harness.sessions.clone(), harness.coordinator.clone())
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn report(room_id: &RoomId, id: &str, text: &str, char_index: i64) -> ProgressReport {
        ProgressReport {
            room_id: room_id.clone(),
            user_id: user(id),
            submitted_text: text.to_string(),
            char_index,
        }
    }

    #[tokio::test]
    async fn test_scenario_a_race_to_finish() {
        // テスト項目: X が 6 秒、Y が 12 秒で完走すると WPM は 20 と 10、勝者は X
        // given (前提条件):
        let harness = Harness::new(2);
        let room = harness.create_room("cat dog").await;
        let (cx, mut rx) = harness.seat(room.id(), "x").await;
        let (cy, _ry) = harness.seat(room.id(), "y").await;
        harness
            .wait_for_status(room.id(), RoomStatus::InProgress)
            .await;
        Harness::collect_until(&mut rx, "race_started").await;
        let usecase = usecase(&harness);
        let start = harness.clock.now_millis();

        // when (操作):
        harness.clock.set(start + 6_000);
        usecase
            .execute(&cx, report(room.id(), "x", "cat dog", 7))
            .await
            .unwrap();
        harness.clock.set(start + 12_000);
        usecase
            .execute(&cy, report(room.id(), "y", "cat dog", 7))
            .await
            .unwrap();

        // then (期待する結果):
        let room = harness.rooms.get(room.id()).await.unwrap();
        assert_eq!(room.status(), RoomStatus::Finished);
        assert_eq!(room.winner_id(), Some(&user("x")));
        assert_eq!(room.player(&user("x")).unwrap().wpm, 20.0);
        assert_eq!(room.player(&user("y")).unwrap().wpm, 10.0);

        let messages = Harness::collect_until(&mut rx, "race_finished").await;
        assert_eq!(
            Harness::types(&messages),
            vec![
                "progress_update",
                "player_finished",
                "progress_update",
                "player_finished",
                "race_finished"
            ]
        );
        let finished = messages.last().unwrap();
        assert_eq!(finished["winner_id"], "x");
        assert_eq!(finished["results"][0]["user_id"], "x");
        assert_eq!(finished["results"][0]["rank"], 1);
        assert_eq!(finished["results"][1]["user_id"], "y");
    }

    #[tokio::test]
    async fn test_scenario_b_stale_report_while_waiting() {
        // テスト項目: 待機中の部屋に範囲外の報告をしても何も変わらず、通知も無い
        // given (前提条件):
        let harness = Harness::new(3);
        let room = harness.create_room("cat dog").await;
        let (cx, mut rx) = harness.seat(room.id(), "x").await;
        Harness::drain(&mut rx);
        let before = harness.rooms.get(room.id()).await.unwrap();
        let usecase = usecase(&harness);

        // when (操作):
        let result = usecase
            .execute(&cx, report(room.id(), "x", "cat dog and more", 99))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(ProgressError::Stale));
        let after = harness.rooms.get(room.id()).await.unwrap();
        assert_eq!(before, after);
        assert!(Harness::drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reports_are_rejected() {
        // テスト項目: 負の char_index と出題文より長い入力は InsufficientInput
        // given (前提条件):
        let harness = Harness::new(1);
        let room = harness.create_room("cat dog").await;
        let (cx, mut rx) = harness.seat(room.id(), "x").await;
        harness
            .wait_for_status(room.id(), RoomStatus::InProgress)
            .await;
        Harness::collect_until(&mut rx, "race_started").await;
        let usecase = usecase(&harness);

        // when (操作):
        let negative = usecase
            .execute(&cx, report(room.id(), "x", "cat", -1))
            .await;
        let too_long = usecase
            .execute(&cx, report(room.id(), "x", "cat dog cat dog", 7))
            .await;

        // then (期待する結果):
        assert!(matches!(negative, Err(ProgressError::InsufficientInput(_))));
        assert!(matches!(too_long, Err(ProgressError::InsufficientInput(_))));
        let room = harness.rooms.get(room.id()).await.unwrap();
        assert_eq!(room.player(&user("x")).unwrap().progress, 0.0);
        assert!(Harness::drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_report_as_other_user_is_rejected() {
        // テスト項目: 自分以外のユーザーとしての報告は NotInRoom
        // given (前提条件):
        let harness = Harness::new(2);
        let room = harness.start_race(&["x", "y"], "cat dog").await;
        let (stranger, _rx) = harness.connect().await;
        let usecase = usecase(&harness);

        // when (操作):
        let result = usecase
            .execute(&stranger, report(room.id(), "x", "cat", 3))
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(ProgressError::NotInRoom("x".to_string())));
    }

    #[tokio::test]
    async fn test_report_after_finish_is_stale() {
        // テスト項目: 完走後の報告は捨てられ、結果は変わらない
        // given (前提条件):
        let harness = Harness::new(1);
        let room = harness.create_room("cat dog").await;
        let (cx, _rx) = harness.seat(room.id(), "x").await;
        harness
            .wait_for_status(room.id(), RoomStatus::InProgress)
            .await;
        let usecase = usecase(&harness);
        harness.clock.advance(6_000);
        usecase
            .execute(&cx, report(room.id(), "x", "cat dog", 7))
            .await
            .unwrap();
        let finished = harness.rooms.get(room.id()).await.unwrap();

        // when (操作):
        harness.clock.advance(6_000);
        let late = usecase
            .execute(&cx, report(room.id(), "x", "cat", 3))
            .await;

        // then (期待する結果):
        assert_eq!(late, Err(ProgressError::Stale));
        assert_eq!(harness.rooms.get(room.id()).await.unwrap(), finished);
    }
}
