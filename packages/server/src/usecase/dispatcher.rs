//! Result dispatcher
//!
//! 完走結果の永続化（ゲーム結果の記録・ユーザー統計の更新）を 1 本のワーカータスクに
//! キューイングします。プロトコル処理側は投入するだけで完了を待ちません。
//! 失敗はログに残し、後続のジョブは処理を続けます。

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::domain::{FinishRecord, GameResultSink, UserStatsUpdater};

enum Job {
    /// A player crossed the line: store the result and fold it into the stats
    Finish(FinishRecord),
    /// Race closed: mark the winner's stored result and credit the win
    ConfirmWinner(FinishRecord),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct ResultDispatcher {
    tx: mpsc::UnboundedSender<Job>,
}

impl ResultDispatcher {
    /// Start the worker task. Must be called inside a tokio runtime.
    pub fn spawn(
        results: Arc<dyn GameResultSink>,
        user_stats: Arc<dyn UserStatsUpdater>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    Job::Finish(record) => {
                        store_finish(results.as_ref(), user_stats.as_ref(), record).await
                    }
                    Job::ConfirmWinner(record) => {
                        store_win(results.as_ref(), user_stats.as_ref(), record).await
                    }
                    Job::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Result dispatcher stopped");
        });
        Self { tx }
    }

    pub fn record_finish(&self, record: FinishRecord) {
        self.enqueue(Job::Finish(record));
    }

    pub fn confirm_winner(&self, record: FinishRecord) {
        self.enqueue(Job::ConfirmWinner(record));
    }

    /// Wait until every job queued so far has been processed
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(Job::Flush(done_tx));
        let _ = done_rx.await;
    }

    fn enqueue(&self, job: Job) {
        if self.tx.send(job).is_err() {
            tracing::error!("Result dispatcher is not running; job dropped");
        }
    }
}

async fn store_finish(
    results: &dyn GameResultSink,
    user_stats: &dyn UserStatsUpdater,
    record: FinishRecord,
) {
    let user_id = record.user_id.clone();
    let (wpm, accuracy, is_winner) = (record.wpm, record.accuracy, record.is_winner);
    let room_id = record.room_id.clone();

    match results.record_result(record).await {
        Ok(()) => tracing::debug!("Stored result of '{}' in room '{}'", user_id, room_id),
        Err(e) => tracing::error!(
            "Failed to store result of '{}' in room '{}': {}",
            user_id,
            room_id,
            e
        ),
    }
    if let Err(e) = user_stats
        .update_stats(&user_id, wpm, accuracy, is_winner)
        .await
    {
        tracing::error!("Failed to update stats of '{}': {}", user_id, e);
    }
}

async fn store_win(
    results: &dyn GameResultSink,
    user_stats: &dyn UserStatsUpdater,
    record: FinishRecord,
) {
    let user_id = record.user_id.clone();
    if let Err(e) = results.record_result(record).await {
        tracing::error!("Failed to mark '{}' as winner: {}", user_id, e);
    }
    match user_stats.record_win(&user_id).await {
        Ok(()) => tracing::debug!("Credited win to '{}'", user_id),
        Err(e) => tracing::error!("Failed to credit win to '{}': {}", user_id, e),
    }
}
