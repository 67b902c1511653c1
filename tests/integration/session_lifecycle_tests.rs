/*!
 * Integration tests for the optimization session state machine
 */

use std::sync::Arc;

use subforge::errors::SessionError;
use subforge::session::{
    OptimizationSession, SessionNotice, SessionState, Task, TaskConfig, TaskKind, TaskStatus, WorkerEvent,
};
use subforge::subtitle_processor::SubtitleEntry;
use subforge::table_model::{EditTriggers, SecondaryMode, SubtitleTableModel, TableChange};
use crate::common;
use crate::common::mock_workers::{Outcome, ScriptedWorker, Step};

fn loaded_model() -> SubtitleTableModel {
    common::init_test_logging();
    let mut model = SubtitleTableModel::new(SecondaryMode::Optimize, EditTriggers::DEFAULT);
    model.load(common::sample_entries(8));
    model.take_changes();
    model
}

fn config() -> TaskConfig {
    TaskConfig {
        need_optimize: true,
        batch_size: 4,
        thread_num: 2,
        ..TaskConfig::default()
    }
}

/// Pump events until a terminal notice, collecting every notice
async fn drain(session: &mut OptimizationSession, model: &mut SubtitleTableModel) -> Vec<SessionNotice> {
    let mut notices = Vec::new();
    while let Some(event) = session.next_event().await {
        if let Some(notice) = session.handle_event(event, model) {
            let terminal = notice.is_terminal();
            notices.push(notice);
            if terminal {
                break;
            }
        }
    }
    notices
}

#[tokio::test]
async fn test_session_withScriptedEvents_shouldApplyInOrder() {
    let mut model = loaded_model();
    let mut session = OptimizationSession::new();
    let worker = ScriptedWorker::new(
        vec![
            Step::Progress(10, "starting"),
            Step::Partial(vec![("3", "first"), ("6", "x")]),
            Step::Partial(vec![("3", "second")]),
            Step::Progress(90, "almost"),
        ],
        Outcome::Finish(TaskStatus::Completed),
    );

    let task = Task::new("movie.srt", TaskKind::Standalone);
    session.start(task, config(), Arc::new(worker), model.collection().serialize()).unwrap();
    assert_eq!(session.state(), SessionState::Running);
    assert!(!session.can_start());

    let notices = drain(&mut session, &mut model).await;

    assert_eq!(notices.len(), 5);
    assert_eq!(notices[0], SessionNotice::Progress { percent: 10, status: "starting".to_string() });
    let SessionNotice::Updated(report) = &notices[1] else {
        panic!("expected a partial update notice");
    };
    assert_eq!(report.rows, Some((2, 5)));
    assert!(matches!(notices[4], SessionNotice::Completed(ref task) if task.status == TaskStatus::Completed));

    // later update for the same id wins
    assert_eq!(model.get_cell(2, 3).unwrap(), "second");
    assert_eq!(model.get_cell(5, 3).unwrap(), "x");
    assert_eq!(session.state(), SessionState::Finished);
    assert!(session.can_start());
}

#[tokio::test]
async fn test_session_startWhileRunning_shouldBeRejected() {
    let mut model = loaded_model();
    let mut session = OptimizationSession::new();
    let (worker, gate) = ScriptedWorker::gated(Outcome::Finish(TaskStatus::Completed));
    let worker = Arc::new(worker);

    session
        .start(Task::new("a.srt", TaskKind::Standalone), config(), worker.clone(), Vec::new())
        .unwrap();
    let second = session.start(Task::new("b.srt", TaskKind::Standalone), config(), worker, Vec::new());
    assert_eq!(second, Err(SessionError::AlreadyRunning));
    assert!(session.task().unwrap().file_path.ends_with("a.srt"));

    gate.notify_one();
    let notices = drain(&mut session, &mut model).await;
    assert!(matches!(notices.last(), Some(SessionNotice::Completed(_))));
}

#[tokio::test]
async fn test_session_withPendingTask_shouldSignalDownstreamExactlyOnce() {
    let mut model = loaded_model();
    let mut session = OptimizationSession::new();
    let worker = ScriptedWorker::finishing(TaskStatus::Pending);

    session
        .start(Task::new("movie.srt", TaskKind::Pipeline), config(), Arc::new(worker), Vec::new())
        .unwrap();
    let notices = drain(&mut session, &mut model).await;

    let downstream: Vec<&SessionNotice> = notices
        .iter()
        .filter(|n| matches!(n, SessionNotice::DownstreamReady(_)))
        .collect();
    assert_eq!(downstream.len(), 1);
    assert!(session.next_event().await.is_none());
}

#[tokio::test]
async fn test_session_withWorkerError_shouldFailWithMessage() {
    let mut model = loaded_model();
    let mut session = OptimizationSession::new();
    let worker = ScriptedWorker::new(vec![Step::Progress(5, "working")], Outcome::Fail("model unavailable"));

    session
        .start(Task::new("movie.srt", TaskKind::Standalone), config(), Arc::new(worker), Vec::new())
        .unwrap();
    let notices = drain(&mut session, &mut model).await;

    assert_eq!(notices.last(), Some(&SessionNotice::Failed("model unavailable".to_string())));
    assert_eq!(session.state(), SessionState::Failed);
    assert_eq!(session.task().unwrap().status, TaskStatus::Failed);
    assert!(session.can_start());
}

#[tokio::test]
async fn test_session_afterFailure_shouldAllowNewRun() {
    let mut model = loaded_model();
    let mut session = OptimizationSession::new();

    session
        .start(
            Task::new("movie.srt", TaskKind::Standalone),
            config(),
            Arc::new(ScriptedWorker::new(Vec::new(), Outcome::Fail("boom"))),
            Vec::new(),
        )
        .unwrap();
    drain(&mut session, &mut model).await;

    session
        .start(
            Task::new("movie.srt", TaskKind::Standalone),
            config(),
            Arc::new(ScriptedWorker::finishing(TaskStatus::Completed)),
            Vec::new(),
        )
        .unwrap();
    let notices = drain(&mut session, &mut model).await;
    assert!(matches!(notices.last(), Some(SessionNotice::Completed(_))));
}

#[tokio::test]
async fn test_session_withFullUpdate_shouldRelayoutModel() {
    let mut model = loaded_model();
    let mut session = OptimizationSession::new();
    let replacement = vec![
        SubtitleEntry::new("1", 0, 500, "merged", "fusionné"),
        SubtitleEntry::new("2", 500, 900, "tail", ""),
    ];
    let worker = ScriptedWorker::new(vec![Step::Full(replacement)], Outcome::Finish(TaskStatus::Completed));

    session
        .start(Task::new("movie.srt", TaskKind::Standalone), config(), Arc::new(worker), Vec::new())
        .unwrap();
    let notices = drain(&mut session, &mut model).await;

    assert_eq!(notices[0], SessionNotice::Relayout { rows: 2 });
    assert_eq!(model.row_count(), 2);
    assert_eq!(model.take_changes(), vec![TableChange::LayoutChanged]);
}

#[tokio::test]
async fn test_session_cancel_shouldReturnToIdleAndStopEvents() {
    let mut model = loaded_model();
    let mut session = OptimizationSession::new();
    let (worker, _gate) = ScriptedWorker::gated(Outcome::Finish(TaskStatus::Completed));

    session
        .start(Task::new("movie.srt", TaskKind::Standalone), config(), Arc::new(worker), Vec::new())
        .unwrap();
    session.cancel();

    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.task().unwrap().status, TaskStatus::Canceled);
    assert!(session.next_event().await.is_none());

    let late = WorkerEvent::Progress { percent: 50, status: "late".to_string() };
    assert!(session.handle_event(late, &mut model).is_none());
}

#[tokio::test]
async fn test_session_start_shouldSnapshotConfigOntoTask() {
    let mut model = loaded_model();
    let mut session = OptimizationSession::new();
    let mut snapshot = config();
    snapshot.llm_model = "snapshot-model".to_string();

    session
        .start(
            Task::new("movie.srt", TaskKind::Standalone),
            snapshot.clone(),
            Arc::new(ScriptedWorker::finishing(TaskStatus::Completed)),
            Vec::new(),
        )
        .unwrap();
    assert_eq!(session.task().unwrap().config, snapshot);

    let notices = drain(&mut session, &mut model).await;
    let Some(SessionNotice::Completed(task)) = notices.last() else {
        panic!("expected completion");
    };
    assert_eq!(task.config.llm_model, "snapshot-model");
}
