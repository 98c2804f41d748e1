mod common;

use anyhow::Result;
use common::{Call, MockRemote, controller, settle, task};
use futures::FutureExt;
use tasksync_app::{CommitOutcome, EditError, Focus, SyncError};
use tasksync_core::id::TaskId;
use tasksync_core::{ErrorKind, FilterMode};

fn seeded() -> MockRemote {
    MockRemote::with_tasks(vec![
        task(1, "milk", false),
        task(2, "bread", true),
        task(3, "eggs", false),
    ])
}

#[tokio::test]
async fn blank_edit_commit_deletes_the_task() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    remote.clear_calls();

    ctl.edit_start(TaskId(3))?;
    let outcome = ctl.edit_commit(TaskId(3), "   ").await?;
    assert_eq!(outcome, CommitOutcome::Deleted);
    assert_eq!(remote.calls(), vec![Call::Delete(TaskId(3))]);
    assert!(ctl.store().task(TaskId(3)).is_none());
    assert_eq!(ctl.store().editing_target(), None);
    Ok(())
}

#[tokio::test]
async fn unchanged_title_commit_makes_no_remote_call() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    remote.clear_calls();

    ctl.edit_start(TaskId(1))?;
    let outcome = ctl.edit_commit(TaskId(1), "  milk ").await?;
    assert_eq!(outcome, CommitOutcome::Unchanged);
    assert!(remote.calls().is_empty());
    assert_eq!(ctl.store().editing_target(), None);
    Ok(())
}

#[tokio::test]
async fn rename_sends_full_task_with_trimmed_title() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    remote.clear_calls();

    ctl.edit_start(TaskId(2))?;
    let outcome = ctl.edit_commit(TaskId(2), " rye bread ").await?;
    assert_eq!(outcome, CommitOutcome::Saved(task(2, "rye bread", true)));
    assert_eq!(remote.calls(), vec![Call::Update(task(2, "rye bread", true))]);
    assert_eq!(ctl.store().task(TaskId(2)), Some(task(2, "rye bread", true)));
    assert_eq!(ctl.store().editing_target(), None);
    Ok(())
}

#[tokio::test]
async fn second_commit_of_a_session_is_ignored() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    remote.clear_calls();
    let gate = remote.hold_updates(1);

    ctl.edit_start(TaskId(1))?;
    let (first, second) = tokio::join!(ctl.edit_commit(TaskId(1), "oat milk"), async {
        settle().await;
        let view = ctl.view();
        assert!(view.edit.as_ref().is_some_and(|edit| edit.committing));
        assert!(!ctl.edit_input(TaskId(1), "typing while committing"));
        assert!(!ctl.edit_cancel(TaskId(1)));
        let second = ctl.edit_commit(TaskId(1), "oat milk").await;
        gate.notify_one();
        second
    });

    assert!(matches!(first?, CommitOutcome::Saved(_)));
    assert_eq!(second?, CommitOutcome::Ignored);
    assert_eq!(remote.calls().len(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_commit_reopens_session_and_requests_edit_focus() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    remote.fail_update(1);

    ctl.edit_start(TaskId(1))?;
    let Err(err) = ctl.edit_commit(TaskId(1), "oat milk").await else {
        panic!("commit should fail");
    };
    assert_eq!(err.kind(), Some(ErrorKind::Updating));
    assert_eq!(ctl.take_focus(), Some(Focus::EditField(TaskId(1))));
    assert_eq!(ctl.take_focus(), None);

    let view = ctl.view();
    let edit = view.edit.expect("session stays open");
    assert_eq!(edit.task, TaskId(1));
    assert_eq!(edit.buffer, "oat milk");
    assert!(!edit.committing);
    assert_eq!(view.error, Some(ErrorKind::Updating));
    assert_eq!(ctl.store().task(TaskId(1)), Some(task(1, "milk", false)));
    Ok(())
}

#[tokio::test]
async fn only_one_task_can_be_edited_at_a_time() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;

    ctl.edit_start(TaskId(1))?;
    ctl.edit_start(TaskId(1))?;
    assert_eq!(ctl.edit_start(TaskId(2)), Err(EditError::SessionActive(TaskId(1))));
    assert!(ctl.edit_cancel(TaskId(1)));
    ctl.edit_start(TaskId(2))?;
    assert_eq!(ctl.edit_start(TaskId(9)), Err(EditError::SessionActive(TaskId(2))));
    Ok(())
}

#[tokio::test]
async fn edit_input_updates_buffer_and_cancel_discards_it() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    remote.clear_calls();

    assert_eq!(ctl.edit_start(TaskId(9)), Err(EditError::MissingTask(TaskId(9))));
    ctl.edit_start(TaskId(3))?;
    assert!(ctl.edit_input(TaskId(3), "duck eggs"));
    assert!(!ctl.edit_input(TaskId(1), "wrong task"));
    assert_eq!(
        ctl.view().edit.map(|edit| edit.buffer),
        Some("duck eggs".to_owned())
    );

    assert!(ctl.edit_cancel(TaskId(3)));
    assert_eq!(ctl.view().edit, None);
    assert_eq!(ctl.store().task(TaskId(3)), Some(task(3, "eggs", false)));
    assert!(remote.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn deleting_the_edited_task_ends_the_session() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;

    ctl.edit_start(TaskId(3))?;
    ctl.delete(TaskId(3)).await?;
    assert_eq!(ctl.store().editing_target(), None);
    assert_eq!(ctl.edit_commit(TaskId(3), "gone").await?, CommitOutcome::Ignored);
    Ok(())
}

#[tokio::test]
async fn add_failure_requests_new_task_focus() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    remote.fail_create();

    assert!(ctl.add("cheese").await.is_err());
    assert_eq!(ctl.take_focus(), Some(Focus::NewTask));
    assert_eq!(ctl.current_error(), Some(ErrorKind::Adding));

    ctl.dismiss_error();
    assert_eq!(ctl.current_error(), None);
    Ok(())
}

#[tokio::test]
async fn blank_add_raises_empty_title_without_focus_request() {
    let remote = seeded();
    let ctl = controller(&remote);

    assert!(matches!(ctl.add("  ").await, Err(SyncError::EmptyTitle)));
    assert_eq!(ctl.current_error(), Some(ErrorKind::EmptyTitle));
    assert_eq!(ctl.take_focus(), None);
}

#[tokio::test]
async fn delete_failure_requests_new_task_focus() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    remote.fail_delete(2);

    assert!(ctl.delete(TaskId(2)).await.is_err());
    assert_eq!(ctl.take_focus(), Some(Focus::NewTask));
    assert_eq!(ctl.current_error(), Some(ErrorKind::Deleting));
    assert!(ctl.store().task(TaskId(2)).is_some());
    Ok(())
}

#[tokio::test]
async fn toggle_one_flips_latest_entry() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;

    let toggled = ctl.toggle_one(TaskId(2)).await?;
    assert!(!toggled.completed);
    assert_eq!(ctl.store().task(TaskId(2)), Some(task(2, "bread", false)));

    let Err(err) = ctl.toggle_one(TaskId(42)).await else {
        panic!("unknown id should fail");
    };
    assert!(matches!(err, SyncError::MissingTask(TaskId(42))));
    Ok(())
}

#[tokio::test]
async fn view_reflects_filter_and_counts() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;

    let view = ctl.view();
    assert_eq!(view.filter, FilterMode::All);
    assert_eq!(view.rows.len(), 3);
    assert_eq!(view.items_left(), 2);
    assert!(view.show_footer());
    assert!(view.can_clear_completed());
    assert!(!view.all_completed());
    assert!(!view.submitting());

    ctl.set_filter(FilterMode::Completed);
    let view = ctl.view();
    assert_eq!(ctl.filter(), FilterMode::Completed);
    let ids: Vec<_> = view.rows.iter().map(|row| row.task.id).collect();
    assert_eq!(ids, vec![TaskId(2)]);
    assert_eq!(view.items_left(), 2);

    let outcome = ctl.toggle_all().await;
    assert!(outcome.is_success());
    let view = ctl.view();
    assert!(view.all_completed());
    assert_eq!(view.items_left(), 0);

    let cleared = ctl.clear_completed().await;
    assert_eq!(cleared.len(), 3);
    let view = ctl.view();
    assert!(!view.show_footer());
    assert!(view.rows.is_empty());
    Ok(())
}

#[tokio::test]
async fn dropping_an_edit_commit_mid_flight_reopens_the_session() -> Result<()> {
    let remote = seeded();
    let ctl = controller(&remote);
    ctl.init().await?;
    let _gate = remote.hold_updates(1);

    ctl.edit_start(TaskId(1))?;
    assert!(ctl.edit_commit(TaskId(1), "oat milk").now_or_never().is_none());

    let view = ctl.view();
    assert!(view.pending.is_empty());
    let edit = view.edit.expect("session survives the dropped commit");
    assert_eq!(edit.buffer, "oat milk");
    assert!(!edit.committing);
    assert!(ctl.edit_input(TaskId(1), "rice milk"));
    assert!(ctl.edit_cancel(TaskId(1)));
    ctl.edit_start(TaskId(2))?;
    Ok(())
}
