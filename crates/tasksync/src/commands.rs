use std::process::ExitCode;

use anyhow::Result;
use tasksync_app::config::ClientConfig;
use tasksync_app::{CommitOutcome, Controller, RemoteClient, SyncError};
use tasksync_http::HttpClient;
use tracing::{info, warn};

use crate::Command;
use crate::render::render;

/// Load the owner's tasks, apply `command`, print the resulting list.
///
/// Exits with failure when an error notification is active afterwards.
pub async fn run(command: Command, config: &ClientConfig) -> Result<ExitCode> {
    let owner = match config.owner() {
        Ok(owner) => owner,
        Err(err) => {
            warn!(error = %err, "No owner configured, skipping remote calls");
            eprintln!("configuration warning: {err}");
            return Ok(ExitCode::FAILURE);
        }
    };
    let client = HttpClient::new(&config.api.base_url, config.request_timeout())?;
    let controller = Controller::new(client, owner, config.notice_timeout());

    if controller.init().await.is_ok() {
        apply(&controller, command).await?;
    }

    let view = controller.view();
    print!("{}", render(&view));
    Ok(if view.error.is_some() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn apply<C: RemoteClient>(controller: &Controller<C>, command: Command) -> Result<()> {
    match command {
        Command::List { filter } => controller.set_filter(filter),
        Command::Add { title } => {
            if let Some(task) = classified(controller.add(&title).await)? {
                info!(task = %task.id, "Added");
            }
        }
        Command::Toggle { id } => {
            classified(controller.toggle_one(id).await)?;
        }
        Command::Edit { id, title } => {
            controller.edit_start(id)?;
            match classified(controller.edit_commit(id, &title).await)? {
                Some(CommitOutcome::Unchanged) => info!(task = %id, "Title unchanged"),
                Some(CommitOutcome::Deleted) => info!(task = %id, "Empty title, task deleted"),
                Some(CommitOutcome::Saved(_) | CommitOutcome::Ignored) | None => {}
            }
        }
        Command::Rm { id } => {
            classified(controller.delete(id).await)?;
        }
        Command::ToggleAll => {
            let outcome = controller.toggle_all().await;
            info!(
                updated = outcome.succeeded().count(),
                failed = outcome.failed().count(),
                "Toggled all tasks"
            );
        }
        Command::ClearCompleted => {
            let outcome = controller.clear_completed().await;
            info!(
                deleted = outcome.succeeded().count(),
                failed = outcome.failed().count(),
                "Cleared completed tasks"
            );
        }
    }
    Ok(())
}

/// Classified failures surface through the error line of the view; others are errors.
fn classified<T>(result: Result<T, SyncError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind().is_some() => Ok(None),
        Err(err) => Err(err.into()),
    }
}
