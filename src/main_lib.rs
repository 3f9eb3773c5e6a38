// Library module containing testable functions from main.rs

use crate::app::{App, BrowseContext};
use crate::async_task::{Task, TaskResult};
use crate::discovery;
use crate::navigator::HostSignal;
use std::path::PathBuf;

/// Apply a finished background task. May ask for a follow-up task.
pub fn handle_task_result(app: &mut App, result: TaskResult) -> Option<Task> {
    app.is_loading = false;

    match result {
        TaskResult::RepositoriesDiscovered { repos } => {
            log::info!("📨 Discovered {} repositories", repos.len());
            app.repositories = repos;

            if let Some(target) = app.pending_preselect.take() {
                if let Some(repo) = discovery::find_repository_for_path(&app.repositories, &target) {
                    let repo_path = PathBuf::from(&repo.path);
                    let relative = discovery::relative_slash_path(&repo_path, &target);
                    let context = BrowseContext {
                        path: repo_path,
                        name: repo.label.clone(),
                    };
                    return Some(app.load_task(context, relative));
                }
                log::warn!("No repository contains {}", target.display());
            }

            if app.current_repo.is_none() {
                app.show_repositories();
            }
            None
        }
        TaskResult::RepositoryLoaded {
            path,
            name,
            listing,
            preselect,
        } => {
            // Race condition protection: only the most recently requested repository is shown
            if app.pending_load.as_ref() != Some(&path) {
                log::debug!("Ignoring stale listing for {}", path.display());
                return None;
            }
            app.pending_load = None;
            app.status_message = format!(
                "{}: {} files, {} sub-repositories",
                name,
                listing.files.len(),
                listing.sub_repositories.len()
            );
            app.navigator.set_files(
                name.clone(),
                listing.files,
                listing.sub_repositories,
                preselect.as_deref(),
            );
            app.current_repo = Some(BrowseContext { path, name });
            None
        }
    }
}

/// React to a request raised by the navigator
pub fn handle_signal(app: &mut App, signal: HostSignal) -> Option<Task> {
    match signal {
        HostSignal::OpenFile(relative) => {
            let base = app
                .current_repo
                .as_ref()
                .map(|context| context.path.clone())
                .unwrap_or_default();
            app.selected_output = Some(base.join(relative));
            app.quit();
            None
        }
        HostSignal::SelectRepository { path, label } => {
            app.context_stack.clear();
            Some(app.load_task(
                BrowseContext {
                    path: PathBuf::from(path),
                    name: label,
                },
                None,
            ))
        }
        HostSignal::EnterSubRepository(relative) => {
            let current = app.current_repo.clone()?;
            let context = BrowseContext {
                path: current.path.join(&relative),
                name: format!("{}/{}", current.name, relative),
            };
            app.context_stack.push(current);
            Some(app.load_task(context, None))
        }
        HostSignal::NavigateBack => {
            if let Some(previous) = app.context_stack.pop() {
                Some(app.load_task(previous, None))
            } else if app.current_repo.is_some() {
                app.show_repositories();
                None
            } else {
                app.quit();
                None
            }
        }
    }
}
