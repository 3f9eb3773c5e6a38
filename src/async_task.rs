use crate::discovery::{self, RepositoryListing};
use crate::navigator::RepoItem;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    DiscoverRepositories {
        roots: Vec<PathBuf>,
        max_depth: usize,
    },
    LoadRepository {
        path: PathBuf,
        name: String,
        max_depth: usize,
        /// File to focus once loaded, relative to the repository
        preselect: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    RepositoriesDiscovered {
        repos: Vec<RepoItem>,
    },
    RepositoryLoaded {
        path: PathBuf,
        name: String,
        listing: RepositoryListing,
        preselect: Option<String>,
    },
}

/// Process tasks until the sender is dropped or `cancel` fires.
///
/// Each result is delivered whole; the receiver never sees a partial scan.
pub async fn run_worker(
    mut task_receiver: mpsc::Receiver<Task>,
    result_sender: mpsc::Sender<TaskResult>,
    cancel: CancellationToken,
) {
    loop {
        let task = tokio::select! {
            _ = cancel.cancelled() => {
                log::debug!("Worker: cancelled");
                break;
            }
            task = task_receiver.recv() => match task {
                Some(task) => task,
                None => break,
            },
        };

        log::debug!("🕐 Worker: starting {:?}", task);
        let result = tokio::select! {
            _ = cancel.cancelled() => {
                log::debug!("Worker: cancelled during task");
                break;
            }
            result = run_task(task) => result,
        };

        if result_sender.send(result).await.is_err() {
            // Main thread has dropped the receiver, exit worker
            break;
        }
    }
}

pub async fn run_task(task: Task) -> TaskResult {
    match task {
        Task::DiscoverRepositories { roots, max_depth } => TaskResult::RepositoriesDiscovered {
            repos: discovery::discover_repositories(&roots, max_depth).await,
        },
        Task::LoadRepository {
            path,
            name,
            max_depth,
            preselect,
        } => {
            let listing = discovery::load_repository(path.clone(), max_depth).await;
            TaskResult::RepositoryLoaded {
                path,
                name,
                listing,
                preselect,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use std::time::Duration;

    #[tokio::test]
    async fn test_worker_discovers_repositories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("one/.git")).unwrap();
        fs::create_dir_all(dir.path().join("two/.git")).unwrap();

        let (task_tx, task_rx) = mpsc::channel(4);
        let (result_tx, mut result_rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(run_worker(task_rx, result_tx, cancel.clone()));

        task_tx
            .send(Task::DiscoverRepositories {
                roots: vec![dir.path().to_path_buf()],
                max_depth: 3,
            })
            .await
            .unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), result_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_matches!(result, TaskResult::RepositoriesDiscovered { ref repos } if repos.len() == 2);
        if let TaskResult::RepositoriesDiscovered { repos } = result {
            let labels: Vec<&str> = repos.iter().map(|r| r.label.as_str()).collect();
            assert_eq!(labels, vec!["one", "two"]);
        }

        cancel.cancel();
        worker.await.unwrap();
    }

    #[tokio::test]
    async fn test_worker_stops_when_tasks_end() {
        let (task_tx, task_rx) = mpsc::channel::<Task>(1);
        let (result_tx, _result_rx) = mpsc::channel(1);
        let worker = tokio::spawn(run_worker(task_rx, result_tx, CancellationToken::new()));
        drop(task_tx);
        tokio::time::timeout(Duration::from_secs(5), worker)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_repository_task() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.rs"), "fn main() {}").unwrap();
        fs::create_dir_all(dir.path().join("vendor/dep/.git")).unwrap();

        let result = run_task(Task::LoadRepository {
            path: dir.path().to_path_buf(),
            name: "demo".to_string(),
            max_depth: 5,
            preselect: Some("src/main.rs".to_string()),
        })
        .await;

        assert_matches!(result, TaskResult::RepositoryLoaded { .. });
        if let TaskResult::RepositoryLoaded { listing, preselect, name, .. } = result {
            assert_eq!(name, "demo");
            assert_eq!(preselect.as_deref(), Some("src/main.rs"));
            assert_eq!(listing.files, vec!["src/main.rs".to_string()]);
            assert_eq!(listing.sub_repositories, vec!["vendor/dep".to_string()]);
        }
    }
}
