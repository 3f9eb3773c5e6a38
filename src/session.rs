use crate::error::Result;
use crate::navigator::{BrowseMode, NavigatorEvent, NavigatorLimits, NavigatorState, RepoItem};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initial navigator input, saved as JSON for screenshots and scripted tests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Session {
    pub mode: BrowseMode,
    pub repositories: Vec<RepoItem>,
    pub files: Vec<String>,
    pub sub_repositories: Vec<String>,
    pub repository_name: String,
    /// File to focus once the list is shown
    pub preselect: Option<String>,
    /// Query committed before the first frame
    pub query: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            mode: BrowseMode::Files,
            repositories: Vec::new(),
            files: vec![
                "Cargo.toml".to_string(),
                "README.md".to_string(),
                "src/lib.rs".to_string(),
                "src/main.rs".to_string(),
                "src/ui/list.rs".to_string(),
                "src/ui/mod.rs".to_string(),
                "tests/smoke.rs".to_string(),
            ],
            sub_repositories: vec!["vendor/parser".to_string()],
            repository_name: "demo".to_string(),
            preselect: None,
            query: None,
        }
    }
}

impl Session {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn into_navigator(self, limits: NavigatorLimits) -> NavigatorState {
        let mut navigator = NavigatorState::new(limits);
        match self.mode {
            BrowseMode::Repos => navigator.set_repos(self.repositories),
            BrowseMode::Files => navigator.set_files(
                self.repository_name,
                self.files,
                self.sub_repositories,
                self.preselect.as_deref(),
            ),
        }
        if let Some(query) = self.query {
            navigator.handle_event(NavigatorEvent::QueryChanged(query));
        }
        navigator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_session_navigator() {
        let navigator = Session::default().into_navigator(NavigatorLimits::default());
        assert_eq!(navigator.mode(), BrowseMode::Files);
        assert_eq!(navigator.repo_name(), "demo");
        let paths: Vec<&str> = navigator.visible_items().iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["src", "tests", "vendor", "Cargo.toml", "README.md"]);
    }

    #[test]
    fn test_sparse_json_uses_defaults() {
        let session: Session =
            serde_json::from_str(r#"{"mode": "repos", "repositories": [{"path": "/w/a", "label": "a"}]}"#)
                .unwrap();
        assert_eq!(session.mode, BrowseMode::Repos);
        assert_eq!(session.repositories[0].description, "");

        let navigator = session.into_navigator(NavigatorLimits::default());
        assert_eq!(navigator.visible_items().len(), 1);
    }

    #[test]
    fn test_session_query_is_committed() {
        let session = Session {
            query: Some("ui mod".to_string()),
            ..Session::default()
        };
        let navigator = session.into_navigator(NavigatorLimits::default());
        assert_eq!(navigator.query(), "ui mod");
        assert_eq!(
            navigator.focused_item().map(|i| i.path.as_str()),
            Some("src/ui/mod.rs")
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let session = Session::default();
        session.save_to_file(&path).unwrap();
        assert_eq!(Session::load_from_file(&path).unwrap(), session);
    }
}
