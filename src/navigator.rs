//! Navigator state machine
//!
//! `NavigatorState` owns everything the browser mutates in response to input:
//! the search text, the focused row, both expansion sets and the last rendered
//! display sequence. Every event goes through [`NavigatorState::handle_event`],
//! which may hand a [`HostSignal`] back to whoever drives the state.

use crate::filter;
use crate::navigation::{self, NavigationMode};
use crate::tree::{self, FlatItem, FlattenOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_AUTO_EXPAND_THRESHOLD: usize = 100;
pub const DEFAULT_MAX_VISIBLE_ROWS: usize = 100;

/// A discovered repository as shown in the repository list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoItem {
    pub path: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
}

/// What the navigator is currently browsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseMode {
    #[default]
    Repos,
    Files,
}

impl BrowseMode {
    pub fn navigation_mode(self) -> NavigationMode {
        match self {
            BrowseMode::Repos => NavigationMode::List,
            BrowseMode::Files => NavigationMode::Tree,
        }
    }
}

impl fmt::Display for BrowseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowseMode::Repos => write!(f, "repos"),
            BrowseMode::Files => write!(f, "files"),
        }
    }
}

/// Which widget receives key presses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFocus {
    #[default]
    Search,
    List,
}

impl fmt::Display for InputFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFocus::Search => write!(f, "search"),
            InputFocus::List => write!(f, "list"),
        }
    }
}

/// Events that can be sent to the navigator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorEvent {
    /// A printable character typed anywhere; focus moves to the search box
    InsertChar(char),
    DeleteChar,
    /// Debounced commit of the search text
    QueryChanged(String),
    NavigateUp,
    NavigateDown,
    ExpandFocused,
    CollapseFocused,
    ToggleDirectory(String),
    ActivateFocused,
    /// Pointer click on a row
    ActivateRow(usize),
    Escape,
    FocusSearch,
    ToggleInputFocus,
}

/// Requests the navigator makes of its host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostSignal {
    OpenFile(String),
    SelectRepository { path: String, label: String },
    EnterSubRepository(String),
    NavigateBack,
}

impl fmt::Display for HostSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostSignal::OpenFile(path) => write!(f, "open:{}", path),
            HostSignal::SelectRepository { path, .. } => write!(f, "select:{}", path),
            HostSignal::EnterSubRepository(path) => write!(f, "enter:{}", path),
            HostSignal::NavigateBack => write!(f, "back"),
        }
    }
}

/// Size bounds applied while rendering the file tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorLimits {
    /// Largest match count that still auto-expands the tree
    pub auto_expand_threshold: usize,
    /// Row cap applied when a single top-level directory is force-opened
    pub max_visible_rows: usize,
}

impl Default for NavigatorLimits {
    fn default() -> Self {
        Self {
            auto_expand_threshold: DEFAULT_AUTO_EXPAND_THRESHOLD,
            max_visible_rows: DEFAULT_MAX_VISIBLE_ROWS,
        }
    }
}

/// Everything the UI needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorViewModel {
    pub mode: BrowseMode,
    pub items: Vec<FlatItem>,
    pub focused_index: Option<usize>,
    pub input: String,
    pub input_focus: InputFocus,
    pub placeholder: String,
    pub empty_message: Option<String>,
    pub footer: Option<String>,
}

#[derive(Debug, Default)]
struct RenderedView {
    items: Vec<FlatItem>,
    omitted_files: usize,
    auto_expand: bool,
}

#[derive(Debug, Default)]
pub struct NavigatorState {
    mode: BrowseMode,
    repos: Vec<RepoItem>,
    files: Vec<String>,
    sub_repos: Vec<String>,
    sub_repo_set: HashSet<String>,
    repo_name: String,

    input: String,
    query: String,
    focused_index: Option<usize>,
    input_focus: InputFocus,
    expanded_dirs: HashSet<String>,
    manually_collapsed: HashSet<String>,

    visible_items: Vec<FlatItem>,
    omitted_files: usize,
    auto_expand: bool,
    limits: NavigatorLimits,
}

impl NavigatorState {
    pub fn new(limits: NavigatorLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }

    /// Switch to the repository list
    pub fn set_repos(&mut self, repos: Vec<RepoItem>) {
        log::info!("📦 Navigator: {} repositories", repos.len());
        self.mode = BrowseMode::Repos;
        self.repos = repos;
        self.reset_view_state();
        self.render();
    }

    /// Switch to browsing the files of one repository.
    ///
    /// `preselect` names a file to focus; its ancestors are expanded so the row
    /// is visible.
    pub fn set_files(
        &mut self,
        repo_name: impl Into<String>,
        files: Vec<String>,
        sub_repos: Vec<String>,
        preselect: Option<&str>,
    ) {
        self.mode = BrowseMode::Files;
        self.repo_name = repo_name.into();
        log::info!(
            "📂 Navigator: {} files, {} sub-repositories in {}",
            files.len(),
            sub_repos.len(),
            self.repo_name
        );
        self.files = files;
        self.sub_repo_set = sub_repos.iter().cloned().collect();
        self.sub_repos = sub_repos;
        self.reset_view_state();
        self.render();

        if let Some(path) = preselect {
            if !self.preselect(path) {
                log::debug!("Preselect target {} is not in the file list", path);
            }
        }
    }

    fn reset_view_state(&mut self) {
        self.input.clear();
        self.query.clear();
        self.focused_index = None;
        self.input_focus = InputFocus::Search;
        self.expanded_dirs.clear();
        self.manually_collapsed.clear();
    }

    /// Expand the ancestors of `path` and focus its row
    pub fn preselect(&mut self, path: &str) -> bool {
        if self.mode != BrowseMode::Files || !self.files.iter().any(|f| f == path) {
            return false;
        }
        self.expanded_dirs.extend(tree::ancestors(path));
        self.render();
        self.focused_index = self.visible_items.iter().position(|item| item.path == path);
        self.focused_index.is_some()
    }

    /// Handle an event, returning a signal for the host if one is raised
    pub fn handle_event(&mut self, event: NavigatorEvent) -> Option<HostSignal> {
        log::debug!("Navigator event: {:?}", event);

        let signal = match event {
            NavigatorEvent::InsertChar(c) => {
                self.input_focus = InputFocus::Search;
                self.input.push(c);
                None
            }

            NavigatorEvent::DeleteChar => {
                self.input_focus = InputFocus::Search;
                self.input.pop();
                None
            }

            NavigatorEvent::QueryChanged(query) => {
                self.input = query.clone();
                self.apply_query(query);
                None
            }

            NavigatorEvent::NavigateDown => {
                if !self.visible_items.is_empty() {
                    self.focused_index = navigation::next(
                        &self.visible_items,
                        self.focused_index,
                        self.mode.navigation_mode(),
                    );
                }
                None
            }

            NavigatorEvent::NavigateUp => {
                self.navigate_up();
                None
            }

            NavigatorEvent::ExpandFocused => {
                if let Some(item) = self.focused_item() {
                    if item.is_dir && !item.is_expanded {
                        let path = item.path.clone();
                        self.set_expanded(&path, true);
                        self.render();
                    }
                }
                None
            }

            NavigatorEvent::CollapseFocused => {
                if let Some(item) = self.focused_item() {
                    if item.is_dir && item.is_expanded {
                        let path = item.path.clone();
                        self.set_expanded(&path, false);
                        self.render();
                    }
                }
                None
            }

            NavigatorEvent::ToggleDirectory(path) => {
                let target = self
                    .visible_items
                    .iter()
                    .find(|item| item.path == path && item.is_dir)
                    .map(|item| item.is_expanded);
                if let Some(is_expanded) = target {
                    self.set_expanded(&path, !is_expanded);
                    self.render();
                }
                None
            }

            NavigatorEvent::ActivateFocused => self.activate_focused(),

            NavigatorEvent::ActivateRow(index) => {
                if index < self.visible_items.len() {
                    self.focused_index = Some(index);
                    self.input_focus = InputFocus::List;
                    self.activate_focused()
                } else {
                    None
                }
            }

            NavigatorEvent::Escape => self.escape(),

            NavigatorEvent::FocusSearch => {
                self.input_focus = InputFocus::Search;
                None
            }

            NavigatorEvent::ToggleInputFocus => {
                self.input_focus = match self.input_focus {
                    InputFocus::Search => InputFocus::List,
                    InputFocus::List => InputFocus::Search,
                };
                None
            }
        };

        if let Some(ref signal) = signal {
            log::info!("📤 Navigator signal: {}", signal);
        }
        signal
    }

    fn apply_query(&mut self, query: String) {
        let was_filtered = !self.query.trim().is_empty();
        self.query = query;
        self.focused_index = None;
        self.manually_collapsed.clear();

        let is_filtered = !self.query.trim().is_empty();
        if was_filtered && !is_filtered {
            self.expanded_dirs.clear();
        }

        self.render();
        if is_filtered {
            self.focused_index = navigation::first(&self.visible_items, self.mode.navigation_mode());
        }
    }

    fn navigate_up(&mut self) {
        let mode = self.mode.navigation_mode();
        let at_top = self.focused_index.is_none()
            || self.focused_index == navigation::first(&self.visible_items, mode);

        if self.input_focus == InputFocus::List && at_top {
            self.input_focus = InputFocus::Search;
            self.focused_index = None;
        } else if !self.visible_items.is_empty() {
            self.focused_index = navigation::prev(&self.visible_items, self.focused_index, mode);
        }
    }

    fn escape(&mut self) -> Option<HostSignal> {
        if self.input_focus == InputFocus::List {
            self.input_focus = InputFocus::Search;
            return None;
        }
        if self.input.is_empty() {
            return Some(HostSignal::NavigateBack);
        }

        let truncated = remove_last_token(&self.input);
        self.input = truncated.clone();
        let was_filtered = !self.query.trim().is_empty();
        self.query = truncated;
        self.focused_index = None;
        self.manually_collapsed.clear();
        if was_filtered && self.query.trim().is_empty() {
            self.expanded_dirs.clear();
        }
        self.render();
        None
    }

    fn activate_focused(&mut self) -> Option<HostSignal> {
        let item = self.focused_item()?.clone();
        match self.mode {
            BrowseMode::Repos => Some(HostSignal::SelectRepository {
                label: item.label.unwrap_or(item.name),
                path: item.path,
            }),
            BrowseMode::Files if item.is_sub_repo => Some(HostSignal::EnterSubRepository(item.path)),
            BrowseMode::Files if item.is_dir => {
                self.set_expanded(&item.path, !item.is_expanded);
                self.render();
                None
            }
            BrowseMode::Files => Some(HostSignal::OpenFile(item.path)),
        }
    }

    /// Open or close one directory. The two sets always move as a pair.
    fn set_expanded(&mut self, path: &str, expand: bool) {
        if expand {
            self.manually_collapsed.remove(path);
            self.expanded_dirs.insert(path.to_string());
        } else {
            self.expanded_dirs.remove(path);
            self.manually_collapsed.insert(path.to_string());
        }
    }

    /// Recompute the display sequence from the owned state. Focus is left untouched.
    pub fn render(&mut self) {
        let start = std::time::Instant::now();
        let view = self.compute_view();
        log::debug!(
            "Render: {} rows ({} omitted, auto_expand={}) in {:?}",
            view.items.len(),
            view.omitted_files,
            view.auto_expand,
            start.elapsed()
        );
        self.visible_items = view.items;
        self.omitted_files = view.omitted_files;
        self.auto_expand = view.auto_expand;
    }

    fn compute_view(&self) -> RenderedView {
        let query = self.query.trim();
        match self.mode {
            BrowseMode::Repos => RenderedView {
                items: filter::filter_repos(&self.repos, query)
                    .into_iter()
                    .map(|repo| FlatItem::repo(repo.path, repo.label, repo.description))
                    .collect(),
                ..RenderedView::default()
            },
            BrowseMode::Files => self.compute_file_view(query),
        }
    }

    fn compute_file_view(&self, query: &str) -> RenderedView {
        let files = filter::filter(&self.files, query);
        let markers = filter::filter(&self.sub_repos, query);
        let matched = files
            .iter()
            .chain(markers.iter())
            .collect::<HashSet<_>>()
            .len();

        let mut root = tree::build(&files);
        tree::insert_markers(&mut root, &markers);

        let single_dir = root.has_single_dir_child();
        // Markers do not count towards the threshold
        let auto_expand =
            !query.is_empty() && (files.len() <= self.limits.auto_expand_threshold || single_dir);

        let options = FlattenOptions {
            auto_expand,
            expanded_dirs: &self.expanded_dirs,
            manually_collapsed: &self.manually_collapsed,
            sub_repos: &self.sub_repo_set,
        };
        let mut items = tree::flatten(&root, 0, &options);

        let mut omitted_files = 0;
        if single_dir && items.len() > self.limits.max_visible_rows {
            items.truncate(self.limits.max_visible_rows);
            let shown = items.iter().filter(|item| !item.is_dir).count();
            omitted_files = matched.saturating_sub(shown);
        }

        RenderedView {
            items,
            omitted_files,
            auto_expand,
        }
    }

    /// Snapshot for drawing
    pub fn view_model(&self) -> NavigatorViewModel {
        NavigatorViewModel {
            mode: self.mode,
            items: self.visible_items.clone(),
            focused_index: self.focused_index,
            input: self.input.clone(),
            input_focus: self.input_focus,
            placeholder: self.placeholder(),
            empty_message: self.empty_message().map(str::to_string),
            footer: (self.omitted_files > 0).then(|| format!("… {} more files", self.omitted_files)),
        }
    }

    pub fn placeholder(&self) -> String {
        match self.mode {
            BrowseMode::Repos => format!("Search repositories ({})", self.repos.len()),
            BrowseMode::Files => format!(
                "Search files in {} ({} files)",
                self.repo_name,
                self.files.len()
            ),
        }
    }

    /// Message shown in place of an empty list
    pub fn empty_message(&self) -> Option<&'static str> {
        if !self.visible_items.is_empty() {
            return None;
        }
        Some(match self.mode {
            BrowseMode::Repos if self.repos.is_empty() => "No repositories found",
            BrowseMode::Repos => "No matching repositories",
            BrowseMode::Files if self.files.is_empty() && self.sub_repos.is_empty() => "No files loaded",
            BrowseMode::Files => "No matching files",
        })
    }

    pub fn mode(&self) -> BrowseMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// The search box text, which may be ahead of the committed query
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_focus(&self) -> InputFocus {
        self.input_focus
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused_index
    }

    pub fn focused_item(&self) -> Option<&FlatItem> {
        self.focused_index.and_then(|i| self.visible_items.get(i))
    }

    pub fn visible_items(&self) -> &[FlatItem] {
        &self.visible_items
    }

    pub fn omitted_files(&self) -> usize {
        self.omitted_files
    }

    pub fn is_auto_expanded(&self) -> bool {
        self.auto_expand
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn repos(&self) -> &[RepoItem] {
        &self.repos
    }

    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn sub_repositories(&self) -> &[String] {
        &self.sub_repos
    }

    pub fn expanded_dirs(&self) -> &HashSet<String> {
        &self.expanded_dirs
    }

    pub fn manually_collapsed(&self) -> &HashSet<String> {
        &self.manually_collapsed
    }

    pub fn limits(&self) -> NavigatorLimits {
        self.limits
    }
}

/// Drop the last whitespace-delimited token, e.g. "foo bar baz" -> "foo bar"
pub fn remove_last_token(query: &str) -> String {
    let trimmed = query.trim_end();
    match trimmed.rfind(char::is_whitespace) {
        Some(idx) => trimmed[..idx].trim_end().to_string(),
        None => String::new(),
    }
}
