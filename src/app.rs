use crate::async_task::Task;
use crate::config::Config;
use crate::debounce::Debouncer;
use crate::navigator::{BrowseMode, HostSignal, NavigatorEvent, NavigatorState, RepoItem};
use crate::session::Session;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::time::Instant;

/// A repository being browsed in files mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseContext {
    pub path: PathBuf,
    pub name: String,
}

pub struct App {
    pub config: Config,
    pub navigator: NavigatorState,
    pub debouncer: Debouncer<String>,
    pub list_state: ListState,
    /// Inner area of the list as last drawn, for mapping clicks to rows
    pub list_area: Option<Rect>,

    pub roots: Vec<PathBuf>,
    pub repositories: Vec<RepoItem>,
    pub current_repo: Option<BrowseContext>,
    /// Repositories to return to when leaving a sub-repository
    pub context_stack: Vec<BrowseContext>,
    /// Repository whose listing is in flight; older results are dropped
    pub pending_load: Option<PathBuf>,
    /// Absolute file path to open once discovery finishes
    pub pending_preselect: Option<PathBuf>,

    pub status_message: String,
    pub is_loading: bool,
    pub should_quit: bool,
    /// Absolute path of the file picked by the user
    pub selected_output: Option<PathBuf>,
    pub last_signal: Option<HostSignal>,
}

impl App {
    pub fn new(config: Config, roots: Vec<PathBuf>) -> Self {
        let navigator = NavigatorState::new(config.navigator_limits());
        let debouncer = Debouncer::new(config.debounce_delay());
        Self {
            config,
            navigator,
            debouncer,
            list_state: ListState::default(),
            list_area: None,

            roots,
            repositories: Vec::new(),
            current_repo: None,
            context_stack: Vec::new(),
            pending_load: None,
            pending_preselect: None,

            status_message: "Ready".to_string(),
            is_loading: false,
            should_quit: false,
            selected_output: None,
            last_signal: None,
        }
    }

    /// Build an app around a saved session, without any filesystem access
    pub fn from_session(session: Session, config: Config) -> Self {
        let mut app = App::new(config, Vec::new());
        if session.mode == BrowseMode::Files {
            app.current_repo = Some(BrowseContext {
                path: PathBuf::from(&session.repository_name),
                name: session.repository_name.clone(),
            });
        }
        app.repositories = session.repositories.clone();
        app.navigator = session.into_navigator(app.config.navigator_limits());
        app
    }

    /// Feed one event to the navigator and keep the debouncer in step with
    /// the search box. Returns a task for the worker if the event led to one.
    pub fn dispatch(&mut self, event: NavigatorEvent, now: Instant) -> Option<Task> {
        let edits_input = matches!(event, NavigatorEvent::InsertChar(_) | NavigatorEvent::DeleteChar);
        let input_before = self.navigator.input().to_string();

        let signal = self.navigator.handle_event(event);

        if edits_input {
            if self.navigator.input() != input_before {
                self.debouncer.schedule(self.navigator.input().to_string(), now);
            }
        } else if self.navigator.input() != input_before {
            // The navigator committed the new text itself
            self.debouncer.cancel();
        }

        let signal = signal?;
        self.last_signal = Some(signal.clone());
        crate::main_lib::handle_signal(self, signal)
    }

    /// Commit the search text once the debounce delay has passed
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.debouncer.poll(now) {
            Some(query) => {
                self.navigator.handle_event(NavigatorEvent::QueryChanged(query));
                true
            }
            None => false,
        }
    }

    /// Commit any pending search text immediately
    pub fn settle(&mut self) -> bool {
        match self.debouncer.flush() {
            Some(query) => {
                self.navigator.handle_event(NavigatorEvent::QueryChanged(query));
                true
            }
            None => false,
        }
    }

    pub fn discover_task(&self) -> Task {
        Task::DiscoverRepositories {
            roots: self.roots.clone(),
            max_depth: self.config.max_depth,
        }
    }

    /// Start loading a repository and remember it as the one to accept
    pub fn load_task(&mut self, context: BrowseContext, preselect: Option<String>) -> Task {
        self.pending_load = Some(context.path.clone());
        self.is_loading = true;
        self.status_message = format!("Loading {}...", context.name);
        Task::LoadRepository {
            path: context.path,
            name: context.name,
            max_depth: self.config.max_depth,
            preselect,
        }
    }

    /// Re-scan whatever is on screen and hand focus back to the search box
    pub fn refresh_task(&mut self) -> Task {
        self.navigator.handle_event(NavigatorEvent::FocusSearch);
        match self.current_repo.clone() {
            Some(context) => self.load_task(context, None),
            None => {
                self.is_loading = true;
                self.status_message = "Scanning...".to_string();
                self.discover_task()
            }
        }
    }

    /// Leave files mode and show the repository list again
    pub fn show_repositories(&mut self) {
        self.current_repo = None;
        self.context_stack.clear();
        self.pending_load = None;
        self.navigator.set_repos(self.repositories.clone());
        self.status_message = format!("{} repositories", self.repositories.len());
    }

    /// Keep the list widget's selection on the focused row
    pub fn sync_list_state(&mut self) {
        self.list_state.select(self.navigator.focused_index());
    }

    /// Row index under a terminal cell, if the cell is inside the list
    pub fn row_at(&self, column: u16, row: u16) -> Option<usize> {
        let area = self.list_area?;
        let inside = column >= area.x
            && column < area.x + area.width
            && row >= area.y
            && row < area.y + area.height;
        inside.then(|| self.list_state.offset() + usize::from(row - area.y))
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
