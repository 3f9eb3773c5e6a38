use crate::app::App;
use crate::async_task::Task;
use crate::error::{LoupeError, Result};
use crate::event::handle_event;
use crate::navigator::NavigatorEvent;
use crate::screenshot;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Test file format for headless testing
///
/// Format is a simple text file where each line represents a command:
/// - `key:<keyname>` - Send a key event (e.g., `key:tab`, `key:enter`, `key:ctrl+r`)
/// - `char:<c>` - Send a character (e.g., `char:a`, `char:/`)
/// - `type:<text>` - Send each character of the text in turn
/// - `click:<row>` - Click a visible row by index
/// - `focus_search` - Give the search box focus
/// - `settle` - Commit any pending search text now
/// - `wait:<ms>` - Advance the script clock, committing the search text if it is due
/// - `assert:<property>:<value>` - Assert navigator or host state
/// - `screenshot:<file>` - Compare the current frame with a saved one
/// - `immediate` - Leave typed text pending until `settle` or `wait`
/// - `settle_mode` - Commit typed text after every command (default)
/// - `# comment` - Comments (ignored)
///
/// Examples:
/// ```text
/// # Narrow down to the UI module and open it
/// type:ui mod
/// assert:focused_path:src/ui/mod.rs
/// key:enter
/// assert:last_signal:open:src/ui/mod.rs
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCommand {
    pub command_type: CommandType,
    pub value: String,
    pub immediate: bool,
    /// 1-based line in the script
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    Key,
    Char,
    Type,
    Click,
    FocusSearch,
    Settle,
    Wait,
    Assert,
    Screenshot,
}

#[derive(Debug, Clone)]
pub struct TestScript {
    pub commands: Vec<TestCommand>,
}

#[derive(Debug, Clone)]
pub struct TestRunner {
    pub script: TestScript,
    pub overwrite_mode: bool,
    pub screenshot_base_dir: Option<PathBuf>,
    pub screenshot_width: u16,
    pub screenshot_height: u16,
    /// Tasks the app asked for; nothing runs them in a script
    pub requested_tasks: Vec<Task>,
    clock: Instant,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner {
    pub fn new() -> Self {
        TestRunner {
            script: TestScript {
                commands: Vec::new(),
            },
            overwrite_mode: false,
            screenshot_base_dir: None,
            screenshot_width: 80,
            screenshot_height: 24,
            requested_tasks: Vec::new(),
            clock: Instant::now(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut runner = Self::from_string(&content)?;
        runner.screenshot_base_dir = path.parent().map(Path::to_path_buf);
        Ok(runner)
    }

    pub fn from_string(content: &str) -> Result<Self> {
        let mut commands = Vec::new();
        let mut immediate_mode = false;

        for (line_num, line) in content.lines().enumerate() {
            let line_no = line_num + 1;
            // `type:` keeps trailing spaces, everything else is trimmed
            let line = line.trim_start();
            let trimmed = line.trim_end();

            // Skip empty lines and comments
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            // Parse special directives
            match trimmed {
                "immediate" => {
                    immediate_mode = true;
                    continue;
                }
                "settle_mode" => {
                    immediate_mode = false;
                    continue;
                }
                _ => {}
            }

            let (command_type, value) = if let Some(value) = trimmed.strip_prefix("key:") {
                (CommandType::Key, value)
            } else if let Some(value) = line.strip_prefix("char:") {
                (CommandType::Char, value)
            } else if let Some(value) = line.strip_prefix("type:") {
                (CommandType::Type, value)
            } else if let Some(value) = trimmed.strip_prefix("click:") {
                (CommandType::Click, value)
            } else if trimmed == "focus_search" {
                (CommandType::FocusSearch, "")
            } else if trimmed == "settle" {
                (CommandType::Settle, "")
            } else if let Some(value) = trimmed.strip_prefix("wait:") {
                (CommandType::Wait, value)
            } else if let Some(value) = trimmed.strip_prefix("assert:") {
                (CommandType::Assert, value)
            } else if let Some(value) = trimmed.strip_prefix("screenshot:") {
                (CommandType::Screenshot, value)
            } else {
                return Err(LoupeError::Script {
                    line: line_no,
                    message: format!("invalid command: {}", trimmed),
                });
            };

            if command_type == CommandType::Char && value.chars().count() != 1 {
                return Err(LoupeError::Script {
                    line: line_no,
                    message: "char expects exactly one character".to_string(),
                });
            }

            commands.push(TestCommand {
                command_type,
                value: value.to_string(),
                immediate: immediate_mode,
                line: line_no,
            });
        }

        let mut runner = TestRunner::new();
        runner.script = TestScript { commands };
        Ok(runner)
    }

    /// Run every command against `app`. Failures are collected, not fatal.
    pub fn run(&mut self, app: &mut App) -> TestResult {
        let start_time = Instant::now();
        let mut events_processed = 0;
        let mut assertions_passed = 0;
        let mut assertions_failed = 0;
        let mut errors = Vec::new();

        log::info!(
            "🧪 Starting test run with {} commands",
            self.script.commands.len()
        );

        let commands = self.script.commands.clone();
        for command in &commands {
            log::debug!("🧪 Line {}: {:?} {}", command.line, command.command_type, command.value);

            let outcome = match command.command_type {
                CommandType::Key => self.parse_key_event(&command.value).map(|event| {
                    self.send(app, event);
                    events_processed += 1;
                }),
                CommandType::Char | CommandType::Type => {
                    for c in command.value.chars() {
                        self.send(app, char_event(c));
                        events_processed += 1;
                    }
                    Ok(())
                }
                CommandType::Click => self.click(app, &command.value).map(|_| {
                    events_processed += 1;
                }),
                CommandType::FocusSearch => {
                    self.dispatch(app, NavigatorEvent::FocusSearch);
                    events_processed += 1;
                    Ok(())
                }
                CommandType::Settle => {
                    app.settle();
                    Ok(())
                }
                CommandType::Wait => command
                    .value
                    .parse::<u64>()
                    .map_err(|_| format!("invalid wait duration: {}", command.value))
                    .map(|ms| {
                        self.clock += Duration::from_millis(ms);
                        app.tick(self.clock);
                    }),
                CommandType::Assert => match self.evaluate_assertion(app, &command.value) {
                    Ok(true) => {
                        assertions_passed += 1;
                        log::debug!("🧪 Assertion passed: {}", command.value);
                        Ok(())
                    }
                    Ok(false) => {
                        assertions_failed += 1;
                        Err(format!(
                            "assertion failed: {} (actual: {})",
                            command.value,
                            self.describe(app, &command.value)
                        ))
                    }
                    Err(e) => {
                        assertions_failed += 1;
                        Err(format!("assertion error: {}", e))
                    }
                },
                CommandType::Screenshot => self.take_screenshot(app, &command.value),
            };

            if let Err(e) = outcome {
                errors.push(format!("line {}: {}", command.line, e));
            }

            // Settle mode commits typed text straight away
            if !command.immediate
                && matches!(
                    command.command_type,
                    CommandType::Key | CommandType::Char | CommandType::Type | CommandType::Click
                )
            {
                app.settle();
            }
        }

        let duration = start_time.elapsed();
        log::info!("🧪 Test run completed in {:?}", duration);

        let success = assertions_failed == 0 && errors.is_empty();
        TestResult {
            duration,
            events_processed,
            assertions_passed,
            assertions_failed,
            errors,
            success,
        }
    }

    fn send(&mut self, app: &mut App, event: Event) {
        if let Some(task) = handle_event(event, app, self.clock) {
            log::debug!("🧪 Task requested: {:?}", task);
            self.requested_tasks.push(task);
        }
    }

    fn dispatch(&mut self, app: &mut App, event: NavigatorEvent) {
        if let Some(task) = app.dispatch(event, self.clock) {
            log::debug!("🧪 Task requested: {:?}", task);
            self.requested_tasks.push(task);
        }
    }

    fn click(&mut self, app: &mut App, value: &str) -> std::result::Result<(), String> {
        let index: usize = value
            .parse()
            .map_err(|_| format!("click expects a row index, got {}", value))?;
        let rows = app.navigator.visible_items().len();
        if index >= rows {
            return Err(format!("click on row {} but only {} rows are visible", index, rows));
        }
        self.dispatch(app, NavigatorEvent::ActivateRow(index));
        Ok(())
    }

    pub fn parse_key_event(&self, key_str: &str) -> std::result::Result<Event, String> {
        let mut modifiers = KeyModifiers::NONE;
        let mut rest = key_str.trim();
        loop {
            let lower = rest.to_lowercase();
            if lower.starts_with("ctrl+") {
                modifiers |= KeyModifiers::CONTROL;
                rest = &rest[5..];
            } else if lower.starts_with("alt+") {
                modifiers |= KeyModifiers::ALT;
                rest = &rest[4..];
            } else if lower.starts_with("shift+") {
                modifiers |= KeyModifiers::SHIFT;
                rest = &rest[6..];
            } else {
                break;
            }
        }

        let key_code = match rest.to_lowercase().as_str() {
            "tab" => KeyCode::Tab,
            "enter" => KeyCode::Enter,
            "esc" | "escape" => KeyCode::Esc,
            "space" => KeyCode::Char(' '),
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "backspace" => KeyCode::Backspace,
            _ => {
                let mut chars = rest.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return Err(format!("unknown key: {}", key_str)),
                }
            }
        };

        Ok(Event::Key(KeyEvent::new(key_code, modifiers)))
    }

    pub fn evaluate_assertion(
        &self,
        app: &App,
        assertion: &str,
    ) -> std::result::Result<bool, String> {
        let (property, expected) = assertion
            .split_once(':')
            .ok_or("assertion must be in format 'property:value'")?;
        let navigator = &app.navigator;

        match property {
            "query" => Ok(navigator.query() == expected),
            "input" => Ok(navigator.input() == expected),
            "mode" => Ok(navigator.mode().to_string() == expected),
            "input_focus" => Ok(navigator.input_focus().to_string() == expected),
            "focused_index" => match expected {
                "none" => Ok(navigator.focused_index().is_none()),
                _ => {
                    let index = expected
                        .parse::<usize>()
                        .map_err(|_| "focused_index expects a number or 'none'")?;
                    Ok(navigator.focused_index() == Some(index))
                }
            },
            "focused_path" => match navigator.focused_item() {
                Some(item) => Ok(item.path == expected),
                None => Ok(expected == "none"),
            },
            "rows" => {
                let count = expected.parse::<usize>().map_err(|_| "rows expects a number")?;
                Ok(navigator.visible_items().len() == count)
            }
            "row" => {
                let (index, path) = expected
                    .split_once(':')
                    .ok_or("row expects 'index:path'")?;
                let index = index.parse::<usize>().map_err(|_| "row index must be a number")?;
                Ok(navigator
                    .visible_items()
                    .get(index)
                    .is_some_and(|item| item.path == path))
            }
            "expanded" => Ok(navigator
                .visible_items()
                .iter()
                .any(|item| item.path == expected && item.is_expanded)),
            "omitted_files" => {
                let count = expected
                    .parse::<usize>()
                    .map_err(|_| "omitted_files expects a number")?;
                Ok(navigator.omitted_files() == count)
            }
            "auto_expand" => {
                let expected = expected
                    .parse::<bool>()
                    .map_err(|_| "auto_expand expects boolean value")?;
                Ok(navigator.is_auto_expanded() == expected)
            }
            "last_signal" => match &app.last_signal {
                Some(signal) => Ok(signal.to_string() == expected),
                None => Ok(expected == "none"),
            },
            "last_task" => Ok(describe_task(self.requested_tasks.last()) == expected),
            "should_quit" => {
                let expected = expected
                    .parse::<bool>()
                    .map_err(|_| "should_quit expects boolean value")?;
                Ok(app.should_quit == expected)
            }
            "status_contains" => Ok(app.status_message.contains(expected)),
            _ => Err(format!("unknown assertion property: {}", property)),
        }
    }

    /// Actual value of an assertion's property, for failure messages
    fn describe(&self, app: &App, assertion: &str) -> String {
        let property = assertion.split(':').next().unwrap_or_default();
        let navigator = &app.navigator;
        match property {
            "query" => navigator.query().to_string(),
            "input" => navigator.input().to_string(),
            "mode" => navigator.mode().to_string(),
            "input_focus" => navigator.input_focus().to_string(),
            "focused_index" => navigator
                .focused_index()
                .map_or("none".to_string(), |i| i.to_string()),
            "focused_path" | "row" | "expanded" => navigator
                .visible_items()
                .iter()
                .map(|item| item.path.as_str())
                .collect::<Vec<_>>()
                .join(","),
            "rows" => navigator.visible_items().len().to_string(),
            "omitted_files" => navigator.omitted_files().to_string(),
            "auto_expand" => navigator.is_auto_expanded().to_string(),
            "last_signal" => app
                .last_signal
                .as_ref()
                .map_or("none".to_string(), |s| s.to_string()),
            "last_task" => describe_task(self.requested_tasks.last()),
            "should_quit" => app.should_quit.to_string(),
            "status_contains" => app.status_message.clone(),
            _ => String::new(),
        }
    }

    fn take_screenshot(&self, app: &mut App, filename: &str) -> std::result::Result<(), String> {
        let content = screenshot::render_to_string(app, self.screenshot_width, self.screenshot_height)
            .map_err(|e| e.to_string())?;

        // Resolve the final screenshot path
        let final_path = match &self.screenshot_base_dir {
            Some(base_dir) => base_dir.join(filename),
            None => PathBuf::from(filename),
        };

        if self.overwrite_mode {
            std::fs::write(&final_path, content).map_err(|e| e.to_string())?;
            println!("📸 Screenshot saved to: {}", final_path.display());
            return Ok(());
        }

        match std::fs::read_to_string(&final_path) {
            Ok(existing_content) if existing_content == content => {
                println!("✅ Screenshot verification passed: {}", final_path.display());
                Ok(())
            }
            Ok(_) => Err(format!(
                "screenshot {} differs from the current frame",
                final_path.display()
            )),
            Err(_) => Err(format!("screenshot {} does not exist", final_path.display())),
        }
    }
}

fn char_event(c: char) -> Event {
    Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

fn describe_task(task: Option<&Task>) -> String {
    match task {
        None => "none".to_string(),
        Some(Task::DiscoverRepositories { .. }) => "discover".to_string(),
        Some(Task::LoadRepository { name, .. }) => format!("load:{}", name),
    }
}

#[derive(Debug, Clone)]
pub struct TestResult {
    pub duration: Duration,
    pub events_processed: usize,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    pub errors: Vec<String>,
    pub success: bool,
}

impl TestResult {
    pub fn print_summary(&self) {
        println!("🧪 Test Results:");
        println!("   Duration: {:?}", self.duration);
        println!("   Events processed: {}", self.events_processed);
        println!("   Assertions passed: {}", self.assertions_passed);
        println!("   Assertions failed: {}", self.assertions_failed);

        if !self.errors.is_empty() {
            println!("   Errors:");
            for error in &self.errors {
                println!("     - {}", error);
            }
        }

        if self.success {
            println!("   Status: ✅ PASSED");
        } else {
            println!("   Status: ❌ FAILED");
        }
    }
}
