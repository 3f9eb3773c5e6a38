use loupe::app::App;
use loupe::config::Config;
use loupe::navigator::{BrowseMode, RepoItem};
use loupe::session::Session;
use loupe::test_runner::{TestResult, TestRunner};

/// Run an inline script against a session and return the outcome
fn run_script(session: Session, script: &str) -> (TestResult, App) {
    let mut app = App::from_session(session, Config::default());
    let mut runner = TestRunner::from_string(script).expect("script should parse");
    let result = runner.run(&mut app);
    if !result.success {
        result.print_summary();
    }
    (result, app)
}

fn project_session() -> Session {
    Session {
        files: [
            "Cargo.toml",
            "README.md",
            "docs/guide/intro.md",
            "docs/guide/setup.md",
            "src/main.rs",
            "src/parser/lexer.rs",
            "src/parser/mod.rs",
            "tests/parser.rs",
        ]
        .iter()
        .map(|f| f.to_string())
        .collect(),
        sub_repositories: vec!["third_party/grammar".to_string()],
        repository_name: "compiler".to_string(),
        ..Session::default()
    }
}

fn repos_session() -> Session {
    let repo = |path: &str, label: &str| RepoItem {
        path: path.to_string(),
        label: label.to_string(),
        description: String::new(),
    };
    Session {
        mode: BrowseMode::Repos,
        repositories: vec![
            repo("/w/api", "api"),
            repo("/w/tools/cli", "tools/cli"),
            repo("/w/web", "web"),
        ],
        ..Session::default()
    }
}

#[test]
fn test_tokens_match_in_order() {
    let (result, _) = run_script(
        project_session(),
        r#"
type:parser mod
assert:rows:3
assert:focused_path:src/parser/mod.rs
focus_search
key:esc
assert:query:parser
assert:focused_index:none
assert:auto_expand:true
"#,
    );
    assert!(result.success, "{:?}", result.errors);
}

#[test]
fn test_browse_collapsed_tree_with_arrows() {
    let (result, _) = run_script(
        project_session(),
        r#"
# Directories first, collapsed, nothing focused
assert:row:0:docs
assert:row:4:Cargo.toml
assert:focused_index:none
key:tab
key:down
assert:focused_path:Cargo.toml
key:down
assert:focused_path:README.md
key:down
assert:focused_path:Cargo.toml
key:down
key:up
assert:focused_path:Cargo.toml
# Up from the first file hands focus back to the search box
key:up
assert:input_focus:search
assert:focused_index:none
"#,
    );
    assert!(result.success, "{:?}", result.errors);
}

#[test]
fn test_expand_collapse_with_enter_and_arrows() {
    let (result, _) = run_script(
        project_session(),
        r#"
click:1
assert:expanded:src
assert:row:2:src/parser
assert:row:3:src/main.rs
assert:focused_index:1
key:down
assert:focused_path:src/main.rs
key:down
assert:focused_path:Cargo.toml
key:up
assert:focused_path:src/main.rs
click:1
assert:rows:6
"#,
    );
    assert!(result.success, "{:?}", result.errors);
}

#[test]
fn test_up_from_first_row_returns_to_search() {
    let (result, _) = run_script(
        project_session(),
        r#"
type:guide
assert:focused_path:docs/guide/intro.md
key:tab
assert:input_focus:list
key:up
assert:input_focus:search
assert:focused_index:none
"#,
    );
    assert!(result.success, "{:?}", result.errors);
}

#[test]
fn test_sub_repository_row_requests_entry() {
    let (result, _) = run_script(
        project_session(),
        r#"
type:grammar
assert:focused_path:third_party/grammar
key:enter
assert:last_signal:enter:third_party/grammar
assert:last_task:load:compiler/third_party/grammar
assert:should_quit:false
"#,
    );
    assert!(result.success, "{:?}", result.errors);
}

#[test]
fn test_escape_peels_tokens_then_goes_back() {
    let (result, app) = run_script(
        project_session(),
        r#"
type:src parser lexer
key:esc
assert:query:src parser
key:esc
assert:query:src
key:esc
assert:query:
assert:rows:6
key:esc
assert:last_signal:back
assert:mode:repos
"#,
    );
    assert!(result.success, "{:?}", result.errors);
    assert!(!app.should_quit);
}

#[test]
fn test_repository_list_filter_and_select() {
    let (result, _) = run_script(
        repos_session(),
        r#"
assert:rows:3
assert:focused_index:none
type:cli
assert:rows:1
assert:focused_index:0
key:enter
assert:last_signal:select:/w/tools/cli
assert:last_task:load:tools/cli
assert:status_contains:Loading tools/cli
"#,
    );
    assert!(result.success, "{:?}", result.errors);
}

#[test]
fn test_repository_list_wraps() {
    let (result, app) = run_script(
        repos_session(),
        r#"
key:up
assert:focused_index:2
key:down
assert:focused_index:0
key:esc
assert:should_quit:true
"#,
    );
    assert!(result.success, "{:?}", result.errors);
    assert!(app.selected_output.is_none());
}

#[test]
fn test_debounced_typing_in_immediate_mode() {
    let (result, _) = run_script(
        project_session(),
        r#"
immediate
type:lex
assert:query:
wait:99
assert:query:
char:e
wait:99
assert:query:
wait:1
assert:query:lexe
settle_mode
"#,
    );
    assert!(result.success, "{:?}", result.errors);
}

#[test]
fn test_failing_script_reports_errors() {
    let (result, _) = run_script(project_session(), "assert:mode:repos\nassert:bogus:1\n");
    assert!(!result.success);
    assert_eq!(result.assertions_failed, 2);
    assert_eq!(result.errors.len(), 2);
}
