use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::fs;
use std::path::Path;

use crate::app::App;
use crate::config::Config;
use crate::error::Result;
use crate::session::Session;
use crate::ui;

/// Render a saved session into a text snapshot of one frame
pub fn generate_screenshot(
    session_path: &Path,
    config: Config,
    output_path: Option<&Path>,
    width: u16,
    height: u16,
) -> Result<()> {
    let session = Session::load_from_file(session_path)?;
    let mut app = App::from_session(session, config);

    let screenshot = render_to_string(&mut app, width, height)?;

    match output_path {
        Some(path) => {
            fs::write(path, screenshot)?;
            println!("Screenshot saved to: {}", path.display());
        }
        None => {
            print!("{}", screenshot);
        }
    }

    Ok(())
}

/// Draw the app once on an off-screen terminal
pub fn render_to_string(app: &mut App, width: u16, height: u16) -> Result<String> {
    let backend = TestBackend::new(width, height);
    let mut terminal = Terminal::new(backend)?;
    terminal.draw(|frame| ui::draw(frame, app))?;
    Ok(buffer_to_string(terminal.backend().buffer()))
}

pub fn buffer_to_string(buffer: &Buffer) -> String {
    let mut result = String::new();

    for y in 0..buffer.area().height {
        for x in 0..buffer.area().width {
            let sym = buffer[(x, y)].symbol();

            // Use a space for empty cells to make output more readable
            if sym.is_empty() {
                result.push(' ');
            } else {
                result.push_str(sym);
            }
        }
        result.push('\n');
    }

    result
}
