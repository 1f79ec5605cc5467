use std::io;
use std::rc::Rc;
use std::time::Duration;

use arboard::Clipboard;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use eyre::Result;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::config::Config;
use crate::logging;
use crate::models::{Direction, MarkerKind, PressResult};
use crate::reading::{PaneState, ReadingController};
use crate::share::{
    self, ShareUrlRequest, append_split_text_for_copy_share, prepare_text_for_copy_share,
    remove_special_codes,
};
use crate::state::MarkerStore;

#[derive(Debug, Clone, PartialEq)]
enum InputMode {
    Normal,
    Goto(String),
}

/// The interactive reading screen: one or two verse panes, a status line,
/// and a goto prompt.
pub struct Reader {
    controller: ReadingController,
    store: Rc<MarkerStore>,
    config: Config,
    input_mode: InputMode,
    message: Option<String>,
    should_quit: bool,
}

impl Reader {
    pub fn new(controller: ReadingController, store: Rc<MarkerStore>, config: Config) -> Self {
        Self {
            controller,
            store,
            config,
            input_mode: InputMode::Normal,
            message: None,
            should_quit: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), crossterm::terminal::EnterAlternateScreen)?;

        let backend = CrosstermBackend::new(io::stdout());
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;
        terminal.hide_cursor()?;

        let result = self.event_loop(&mut terminal);

        crossterm::execute!(io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
        crossterm::terminal::disable_raw_mode()?;

        // Persist the location for the next start, whatever ended the loop.
        let save = self.store.save_last_state(
            self.controller.current_ari(),
            self.controller.split_version_id(),
        );
        if let Err(err) = save {
            logging::error(format!("cannot save last state: {err}"));
        }

        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            if self.should_quit {
                return Ok(());
            }

            terminal.draw(|frame| self.draw(frame))?;

            if !crossterm::event::poll(Duration::from_millis(250))? {
                continue;
            }
            if let Event::Key(key) = crossterm::event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
            }
        }
    }

    fn draw(&self, frame: &mut Frame) {
        let [body, status] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());

        if self.controller.is_split() {
            let [top, bottom] =
                Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(body);
            self.draw_pane(frame, top, true);
            self.draw_pane(frame, bottom, false);
        } else {
            self.draw_pane(frame, body, true);
        }

        self.draw_status(frame, status);
    }

    fn draw_pane(&self, frame: &mut Frame, area: Rect, is_primary: bool) {
        let pane = if is_primary {
            self.controller.primary()
        } else {
            self.controller.secondary()
        };

        let title = if is_primary {
            format!(" {} [{}] ", self.controller.reference(), pane.snapshot().version_id)
        } else {
            format!(" [{}] ", pane.snapshot().version_id)
        };
        let block = Block::default().borders(Borders::ALL).title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if let Some(message) = pane.empty_message() {
            let message = message.to_string();
            frame.render_widget(
                Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
                inner,
            );
            return;
        }

        let width = inner.width.max(10) as usize;
        let (lines, scroll) = pane_lines(pane, width);
        frame.render_widget(Paragraph::new(lines).scroll((scroll, 0)), inner);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let text = match &self.input_mode {
            InputMode::Goto(input) => format!("Go to: {input}"),
            InputMode::Normal => match &self.message {
                Some(message) => message.clone(),
                None => {
                    "arrows: navigate  space: select  g: goto  s: close split  c: copy  b: bookmark  q: quit"
                        .to_string()
                }
            },
        };
        frame.render_widget(
            Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }

    fn handle_key(&mut self, key: KeyEvent) {
        self.message = None;

        if let InputMode::Goto(input) = &mut self.input_mode {
            match key.code {
                KeyCode::Enter => {
                    let reference = input.clone();
                    self.input_mode = InputMode::Normal;
                    self.jump_to(&reference);
                }
                KeyCode::Esc => self.input_mode = InputMode::Normal,
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char(c) => input.push(c),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Left => {
                self.controller.step_chapter(Direction::Previous);
            }
            KeyCode::Right => {
                self.controller.step_chapter(Direction::Next);
            }
            KeyCode::Up => {
                if self.controller.verse_up() == PressResult::Left {
                    self.controller.step_chapter(Direction::Previous);
                }
            }
            KeyCode::Down => {
                if self.controller.verse_down() == PressResult::Right {
                    self.controller.step_chapter(Direction::Next);
                }
            }
            KeyCode::Char(' ') => {
                let verse_1 = self.controller.primary().scroll_verse();
                self.controller.toggle_check_primary(verse_1);
            }
            KeyCode::Esc => self.controller.uncheck_all_verses(),
            KeyCode::Char('g') => self.input_mode = InputMode::Goto(String::new()),
            KeyCode::Char('c') => self.copy_selection(),
            KeyCode::Char('b') => self.add_bookmark(),
            KeyCode::Char('s') => self.controller.detach_split(),
            _ => {}
        }
    }

    fn jump_to(&mut self, reference: &str) {
        match self.controller.jump_to(reference) {
            Ok(ari) if ari.is_zero() => {}
            Ok(ari) => {
                if let Err(err) = self.store.add_history(ari) {
                    logging::error(format!("cannot record history: {err}"));
                }
            }
            Err(err) => self.message = Some(err.to_string()),
        }
    }

    fn copy_selection(&mut self) {
        let selected = self.controller.primary().checked_verses();
        if selected.is_empty() {
            self.message = Some("No verses selected".to_string());
            return;
        }

        let book = self.controller.active_book();
        let chapter_1 = self.controller.navigation().chapter_1;
        let reference = book.reference_verses(chapter_1, &selected);
        let short_name = self.controller.session().version.short_name().map(str::to_string);

        let (mut copy_text, submit_text) = prepare_text_for_copy_share(
            &reference,
            short_name.as_deref(),
            self.controller.primary().snapshot(),
            &selected,
            &self.config.settings,
        );

        if self.controller.is_split() && !self.controller.secondary().snapshot().is_empty() {
            append_split_text_for_copy_share(
                &mut copy_text,
                &reference,
                None,
                self.controller.secondary().snapshot(),
                &self.controller.secondary().checked_verses(),
                &self.config.settings,
            );
        }

        match Clipboard::new().and_then(|mut cb| cb.set_text(copy_text)) {
            Ok(()) => self.message = Some(format!("Copied {reference}")),
            Err(err) => self.message = Some(format!("Clipboard error: {err}")),
        }

        if self.config.settings.share_url_enabled {
            let request = ShareUrlRequest {
                verse_text: &submit_text,
                ari_bc: self.controller.navigation().ari_bc(),
                selected_verses_1: &selected,
                reference: &reference,
                version_short_name: short_name.as_deref(),
                version_long_name: self.controller.session().version.long_name(),
            };
            match share::make_share_url(&self.config.settings.share_url_endpoint, &request) {
                Ok(url) => self.message = Some(format!("Copied {reference}: {url}")),
                Err(err) => logging::warn(format!("share url failed: {err}")),
            }
        }
    }

    fn add_bookmark(&mut self) {
        let verse_1 = self.controller.primary().scroll_verse();
        let ari = self.controller.current_ari();
        let caption = self
            .controller
            .active_book()
            .reference_verse(self.controller.navigation().chapter_1, verse_1);

        match self.store.insert_marker(MarkerKind::Bookmark, ari, &caption, None) {
            Ok(_) => {
                self.controller.reload_annotation_maps();
                self.message = Some(format!("Bookmarked {caption}"));
            }
            Err(err) => self.message = Some(format!("Bookmark error: {err}")),
        }
    }
}

/// Render a pane into styled lines and compute the scroll offset that puts
/// the current verse at the top.
fn pane_lines(pane: &PaneState, width: usize) -> (Vec<Line<'static>>, u16) {
    let snapshot = pane.snapshot();
    let mut lines: Vec<Line> = Vec::new();
    let mut scroll_row = 0u16;

    for (verse_0, text) in snapshot.chapter.verses.iter().enumerate() {
        let verse_1 = verse_0 as i32 + 1;

        for (ari, block) in &snapshot.pericopes {
            if ari.verse() as i32 == verse_1 {
                lines.push(Line::from(Span::styled(
                    block.caption.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
        }

        if verse_1 == pane.scroll_verse() {
            scroll_row = lines.len() as u16;
        }

        let mut style = Style::default();
        if pane.is_checked(verse_1) {
            style = style.bg(Color::Blue).fg(Color::White);
        } else if let Some(info) = snapshot.annotations.get(&verse_1) {
            if info.highlight_color.is_some() {
                style = style.bg(Color::Yellow).fg(Color::Black);
            }
        }

        let mut prefix = format!("{verse_1} ");
        if let Some(info) = snapshot.annotations.get(&verse_1) {
            if info.bookmark_count > 0 {
                prefix.push_str("* ");
            }
            if info.has_note {
                prefix.push_str("+ ");
            }
            if !info.pins.is_empty() {
                prefix.push_str("> ");
            }
        }

        let plain = remove_special_codes(text);
        let indent = " ".repeat(prefix.len());
        let wrapped = textwrap::wrap(
            &plain,
            textwrap::Options::new(width)
                .initial_indent(&prefix)
                .subsequent_indent(&indent),
        );
        for piece in wrapped {
            lines.push(Line::from(Span::styled(piece.into_owned(), style)));
        }
    }

    (lines, scroll_row)
}
