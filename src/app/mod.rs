use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use strum::{Display, EnumIter, IntoEnumIterator};
use unicode_segmentation::UnicodeSegmentation;

use crate::archive::{ArchiveController, ArchiveView};
use crate::dom::Document;
use crate::ui;

/// The archive control that receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Control {
    Year,
    Search,
    Pages,
}

/// Terminal front end over a mounted archive.
pub struct App {
    doc: Document,
    archive: ArchiveController,
    view: ArchiveView,
    focus: Control,
    scroll: u16,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(doc: Document, archive: ArchiveController) -> Self {
        let view = archive.view(&doc);
        Self {
            doc,
            archive,
            view,
            focus: Control::Search,
            scroll: 0,
            should_quit: false,
            tick_rate: Duration::from_millis(40),
        }
    }

    pub fn view(&self) -> &ArchiveView {
        &self.view
    }

    pub fn focus(&self) -> Control {
        self.focus
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn search_pending(&self) -> bool {
        self.archive.search_pending()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            terminal
                .draw(|frame| ui::draw_app(frame, self))
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key(key, Instant::now());
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    pub fn on_tick(&mut self, now: Instant) {
        if self.archive.poll(&mut self.doc, now) {
            self.refresh_view();
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Tab => {
                self.cycle_focus(1);
                return;
            }
            KeyCode::BackTab => {
                self.cycle_focus(-1);
                return;
            }
            KeyCode::PageDown => {
                self.next_page();
                return;
            }
            KeyCode::PageUp => {
                self.prev_page();
                return;
            }
            _ => {}
        }

        match self.focus {
            Control::Search => self.handle_search_key(key, now),
            Control::Year => self.handle_year_key(key),
            Control::Pages => self.handle_pages_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent, now: Instant) {
        let mut term = self.view.term.clone();
        match key.code {
            KeyCode::Esc => {
                if term.is_empty() {
                    self.should_quit = true;
                    return;
                }
                term.clear();
            }
            KeyCode::Enter => {
                if self.archive.flush_search(&mut self.doc) {
                    self.refresh_view();
                }
                return;
            }
            KeyCode::Backspace => {
                let Some((idx, _)) = term.grapheme_indices(true).next_back() else {
                    return;
                };
                term.truncate(idx);
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                term.push(ch);
            }
            _ => return,
        }
        self.archive.input_search(&mut self.doc, &term, now);
        self.refresh_view();
    }

    fn handle_year_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Up | KeyCode::Char('h') | KeyCode::Char('k') => {
                self.step_year(-1)
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Char('l') | KeyCode::Char('j') => {
                self.step_year(1)
            }
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn handle_pages_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => self.prev_page(),
            KeyCode::Right | KeyCode::Char('l') => self.next_page(),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Home => self.scroll = 0,
            KeyCode::Esc | KeyCode::Char('q') => self.should_quit = true,
            _ => {}
        }
    }

    fn cycle_focus(&mut self, delta: isize) {
        let controls: Vec<Control> = Control::iter().collect();
        let current = controls
            .iter()
            .position(|control| *control == self.focus)
            .unwrap_or(0) as isize;
        let len = controls.len() as isize;
        self.focus = controls[(current + delta).rem_euclid(len) as usize];
    }

    fn step_year(&mut self, delta: isize) {
        let options = &self.view.year_options;
        if options.is_empty() {
            return;
        }
        let current = options
            .iter()
            .position(|option| option.value == self.view.year)
            .unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, options.len() as isize - 1) as usize;
        if next as isize == current {
            return;
        }
        let year = options[next].value.clone();
        self.archive.select_year(&mut self.doc, &year);
        self.refresh_view();
    }

    fn next_page(&mut self) {
        if self.archive.next_page(&mut self.doc) {
            self.refresh_view();
        }
    }

    fn prev_page(&mut self) {
        if self.archive.prev_page(&mut self.doc) {
            self.refresh_view();
        }
    }

    fn refresh_view(&mut self) {
        self.view = self.archive.view(&self.doc);
        self.scroll = 0;
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
