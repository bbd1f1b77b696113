use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::{debug, info, warn};

use crate::config::{named_key, Config, UiColors};
use crate::contact::Contact;
use crate::dialer::Dialer;
use crate::filter;
use crate::loader::{LoadOutcome, Loader};
use crate::prefs::SearchState;

use super::draw;
use super::list::ContactListView;
use super::search::SearchBox;

const PAGE_SIZE: isize = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded { count: usize },
    Failed { message: String },
}

pub struct App<'a> {
    config: &'a Config,
    search_state: &'a SearchState,
    dialer: &'a dyn Dialer,
    loader: Option<Loader>,
    /// Last successfully fetched list, replaced wholesale.
    all_contacts: Option<Vec<Contact>>,
    pub search: SearchBox,
    pub view: ContactListView,
    pub load_state: LoadState,
    pub status: Option<String>,
    pub show_help: bool,
}

impl<'a> App<'a> {
    /// Build the screen, seeding the search box from the persisted query.
    pub fn new(
        config: &'a Config,
        search_state: &'a SearchState,
        dialer: &'a dyn Dialer,
    ) -> Result<Self> {
        let query = match search_state.load() {
            Ok(query) => query,
            Err(err) => {
                warn!(error = %err, "could not read saved search filter");
                String::new()
            }
        };

        let mut app = Self {
            config,
            search_state,
            dialer,
            loader: None,
            all_contacts: None,
            search: SearchBox::new(&query),
            view: ContactListView::new(),
            load_state: LoadState::Idle,
            status: None,
            show_help: false,
        };
        app.refresh_contacts();
        Ok(app)
    }

    /// Hand the app the session's single fetch.
    pub fn attach_loader(&mut self, loader: Loader) {
        self.loader = Some(loader);
        self.load_state = LoadState::Loading;
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            draw::render(terminal, self)?;

            // Drain every queued input event before looking at the fetch
            // result so it lands after them.
            let mut timeout = POLL_INTERVAL;
            while event::poll(timeout)? {
                timeout = Duration::ZERO;
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        return Ok(());
                    }
                }
            }

            self.poll_loader();
        }
    }

    pub fn poll_loader(&mut self) {
        let Some(outcome) = self.loader.as_mut().and_then(|loader| loader.poll()) else {
            return;
        };
        self.loader = None;
        self.apply_load_outcome(outcome);
    }

    pub fn apply_load_outcome(&mut self, outcome: LoadOutcome) {
        match outcome {
            Ok(contacts) => {
                info!(count = contacts.len(), "contact list loaded");
                self.load_state = LoadState::Loaded {
                    count: contacts.len(),
                };
                self.all_contacts = Some(contacts);
                self.refresh_contacts();
            }
            Err(err) => {
                self.load_state = LoadState::Failed {
                    message: err.to_string(),
                };
                self.set_status("Could not load contacts (see log)");
            }
        }
    }

    /// Re-render `filter(all_contacts, query)`.
    fn refresh_contacts(&mut self) {
        let shown = match &self.all_contacts {
            Some(all) => filter::filter(all, self.search.value()).into_owned(),
            None => Vec::new(),
        };
        let diff = self.view.submit(shown);
        if diff.is_empty() {
            return;
        }
        debug!(
            inserted = diff.inserted(),
            removed = diff.removed(),
            moved = diff.moved(),
            updated = diff.updated(),
            rows_built = self.view.rows_built(),
            "list updated"
        );
    }

    fn on_query_changed(&mut self) {
        let query = self.search.value().to_string();
        debug!("Searching for: {}", query);
        self.refresh_contacts();
        if let Err(err) = self.search_state.save(&query) {
            warn!(error = %err, "could not save search filter");
            self.set_status(format!("Could not save search: {}", err));
        }
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        // Ctrl+C always quits (hardcoded for safety)
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Ok(true);
        }

        let config = self.config;
        let keys = &config.keys;

        if self.show_help {
            if self.key_matches_any(&key, &keys.global.quit)
                || self.key_matches_any(&key, &keys.global.help)
                || matches!(key.code, KeyCode::Enter)
            {
                self.show_help = false;
            }
            return Ok(false);
        }

        if self.key_matches_any(&key, &keys.global.quit) {
            return Ok(true);
        }
        if self.key_matches_any(&key, &keys.global.help) {
            self.show_help = true;
            return Ok(false);
        }

        let list = &keys.list;
        if self.key_matches_any(&key, &list.dial) {
            self.dial_selected();
        } else if self.key_matches_any(&key, &list.next) {
            self.view.move_selection(1);
        } else if self.key_matches_any(&key, &list.prev) {
            self.view.move_selection(-1);
        } else if self.key_matches_any(&key, &list.page_down) {
            self.view.move_selection(PAGE_SIZE);
        } else if self.key_matches_any(&key, &list.page_up) {
            self.view.move_selection(-PAGE_SIZE);
        } else if self.key_matches_any(&key, &list.first) {
            self.view.select_first();
        } else if self.key_matches_any(&key, &list.last) {
            self.view.select_last();
        } else if self.search.handle_key_event(key) {
            self.on_query_changed();
        }

        Ok(false)
    }

    pub fn dial_selected(&mut self) {
        let Some(request) = self.view.tap_selected() else {
            self.set_status("Nothing to dial");
            return;
        };
        self.dial(&request.phone);
    }

    fn dial(&mut self, phone: &str) {
        match self.dialer.dial(phone) {
            Ok(()) => self.set_status(format!("Dialing {}", phone)),
            Err(err) => self.set_status(format!("Dial failed: {}", err)),
        }
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    pub fn source_url(&self) -> &str {
        &self.config.source.url
    }

    pub fn total_contacts(&self) -> usize {
        self.all_contacts.as_ref().map(Vec::len).unwrap_or(0)
    }

    pub fn help_entries(&self) -> Vec<(&'static str, String)> {
        let keys = &self.config.keys;
        vec![
            ("Quit", keys.global.quit.join(", ")),
            ("Help", keys.global.help.join(", ")),
            ("Dial selected", keys.list.dial.join(", ")),
            ("Next", keys.list.next.join(", ")),
            ("Previous", keys.list.prev.join(", ")),
            ("Page down", keys.list.page_down.join(", ")),
            ("Page up", keys.list.page_up.join(", ")),
            ("First", keys.list.first.join(", ")),
            ("Last", keys.list.last.join(", ")),
        ]
    }

    /// Check if the key event matches any of the bindings in the list
    fn key_matches_any(&self, event: &KeyEvent, bindings: &[String]) -> bool {
        bindings.iter().any(|b| key_matches_single(event, b))
    }
}

/// Check if the key event matches a single binding string
fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    // Disallow Ctrl/Alt/Super modifiers (we don't support them)
    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    named_key(binding).is_some_and(|code| code == event.code)
}
