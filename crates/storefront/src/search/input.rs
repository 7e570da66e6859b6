//! Search box state machine.
//!
//! [`SearchInput`] holds no clock and performs no I/O. Each [`Event`] updates
//! the state and returns the [`Effect`]s the host must carry out: start a
//! timer, fetch suggestions, emit a search. Timers and fetches report back
//! with the `generation` they were issued for; answers for an older
//! generation are ignored, so a slow response never replaces newer state.

use std::time::Duration;

use super::{AutocompleteSuggestion, MIN_SUGGESTION_QUERY_CHARS};

/// Quiet period before suggestions are fetched.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Grace period after blur so a click on a suggestion still lands.
pub const BLUR_GRACE: Duration = Duration::from_millis(200);

/// How long the box shows the searching state after a submit.
pub const SEARCH_FEEDBACK: Duration = Duration::from_secs(1);

/// Where the search box is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    /// Debounce window open.
    Typing,
    /// Dropdown visible.
    Suggesting,
    /// Submit in flight.
    Searching,
}

/// Something that happened to the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The text changed.
    Input(String),
    /// A [`Effect::StartDebounce`] timer fired.
    DebounceElapsed { generation: u64 },
    /// A [`Effect::FetchSuggestions`] request completed.
    SuggestionsLoaded {
        generation: u64,
        suggestions: Vec<AutocompleteSuggestion>,
    },
    /// Enter pressed.
    Submit,
    /// The [`Effect::FinishSearchAfter`] timer fired.
    SearchFinished,
    Escape,
    /// Focus left the box.
    Blur,
    /// The [`Effect::CloseAfter`] timer fired.
    BlurElapsed,
    Focus,
    ArrowUp,
    ArrowDown,
    SuggestionClicked(usize),
    /// The clear button was pressed.
    Clear,
}

/// Work the host must perform after an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send [`Event::DebounceElapsed`] with `generation` after `after`.
    StartDebounce { generation: u64, after: Duration },
    /// Look up suggestions for `query` and answer with
    /// [`Event::SuggestionsLoaded`] carrying `generation`.
    FetchSuggestions { generation: u64, query: String },
    /// Run a search for the term (empty clears the results).
    EmitSearch(String),
    /// Send [`Event::SearchFinished`] after the duration.
    FinishSearchAfter(Duration),
    /// Send [`Event::BlurElapsed`] after the duration.
    CloseAfter(Duration),
}

/// The search box.
#[derive(Debug, Clone, Default)]
pub struct SearchInput {
    state: State,
    text: String,
    suggestions: Vec<AutocompleteSuggestion>,
    selected: Option<usize>,
    generation: u64,
    focused: bool,
    closing: bool,
}

impl SearchInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Suggestions currently shown; empty unless [`State::Suggesting`].
    #[must_use]
    pub fn suggestions(&self) -> &[AutocompleteSuggestion] {
        if self.state == State::Suggesting {
            &self.suggestions
        } else {
            &[]
        }
    }

    /// Index of the highlighted suggestion.
    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Whether the dropdown is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == State::Suggesting
    }

    /// Apply an event and return the effects to schedule.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Input(text) => self.on_input(text),
            Event::DebounceElapsed { generation } => self.on_debounce(generation),
            Event::SuggestionsLoaded {
                generation,
                suggestions,
            } => {
                self.on_suggestions(generation, suggestions);
                Vec::new()
            }
            Event::Submit => self.submit(),
            Event::SearchFinished => {
                if self.state == State::Searching {
                    self.state = State::Idle;
                }
                Vec::new()
            }
            Event::Escape => {
                self.close();
                Vec::new()
            }
            Event::Blur => {
                self.focused = false;
                self.closing = true;
                vec![Effect::CloseAfter(BLUR_GRACE)]
            }
            Event::BlurElapsed => {
                if self.closing && !self.focused {
                    self.close();
                }
                self.closing = false;
                Vec::new()
            }
            Event::Focus => {
                self.focused = true;
                self.closing = false;
                Vec::new()
            }
            Event::ArrowDown => {
                self.step(true);
                Vec::new()
            }
            Event::ArrowUp => {
                self.step(false);
                Vec::new()
            }
            Event::SuggestionClicked(index) => {
                if self.state != State::Suggesting || index >= self.suggestions.len() {
                    return Vec::new();
                }
                self.selected = Some(index);
                self.submit()
            }
            Event::Clear => {
                self.text.clear();
                self.close();
                vec![Effect::EmitSearch(String::new())]
            }
        }
    }

    fn on_input(&mut self, text: String) -> Vec<Effect> {
        self.text = text;
        self.generation += 1;
        self.selected = None;
        self.state = State::Typing;
        vec![Effect::StartDebounce {
            generation: self.generation,
            after: DEBOUNCE,
        }]
    }

    fn on_debounce(&mut self, generation: u64) -> Vec<Effect> {
        if generation != self.generation || self.state != State::Typing {
            return Vec::new();
        }
        if self.text.trim().chars().count() < MIN_SUGGESTION_QUERY_CHARS {
            self.close();
            return Vec::new();
        }
        vec![Effect::FetchSuggestions {
            generation,
            query: self.text.clone(),
        }]
    }

    fn on_suggestions(&mut self, generation: u64, suggestions: Vec<AutocompleteSuggestion>) {
        if generation != self.generation || self.state != State::Typing {
            return;
        }
        self.selected = None;
        if suggestions.is_empty() {
            self.suggestions.clear();
            self.state = State::Idle;
        } else {
            self.suggestions = suggestions;
            self.state = State::Suggesting;
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        let term = self
            .selected
            .filter(|_| self.state == State::Suggesting)
            .and_then(|index| self.suggestions.get(index))
            .map_or_else(|| self.text.trim().to_string(), |s| s.text.clone());

        if term.is_empty() {
            return Vec::new();
        }

        self.text.clone_from(&term);
        // Late timers and fetches for the submitted text are stale now.
        self.generation += 1;
        self.suggestions.clear();
        self.selected = None;
        self.state = State::Searching;
        vec![
            Effect::EmitSearch(term),
            Effect::FinishSearchAfter(SEARCH_FEEDBACK),
        ]
    }

    fn step(&mut self, forward: bool) {
        let len = self.suggestions.len();
        if self.state != State::Suggesting || len == 0 {
            return;
        }
        self.selected = Some(match (self.selected, forward) {
            (None, true) => 0,
            (None, false) => len - 1,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        });
    }

    fn close(&mut self) {
        self.generation += 1;
        self.suggestions.clear();
        self.selected = None;
        self.state = State::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SuggestionKind;

    fn suggestion(text: &str) -> AutocompleteSuggestion {
        AutocompleteSuggestion {
            id: text.to_string(),
            text: text.to_string(),
            kind: SuggestionKind::Name,
            highlight: None,
        }
    }

    /// Type `text`, let the debounce fire and answer with `results`.
    fn type_and_load(input: &mut SearchInput, text: &str, results: &[&str]) {
        let effects = input.handle(Event::Input(text.to_string()));
        let Some(Effect::StartDebounce { generation, .. }) = effects.first().cloned() else {
            panic!("expected debounce, got {effects:?}");
        };
        let effects = input.handle(Event::DebounceElapsed { generation });
        assert_eq!(
            effects,
            vec![Effect::FetchSuggestions {
                generation,
                query: text.to_string()
            }]
        );
        input.handle(Event::SuggestionsLoaded {
            generation,
            suggestions: results.iter().map(|t| suggestion(t)).collect(),
        });
    }

    #[test]
    fn test_input_starts_debounce() {
        let mut input = SearchInput::new();
        let effects = input.handle(Event::Input("ve".to_string()));
        assert_eq!(input.state(), State::Typing);
        assert_eq!(
            effects,
            vec![Effect::StartDebounce {
                generation: 1,
                after: DEBOUNCE
            }]
        );
    }

    #[test]
    fn test_short_text_goes_idle_without_fetch() {
        let mut input = SearchInput::new();
        input.handle(Event::Input(" v ".to_string()));
        let effects = input.handle(Event::DebounceElapsed { generation: 1 });
        assert!(effects.is_empty());
        assert_eq!(input.state(), State::Idle);
    }

    #[test]
    fn test_suggestions_open_dropdown() {
        let mut input = SearchInput::new();
        type_and_load(&mut input, "vest", &["Vestido Floral", "vestidos"]);
        assert_eq!(input.state(), State::Suggesting);
        assert_eq!(input.suggestions().len(), 2);
        assert_eq!(input.selected(), None);
    }

    #[test]
    fn test_empty_suggestions_go_idle() {
        let mut input = SearchInput::new();
        type_and_load(&mut input, "xyz", &[]);
        assert_eq!(input.state(), State::Idle);
        assert!(!input.is_open());
    }

    #[test]
    fn test_stale_debounce_and_results_ignored() {
        let mut input = SearchInput::new();
        input.handle(Event::Input("sa".to_string()));
        input.handle(Event::Input("saia".to_string()));

        assert!(input.handle(Event::DebounceElapsed { generation: 1 }).is_empty());
        let effects = input.handle(Event::DebounceElapsed { generation: 2 });
        assert_eq!(effects.len(), 1);

        input.handle(Event::SuggestionsLoaded {
            generation: 1,
            suggestions: vec![suggestion("Saias")],
        });
        assert_eq!(input.state(), State::Typing);

        input.handle(Event::SuggestionsLoaded {
            generation: 2,
            suggestions: vec![suggestion("Saia Midi")],
        });
        assert_eq!(input.suggestions()[0].text, "Saia Midi");
    }

    #[test]
    fn test_arrows_wrap_both_ways() {
        let mut input = SearchInput::new();
        type_and_load(&mut input, "bl", &["Blazer", "Blusa", "blusas"]);

        input.handle(Event::ArrowUp);
        assert_eq!(input.selected(), Some(2));
        input.handle(Event::ArrowDown);
        assert_eq!(input.selected(), Some(0));
        input.handle(Event::ArrowUp);
        assert_eq!(input.selected(), Some(2));
        input.handle(Event::ArrowDown);
        input.handle(Event::ArrowDown);
        assert_eq!(input.selected(), Some(1));
    }

    #[test]
    fn test_arrows_ignored_when_closed() {
        let mut input = SearchInput::new();
        input.handle(Event::ArrowDown);
        assert_eq!(input.selected(), None);
    }

    #[test]
    fn test_submit_uses_highlighted_suggestion() {
        let mut input = SearchInput::new();
        type_and_load(&mut input, "bl", &["Blazer", "Blusa"]);
        input.handle(Event::ArrowDown);
        input.handle(Event::ArrowDown);

        let effects = input.handle(Event::Submit);
        assert_eq!(
            effects,
            vec![
                Effect::EmitSearch("Blusa".to_string()),
                Effect::FinishSearchAfter(SEARCH_FEEDBACK)
            ]
        );
        assert_eq!(input.state(), State::Searching);
        assert_eq!(input.text(), "Blusa");

        input.handle(Event::SearchFinished);
        assert_eq!(input.state(), State::Idle);
    }

    #[test]
    fn test_submit_trims_and_ignores_blank() {
        let mut input = SearchInput::new();
        input.handle(Event::Input("   ".to_string()));
        assert!(input.handle(Event::Submit).is_empty());

        input.handle(Event::Input("  saia ".to_string()));
        let effects = input.handle(Event::Submit);
        assert_eq!(effects.first(), Some(&Effect::EmitSearch("saia".to_string())));
    }

    #[test]
    fn test_submit_invalidates_pending_fetch() {
        let mut input = SearchInput::new();
        input.handle(Event::Input("saia".to_string()));
        input.handle(Event::Submit);
        assert!(input.handle(Event::DebounceElapsed { generation: 1 }).is_empty());
        assert_eq!(input.state(), State::Searching);
    }

    #[test]
    fn test_click_selects_and_submits() {
        let mut input = SearchInput::new();
        type_and_load(&mut input, "sa", &["Saia Midi", "saias"]);
        let effects = input.handle(Event::SuggestionClicked(1));
        assert_eq!(effects.first(), Some(&Effect::EmitSearch("saias".to_string())));
        assert!(input.handle(Event::SuggestionClicked(5)).is_empty());
    }

    #[test]
    fn test_escape_closes() {
        let mut input = SearchInput::new();
        type_and_load(&mut input, "sa", &["Saia Midi"]);
        input.handle(Event::Escape);
        assert_eq!(input.state(), State::Idle);
        assert!(input.suggestions().is_empty());
    }

    #[test]
    fn test_escape_while_searching_goes_idle() {
        let mut input = SearchInput::new();
        input.handle(Event::Input("saia".to_string()));
        input.handle(Event::Submit);
        assert_eq!(input.state(), State::Searching);

        input.handle(Event::Escape);
        assert_eq!(input.state(), State::Idle);

        // The feedback timer still fires; it must not disturb a new search.
        input.handle(Event::Input("blusa".to_string()));
        input.handle(Event::SearchFinished);
        assert_eq!(input.state(), State::Typing);
    }

    #[test]
    fn test_blur_closes_after_grace_unless_refocused() {
        let mut input = SearchInput::new();
        type_and_load(&mut input, "sa", &["Saia Midi"]);

        assert_eq!(input.handle(Event::Blur), vec![Effect::CloseAfter(BLUR_GRACE)]);
        input.handle(Event::Focus);
        input.handle(Event::BlurElapsed);
        assert_eq!(input.state(), State::Suggesting);

        input.handle(Event::Blur);
        input.handle(Event::BlurElapsed);
        assert_eq!(input.state(), State::Idle);
    }

    #[test]
    fn test_clear_emits_empty_search() {
        let mut input = SearchInput::new();
        type_and_load(&mut input, "sa", &["Saia Midi"]);
        let effects = input.handle(Event::Clear);
        assert_eq!(effects, vec![Effect::EmitSearch(String::new())]);
        assert_eq!(input.text(), "");
        assert_eq!(input.state(), State::Idle);
    }
}
