//! Prompt detection rules.
//!
//! Host integrations translate UI events into [`DocumentEvent`]s and ask
//! [`DetectionRules::evaluate`] whether the event looks like an AI prompt
//! being submitted. Debouncing input changes is left to the caller, which
//! should wait [`DetectionRules::input_debounce`] after the last change.

use std::time::Duration;

use crate::domain::SourceTag;

/// Kind of element an input change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputElement {
    /// Multi-line text area.
    TextArea,
    /// Single-line text input.
    TextInput,
    /// Anything else (checkbox, select, ...).
    Other,
}

/// A UI event observed by the host integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// A form was submitted.
    FormSubmit {
        /// Text of the form's text area, or else its first text input.
        field_text: String,
    },
    /// A button was clicked.
    ButtonClick {
        /// Visible button label.
        label: String,
        /// Text of the enclosing form's prompt field, if the button is in a form.
        form_text: Option<String>,
    },
    /// A text field changed.
    InputChange {
        /// Element that changed.
        element: InputElement,
        /// New value.
        value: String,
    },
}

/// A prompt recognized from a [`DocumentEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Which rule matched.
    pub source: SourceTag,
    /// Prompt text to track.
    pub prompt: String,
}

/// Thresholds and patterns that decide what counts as a prompt.
#[derive(Debug, Clone)]
pub struct DetectionRules {
    /// Submitted forms need strictly more characters than this.
    pub min_form_text: usize,
    /// Case-insensitive label keywords of prompt-submitting buttons.
    pub button_keywords: Vec<String>,
    /// Changed text fields need strictly more characters than this.
    pub min_input_text: usize,
    /// Quiet period after the last input change before it is evaluated.
    pub input_debounce: Duration,
    /// CSS selectors of likely AI prompt boxes, for auto-attaching a widget.
    pub auto_attach_selectors: Vec<String>,
}

impl Default for DetectionRules {
    fn default() -> Self {
        Self {
            min_form_text: 10,
            button_keywords: ["generate", "ask", "send", "submit"]
                .map(String::from)
                .to_vec(),
            min_input_text: 50,
            input_debounce: Duration::from_secs(2),
            auto_attach_selectors: [
                r#"textarea[placeholder*="prompt"]"#,
                r#"textarea[placeholder*="message"]"#,
                r#"textarea[placeholder*="ask"]"#,
                r#"input[placeholder*="prompt"]"#,
                r#"input[placeholder*="message"]"#,
                r#"input[placeholder*="ask"]"#,
                ".chat-input textarea",
                ".prompt-input textarea",
                ".ai-input textarea",
            ]
            .map(String::from)
            .to_vec(),
        }
    }
}

impl DetectionRules {
    /// Returns the detected prompt, or `None` if no rule matches.
    #[must_use]
    pub fn evaluate(&self, event: &DocumentEvent) -> Option<Detection> {
        match event {
            DocumentEvent::FormSubmit { field_text } => {
                long_enough(field_text, self.min_form_text)
                    .then(|| detection(SourceTag::FormSubmission, field_text))
            }
            DocumentEvent::ButtonClick { label, form_text } => {
                let text = form_text.as_deref()?;
                (self.is_prompt_button(label) && long_enough(text, self.min_form_text))
                    .then(|| detection(SourceTag::ButtonClick, text))
            }
            DocumentEvent::InputChange { element, value } => {
                let is_text = matches!(element, InputElement::TextArea | InputElement::TextInput);
                (is_text && long_enough(value, self.min_input_text))
                    .then(|| detection(SourceTag::InputChange, value))
            }
        }
    }

    /// Returns `true` if `label` contains one of the button keywords.
    #[must_use]
    pub fn is_prompt_button(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        self.button_keywords
            .iter()
            .any(|keyword| label.contains(&keyword.to_lowercase()))
    }

    /// Joins [`DetectionRules::auto_attach_selectors`] into one selector list.
    #[must_use]
    pub fn selector_query(&self) -> String {
        self.auto_attach_selectors.join(", ")
    }
}

fn long_enough(text: &str, min: usize) -> bool {
    text.trim().chars().count() > min
}

fn detection(source: SourceTag, text: &str) -> Detection {
    Detection {
        source,
        prompt: text.trim().to_string(),
    }
}
