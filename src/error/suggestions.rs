//! Fix suggestions for euk errors.
//!
//! Maps error kinds to copy-paste commands and a short explanation of what
//! went wrong.

// =============================================================================
// Fix Suggestion Types
// =============================================================================

/// A fix suggestion for an error.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    /// Fix commands in order of preference, ready to paste into a terminal.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }
}

// =============================================================================
// Per-error suggestions
// =============================================================================

#[must_use]
pub fn relogin_suggestions() -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec!["euk login <TOKEN>".to_string()],
            "Sesija nije aktivna. Prijavite se ponovo da biste dobili novi token.",
        )
        .with_prevention("Tokeni ističu posle perioda neaktivnosti."),
    ]
}

#[must_use]
pub fn forbidden_suggestions(url: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["euk users list".to_string()],
        format!("Vaša uloga nema pristup: {url}. Zatražite od administratora dodelu rute."),
    )]
}

#[must_use]
pub fn not_found_suggestions(url: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        Vec::new(),
        format!("Backend ne poznaje {url}. Proverite ID ili verziju servera."),
    )]
}

#[must_use]
pub fn rate_limited_suggestions(attempts: u32) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            Vec::new(),
            format!("Server je odbio zahtev posle {attempts} pokušaja zbog ograničenja broja zahteva."),
        )
        .with_prevention("Povećajte `min_interval_ms` u [api] sekciji konfiguracije."),
    ]
}

#[must_use]
pub fn server_error_suggestions(url: &str, status: u16) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["euk license status".to_string()],
        format!("Server je vratio HTTP {status} za {url}. Pokušajte ponovo kasnije."),
    )]
}

#[must_use]
pub fn network_suggestions(url: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec!["euk --api-url http://localhost:8080 license status".to_string()],
            format!("Backend nije dostupan na {url}."),
        )
        .with_prevention("Podesite `base_url` ili `EUK_API_URL` na adresu servera."),
    ]
}

#[must_use]
pub fn invalid_json_suggestions(url: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        Vec::new(),
        format!("Odgovor sa {url} nije ispravan JSON. Moguće je da proxy vraća HTML stranicu."),
    )]
}

#[must_use]
pub fn config_suggestions() -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["euk config".to_string()],
        "Proverite config.toml i EUK_* promenljive okruženja.",
    )]
}
