//! Local slash directives.

/// Prefix that marks input as a local directive.
pub const DIRECTIVE_PREFIX: char = '/';

/// Directives interpreted locally; none of them reach a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// Empty the transcript.
    Clear,
    /// List the available directives.
    Help,
    /// Log a one-shot resource report.
    Status,
    /// Flip usage chart visibility.
    ToggleGraph,
    /// Flip the unrestricted response mode.
    ModelTube,
}

/// Exact-match lookup table, in the order `/help` lists it.
const DIRECTIVES: &[(&str, Directive)] = &[
    ("/clear", Directive::Clear),
    ("/help", Directive::Help),
    ("/status", Directive::Status),
    ("/togglegraph", Directive::ToggleGraph),
    ("/modeltube", Directive::ModelTube),
];

impl Directive {
    /// Look up a directive after trimming and lower-casing `raw`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        DIRECTIVES
            .iter()
            .find(|(name, _)| *name == normalized)
            .map(|(_, directive)| *directive)
    }

    pub fn name(self) -> &'static str {
        DIRECTIVES
            .iter()
            .find(|(_, directive)| *directive == self)
            .map(|(name, _)| *name)
            .unwrap_or_default()
    }
}

/// Canonical form used for lookup and for "unknown command" reports.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Text logged by `/help`.
pub fn help_text() -> String {
    let names: Vec<&str> = DIRECTIVES.iter().map(|(name, _)| *name).collect();
    format!("Commands available: {}", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        assert_eq!(Directive::parse("  /HELP "), Some(Directive::Help));
        assert_eq!(Directive::parse("/TogGleGraph"), Some(Directive::ToggleGraph));
        assert_eq!(Directive::parse("/help me"), None);
        assert_eq!(Directive::parse("/"), None);
    }

    #[test]
    fn help_lists_every_directive() {
        assert_eq!(
            help_text(),
            "Commands available: /clear, /help, /status, /togglegraph, /modeltube"
        );
    }

    #[test]
    fn names_round_trip() {
        for (name, directive) in DIRECTIVES {
            assert_eq!(directive.name(), *name);
        }
    }
}
