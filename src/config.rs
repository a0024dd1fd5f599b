/// Options controlling a parse/evaluate session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Name reported in diagnostics.
    pub file_name: String,

    /// When set, assigning to a name that was never declared is an error instead of an implicit
    /// declaration.
    pub strict_assignment: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            file_name: "<input>".to_owned(),
            strict_assignment: false,
        }
    }
}

impl Config {
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Config {
        self.file_name = file_name.into();
        self
    }

    pub fn with_strict_assignment(mut self, strict: bool) -> Config {
        self.strict_assignment = strict;
        self
    }
}
