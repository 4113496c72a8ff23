#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub color: ColorChoice,
    /// Show verbose notifications and the report source.
    pub verbose: bool,
    /// Header label; the report's target web when absent.
    pub target: Option<String>,
}
