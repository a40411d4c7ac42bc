/// Function the bootstrap transfers control to.
pub const DEFAULT_ENTRY_POINT: &str = "Sys.init";
/// RAM address the stack starts at.
pub const STACK_ORIGIN: u16 = 256;

#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    /// Emit the `SP = 256; call entry 0` prologue.
    pub bootstrap: bool,
    /// Keep `//` annotations in the output.
    pub comments: bool,
    pub entry_point: String,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        TranslatorConfig {
            bootstrap: true,
            comments: true,
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
        }
    }
}
