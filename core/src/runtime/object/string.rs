/// Strings up to this many bytes are short (interned) strings.
pub const MAX_SHORT_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuaString {
    contents: String,
}

impl LuaString {
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.contents
    }

    pub fn fits_short(&self) -> bool {
        self.contents.len() <= MAX_SHORT_LEN
    }
}
