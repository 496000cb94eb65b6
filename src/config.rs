//! Loader configuration.

/// Default text for the loading placeholder.
pub const DEFAULT_LOADING_MESSAGE: &str = "Loading data...";

/// Default text for the error placeholder.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error has occurred...";

/// Configuration for the loader.
///
/// Hosts that want custom placeholder content per failure should implement
/// the message providers on [`crate::host::LoaderHost`] instead; these are
/// the fallbacks used when the host provides nothing.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Text for the default loading placeholder.
    pub loading_message: String,
    /// Text for the default error placeholder.
    pub error_message: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            loading_message: DEFAULT_LOADING_MESSAGE.to_string(),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl LoaderConfig {
    /// Set the default loading placeholder text.
    pub fn with_loading_message(mut self, message: impl Into<String>) -> Self {
        self.loading_message = message.into();
        self
    }

    /// Set the default error placeholder text.
    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }
}
