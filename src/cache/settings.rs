/// Settings for the cache.
///
/// There is only one setting for now: the maximum number of messages retained
/// per channel, applied oldest-first once a channel's message cache fills up.
#[derive(Clone, Debug)]
pub struct Settings {
    /// The maximum number of messages to store in a channel's message cache.
    pub max_messages: usize,
}

/// Enough history for context commands without keeping every channel's
/// backlog forever.
const DEFAULT_MAX_MESSAGES: usize = 200;

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

impl Settings {
    /// Creates new settings with the defaults applied.
    #[must_use]
    pub fn new() -> Settings {
        Settings::default()
    }

    /// Sets the maximum number of messages to cache per channel.
    pub fn max_messages(&mut self, max: usize) -> &mut Self {
        self.max_messages = max;

        self
    }
}
