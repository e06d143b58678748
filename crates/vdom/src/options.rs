/// Reconciler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Register listeners that cannot prevent default as passive.
    pub passive_listeners: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            passive_listeners: true,
        }
    }
}
