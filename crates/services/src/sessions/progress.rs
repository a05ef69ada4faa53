/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    /// Zero-based index of the question on screen.
    pub current: usize,
    pub remaining_secs: u64,
    pub is_complete: bool,
}
