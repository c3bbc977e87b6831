/// Aggregated view of an attempt, useful for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptProgress {
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining_secs: u32,
    /// How far through the quiz the cursor is, in whole percent.
    pub percent_through: u32,
}

/// Totals shown above the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogSummary {
    pub quizzes: usize,
    pub questions: usize,
}
