// Data produced by a scan

/// Tally of one batch run.
///
/// `checked + failed` always equals the number of sites submitted, and
/// `matched` never exceeds `checked`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Sites that answered with a page
    pub checked: usize,
    /// Sites that could not be fetched (network error, timeout, non-200)
    pub failed: usize,
    /// Checked sites whose page matched the pattern
    pub matched: usize,
}

impl BatchStats {
    pub fn total(&self) -> usize {
        self.checked + self.failed
    }
}

/// What the Technology Overview page says about a technology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechnologyDetails {
    pub description: String,
    /// Homepage of the technology itself
    pub site: String,
    pub tags: Vec<String>,
    pub image_link: Option<String>,
}

impl TechnologyDetails {
    /// Whether the icon is BuiltWith's blank placeholder. Informational only.
    pub fn is_image_blank(&self) -> bool {
        self.image_link
            .as_deref()
            .and_then(|link| link.rsplit('/').next())
            .is_some_and(|file| file.contains("blank"))
    }
}
