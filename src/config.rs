//! Configuration options for building a [`Model`][crate::Model].

/// What to do when a feeder, DT or meter id shows up a second time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DuplicatePolicy {
    /// The later row replaces the earlier one in the lookup index.  The
    /// earlier entity stays wherever it was already linked in the tree.
    #[default]
    Overwrite,
    /// The first row wins; later rows with the same id are skipped entirely
    /// (they are still counted in the SLA totals).
    KeepFirst,
}

/// Configuration options for the hierarchy builder.
#[derive(Clone, Copy, Default, Debug)]
pub struct BuildConfig {
    pub duplicate_ids: DuplicatePolicy,
}
