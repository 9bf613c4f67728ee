//! Contains the [InputOutputOpt] Trait for where events are read from and where histograms are written to

use std::path::Path;

/// Input/Output option set by a user
pub trait InputOutputOpt {
    /// Input file to read events from, stdin if [None].
    fn input_file(&self) -> Option<&Path>;
    /// Directory the histogram container is written to.
    fn output_dir(&self) -> &Path;
    /// Events between checkpoints, 0 disables periodic checkpoints.
    fn checkpoint_interval(&self) -> u64;
}

impl<T> InputOutputOpt for &T
where
    T: InputOutputOpt,
{
    fn input_file(&self) -> Option<&Path> {
        (*self).input_file()
    }
    fn output_dir(&self) -> &Path {
        (*self).output_dir()
    }
    fn checkpoint_interval(&self) -> u64 {
        (*self).checkpoint_interval()
    }
}

impl<T> InputOutputOpt for std::sync::Arc<T>
where
    T: InputOutputOpt,
{
    fn input_file(&self) -> Option<&Path> {
        (**self).input_file()
    }
    fn output_dir(&self) -> &Path {
        (**self).output_dir()
    }
    fn checkpoint_interval(&self) -> u64 {
        (**self).checkpoint_interval()
    }
}
