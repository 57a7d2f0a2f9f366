// src/progress.rs
/// Progress reporting for long passes over a list of games.
/// Front ends implement this to surface status; every method is optional.
pub trait Progress {
    /// Called at the start with the number of games in the pass.
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One game finished successfully (scraped, copied or already present).
    fn item_done(&mut self, _game: &str) {}

    /// One game failed and went to the ledger.
    fn item_failed(&mut self, _game: &str, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}
