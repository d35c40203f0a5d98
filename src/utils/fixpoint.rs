#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Progress {
    Changed,
    Stable,
}

/// The primitive itself does not bound the number of rounds: each caller must
/// make sure that a changing round strictly shrinks some finite measure.
pub fn run_to_fixpoint(mut round: impl FnMut(usize) -> Progress) -> usize {
    let mut changed_rounds = 0;
    while round(changed_rounds) == Progress::Changed {
        changed_rounds += 1;
    }
    changed_rounds
}
