/// Decides when the review count warrants a fresh clustering pass.
///
/// The cadence widens as the corpus grows: every 5 reviews below 100, every
/// 10 up to 200, every 15 up to 300, and so on.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateTrigger;

impl UpdateTrigger {
    /// Modulus used at `review_count`: `((n / 100) + 1) * 5`
    pub fn step(review_count: u64) -> u64 {
        ((review_count / 100) + 1) * 5
    }

    /// True when a pass should run with `review_count` reviews recorded.
    /// An empty corpus never fires.
    pub fn should_fire(review_count: u64) -> bool {
        review_count != 0 && review_count % Self::step(review_count) == 0
    }
}
