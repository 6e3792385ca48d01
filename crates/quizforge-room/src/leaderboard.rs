//! Standings.

use quizforge_protocol::PlayerScore;

/// Sorts by points descending, ties by player id ascending, and keeps the
/// first `limit` rows.
pub fn rank(
    scores: impl IntoIterator<Item = PlayerScore>,
    limit: usize,
) -> Vec<PlayerScore> {
    let mut scores: Vec<PlayerScore> = scores.into_iter().collect();
    scores.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.id.cmp(&b.id)));
    scores.truncate(limit);
    scores
}

#[cfg(test)]
mod tests {
    use quizforge_protocol::PlayerId;

    use super::*;

    fn row(id: &str, points: u32) -> PlayerScore {
        PlayerScore {
            id: PlayerId::new(id),
            points,
        }
    }

    #[test]
    fn test_rank_orders_by_points_then_id() {
        let ranked = rank(
            [row("carol", 500), row("bob", 900), row("alice", 500)],
            10,
        );
        let ids: Vec<&str> = ranked.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["bob", "alice", "carol"]);
    }

    #[test]
    fn test_rank_truncates() {
        let ranked = rank((0..15).map(|i| row(&format!("p{i:02}"), i * 10)), 10);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].points, 140);
        assert_eq!(ranked[9].points, 50);
    }
}
