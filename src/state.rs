//! Process-wide line state shared between the poller and readers.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::headway::{LineState, Snapshot, TieredView, classify_lines};

/// Handle to the latest direction estimates of every line seen so far.
///
/// Clones share the same underlying map. Entries are only ever installed or
/// replaced one whole line at a time through [`SharedState::merge`]; nothing
/// removes a line once it has been reported.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    lines: Arc<RwLock<BTreeMap<String, LineState>>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs every line of `snapshot`, replacing what was stored for those
    /// lines. Lines not in `snapshot` are left untouched.
    ///
    /// Merges are applied in the order they arrive, so a slow cycle can still
    /// overwrite a line with older data than what is already stored.
    ///
    /// Returns the number of lines written.
    pub async fn merge(&self, snapshot: Snapshot) -> usize {
        if snapshot.is_empty() {
            return 0;
        }

        let mut lines = self.lines.write().await;
        let mut written = 0;
        for (line, state) in snapshot {
            if state.is_empty() {
                continue;
            }
            lines.insert(line, state);
            written += 1;
        }
        written
    }

    /// Copy of the current line map.
    pub async fn lines(&self) -> BTreeMap<String, LineState> {
        self.lines.read().await.clone()
    }

    /// State of a single line, if it has been reported.
    pub async fn line(&self, line: &str) -> Option<LineState> {
        self.lines.read().await.get(line).cloned()
    }

    /// Current lines grouped by service tier.
    pub async fn tiered(&self) -> TieredView {
        classify_lines(self.lines.read().await.iter())
    }

    pub async fn len(&self) -> usize {
        self.lines.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lines.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headway::{Direction, ServiceTier};

    fn snapshot(entries: &[(&str, &[(Direction, u32)])]) -> Snapshot {
        entries
            .iter()
            .map(|(line, dirs)| (line.to_string(), dirs.iter().copied().collect()))
            .collect()
    }

    #[tokio::test]
    async fn test_starts_empty() {
        let state = SharedState::new();
        assert!(state.is_empty().await);
        assert!(state.tiered().await.is_empty());
    }

    #[tokio::test]
    async fn test_merge_leaves_other_lines_untouched() {
        let state = SharedState::new();
        state
            .merge(snapshot(&[
                ("A", &[(Direction::North, 4), (Direction::South, 5)]),
                ("C", &[(Direction::North, 10)]),
            ]))
            .await;

        state
            .merge(snapshot(&[("1", &[(Direction::North, 3)])]))
            .await;

        let lines = state.lines().await;
        assert_eq!(lines.len(), 3);
        assert_eq!(lines["A"].get(Direction::South), Some(5));
        assert_eq!(lines["C"].north(), Some(10));
    }

    #[tokio::test]
    async fn test_merge_replaces_whole_line() {
        let state = SharedState::new();
        state
            .merge(snapshot(&[(
                "A",
                &[(Direction::North, 4), (Direction::South, 5)],
            )]))
            .await;
        state
            .merge(snapshot(&[("A", &[(Direction::North, 20)])]))
            .await;

        let a = state.line("A").await.unwrap();
        assert_eq!(a.north(), Some(20));
        assert_eq!(a.get(Direction::South), None);
    }

    #[tokio::test]
    async fn test_empty_merge_is_noop() {
        let state = SharedState::new();
        state
            .merge(snapshot(&[("G", &[(Direction::North, 8)])]))
            .await;
        assert_eq!(state.merge(Snapshot::new()).await, 0);
        assert_eq!(state.len().await, 1);
    }

    #[tokio::test]
    async fn test_tiered_reads_current_state() {
        let state = SharedState::new();
        state
            .merge(snapshot(&[
                ("A", &[(Direction::North, 6)]),
                ("B", &[(Direction::North, 7)]),
                ("SI", &[(Direction::South, 30)]),
            ]))
            .await;

        let view = state.tiered().await;
        assert!(view[&ServiceTier::Rapid].contains_key("A"));
        assert!(view[&ServiceTier::Frequent].contains_key("B"));
        assert!(!view.values().any(|lines| lines.contains_key("SI")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_disjoint_merges() {
        let state = SharedState::new();

        let handles: Vec<_> = ["A", "B", "C", "D", "E", "F"]
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let state = state.clone();
                tokio::spawn(async move {
                    let minutes = i as u32 + 1;
                    state
                        .merge(snapshot(&[(
                            line,
                            &[(Direction::North, minutes), (Direction::South, minutes)],
                        )]))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        let lines = state.lines().await;
        assert_eq!(lines.len(), 6);
        for (i, line) in ["A", "B", "C", "D", "E", "F"].iter().enumerate() {
            assert_eq!(lines[*line].north(), Some(i as u32 + 1));
            assert_eq!(lines[*line].len(), 2);
        }
    }
}
