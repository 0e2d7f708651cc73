//! Monte Carlo Tree Search with UCB1 selection.
//!
//! Each node owns a copy of its position and the statistics `(w, n)` of every
//! evaluation that passed through it, stored from the point of view of the
//! player to move at that node. A parent therefore reads a child's value as
//! `1 - w / n`. Evaluation is recursive: values flow back up the call stack,
//! so nodes need no parent links.
//!
//! Leaves are scored with a single random playout and expanded as soon as
//! they reach the expansion threshold. The search runs until its budget is
//! spent and then plays the most visited root child.

use std::time::{Duration, Instant};

use fastrand::Rng;
use thiserror::Error;
use tracing::{debug, trace};

use crate::constants::{DEFAULT_TIME_BUDGET, EXPAND_THRESHOLD, EXPLORATION};
use crate::playout::playout;
use crate::state::State;

/// Errors that can occur when asking the engine for a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("cannot search a finished game")]
    GameOver,

    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("expansion threshold must be at least 1")]
    ZeroExpandThreshold,
}

/// When to stop searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    /// Wall-clock limit, checked between evaluations.
    Time(Duration),
    /// Fixed number of root evaluations.
    Iterations(usize),
}

/// Configuration for the search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// UCB1 exploration constant.
    pub exploration: f64,
    /// Visits a leaf needs before it gets children. Must be at least 1.
    pub expand_threshold: u32,
    pub budget: Budget,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: EXPLORATION,
            expand_threshold: EXPAND_THRESHOLD,
            budget: Budget::Time(DEFAULT_TIME_BUDGET),
        }
    }
}

impl SearchConfig {
    /// Default settings with a wall-clock budget in milliseconds.
    pub fn with_time_budget(millis: u64) -> Self {
        Self {
            budget: Budget::Time(Duration::from_millis(millis)),
            ..Self::default()
        }
    }

    /// Default settings with a fixed number of evaluations.
    pub fn with_iterations(iterations: usize) -> Self {
        Self {
            budget: Budget::Iterations(iterations),
            ..Self::default()
        }
    }
}

/// Result of a search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Column to play.
    pub column: usize,
    /// Number of root evaluations performed.
    pub iterations: usize,
    /// Visit count of each root child, in legal-move order.
    pub visits: Vec<u32>,
    /// Winrate of the chosen child from the searching player's point of view.
    pub winrate: f64,
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Position at this node
    pub state: State,
    /// Accumulated value for the player to move here
    pub w: f64,
    /// Number of evaluations
    pub n: u32,
    /// One child per legal move, in `legal_moves` order
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(state: &State) -> Self {
        Self {
            state: *state,
            w: 0.0,
            n: 0,
            children: Vec::new(),
        }
    }

    /// Mean value for the player to move at this node, or `None` if unvisited.
    #[inline]
    pub fn winrate(&self) -> Option<f64> {
        (self.n > 0).then(|| self.w / self.n as f64)
    }
}

/// Give `node` one child per legal move.
pub fn expand(node: &mut TreeNode) {
    node.children = node
        .state
        .legal_moves()
        .into_iter()
        .map(|col| {
            let mut child = node.state;
            child.advance(col);
            TreeNode::new(&child)
        })
        .collect();
}

/// UCB1 score of `child` seen from its parent, where `total` is the sum of
/// the visits of all siblings.
#[inline]
fn ucb1(child: &TreeNode, total: f64, exploration: f64) -> f64 {
    let n = child.n as f64;
    1.0 - child.w / n + exploration * (2.0 * total.ln() / n).sqrt()
}

/// Index of the child to descend into.
///
/// Unvisited children come first, in order. Otherwise the highest UCB1 score
/// wins, ties going to the earliest child.
pub fn select_child(node: &TreeNode, exploration: f64) -> usize {
    if let Some(idx) = node.children.iter().position(|c| c.n == 0) {
        return idx;
    }

    let total: f64 = node.children.iter().map(|c| c.n as f64).sum();
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, child) in node.children.iter().enumerate() {
        let score = ucb1(child, total, exploration);
        if score > best_score {
            best = i;
            best_score = score;
        }
    }
    best
}

/// Run one evaluation below `node` and return its value for the player to
/// move at `node`.
pub fn evaluate(node: &mut TreeNode, config: &SearchConfig, rng: &mut Rng) -> f64 {
    if let Some(value) = node.state.outcome().value() {
        node.w += value;
        node.n += 1;
        return value;
    }

    if node.children.is_empty() {
        let mut scratch = node.state;
        let value = playout(&mut scratch, rng);
        node.w += value;
        node.n += 1;
        if node.n == config.expand_threshold {
            expand(node);
        }
        return value;
    }

    let idx = select_child(node, config.exploration);
    let value = 1.0 - evaluate(&mut node.children[idx], config, rng);
    node.w += value;
    node.n += 1;
    value
}

/// Index of the most visited child, ties going to the earliest.
pub fn best_child(node: &TreeNode) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, child) in node.children.iter().enumerate() {
        if best.is_none_or(|(_, n)| child.n > n) {
            best = Some((i, child.n));
        }
    }
    best.map(|(i, _)| i)
}

/// Column of the most visited root child.
pub fn best_move(root: &TreeNode) -> Result<usize, SearchError> {
    let moves = root.state.legal_moves();
    debug_assert_eq!(moves.len(), root.children.len());
    best_child(root)
        .and_then(|idx| moves.get(idx).copied())
        .ok_or(SearchError::NoLegalMoves)
}

/// Wall-clock deadline for a search.
struct TimeKeeper {
    start: Instant,
    limit: Duration,
}

impl TimeKeeper {
    fn new(limit: Duration) -> Self {
        Self {
            start: Instant::now(),
            limit,
        }
    }

    fn is_time_over(&self) -> bool {
        self.start.elapsed() >= self.limit
    }
}

/// Search from an existing root until the budget is spent.
///
/// The root is expanded first if needed, so even an exhausted budget yields a
/// move. An evaluation in flight when the deadline passes is always finished.
pub fn tree_search(
    root: &mut TreeNode,
    config: &SearchConfig,
    rng: &mut Rng,
) -> Result<SearchResult, SearchError> {
    if config.expand_threshold == 0 {
        return Err(SearchError::ZeroExpandThreshold);
    }
    if root.state.is_done() {
        return Err(SearchError::GameOver);
    }
    if root.children.is_empty() {
        expand(root);
    }
    if root.children.is_empty() {
        return Err(SearchError::NoLegalMoves);
    }

    let mut iterations = 0;
    match config.budget {
        Budget::Time(limit) => {
            let keeper = TimeKeeper::new(limit);
            while !keeper.is_time_over() {
                evaluate(root, config, rng);
                iterations += 1;
            }
        }
        Budget::Iterations(count) => {
            for _ in 0..count {
                evaluate(root, config, rng);
            }
            iterations = count;
        }
    }

    let column = best_move(root)?;
    dump_children(root);

    let chosen = best_child(root).map(|idx| &root.children[idx]);
    // Child statistics belong to the opponent.
    let winrate = chosen
        .and_then(TreeNode::winrate)
        .map_or(0.5, |wr| 1.0 - wr);
    debug!(column, iterations, winrate, "search finished");

    Ok(SearchResult {
        column,
        iterations,
        visits: root.children.iter().map(|c| c.n).collect(),
        winrate,
    })
}

/// Build a fresh tree for `state` and search it.
pub fn search(
    state: &State,
    config: &SearchConfig,
    rng: &mut Rng,
) -> Result<SearchResult, SearchError> {
    let mut root = TreeNode::new(state);
    tree_search(&mut root, config, rng)
}

/// Pick a column for the player to move within `time_budget_ms` milliseconds.
pub fn choose_move(state: &State, time_budget_ms: u64) -> Result<usize, SearchError> {
    let mut rng = Rng::new();
    search(state, &SearchConfig::with_time_budget(time_budget_ms), &mut rng).map(|r| r.column)
}

/// Log the statistics of the root's children.
fn dump_children(root: &TreeNode) {
    for (col, child) in root.state.legal_moves().into_iter().zip(&root.children) {
        trace!(
            column = col,
            visits = child.n,
            value = child.winrate().map(|wr| 1.0 - wr),
            "root child"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::W;

    fn play_all(moves: &[usize]) -> State {
        let mut state = State::new();
        for &col in moves {
            state.apply_move(col).unwrap();
        }
        state
    }

    #[test]
    fn test_expand_follows_legal_move_order() {
        let state = play_all(&[2, 2, 2, 2, 2, 2]);
        let mut node = TreeNode::new(&state);
        expand(&mut node);

        let moves = state.legal_moves();
        assert_eq!(node.children.len(), moves.len());
        for (child, &col) in node.children.iter().zip(&moves) {
            let mut expected = state;
            expected.apply_move(col).unwrap();
            assert_eq!(child.state, expected);
            assert_eq!(child.n, 0);
        }
    }

    #[test]
    fn test_every_child_visited_once_before_any_twice() {
        let mut root = TreeNode::new(&State::new());
        expand(&mut root);
        let config = SearchConfig::default();
        let mut rng = Rng::with_seed(5);

        for round in 1..=W {
            evaluate(&mut root, &config, &mut rng);
            let visited = root.children.iter().filter(|c| c.n > 0).count();
            assert_eq!(visited, round);
            assert!(root.children.iter().all(|c| c.n <= 1));
        }
    }

    #[test]
    fn test_leaf_expands_after_first_visit() {
        let mut node = TreeNode::new(&State::new());
        let config = SearchConfig::default();
        let mut rng = Rng::with_seed(9);

        evaluate(&mut node, &config, &mut rng);
        assert_eq!(node.n, 1);
        assert_eq!(node.children.len(), W);
    }

    #[test]
    fn test_higher_threshold_delays_expansion() {
        let mut node = TreeNode::new(&State::new());
        let config = SearchConfig {
            expand_threshold: 3,
            ..SearchConfig::default()
        };
        let mut rng = Rng::with_seed(9);

        evaluate(&mut node, &config, &mut rng);
        evaluate(&mut node, &config, &mut rng);
        assert!(node.children.is_empty());
        evaluate(&mut node, &config, &mut rng);
        assert_eq!(node.children.len(), W);
    }

    #[test]
    fn test_terminal_node_scores_its_outcome() {
        let state = play_all(&[3, 0, 3, 0, 3, 0, 3]);
        let mut node = TreeNode::new(&state);
        let mut rng = Rng::with_seed(1);

        let value = evaluate(&mut node, &SearchConfig::default(), &mut rng);
        assert_eq!(value, 0.0);
        assert_eq!((node.w, node.n), (0.0, 1));
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_parent_accumulates_negated_child_value() {
        // Column 3 completes a vertical four for the player to move.
        let state = play_all(&[3, 0, 3, 0, 3, 0]);
        let mut root = TreeNode::new(&state);
        expand(&mut root);
        let config = SearchConfig::default();
        let mut rng = Rng::with_seed(2);

        for _ in 0..W {
            evaluate(&mut root, &config, &mut rng);
        }
        let winning = &root.children[3];
        assert_eq!((winning.w, winning.n), (0.0, 1));
        assert_eq!(root.n, W as u32);
        let child_sum: f64 = root.children.iter().map(|c| 1.0 - c.w).sum();
        assert!((root.w - child_sum).abs() < 1e-9);
    }

    #[test]
    fn test_select_child_prefers_unvisited() {
        let mut root = TreeNode::new(&State::new());
        expand(&mut root);
        for child in &mut root.children {
            child.n = 4;
            child.w = 2.0;
        }
        root.children[5].n = 0;
        root.children[5].w = 0.0;
        assert_eq!(select_child(&root, EXPLORATION), 5);
    }

    #[test]
    fn test_select_child_prefers_opponent_losses() {
        let mut root = TreeNode::new(&State::new());
        expand(&mut root);
        for child in &mut root.children {
            child.n = 10;
            child.w = 8.0;
        }
        root.children[4].w = 1.0;
        assert_eq!(select_child(&root, EXPLORATION), 4);
    }

    #[test]
    fn test_select_child_ties_go_to_first() {
        let mut root = TreeNode::new(&State::new());
        expand(&mut root);
        for child in &mut root.children {
            child.n = 3;
            child.w = 1.5;
        }
        assert_eq!(select_child(&root, EXPLORATION), 0);
    }

    #[test]
    fn test_best_move_uses_visit_counts() {
        // Column 0 is full, so child index 1 is column 2.
        let state = play_all(&[0, 0, 0, 0, 0, 0]);
        let mut root = TreeNode::new(&state);
        expand(&mut root);
        assert_eq!(root.children.len(), 6);

        for (child, visits) in root.children.iter_mut().zip([3, 10, 2, 0, 0, 0]) {
            child.n = visits;
            // Winrate must not matter.
            child.w = 0.0;
        }
        root.children[0].w = 3.0;
        assert_eq!(best_child(&root), Some(1));
        assert_eq!(best_move(&root), Ok(2));
    }

    #[test]
    fn test_best_move_ties_go_to_first() {
        let mut root = TreeNode::new(&State::new());
        expand(&mut root);
        root.children[2].n = 5;
        root.children[4].n = 5;
        assert_eq!(best_move(&root), Ok(2));
    }

    #[test]
    fn test_search_rejects_finished_game() {
        let state = play_all(&[3, 0, 3, 0, 3, 0, 3]);
        let mut rng = Rng::with_seed(1);
        let result = search(&state, &SearchConfig::with_iterations(10), &mut rng);
        assert_eq!(result.unwrap_err(), SearchError::GameOver);
        assert_eq!(choose_move(&state, 10), Err(SearchError::GameOver));
    }

    #[test]
    fn test_search_rejects_zero_expand_threshold() {
        let config = SearchConfig {
            expand_threshold: 0,
            ..SearchConfig::with_iterations(100)
        };
        let mut root = TreeNode::new(&State::new());
        let mut rng = Rng::with_seed(1);
        let result = tree_search(&mut root, &config, &mut rng);
        assert_eq!(result.unwrap_err(), SearchError::ZeroExpandThreshold);
        assert_eq!(root.n, 0);
    }

    #[test]
    fn test_zero_budget_still_returns_a_move() {
        let mut rng = Rng::with_seed(1);
        let result = search(&State::new(), &SearchConfig::with_iterations(0), &mut rng).unwrap();
        assert_eq!(result.column, 0);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.visits, vec![0; W]);
    }

    #[test]
    fn test_iteration_budget_counts_root_visits() {
        let mut root = TreeNode::new(&State::new());
        let mut rng = Rng::with_seed(4);
        let result = tree_search(&mut root, &SearchConfig::with_iterations(200), &mut rng).unwrap();
        assert_eq!(result.iterations, 200);
        assert_eq!(root.n, 200);
        assert_eq!(result.visits.iter().sum::<u32>(), 200);
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let state = play_all(&[3, 3, 4]);
        let config = SearchConfig::with_iterations(300);
        let a = search(&state, &config, &mut Rng::with_seed(42)).unwrap();
        let b = search(&state, &config, &mut Rng::with_seed(42)).unwrap();
        assert_eq!(a.column, b.column);
        assert_eq!(a.visits, b.visits);
    }

    #[test]
    fn test_search_does_not_touch_caller_state() {
        let state = play_all(&[1, 2, 3]);
        let before = state;
        let mut rng = Rng::with_seed(8);
        search(&state, &SearchConfig::with_iterations(100), &mut rng).unwrap();
        assert_eq!(state, before);
    }
}
