//! Backtracking exact-cover solver for quilt boards.
//!
//! Key points:
//! - Candidate placements are precomputed per board cell, so the hot loop only
//!   checks occupancy of a handful of cell indices
//! - Each candidate is anchored at its row-major first square; the search
//!   always fills the first free cell, so no placement can reach back over an
//!   earlier cell
//! - Iterative search over an explicit frame stack (no recursion depth limit)
//! - Free regions smaller than the smallest piece left in stock are pruned
//! - Placement state lives in the search, never in the caller's board

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Instant;

use log::{debug, trace};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::VerifyError;
use crate::geometry::{Position, TransformPolicy, Transformation};
use crate::grid::{coord_to_idx, idx_to_coord, QuiltBoard};
use crate::pieces::Stock;

/// How many search nodes pass between deadline checks.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

/// How the inventory may be consumed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum InventoryUsage {
    /// Each copy is placed at most once; leftovers are fine.
    #[default]
    AtMost,
    /// Every copy must be placed.
    Exact,
}

/// Solver configuration.
///
/// The transformation policy has no default and must always be named.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub policy: TransformPolicy,
    pub usage: InventoryUsage,
    /// Prune branches that leave a free region no remaining piece can fill.
    pub prune_pockets: bool,
    /// Stop searching once this instant has passed.
    pub deadline: Option<Instant>,
    /// Stop searching once this flag is set.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SolverConfig {
    pub fn new(policy: TransformPolicy) -> Self {
        Self {
            policy,
            usage: InventoryUsage::default(),
            prune_pockets: true,
            deadline: None,
            cancel: None,
        }
    }

    pub fn with_usage(mut self, usage: InventoryUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_pruning(mut self, prune_pockets: bool) -> Self {
        self.prune_pockets = prune_pockets;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// One piece placed on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placement {
    /// Index of the piece in the stock slice given to the solver.
    pub piece_id: usize,
    pub transformation: Transformation,
    /// Board column of the transformed shape's upper-left corner.
    pub offset_x: usize,
    /// Board row of the transformed shape's upper-left corner.
    pub offset_y: usize,
    /// Absolute board cells covered, in row-major order.
    pub positions: Vec<Position>,
}

/// An ordered list of placements covering every free cell exactly once.
pub type Solution = Vec<Placement>;

/// Result of a single-solution search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    Solved(Solution),
    /// The search was exhausted without covering the board.
    NoSolution,
    /// The free-cell count cannot be matched by the inventory at all.
    Infeasible,
    /// A deadline or cancellation stopped the search before an answer.
    Interrupted,
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Solved(solution) => Some(solution),
            _ => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, SolveOutcome::Solved(_))
    }
}

/// Result of enumerating solutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    pub solutions: Vec<Solution>,
    /// `false` when a limit or interruption cut the enumeration short.
    pub complete: bool,
}

/// Counters for the most recent search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Scanning steps, one per partial placement examined.
    pub nodes: u64,
    /// Frames popped after exhausting their candidates.
    pub backtracks: u64,
    /// Placements rejected by pocket pruning.
    pub pruned: u64,
    pub solutions: u64,
}

impl SearchStats {
    fn merge(&mut self, other: &SearchStats) {
        self.nodes += other.nodes;
        self.backtracks += other.backtracks;
        self.pruned += other.pruned;
        self.solutions += other.solutions;
    }
}

/// A precomputed placement: one piece orientation at one board offset.
#[derive(Debug)]
struct Candidate {
    piece_id: usize,
    transformation: Transformation,
    origin: Position,
    /// Row-major cell indices covered.
    cells: Box<[usize]>,
}

/// Decides whether a stock of pieces exactly covers the free cells of a board.
#[derive(Debug)]
pub struct PlacementSolver {
    board: QuiltBoard,
    stock: Vec<Stock>,
    config: SolverConfig,
    candidates: Vec<Candidate>,
    /// Candidate ids anchored at each cell, in piece then transformation order.
    by_cell: Vec<Vec<usize>>,
    last_stats: Mutex<SearchStats>,
}

impl PlacementSolver {
    /// Prepares a solver, precomputing every candidate placement.
    ///
    /// The board and stock are copied; the solver never modifies them.
    pub fn new(board: &QuiltBoard, stock: &[Stock], config: SolverConfig) -> Self {
        let (candidates, by_cell) = build_candidates(board, stock, config.policy);
        debug!(
            "prepared {} candidate placements for a {}x{} board with {} free cells",
            candidates.len(),
            board.width(),
            board.height(),
            board.free_cells()
        );

        Self {
            board: board.clone(),
            stock: stock.to_vec(),
            config,
            candidates,
            by_cell,
            last_stats: Mutex::new(SearchStats::default()),
        }
    }

    pub fn board(&self) -> &QuiltBoard {
        &self.board
    }

    pub fn stock(&self) -> &[Stock] {
        &self.stock
    }

    /// Counters from the most recent call to a solve method.
    pub fn stats(&self) -> SearchStats {
        *self.last_stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Finds the first solution in search order.
    pub fn solve(&self) -> SolveOutcome {
        self.record_stats(SearchStats::default());
        if !self.is_feasible() {
            return SolveOutcome::Infeasible;
        }

        let never = || false;
        let mut search = Search::new(self, &never);
        let mut found = Vec::new();
        let end = search.run(None, Some(1), &mut found);
        self.record_stats(search.stats);
        debug!("search finished ({end:?}): {:?}", search.stats);

        match (found.pop(), end) {
            (Some(solution), _) => SolveOutcome::Solved(solution),
            (None, RunEnd::Interrupted) => SolveOutcome::Interrupted,
            (None, _) => SolveOutcome::NoSolution,
        }
    }

    /// Enumerates solutions in search order, stopping after `limit` if given.
    pub fn solve_all(&self, limit: Option<usize>) -> Enumeration {
        self.record_stats(SearchStats::default());
        if !self.is_feasible() {
            return Enumeration {
                solutions: Vec::new(),
                complete: true,
            };
        }
        if limit == Some(0) {
            return Enumeration {
                solutions: Vec::new(),
                complete: false,
            };
        }

        let never = || false;
        let mut search = Search::new(self, &never);
        let mut solutions = Vec::new();
        let end = search.run(None, limit, &mut solutions);
        self.record_stats(search.stats);
        debug!("enumeration finished ({end:?}): {:?}", search.stats);

        Enumeration {
            solutions,
            complete: end == RunEnd::Exhausted,
        }
    }

    /// Finds the first solution using up to `threads` worker threads.
    ///
    /// Work is split on the candidates for the first free cell. Workers take
    /// branches in order and abandon any branch later than the earliest one
    /// already solved, so the answer matches [`PlacementSolver::solve`].
    pub fn solve_parallel(&self, threads: usize) -> SolveOutcome {
        self.record_stats(SearchStats::default());
        if !self.is_feasible() {
            return SolveOutcome::Infeasible;
        }
        let Some(root_cell) = self.board.first_free_from(0) else {
            return SolveOutcome::Solved(Vec::new());
        };
        let branches = self.by_cell[root_cell].len();
        if threads <= 1 || branches <= 1 {
            return self.solve();
        }

        let next_branch = AtomicUsize::new(0);
        let earliest_solved = AtomicUsize::new(usize::MAX);
        let results: Mutex<Vec<Option<BranchResult>>> = Mutex::new(vec![None; branches]);
        let total = Mutex::new(SearchStats::default());

        thread::scope(|scope| {
            for _ in 0..threads.min(branches) {
                scope.spawn(|| loop {
                    let branch = next_branch.fetch_add(1, Ordering::SeqCst);
                    if branch >= branches || earliest_solved.load(Ordering::SeqCst) < branch {
                        break;
                    }

                    let abandon = || earliest_solved.load(Ordering::Relaxed) < branch;
                    let mut search = Search::new(self, &abandon);
                    let mut found = Vec::new();
                    let end = search.run(Some(branch), Some(1), &mut found);
                    trace!("branch {branch} finished ({end:?})");

                    let result = match found.pop() {
                        Some(solution) => {
                            earliest_solved.fetch_min(branch, Ordering::SeqCst);
                            BranchResult::Solved(solution)
                        }
                        None if end == RunEnd::Interrupted => BranchResult::Interrupted,
                        None => BranchResult::Exhausted,
                    };
                    results.lock().unwrap_or_else(PoisonError::into_inner)[branch] = Some(result);
                    total
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .merge(&search.stats);
                });
            }
        });

        let stats = total.into_inner().unwrap_or_else(PoisonError::into_inner);
        self.record_stats(stats);
        debug!("parallel search over {branches} branches finished: {stats:?}");

        let results = results.into_inner().unwrap_or_else(PoisonError::into_inner);
        for result in results {
            match result {
                Some(BranchResult::Exhausted) => continue,
                Some(BranchResult::Solved(solution)) => return SolveOutcome::Solved(solution),
                Some(BranchResult::Interrupted) | None => return SolveOutcome::Interrupted,
            }
        }
        SolveOutcome::NoSolution
    }

    /// Checks the necessary cell-count condition before searching.
    fn is_feasible(&self) -> bool {
        let free = self.board.free_cells();
        let feasible = match self.config.usage {
            InventoryUsage::Exact => total_cells(&self.stock) == free,
            InventoryUsage::AtMost => subset_sum_reachable(
                free,
                self.stock.iter().map(|s| (s.piece.size(), s.count)),
            ),
        };
        if !feasible {
            debug!(
                "{free} free cells cannot be matched by the inventory ({:?})",
                self.config.usage
            );
        }
        feasible
    }

    fn record_stats(&self, stats: SearchStats) {
        *self.last_stats.lock().unwrap_or_else(PoisonError::into_inner) = stats;
    }

    fn to_placement(&self, id: usize) -> Placement {
        let candidate = &self.candidates[id];
        Placement {
            piece_id: candidate.piece_id,
            transformation: candidate.transformation,
            offset_x: candidate.origin.x,
            offset_y: candidate.origin.y,
            positions: candidate
                .cells
                .iter()
                .map(|&cell| idx_to_coord(self.board.width(), cell))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
enum BranchResult {
    Solved(Solution),
    Exhausted,
    Interrupted,
}

/// Builds every candidate placement that fits the initial board.
///
/// For each board cell the candidates are listed in stock order, then in
/// canonical transformation order, which fixes the search order.
fn build_candidates(
    board: &QuiltBoard,
    stock: &[Stock],
    policy: TransformPolicy,
) -> (Vec<Candidate>, Vec<Vec<usize>>) {
    let width = board.width();
    let occupied = board.cells();
    let mut candidates = Vec::new();
    let mut by_cell = vec![Vec::new(); occupied.len()];

    for (piece_id, entry) in stock.iter().enumerate() {
        if entry.count == 0 {
            continue;
        }

        for orientation in entry.piece.orientations(policy) {
            let anchor = orientation.anchor();
            let shape = orientation.dimension;

            for (cell, cell_candidates) in by_cell.iter_mut().enumerate() {
                if occupied[cell] {
                    continue;
                }
                let target = idx_to_coord(width, cell);
                if target.x < anchor.x || target.y < anchor.y {
                    continue;
                }
                let origin = Position::new(target.x - anchor.x, target.y - anchor.y);
                if origin.x + shape.width > board.width() || origin.y + shape.height > board.height() {
                    continue;
                }

                let cells: Box<[usize]> = orientation
                    .squares
                    .iter()
                    .map(|square| {
                        let p = square.translate(origin);
                        coord_to_idx(width, p.x, p.y)
                    })
                    .collect();
                if cells.iter().any(|&c| occupied[c]) {
                    continue;
                }

                cell_candidates.push(candidates.len());
                candidates.push(Candidate {
                    piece_id,
                    transformation: orientation.transformation,
                    origin,
                    cells,
                });
            }
        }
    }

    (candidates, by_cell)
}

/// Squares across the whole inventory, saturating at `usize::MAX`.
fn total_cells(stock: &[Stock]) -> usize {
    stock
        .iter()
        .map(Stock::cells)
        .fold(0, usize::saturating_add)
}

/// Can `target` be written as a sum of item sizes, using each item at most
/// `count` times?
fn subset_sum_reachable<I>(target: usize, items: I) -> bool
where
    I: IntoIterator<Item = (usize, usize)>,
{
    let mut reachable = vec![false; target + 1];
    reachable[0] = true;

    for (size, count) in items {
        if size == 0 {
            continue;
        }
        let copies = count.min(target / size);
        for _ in 0..copies {
            for sum in (size..=target).rev() {
                if reachable[sum - size] {
                    reachable[sum] = true;
                }
            }
        }
    }

    reachable[target]
}

/// States of the depth-first search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchState {
    /// Look for the first free cell at or after `from`.
    Scanning { from: usize },
    /// Try the next candidate of the top frame.
    TryingPlacement,
    /// Drop the top frame and retract the placement below it.
    Backtracking,
    /// Every cell is covered.
    Solved,
    /// No decisions left to revisit.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunEnd {
    Exhausted,
    LimitReached,
    Interrupted,
}

/// One decision point: the cell being filled and the candidates left to try.
#[derive(Debug, Clone, Copy)]
struct Frame {
    cell: usize,
    next: usize,
    end: usize,
    applied: Option<usize>,
}

/// Mutable state of one depth-first search.
struct Search<'s> {
    solver: &'s PlacementSolver,
    abandon: &'s dyn Fn() -> bool,
    occupied: Vec<bool>,
    remaining: Vec<usize>,
    free_cells: usize,
    stock_cells: usize,
    frames: Vec<Frame>,
    stats: SearchStats,
    /// Scratch space for the pocket flood fill.
    region_mark: Vec<u32>,
    region_generation: u32,
    region_queue: Vec<usize>,
}

impl<'s> Search<'s> {
    fn new(solver: &'s PlacementSolver, abandon: &'s dyn Fn() -> bool) -> Self {
        let occupied = solver.board.cells().to_vec();
        Self {
            solver,
            abandon,
            free_cells: solver.board.free_cells(),
            stock_cells: total_cells(&solver.stock),
            remaining: solver.stock.iter().map(|s| s.count).collect(),
            region_mark: vec![0; occupied.len()],
            occupied,
            frames: Vec::new(),
            stats: SearchStats::default(),
            region_generation: 0,
            region_queue: Vec::new(),
        }
    }

    /// Runs the search, pushing solutions into `sink` until `limit` is reached.
    ///
    /// With `root` set, the first decision is restricted to that candidate slot
    /// of the first free cell.
    fn run(&mut self, root: Option<usize>, limit: Option<usize>, sink: &mut Vec<Solution>) -> RunEnd {
        let mut state = SearchState::Scanning { from: 0 };

        loop {
            state = match state {
                SearchState::Scanning { from } => {
                    self.stats.nodes += 1;
                    if self.interrupted() {
                        return RunEnd::Interrupted;
                    }

                    match self.first_free(from) {
                        None => SearchState::Solved,
                        Some(cell) => {
                            let (next, end) = match root {
                                Some(slot) if self.frames.is_empty() => (slot, slot + 1),
                                _ => (0, self.solver.by_cell[cell].len()),
                            };
                            self.frames.push(Frame {
                                cell,
                                next,
                                end: end.min(self.solver.by_cell[cell].len()),
                                applied: None,
                            });
                            SearchState::TryingPlacement
                        }
                    }
                }
                SearchState::TryingPlacement => match self.advance_top() {
                    Some(cell) => SearchState::Scanning { from: cell + 1 },
                    None => SearchState::Backtracking,
                },
                SearchState::Backtracking => {
                    self.frames.pop();
                    self.stats.backtracks += 1;
                    if self.frames.is_empty() {
                        SearchState::Exhausted
                    } else {
                        self.retract_top();
                        SearchState::TryingPlacement
                    }
                }
                SearchState::Solved => {
                    sink.push(self.current_solution());
                    self.stats.solutions += 1;
                    trace!("solution {} at depth {}", self.stats.solutions, self.frames.len());

                    if limit.is_some_and(|limit| sink.len() >= limit) {
                        return RunEnd::LimitReached;
                    }
                    if self.frames.is_empty() {
                        SearchState::Exhausted
                    } else {
                        self.retract_top();
                        SearchState::TryingPlacement
                    }
                }
                SearchState::Exhausted => return RunEnd::Exhausted,
            };
        }
    }

    fn interrupted(&self) -> bool {
        let config = &self.solver.config;
        if config
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return true;
        }
        if (self.abandon)() {
            return true;
        }
        match config.deadline {
            Some(deadline) if self.stats.nodes % DEADLINE_CHECK_INTERVAL == 1 => {
                Instant::now() >= deadline
            }
            _ => false,
        }
    }

    fn first_free(&self, from: usize) -> Option<usize> {
        self.occupied
            .get(from..)?
            .iter()
            .position(|&covered| !covered)
            .map(|offset| from + offset)
    }

    /// Applies the next fitting candidate of the top frame.
    ///
    /// Returns the frame's cell on success, `None` once its candidates run out.
    fn advance_top(&mut self) -> Option<usize> {
        let solver = self.solver;
        let depth = self.frames.len().checked_sub(1)?;
        let cell = self.frames[depth].cell;

        while self.frames[depth].next < self.frames[depth].end {
            let slot = self.frames[depth].next;
            self.frames[depth].next += 1;

            let id = solver.by_cell[cell][slot];
            let candidate = &solver.candidates[id];
            if self.remaining[candidate.piece_id] == 0
                || candidate.cells.iter().any(|&c| self.occupied[c])
            {
                continue;
            }

            self.place(id);
            if solver.config.prune_pockets && self.is_dead_end(cell) {
                self.unplace(id);
                self.stats.pruned += 1;
                continue;
            }

            self.frames[depth].applied = Some(id);
            return Some(cell);
        }

        None
    }

    fn retract_top(&mut self) {
        if let Some(id) = self.frames.last_mut().and_then(|frame| frame.applied.take()) {
            self.unplace(id);
        }
    }

    fn place(&mut self, id: usize) {
        let candidate = &self.solver.candidates[id];
        for &cell in candidate.cells.iter() {
            self.occupied[cell] = true;
        }
        self.remaining[candidate.piece_id] -= 1;
        self.free_cells -= candidate.cells.len();
        self.stock_cells -= candidate.cells.len();
    }

    fn unplace(&mut self, id: usize) {
        let candidate = &self.solver.candidates[id];
        for &cell in candidate.cells.iter() {
            self.occupied[cell] = false;
        }
        self.remaining[candidate.piece_id] += 1;
        self.free_cells += candidate.cells.len();
        self.stock_cells += candidate.cells.len();
    }

    /// Does the current partial cover leave free cells nothing can fill?
    ///
    /// Only cells after `from` can still be free.
    fn is_dead_end(&mut self, from: usize) -> bool {
        if self.free_cells == 0 {
            return false;
        }
        if self.stock_cells < self.free_cells {
            return true;
        }

        let stock = &self.solver.stock;
        let Some(smallest) = self
            .remaining
            .iter()
            .zip(stock)
            .filter(|(left, _)| **left > 0)
            .map(|(_, entry)| entry.piece.size())
            .min()
        else {
            return true;
        };
        if smallest <= 1 {
            return false;
        }

        self.has_small_region(from, smallest)
    }

    /// Flood-fills the free cells, reporting whether any 4-connected region
    /// holds fewer than `smallest` cells.
    fn has_small_region(&mut self, from: usize, smallest: usize) -> bool {
        let width = self.solver.board.width();
        let height = self.solver.board.height();

        self.region_generation = self.region_generation.wrapping_add(1);
        if self.region_generation == 0 {
            self.region_mark.fill(0);
            self.region_generation = 1;
        }
        let generation = self.region_generation;

        for start in from..self.occupied.len() {
            if self.occupied[start] || self.region_mark[start] == generation {
                continue;
            }

            self.region_mark[start] = generation;
            self.region_queue.clear();
            self.region_queue.push(start);
            let mut size = 0;

            while let Some(cell) = self.region_queue.pop() {
                size += 1;
                let (x, y) = (cell % width, cell / width);
                let neighbours = [
                    (x > 0).then(|| cell - 1),
                    (x + 1 < width).then(|| cell + 1),
                    (y > 0).then(|| cell - width),
                    (y + 1 < height).then(|| cell + width),
                ];
                for next in neighbours.into_iter().flatten() {
                    if !self.occupied[next] && self.region_mark[next] != generation {
                        self.region_mark[next] = generation;
                        self.region_queue.push(next);
                    }
                }
            }

            if size < smallest {
                return true;
            }
        }

        false
    }

    fn current_solution(&self) -> Solution {
        self.frames
            .iter()
            .filter_map(|frame| frame.applied)
            .map(|id| self.solver.to_placement(id))
            .collect()
    }
}

/// Checks that `solution` covers every free cell of `board` exactly once,
/// using each stock entry no more often than its count allows and placing
/// each piece in the shape its transformation describes.
pub fn verify(board: &QuiltBoard, stock: &[Stock], solution: &[Placement]) -> Result<(), VerifyError> {
    let mut used = vec![0usize; stock.len()];
    let mut covered = board.clone();

    for (index, placement) in solution.iter().enumerate() {
        let piece_id = placement.piece_id;
        let entry = stock
            .get(piece_id)
            .ok_or(VerifyError::UnknownPiece { index, piece_id })?;

        used[piece_id] += 1;
        if used[piece_id] > entry.count {
            return Err(VerifyError::Overused {
                piece_id,
                available: entry.count,
            });
        }

        let origin = Position::new(placement.offset_x, placement.offset_y);
        let expected: FxHashSet<Position> = entry
            .piece
            .positions(placement.transformation)
            .map(|p| p.translate(origin))
            .collect();
        let actual: FxHashSet<Position> = placement.positions.iter().copied().collect();
        if expected != actual || actual.len() != placement.positions.len() {
            return Err(VerifyError::ShapeMismatch { index, piece_id });
        }

        covered
            .apply(std::slice::from_ref(placement))
            .map_err(|source| VerifyError::Placement { index, source })?;
    }

    match covered.free_cells() {
        0 => Ok(()),
        count => Err(VerifyError::Uncovered { count }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlacementError;
    use crate::geometry::{Dimension, Rotation};
    use crate::pieces::{catalog, Piece};

    fn pos(x: usize, y: usize) -> Position {
        Position::new(x, y)
    }

    fn solver(board: &QuiltBoard, stock: &[Stock], policy: TransformPolicy) -> PlacementSolver {
        PlacementSolver::new(board, stock, SolverConfig::new(policy))
    }

    fn offsets(solution: &Solution) -> Vec<(usize, usize)> {
        solution.iter().map(|p| (p.offset_x, p.offset_y)).collect()
    }

    #[test]
    fn test_unit_squares_fill_in_scan_order() {
        let board = QuiltBoard::new(Dimension::square(2));
        let stock = [Stock::new(Piece::single_square(), 4)];
        let outcome = solver(&board, &stock, TransformPolicy::NoTransform).solve();

        let solution = outcome.solution().expect("2x2 board should be solved");
        assert_eq!(offsets(solution), vec![(0, 0), (1, 0), (0, 1), (1, 1)]);
        assert!(solution.iter().all(|p| p.piece_id == 0));
        assert!(solution
            .iter()
            .all(|p| p.transformation == Transformation::identity()));
    }

    #[test]
    fn test_cell_count_mismatch_is_infeasible() {
        let board = QuiltBoard::new(Dimension::new(2, 1));
        let stock = [Stock::one(Piece::single_square())];
        let solver = solver(&board, &stock, TransformPolicy::NoTransform);
        assert_eq!(solver.solve(), SolveOutcome::Infeasible);
        assert_eq!(solver.stats().nodes, 0);
        assert_eq!(solver.solve_parallel(4), SolveOutcome::Infeasible);
    }

    #[test]
    fn test_full_board_is_vacuously_solved() {
        let board = QuiltBoard::parse("#").unwrap();
        let outcome = solver(&board, &[], TransformPolicy::NoTransform).solve();
        assert_eq!(outcome, SolveOutcome::Solved(Vec::new()));

        let enumeration = solver(&board, &[], TransformPolicy::NoTransform).solve_all(None);
        assert_eq!(enumeration.solutions, vec![Vec::new()]);
        assert!(enumeration.complete);
    }

    #[test]
    fn test_exact_usage_requires_whole_inventory() {
        let board = QuiltBoard::new(Dimension::square(2));
        let stock = [Stock::new(Piece::single_square(), 5)];

        let at_most = PlacementSolver::new(&board, &stock, SolverConfig::new(TransformPolicy::NoTransform));
        assert!(at_most.solve().is_solved());

        let exact = PlacementSolver::new(
            &board,
            &stock,
            SolverConfig::new(TransformPolicy::NoTransform).with_usage(InventoryUsage::Exact),
        );
        assert_eq!(exact.solve(), SolveOutcome::Infeasible);
    }

    #[test]
    fn test_subset_sum_reachability() {
        assert!(subset_sum_reachable(0, []));
        assert!(subset_sum_reachable(7, [(3, 1), (4, 1)]));
        assert!(!subset_sum_reachable(7, [(3, 2), (5, 1)]));
        assert!(subset_sum_reachable(9, [(3, 5)]));
        assert!(!subset_sum_reachable(10, [(3, 5)]));
    }

    #[test]
    fn test_huge_counts_saturate() {
        let board = QuiltBoard::new(Dimension::square(2));
        let stock = [Stock::new(Piece::parse("##").unwrap(), usize::MAX / 2 + 1)];
        assert_eq!(total_cells(&stock), usize::MAX);

        let outcome = solver(&board, &stock, TransformPolicy::RotationsOnly).solve();
        verify(&board, &stock, outcome.solution().unwrap()).unwrap();

        let exact = PlacementSolver::new(
            &board,
            &stock,
            SolverConfig::new(TransformPolicy::RotationsOnly).with_usage(InventoryUsage::Exact),
        );
        assert_eq!(exact.solve(), SolveOutcome::Infeasible);
    }

    #[test]
    fn test_padded_piece_offsets_match_piece() {
        let board = QuiltBoard::new(Dimension::square(1));
        let padded = Piece::new(Dimension::new(2, 1), [pos(1, 0)]).unwrap();
        let stock = [Stock::one(padded.clone())];
        let outcome = solver(&board, &stock, TransformPolicy::NoTransform).solve();

        let solution = outcome.solution().unwrap();
        assert_eq!(offsets(solution), vec![(0, 0)]);
        verify(&board, &stock, solution).unwrap();
        let mut placed = board.clone();
        assert_eq!(placed.add_piece(pos(0, 0), &padded, Transformation::identity()), Ok(()));
    }

    #[test]
    fn test_padded_dominoes_rebuild_every_tiling() {
        let board = QuiltBoard::new(Dimension::square(2));
        let domino = Piece::new(Dimension::square(3), [pos(1, 1), pos(2, 1)]).unwrap();
        let stock = [Stock::new(domino, 2)];
        let all = solver(&board, &stock, TransformPolicy::RotationsOnly).solve_all(None);
        assert_eq!(all.solutions.len(), 2);

        for solution in &all.solutions {
            verify(&board, &stock, solution).unwrap();
            let mut rebuilt = board.clone();
            for p in solution {
                rebuilt
                    .add_piece(pos(p.offset_x, p.offset_y), &stock[p.piece_id].piece, p.transformation)
                    .unwrap();
            }
            assert_eq!(rebuilt.free_cells(), 0);
        }
    }

    #[test]
    fn test_domino_needs_rotation() {
        // vertical 1x2 gap; only a horizontal domino in stock
        let board = QuiltBoard::new(Dimension::new(1, 2));
        let stock = [Stock::one(Piece::parse("##").unwrap())];

        let fixed = solver(&board, &stock, TransformPolicy::NoTransform);
        assert_eq!(fixed.solve(), SolveOutcome::NoSolution);

        let rotating = solver(&board, &stock, TransformPolicy::RotationsOnly);
        let solution = rotating.solve().solution().cloned().unwrap();
        assert_eq!(solution.len(), 1);
        assert_eq!(solution[0].transformation.rotation, Rotation::Clockwise90);
        assert_eq!(solution[0].positions, vec![pos(0, 0), pos(0, 1)]);
    }

    #[test]
    fn test_obstacles_are_respected() {
        let board = QuiltBoard::parse("#..\n...").unwrap();
        let stock = [
            Stock::one(Piece::parse("##").unwrap()),
            Stock::one(Piece::parse("###").unwrap()),
        ];
        let outcome = solver(&board, &stock, TransformPolicy::NoTransform).solve();
        let solution = outcome.solution().unwrap();

        verify(&board, &stock, solution).unwrap();
        insta::assert_snapshot!(crate::grid::format_solution(&board, solution), @r"
        #00
        111
        ");
    }

    #[test]
    fn test_anchor_reaches_left_of_first_free_cell() {
        // the T tromino's first square is in its middle column
        let board = QuiltBoard::parse("#.#\n...").unwrap();
        let stock = [Stock::one(Piece::parse(".#.\n###").unwrap())];
        let outcome = solver(&board, &stock, TransformPolicy::NoTransform).solve();

        let solution = outcome.solution().unwrap();
        assert_eq!(offsets(solution), vec![(0, 0)]);
        assert_eq!(solution[0].positions, vec![pos(1, 0), pos(0, 1), pos(1, 1), pos(2, 1)]);
    }

    #[test]
    fn test_no_solution_leaves_board_untouched() {
        // checkerboard colouring: two opposite corners removed
        let board = QuiltBoard::parse("#...\n....\n....\n...#").unwrap();
        let before = board.clone();
        let stock = [Stock::new(Piece::parse("##").unwrap(), 7)];
        let outcome = solver(&board, &stock, TransformPolicy::RotationsOnly).solve();

        assert_eq!(outcome, SolveOutcome::NoSolution);
        assert_eq!(board, before);
    }

    #[test]
    fn test_enumerate_domino_tilings() {
        // a 2x3 strip has exactly three domino tilings
        let board = QuiltBoard::new(Dimension::new(3, 2));
        let stock = [Stock::new(Piece::parse("##").unwrap(), 3)];
        let solver = solver(&board, &stock, TransformPolicy::RotationsOnly);

        let all = solver.solve_all(None);
        assert!(all.complete);
        assert_eq!(all.solutions.len(), 3);
        for solution in &all.solutions {
            verify(&board, &stock, solution).unwrap();
        }
        assert_eq!(solver.stats().solutions, 3);

        let limited = solver.solve_all(Some(2));
        assert!(!limited.complete);
        assert_eq!(limited.solutions, all.solutions[..2].to_vec());
    }

    #[test]
    fn test_pruning_does_not_change_answers() {
        let board = QuiltBoard::new(Dimension::new(5, 4));
        let stock: Vec<Stock> = ['L', 'P', 'T', 'Y']
            .into_iter()
            .filter_map(catalog::pentomino)
            .map(Stock::one)
            .collect();

        let config = SolverConfig::new(TransformPolicy::RotationsAndReflections);
        let pruned = PlacementSolver::new(&board, &stock, config.clone());
        let plain = PlacementSolver::new(&board, &stock, config.with_pruning(false));

        assert_eq!(pruned.solve_all(None), plain.solve_all(None));
        assert!(pruned.stats().nodes <= plain.stats().nodes);
    }

    #[test]
    fn test_pocket_pruning_cuts_branches() {
        // any tromino in the top row strands the single cell (3, 0)
        let board = QuiltBoard::parse("....\n...#").unwrap();
        let stock = [
            Stock::one(Piece::parse("###").unwrap()),
            Stock::one(Piece::parse("#\n#").unwrap()),
            Stock::one(Piece::parse("##").unwrap()),
        ];
        let pruned = solver(&board, &stock, TransformPolicy::NoTransform);
        let outcome = pruned.solve();
        verify(&board, &stock, outcome.solution().unwrap()).unwrap();
        assert!(pruned.stats().pruned > 0);
    }

    #[test]
    fn test_solve_is_deterministic() {
        let board = QuiltBoard::new(Dimension::new(5, 4));
        let stock: Vec<Stock> = catalog::patches().into_iter().map(Stock::one).collect();
        let solver = solver(&board, &stock, TransformPolicy::RotationsAndReflections);
        assert_eq!(solver.solve(), solver.solve());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let board = QuiltBoard::new(Dimension::new(5, 4));
        let stock: Vec<Stock> = ['L', 'N', 'P', 'U']
            .into_iter()
            .filter_map(catalog::pentomino)
            .map(Stock::one)
            .collect();
        let solver = solver(&board, &stock, TransformPolicy::RotationsAndReflections);

        let sequential = solver.solve();
        for threads in [1, 2, 4] {
            assert_eq!(solver.solve_parallel(threads), sequential);
        }
    }

    #[test]
    fn test_cancelled_search_is_interrupted() {
        let board = QuiltBoard::new(Dimension::new(5, 4));
        let stock: Vec<Stock> = catalog::patches().into_iter().map(Stock::one).collect();
        let cancel = Arc::new(AtomicBool::new(true));
        let config = SolverConfig::new(TransformPolicy::RotationsAndReflections).with_cancel(cancel);
        let solver = PlacementSolver::new(&board, &stock, config);

        assert_eq!(solver.solve(), SolveOutcome::Interrupted);
        assert_eq!(solver.solve_parallel(2), SolveOutcome::Interrupted);
        assert!(!solver.solve_all(None).complete);
    }

    #[test]
    fn test_expired_deadline_is_interrupted() {
        let board = QuiltBoard::new(Dimension::new(5, 4));
        let stock: Vec<Stock> = catalog::patches().into_iter().map(Stock::one).collect();
        let config = SolverConfig::new(TransformPolicy::RotationsAndReflections).with_deadline(Instant::now());
        let solver = PlacementSolver::new(&board, &stock, config);
        assert_eq!(solver.solve(), SolveOutcome::Interrupted);
    }

    #[test]
    fn test_verify_rejects_bad_solutions() {
        let board = QuiltBoard::new(Dimension::new(2, 1));
        let stock = [Stock::new(Piece::single_square(), 1)];
        let square_at = |x| Placement {
            piece_id: 0,
            transformation: Transformation::identity(),
            offset_x: x,
            offset_y: 0,
            positions: vec![pos(x, 0)],
        };

        assert_eq!(
            verify(&board, &stock, &[square_at(0)]),
            Err(VerifyError::Uncovered { count: 1 })
        );
        assert_eq!(
            verify(&board, &stock, &[square_at(0), square_at(1)]),
            Err(VerifyError::Overused {
                piece_id: 0,
                available: 1
            })
        );

        let mut wrong_shape = square_at(0);
        wrong_shape.positions = vec![pos(1, 0)];
        assert_eq!(
            verify(&board, &stock, &[wrong_shape]),
            Err(VerifyError::ShapeMismatch { index: 0, piece_id: 0 })
        );

        let mut unknown = square_at(0);
        unknown.piece_id = 3;
        assert_eq!(
            verify(&board, &stock, &[unknown]),
            Err(VerifyError::UnknownPiece { index: 0, piece_id: 3 })
        );

        let stock = [Stock::new(Piece::single_square(), 2)];
        assert_eq!(
            verify(&board, &stock, &[square_at(0), square_at(0)]),
            Err(VerifyError::Placement {
                index: 1,
                source: PlacementError::OverlapsPiece
            })
        );
    }
}
