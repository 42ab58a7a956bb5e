//! TSP heuristic: nearest-neighbour construction followed by 2-opt.
//!
//! Tours are open paths anchored at index 0 (the route start). The solver is
//! deterministic for a given matrix: ties go to the first candidate found.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::OptimizeError;
use crate::matrix::DistanceMatrix;
use crate::model::Objective;

/// Improvements smaller than this are treated as float noise.
const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Upper bound on 2-opt sweeps. The effective budget is `min(max_iterations, N²)`.
    pub max_iterations: usize,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self { max_iterations: 1000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TourSolution {
    /// Waypoint indices in visiting order.
    pub order: Vec<usize>,
    pub iterations: usize,
    /// The search stopped because no improving move was left.
    pub converged: bool,
}

impl TourSolution {
    fn identity(n: usize) -> Self {
        Self {
            order: (0..n).collect(),
            iterations: 0,
            converged: true,
        }
    }
}

/// Per-leg cost under an objective.
struct TravelCost<'a> {
    matrix: &'a DistanceMatrix,
    objective: Objective,
    max_distance: f64,
    max_duration: f64,
}

impl<'a> TravelCost<'a> {
    fn new(matrix: &'a DistanceMatrix, objective: Objective) -> Self {
        Self {
            matrix,
            objective,
            max_distance: matrix.max_distance(),
            max_duration: matrix.max_duration(),
        }
    }

    fn between(&self, from: usize, to: usize) -> f64 {
        match self.objective {
            Objective::Shortest => self.matrix.distance(from, to),
            Objective::Fastest => self.matrix.duration(from, to),
            Objective::Balanced => {
                0.6 * normalize(self.matrix.duration(from, to), self.max_duration)
                    + 0.4 * normalize(self.matrix.distance(from, to), self.max_distance)
            }
        }
    }

    fn tour(&self, order: &[usize]) -> f64 {
        order.windows(2).map(|leg| self.between(leg[0], leg[1])).sum()
    }
}

fn normalize(value: f64, max: f64) -> f64 {
    if max > 0.0 { value / max } else { 0.0 }
}

/// The search stopped because its token was cancelled.
#[derive(Debug)]
struct Interrupted;

pub fn solve(
    matrix: &DistanceMatrix,
    objective: Objective,
    locked: &HashSet<usize>,
    options: &SolveOptions,
) -> TourSolution {
    match search(matrix, objective, locked, options, None) {
        Ok(solution) => solution,
        // Without a token the search cannot be interrupted.
        Err(Interrupted) => TourSolution::identity(matrix.size()),
    }
}

/// Solve, checking `cancel` between 2-opt sweeps.
///
/// `locked` holds waypoint indices that 2-opt must not move. If the result is
/// not strictly cheaper than visiting the waypoints in input order, the input
/// order is returned.
pub fn solve_cancellable(
    matrix: &DistanceMatrix,
    objective: Objective,
    locked: &HashSet<usize>,
    options: &SolveOptions,
    cancel: &CancellationToken,
) -> Result<TourSolution, OptimizeError> {
    search(matrix, objective, locked, options, Some(cancel))
        .map_err(|Interrupted| OptimizeError::Cancelled)
}

fn search(
    matrix: &DistanceMatrix,
    objective: Objective,
    locked: &HashSet<usize>,
    options: &SolveOptions,
    cancel: Option<&CancellationToken>,
) -> Result<TourSolution, Interrupted> {
    let n = matrix.size();
    if n <= 3 {
        return Ok(TourSolution::identity(n));
    }

    let cost = TravelCost::new(matrix, objective);
    let mut tour = nearest_neighbor(&cost, n);
    let budget = options.max_iterations.min(n * n);
    let (iterations, converged) = two_opt(&mut tour, &cost, locked, budget, cancel)?;

    let identity: Vec<usize> = (0..n).collect();
    let identity_cost = cost.tour(&identity);
    let tour_cost = cost.tour(&tour);

    debug!(n, iterations, converged, identity_cost, tour_cost, ?objective, "2-opt finished");

    let order = if tour_cost < identity_cost - EPSILON { tour } else { identity };
    Ok(TourSolution {
        order,
        iterations,
        converged,
    })
}

fn nearest_neighbor(cost: &TravelCost<'_>, n: usize) -> Vec<usize> {
    let mut visited = vec![false; n];
    let mut tour = Vec::with_capacity(n);
    let mut current = 0;
    visited[current] = true;
    tour.push(current);

    while tour.len() < n {
        let mut next: Option<(usize, f64)> = None;
        for candidate in (0..n).filter(|&c| !visited[c]) {
            let c = cost.between(current, candidate);
            if next.is_none_or(|(_, best)| c < best) {
                next = Some((candidate, c));
            }
        }

        let Some((chosen, _)) = next else { break };
        visited[chosen] = true;
        tour.push(chosen);
        current = chosen;
    }

    tour
}

/// Reverse `tour[i..=j]` whenever it strictly lowers the tour cost. Position 0
/// is never moved. Returns the number of sweeps and whether the last sweep
/// found nothing to improve.
///
/// Locks are matched by waypoint index, not by tour position: a move is
/// skipped when the waypoint currently at `tour[i]` or `tour[j]` is locked.
fn two_opt(
    tour: &mut [usize],
    cost: &TravelCost<'_>,
    locked: &HashSet<usize>,
    budget: usize,
    cancel: Option<&CancellationToken>,
) -> Result<(usize, bool), Interrupted> {
    let n = tour.len();
    let mut best = cost.tour(tour);
    let mut iterations = 0;
    let mut improved = true;

    while improved && iterations < budget {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(Interrupted);
        }

        improved = false;
        for i in 1..n.saturating_sub(1) {
            if locked.contains(&tour[i]) {
                continue;
            }
            for j in i + 1..n {
                if locked.contains(&tour[j]) {
                    continue;
                }

                tour[i..=j].reverse();
                let candidate = cost.tour(tour);
                if candidate < best - EPSILON {
                    best = candidate;
                    improved = true;
                } else {
                    tour[i..=j].reverse();
                }
            }
        }
        iterations += 1;
    }

    Ok((iterations, !improved))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Points on a line; distance is |x_i - x_j| km and duration twice that.
    fn line_matrix(xs: &[f64]) -> DistanceMatrix {
        let mut matrix = DistanceMatrix::new(xs.len());
        for (i, a) in xs.iter().enumerate() {
            for (j, b) in xs.iter().enumerate() {
                if i != j {
                    let d = (a - b).abs();
                    matrix.set(i, j, d, d * 2.0, d * 0.1);
                }
            }
        }
        matrix
    }

    #[test]
    fn test_small_instances_keep_identity() {
        let matrix = line_matrix(&[0.0, 5.0, 1.0]);
        let solution = solve(&matrix, Objective::Shortest, &HashSet::new(), &SolveOptions::default());
        assert_eq!(solution.order, vec![0, 1, 2]);
        assert_eq!(solution.iterations, 0);
        assert!(solution.converged);
    }

    #[test]
    fn test_nearest_neighbor_walks_the_line() {
        let matrix = line_matrix(&[0.0, 3.0, 1.0, 2.0]);
        let cost = TravelCost::new(&matrix, Objective::Shortest);
        assert_eq!(nearest_neighbor(&cost, 4), vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_nearest_neighbor_ties_take_first_index() {
        let matrix = line_matrix(&[0.0, 1.0, -1.0, 5.0]);
        let cost = TravelCost::new(&matrix, Objective::Shortest);
        assert_eq!(nearest_neighbor(&cost, 4)[1], 1);
    }

    #[test]
    fn test_two_opt_removes_detour() {
        let matrix = line_matrix(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let cost = TravelCost::new(&matrix, Objective::Shortest);
        let mut tour = vec![0, 3, 2, 1, 4];

        let (iterations, converged) =
            two_opt(&mut tour, &cost, &HashSet::new(), 25, None).unwrap();

        assert_eq!(tour, vec![0, 1, 2, 3, 4]);
        assert!(converged);
        assert!(iterations >= 1);
    }

    #[test]
    fn test_two_opt_leaves_locked_nodes_in_place() {
        let matrix = line_matrix(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let cost = TravelCost::new(&matrix, Objective::Shortest);
        let mut tour = vec![0, 3, 2, 1, 4];
        let locked = HashSet::from([3]);

        two_opt(&mut tour, &cost, &locked, 25, None).unwrap();

        assert_eq!(tour[1], 3);
    }

    #[test]
    fn test_solve_improves_zig_zag() {
        let matrix = line_matrix(&[0.0, 3.0, 1.0, 2.0]);
        let solution = solve(&matrix, Objective::Shortest, &HashSet::new(), &SolveOptions::default());
        assert_eq!(solution.order, vec![0, 2, 3, 1]);
        assert!(solution.converged);
    }

    #[test]
    fn test_solve_returns_identity_when_already_optimal() {
        let matrix = line_matrix(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let solution = solve(&matrix, Objective::Fastest, &HashSet::new(), &SolveOptions::default());
        assert_eq!(solution.order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_budget_limits_sweeps() {
        let matrix = line_matrix(&[0.0, 3.0, 1.0, 2.0, 6.0, 4.0, 5.0]);
        let options = SolveOptions { max_iterations: 1 };
        let solution = solve(&matrix, Objective::Balanced, &HashSet::new(), &options);
        assert!(solution.iterations <= 1);
    }

    #[test]
    fn test_exhausted_budget_is_not_convergence() {
        // Nearest neighbour visits 0, 1, -2, 4.5; the first sweep improves it
        // to 0, -2, 1, 4.5 and only a second sweep can confirm that.
        let matrix = line_matrix(&[0.0, 1.0, -2.0, 4.5]);

        let cut_short = solve(
            &matrix,
            Objective::Shortest,
            &HashSet::new(),
            &SolveOptions { max_iterations: 1 },
        );
        assert_eq!(cut_short.order, vec![0, 2, 1, 3]);
        assert_eq!(cut_short.iterations, 1);
        assert!(!cut_short.converged);

        let full = solve(&matrix, Objective::Shortest, &HashSet::new(), &SolveOptions::default());
        assert_eq!(full.order, vec![0, 2, 1, 3]);
        assert_eq!(full.iterations, 2);
        assert!(full.converged);
    }

    #[test]
    fn test_two_opt_stops_when_cancelled() {
        let matrix = line_matrix(&[0.0, 1.0, 2.0, 3.0, 4.0]);
        let cost = TravelCost::new(&matrix, Objective::Shortest);
        let mut tour = vec![0, 3, 2, 1, 4];
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = two_opt(&mut tour, &cost, &HashSet::new(), 25, Some(&cancel));

        assert!(result.is_err());
        assert_eq!(tour, vec![0, 3, 2, 1, 4]);
    }

    #[test]
    fn test_balanced_normalizes_both_metrics() {
        let matrix = line_matrix(&[0.0, 2.0]);
        let cost = TravelCost::new(&matrix, Objective::Balanced);
        // Both legs are the matrix maximum, so 0.6 * 1 + 0.4 * 1
        assert!((cost.between(0, 1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cancelled_before_search() {
        let matrix = line_matrix(&[0.0, 3.0, 1.0, 2.0]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = solve_cancellable(
            &matrix,
            Objective::Shortest,
            &HashSet::new(),
            &SolveOptions::default(),
            &cancel,
        );
        assert!(matches!(result, Err(OptimizeError::Cancelled)));
    }

    #[test]
    fn test_deterministic() {
        let matrix = line_matrix(&[0.0, 7.0, 3.0, 9.0, 1.0, 4.0]);
        let a = solve(&matrix, Objective::Shortest, &HashSet::new(), &SolveOptions::default());
        let b = solve(&matrix, Objective::Shortest, &HashSet::new(), &SolveOptions::default());
        assert_eq!(a, b);
    }
}
