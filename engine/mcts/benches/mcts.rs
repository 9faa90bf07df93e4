//! MCTS benchmarks for performance profiling.
//!
//! Run with: `cargo bench -p mcts`
//!
//! These benchmarks measure:
//! - Full searches with varying simulation counts
//! - Search from different game states (opening, midgame, near-terminal)
//! - Tree operations (selection, backpropagation, re-rooting)
//! - Coalesced self-play throughput

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use engine_core::{Action, Game, StepResult};
use games_connect4::Connect4;
use games_tictactoe::TicTacToe;
use mcts::{
    MctsConfig, MctsNode, MctsTree, SearchTree, SelfPlayConfig, SelfPlayOrchestrator, Unbatched,
    UniformEvaluator,
};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Search tree advanced through `moves` from the initial position.
fn tree_after<G: Game>(game: G, moves: &[Action], config: MctsConfig) -> SearchTree<G> {
    let mut tree = SearchTree::with_seed(Arc::new(game), config, 42);
    for &action in moves {
        tree.step(action).unwrap();
    }
    tree
}

// =============================================================================
// Full Search Benchmarks
// =============================================================================

fn bench_search_simulations(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("mcts_search_simulations");
    let evaluator = Unbatched(UniformEvaluator::new(9));

    for sims in [50, 100, 200, 400, 800, 1600] {
        group.throughput(Throughput::Elements(sims as u64));
        group.bench_with_input(BenchmarkId::new("tictactoe", sims), &sims, |b, &sims| {
            b.iter(|| {
                let mut tree = tree_after(TicTacToe::new(), &[], MctsConfig::for_testing());
                rt.block_on(tree.plan(sims, &evaluator)).unwrap();
                black_box(tree.stats())
            });
        });
    }

    group.finish();
}

fn bench_search_connect4(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("mcts_connect4");
    let evaluator = Unbatched(UniformEvaluator::new(7));

    for sims in [50, 100, 200, 400, 800] {
        group.throughput(Throughput::Elements(sims as u64));
        group.bench_with_input(BenchmarkId::new("opening", sims), &sims, |b, &sims| {
            b.iter(|| {
                let mut tree = tree_after(Connect4::new(), &[], MctsConfig::for_testing());
                rt.block_on(tree.plan(sims, &evaluator)).unwrap();
                black_box(tree.stats())
            });
        });
    }

    group.finish();
}

fn bench_game_phases(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("mcts_game_phases");
    let evaluator = Unbatched(UniformEvaluator::new(9));
    let sims = 200u32;

    let phases: [(&str, &[Action]); 3] = [
        ("opening", &[]),
        // X at 4, O at 0, X at 2, O at 6
        ("midgame", &[4, 0, 2, 6]),
        // X at 0, O at 3, X at 1, O at 4 -> X can win at 2
        ("near_terminal", &[0, 3, 1, 4]),
    ];

    for (name, moves) in phases {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut tree = tree_after(TicTacToe::new(), moves, MctsConfig::for_testing());
                rt.block_on(tree.plan(sims, &evaluator)).unwrap();
                black_box(tree.stats())
            });
        });
    }

    group.finish();
}

// =============================================================================
// Tree Operation Benchmarks
// =============================================================================

fn root_tree() -> MctsTree<u8> {
    MctsTree::new(MctsNode::new_root(StepResult::ongoing(0, 2), 0))
}

fn bench_tree_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_tree_ops");

    group.bench_function("allocate_node", |b| {
        b.iter(|| {
            let mut tree = root_tree();
            for i in 0..100u8 {
                tree.add_child(tree.root(), i % 9, 0.11, StepResult::ongoing(i, 2), 1);
            }
            black_box(tree.len())
        });
    });

    group.bench_function("select_child", |b| {
        let mut tree = root_tree();
        for i in 0..9u8 {
            let child_id = tree.add_child(
                tree.root(),
                i,
                (i as f32 + 1.0) / 45.0,
                StepResult::ongoing(i, 2),
                1,
            );
            let child = tree.get_mut(child_id);
            child.visit_count = (i as u32 + 1) * 10;
            child.value_sum = (i as f32 - 4.0) * 0.1 * child.visit_count as f32;
        }
        tree.get_mut(tree.root()).visit_count = 450;

        b.iter(|| black_box(tree.select_child(tree.root(), 1.25)));
    });

    group.bench_function("backpropagate_depth_5", |b| {
        b.iter_batched(
            || {
                let mut tree = root_tree();
                let mut parent = tree.root();
                for i in 0..5u8 {
                    parent = tree.add_child(
                        parent,
                        i,
                        0.5,
                        StepResult::ongoing(i, 2),
                        (i as usize + 1) % 2,
                    );
                }
                (tree, parent)
            },
            |(mut tree, leaf)| {
                tree.backpropagate(leaf, 1.0);
                black_box(tree)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("reroot_after_search", |b| {
        let rt = runtime();
        let evaluator = Unbatched(UniformEvaluator::new(9));
        b.iter_batched(
            || {
                let mut tree = tree_after(TicTacToe::new(), &[], MctsConfig::for_testing());
                rt.block_on(tree.plan(800, &evaluator)).unwrap();
                tree
            },
            |mut tree| {
                tree.step(4).unwrap();
                black_box(tree.tree().len())
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

// =============================================================================
// Self-Play Benchmarks
// =============================================================================

fn bench_selfplay(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("selfplay");
    group.sample_size(10);

    for games in [1usize, 8, 32] {
        group.throughput(Throughput::Elements(games as u64));
        group.bench_with_input(BenchmarkId::new("tictactoe", games), &games, |b, &games| {
            let config = SelfPlayConfig {
                mcts: MctsConfig::for_training().with_simulations(64),
                ..SelfPlayConfig::default()
            };
            let orchestrator = SelfPlayOrchestrator::new(
                Arc::new(TicTacToe::new()),
                Arc::new(UniformEvaluator::new(9)),
                config,
            );
            b.iter(|| black_box(rt.block_on(orchestrator.run(games)).total_moves()));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_search_simulations,
    bench_search_connect4,
    bench_game_phases,
    bench_tree_operations,
    bench_selfplay,
);
criterion_main!(benches);
