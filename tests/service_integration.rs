//! Integration tests for the evaluation service and its score cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nnue_eval::codec::{ReadCursor, WriteCursor};
use nnue_eval::eval::{
    Color, EvaluationService, FeatureDelta, FeatureIndex, Position, StateChange, StateHistory,
};
use nnue_eval::nnue::{ModelContainer, ParameterModule, PropagationStage, TransformStage};
use nnue_eval::types::config::EvalConfig;
use nnue_eval::EvalResult;

/// Minimal host position: a feature list per perspective plus its history.
#[derive(Clone)]
struct Board {
    stm: Color,
    features: [Vec<FeatureIndex>; 2],
    states: StateHistory,
}

impl Board {
    /// Black sees the same features mirrored vertically.
    fn new(white: &[FeatureIndex]) -> Self {
        let black = white.iter().map(|&f| f ^ 56).collect();
        Self {
            stm: Color::White,
            features: [white.to_vec(), black],
            states: StateHistory::new(),
        }
    }

    /// Moves one feature in both perspectives (mirrored for black).
    fn make_move(&mut self, from: FeatureIndex, to: FeatureIndex) {
        let mut delta = FeatureDelta::new();
        for perspective in Color::ALL {
            let (f, t) = match perspective {
                Color::White => (from, to),
                Color::Black => (from ^ 56, to ^ 56),
            };
            let list = &mut self.features[perspective.index()];
            list.retain(|&x| x != f);
            list.push(t);
            delta.remove(perspective, f).add(perspective, t);
        }
        self.states.push(StateChange::Incremental(delta));
        self.stm = self.stm.flip();
    }

    fn unmake_move(&mut self, from: FeatureIndex, to: FeatureIndex) {
        for perspective in Color::ALL {
            let (f, t) = match perspective {
                Color::White => (from, to),
                Color::Black => (from ^ 56, to ^ 56),
            };
            let list = &mut self.features[perspective.index()];
            list.retain(|&x| x != t);
            list.push(f);
        }
        self.states.pop();
        self.stm = self.stm.flip();
    }
}

impl Position for Board {
    fn side_to_move(&self) -> Color {
        self.stm
    }

    fn active_features(&self, perspective: Color, out: &mut Vec<FeatureIndex>) {
        out.extend_from_slice(&self.features[perspective.index()]);
    }

    fn states(&self) -> &StateHistory {
        &self.states
    }

    fn states_mut(&mut self) -> &mut StateHistory {
        &mut self.states
    }
}

/// Transform double: emits the number of white features, counts calls.
#[derive(Default)]
struct CountingTransform {
    calls: Arc<AtomicUsize>,
}

impl ParameterModule for CountingTransform {
    fn structural_hash(&self) -> u32 {
        Self::HASH_VALUE
    }

    fn structure_description(&self) -> String {
        "CountingTransform".to_string()
    }

    fn read_parameters(&mut self, _cursor: &mut ReadCursor<'_>) -> EvalResult<()> {
        Ok(())
    }

    fn write_parameters(&self, _cursor: &mut WriteCursor<'_>) -> EvalResult<()> {
        Ok(())
    }
}

impl TransformStage for CountingTransform {
    const HASH_VALUE: u32 = 0xC0DE_0001;
    const OUTPUT_DIMENSIONS: usize = 1;

    fn transform<P: Position>(&self, position: &mut P, output: &mut [u8], _refresh: bool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut features = Vec::new();
        position.active_features(Color::White, &mut features);
        output[0] = features.len() as u8;
    }

    fn update_accumulator_if_possible<P: Position>(&self, _position: &mut P) -> bool {
        false
    }
}

/// Propagation double: scales its single input, counts calls.
#[derive(Default)]
struct CountingPropagation {
    calls: Arc<AtomicUsize>,
}

impl ParameterModule for CountingPropagation {
    fn structural_hash(&self) -> u32 {
        Self::HASH_VALUE
    }

    fn structure_description(&self) -> String {
        "CountingPropagation".to_string()
    }

    fn read_parameters(&mut self, _cursor: &mut ReadCursor<'_>) -> EvalResult<()> {
        Ok(())
    }

    fn write_parameters(&self, _cursor: &mut WriteCursor<'_>) -> EvalResult<()> {
        Ok(())
    }
}

impl PropagationStage for CountingPropagation {
    const HASH_VALUE: u32 = 0xC0DE_0002;

    fn propagate(&self, transformed: &[u8]) -> i32 {
        self.calls.fetch_add(1, Ordering::SeqCst);
        i32::from(transformed[0]) * 16 * 10
    }
}

type CountingService = EvaluationService<CountingTransform, CountingPropagation>;

fn counting_service() -> (CountingService, Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let transforms = Arc::new(AtomicUsize::new(0));
    let propagations = Arc::new(AtomicUsize::new(0));
    let model = ModelContainer::from_stages(
        CountingTransform {
            calls: transforms.clone(),
        },
        CountingPropagation {
            calls: propagations.clone(),
        },
    );
    (
        EvaluationService::with_model(EvalConfig::default(), model),
        transforms,
        propagations,
    )
}

fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// A model whose output depends on which features are active.
fn populated_model() -> ModelContainer {
    let mut model: ModelContainer = ModelContainer::new();
    for (i, b) in model.transformer_mut().biases_mut().iter_mut().enumerate() {
        *b = (i as i16 % 9) * 3;
    }
    for (i, w) in model.transformer_mut().weights_mut().iter_mut().enumerate() {
        *w = ((i * 7919) % 61) as i16 - 20;
    }
    let [h1, h2, out] = model.network_mut().layers_mut();
    for (i, w) in h1.weights_mut().iter_mut().enumerate() {
        *w = ((i * 13) % 9) as i8 - 3;
    }
    for (i, w) in h2.weights_mut().iter_mut().enumerate() {
        *w = ((i * 5) % 7) as i8 - 2;
    }
    for (i, w) in out.weights_mut().iter_mut().enumerate() {
        *w = (i % 5) as i8 - 1;
    }
    out.biases_mut()[0] = 160;
    model
}

/// Same network as `populated_model`, transformer biases shifted up.
fn shifted_model() -> ModelContainer {
    let mut model = populated_model();
    model.transformer_mut().biases_mut().fill(100);
    model
}

/// Scores the current node and checks it against a from-scratch query.
fn assert_matches_full(service: &EvaluationService, board: &mut Board) {
    let score = service.evaluate(board);
    let mut fresh = board.clone();
    fresh.states_mut().invalidate_all();
    assert_eq!(score, service.compute_full(&mut fresh));
}

// Cache behaviour
mod cache_tests {
    use super::*;

    #[test]
    fn test_repeated_queries_hit_cache() {
        let (service, transforms, propagations) = counting_service();
        let mut board = Board::new(&[1, 2, 3]);

        let first = service.evaluate(&mut board);
        assert_eq!(first, 30);
        assert_eq!((calls(&transforms), calls(&propagations)), (1, 1));

        for _ in 0..5 {
            assert_eq!(service.evaluate(&mut board), first);
        }
        assert_eq!((calls(&transforms), calls(&propagations)), (1, 1));
    }

    #[test]
    fn test_full_query_always_recomputes() {
        let (service, transforms, propagations) = counting_service();
        let mut board = Board::new(&[1]);

        service.evaluate(&mut board);
        service.compute_full(&mut board);
        service.compute_full(&mut board);
        assert_eq!((calls(&transforms), calls(&propagations)), (3, 3));

        // the full query refreshed the cache, so the next incremental query hits it
        assert_eq!(service.evaluate(&mut board), 10);
        assert_eq!((calls(&transforms), calls(&propagations)), (3, 3));
    }

    #[test]
    fn test_new_node_starts_invalid() {
        let (service, transforms, _) = counting_service();
        let mut board = Board::new(&[1]);

        service.evaluate(&mut board);
        board.make_move(1, 9);
        assert!(!board.states().current().cache().is_valid());

        service.evaluate(&mut board);
        assert_eq!(calls(&transforms), 2);

        // parent entry survives the child being popped
        board.unmake_move(1, 9);
        service.evaluate(&mut board);
        assert_eq!(calls(&transforms), 2);
    }

    #[test]
    fn test_invalidated_entry_recomputes() {
        let (service, transforms, _) = counting_service();
        let mut board = Board::new(&[1, 2]);

        service.evaluate(&mut board);
        board.states_mut().invalidate_all();
        service.evaluate(&mut board);
        assert_eq!(calls(&transforms), 2);
    }
}

// Incremental updates with the shipped stages
mod incremental_tests {
    use super::*;

    #[test]
    fn test_incremental_score_matches_full() {
        let service = EvaluationService::with_model(EvalConfig::default(), populated_model());
        let mut board = Board::new(&[8, 9, 10, 100, 300, 460]);

        service.evaluate(&mut board);
        let moves = [(8, 16), (9, 17), (16, 24), (300, 310)];
        for (from, to) in moves {
            board.make_move(from, to);
            let incremental = service.evaluate(&mut board);

            let mut fresh = board.clone();
            fresh.states_mut().invalidate_all();
            assert_eq!(incremental, service.compute_full(&mut fresh));
        }
    }

    #[test]
    fn test_notify_position_changed_prepares_accumulation() {
        let service = EvaluationService::with_model(EvalConfig::default(), populated_model());
        let mut board = Board::new(&[8, 9]);

        service.evaluate(&mut board);
        board.make_move(8, 16);
        board.make_move(9, 17);
        service.notify_position_changed(&mut board);

        let current = board.states().current().cache();
        assert!(current.has_accumulation());
        assert!(!current.is_valid());
    }

    #[test]
    fn test_notify_without_computed_ancestor_is_noop() {
        let service = EvaluationService::with_model(EvalConfig::default(), populated_model());
        let mut board = Board::new(&[8]);
        board.states_mut().push(StateChange::Refresh);

        service.notify_position_changed(&mut board);
        assert!(!board.states().current().cache().has_accumulation());
    }

    #[test]
    fn test_shared_service_across_threads() {
        let service = EvaluationService::with_model(EvalConfig::default(), populated_model());
        let expected = {
            let mut board = Board::new(&[8, 9, 10]);
            board.make_move(9, 17);
            service.compute_full(&mut board)
        };

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let service = &service;
                    scope.spawn(move || {
                        let mut board = Board::new(&[8, 9, 10]);
                        service.evaluate(&mut board);
                        board.make_move(9, 17);
                        service.evaluate(&mut board)
                    })
                })
                .collect();

            for handle in handles {
                assert_eq!(handle.join().expect("search thread panicked"), expected);
            }
        });
    }
}

// Loading
mod load_tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_skip_loading_eval_never_opens_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = EvalConfig {
            skip_loading_eval: true,
            ..EvalConfig::default()
        };
        let mut service: EvaluationService = EvaluationService::new(config);

        assert!(service.load(temp_dir.path().join("does-not-exist.bin")));
        assert!(!service.is_loaded());
        assert_eq!(service.source(), None);
    }

    #[test]
    fn test_missing_source_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let mut service: EvaluationService = EvaluationService::new(EvalConfig::default());
        assert!(!service.load(temp_dir.path().join("does-not-exist.bin")));
    }

    #[test]
    fn test_corrupt_file_fails_and_resets() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let good = temp_dir.path().join("good.bin");
        let bad = temp_dir.path().join("bad.bin");

        let saver = EvaluationService::with_model(EvalConfig::default(), populated_model());
        assert!(saver.save(&good));
        let mut bytes = std::fs::read(&good).expect("read saved file");
        bytes.push(0);
        std::fs::write(&bad, bytes).expect("write corrupt file");

        let mut service: EvaluationService = EvaluationService::new(EvalConfig::default());
        assert!(service.load(&good));
        assert_eq!(service.model(), saver.model());

        assert!(!service.load(&bad));
        assert!(!service.is_loaded());
        let mut board = Board::new(&[8]);
        assert_eq!(service.compute_full(&mut board), 0);
    }

    #[test]
    fn test_reload_discards_accumulations_of_previous_model() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("next.bin");
        let saver = EvaluationService::with_model(EvalConfig::default(), populated_model());
        assert!(saver.save(&path));

        let mut service = EvaluationService::with_model(EvalConfig::default(), shifted_model());
        let mut board = Board::new(&[8, 9, 10]);
        service.evaluate(&mut board);
        assert!(board.states().current().cache().has_accumulation());

        assert!(service.load(&path));
        board.make_move(9, 17);
        let after_reload = service.evaluate(&mut board);

        let mut fresh = Board::new(&[8, 9, 10]);
        fresh.make_move(9, 17);
        assert_eq!(after_reload, service.compute_full(&mut fresh));
        assert_eq!(after_reload, saver.compute_full(&mut fresh.clone()));
    }

    #[test]
    fn test_no_cached_entry_survives_reload() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("next.bin");
        let saver = EvaluationService::with_model(EvalConfig::default(), populated_model());
        assert!(saver.save(&path));

        let mut service = EvaluationService::with_model(EvalConfig::default(), shifted_model());
        let mut board = Board::new(&[8, 9, 10, 100]);
        service.evaluate(&mut board);
        board.make_move(8, 16);
        service.evaluate(&mut board);
        board.make_move(9, 17);
        service.evaluate(&mut board);

        assert!(service.load(&path));

        assert_matches_full(&service, &mut board);
        board.unmake_move(9, 17);
        assert_matches_full(&service, &mut board);
        board.make_move(10, 18);
        assert_matches_full(&service, &mut board);
        board.unmake_move(10, 18);
        board.unmake_move(8, 16);
        assert_matches_full(&service, &mut board);

        // a notify after the reload must not build on the old root either
        assert!(service.load(&path));
        board.make_move(100, 108);
        service.notify_position_changed(&mut board);
        assert!(!board.states().current().cache().has_accumulation());
        assert_matches_full(&service, &mut board);
    }

    #[test]
    fn test_load_default_uses_configured_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let path = temp_dir.path().join("nn.bin");
        let saver = EvaluationService::with_model(EvalConfig::default(), populated_model());
        assert!(saver.save(&path));

        let config = EvalConfig {
            eval_file: path.clone(),
            ..EvalConfig::default()
        };
        let mut service: EvaluationService = EvaluationService::new(config);
        assert!(service.load_default());
        assert_eq!(service.source(), Some(path.as_path()));
    }
}
