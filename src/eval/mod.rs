//! Serviço de avaliação e o cache de score por posição.
//!
//! ## Exemplo
//!
//! ```rust,ignore
//! use nnue_eval::eval::EvaluationService;
//! use nnue_eval::types::config::EvalConfig;
//!
//! let mut service = EvaluationService::new(EvalConfig::default());
//! if !service.load("nn.bin") {
//!     return;
//! }
//! let score = service.evaluate(&mut position);
//! ```

mod accumulator;
mod service;

pub use accumulator::{
    AccumulatorCache, CachedScore, Color, FeatureDelta, FeatureIndex, Position, StateChange,
    StateHistory, StateNode, Value,
};
pub use service::{EvaluationService, FV_SCALE};
