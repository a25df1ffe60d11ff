//! # nnue-eval
//!
//! Protocolo de carga/gravação e cache incremental de avaliação para um
//! modelo de avaliação estilo NNUE consumido por uma busca em árvore de jogo.
//!
//! ## Módulos
//!
//! - [`codec`] - Cursor little-endian e buffers alinhados de parâmetros
//! - [`nnue`] - Módulos de parâmetros e o formato versionado do contêiner
//! - [`eval`] - Serviço de avaliação e cache de score por posição
//! - [`cli`] - Interface de linha de comando
//! - [`types`] - Configuração e erros

#[cfg(feature = "cli")]
pub mod cli;
pub mod codec;
pub mod eval;
pub mod nnue;
pub mod types;

pub use eval::EvaluationService;
pub use types::config::Config;
pub use types::errors::{EvalError, EvalResult};
