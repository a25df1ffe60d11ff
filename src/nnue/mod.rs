//! Módulos de parâmetros e o formato de arquivo do contêiner.
//!
//! - [`ParameterModule`]: contrato de serialização de todo estágio
//! - [`TransformStage`] / [`PropagationStage`]: o lado de cálculo de cada estágio
//! - [`FeatureTransformer`] / [`Network`]: os estágios deste build
//! - [`ModelContainer`]: o arquivo versionado e marcado por hash com os dois

mod container;
mod feature_transformer;
mod layers;
mod module;
mod network;

pub use container::{FileHeader, ModelContainer, NNUE_VERSION};
pub use feature_transformer::{FeatureTransformer, HALF_DIMENSIONS, INPUT_DIMENSIONS};
pub use layers::{AffineLayer, WEIGHT_SCALE_BITS};
pub use module::{ParameterModule, PropagationStage, TransformStage};
pub use network::Network;
