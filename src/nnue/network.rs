//! Rede de propagação: duas camadas ocultas com clipping e uma saída escalar.

use crate::codec::{ReadCursor, WriteCursor};
use crate::EvalResult;

use super::feature_transformer::HALF_DIMENSIONS;
use super::layers::{clipped_relu, clipped_relu_hash, input_slice_hash, AffineLayer};
use super::module::{ParameterModule, PropagationStage};

pub const INPUT_DIMENSIONS: usize = HALF_DIMENSIONS * 2;
pub const HIDDEN1_DIMENSIONS: usize = 32;
pub const HIDDEN2_DIMENSIONS: usize = 32;

const INPUT_HASH: u32 = input_slice_hash(INPUT_DIMENSIONS, 0);
const HIDDEN1_HASH: u32 = clipped_relu_hash(AffineLayer::hash(HIDDEN1_DIMENSIONS, INPUT_HASH));
const HIDDEN2_HASH: u32 = clipped_relu_hash(AffineLayer::hash(HIDDEN2_DIMENSIONS, HIDDEN1_HASH));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    hidden1: AffineLayer,
    hidden2: AffineLayer,
    output: AffineLayer,
}

impl Network {
    pub fn new() -> Self {
        Self {
            hidden1: AffineLayer::new(INPUT_DIMENSIONS, HIDDEN1_DIMENSIONS),
            hidden2: AffineLayer::new(HIDDEN1_DIMENSIONS, HIDDEN2_DIMENSIONS),
            output: AffineLayer::new(HIDDEN2_DIMENSIONS, 1),
        }
    }

    /// Camadas na ordem de propagação.
    pub fn layers_mut(&mut self) -> [&mut AffineLayer; 3] {
        [&mut self.hidden1, &mut self.hidden2, &mut self.output]
    }
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterModule for Network {
    fn structural_hash(&self) -> u32 {
        Self::HASH_VALUE
    }

    fn structure_description(&self) -> String {
        let input = format!("InputSlice[{}(0:{})]", INPUT_DIMENSIONS, INPUT_DIMENSIONS);
        let h1 = format!("ClippedReLU[{}]({})", HIDDEN1_DIMENSIONS, self.hidden1.description(&input));
        let h2 = format!("ClippedReLU[{}]({})", HIDDEN2_DIMENSIONS, self.hidden2.description(&h1));
        self.output.description(&h2)
    }

    fn read_parameters(&mut self, cursor: &mut ReadCursor<'_>) -> EvalResult<()> {
        for layer in self.layers_mut() {
            layer.read_parameters(cursor)?;
        }
        Ok(())
    }

    fn write_parameters(&self, cursor: &mut WriteCursor<'_>) -> EvalResult<()> {
        for layer in [&self.hidden1, &self.hidden2, &self.output] {
            layer.write_parameters(cursor)?;
        }
        Ok(())
    }
}

impl PropagationStage for Network {
    const HASH_VALUE: u32 = AffineLayer::hash(1, HIDDEN2_HASH);

    fn propagate(&self, transformed: &[u8]) -> i32 {
        let mut pre1 = [0i32; HIDDEN1_DIMENSIONS];
        let mut act1 = [0u8; HIDDEN1_DIMENSIONS];
        let mut pre2 = [0i32; HIDDEN2_DIMENSIONS];
        let mut act2 = [0u8; HIDDEN2_DIMENSIONS];
        let mut out = [0i32; 1];

        self.hidden1.propagate(transformed, &mut pre1);
        clipped_relu(&pre1, &mut act1);
        self.hidden2.propagate(&act1, &mut pre2);
        clipped_relu(&pre2, &mut act2);
        self.output.propagate(&act2, &mut out);
        out[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_network_outputs_zero() {
        let net = Network::new();
        assert_eq!(net.propagate(&[100u8; INPUT_DIMENSIONS]), 0);
    }

    #[test]
    fn test_output_bias_passes_through() {
        let mut net = Network::new();
        net.layers_mut()[2].biases_mut()[0] = 1600;
        assert_eq!(net.propagate(&[0u8; INPUT_DIMENSIONS]), 1600);
    }

    #[test]
    fn test_signal_reaches_output() {
        let mut net = Network::new();
        let [h1, h2, out] = net.layers_mut();
        h1.weights_mut()[0] = 64;
        h2.weights_mut()[0] = 64;
        out.weights_mut()[0] = 2;

        let mut input = [0u8; INPUT_DIMENSIONS];
        input[0] = 10;
        // 10*64 >> 6 = 10, 10*64 >> 6 = 10, 10*2 = 20
        assert_eq!(net.propagate(&input), 20);
    }

    #[test]
    fn test_extreme_parameters_do_not_panic() {
        let mut net = Network::new();
        for layer in net.layers_mut() {
            layer.biases_mut().fill(i32::MAX);
            layer.weights_mut().fill(i8::MAX);
        }
        // wraps to a defined value instead of overflowing
        let _ = net.propagate(&[127u8; INPUT_DIMENSIONS]);
    }

    #[test]
    fn test_description_nests_layers() {
        let desc = Network::new().structure_description();
        assert!(desc.starts_with("AffineTransform[1<-32](ClippedReLU[32]"));
        assert!(desc.contains("InputSlice[128(0:128)]"));
    }
}
