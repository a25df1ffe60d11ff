//! Transformador de features peça-casa.
//!
//! As features de entrada são `peça * 64 + casa` (doze tipos de peça, das
//! duas cores), já orientadas para a perspectiva pelo host. Cada feature
//! ativa soma uma coluna de pesos à acumulação da perspectiva; a saída são
//! as duas acumulações limitadas a `0..=127`, lado a jogar primeiro.

use crate::codec::{AlignedBuffer, ReadCursor, WriteCursor};
use crate::eval::{Color, FeatureIndex, Position, StateChange};
use crate::EvalResult;

use super::module::{ParameterModule, TransformStage};

/// Número de features de entrada distintas.
pub const INPUT_DIMENSIONS: usize = 12 * 64;

/// Largura da acumulação por perspectiva.
pub const HALF_DIMENSIONS: usize = 64;

const FEATURE_SET_HASH: u32 = 0x5D69_D5B9;

/// Estágio de transformação que mantém uma acumulação por perspectiva.
///
/// # Panics
///
/// `transform` e `update_accumulator_if_possible` entram em panic se o host
/// fornecer um índice de feature `>= INPUT_DIMENSIONS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureTransformer {
    biases: AlignedBuffer<i16>,
    weights: AlignedBuffer<i16>,
}

impl FeatureTransformer {
    pub fn new() -> Self {
        Self {
            biases: AlignedBuffer::zeroed(HALF_DIMENSIONS),
            weights: AlignedBuffer::zeroed(HALF_DIMENSIONS * INPUT_DIMENSIONS),
        }
    }

    pub fn biases(&self) -> &[i16] {
        self.biases.as_slice()
    }

    pub fn biases_mut(&mut self) -> &mut [i16] {
        self.biases.as_mut_slice()
    }

    /// Por coluna: os `HALF_DIMENSIONS` pesos da feature `i` começam em
    /// `i * HALF_DIMENSIONS`.
    pub fn weights(&self) -> &[i16] {
        self.weights.as_slice()
    }

    pub fn weights_mut(&mut self) -> &mut [i16] {
        self.weights.as_mut_slice()
    }

    fn column(&self, feature: FeatureIndex) -> &[i16] {
        let index = feature as usize;
        assert!(
            index < INPUT_DIMENSIONS,
            "feature {feature} out of range (input dimensions {INPUT_DIMENSIONS})"
        );
        let offset = index * HALF_DIMENSIONS;
        &self.weights.as_slice()[offset..offset + HALF_DIMENSIONS]
    }

    /// Acumulação do nó atual calculada a partir das features ativas.
    fn compute_accumulation<P: Position>(&self, position: &P) -> [Vec<i16>; 2] {
        let mut features = Vec::with_capacity(32);
        Color::ALL.map(|perspective| {
            let mut acc = self.biases.as_slice().to_vec();
            features.clear();
            position.active_features(perspective, &mut features);
            for &feature in &features {
                add_column(&mut acc, self.column(feature));
            }
            acc
        })
    }
}

impl Default for FeatureTransformer {
    fn default() -> Self {
        Self::new()
    }
}

fn add_column(acc: &mut [i16], column: &[i16]) {
    for (a, w) in acc.iter_mut().zip(column) {
        *a = a.wrapping_add(*w);
    }
}

fn sub_column(acc: &mut [i16], column: &[i16]) {
    for (a, w) in acc.iter_mut().zip(column) {
        *a = a.wrapping_sub(*w);
    }
}

impl ParameterModule for FeatureTransformer {
    fn structural_hash(&self) -> u32 {
        Self::HASH_VALUE
    }

    fn structure_description(&self) -> String {
        format!("PieceSquare[{}->{}x2]", INPUT_DIMENSIONS, HALF_DIMENSIONS)
    }

    fn read_parameters(&mut self, cursor: &mut ReadCursor<'_>) -> EvalResult<()> {
        cursor.read_i16_into(self.biases.as_mut_slice())?;
        cursor.read_i16_into(self.weights.as_mut_slice())?;
        Ok(())
    }

    fn write_parameters(&self, cursor: &mut WriteCursor<'_>) -> EvalResult<()> {
        cursor.write_i16_slice(self.biases.as_slice())?;
        cursor.write_i16_slice(self.weights.as_slice())?;
        Ok(())
    }
}

impl TransformStage for FeatureTransformer {
    const HASH_VALUE: u32 = FEATURE_SET_HASH ^ (HALF_DIMENSIONS * 2) as u32;
    const OUTPUT_DIMENSIONS: usize = HALF_DIMENSIONS * 2;

    fn transform<P: Position>(&self, position: &mut P, output: &mut [u8], refresh: bool) {
        if refresh || !self.update_accumulator_if_possible(position) {
            let accumulation = self.compute_accumulation(position);
            position
                .states_mut()
                .current_mut()
                .cache_mut()
                .set_accumulation(accumulation);
        }

        let stm = position.side_to_move();
        let Some(accumulation) = position.states().current().cache().accumulation() else {
            return;
        };
        for (half, perspective) in [stm, stm.flip()].into_iter().enumerate() {
            let offset = half * HALF_DIMENSIONS;
            for (out, &acc) in output[offset..offset + HALF_DIMENSIONS]
                .iter_mut()
                .zip(&accumulation[perspective.index()])
            {
                *out = acc.clamp(0, 127) as u8;
            }
        }
    }

    fn update_accumulator_if_possible<P: Position>(&self, position: &mut P) -> bool {
        let states = position.states_mut();
        let Some(source) = states.nearest_computed() else {
            return false;
        };

        for index in source + 1..states.len() {
            let Some(mut accumulation) = states
                .node(index - 1)
                .and_then(|node| node.cache().accumulation().cloned())
            else {
                return false;
            };
            let Some(node) = states.node_mut(index) else {
                return false;
            };
            if let StateChange::Incremental(delta) = node.change() {
                for perspective in Color::ALL {
                    let acc = &mut accumulation[perspective.index()];
                    for &feature in delta.removed(perspective) {
                        sub_column(acc, self.column(feature));
                    }
                    for &feature in delta.added(perspective) {
                        add_column(acc, self.column(feature));
                    }
                }
            }
            node.cache_mut().set_accumulation(accumulation);
        }
        true
    }
}
