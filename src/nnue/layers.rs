//! Blocos de construção da rede de propagação.

use crate::codec::{AlignedBuffer, ReadCursor, WriteCursor};
use crate::EvalResult;

/// Shift de ponto fixo aplicado entre camadas.
pub const WEIGHT_SCALE_BITS: u32 = 6;

/// Contribuição para o hash da fatia de features entregue à primeira camada.
pub const fn input_slice_hash(output_dimensions: usize, offset: usize) -> u32 {
    0xEC42_E90D ^ (output_dimensions as u32) ^ ((offset as u32) << 10)
}

pub const fn clipped_relu_hash(previous: u32) -> u32 {
    0x538D_24C7u32.wrapping_add(previous)
}

/// Pré-ativações `i32` para ativações `u8` em `0..=127`.
pub fn clipped_relu(input: &[i32], output: &mut [u8]) {
    for (out, &x) in output.iter_mut().zip(input) {
        *out = (x >> WEIGHT_SCALE_BITS).clamp(0, 127) as u8;
    }
}

/// Camada totalmente conectada com biases `i32` e pesos `i8` por linha.
///
/// Somas dão a volta em overflow, como no acumulador do transformador.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffineLayer {
    input_dimensions: usize,
    output_dimensions: usize,
    biases: AlignedBuffer<i32>,
    weights: AlignedBuffer<i8>,
}

impl AffineLayer {
    pub fn new(input_dimensions: usize, output_dimensions: usize) -> Self {
        Self {
            input_dimensions,
            output_dimensions,
            biases: AlignedBuffer::zeroed(output_dimensions),
            weights: AlignedBuffer::zeroed(input_dimensions * output_dimensions),
        }
    }

    pub const fn hash(output_dimensions: usize, previous: u32) -> u32 {
        let mut hash = 0xCC03_DAE4u32.wrapping_add(output_dimensions as u32);
        hash ^= previous >> 1;
        hash ^= previous << 31;
        hash
    }

    pub fn description(&self, input: &str) -> String {
        format!(
            "AffineTransform[{}<-{}]({})",
            self.output_dimensions, self.input_dimensions, input
        )
    }

    pub fn input_dimensions(&self) -> usize {
        self.input_dimensions
    }

    pub fn output_dimensions(&self) -> usize {
        self.output_dimensions
    }

    pub fn biases_mut(&mut self) -> &mut [i32] {
        self.biases.as_mut_slice()
    }

    pub fn weights_mut(&mut self) -> &mut [i8] {
        self.weights.as_mut_slice()
    }

    pub fn propagate(&self, input: &[u8], output: &mut [i32]) {
        let weights = self.weights.as_slice();
        for (i, (out, &bias)) in output.iter_mut().zip(self.biases.as_slice()).enumerate() {
            let row = &weights[i * self.input_dimensions..(i + 1) * self.input_dimensions];
            *out = row
                .iter()
                .zip(input)
                .fold(bias, |sum, (&w, &x)| sum.wrapping_add(i32::from(w) * i32::from(x)));
        }
    }

    pub fn read_parameters(&mut self, cursor: &mut ReadCursor<'_>) -> EvalResult<()> {
        cursor.read_i32_into(self.biases.as_mut_slice())?;
        cursor.read_i8_into(self.weights.as_mut_slice())?;
        Ok(())
    }

    pub fn write_parameters(&self, cursor: &mut WriteCursor<'_>) -> EvalResult<()> {
        cursor.write_i32_slice(self.biases.as_slice())?;
        cursor.write_i8_slice(self.weights.as_slice())?;
        Ok(())
    }
}
