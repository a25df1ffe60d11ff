//! Traits de capacidade comuns a todo estágio com parâmetros.

use crate::codec::{ReadCursor, WriteCursor};
use crate::eval::Position;
use crate::EvalResult;

/// Estágio de cálculo com um bloco de parâmetros serializável.
///
/// O contêiner percorre os estágios por este trait, então ele precisa ser
/// object safe. Um estágio recém-construído está zerado.
pub trait ParameterModule: Send + Sync {
    /// Constante de compilação que identifica layout e algoritmo do estágio.
    fn structural_hash(&self) -> u32;

    /// Rótulo legível; não afeta a leitura.
    fn structure_description(&self) -> String;

    /// Lê exatamente os bytes que `write_parameters` produz.
    fn read_parameters(&mut self, cursor: &mut ReadCursor<'_>) -> EvalResult<()>;

    fn write_parameters(&self, cursor: &mut WriteCursor<'_>) -> EvalResult<()>;
}

/// Converte as features da posição na representação intermediária.
pub trait TransformStage: ParameterModule + Default {
    const HASH_VALUE: u32;

    /// Tamanho do buffer que `transform` preenche.
    const OUTPUT_DIMENSIONS: usize;

    /// Escreve em `output` as features transformadas do nó atual.
    ///
    /// Com `refresh` falso o estágio pode partir da acumulação em cache de
    /// um ancestral; com `refresh` verdadeiro recalcula do zero.
    fn transform<P: Position>(&self, position: &mut P, output: &mut [u8], refresh: bool);

    /// Atualiza a acumulação do nó atual quando isso é possível sem refresh
    /// completo. Retorna se ela está calculada.
    fn update_accumulator_if_possible<P: Position>(&self, position: &mut P) -> bool;
}

/// Converte a representação intermediária na saída bruta da rede.
pub trait PropagationStage: ParameterModule + Default {
    const HASH_VALUE: u32;

    fn propagate(&self, transformed: &[u8]) -> i32;
}
