//! Contêiner de parâmetros versionado e marcado por hash.
//!
//! ```text
//! u32 format_version
//! u32 model_hash
//! u32 arch_len
//! u8  architecture[arch_len]
//! u32 transform_hash     transform parameters ...
//! u32 propagation_hash   propagation parameters ...
//! <end of stream>
//! ```
//!
//! Arquivos são aceitos por inteiro ou não são aceitos.

use std::io::{Read, Write};

use serde::Serialize;

use crate::codec::{BinaryCursor, ReadCursor, WriteCursor};
use crate::{EvalError, EvalResult};

use super::feature_transformer::FeatureTransformer;
use super::module::{ParameterModule, PropagationStage, TransformStage};
use super::network::Network;

/// Única versão de formato que este build lê ou grava.
pub const NNUE_VERSION: u32 = 0x7AF3_2F16;

/// Campos iniciais de um arquivo de contêiner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub format_version: u32,
    pub model_hash: u32,
    pub architecture: String,
}

impl FileHeader {
    /// Lê o cabeçalho, rejeitando versão desconhecida antes de qualquer outra coisa.
    pub fn read<S: Read>(cursor: &mut BinaryCursor<S>) -> EvalResult<Self> {
        let format_version = cursor.read_u32()?;
        if format_version != NNUE_VERSION {
            return Err(EvalError::VersionMismatch {
                expected: NNUE_VERSION,
                found: format_version,
            });
        }
        let model_hash = cursor.read_u32()?;
        let len = cursor.read_u32()? as usize;
        let architecture = String::from_utf8_lossy(&cursor.read_bytes(len)?).into_owned();

        Ok(Self {
            format_version,
            model_hash,
            architecture,
        })
    }

    pub fn write<S: Write>(&self, cursor: &mut BinaryCursor<S>) -> EvalResult<()> {
        let len = u32::try_from(self.architecture.len())
            .map_err(|_| EvalError::other("architecture string longer than u32::MAX"))?;
        cursor.write_u32(self.format_version)?;
        cursor.write_u32(self.model_hash)?;
        cursor.write_u32(len)?;
        cursor.write_bytes(self.architecture.as_bytes())
    }
}

/// Progresso de uma leitura; toda falha para no estado alcançado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    Empty,
    HeaderRead,
    ModulesRead,
    Validated,
}

/// Um estágio de transformação e um de propagação, nessa ordem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelContainer<T = FeatureTransformer, P = Network> {
    transformer: T,
    network: P,
}

impl<T: TransformStage, P: PropagationStage> ModelContainer<T, P> {
    /// `model_hash` esperado para este par de estágios.
    pub const MODEL_HASH: u32 = T::HASH_VALUE ^ P::HASH_VALUE;

    /// Estágios zerados.
    pub fn new() -> Self {
        Self::from_stages(T::default(), P::default())
    }

    pub fn from_stages(transformer: T, network: P) -> Self {
        Self {
            transformer,
            network,
        }
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    pub fn transformer_mut(&mut self) -> &mut T {
        &mut self.transformer
    }

    pub fn network(&self) -> &P {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut P {
        &mut self.network
    }

    /// Estágios na ordem do arquivo.
    pub fn modules(&self) -> [&dyn ParameterModule; 2] {
        [&self.transformer, &self.network]
    }

    fn modules_mut(&mut self) -> [&mut dyn ParameterModule; 2] {
        [&mut self.transformer, &mut self.network]
    }

    /// String de arquitetura gravada no cabeçalho.
    pub fn architecture(&self) -> String {
        format!(
            "Features={},Network={}",
            self.transformer.structure_description(),
            self.network.structure_description()
        )
    }

    pub fn header(&self) -> FileHeader {
        FileHeader {
            format_version: NNUE_VERSION,
            model_hash: Self::MODEL_HASH,
            architecture: self.architecture(),
        }
    }

    /// Lê um arquivo completo em estágios recém-zerados.
    pub fn read<R: Read>(reader: R) -> EvalResult<Self> {
        let mut container = Self::new();
        container.read_parameters(reader)?;
        Ok(container)
    }

    /// Lê um arquivo completo nos estágios deste contêiner.
    ///
    /// Em caso de falha os estágios podem ficar com parâmetros lidos pela
    /// metade; quem quer tudo ou nada usa [`ModelContainer::read`].
    pub fn read_parameters<R: Read>(&mut self, mut reader: R) -> EvalResult<FileHeader> {
        let mut cursor = ReadCursor::new(&mut reader);
        let mut state = ReadState::Empty;

        let result = self.read_states(&mut cursor, &mut state);
        match &result {
            Ok(_) => tracing::debug!(bytes = cursor.position(), "model container validated"),
            Err(e) => tracing::debug!(?state, bytes = cursor.position(), error = %e, "model container rejected"),
        }
        result
    }

    fn read_states(
        &mut self,
        cursor: &mut ReadCursor<'_>,
        state: &mut ReadState,
    ) -> EvalResult<FileHeader> {
        let header = FileHeader::read(cursor)?;
        if header.model_hash != Self::MODEL_HASH {
            return Err(EvalError::HashMismatch {
                expected: Self::MODEL_HASH,
                found: header.model_hash,
            });
        }
        *state = ReadState::HeaderRead;

        for module in self.modules_mut() {
            let expected = module.structural_hash();
            let found = cursor.read_u32()?;
            if found != expected {
                return Err(EvalError::ModuleHashMismatch {
                    module: module.structure_description(),
                    expected,
                    found,
                });
            }
            module.read_parameters(cursor)?;
        }
        *state = ReadState::ModulesRead;

        if !cursor.is_exhausted()? {
            return Err(EvalError::TrailingOrTruncatedData);
        }
        *state = ReadState::Validated;
        Ok(header)
    }

    /// Grava o arquivo completo: cabeçalho, depois cada estágio após o seu hash.
    pub fn write_parameters<W: Write>(&self, mut writer: W) -> EvalResult<()> {
        let mut cursor = WriteCursor::new(&mut writer);

        self.header().write(&mut cursor)?;
        for module in self.modules() {
            cursor.write_u32(module.structural_hash())?;
            module.write_parameters(&mut cursor)?;
        }
        cursor.flush()?;

        tracing::debug!(bytes = cursor.position(), "model container written");
        Ok(())
    }
}

impl<T: TransformStage, P: PropagationStage> Default for ModelContainer<T, P> {
    fn default() -> Self {
        Self::new()
    }
}
