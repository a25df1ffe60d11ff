//! Serviço de avaliação: dono do modelo carregado, responde às consultas de score.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::nnue::{FeatureTransformer, ModelContainer, Network, PropagationStage, TransformStage};
use crate::types::config::EvalConfig;
use crate::{EvalError, EvalResult};

use super::accumulator::{Position, Value};

/// Divisor da saída bruta da rede para unidades de avaliação.
pub const FV_SCALE: i32 = 16;

// Generations start at 1; a new StateHistory is at 0.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Modelo carregado mais os pontos de consulta usados pela busca.
///
/// Consultas recebem `&self`, então um serviço pode ser compartilhado por
/// qualquer número de threads de busca, cada uma com a sua posição. O
/// carregamento recebe `&mut self` e portanto não se sobrepõe a consultas.
///
/// Cada modelo instalado recebe uma geração nova. A primeira consulta sob
/// uma geração nova invalida o histórico inteiro da posição, então nenhum
/// score ou acumulação do modelo anterior é reaproveitado.
///
/// Consultar antes de um [`load`](Self::load) bem-sucedido é erro do
/// chamador: não é verificado e produz scores de parâmetros zerados.
pub struct EvaluationService<T = FeatureTransformer, P = Network> {
    config: EvalConfig,
    model: ModelContainer<T, P>,
    source: Option<PathBuf>,
    generation: u64,
}

impl<T: TransformStage, P: PropagationStage> EvaluationService<T, P> {
    /// Cria um serviço com estágios zerados e nada carregado.
    pub fn new(config: EvalConfig) -> Self {
        Self::with_model(config, ModelContainer::new())
    }

    /// Cria um serviço em torno de um modelo já preenchido.
    pub fn with_model(config: EvalConfig, model: ModelContainer<T, P>) -> Self {
        Self {
            config,
            model,
            source: None,
            generation: next_generation(),
        }
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    pub fn model(&self) -> &ModelContainer<T, P> {
        &self.model
    }

    /// Arquivo de onde os parâmetros atuais foram lidos.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Geração do modelo atual; muda a cada chamada de `load`.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Carrega o `eval_file` configurado.
    pub fn load_default(&mut self) -> bool {
        let path = self.config.eval_file.clone();
        self.load(path)
    }

    /// Substitui o modelo pelo que está guardado em `source`.
    ///
    /// Retorna false em qualquer falha; o motivo vai para o log. Depois de
    /// uma falha o serviço fica com estágios zerados e sem origem. Com
    /// `skip_loading_eval` nada é aberto e true é retornado.
    pub fn load<S: AsRef<Path>>(&mut self, source: S) -> bool {
        let source = source.as_ref();
        self.model = ModelContainer::new();
        self.source = None;
        self.generation = next_generation();

        if self.config.skip_loading_eval {
            tracing::warn!("skip_loading_eval set to true, net not loaded");
            return true;
        }

        match Self::read_source(source) {
            Ok(model) => {
                self.model = model;
                self.source = Some(source.to_path_buf());
                tracing::info!(
                    path = %source.display(),
                    hash = format_args!("{:#010x}", ModelContainer::<T, P>::MODEL_HASH),
                    generation = self.generation,
                    "evaluation parameters loaded"
                );
                true
            }
            Err(e) => {
                tracing::error!(path = %source.display(), error = %e, "failed to load evaluation parameters");
                false
            }
        }
    }

    fn read_source(source: &Path) -> EvalResult<ModelContainer<T, P>> {
        let file = File::open(source).map_err(|e| EvalError::ResourceUnavailable {
            source_id: source.display().to_string(),
            reason: e.to_string(),
        })?;
        ModelContainer::read(BufReader::new(file))
    }

    /// Grava os parâmetros atuais em `dest`. Retorna false em caso de falha.
    pub fn save<S: AsRef<Path>>(&self, dest: S) -> bool {
        let dest = dest.as_ref();
        match self.write_dest(dest) {
            Ok(()) => {
                tracing::info!(path = %dest.display(), "evaluation parameters saved");
                true
            }
            Err(e) => {
                tracing::error!(path = %dest.display(), error = %e, "failed to save evaluation parameters");
                false
            }
        }
    }

    fn write_dest(&self, dest: &Path) -> EvalResult<()> {
        let file = File::create(dest).map_err(|e| EvalError::ResourceUnavailable {
            source_id: dest.display().to_string(),
            reason: e.to_string(),
        })?;
        self.model.write_parameters(BufWriter::new(file))
    }

    /// Score do nó atual, reaproveitando o valor em cache quando válido.
    pub fn evaluate<Pos: Position>(&self, position: &mut Pos) -> Value {
        self.compute_score(position, false)
    }

    /// Score do nó atual, recalculado do zero.
    pub fn compute_full<Pos: Position>(&self, position: &mut Pos) -> Value {
        self.compute_score(position, true)
    }

    /// Atualiza a acumulação do nó atual de forma incremental, se possível.
    pub fn notify_position_changed<Pos: Position>(&self, position: &mut Pos) {
        self.adopt_model(position);
        self.model.transformer().update_accumulator_if_possible(position);
    }

    fn adopt_model<Pos: Position>(&self, position: &mut Pos) {
        if position.states_mut().adopt_generation(self.generation) {
            tracing::trace!(generation = self.generation, "state history invalidated for new model");
        }
    }

    fn compute_score<Pos: Position>(&self, position: &mut Pos, refresh: bool) -> Value {
        self.adopt_model(position);

        if !refresh {
            if let Some(score) = position.states().current().cache().score() {
                return score;
            }
        }

        let mut transformed = vec![0u8; T::OUTPUT_DIMENSIONS];
        self.model
            .transformer()
            .transform(position, &mut transformed, refresh);
        let score = self.model.network().propagate(&transformed) / FV_SCALE;

        position
            .states_mut()
            .current_mut()
            .cache_mut()
            .store_score(score);
        score
    }
}
