//! Tipos de erro do nnue-eval.

use thiserror::Error;

/// Tipo de resultado padrão do nnue-eval.
pub type EvalResult<T> = Result<T, EvalError>;

/// Erros possíveis ao carregar, gravar ou configurar um modelo.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Versão de formato não suportada {found:#010x} (esperada {expected:#010x})")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("Hash do modelo diverge: arquivo tem {found:#010x}, este build espera {expected:#010x}")]
    HashMismatch { expected: u32, found: u32 },

    #[error("Hash do módulo '{module}' diverge: arquivo tem {found:#010x}, esperado {expected:#010x}")]
    ModuleHashMismatch {
        module: String,
        expected: u32,
        found: u32,
    },

    #[error("Entrada truncada: faltam {needed} byte(s)")]
    TruncatedInput { needed: usize },

    #[error("O stream não termina onde termina o último módulo")]
    TrailingOrTruncatedData,

    #[error("Não foi possível abrir '{source_id}': {reason}")]
    ResourceUnavailable { source_id: String, reason: String },

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl EvalError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
