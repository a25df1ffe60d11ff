//! Implementação dos comandos CLI do nnue-eval.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::codec::BinaryCursor;
use crate::eval::EvaluationService;
use crate::nnue::{FileHeader, ModelContainer};
use crate::types::config::Config;
use crate::{EvalError, EvalResult};

/// Inicializa configuração no diretório especificado.
pub fn init(path: Option<PathBuf>) -> EvalResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("nnue.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    Config::default_config().save(&config_path)?;

    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Point eval.eval_file at a parameter file");
    println!("  2. Check it: nnue-eval verify");

    Ok(())
}

/// O que `inspect` relata sobre um arquivo de parâmetros.
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub path: String,
    pub size: usize,
    pub sha256: String,
    pub header: FileHeader,
    /// Se o hash do cabeçalho bate com os estágios compilados neste build.
    pub compatible: bool,
}

/// Lê o cabeçalho e o digest de um arquivo de parâmetros.
pub fn inspect_file(file: &Path) -> EvalResult<InspectReport> {
    let bytes = std::fs::read(file).map_err(|e| EvalError::ResourceUnavailable {
        source_id: file.display().to_string(),
        reason: e.to_string(),
    })?;

    let header = FileHeader::read(&mut BinaryCursor::new(bytes.as_slice()))?;
    let compatible = header.model_hash == <ModelContainer>::MODEL_HASH;

    Ok(InspectReport {
        path: file.display().to_string(),
        size: bytes.len(),
        sha256: hex::encode(Sha256::digest(&bytes)),
        header,
        compatible,
    })
}

/// Mostra o cabeçalho de um arquivo de parâmetros.
pub fn inspect(file: &Path, json: bool) -> EvalResult<()> {
    let report = inspect_file(file)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("File:         {}", report.path);
    println!("Size:         {} bytes", report.size);
    println!("SHA-256:      {}", report.sha256);
    println!("Version:      {:#010x}", report.header.format_version);
    println!("Model hash:   {:#010x}", report.header.model_hash);
    println!("Architecture: {}", report.header.architecture);
    if report.compatible {
        println!("✓ Compatible with this build");
    } else {
        println!(
            "✗ Not compatible with this build (expects {:#010x})",
            <ModelContainer>::MODEL_HASH
        );
    }

    Ok(())
}

/// Carrega um arquivo de parâmetros pelo serviço de avaliação.
pub fn verify(file: Option<PathBuf>, config: &Config) -> EvalResult<()> {
    let mut service: EvaluationService = EvaluationService::new(config.eval.clone());
    let path = file.unwrap_or_else(|| config.eval.eval_file.clone());

    if !service.load(&path) {
        return Err(EvalError::other(format!(
            "Parameter file rejected: {}",
            path.display()
        )));
    }

    if service.is_loaded() {
        println!("✓ {} loaded", path.display());
        println!("  {}", service.model().architecture());
    } else {
        println!("○ Loading skipped (eval.skip_loading_eval = true)");
    }

    Ok(())
}

/// Grava parâmetros no `save_file` configurado ou em `output`.
pub fn export(from: Option<PathBuf>, output: Option<PathBuf>, config: &Config) -> EvalResult<()> {
    let mut eval_config = config.eval.clone();
    eval_config.skip_loading_eval = false;
    let mut service: EvaluationService = EvaluationService::new(eval_config);

    if let Some(source) = &from {
        if !service.load(source) {
            return Err(EvalError::other(format!(
                "Parameter file rejected: {}",
                source.display()
            )));
        }
    }

    let dest = output.unwrap_or_else(|| config.eval.save_file.clone());
    if !service.save(&dest) {
        return Err(EvalError::other(format!("Cannot write {}", dest.display())));
    }

    println!("✓ Parameters written to {}", dest.display());
    Ok(())
}

/// Mostra a versão.
pub fn version() {
    println!("nnue-eval {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("format version {:#010x}", crate::nnue::NNUE_VERSION);
    println!("model hash     {:#010x}", <ModelContainer>::MODEL_HASH);
}
