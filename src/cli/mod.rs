//! Interface de linha de comando do nnue-eval.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// nnue-eval - inspeciona, verifica e exporta arquivos de parâmetros NNUE.
#[derive(Parser, Debug)]
#[command(name = "nnue-eval")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Arquivo de configuração.
    #[arg(short, long, default_value = "nnue.toml")]
    pub config: PathBuf,

    /// Modo verbose.
    #[arg(short, long)]
    pub verbose: bool,

    /// Modo silencioso.
    #[arg(short, long)]
    pub quiet: bool,

    /// Comando a executar.
    #[command(subcommand)]
    pub command: Commands,
}

/// Comandos disponíveis.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inicializa configuração no diretório indicado.
    Init {
        /// Diretório de destino (padrão: diretório atual).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Mostra o cabeçalho de um arquivo de parâmetros.
    Inspect {
        /// Arquivo de parâmetros.
        file: PathBuf,

        /// Saída em JSON.
        #[arg(long)]
        json: bool,
    },

    /// Carrega um arquivo de parâmetros e informa se foi aceito.
    Verify {
        /// Arquivo de parâmetros (padrão: `eval.eval_file` da configuração).
        file: Option<PathBuf>,
    },

    /// Grava parâmetros no formato atual.
    Export {
        /// Arquivo a reexportar (padrão: parâmetros zerados).
        #[arg(long)]
        from: Option<PathBuf>,

        /// Destino (padrão: `eval.save_file` da configuração).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mostra a versão.
    Version,
}
