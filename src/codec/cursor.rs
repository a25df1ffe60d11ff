//! Cursor little-endian sobre um stream de bytes.

use std::io::{ErrorKind, Read, Write};

use crate::{EvalError, EvalResult};

/// Capacidade inicial máxima de `read_bytes`; um prefixo de tamanho
/// corrompido não força uma alocação enorme antes do stream acabar.
const READ_CHUNK: usize = 64 * 1024;

/// Leituras e escritas little-endian, em ordem, sobre um stream.
///
/// Não conhece o formato do contêiner. Leituras que passam do fim do
/// stream falham com [`EvalError::TruncatedInput`] e nunca devolvem um
/// valor parcial.
pub struct BinaryCursor<S> {
    stream: S,
    position: u64,
}

/// Cursor sobre um leitor com tipo apagado, como entregue aos módulos.
pub type ReadCursor<'a> = BinaryCursor<&'a mut dyn Read>;

/// Cursor sobre um escritor com tipo apagado, como entregue aos módulos.
pub type WriteCursor<'a> = BinaryCursor<&'a mut dyn Write>;

impl<S> BinaryCursor<S> {
    /// Envolve um stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            position: 0,
        }
    }

    /// Bytes consumidos ou produzidos até agora.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Devolve o stream envolvido.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S: Read> BinaryCursor<S> {
    /// Preenche `buf` por inteiro ou falha sem consumir um valor.
    fn fill(&mut self, buf: &mut [u8]) -> EvalResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(EvalError::TruncatedInput {
                        needed: buf.len() - filled,
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.position += buf.len() as u64;
        Ok(())
    }

    pub fn read_u32(&mut self) -> EvalResult<u32> {
        let mut buf = [0u8; 4];
        self.fill(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Lê exatamente `n` bytes crus.
    pub fn read_bytes(&mut self, n: usize) -> EvalResult<Vec<u8>> {
        let mut out = Vec::with_capacity(n.min(READ_CHUNK));
        let mut chunk = [0u8; 4096];
        while out.len() < n {
            let want = (n - out.len()).min(chunk.len());
            match self.fill(&mut chunk[..want]) {
                Ok(()) => {}
                Err(EvalError::TruncatedInput { needed }) => {
                    return Err(EvalError::TruncatedInput {
                        needed: n - out.len() - (want - needed),
                    })
                }
                Err(e) => return Err(e),
            }
            out.extend_from_slice(&chunk[..want]);
        }
        Ok(out)
    }

    /// Lê `out.len()` valores `i16` little-endian.
    pub fn read_i16_into(&mut self, out: &mut [i16]) -> EvalResult<()> {
        let mut buf = [0u8; 2];
        for value in out.iter_mut() {
            self.fill(&mut buf)?;
            *value = i16::from_le_bytes(buf);
        }
        Ok(())
    }

    /// Lê `out.len()` valores `i32` little-endian.
    pub fn read_i32_into(&mut self, out: &mut [i32]) -> EvalResult<()> {
        let mut buf = [0u8; 4];
        for value in out.iter_mut() {
            self.fill(&mut buf)?;
            *value = i32::from_le_bytes(buf);
        }
        Ok(())
    }

    /// Lê `out.len()` bytes com sinal.
    pub fn read_i8_into(&mut self, out: &mut [i8]) -> EvalResult<()> {
        let mut buf = [0u8; 1];
        for value in out.iter_mut() {
            self.fill(&mut buf)?;
            *value = i8::from_le_bytes(buf);
        }
        Ok(())
    }

    /// Verifica se o stream não tem mais bytes.
    ///
    /// Consome um byte se houver; só faz sentido como última verificação.
    pub fn is_exhausted(&mut self) -> EvalResult<bool> {
        let mut probe = [0u8; 1];
        loop {
            match self.stream.read(&mut probe) {
                Ok(0) => return Ok(true),
                Ok(_) => return Ok(false),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<S: Write> BinaryCursor<S> {
    fn put(&mut self, bytes: &[u8]) -> EvalResult<()> {
        self.stream.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> EvalResult<()> {
        self.put(&value.to_le_bytes())
    }

    pub fn write_bytes(&mut self, buf: &[u8]) -> EvalResult<()> {
        self.put(buf)
    }

    pub fn write_i16_slice(&mut self, values: &[i16]) -> EvalResult<()> {
        for value in values {
            self.put(&value.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn write_i32_slice(&mut self, values: &[i32]) -> EvalResult<()> {
        for value in values {
            self.put(&value.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn write_i8_slice(&mut self, values: &[i8]) -> EvalResult<()> {
        for value in values {
            self.put(&value.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> EvalResult<()> {
        self.stream.flush()?;
        Ok(())
    }
}
