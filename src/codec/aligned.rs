//! Armazenamento de parâmetros alinhado à linha de cache e zerado.

use std::fmt;
use std::marker::PhantomData;

/// Alinhamento de todo buffer de parâmetros, em bytes.
pub const CACHE_LINE_SIZE: usize = 64;

#[derive(Clone, Copy)]
#[repr(C, align(64))]
struct CacheLine([u8; CACHE_LINE_SIZE]);

const ZERO_LINE: CacheLine = CacheLine([0; CACHE_LINE_SIZE]);

/// Tipos inteiros simples que podem viver num [`AlignedBuffer`].
///
/// # Safety
///
/// Implementações devem aceitar o padrão de bits todo zero, não ter padding
/// e ter alinhamento que divide [`CACHE_LINE_SIZE`].
pub unsafe trait Element: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {}

unsafe impl Element for i8 {}
unsafe impl Element for u8 {}
unsafe impl Element for i16 {}
unsafe impl Element for i32 {}
unsafe impl Element for u32 {}

/// Uma alocação própria, alinhada à linha de cache e zerada na construção.
///
/// Expõe views tipadas em slice; liberada junto com o módulo dono.
pub struct AlignedBuffer<T: Element> {
    lines: Box<[CacheLine]>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> AlignedBuffer<T> {
    /// Aloca `len` elementos zerados.
    pub fn zeroed(len: usize) -> Self {
        let bytes = len * std::mem::size_of::<T>();
        let line_count = bytes.div_ceil(CACHE_LINE_SIZE);
        Self {
            lines: vec![ZERO_LINE; line_count].into_boxed_slice(),
            len,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the allocation holds at least `len * size_of::<T>()` bytes,
        // is 64-byte aligned and every bit pattern is a valid `T`.
        unsafe { std::slice::from_raw_parts(self.lines.as_ptr().cast::<T>(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as in `as_slice`; `&mut self` guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.lines.as_mut_ptr().cast::<T>(), self.len) }
    }

    /// Zera todos os elementos.
    pub fn clear(&mut self) {
        self.lines.fill(ZERO_LINE);
    }
}

impl<T: Element> Clone for AlignedBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            lines: self.lines.clone(),
            len: self.len,
            _marker: PhantomData,
        }
    }
}

impl<T: Element> PartialEq for AlignedBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Element> Eq for AlignedBuffer<T> {}

impl<T: Element> fmt::Debug for AlignedBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlignedBuffer")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.len)
            .finish()
    }
}
