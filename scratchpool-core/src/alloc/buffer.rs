//! ## scratchpool-core::alloc::buffer
//! **Owned byte regions and per-category handles**
//!
//! A [`Buffer`] is a plain owned allocation. The pool never hands one out
//! directly: callers receive a [`Scratch<K>`] whose marker kind names the
//! category the buffer belongs to, so releasing a key-scratch buffer into the
//! signature-scratch cache does not type-check.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};

/// The three buffer categories managed by a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Multi-scalar-multiplication scratch space for public keys.
    KeyScratch,
    /// Multi-scalar-multiplication scratch space for signatures.
    SigScratch,
    /// Pairing accumulator, independent of batch size.
    PairingBuffer,
}

impl Category {
    /// Every category, in a stable order.
    pub const ALL: [Category; 3] = [
        Category::KeyScratch,
        Category::SigScratch,
        Category::PairingBuffer,
    ];

    /// Snake-case label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::KeyScratch => "key_scratch",
            Category::SigScratch => "sig_scratch",
            Category::PairingBuffer => "pairing_buffer",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contiguous owned memory handed out by a [`BackingAllocator`](super::backing::BackingAllocator).
pub struct Buffer {
    bytes: Box<[u8]>,
}

impl Buffer {
    /// Wraps an existing boxed slice.
    pub fn from_boxed(bytes: Box<[u8]>) -> Self {
        Self { bytes }
    }

    /// Allocates a zero-filled buffer of `len` bytes on the global heap.
    pub fn zeroed(len: usize) -> Self {
        Self::from_boxed(vec![0u8; len].into_boxed_slice())
    }

    /// Gives the underlying allocation back to the caller.
    pub fn into_boxed(self) -> Box<[u8]> {
        self.bytes
    }
}

impl Deref for Buffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for Buffer {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl fmt::Debug for Buffer {
    // Contents may hold intermediate secret-dependent values; only print the length.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer").field("len", &self.bytes.len()).finish()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Marker trait tying a handle type to one [`Category`].
///
/// Sealed: the three kinds below are the only implementors.
pub trait Kind: sealed::Sealed + fmt::Debug + 'static {
    /// Category whose cache accepts handles of this kind.
    const CATEGORY: Category;
}

/// Marker for key-scratch handles.
#[derive(Debug)]
pub enum KeyKind {}

/// Marker for signature-scratch handles.
#[derive(Debug)]
pub enum SigKind {}

/// Marker for pairing-buffer handles.
#[derive(Debug)]
pub enum PairingKind {}

impl sealed::Sealed for KeyKind {}
impl sealed::Sealed for SigKind {}
impl sealed::Sealed for PairingKind {}

impl Kind for KeyKind {
    const CATEGORY: Category = Category::KeyScratch;
}

impl Kind for SigKind {
    const CATEGORY: Category = Category::SigScratch;
}

impl Kind for PairingKind {
    const CATEGORY: Category = Category::PairingBuffer;
}

/// Exclusively owned buffer tagged with its category.
pub struct Scratch<K: Kind> {
    buffer: Buffer,
    // fn() -> K keeps the handle Send + Sync regardless of the marker.
    _kind: PhantomData<fn() -> K>,
}

/// Handle returned by `acquire_key_scratch`.
pub type KeyScratch = Scratch<KeyKind>;
/// Handle returned by `acquire_sig_scratch`.
pub type SigScratch = Scratch<SigKind>;
/// Handle returned by `acquire_pairing_buffer`.
pub type PairingBuffer = Scratch<PairingKind>;

impl<K: Kind> Scratch<K> {
    /// Tags a raw buffer with this kind.
    ///
    /// The length is not checked here. A pool validates it on release and
    /// rejects buffers that do not match its element size.
    pub fn from_buffer(buffer: Buffer) -> Self {
        Self {
            buffer,
            _kind: PhantomData,
        }
    }

    /// Category this handle belongs to.
    #[inline]
    pub fn category(&self) -> Category {
        K::CATEGORY
    }

    /// Strips the category tag.
    pub fn into_buffer(self) -> Buffer {
        self.buffer
    }
}

impl<K: Kind> Deref for Scratch<K> {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.buffer
    }
}

impl<K: Kind> DerefMut for Scratch<K> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }
}

impl<K: Kind> fmt::Debug for Scratch<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scratch")
            .field("category", &K::CATEGORY)
            .field("len", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels() {
        let labels: Vec<String> = Category::ALL.iter().map(|c| c.to_string()).collect();
        assert_eq!(labels, ["key_scratch", "sig_scratch", "pairing_buffer"]);
    }

    #[test]
    fn handle_reports_its_category() {
        let key = KeyScratch::from_buffer(Buffer::zeroed(8));
        let pairing = PairingBuffer::from_buffer(Buffer::zeroed(8));
        assert_eq!(key.category(), Category::KeyScratch);
        assert_eq!(pairing.category(), Category::PairingBuffer);
    }

    #[test]
    fn handle_is_writable_and_keeps_length() {
        let mut sig = SigScratch::from_buffer(Buffer::zeroed(16));
        sig[..4].copy_from_slice(&[1, 2, 3, 4]);
        let buffer = sig.into_buffer();
        assert_eq!(buffer.len(), 16);
        assert_eq!(&buffer[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn debug_output_hides_contents() {
        let mut buffer = Buffer::zeroed(4);
        buffer.copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        let rendered = format!("{:?}", KeyScratch::from_buffer(buffer));
        assert_eq!(rendered, "Scratch { category: KeyScratch, len: 4 }");
    }

    #[test]
    fn handles_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeyScratch>();
        assert_send_sync::<SigScratch>();
        assert_send_sync::<PairingBuffer>();
    }
}
