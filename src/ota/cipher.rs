//! # Firmware Cipher
//!
//! AES-256-CBC with PKCS7 padding over opaque firmware payloads.
//!
//! Artifact layout:
//! ```text
//! +---------+-------------------------------+
//! | IV (16) | ciphertext (N × 16, N ≥ 1)    |
//! +---------+-------------------------------+
//! ```
//!
//! Decryption checks only that the final pad byte lies in `1..=16`; the
//! remaining pad bytes are stripped without inspection. Artifacts produced
//! by earlier tooling depend on this.

use aes::Aes256;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{EnergyNodeError, Result};

/// AES block and IV size in bytes
pub const BLOCK_SIZE: usize = 16;

/// AES-256 key size in bytes
pub const KEY_SIZE: usize = 32;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// 32-byte firmware key, wiped on drop and never printed
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct FirmwareKey([u8; KEY_SIZE]);

impl FirmwareKey {
    /// # Errors
    ///
    /// Returns `KeyLength` unless `bytes` is exactly 32 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| EnergyNodeError::KeyLength(bytes.len()))?;
        Ok(Self(key))
    }
}

impl std::fmt::Debug for FirmwareKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FirmwareKey(<redacted>)")
    }
}

/// Symmetric cipher bound to one process-wide key
#[derive(Debug, Clone)]
pub struct FirmwareCipher {
    key: FirmwareKey,
}

impl FirmwareCipher {
    /// # Errors
    ///
    /// Returns `KeyLength` if `key` is not 32 bytes
    pub fn new(key: &[u8]) -> Result<Self> {
        Ok(Self { key: FirmwareKey::from_slice(key)? })
    }

    /// Encrypt under a fresh random IV, returning `IV || ciphertext`
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; BLOCK_SIZE];
        OsRng.fill_bytes(&mut iv);
        self.encrypt_with_iv(plaintext, &iv)
    }

    fn encrypt_with_iv(&self, plaintext: &[u8], iv: &[u8; BLOCK_SIZE]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(BLOCK_SIZE + plaintext.len() + BLOCK_SIZE);
        buf.extend_from_slice(iv);
        buf.extend_from_slice(plaintext);
        pkcs7_pad(&mut buf, plaintext.len());

        let mut encryptor = Aes256CbcEnc::new(
            GenericArray::from_slice(&self.key.0),
            GenericArray::from_slice(iv),
        );
        for block in buf[BLOCK_SIZE..].chunks_exact_mut(BLOCK_SIZE) {
            encryptor.encrypt_block_mut(GenericArray::from_mut_slice(block));
        }
        buf
    }

    /// Decrypt an `IV || ciphertext` artifact and strip its padding
    ///
    /// # Errors
    ///
    /// - `MalformedArtifact` if the blob is shorter than IV plus one block or
    ///   the ciphertext is not block aligned
    /// - `InvalidPadding` if the last decrypted byte is outside `1..=16`
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() < 2 * BLOCK_SIZE || (blob.len() - BLOCK_SIZE) % BLOCK_SIZE != 0 {
            return Err(EnergyNodeError::MalformedArtifact(blob.len()));
        }

        let (iv, ciphertext) = blob.split_at(BLOCK_SIZE);
        let mut plaintext = ciphertext.to_vec();

        let mut decryptor = Aes256CbcDec::new(
            GenericArray::from_slice(&self.key.0),
            GenericArray::from_slice(iv),
        );
        for block in plaintext.chunks_exact_mut(BLOCK_SIZE) {
            decryptor.decrypt_block_mut(GenericArray::from_mut_slice(block));
        }

        let pad_len = pkcs7_pad_len(&plaintext)?;
        plaintext.truncate(plaintext.len() - pad_len);
        Ok(plaintext)
    }
}

/// Append PKCS7 padding for a message of `message_len` bytes
///
/// Always appends 1..=16 bytes, a full block when the message is already aligned.
fn pkcs7_pad(buf: &mut Vec<u8>, message_len: usize) {
    let pad_len = BLOCK_SIZE - message_len % BLOCK_SIZE;
    buf.resize(buf.len() + pad_len, pad_len as u8);
}

fn pkcs7_pad_len(padded: &[u8]) -> Result<usize> {
    let pad = padded.last().copied().unwrap_or(0);
    if pad == 0 || pad as usize > BLOCK_SIZE {
        return Err(EnergyNodeError::InvalidPadding(pad));
    }
    Ok(pad as usize)
}
