//! On-disk package formats and the signed-package header.
//!
//! A signed package is laid out as
//!
//! ```text
//! magic[4] | key_size: u32 LE | signature_size: u32 LE | key | signature | payload (zip)
//! ```
//!
//! Both size fields are bounded so a hostile header can never make the reader
//! allocate or seek past what the format allows.

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::error::{PackageError, PackageResult};

/// Magic bytes opening every signed package.
pub const PACKAGE_MAGIC: [u8; 4] = *b"CrWk";

/// Length of the fixed header in bytes.
pub const HEADER_LEN: u64 = 12;

/// Largest accepted embedded public key.
pub const MAX_KEY_SIZE: u32 = 65_536;

/// Largest accepted embedded signature.
pub const MAX_SIGNATURE_SIZE: u32 = 65_536;

/// File extension of signed packages.
pub const SIGNED_EXTENSION: &str = "xpk";

/// File extension of widget archives.
pub const WIDGET_EXTENSION: &str = "wgt";

/// The two package formats, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFormat {
    /// Binary header with embedded key and signature, followed by a zip payload.
    Signed,
    /// Zip archive identified by its `config.xml` descriptor.
    Widget,
}

impl PackageFormat {
    /// Select the format from a path's extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            SIGNED_EXTENSION => Some(Self::Signed),
            WIDGET_EXTENSION => Some(Self::Widget),
            _ => None,
        }
    }

    /// The canonical extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Signed => SIGNED_EXTENSION,
            Self::Widget => WIDGET_EXTENSION,
        }
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed => write!(f, "signed"),
            Self::Widget => write!(f, "widget"),
        }
    }
}

/// Decoded fixed header of a signed package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedHeader {
    /// Length of the embedded public key.
    pub key_size: u32,
    /// Length of the embedded signature.
    pub signature_size: u32,
}

impl SignedHeader {
    /// Decode and bound-check a header.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::BadMagic`] or [`PackageError::InvalidFieldSize`].
    pub fn parse(bytes: &[u8; 12]) -> PackageResult<Self> {
        let [m0, m1, m2, m3, k0, k1, k2, k3, s0, s1, s2, s3] = *bytes;
        if [m0, m1, m2, m3] != PACKAGE_MAGIC {
            return Err(PackageError::BadMagic);
        }
        let key_size = u32::from_le_bytes([k0, k1, k2, k3]);
        let signature_size = u32::from_le_bytes([s0, s1, s2, s3]);
        check_field("key", key_size, MAX_KEY_SIZE)?;
        check_field("signature", signature_size, MAX_SIGNATURE_SIZE)?;
        Ok(Self {
            key_size,
            signature_size,
        })
    }

    /// Encode the header.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut out = [0u8; 12];
        let (magic, rest) = out.split_at_mut(4);
        magic.copy_from_slice(&PACKAGE_MAGIC);
        let (key, sig) = rest.split_at_mut(4);
        key.copy_from_slice(&self.key_size.to_le_bytes());
        sig.copy_from_slice(&self.signature_size.to_le_bytes());
        out
    }

    /// Offset of the payload from the start of the file.
    #[must_use]
    pub fn payload_offset(&self) -> u64 {
        HEADER_LEN
            .saturating_add(u64::from(self.key_size))
            .saturating_add(u64::from(self.signature_size))
    }
}

fn check_field(field: &'static str, size: u32, max: u32) -> PackageResult<()> {
    if size == 0 || size > max {
        return Err(PackageError::InvalidFieldSize { field, size, max });
    }
    Ok(())
}

/// Header, key and signature read from the front of a signed package.
#[derive(Debug)]
pub(crate) struct SignedEnvelope {
    pub(crate) header: SignedHeader,
    pub(crate) key: Vec<u8>,
    pub(crate) signature: Vec<u8>,
}

/// Read the envelope of a signed package of `file_size` bytes.
///
/// Sizes are validated before any key or signature byte is read, and the
/// file must be long enough to hold both.
pub(crate) fn read_envelope<R: Read>(
    reader: &mut R,
    file_size: u64,
) -> PackageResult<SignedEnvelope> {
    if file_size < HEADER_LEN {
        return Err(PackageError::Truncated {
            size: file_size,
            required: HEADER_LEN,
        });
    }

    let mut raw = [0u8; 12];
    reader.read_exact(&mut raw).map_err(|e| PackageError::Archive {
        message: format!("failed to read header: {e}"),
    })?;
    let header = SignedHeader::parse(&raw)?;

    let required = header.payload_offset();
    if file_size < required {
        return Err(PackageError::Truncated {
            size: file_size,
            required,
        });
    }

    let key = read_field(reader, header.key_size, "key")?;
    let signature = read_field(reader, header.signature_size, "signature")?;
    Ok(SignedEnvelope {
        header,
        key,
        signature,
    })
}

fn read_field<R: Read>(reader: &mut R, size: u32, field: &'static str) -> PackageResult<Vec<u8>> {
    let len = usize::try_from(size).map_err(|_| PackageError::InvalidFieldSize {
        field,
        size,
        max: size,
    })?;
    let mut buf = vec![0u8; len];
    reader
        .read_exact(&mut buf)
        .map_err(|e| PackageError::InvalidCredential {
            field,
            message: e.to_string(),
        })?;
    Ok(buf)
}
