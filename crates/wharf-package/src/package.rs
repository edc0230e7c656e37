//! Reading and verifying packages.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, warn};
use wharf_core::AppId;
use wharf_crypto::{ContentHash, PublicKey, Signature, SignatureAlgorithm, StreamingVerifier};
use wharf_manifest::{MAX_MANIFEST_SIZE, keys};
use zip::ZipArchive;

use crate::error::{PackageError, PackageResult};
use crate::extract::{ExtractionLimits, extract_archive};
use crate::format::{PackageFormat, read_envelope};
use crate::slice::PayloadSlice;

/// External check of a widget's signature chain.
///
/// Widget archives carry their signatures as separate files inside the
/// archive; validating them against a certificate store is a platform concern.
pub trait SignatureChainValidator: Send + Sync + fmt::Debug {
    /// Accept or reject the package at `package_path`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the chain is not trusted.
    fn validate(&self, package_path: &Path) -> Result<(), String>;
}

/// How the id of a widget archive is derived from its descriptor.
#[derive(Debug, Clone, Default)]
pub enum WidgetIdPolicy {
    /// Hash the declared id into a generated id.
    #[default]
    HashDeclaredId,
    /// Use the declared id verbatim once the signature chain is accepted.
    TrustSignatureChain(Arc<dyn SignatureChainValidator>),
}

/// Options for [`Package::open_with`].
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    /// Directory in which extraction directories are created.
    /// Defaults to the system temporary directory.
    pub extract_root: Option<PathBuf>,
    /// Extraction limits.
    pub limits: ExtractionLimits,
    /// Widget id derivation.
    pub widget_id_policy: WidgetIdPolicy,
}

/// A package file and, once extracted, its unpacked tree.
///
/// Opening never fails: a package that does not pass every structural check
/// is reported through [`is_valid`](Self::is_valid) and [`error`](Self::error).
/// The extraction directory is deleted when the package is dropped unless it
/// was [dismissed](Self::dismiss).
#[derive(Debug)]
pub struct Package {
    source_path: PathBuf,
    format: Option<PackageFormat>,
    id: Option<AppId>,
    public_key: Option<PublicKey>,
    payload: (u64, u64),
    error: Option<PackageError>,
    options: PackageOptions,
    extracted: Option<TempDir>,
}

impl Package {
    /// Open a package with default options.
    #[must_use]
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::open_with(path, PackageOptions::default())
    }

    /// Open and verify a package.
    #[must_use]
    pub fn open_with(path: impl AsRef<Path>, options: PackageOptions) -> Self {
        let source_path = path.as_ref().to_path_buf();
        let mut package = Self {
            format: PackageFormat::from_path(&source_path),
            source_path,
            id: None,
            public_key: None,
            payload: (0, 0),
            error: None,
            options,
            extracted: None,
        };

        let result = match package.format {
            Some(PackageFormat::Signed) => package.read_signed(),
            Some(PackageFormat::Widget) => package.read_widget(),
            None => Err(PackageError::UnsupportedFormat {
                path: package.source_path.clone(),
            }),
        };

        match result {
            Ok(()) => debug!(
                path = %package.source_path.display(),
                app_id = ?package.id.as_ref().map(AppId::as_str),
                "Package verified"
            ),
            Err(err) => {
                warn!(
                    path = %package.source_path.display(),
                    error = %err,
                    "Invalid package"
                );
                package.id = None;
                package.public_key = None;
                package.error = Some(err);
            },
        }
        package
    }

    fn read_signed(&mut self) -> PackageResult<()> {
        let mut file = self.open_source()?;
        let size = file
            .metadata()
            .map_err(|e| PackageError::io(&self.source_path, e))?
            .len();

        let envelope = read_envelope(&mut file, size)?;
        let key = PublicKey::try_from_slice(&envelope.key).map_err(|e| {
            PackageError::InvalidCredential {
                field: "key",
                message: e.to_string(),
            }
        })?;
        let signature = Signature::try_from_slice(&envelope.signature).map_err(|e| {
            PackageError::InvalidCredential {
                field: "signature",
                message: e.to_string(),
            }
        })?;

        let mut verifier = StreamingVerifier::new(SignatureAlgorithm::Ed25519ph, &key, &signature)
            .map_err(|e| PackageError::InvalidCredential {
                field: "key",
                message: e.to_string(),
            })?;
        io::copy(&mut BufReader::new(&mut file), &mut verifier)
            .map_err(|e| PackageError::io(&self.source_path, e))?;
        verifier
            .finalize()
            .map_err(|_| PackageError::SignatureMismatch)?;

        let offset = envelope.header.payload_offset();
        self.payload = (offset, size.saturating_sub(offset));
        ZipArchive::new(self.payload_reader()?).map_err(PackageError::archive)?;

        self.id = Some(AppId::from_public_key(key.as_bytes()));
        self.public_key = Some(key);
        Ok(())
    }

    fn read_widget(&mut self) -> PackageResult<()> {
        let file = self.open_source()?;
        let mut archive = ZipArchive::new(BufReader::new(file)).map_err(PackageError::archive)?;
        let descriptor = read_descriptor(&mut archive)?;
        let declared = declared_widget_id(&descriptor)?;

        let id = match &self.options.widget_id_policy {
            WidgetIdPolicy::HashDeclaredId => AppId::generate(declared.as_bytes()),
            WidgetIdPolicy::TrustSignatureChain(validator) => {
                validator
                    .validate(&self.source_path)
                    .map_err(|message| PackageError::UntrustedSignatureChain { message })?;
                AppId::new(declared).map_err(|e| PackageError::Descriptor {
                    message: e.to_string(),
                })?
            },
        };
        self.id = Some(id);
        Ok(())
    }

    fn open_source(&self) -> PackageResult<File> {
        File::open(&self.source_path).map_err(|e| PackageError::io(&self.source_path, e))
    }

    fn payload_reader(&self) -> PackageResult<PayloadSlice<BufReader<File>>> {
        let (start, len) = self.payload;
        PayloadSlice::new(BufReader::new(self.open_source()?), start, len)
            .map_err(|e| PackageError::io(&self.source_path, e))
    }

    /// Whether every structural and signature check passed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Why the package is invalid, if it is.
    #[must_use]
    pub fn error(&self) -> Option<&PackageError> {
        self.error.as_ref()
    }

    /// The application id. `None` for an invalid package.
    #[must_use]
    pub fn id(&self) -> Option<&AppId> {
        self.id.as_ref()
    }

    /// The format selected from the file extension.
    #[must_use]
    pub fn format(&self) -> Option<PackageFormat> {
        self.format
    }

    /// Path of the package file.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// The embedded signing key of a valid signed package.
    #[must_use]
    pub fn public_key(&self) -> Option<&PublicKey> {
        self.public_key.as_ref()
    }

    /// BLAKE3 digest of the whole package file.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::Io`] if the file cannot be read.
    pub fn digest(&self) -> PackageResult<ContentHash> {
        let file = self.open_source()?;
        ContentHash::hash_reader(BufReader::new(file))
            .map_err(|e| PackageError::io(&self.source_path, e))
    }

    /// Extract the package, once, and return the unpacked directory.
    ///
    /// Later calls return the same directory without touching the archive.
    ///
    /// # Errors
    ///
    /// Returns [`PackageError::NotValid`] for an invalid package, or the
    /// extraction error. A failed extraction leaves nothing behind.
    pub fn extract(&mut self) -> PackageResult<&Path> {
        if let Some(err) = &self.error {
            return Err(PackageError::NotValid {
                path: self.source_path.clone(),
                reason: err.to_string(),
            });
        }
        let dir = match self.extracted.take() {
            Some(dir) => dir,
            None => self.unpack()?,
        };
        Ok(self.extracted.insert(dir).path())
    }

    /// The extraction directory, if [`extract`](Self::extract) has run.
    #[must_use]
    pub fn extracted_path(&self) -> Option<&Path> {
        self.extracted.as_ref().map(TempDir::path)
    }

    /// Keep the extraction directory past the package's lifetime.
    ///
    /// Returns its path; the caller now owns it.
    pub fn dismiss(&mut self) -> Option<PathBuf> {
        self.extracted.take().map(TempDir::keep)
    }

    fn unpack(&self) -> PackageResult<TempDir> {
        let builder = {
            let mut builder = tempfile::Builder::new();
            builder.prefix("wharf-package-");
            builder
        };
        let dir = match &self.options.extract_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| {
            PackageError::io(
                self.options
                    .extract_root
                    .clone()
                    .unwrap_or_else(std::env::temp_dir),
                e,
            )
        })?;

        let count = match self.format {
            Some(PackageFormat::Signed) => {
                let mut archive =
                    ZipArchive::new(self.payload_reader()?).map_err(PackageError::archive)?;
                extract_archive(&mut archive, dir.path(), &self.options.limits)?
            },
            Some(PackageFormat::Widget) => {
                let file = self.open_source()?;
                let mut archive =
                    ZipArchive::new(BufReader::new(file)).map_err(PackageError::archive)?;
                extract_archive(&mut archive, dir.path(), &self.options.limits)?
            },
            None => {
                return Err(PackageError::UnsupportedFormat {
                    path: self.source_path.clone(),
                });
            },
        };

        debug!(
            path = %self.source_path.display(),
            dest = %dir.path().display(),
            entries = count,
            "Extracted package"
        );
        Ok(dir)
    }
}

/// Read `config.xml` from a widget archive.
fn read_descriptor<R: Read + Seek>(archive: &mut ZipArchive<R>) -> PackageResult<String> {
    let entry = archive
        .by_name(keys::WIDGET_MANIFEST_FILE)
        .map_err(|_| PackageError::Descriptor {
            message: format!("{} not found in archive", keys::WIDGET_MANIFEST_FILE),
        })?;
    if entry.size() > MAX_MANIFEST_SIZE {
        return Err(PackageError::Descriptor {
            message: format!(
                "{} is too large ({} bytes)",
                keys::WIDGET_MANIFEST_FILE,
                entry.size()
            ),
        });
    }
    let mut text = String::new();
    entry
        .take(MAX_MANIFEST_SIZE)
        .read_to_string(&mut text)
        .map_err(|e| PackageError::Descriptor {
            message: e.to_string(),
        })?;
    Ok(text)
}

/// The `id` attribute of the descriptor's root `<widget>` element.
fn declared_widget_id(descriptor: &str) -> PackageResult<String> {
    let doc = roxmltree::Document::parse(descriptor).map_err(|e| PackageError::Descriptor {
        message: e.to_string(),
    })?;
    let root = doc.root_element();
    if root.tag_name().name() != keys::WIDGET {
        return Err(PackageError::Descriptor {
            message: format!("root element is <{}>", root.tag_name().name()),
        });
    }
    root.attribute("id")
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| PackageError::Descriptor {
            message: "root element has no id".into(),
        })
}
