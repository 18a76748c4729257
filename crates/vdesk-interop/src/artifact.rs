//! Binding artifact format
//!
//! An artifact is a compiled module serialized into a small little-endian
//! container. The fixed-size header carries everything the locator needs to
//! trust or reject a file without decoding the payload.
//!
//! ```text
//! magic "VDBN" | format u16 | module major u16 | module minor u16
//! | os_build u32 | interface_version u32 | payload_len u32
//! | payload | xxh3-64 of payload u64
//! ```
//!
//! Encoding is deterministic, so two processes producing the artifact for
//! the same build write identical bytes.

use crate::error::{InteropError, Result};
use crate::version::{BuildNumber, InterfaceVersion};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use vdesk_idl::{
    CompiledInterface, CompiledMethod, CompiledModule, CompiledParam, Guid, ModuleDescriptor,
    ParamDirection, Type,
};

/// File magic
pub const MAGIC: [u8; 4] = *b"VDBN";

/// Container layout revision
pub const FORMAT_VERSION: u16 = 1;

/// Header size (4 + 2 + 2 + 2 + 4 + 4 + 4 = 22)
pub const HEADER_SIZE: usize = 22;

/// Trailing checksum size
pub const CHECKSUM_SIZE: usize = 8;

const FILE_PREFIX: &str = "VirtualDesktop.";
const FILE_SUFFIX: &str = ".generated.binding";

/// Semantic version declared by a compiled module
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleVersion {
    pub major: u16,
    pub minor: u16,
}

impl ModuleVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl From<(u16, u16)> for ModuleVersion {
    fn from((major, minor): (u16, u16)) -> Self {
        Self { major, minor }
    }
}

/// Version stamped into every module this crate synthesizes
pub const MODULE_VERSION: ModuleVersion = ModuleVersion::new(1, 0);

/// Oldest module version the locator accepts
pub const MIN_REQUIRED_VERSION: ModuleVersion = ModuleVersion::new(1, 0);

/// File name of the artifact for `build`
pub fn artifact_file_name(build: BuildNumber) -> String {
    format!("{}{}{}", FILE_PREFIX, build.0, FILE_SUFFIX)
}

/// Build number encoded in an artifact file name, if the name matches the pattern
pub fn parse_file_name(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Fixed-size artifact header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactHeader {
    pub format: u16,
    pub module_version: ModuleVersion,
    pub os_build: BuildNumber,
    pub interface_version: InterfaceVersion,
    pub payload_len: u32,
}

impl ArtifactHeader {
    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(&MAGIC);
        buf.put_u16_le(self.format);
        buf.put_u16_le(self.module_version.major);
        buf.put_u16_le(self.module_version.minor);
        buf.put_u32_le(self.os_build.0);
        buf.put_u32_le(self.interface_version.0);
        buf.put_u32_le(self.payload_len);
    }

    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self> {
        if buf.remaining() < HEADER_SIZE {
            return Err(InteropError::underflow(HEADER_SIZE, buf.remaining()));
        }

        let mut magic = [0u8; 4];
        buf.copy_to_slice(&mut magic);
        if magic != MAGIC {
            return Err(InteropError::invalid_data(format!("bad magic {:02x?}", magic)));
        }

        let format = buf.get_u16_le();
        if format != FORMAT_VERSION {
            return Err(InteropError::invalid_data(format!(
                "unsupported format version {}",
                format
            )));
        }

        Ok(Self {
            format,
            module_version: ModuleVersion {
                major: buf.get_u16_le(),
                minor: buf.get_u16_le(),
            },
            os_build: BuildNumber(buf.get_u32_le()),
            interface_version: InterfaceVersion(buf.get_u32_le()),
            payload_len: buf.get_u32_le(),
        })
    }

    /// Validate a complete artifact image and return its header and payload
    pub fn validate(data: &[u8]) -> Result<(Self, &[u8])> {
        let mut buf = data;
        let header = Self::decode(&mut buf)?;

        let payload_len = usize::try_from(header.payload_len)
            .map_err(|_| InteropError::invalid_data(format!("payload length {} too large", header.payload_len)))?;
        let expected = payload_len
            .checked_add(CHECKSUM_SIZE)
            .ok_or_else(|| InteropError::invalid_data(format!("payload length {} too large", payload_len)))?;
        if buf.len() != expected {
            return Err(InteropError::invalid_data(format!(
                "expected {} bytes after header, found {}",
                expected,
                buf.len()
            )));
        }

        let (payload, mut trailer) = buf.split_at(payload_len);
        let stored = trailer.get_u64_le();
        let actual = xxhash_rust::xxh3::xxh3_64(payload);
        if stored != actual {
            return Err(InteropError::invalid_data(format!(
                "checksum mismatch: stored {:016x}, computed {:016x}",
                stored, actual
            )));
        }

        Ok((header, payload))
    }

    /// Read and validate the artifact at `path`.
    ///
    /// Every failure, including I/O, is reported as `UnreadableArtifact`.
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| InteropError::unreadable(path, e))?;
        let (header, _) = Self::validate(&data).map_err(|e| InteropError::unreadable(path, e))?;
        Ok(header)
    }
}

/// Artifact file on disk, as identified by its header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingArtifact {
    pub path: PathBuf,
    pub build: BuildNumber,
    pub module_version: ModuleVersion,
    pub interface_version: InterfaceVersion,
}

impl BindingArtifact {
    pub fn from_header(path: PathBuf, header: &ArtifactHeader) -> Self {
        Self {
            path,
            build: header.os_build,
            module_version: header.module_version,
            interface_version: header.interface_version,
        }
    }

    /// Decode the full module
    pub fn load(&self) -> Result<LoadedBinding> {
        LoadedBinding::open(&self.path)
    }
}

/// Fully decoded artifact
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedBinding {
    pub path: PathBuf,
    pub header: ArtifactHeader,
    pub module: CompiledModule,
}

impl LoadedBinding {
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| InteropError::unreadable(path, e))?;
        let (header, payload) =
            ArtifactHeader::validate(&data).map_err(|e| InteropError::unreadable(path, e))?;
        let module = decode_payload(&header, payload).map_err(|e| InteropError::unreadable(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            header,
            module,
        })
    }

    pub fn artifact(&self) -> BindingArtifact {
        BindingArtifact::from_header(self.path.clone(), &self.header)
    }
}

/// Serialize a compiled module into a complete artifact image
pub fn encode(module: &CompiledModule) -> Result<Bytes> {
    let mut payload = BytesMut::new();
    encode_payload(module, &mut payload)?;

    let payload_len = u32::try_from(payload.len())
        .map_err(|_| InteropError::invalid_data("payload exceeds 4 GiB"))?;

    let d = &module.descriptor;
    let header = ArtifactHeader {
        format: FORMAT_VERSION,
        module_version: d.version.into(),
        os_build: BuildNumber(d.os_build),
        interface_version: InterfaceVersion(d.interface_version),
        payload_len,
    };

    let mut out = BytesMut::with_capacity(HEADER_SIZE + payload.len() + CHECKSUM_SIZE);
    header.encode(&mut out);
    out.put_slice(&payload);
    out.put_u64_le(xxhash_rust::xxh3::xxh3_64(&payload));
    Ok(out.freeze())
}

/// Decode a complete artifact image
pub fn decode(data: &[u8]) -> Result<CompiledModule> {
    let (header, payload) = ArtifactHeader::validate(data)?;
    decode_payload(&header, payload)
}

/// Atomically write `data` as the artifact for `build` inside `dir`.
///
/// The bytes land in a temporary file first and are renamed over the final
/// name; a concurrent writer of the same build simply wins the rename.
pub fn persist(dir: &Path, build: BuildNumber, data: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let target = dir.join(artifact_file_name(build));

    let mut tmp = tempfile::Builder::new()
        .prefix(".binding-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| InteropError::Io(e.error))?;

    debug!("persisted {} bytes to {}", data.len(), target.display());
    Ok(target)
}

fn encode_payload(module: &CompiledModule, buf: &mut BytesMut) -> Result<()> {
    put_str(buf, &module.descriptor.name)?;

    put_count(buf, module.opaque.len(), "opaque interface")?;
    for name in &module.opaque {
        put_str(buf, name)?;
    }

    put_count(buf, module.interfaces.len(), "interface")?;
    for iface in &module.interfaces {
        put_str(buf, &iface.name)?;
        buf.put_slice(&iface.iid.to_bytes_le());
        put_str(buf, &iface.base)?;
        buf.put_u16_le(iface.first_slot);

        put_count(buf, iface.methods.len(), "method")?;
        for method in &iface.methods {
            put_str(buf, &method.name)?;
            buf.put_u16_le(method.slot);
            put_type(buf, &method.return_type)?;

            put_count(buf, method.params.len(), "parameter")?;
            for param in &method.params {
                put_str(buf, &param.name)?;
                put_type(buf, &param.ty)?;
                buf.put_u8(param.direction.to_u8());
            }
        }
    }
    Ok(())
}

fn decode_payload(header: &ArtifactHeader, mut buf: &[u8]) -> Result<CompiledModule> {
    let buf = &mut buf;
    let name = get_str(buf)?;

    let opaque_count = get_u16(buf)?;
    let mut opaque = Vec::with_capacity(opaque_count as usize);
    for _ in 0..opaque_count {
        opaque.push(get_str(buf)?);
    }

    let iface_count = get_u16(buf)?;
    let mut interfaces = Vec::with_capacity(iface_count as usize);
    for _ in 0..iface_count {
        let name = get_str(buf)?;
        if buf.remaining() < Guid::SIZE {
            return Err(InteropError::underflow(Guid::SIZE, buf.remaining()));
        }
        let mut iid = [0u8; 16];
        buf.copy_to_slice(&mut iid);
        let base = get_str(buf)?;
        let first_slot = get_u16(buf)?;

        let method_count = get_u16(buf)?;
        let mut methods = Vec::with_capacity(method_count as usize);
        for _ in 0..method_count {
            let name = get_str(buf)?;
            let slot = get_u16(buf)?;
            let return_type = get_type(buf)?;

            let param_count = get_u16(buf)?;
            let mut params = Vec::with_capacity(param_count as usize);
            for _ in 0..param_count {
                let name = get_str(buf)?;
                let ty = get_type(buf)?;
                let raw = get_u8(buf)?;
                let direction = ParamDirection::from_u8(raw)
                    .ok_or_else(|| InteropError::invalid_data(format!("bad direction {}", raw)))?;
                params.push(CompiledParam { name, ty, direction });
            }

            methods.push(CompiledMethod {
                name,
                slot,
                return_type,
                params,
            });
        }

        interfaces.push(CompiledInterface {
            name,
            iid: Guid::from_bytes_le(iid),
            base,
            first_slot,
            methods,
        });
    }

    if buf.has_remaining() {
        return Err(InteropError::invalid_data(format!(
            "{} trailing payload bytes",
            buf.remaining()
        )));
    }

    Ok(CompiledModule {
        descriptor: ModuleDescriptor {
            name,
            version: (header.module_version.major, header.module_version.minor),
            os_build: header.os_build.0,
            interface_version: header.interface_version.0,
        },
        interfaces,
        opaque,
    })
}

fn put_count(buf: &mut BytesMut, count: usize, what: &str) -> Result<()> {
    let count = u16::try_from(count)
        .map_err(|_| InteropError::invalid_data(format!("too many {} entries: {}", what, count)))?;
    buf.put_u16_le(count);
    Ok(())
}

fn put_str(buf: &mut BytesMut, s: &str) -> Result<()> {
    let len = u16::try_from(s.len())
        .map_err(|_| InteropError::invalid_data(format!("string too long: {} bytes", s.len())))?;
    buf.put_u16_le(len);
    buf.put_slice(s.as_bytes());
    Ok(())
}

fn put_type(buf: &mut BytesMut, ty: &Type) -> Result<()> {
    put_str(buf, &ty.name)?;
    buf.put_u8(ty.pointer_depth);
    buf.put_u8(ty.is_const as u8);
    Ok(())
}

fn get_u8(buf: &mut &[u8]) -> Result<u8> {
    if buf.remaining() < 1 {
        return Err(InteropError::underflow(1, 0));
    }
    Ok(buf.get_u8())
}

fn get_u16(buf: &mut &[u8]) -> Result<u16> {
    if buf.remaining() < 2 {
        return Err(InteropError::underflow(2, buf.remaining()));
    }
    Ok(buf.get_u16_le())
}

fn get_str(buf: &mut &[u8]) -> Result<String> {
    let len = get_u16(buf)? as usize;
    if buf.remaining() < len {
        return Err(InteropError::underflow(len, buf.remaining()));
    }
    let s = std::str::from_utf8(&buf[..len])
        .map_err(|e| InteropError::invalid_data(format!("invalid UTF-8: {}", e)))?
        .to_string();
    buf.advance(len);
    Ok(s)
}

fn get_type(buf: &mut &[u8]) -> Result<Type> {
    let name = get_str(buf)?;
    let pointer_depth = get_u8(buf)?;
    let is_const = get_u8(buf)? != 0;
    Ok(Type {
        name,
        pointer_depth,
        is_const,
    })
}
