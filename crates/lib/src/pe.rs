//! Minimal PE image header inspection.
//!
//! Only the two fields needed to classify an image as 64-bit are read: the
//! `e_lfanew` pointer in the legacy DOS header and the COFF `Machine` field
//! that follows the `PE\0\0` signature.

/// Offset of the little-endian u32 pointing at the PE signature.
const E_LFANEW_OFFSET: usize = 0x3C;

/// Images shorter than the DOS header cannot be classified.
const DOS_HEADER_LEN: usize = 64;

pub const IMAGE_FILE_MACHINE_I386: u16 = 0x014C;
pub const IMAGE_FILE_MACHINE_IA64: u16 = 0x0200;
pub const IMAGE_FILE_MACHINE_ARMNT: u16 = 0x01C4;
pub const IMAGE_FILE_MACHINE_ARM: u16 = 0x01C0;
pub const IMAGE_FILE_MACHINE_AMD64: u16 = 0x8664;
pub const IMAGE_FILE_MACHINE_ARM64: u16 = 0xAA64;

/// Machine field decoded from a PE header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Machine {
  I386,
  Ia64,
  Arm,
  Amd64,
  Arm64,
  Unknown(u16),
}

impl Machine {
  fn from_raw(raw: u16) -> Self {
    match raw {
      IMAGE_FILE_MACHINE_I386 => Self::I386,
      IMAGE_FILE_MACHINE_IA64 => Self::Ia64,
      IMAGE_FILE_MACHINE_ARM | IMAGE_FILE_MACHINE_ARMNT => Self::Arm,
      IMAGE_FILE_MACHINE_AMD64 => Self::Amd64,
      IMAGE_FILE_MACHINE_ARM64 => Self::Arm64,
      other => Self::Unknown(other),
    }
  }

  /// Whether the payload pipeline treats this machine as 64-bit.
  ///
  /// Only AMD64 and IA64 count; ARM64 images are never produced by the
  /// Windows toolchain used here.
  pub fn is_64bit(&self) -> bool {
    matches!(self, Self::Amd64 | Self::Ia64)
  }

  pub fn name(&self) -> String {
    match self {
      Self::I386 => "i386".to_string(),
      Self::Ia64 => "ia64".to_string(),
      Self::Arm => "arm".to_string(),
      Self::Amd64 => "amd64".to_string(),
      Self::Arm64 => "arm64".to_string(),
      Self::Unknown(raw) => format!("unknown (0x{raw:04X})"),
    }
  }
}

/// Read the machine type of a PE image.
///
/// Returns `None` when the buffer is too short to hold a DOS header or when
/// the header pointer leaves no room for the machine field.
pub fn machine_type(image: &[u8]) -> Option<Machine> {
  if image.len() < DOS_HEADER_LEN {
    return None;
  }

  let pointer: [u8; 4] = image[E_LFANEW_OFFSET..E_LFANEW_OFFSET + 4].try_into().ok()?;
  let header_offset = usize::try_from(u32::from_le_bytes(pointer)).ok()?;

  let end = header_offset.checked_add(6)?;
  if end > image.len() {
    return None;
  }

  let raw = u16::from_le_bytes([image[header_offset + 4], image[header_offset + 5]]);
  Some(Machine::from_raw(raw))
}

/// Returns true only when the image header names a 64-bit machine.
///
/// Fails closed: anything that cannot be read is reported as not 64-bit.
pub fn is_64bit_image(image: &[u8]) -> bool {
  machine_type(image).is_some_and(|machine| machine.is_64bit())
}
