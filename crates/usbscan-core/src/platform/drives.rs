/// Drive enumeration using the Windows API.
///
/// Lists every logical drive root with its type classification.
#[cfg(windows)]
use windows::Win32::Storage::FileSystem::{GetDriveTypeW, GetLogicalDriveStringsW};

// Drive type constants from the Windows API.
const DRIVE_REMOVABLE_VAL: u32 = 2;
const DRIVE_FIXED_VAL: u32 = 3;
const DRIVE_REMOTE_VAL: u32 = 4;
const DRIVE_CDROM_VAL: u32 = 5;

/// A single logical drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveInfo {
    /// Root path exactly as the OS reports it, e.g. "D:\".
    pub root: String,
    pub drive_type: DriveType,
}

impl DriveInfo {
    pub fn new(root: impl Into<String>, drive_type: DriveType) -> Self {
        Self {
            root: root.into(),
            drive_type,
        }
    }

    pub fn is_removable(&self) -> bool {
        self.drive_type == DriveType::Removable
    }
}

/// Drive type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveType {
    Fixed,
    Removable,
    Network,
    CdRom,
    Unknown,
}

impl DriveType {
    /// Map a raw `GetDriveTypeW` value.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            DRIVE_FIXED_VAL => Self::Fixed,
            DRIVE_REMOVABLE_VAL => Self::Removable,
            DRIVE_REMOTE_VAL => Self::Network,
            DRIVE_CDROM_VAL => Self::CdRom,
            _ => Self::Unknown,
        }
    }
}

/// Source of the current logical drive set.
pub trait DriveSource {
    fn drives(&self) -> Vec<DriveInfo>;
}

impl<D: DriveSource + ?Sized> DriveSource for &D {
    fn drives(&self) -> Vec<DriveInfo> {
        (**self).drives()
    }
}

/// The live drive set of this machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDrives;

impl DriveSource for SystemDrives {
    fn drives(&self) -> Vec<DriveInfo> {
        enumerate_drives()
    }
}

/// Split the buffer filled by `GetLogicalDriveStringsW` into drive roots.
#[cfg_attr(not(windows), allow(dead_code))]
fn split_drive_strings(buffer: &[u16]) -> Vec<String> {
    String::from_utf16_lossy(buffer)
        .split('\0')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Enumerate all logical drives on the system, network drives included.
///
/// Returns an empty vec if the Windows API call fails, and always off
/// Windows.
#[cfg(windows)]
pub fn enumerate_drives() -> Vec<DriveInfo> {
    // GetLogicalDriveStringsW returns null-separated drive root strings.
    let mut buffer = [0u16; 256];
    let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };

    if len == 0 || len as usize > buffer.len() {
        tracing::warn!("GetLogicalDriveStringsW returned {len}");
        return Vec::new();
    }

    split_drive_strings(&buffer[..len as usize])
        .into_iter()
        .map(|root| {
            let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
            let raw_type = unsafe { GetDriveTypeW(windows::core::PCWSTR(root_wide.as_ptr())) };
            DriveInfo::new(root, DriveType::from_raw(raw_type))
        })
        .collect()
}

#[cfg(not(windows))]
pub fn enumerate_drives() -> Vec<DriveInfo> {
    tracing::debug!("drive enumeration is only available on Windows");
    Vec::new()
}
