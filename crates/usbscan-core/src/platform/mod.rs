/// Platform-specific functionality — Windows drive enumeration,
/// process listing, and elevation checks.
///
/// Every query compiles on all targets; off Windows they report nothing
/// (no drives, no processes, not elevated).

pub mod drives;
pub mod permissions;
pub mod processes;

pub use drives::{enumerate_drives, DriveInfo, DriveSource, DriveType, SystemDrives};
pub use permissions::is_elevated;
pub use processes::{image_paths_named, ProcessImage, ProcessSource, SystemProcesses};
