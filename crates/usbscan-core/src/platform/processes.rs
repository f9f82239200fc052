//! Running-process listing using a ToolHelp snapshot.
//!
//! Used only by the unprivileged fallback of the scanner path resolver,
//! which needs the image path of the agent's UI process. Opening a process
//! with `PROCESS_QUERY_LIMITED_INFORMATION` works without elevation for
//! processes in the caller's session.

/// One entry of the process list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessImage {
    pub pid: u32,
    /// Executable file name, e.g. "SentinelUI.exe".
    pub name: String,
    /// Full image path, if the process could be opened.
    pub path: Option<String>,
}

/// Source of the running-process list, in enumeration order.
pub trait ProcessSource {
    fn processes(&self) -> Vec<ProcessImage>;
}

/// The live process list of this machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcesses;

impl ProcessSource for SystemProcesses {
    fn processes(&self) -> Vec<ProcessImage> {
        enumerate_processes()
    }
}

/// Image paths of every process whose name equals `name`, in enumeration
/// order. Processes without a readable image path are skipped.
pub fn image_paths_named<P: ProcessSource + ?Sized>(source: &P, name: &str) -> Vec<String> {
    source
        .processes()
        .into_iter()
        .filter(|p| p.name == name)
        .filter_map(|p| p.path)
        .collect()
}

#[cfg(windows)]
fn enumerate_processes() -> Vec<ProcessImage> {
    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
        TH32CS_SNAPPROCESS,
    };

    let mut processes = Vec::new();

    let snapshot = match unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) } {
        Ok(h) => h,
        Err(e) => {
            tracing::warn!("CreateToolhelp32Snapshot failed: {e}");
            return processes;
        }
    };

    let mut entry = PROCESSENTRY32W {
        dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
        ..Default::default()
    };

    if unsafe { Process32FirstW(snapshot, &mut entry) }.is_ok() {
        loop {
            let name_len = entry
                .szExeFile
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(entry.szExeFile.len());
            let name = String::from_utf16_lossy(&entry.szExeFile[..name_len]);
            let pid = entry.th32ProcessID;

            processes.push(ProcessImage {
                pid,
                name,
                path: image_path(pid),
            });

            if unsafe { Process32NextW(snapshot, &mut entry) }.is_err() {
                break;
            }
        }
    }

    unsafe {
        let _ = CloseHandle(snapshot);
    }

    processes
}

/// Full Win32 image path of a process, if it can be opened.
#[cfg(windows)]
fn image_path(pid: u32) -> Option<String> {
    use windows::core::PWSTR;
    use windows::Win32::Foundation::{CloseHandle, MAX_PATH};
    use windows::Win32::System::Threading::{
        OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
        PROCESS_QUERY_LIMITED_INFORMATION,
    };

    let handle = unsafe { OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) }.ok()?;

    let mut buffer = [0u16; MAX_PATH as usize];
    let mut size = buffer.len() as u32;
    let queried = unsafe {
        QueryFullProcessImageNameW(
            handle,
            PROCESS_NAME_WIN32,
            PWSTR::from_raw(buffer.as_mut_ptr()),
            &mut size,
        )
    };

    unsafe {
        let _ = CloseHandle(handle);
    }

    queried
        .ok()
        .map(|()| String::from_utf16_lossy(&buffer[..size as usize]))
}

#[cfg(not(windows))]
fn enumerate_processes() -> Vec<ProcessImage> {
    tracing::debug!("process listing is only available on Windows");
    Vec::new()
}
