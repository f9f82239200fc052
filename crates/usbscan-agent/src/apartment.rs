/// COM apartment for the calling thread.
///
/// The agent delivers its events to the thread that subscribed, through
/// that thread's message queue, so both the status query and the event
/// subscription run on one single-threaded apartment entered at startup.
use crate::error::AgentError;
use std::marker::PhantomData;

/// Single-threaded apartment, left on drop.
pub struct Apartment {
    // Apartments are per-thread.
    _not_send: PhantomData<*const ()>,
}

impl Apartment {
    #[cfg(windows)]
    pub fn enter() -> Result<Self, AgentError> {
        use windows::Win32::System::Com::{CoInitializeEx, COINIT_APARTMENTTHREADED};

        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }.ok()?;
        Ok(Self {
            _not_send: PhantomData,
        })
    }

    #[cfg(not(windows))]
    pub fn enter() -> Result<Self, AgentError> {
        Err(AgentError::Unsupported)
    }
}

impl Drop for Apartment {
    fn drop(&mut self) {
        #[cfg(windows)]
        unsafe {
            windows::Win32::System::Com::CoUninitialize();
        }
    }
}
