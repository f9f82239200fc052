/// Subscription to the agent's events and the message pump that delivers
/// them.
///
/// The agent's coclass names a default source dispinterface in its type
/// library. [`subscribe`] looks that interface up, learns which member IDs
/// mean `OnQuit` and `OnDeviceControlEvent`, and advises a sink that
/// answers to that interface on the matching connection point. Events only arrive while the subscribing
/// thread runs [`pump_messages`].
use crate::error::AgentError;
use usbscan_core::AgentEvents;

#[cfg(windows)]
use {
    crate::com::{create_object, with_type_attr, LOCALE_USER_DEFAULT},
    crate::sink::AgentEventSink,
    std::collections::HashMap,
    tracing::{debug, warn},
    usbscan_core::AgentEventKind,
    windows::core::{Interface, BSTR, GUID},
    windows::Win32::Foundation::HWND,
    windows::Win32::System::Com::{
        IConnectionPoint, IConnectionPointContainer, IDispatch, ITypeInfo, ITypeLib,
    },
    windows::Win32::System::Ole::{IProvideClassInfo, IMPLTYPEFLAG_FDEFAULT, IMPLTYPEFLAG_FSOURCE},
    windows::Win32::UI::WindowsAndMessaging::{DispatchMessageW, GetMessageW, TranslateMessage, MSG},
};

/// A live advise on the agent's event connection point. Dropping it
/// unadvises the sink.
pub struct Subscription {
    #[cfg(windows)]
    point: IConnectionPoint,
    #[cfg(windows)]
    cookie: u32,
    #[cfg(windows)]
    _agent: IDispatch,
}

#[cfg(windows)]
impl Drop for Subscription {
    fn drop(&mut self) {
        if let Err(e) = unsafe { self.point.Unadvise(self.cookie) } {
            warn!("usb_scan: unadvise failed: {e}");
        }
    }
}

/// Register `handler` for the events of the object registered under
/// `prog_id`.
#[cfg(windows)]
pub fn subscribe(prog_id: &str, handler: Box<dyn AgentEvents>) -> Result<Subscription, AgentError> {
    let (clsid, agent) = create_object(prog_id)?;

    let coclass = coclass_type_info(prog_id, &agent, &clsid)?;
    let source = default_source(prog_id, &coclass)?;
    let iid = with_type_attr(&source, |attr| attr.guid)?;
    let members = event_members(&source)?;

    for kind in [AgentEventKind::Quit, AgentEventKind::DeviceControl] {
        if !members.values().any(|k| *k == kind) {
            warn!("usb_scan: {prog_id} does not declare {}", kind.member_name());
        }
    }

    let container: IConnectionPointContainer = agent.cast()?;
    let point = unsafe { container.FindConnectionPoint(&iid) }?;
    let sink = AgentEventSink::create(handler, members, &iid);
    let cookie = unsafe { point.Advise(&sink) }?;
    debug!("usb_scan: subscribed to {prog_id} events {iid:?}");

    Ok(Subscription {
        point,
        cookie,
        _agent: agent,
    })
}

#[cfg(not(windows))]
pub fn subscribe(prog_id: &str, handler: Box<dyn AgentEvents>) -> Result<Subscription, AgentError> {
    let _ = (prog_id, handler);
    Err(AgentError::Unsupported)
}

/// Pump window messages on this thread until `WM_QUIT`. Agent events are
/// dispatched from here.
#[cfg(windows)]
pub fn pump_messages() -> Result<(), AgentError> {
    let mut msg = MSG::default();
    loop {
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
        match ret.0 {
            -1 => return Err(windows::core::Error::from_win32().into()),
            0 => return Ok(()),
            _ => unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            },
        }
    }
}

#[cfg(not(windows))]
pub fn pump_messages() -> Result<(), AgentError> {
    Err(AgentError::Unsupported)
}

// ─── Type information ───────────────────────────────────────────────────────

/// Type information of the agent's coclass.
///
/// Prefers `IProvideClassInfo`; otherwise looks the CLSID up in the type
/// library that describes the object's dispatch interface.
#[cfg(windows)]
fn coclass_type_info(prog_id: &str, agent: &IDispatch, clsid: &GUID) -> Result<ITypeInfo, AgentError> {
    if let Ok(provider) = agent.cast::<IProvideClassInfo>() {
        if let Ok(info) = unsafe { provider.GetClassInfo() } {
            return Ok(info);
        }
    }

    let info = unsafe { agent.GetTypeInfo(0, LOCALE_USER_DEFAULT) }?;
    let mut library: Option<ITypeLib> = None;
    let mut index = 0u32;
    unsafe { info.GetContainingTypeLib(&mut library, &mut index) }?;
    let library = library.ok_or_else(|| AgentError::NoTypeLibrary(prog_id.to_string()))?;
    Ok(unsafe { library.GetTypeInfoOfGuid(clsid) }?)
}

/// The coclass's `[default, source]` interface.
#[cfg(windows)]
fn default_source(prog_id: &str, coclass: &ITypeInfo) -> Result<ITypeInfo, AgentError> {
    let wanted = IMPLTYPEFLAG_FDEFAULT.0 | IMPLTYPEFLAG_FSOURCE.0;
    let count = with_type_attr(coclass, |attr| attr.cImplTypes)?;

    for index in 0..count as u32 {
        let flags = unsafe { coclass.GetImplTypeFlags(index) }?;
        if flags.0 & wanted == wanted {
            let href = unsafe { coclass.GetRefTypeOfImplType(index) }?;
            return Ok(unsafe { coclass.GetRefTypeInfo(href) }?);
        }
    }

    Err(AgentError::NoSourceInterface(prog_id.to_string()))
}

/// Member IDs of the source interface's known events.
#[cfg(windows)]
fn event_members(source: &ITypeInfo) -> Result<HashMap<i32, AgentEventKind>, AgentError> {
    let count = with_type_attr(source, |attr| attr.cFuncs)?;
    let mut members = HashMap::new();

    for index in 0..count as u32 {
        let memid = unsafe {
            let desc = source.GetFuncDesc(index)?;
            let memid = (*desc).memid;
            source.ReleaseFuncDesc(desc);
            memid
        };

        let mut name = BSTR::new();
        unsafe {
            source.GetDocumentation(
                memid,
                Some(&mut name as *mut BSTR),
                None,
                std::ptr::null_mut(),
                None,
            )
        }?;

        if let Some(kind) = AgentEventKind::from_member_name(&name.to_string()) {
            members.insert(memid, kind);
        }
    }

    Ok(members)
}
