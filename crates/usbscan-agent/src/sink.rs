/// Event sink advised on the agent's connection point.
///
/// The agent fires its events through `IDispatch::Invoke` with the member
/// IDs of its source dispinterface. Those IDs are read from the agent's
/// type information at subscription time and mapped to
/// [`AgentEventKind`]s; members the handler does not know are acknowledged
/// and dropped.
///
/// The vtable is laid out by hand: `QueryInterface` must also answer the
/// source dispinterface, whose IID is only known at run time.
use crate::interfaces::SinkInterfaces;
use std::collections::HashMap;
use std::ffi::c_void;
use std::sync::atomic::{fence, AtomicU32, Ordering};
use tracing::{debug, error};
use usbscan_core::{AgentEventKind, AgentEvents};
use windows::core::{Error, Interface, IUnknown_Vtbl, Result, BSTR, GUID, HRESULT, PCWSTR, VARIANT};
use windows::Win32::Foundation::{
    DISP_E_BADPARAMCOUNT, E_FAIL, E_NOINTERFACE, E_NOTIMPL, E_POINTER, S_OK,
};
use windows::Win32::System::Com::{
    IDispatch, IDispatch_Vtbl, DISPATCH_FLAGS, DISPPARAMS, EXCEPINFO,
};

/// COM object layout: the vtable pointer must come first.
#[repr(C)]
pub(crate) struct AgentEventSink {
    vtable: *const IDispatch_Vtbl,
    refs: AtomicU32,
    interfaces: SinkInterfaces,
    handler: Box<dyn AgentEvents>,
    members: HashMap<i32, AgentEventKind>,
}

static VTABLE: IDispatch_Vtbl = IDispatch_Vtbl {
    base__: IUnknown_Vtbl {
        QueryInterface: query_interface,
        AddRef: add_ref,
        Release: release,
    },
    GetTypeInfoCount: get_type_info_count,
    GetTypeInfo: get_type_info,
    GetIDsOfNames: get_ids_of_names,
    Invoke: invoke,
};

impl AgentEventSink {
    /// A new sink answering to `source` as well as `IUnknown`/`IDispatch`,
    /// returned with one reference owned by the caller.
    pub(crate) fn create(
        handler: Box<dyn AgentEvents>,
        members: HashMap<i32, AgentEventKind>,
        source: &GUID,
    ) -> IDispatch {
        let sink = Box::new(Self {
            vtable: &VTABLE,
            refs: AtomicU32::new(1),
            interfaces: SinkInterfaces::new(source.to_u128()),
            handler,
            members,
        });
        unsafe { IDispatch::from_raw(Box::into_raw(sink).cast()) }
    }

    fn invoke(&self, member: i32, params: *const DISPPARAMS) -> Result<()> {
        match self.members.get(&member) {
            Some(kind) => self.dispatch(*kind, params),
            None => {
                debug!("usb_scan: ignoring agent event {member}");
                Ok(())
            }
        }
    }

    fn dispatch(&self, kind: AgentEventKind, params: *const DISPPARAMS) -> Result<()> {
        match kind {
            AgentEventKind::Quit => {
                self.handler.on_quit();
                Ok(())
            }
            AgentEventKind::DeviceControl => {
                let payload = unsafe { first_string_arg(params) }?;
                self.handler.on_device_control_event(&payload).map_err(|e| {
                    error!("usb_scan: device event failed: {e}");
                    Error::from(E_FAIL)
                })
            }
        }
    }
}

unsafe fn sink<'a>(this: *mut c_void) -> &'a AgentEventSink {
    &*(this as *const AgentEventSink)
}

// ─── IUnknown ───────────────────────────────────────────────────────────────

unsafe extern "system" fn query_interface(
    this: *mut c_void,
    iid: *const GUID,
    out: *mut *mut c_void,
) -> HRESULT {
    if iid.is_null() || out.is_null() {
        return E_POINTER;
    }
    let sink = sink(this);
    if sink.interfaces.answers((*iid).to_u128()) {
        sink.refs.fetch_add(1, Ordering::Relaxed);
        *out = this;
        S_OK
    } else {
        *out = std::ptr::null_mut();
        E_NOINTERFACE
    }
}

unsafe extern "system" fn add_ref(this: *mut c_void) -> u32 {
    sink(this).refs.fetch_add(1, Ordering::Relaxed) + 1
}

unsafe extern "system" fn release(this: *mut c_void) -> u32 {
    let remaining = sink(this).refs.fetch_sub(1, Ordering::Release) - 1;
    if remaining == 0 {
        fence(Ordering::Acquire);
        drop(Box::from_raw(this as *mut AgentEventSink));
    }
    remaining
}

// ─── IDispatch ──────────────────────────────────────────────────────────────

unsafe extern "system" fn get_type_info_count(_this: *mut c_void, count: *mut u32) -> HRESULT {
    if count.is_null() {
        return E_POINTER;
    }
    *count = 0;
    S_OK
}

unsafe extern "system" fn get_type_info(
    _this: *mut c_void,
    _index: u32,
    _lcid: u32,
    out: *mut *mut c_void,
) -> HRESULT {
    if !out.is_null() {
        *out = std::ptr::null_mut();
    }
    E_NOTIMPL
}

unsafe extern "system" fn get_ids_of_names(
    _this: *mut c_void,
    _riid: *const GUID,
    _names: *const PCWSTR,
    _count: u32,
    _lcid: u32,
    _dispids: *mut i32,
) -> HRESULT {
    E_NOTIMPL
}

#[allow(clippy::too_many_arguments)]
unsafe extern "system" fn invoke(
    this: *mut c_void,
    member: i32,
    _riid: *const GUID,
    _lcid: u32,
    _flags: DISPATCH_FLAGS,
    params: *const DISPPARAMS,
    _result: *mut VARIANT,
    _excepinfo: *mut EXCEPINFO,
    _argerr: *mut u32,
) -> HRESULT {
    match sink(this).invoke(member, params) {
        Ok(()) => S_OK,
        Err(e) => e.code(),
    }
}

/// First positional argument as a string. `rgvarg` holds the arguments in
/// reverse order.
unsafe fn first_string_arg(params: *const DISPPARAMS) -> Result<String> {
    let params = params.as_ref().ok_or_else(|| Error::from(E_POINTER))?;
    if params.cArgs == 0 || params.rgvarg.is_null() {
        return Err(DISP_E_BADPARAMCOUNT.into());
    }
    let arg = &*params.rgvarg.add(params.cArgs as usize - 1);
    Ok(BSTR::try_from(arg)?.to_string())
}
