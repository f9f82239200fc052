/// COM plumbing: object creation and late-bound calls.
use crate::error::AgentError;
use windows::core::{BSTR, GUID, HSTRING, PCWSTR, VARIANT};
use windows::Win32::System::Com::{
    CLSIDFromProgID, CoCreateInstance, IDispatch, ITypeInfo, CLSCTX_INPROC_SERVER,
    CLSCTX_LOCAL_SERVER, DISPATCH_METHOD, DISPPARAMS, TYPEATTR,
};

/// `MAKELCID(LANG_USER_DEFAULT, SORT_DEFAULT)`.
pub(crate) const LOCALE_USER_DEFAULT: u32 = 0x0400;

/// Create the object registered under `prog_id`, returning its CLSID too.
pub(crate) fn create_object(prog_id: &str) -> Result<(GUID, IDispatch), AgentError> {
    let clsid = unsafe { CLSIDFromProgID(&HSTRING::from(prog_id)) }?;
    let object: IDispatch =
        unsafe { CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER | CLSCTX_INPROC_SERVER) }?;
    Ok((clsid, object))
}

/// Call a parameterless method returning a string through `IDispatch`.
pub(crate) fn call_string_method(object: &IDispatch, name: &str) -> Result<String, AgentError> {
    let wide = HSTRING::from(name);
    let names = [PCWSTR(wide.as_ptr())];
    let mut dispid = 0i32;
    unsafe {
        object.GetIDsOfNames(
            &GUID::zeroed(),
            names.as_ptr(),
            1,
            LOCALE_USER_DEFAULT,
            &mut dispid,
        )
    }?;

    let params = DISPPARAMS::default();
    let mut result = VARIANT::default();
    unsafe {
        object.Invoke(
            dispid,
            &GUID::zeroed(),
            LOCALE_USER_DEFAULT,
            DISPATCH_METHOD,
            &params,
            Some(&mut result as *mut VARIANT),
            None,
            None,
        )
    }?;

    Ok(BSTR::try_from(&result)?.to_string())
}

/// Read from a type's `TYPEATTR`, releasing it afterwards.
pub(crate) fn with_type_attr<T>(
    info: &ITypeInfo,
    read: impl FnOnce(&TYPEATTR) -> T,
) -> Result<T, AgentError> {
    unsafe {
        let attr = info.GetTypeAttr()?;
        let value = read(&*attr);
        info.ReleaseTypeAttr(attr);
        Ok(value)
    }
}
