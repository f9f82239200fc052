//! Interface identities the event sink answers to.
//!
//! A connection point checks a new sink by asking it for the source
//! dispinterface before accepting the advise, so the sink has to claim that
//! IID as well as `IUnknown` and `IDispatch`. The source IID is only known
//! once the agent's type information has been read. IIDs are held as their
//! `u128` form so the check does not depend on the COM bindings.
#![cfg_attr(not(windows), allow(dead_code))]

/// `{00000000-0000-0000-C000-000000000046}`
pub(crate) const IID_IUNKNOWN: u128 = 0x00000000_0000_0000_c000_000000000046;
/// `{00020400-0000-0000-C000-000000000046}`
pub(crate) const IID_IDISPATCH: u128 = 0x00020400_0000_0000_c000_000000000046;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SinkInterfaces {
    source: u128,
}

impl SinkInterfaces {
    pub(crate) fn new(source: u128) -> Self {
        Self { source }
    }

    /// True if `QueryInterface` for `iid` should hand out the sink.
    pub(crate) fn answers(&self, iid: u128) -> bool {
        iid == IID_IUNKNOWN || iid == IID_IDISPATCH || iid == self.source
    }
}
